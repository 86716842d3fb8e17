//! The Query build target: a single (model, flavor, params) request
//! compiled into joins, predicates, grouping, ordering, and title metadata.
//!
//! A Query is produced by one synchronous build pass and never mutated
//! afterwards.  String values are bound as placeholders; the only literals
//! embedded directly are known-safe integers (id sets and numeric
//! constants).
use crate::build;
use crate::flavor::{self, Flavor};
use crate::join::JoinPlan;
use crate::lookup::Store;
use crate::metadata::Model;
use crate::params::{self, ParamValues, Value};
use crate::result::{QueryError, QueryResult};
use json::JsonValue;
use log::debug;
use std::collections::BTreeMap;

/// Human-readable title template plus substitution arguments, for display
/// by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleSpec {
    /// Localization tag, e.g. "query_title_by_user".
    pub tag: String,
    pub args: BTreeMap<String, String>,
    /// Literal title overriding the template (used by coercion).
    pub raw: Option<String>,
}

impl TitleSpec {
    fn new(model: Model, flavor: Flavor) -> Self {
        let mut args = BTreeMap::new();
        args.insert("type".to_string(), model.type_tag().to_string());
        TitleSpec {
            tag: format!("query_title_{}", flavor.as_str()),
            args,
            raw: None,
        }
    }

    pub fn set(&mut self, key: &str, val: &str) {
        self.args.insert(key.to_string(), val.to_string());
    }

    /// Flattened fallback rendering: the raw title if set, else the tag
    /// with its arguments.
    pub fn text(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let mut out = self.tag.clone();
        for (key, val) in &self.args {
            out += &format!(" {key}={val}");
        }
        out
    }
}

/// Alternate execution strategy attached to queries that cannot be
/// expressed as a single statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Executor {
    /// Run the query twice -- once with extra predicates over the target's
    /// own text, once inner-joined to comments with predicates over the
    /// combined text -- and union the resulting ids.  A LEFT OUTER join to
    /// comments is not usable here: the optional-row scan never completes
    /// on the production data set.
    ContentUnion {
        plain_where: Vec<String>,
        plain_binds: Vec<String>,
        /// Join chain from the base table down to comments.
        join_path: Vec<String>,
        commented_where: Vec<String>,
        commented_binds: Vec<String>,
    },
    /// Run an observation query first, then restrict this query's table to
    /// rows attached to the observations found.
    ObservationsFirst { inner: Box<Query> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    model: Model,
    flavor: Flavor,
    pub(crate) params: ParamValues,
    pub(crate) join: JoinPlan,
    pub(crate) where_: Vec<String>,
    pub(crate) binds: Vec<String>,
    pub(crate) group: String,
    pub(crate) order: String,
    pub(crate) title: TitleSpec,
    pub(crate) executor: Option<Executor>,
    /// Outer query this one pages within (nested image queries).
    pub(crate) outer: Option<Box<Query>>,
}

impl Query {
    /// Compile a (model, flavor, params) request into a Query.
    ///
    /// The entire build runs synchronously; every validation and metadata
    /// error is reported here rather than at execution time.
    pub fn build(
        model: Model,
        flavor: Flavor,
        raw_params: &JsonValue,
        store: &mut dyn Store,
    ) -> QueryResult<Query> {
        if !flavor::is_allowed(model, flavor) {
            return Err(QueryError::UnknownFlavorForModel {
                model: model.as_str(),
                flavor: flavor.as_str(),
            });
        }

        let params = params::validate(model, flavor, raw_params)?;
        debug!("building {} {} query", model, flavor);

        let mut query = Query {
            model,
            flavor,
            params,
            join: JoinPlan::new(),
            where_: Vec::new(),
            binds: Vec::new(),
            group: String::new(),
            order: String::new(),
            title: TitleSpec::new(model, flavor),
            executor: None,
            outer: None,
        };

        build::initialize(&mut query, store)?;

        Ok(query)
    }

    /// Rebuild a query from a serialized description, re-running the full
    /// build pass (derived state is never trusted across requests).
    pub fn from_description(desc: &JsonValue, store: &mut dyn Store) -> QueryResult<Query> {
        let model = desc["model"]
            .as_str()
            .and_then(Model::parse)
            .ok_or_else(|| QueryError::Message(format!("Invalid model: {}", desc["model"])))?;
        let flavor = desc["flavor"]
            .as_str()
            .and_then(Flavor::parse)
            .ok_or_else(|| QueryError::Message(format!("Invalid flavor: {}", desc["flavor"])))?;
        Query::build(model, flavor, &desc["params"], store)
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn params(&self) -> &ParamValues {
        &self.params
    }

    pub fn title(&self) -> &TitleSpec {
        &self.title
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn where_clauses(&self) -> &[String] {
        &self.where_
    }

    pub fn executor(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }

    pub fn outer(&self) -> Option<&Query> {
        self.outer.as_deref()
    }

    /// Bound string values, in placeholder order.
    pub fn binds(&self) -> &[String] {
        &self.binds
    }

    /// Serialized (model, flavor, params) description, suitable for
    /// stashing in a session and rebuilding later.
    pub fn to_description(&self) -> JsonValue {
        json::object! {
            model: self.model.as_str(),
            flavor: self.flavor.as_str(),
            params: self.params.to_json(),
        }
    }

    pub(crate) fn table(&self) -> &'static str {
        self.model.table()
    }

    /// Append a predicate with no bound values.
    pub(crate) fn add_where(&mut self, frag: impl Into<String>) {
        self.where_.push(frag.into());
    }

    /// Append a predicate containing `?` placeholders plus the string
    /// values they bind.
    pub(crate) fn add_where_binds(&mut self, frag: impl Into<String>, binds: Vec<String>) {
        self.where_.push(frag.into());
        self.binds.extend(binds);
    }

    /// Request a chain of joins starting at the base table.  Elements may
    /// carry `.alias` and `!` (LEFT OUTER) markers.
    pub(crate) fn add_join(&mut self, path: &[&str]) {
        self.join.add_path(self.model.table(), path);
    }

    pub(crate) fn uses_join(&self, key: &str) -> bool {
        self.join.uses(key)
    }

    /// Set a default sort key unless the caller picked one.
    pub(crate) fn default_by(&mut self, by: &str) {
        if self.params.get_str("by").is_none() {
            self.params.insert("by", Value::Str(by.to_string()));
        }
    }

    /// Render the standard single-statement form, selecting distinct ids.
    pub fn sql(&self) -> QueryResult<String> {
        self.sql_with_select(&format!("DISTINCT {}.id", self.table()))
    }

    /// Render with a caller-supplied select list.
    pub fn sql_with_select(&self, select: &str) -> QueryResult<String> {
        render_sql(
            select,
            self.table(),
            &self.join,
            &self.where_,
            self.binds.len(),
            &self.group,
            &self.order,
        )
    }

    /// Execute and return result ids, honoring the alternate executor when
    /// one is attached.
    pub fn result_ids(&self, store: &mut dyn Store) -> QueryResult<Vec<i64>> {
        match &self.executor {
            None => store.select_ids(&self.sql()?, &self.binds),
            Some(Executor::ObservationsFirst { inner }) => {
                let obs_ids = inner.result_ids(store)?;
                let mut outer = self.clone();
                outer.executor = None;
                outer.add_join(&["images_observations"]);
                outer.add_where(format!(
                    "images_observations.observation_id IN ({})",
                    id_set(&obs_ids)
                ));
                store.select_ids(&outer.sql()?, &outer.binds)
            }
            Some(Executor::ContentUnion {
                plain_where,
                plain_binds,
                join_path,
                commented_where,
                commented_binds,
            }) => {
                let mut plain = self.clone();
                plain.executor = None;
                plain.where_.extend(plain_where.iter().cloned());
                plain.binds.extend(plain_binds.iter().cloned());
                let mut ids = store.select_ids(&plain.sql()?, &plain.binds)?;

                let mut commented = self.clone();
                commented.executor = None;
                let path: Vec<&str> = join_path.iter().map(|s| s.as_str()).collect();
                commented.add_join(&path);
                commented.where_.extend(commented_where.iter().cloned());
                commented.binds.extend(commented_binds.iter().cloned());
                for id in store.select_ids(&commented.sql()?, &commented.binds)? {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                Ok(ids)
            }
        }
    }
}

/// Render a complete statement, replacing `?` markers with numbered
/// placeholders.
fn render_sql(
    select: &str,
    table: &str,
    join: &JoinPlan,
    where_: &[String],
    bind_count: usize,
    group: &str,
    order: &str,
) -> QueryResult<String> {
    let mut sql = format!("SELECT {select} FROM {table}");
    sql += &join.sql()?;

    if !where_.is_empty() {
        let clauses: Vec<String> = where_.iter().map(|w| format!("({w})")).collect();
        sql += &format!(" WHERE {}", clauses.join(" AND "));
    }

    if !group.is_empty() {
        sql += &format!(" GROUP BY {group}");
    }

    if !order.is_empty() {
        sql += &format!(" ORDER BY {order}");
    }

    let numbered = number_placeholders(&sql);
    let used = numbered.1;
    if used != bind_count {
        return Err(QueryError::Message(format!(
            "Placeholder mismatch: {used} markers, {bind_count} bound values"
        )));
    }

    Ok(numbered.0)
}

fn number_placeholders(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for c in sql.chars() {
        if c == '?' {
            n += 1;
            out += &format!("${n}");
        } else {
            out.push(c);
        }
    }
    (out, n)
}

/// Render an id list for an `IN (...)` predicate.  An empty set renders as
/// "-1" so the predicate is valid SQL that matches nothing.
pub fn id_set(ids: &[i64]) -> String {
    if ids.is_empty() {
        return "-1".to_string();
    }
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids.iter().take(crate::constants::QUERY_MAX_ARRAY) {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Reverse the direction of an ORDER BY clause.
pub fn reverse_order(order: &str) -> String {
    order
        .split(", ")
        .map(|part| {
            if let Some(stripped) = part.strip_suffix(" ASC") {
                format!("{stripped} DESC")
            } else if let Some(stripped) = part.strip_suffix(" DESC") {
                format!("{stripped} ASC")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_sets() {
        assert_eq!(id_set(&[]), "-1");
        assert_eq!(id_set(&[3, 1, 3, 2]), "3,1,2");
    }

    #[test]
    fn reverse_order_flips_directions() {
        assert_eq!(
            reverse_order("names.sort_name ASC, observations.when DESC"),
            "names.sort_name DESC, observations.when ASC"
        );
        assert_eq!(reverse_order("rss_logs.updated_at DESC"), "rss_logs.updated_at ASC");
    }

    #[test]
    fn placeholder_numbering() {
        let (sql, n) = number_placeholders("a LIKE ? AND b LIKE ? OR c = ?");
        assert_eq!(sql, "a LIKE $1 AND b LIKE $2 OR c = $3");
        assert_eq!(n, 3);
    }
}
