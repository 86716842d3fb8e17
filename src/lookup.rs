//! Read-only lookups against the relational store.
//!
//! The condition builders never talk to the database directly; everything
//! they need is behind the `Store` trait so query construction can be
//! exercised without a live connection.  `PgStore` is the production
//! implementation.
//!
//! String references resolve per model: users by login, projects and
//! species lists by exact title, locations by name substring, names by
//! search_name then text_name.
use crate::constants::Rank;
use crate::db::DatabaseConnection;
use crate::google;
use crate::metadata::Model;
use crate::params::Value;
use crate::result::{QueryError, QueryResult};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

pub trait Store {
    /// Human-readable display string for title metadata.  Returns None when
    /// the row no longer exists; the caller falls back to the raw value.
    fn display_name(&mut self, model: Model, id: i64) -> QueryResult<Option<String>>;

    /// Ids of rows matching a model-specific lookup string.  May match
    /// zero, one, or many rows; the caller decides whether ambiguity is
    /// acceptable.
    fn ids_matching(&mut self, model: Model, text: &str) -> QueryResult<Vec<i64>>;

    /// Ids of names recorded as misspellings of the given name.
    fn name_misspelling_ids(&mut self, name_id: i64) -> QueryResult<Vec<i64>>;

    /// The full synonym set of the given name (including itself).
    fn name_synonym_ids(&mut self, name_id: i64) -> QueryResult<Vec<i64>>;

    /// Rank and text_name, for syntactic-hierarchy decisions.
    fn name_rank_text(&mut self, name_id: i64) -> QueryResult<Option<(Rank, String)>>;

    /// Descendant ids computed by the model layer (classification-based
    /// above genus, syntactic below).
    fn name_children_ids(&mut self, name_id: i64, all: bool) -> QueryResult<Vec<i64>>;

    /// Ancestor ids; with `all` false only the immediate parent set.
    fn name_parent_ids(&mut self, name_id: i64, all: bool) -> QueryResult<Vec<i64>>;

    /// Image ids attached to an observation, thumbnail first.
    fn observation_image_ids(&mut self, obs_id: i64) -> QueryResult<Vec<i64>>;

    /// Id of the catch-all "unknown" name.
    fn unknown_name_id(&mut self) -> QueryResult<i64>;

    /// Execute a compiled id query.  Used when coercion or an alternate
    /// executor must materialize result ids.
    fn select_ids(&mut self, sql: &str, params: &[String]) -> QueryResult<Vec<i64>>;
}

/// Resolve a reference parameter to a single canonical instance plus its
/// display string.
///
/// Plain ids are not checked for existence -- a filter on a nonexistent id
/// is valid SQL that matches nothing -- but string references must resolve
/// to exactly one row.
pub fn resolve_single(
    store: &mut dyn Store,
    model: Model,
    val: &Value,
) -> QueryResult<(i64, String)> {
    match val {
        Value::Int(id) => {
            let display = store
                .display_name(model, *id)?
                .unwrap_or_else(|| format!("{} #{}", model.type_tag(), id));
            Ok((*id, display))
        }
        Value::Str(s) => {
            let ids = store.ids_matching(model, s)?;
            match ids.len() {
                0 => Err(QueryError::ReferenceNotFound(format!(
                    "{} '{}'",
                    model.type_tag(),
                    s
                ))),
                1 => {
                    let id = ids[0];
                    let display = store
                        .display_name(model, id)?
                        .unwrap_or_else(|| s.to_string());
                    Ok((id, display))
                }
                _ => Err(QueryError::AmbiguousReference(format!(
                    "{} '{}'",
                    model.type_tag(),
                    s
                ))),
            }
        }
        _ => Err(QueryError::InvalidValueType {
            param: model.type_tag().to_string(),
            expected: "an id or lookup string",
        }),
    }
}

/// Resolve a list of reference values for filtering purposes: ambiguity is
/// resolved by taking the full match set, and unknown ids pass through.
pub fn resolve_filter_set(
    store: &mut dyn Store,
    model: Model,
    vals: &[Value],
) -> QueryResult<Vec<i64>> {
    let mut ids = Vec::new();
    for val in vals {
        match val {
            Value::Int(id) => ids.push(*id),
            Value::Str(s) => ids.extend(store.ids_matching(model, s)?),
            _ => (),
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Store implementation backed by a shared Postgres connection.
pub struct PgStore {
    db: Rc<RefCell<DatabaseConnection>>,
}

impl PgStore {
    pub fn new(db: Rc<RefCell<DatabaseConnection>>) -> Self {
        PgStore { db }
    }

    fn query_ids(&mut self, sql: &str, params: &[String]) -> QueryResult<Vec<i64>> {
        debug!("lookup executing: {sql}");
        let mut binds: Vec<&(dyn postgres::types::ToSql + Sync)> = Vec::new();
        for p in params {
            binds.push(p);
        }
        let rows = self
            .db
            .borrow_mut()
            .client()
            .query(sql, binds.as_slice())?;
        let mut ids = Vec::new();
        for row in rows {
            let id: i32 = row.get(0);
            ids.push(id as i64);
        }
        Ok(ids)
    }

    fn query_opt_string(
        &mut self,
        sql: &str,
        params: &[String],
    ) -> QueryResult<Option<Option<String>>> {
        let mut binds: Vec<&(dyn postgres::types::ToSql + Sync)> = Vec::new();
        for p in params {
            binds.push(p);
        }
        let rows = self
            .db
            .borrow_mut()
            .client()
            .query(sql, binds.as_slice())?;
        match rows.first() {
            Some(row) => {
                let val: Option<String> = row.get(0);
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    /// First accepted, correctly-spelled name matching a text_name; falls
    /// back to a deprecated match when that is all there is.
    fn best_name_match(&mut self, text_name: &str) -> QueryResult<Option<i64>> {
        let ids = self.query_ids(
            "SELECT id FROM names \
             WHERE text_name = $1 AND correct_spelling_id IS NULL \
             ORDER BY deprecated ASC, id ASC LIMIT 1",
            &[text_name.to_string()],
        )?;
        Ok(ids.first().copied())
    }

    fn name_row(&mut self, id: i64) -> QueryResult<Option<NameRow>> {
        let sql = format!(
            "SELECT rank, text_name, classification, synonym_id, deprecated \
             FROM names WHERE id = {id}"
        );
        let rows = self.db.borrow_mut().client().query(sql.as_str(), &[])?;
        match rows.first() {
            Some(row) => {
                let rank: Option<i32> = row.get(0);
                let text_name: Option<String> = row.get(1);
                let classification: Option<String> = row.get(2);
                let synonym_id: Option<i32> = row.get(3);
                Ok(Some(NameRow {
                    rank: rank.and_then(|r| Rank::from_int(r as i64)),
                    text_name: text_name.unwrap_or_default(),
                    classification: classification.unwrap_or_default(),
                    synonym_id: synonym_id.map(|s| s as i64),
                }))
            }
            None => Ok(None),
        }
    }
}

struct NameRow {
    rank: Option<Rank>,
    text_name: String,
    classification: String,
    synonym_id: Option<i64>,
}

impl Store for PgStore {
    fn display_name(&mut self, model: Model, id: i64) -> QueryResult<Option<String>> {
        let table = model.table();
        let result = match model {
            Model::User => self.query_opt_string(
                &format!(
                    "SELECT CASE WHEN name IS NULL OR name = '' THEN login ELSE name END \
                     FROM users WHERE id = {id}"
                ),
                &[],
            )?,
            Model::Location | Model::Herbarium => {
                self.query_opt_string(&format!("SELECT name FROM {table} WHERE id = {id}"), &[])?
            }
            Model::Name => self.query_opt_string(
                &format!("SELECT display_name FROM names WHERE id = {id}"),
                &[],
            )?,
            Model::Project | Model::SpeciesList => {
                self.query_opt_string(&format!("SELECT title FROM {table} WHERE id = {id}"), &[])?
            }
            Model::Comment => {
                self.query_opt_string(&format!("SELECT summary FROM comments WHERE id = {id}"), &[])?
            }
            _ => {
                // No natural display column; report bare existence and let
                // the caller format a tag + id label.
                let ids = self.query_ids(&format!("SELECT id FROM {table} WHERE id = {id}"), &[])?;
                if ids.is_empty() {
                    return Ok(None);
                }
                Some(None)
            }
        };

        match result {
            None => Ok(None),
            Some(Some(s)) if !s.is_empty() => Ok(Some(s)),
            Some(_) => Ok(Some(format!("{} #{}", model.type_tag(), id))),
        }
    }

    fn ids_matching(&mut self, model: Model, text: &str) -> QueryResult<Vec<i64>> {
        match model {
            Model::User => {
                // Strip any "<Full Name>" suffix off a login string.
                let login = match text.find('<') {
                    Some(pos) => text[..pos].trim().to_string(),
                    None => text.trim().to_string(),
                };
                self.query_ids("SELECT id FROM users WHERE login = $1", &[login])
            }
            Model::Project => {
                self.query_ids("SELECT id FROM projects WHERE title = $1", &[text.to_string()])
            }
            Model::SpeciesList => self.query_ids(
                "SELECT id FROM species_lists WHERE title = $1",
                &[text.to_string()],
            ),
            Model::Herbarium => {
                self.query_ids("SELECT id FROM herbaria WHERE name = $1", &[text.to_string()])
            }
            Model::Location => {
                let pattern = format!("%{}%", google::clean_pattern(text));
                self.query_ids("SELECT id FROM locations WHERE name LIKE $1", &[pattern])
            }
            Model::Name => {
                let ids = self.query_ids(
                    "SELECT id FROM names WHERE search_name = $1",
                    &[text.to_string()],
                )?;
                if !ids.is_empty() {
                    return Ok(ids);
                }
                self.query_ids("SELECT id FROM names WHERE text_name = $1", &[text.to_string()])
            }
            _ => Err(QueryError::Message(format!(
                "Don't know how to look up {} records by name",
                model.type_tag()
            ))),
        }
    }

    fn name_misspelling_ids(&mut self, name_id: i64) -> QueryResult<Vec<i64>> {
        self.query_ids(
            &format!("SELECT id FROM names WHERE correct_spelling_id = {name_id}"),
            &[],
        )
    }

    fn name_synonym_ids(&mut self, name_id: i64) -> QueryResult<Vec<i64>> {
        let row = match self.name_row(name_id)? {
            Some(r) => r,
            None => return Ok(vec![name_id]),
        };
        match row.synonym_id {
            Some(sid) => {
                self.query_ids(&format!("SELECT id FROM names WHERE synonym_id = {sid}"), &[])
            }
            None => Ok(vec![name_id]),
        }
    }

    fn name_rank_text(&mut self, name_id: i64) -> QueryResult<Option<(Rank, String)>> {
        Ok(self
            .name_row(name_id)?
            .and_then(|r| r.rank.map(|rank| (rank, r.text_name))))
    }

    fn name_children_ids(&mut self, name_id: i64, all: bool) -> QueryResult<Vec<i64>> {
        let row = match self.name_row(name_id)? {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };
        let rank = match row.rank {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        let (cond, arg) = if rank.at_or_below_genus() {
            (
                "correct_spelling_id IS NULL AND text_name LIKE $1",
                format!("{} %", google::clean_pattern(&row.text_name)),
            )
        } else {
            (
                "correct_spelling_id IS NULL AND classification LIKE $1",
                format!("%{}: _{}_%", rank.as_str(), google::clean_pattern(&row.text_name)),
            )
        };

        if all {
            return self.query_ids(&format!("SELECT id FROM names WHERE {cond}"), &[arg]);
        }

        // Immediate children only: highest rank below this one that has any
        // matches.
        for rank2 in Rank::ALL.iter().rev() {
            if rank2.index() >= rank.index() {
                continue;
            }
            let ids = self.query_ids(
                &format!(
                    "SELECT id FROM names WHERE {cond} AND rank = {}",
                    *rank2 as i64
                ),
                &[arg.clone()],
            )?;
            if !ids.is_empty() {
                return Ok(ids);
            }
        }
        Ok(Vec::new())
    }

    fn name_parent_ids(&mut self, name_id: i64, all: bool) -> QueryResult<Vec<i64>> {
        let row = match self.name_row(name_id)? {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        let mut parents = Vec::new();

        // Chop trailing epithets off the text name one at a time.
        let mut words: Vec<&str> = row
            .text_name
            .split(' ')
            .filter(|w| !matches!(*w, "group" | "clade" | "complex"))
            .collect();
        words.pop();
        while !words.is_empty() {
            let candidate = words.join(" ");
            words.pop();
            if candidate == row.text_name || candidate.ends_with('.') {
                continue;
            }
            if let Some(id) = self.best_name_match(&candidate)? {
                if !all {
                    return Ok(vec![id]);
                }
                parents.push(id);
            }
        }

        // Then walk the classification string from the bottom up.
        for (_, line_name) in parse_classification(&row.classification).into_iter().rev() {
            if let Some(id) = self.best_name_match(&line_name)? {
                if !all {
                    return Ok(vec![id]);
                }
                parents.push(id);
            }
        }

        parents.dedup();
        Ok(parents)
    }

    fn observation_image_ids(&mut self, obs_id: i64) -> QueryResult<Vec<i64>> {
        let thumb = self.query_ids(
            &format!("SELECT thumb_image_id FROM observations WHERE id = {obs_id} \
                      AND thumb_image_id IS NOT NULL"),
            &[],
        )?;
        let rest = self.query_ids(
            &format!(
                "SELECT image_id FROM images_observations WHERE observation_id = {obs_id} \
                 ORDER BY image_id"
            ),
            &[],
        )?;

        let mut ids = thumb;
        for id in rest {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn unknown_name_id(&mut self) -> QueryResult<i64> {
        let ids = self.query_ids(
            "SELECT id FROM names WHERE text_name = 'Fungi' ORDER BY id LIMIT 1",
            &[],
        )?;
        ids.first().copied().ok_or_else(|| {
            QueryError::ReferenceNotFound("the catch-all 'Fungi' name".to_string())
        })
    }

    fn select_ids(&mut self, sql: &str, params: &[String]) -> QueryResult<Vec<i64>> {
        self.query_ids(sql, params)
    }
}

/// Parse a classification string of "Rank: _Name_" lines into
/// (rank, name) pairs, top-down.
fn parse_classification(classification: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for line in classification.lines() {
        let line = line.trim().trim_end_matches('\r');
        if let Some((rank, rest)) = line.split_once(':') {
            let name = rest.trim().trim_matches('_');
            if !name.is_empty() {
                out.push((rank.trim().to_string(), name.to_string()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_parsing() {
        let text = "Kingdom: _Fungi_\r\nPhylum: _Basidiomycota_\r\nGenus: _Agaricus_";
        let parsed = parse_classification(text);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], ("Kingdom".to_string(), "Fungi".to_string()));
        assert_eq!(parsed[2], ("Genus".to_string(), "Agaricus".to_string()));
    }
}
