//! Join planning: an ordered, deduplicated list of join requests resolved
//! against the foreign-key metadata and rendered as JOIN clauses.
//!
//! Join targets are written `table`, `table.alias` for alternate
//! associations, with a trailing `!` to request LEFT OUTER semantics.
//! Requesting a path that is already present is a no-op; an OUTER request
//! upgrades an existing INNER entry, but an INNER request never downgrades
//! an existing OUTER one.
use crate::metadata::{self, JoinKey, Model};
use crate::result::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub table: String,
    pub alias: Option<String>,
    pub outer: bool,
}

impl JoinSpec {
    /// Parse "table", "table.alias", "table!", or "table.alias!".
    pub fn parse(raw: &str) -> JoinSpec {
        let (body, outer) = match raw.strip_suffix('!') {
            Some(b) => (b, true),
            None => (raw, false),
        };
        match body.split_once('.') {
            Some((table, alias)) => JoinSpec {
                table: table.to_string(),
                alias: Some(alias.to_string()),
                outer,
            },
            None => JoinSpec {
                table: body.to_string(),
                alias: None,
                outer,
            },
        }
    }

    /// Identity used for deduplication and metadata lookup: `table[.alias]`.
    pub fn key(&self) -> String {
        match &self.alias {
            Some(a) => format!("{}.{}", self.table, a),
            None => self.table.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct JoinStep {
    /// Key of the table this step joins from (the base table or the key of
    /// an earlier step).
    from: String,
    spec: JoinSpec,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinPlan {
    steps: Vec<JoinStep>,
}

impl JoinPlan {
    pub fn new() -> Self {
        JoinPlan { steps: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the plan already includes the given target key.
    pub fn uses(&self, key: &str) -> bool {
        let key = key.strip_suffix('!').unwrap_or(key);
        self.steps.iter().any(|s| s.spec.key() == key)
    }

    /// All join specs in insertion order.
    pub fn specs(&self) -> impl Iterator<Item = &JoinSpec> {
        self.steps.iter().map(|s| &s.spec)
    }

    /// Request a chain of joins starting at `base`: each element joins from
    /// the previous one.
    pub fn add_path(&mut self, base: &str, path: &[&str]) {
        let mut from = base.to_string();
        for raw in path {
            let spec = JoinSpec::parse(raw);
            let key = spec.key();
            self.add_step(&from, spec);
            from = key;
        }
    }

    fn add_step(&mut self, from: &str, spec: JoinSpec) {
        let key = spec.key();
        if let Some(existing) = self.steps.iter_mut().find(|s| s.spec.key() == key) {
            // Upgrade INNER to OUTER on request; never the other way.
            if spec.outer {
                existing.spec.outer = true;
            }
            return;
        }
        self.steps.push(JoinStep {
            from: from.to_string(),
            spec,
        });
    }

    /// Render the JOIN clauses, resolving every hop against the join
    /// metadata.  An unresolvable hop is a construction error.
    pub fn sql(&self) -> QueryResult<String> {
        let mut sql = String::new();
        for step in &self.steps {
            sql.push(' ');
            sql += &join_clause(step)?;
        }
        Ok(sql)
    }
}

fn join_clause(step: &JoinStep) -> QueryResult<String> {
    let from_table = step.from.split('.').next().unwrap_or(&step.from);
    let to_key = step.spec.key();
    let to_table = &step.spec.table;

    // Forward join first (from holds the foreign key), so the target's
    // primary key index is the one used.  Aliased targets only resolve
    // in this direction.
    let cond = if let Some(key) = metadata::join_key(from_table, &to_key) {
        render_condition(from_table, to_table, key)?
    } else if let Some(key) = metadata::join_key(to_table, from_table) {
        render_condition(to_table, from_table, key)?
    } else {
        return Err(QueryError::NoJoinPath {
            from: from_table.to_string(),
            to: to_key,
        });
    };

    let join_kind = if step.spec.outer {
        "LEFT OUTER JOIN"
    } else {
        "JOIN"
    };

    Ok(format!("{join_kind} {to_table} ON {cond}"))
}

/// `owner` holds the connecting column(s); `other` is the table it points at.
fn render_condition(owner: &str, other: &str, key: JoinKey) -> QueryResult<String> {
    match key {
        JoinKey::Fk(col) => Ok(format!("{owner}.{col} = {other}.id")),
        JoinKey::Pair(owner_col, other_col) => {
            Ok(format!("{owner}.{owner_col} = {other}.{other_col}"))
        }
        JoinKey::Poly(col) => {
            let model = Model::from_table(other).ok_or_else(|| {
                QueryError::Message(format!(
                    "Polymorphic join to unknown model table: {other}"
                ))
            })?;
            Ok(format!(
                "{owner}.{col}_id = {other}.id AND {owner}.{col}_type = '{}'",
                model.as_str()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_markers() {
        let spec = JoinSpec::parse("location_descriptions.default!");
        assert_eq!(spec.table, "location_descriptions");
        assert_eq!(spec.alias.as_deref(), Some("default"));
        assert!(spec.outer);
        assert_eq!(spec.key(), "location_descriptions.default");
    }

    #[test]
    fn dedup_and_upgrade() {
        let mut plan = JoinPlan::new();
        plan.add_path("observations", &["names"]);
        plan.add_path("observations", &["names"]);
        assert_eq!(plan.len(), 1);

        // INNER then OUTER upgrades.
        plan.add_path("observations", &["locations"]);
        plan.add_path("observations", &["locations!"]);
        let spec = plan.specs().find(|s| s.table == "locations").unwrap();
        assert!(spec.outer);

        // OUTER is never downgraded by a later INNER request.
        let mut plan = JoinPlan::new();
        plan.add_path("observations", &["locations!"]);
        plan.add_path("observations", &["locations"]);
        let spec = plan.specs().find(|s| s.table == "locations").unwrap();
        assert!(spec.outer);
    }

    #[test]
    fn renders_forward_and_reverse_joins() {
        let mut plan = JoinPlan::new();
        plan.add_path("images", &["images_observations", "observations"]);
        let sql = plan.sql().unwrap();
        assert_eq!(
            sql,
            " JOIN images_observations ON images_observations.image_id = images.id \
             JOIN observations ON images_observations.observation_id = observations.id"
        );
    }

    #[test]
    fn renders_aliased_and_outer_joins() {
        let mut plan = JoinPlan::new();
        plan.add_path("observations", &["images.thumb_image"]);
        plan.add_path("observations", &["locations!"]);
        let sql = plan.sql().unwrap();
        assert!(sql.contains("JOIN images ON observations.thumb_image_id = images.id"));
        assert!(sql.contains(
            "LEFT OUTER JOIN locations ON observations.location_id = locations.id"
        ));
    }

    #[test]
    fn chains_through_aliased_tables() {
        let mut plan = JoinPlan::new();
        plan.add_path("observations", &["images.thumb_image", "image_votes"]);
        let sql = plan.sql().unwrap();
        assert!(sql.contains("JOIN image_votes ON image_votes.image_id = images.id"));
    }

    #[test]
    fn renders_polymorphic_joins() {
        let mut plan = JoinPlan::new();
        plan.add_path("names", &["comments"]);
        let sql = plan.sql().unwrap();
        assert_eq!(
            sql,
            " JOIN comments ON comments.target_id = names.id \
             AND comments.target_type = 'Name'"
        );
    }

    #[test]
    fn unknown_hop_is_an_error() {
        let mut plan = JoinPlan::new();
        plan.add_path("observations", &["herbaria"]);
        match plan.sql() {
            Err(QueryError::NoJoinPath { from, to }) => {
                assert_eq!(from, "observations");
                assert_eq!(to, "herbaria");
            }
            other => panic!("expected NoJoinPath, got {other:?}"),
        }
    }
}
