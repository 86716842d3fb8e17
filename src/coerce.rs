//! Coercion: convert a built query for one model into an equivalent query
//! for a related model without re-deriving the search from scratch.
//!
//! Exactly four rule families, tried in order, first match wins.  When no
//! rule applies the result is None, never an error -- callers hide the
//! affordance instead.
use crate::flavor::{self, Flavor};
use crate::lookup::Store;
use crate::metadata::Model;
use crate::params::{ParamValues, Value};
use crate::query::Query;
use crate::result::QueryResult;

fn is_with_observations(flavor: Flavor) -> bool {
    flavor.as_str().starts_with("with_observations")
}

fn is_with_descriptions(flavor: Flavor) -> bool {
    flavor.as_str().starts_with("with_descriptions")
}

/// RssLog `all` can become any logged model's `by_rss_log`.
fn rss_log_rule(query: &Query, new_model: Model) -> bool {
    query.model() == Model::RssLog && query.flavor() == Flavor::All && new_model.has_rss_log()
}

/// "Objects with observations/descriptions" can become those observations
/// or descriptions themselves.
fn unwrap_rule(query: &Query, new_model: Model) -> bool {
    let old = query.model();
    let flavor = query.flavor();
    (new_model == Model::Observation
        && matches!(old, Model::Image | Model::Location | Model::Name)
        && is_with_observations(flavor))
        || (new_model == Model::LocationDescription
            && old == Model::Location
            && is_with_descriptions(flavor))
        || (new_model == Model::NameDescription
            && old == Model::Name
            && is_with_descriptions(flavor))
}

/// The inverse: observation/description queries can be wrapped back into
/// queries over their owning objects.
fn wrap_rule(query: &Query, new_model: Model) -> Option<&'static str> {
    let old = query.model();
    if old == Model::Observation
        && matches!(new_model, Model::Image | Model::Location | Model::Name)
    {
        Some("observations")
    } else if (old == Model::LocationDescription && new_model == Model::Location)
        || (old == Model::NameDescription && new_model == Model::Name)
    {
        Some("descriptions")
    } else {
        None
    }
}

/// Cheap applicability test: no lookups, no id materialization.  Supports
/// "can this be viewed as X" UI decisions.
pub fn can_coerce(query: &Query, new_model: Model) -> bool {
    if query.model() == new_model {
        return true;
    }
    if rss_log_rule(query, new_model) || unwrap_rule(query, new_model) {
        return true;
    }
    if let Some(type1) = wrap_rule(query, new_model) {
        return match query.flavor() {
            Flavor::InSet | Flavor::AdvancedSearch | Flavor::PatternSearch => true,
            Flavor::AtLocation => new_model == Model::Location,
            Flavor::OfName => false,
            old => wrapped_flavor(type1, old)
                .map(|f| flavor::is_allowed(new_model, f))
                .unwrap_or(false),
        };
    }
    false
}

/// Attempt the coercion.  Returns None when no rule applies.
pub fn coerce(
    query: &Query,
    new_model: Model,
    store: &mut dyn Store,
) -> QueryResult<Option<Query>> {
    // Trivial case -- the model's not actually different.
    if query.model() == new_model {
        return Ok(Some(query.clone()));
    }

    if rss_log_rule(query, new_model) {
        let mut params2 = query.params().clone();
        params2.remove("type");
        let result = Query::build(new_model, Flavor::ByRssLog, &params2.to_json(), store)?;
        return Ok(Some(result));
    }

    if unwrap_rule(query, new_model) {
        return unwrap(query, new_model, store).map(Some);
    }

    if let Some(type1) = wrap_rule(query, new_model) {
        return wrap(query, new_model, type1, store);
    }

    Ok(None)
}

/// with_X(_Y) on the owner model becomes Y (or `all`) on the owned model.
fn unwrap(query: &Query, new_model: Model, store: &mut dyn Store) -> QueryResult<Query> {
    let old = query.flavor().as_str();
    let new_flavor = if old == "with_observations" || old == "with_descriptions" {
        Flavor::All
    } else {
        let stripped = old
            .strip_prefix("with_observations_")
            .or_else(|| old.strip_prefix("with_descriptions_"))
            .unwrap_or(old);
        match Flavor::parse(stripped) {
            Some(f) => f,
            None => Flavor::All,
        }
    };

    let mut params2 = query.params().clone();

    if params2.contains("title") {
        set_raw_title(&mut params2, &query.title().text());
    } else if let Some(old_title) = params2.get_str("old_title").map(str::to_string) {
        set_raw_title(&mut params2, &old_title);
        params2.remove("old_title");
    }

    if let Some(old_by) = params2.get_str("old_by").map(str::to_string) {
        params2.insert("by", Value::Str(old_by));
        params2.remove("old_by");
    } else {
        // The old sort order may not be valid against the new model.
        params2.remove("by");
    }

    Query::build(new_model, new_flavor, &params2.to_json(), store)
}

/// Y on the owned model becomes with_X_Y on the owner; set- and
/// search-based sources are re-anchored on materialized result ids because
/// a general predicate cannot always be re-expressed against the new model.
fn wrap(
    query: &Query,
    new_model: Model,
    type1: &'static str,
    store: &mut dyn Store,
) -> QueryResult<Option<Query>> {
    let old_flavor = query.flavor();
    let old_by = query.params().get_str("by").map(str::to_string);

    match old_flavor {
        Flavor::InSet => {
            let mut params2 = query.params().clone();
            params2.remove("title");
            params2.remove("by");
            params2.insert("old_title", Value::Str(query.title().text()));
            if let Some(by) = old_by {
                params2.insert("old_by", Value::Str(by));
            }
            let flavor = in_set_flavor(type1);
            Query::build(new_model, flavor, &params2.to_json(), store).map(Some)
        }

        Flavor::AdvancedSearch | Flavor::PatternSearch => {
            let ids = query.result_ids(store)?;
            let mut params2 = ParamValues::new();
            params2.insert(
                "ids",
                Value::List(ids.into_iter().map(Value::Int).collect()),
            );
            params2.insert("old_title", Value::Str(query.title().text()));
            if let Some(by) = old_by {
                params2.insert("old_by", Value::Str(by));
            }
            let flavor = in_set_flavor(type1);
            Query::build(new_model, flavor, &params2.to_json(), store).map(Some)
        }

        Flavor::AtLocation if new_model == Model::Location => {
            let location = match query.params().get_int("location") {
                Some(id) => id,
                None => return Ok(None),
            };
            let mut params2 = ParamValues::new();
            params2.insert("ids", Value::List(vec![Value::Int(location)]));
            Query::build(new_model, Flavor::InSet, &params2.to_json(), store).map(Some)
        }

        // Needs a synonym-aware flavor on the name side; none exists.
        Flavor::OfName => Ok(None),

        _ => {
            let new_flavor = match wrapped_flavor(type1, old_flavor) {
                Some(f) if flavor::is_allowed(new_model, f) => f,
                _ => return Ok(None),
            };
            let mut params2 = query.params().clone();
            if params2.contains("title") {
                set_raw_title(&mut params2, &query.title().text());
            }
            params2.remove("by");
            Query::build(new_model, new_flavor, &params2.to_json(), store).map(Some)
        }
    }
}

fn wrapped_flavor(type1: &str, old_flavor: Flavor) -> Option<Flavor> {
    if old_flavor == Flavor::All {
        Flavor::parse(&format!("with_{type1}"))
    } else {
        Flavor::parse(&format!("with_{type1}_{}", old_flavor.as_str()))
    }
}

fn in_set_flavor(type1: &str) -> Flavor {
    if type1 == "observations" {
        Flavor::WithObservationsInSet
    } else {
        Flavor::WithDescriptionsInSet
    }
}

fn set_raw_title(params: &mut ParamValues, title: &str) {
    params.insert(
        "title",
        Value::List(vec![Value::Str(format!("raw {title}"))]),
    );
}
