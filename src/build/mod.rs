//! Condition-builder dispatch: one handler per flavor, exhaustively
//! matched, followed by the model-wide filters, title customization, and
//! order resolution.
use crate::flavor::Flavor;
use crate::lookup::Store;
use crate::order;
use crate::query::Query;
use crate::result::{QueryError, QueryResult};

pub(crate) mod common;
mod flavors;
mod models;
mod observations;
mod search;

/// Run the full build pass over a freshly-validated query.
pub(crate) fn initialize(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    dispatch(q, store)?;
    models::apply(q, store)?;
    apply_title_lines(q)?;
    order::apply(q)?;
    apply_overrides(q);
    Ok(())
}

fn dispatch(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let flavor = q.flavor();
    match flavor {
        Flavor::All => flavors::all(q),
        Flavor::ByRssLog => flavors::by_rss_log(q),
        Flavor::ByUser => flavors::by_user(q, store),
        Flavor::ByAuthor | Flavor::ByEditor => flavors::by_author_or_editor(q, store, flavor),
        Flavor::ForProject => flavors::for_project(q, store),
        Flavor::ForTarget => flavors::for_target(q, store),
        Flavor::ForUser => flavors::for_user(q, store),
        Flavor::InSet => flavors::in_set(q),
        Flavor::AtLocation => flavors::at_location(q, store),
        Flavor::AtWhere => flavors::at_where(q),
        Flavor::InSpeciesList => flavors::in_species_list(q, store),
        Flavor::InsideObservation => flavors::inside_observation(q, store),
        Flavor::OfName => flavors::of_name(q, store),
        Flavor::OfChildren => flavors::of_children(q, store),
        Flavor::OfParents => flavors::of_parents(q, store),
        Flavor::PatternSearch => search::pattern_search(q),
        Flavor::RegexpSearch => search::regexp_search(q),
        Flavor::AdvancedSearch => search::advanced_search(q, store),
        Flavor::WithObservations => observations::with_observations(q),
        Flavor::WithObservationsAtLocation => {
            observations::with_observations_at_location(q, store)
        }
        Flavor::WithObservationsAtWhere => observations::with_observations_at_where(q),
        Flavor::WithObservationsByUser => observations::with_observations_by_user(q, store),
        Flavor::WithObservationsForProject => {
            observations::with_observations_for_project(q, store)
        }
        Flavor::WithObservationsInSet => observations::with_observations_in_set(q),
        Flavor::WithObservationsInSpeciesList => {
            observations::with_observations_in_species_list(q, store)
        }
        Flavor::WithObservationsOfChildren => {
            observations::with_observations_of_children(q, store)
        }
        Flavor::WithObservationsOfName => observations::with_observations_of_name(q, store),
        Flavor::WithDescriptions => observations::with_descriptions(q),
        Flavor::WithDescriptionsByUser => observations::with_descriptions_by_user(q, store),
        Flavor::WithDescriptionsByAuthor | Flavor::WithDescriptionsByEditor => {
            observations::with_descriptions_by_author_or_editor(q, store, flavor)
        }
        Flavor::WithDescriptionsInSet => observations::with_descriptions_in_set(q),
    }
}

/// The global `title` parameter carries "key value" lines overriding
/// individual title arguments; the key "raw" replaces the whole template.
fn apply_title_lines(q: &mut Query) -> QueryResult<()> {
    let lines = match q.params.get_str_list("title") {
        Some(lines) => lines.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        None => return Ok(()),
    };
    for line in lines {
        let (key, val) = line.split_once(' ').ok_or_else(|| {
            QueryError::Message(format!("Invalid syntax in title parameter: '{line}'"))
        })?;
        if key == "raw" {
            q.title.raw = Some(val.to_string());
        } else {
            q.title.set(key, val);
        }
    }
    Ok(())
}

/// Caller-supplied raw customization hooks: extra joins, predicates, and a
/// literal order expression.  These come from controller code, not users.
fn apply_overrides(q: &mut Query) {
    if let Some(joins) = q.params.get_str_list("join") {
        let joins: Vec<String> = joins.iter().map(|s| s.to_string()).collect();
        for j in joins {
            q.add_join(&[j.as_str()]);
        }
    }
    if let Some(wheres) = q.params.get_str_list("where") {
        let wheres: Vec<String> = wheres.iter().map(|s| s.to_string()).collect();
        for w in wheres {
            q.add_where(w);
        }
    }
    if let Some(order) = q.params.get_str("order") {
        q.order = order.to_string();
    }
}
