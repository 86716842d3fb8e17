//! Flavor handlers for queries over objects selected by their observations
//! or their descriptions.  These are the coercible flavors.
use super::common;
use super::flavors;
use crate::flavor::Flavor;
use crate::lookup::{resolve_single, Store};
use crate::metadata::Model;
use crate::params::Value;
use crate::query::{id_set, Query};
use crate::result::QueryResult;

/// Join from the query's base table to observations.  Images go through
/// the bridge table; locations and names join directly.
fn join_to_observations(q: &mut Query) {
    if q.model() == Model::Image {
        q.add_join(&["images_observations", "observations"]);
    } else {
        q.add_join(&["observations"]);
    }
}

/// Locations only count observations actually collected there.
fn collection_location_filter(q: &mut Query) {
    if q.model() == Model::Location {
        q.add_where("observations.is_collection_location IS TRUE");
    }
}

pub(crate) fn with_observations(q: &mut Query) -> QueryResult<()> {
    join_to_observations(q);
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_at_location(
    q: &mut Query,
    store: &mut dyn Store,
) -> QueryResult<()> {
    let location = common::required_param(q, "location")?;
    let (id, display) = resolve_single(store, Model::Location, &location)?;
    q.title.set("location", &display);
    q.params.insert("location", Value::Int(id));

    join_to_observations(q);
    q.add_where(format!("observations.location_id = {id}"));
    q.add_where("observations.is_collection_location IS TRUE");
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_at_where(q: &mut Query) -> QueryResult<()> {
    let user_where = q.params.get_str("user_where").unwrap_or_default().to_string();
    q.title.set("where", &user_where);

    let pattern = q.params.get_str("location").unwrap_or_default();
    let pattern = format!("%{}%", crate::google::clean_pattern(pattern));

    join_to_observations(q);
    q.add_where_binds("observations.where ILIKE ?", vec![pattern]);
    q.add_where("observations.is_collection_location IS TRUE");
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_by_user(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let user = common::required_param(q, "user")?;
    let (id, display) = resolve_single(store, Model::User, &user)?;
    q.title.set("user", &display);
    q.params.insert("user", Value::Int(id));

    join_to_observations(q);
    q.add_where(format!("observations.user_id = {id}"));
    collection_location_filter(q);
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_for_project(
    q: &mut Query,
    store: &mut dyn Store,
) -> QueryResult<()> {
    let project = common::required_param(q, "project")?;
    let (id, display) = resolve_single(store, Model::Project, &project)?;
    q.title.set("project", &display);
    q.params.insert("project", Value::Int(id));

    if q.model() == Model::Image {
        q.add_join(&["images_observations", "observations"]);
    }
    q.add_join(&["observations", "observations_projects"]);
    q.add_where(format!("observations_projects.project_id = {id}"));
    collection_location_filter(q);
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_in_set(q: &mut Query) -> QueryResult<()> {
    if let Some(old_title) = q.params.get_str("old_title") {
        let old_title = old_title.to_string();
        q.title.set("observations", &old_title);
    }
    let ids = q.params.get_id_list("ids").unwrap_or_default();

    join_to_observations(q);
    q.add_where(format!("observations.id IN ({})", id_set(&ids)));
    collection_location_filter(q);
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_in_species_list(
    q: &mut Query,
    store: &mut dyn Store,
) -> QueryResult<()> {
    let list = common::required_param(q, "species_list")?;
    let (id, display) = resolve_single(store, Model::SpeciesList, &list)?;
    q.title.set("species_list", &display);
    q.params.insert("species_list", Value::Int(id));

    if q.model() == Model::Image {
        q.add_join(&["images_observations", "observations"]);
    }
    q.add_join(&["observations", "observations_species_lists"]);
    q.add_where(format!("observations_species_lists.species_list_id = {id}"));
    collection_location_filter(q);
    q.default_by("name");
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_of_children(
    q: &mut Query,
    store: &mut dyn Store,
) -> QueryResult<()> {
    flavors::of_children(q, store)?;
    common::observation_filters(q);
    Ok(())
}

pub(crate) fn with_observations_of_name(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    flavors::of_name(q, store)?;
    q.title.tag = q
        .title
        .tag
        .replacen("query_title", "query_title_with_observations", 1);
    common::observation_filters(q);
    Ok(())
}

/// The description-based analogues.

fn desc_table(q: &Query) -> String {
    format!("{}_descriptions", q.model().type_tag())
}

pub(crate) fn with_descriptions(q: &mut Query) -> QueryResult<()> {
    let table = desc_table(q);
    q.add_join(&[table.as_str()]);
    q.default_by("name");
    Ok(())
}

pub(crate) fn with_descriptions_by_user(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let user = common::required_param(q, "user")?;
    let (id, display) = resolve_single(store, Model::User, &user)?;
    q.title.set("user", &display);
    q.params.insert("user", Value::Int(id));

    let table = desc_table(q);
    q.add_join(&[table.as_str()]);
    q.add_where(format!("{table}.user_id = {id}"));
    q.default_by("name");
    Ok(())
}

pub(crate) fn with_descriptions_by_author_or_editor(
    q: &mut Query,
    store: &mut dyn Store,
    flavor: Flavor,
) -> QueryResult<()> {
    let user = common::required_param(q, "user")?;
    let (id, display) = resolve_single(store, Model::User, &user)?;
    q.title.set("user", &display);
    q.params.insert("user", Value::Int(id));

    let table = desc_table(q);
    let glue = if flavor == Flavor::WithDescriptionsByAuthor {
        "authors"
    } else {
        "editors"
    };
    let glue_table = format!("{table}_{glue}");
    q.add_join(&[table.as_str(), glue_table.as_str()]);
    q.add_where(format!("{glue_table}.user_id = {id}"));
    q.default_by("name");
    Ok(())
}

pub(crate) fn with_descriptions_in_set(q: &mut Query) -> QueryResult<()> {
    if let Some(old_title) = q.params.get_str("old_title") {
        let old_title = old_title.to_string();
        q.title.set("descriptions", &old_title);
    }
    let ids = q.params.get_id_list("ids").unwrap_or_default();

    let table = desc_table(q);
    q.add_join(&[table.as_str()]);
    q.add_where(format!("{table}.id IN ({})", id_set(&ids)));
    q.default_by("name");
    Ok(())
}
