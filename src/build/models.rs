//! Model-wide optional filters, applied to every query of a given model
//! after the flavor handler runs.
use super::common::{self, NameFilter};
use crate::constants::{COMMENT_TARGET_TYPES, LOCATION_DESC_NOTE_FIELDS, NAME_DESC_NOTE_FIELDS};
use crate::lookup::Store;
use crate::metadata::Model;
use crate::query::Query;
use crate::result::QueryResult;

pub(crate) fn apply(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    match q.model() {
        Model::Comment => comment(q),
        Model::Herbarium | Model::Specimen => Ok(()),
        Model::Image => image(q, store),
        Model::Location => location(q),
        Model::LocationDescription | Model::NameDescription => description(q),
        Model::Name => name(q, store),
        Model::Observation => observation(q, store),
        Model::Project => project(q),
        Model::RssLog => rss_log(q),
        Model::SpeciesList => species_list(q, store),
        Model::User => user(q),
    }
}

fn times_and_users(q: &mut Query) -> QueryResult<()> {
    common::do_time(q, "created_at", "created_at")?;
    common::do_time(q, "updated_at", "updated_at")?;
    common::do_objects_by_id(q, "users", "user_id");
    Ok(())
}

fn comment(q: &mut Query) -> QueryResult<()> {
    times_and_users(q)?;
    common::do_enum_set_str(q, "types", "target_type", COMMENT_TARGET_TYPES);
    common::do_search(q, "summary_has", "summary")?;
    common::do_search(q, "content_has", "comment")?;
    Ok(())
}

fn image(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    times_and_users(q)?;
    common::do_date(q, "date", "when")?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "names",
        "observations.name_id",
        NameFilter::None,
        &["images_observations", "observations"],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "synonym_names",
        "observations.name_id",
        NameFilter::Synonyms,
        &["images_observations", "observations"],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "children_names",
        "observations.name_id",
        NameFilter::AllChildren,
        &["images_observations", "observations"],
    )?;
    common::do_locations(q, store, "observations", &["images_observations", "observations"])?;
    common::do_objects_by_name(
        q,
        store,
        Model::Project,
        "projects",
        "images_projects.project_id",
        NameFilter::None,
        &["images_projects"],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::SpeciesList,
        "species_lists",
        "observations_species_lists.species_list_id",
        NameFilter::None,
        &["images_observations", "observations", "observations_species_lists"],
    )?;
    if q.params.get_str("has_observation").is_some() {
        q.add_join(&["images_observations"]);
    }
    common::do_image_size(q);
    common::do_image_types(q);
    common::do_boolean(
        q,
        "has_notes",
        "LENGTH(COALESCE(images.notes,'')) > 0",
        "LENGTH(COALESCE(images.notes,'')) = 0",
    );
    common::do_search(q, "notes_has", "notes")?;
    common::do_search(q, "copyright_holder_has", "copyright_holder")?;
    common::do_license(q);
    common::do_boolean(
        q,
        "has_votes",
        "images.vote_cache IS NOT NULL",
        "images.vote_cache IS NULL",
    );
    common::do_range(q, "quality", "vote_cache");
    if q.params.get_list("confidence").is_some() {
        q.add_join(&["images_observations", "observations"]);
        common::do_range(q, "confidence", "observations.vote_cache");
    }
    common::do_boolean(
        q,
        "ok_for_export",
        "images.ok_for_export IS TRUE",
        "images.ok_for_export IS FALSE",
    );
    Ok(())
}

fn location(q: &mut Query) -> QueryResult<()> {
    times_and_users(q)?;
    common::do_bounding_box(q, true);
    Ok(())
}

fn description(q: &mut Query) -> QueryResult<()> {
    times_and_users(q)
}

fn name(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    times_and_users(q)?;
    common::do_misspellings(q);
    common::do_deprecated(q);
    common::do_objects_by_name(q, store, Model::Name, "names", "id", NameFilter::None, &[])?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "synonym_names",
        "id",
        NameFilter::Synonyms,
        &[],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "children_names",
        "id",
        NameFilter::AllChildren,
        &[],
    )?;
    common::do_locations(q, store, "observations", &["observations"])?;
    common::do_objects_by_name(
        q,
        store,
        Model::SpeciesList,
        "species_lists",
        "observations_species_lists.species_list_id",
        NameFilter::None,
        &["observations", "observations_species_lists"],
    )?;
    common::do_rank(q);
    common::do_boolean(
        q,
        "is_deprecated",
        "names.deprecated IS TRUE",
        "names.deprecated IS FALSE",
    );
    common::do_boolean(
        q,
        "has_synonyms",
        "names.synonym_id IS NOT NULL",
        "names.synonym_id IS NULL",
    );
    common::do_boolean(
        q,
        "ok_for_export",
        "names.ok_for_export IS TRUE",
        "names.ok_for_export IS FALSE",
    );
    common::do_search(q, "text_name_has", "text_name")?;
    common::do_boolean(
        q,
        "has_author",
        "LENGTH(COALESCE(names.author,'')) > 0",
        "LENGTH(COALESCE(names.author,'')) = 0",
    );
    common::do_search(q, "author_has", "author")?;
    common::do_boolean(
        q,
        "has_citation",
        "LENGTH(COALESCE(names.citation,'')) > 0",
        "LENGTH(COALESCE(names.citation,'')) = 0",
    );
    common::do_search(q, "citation_has", "citation")?;
    common::do_boolean(
        q,
        "has_classification",
        "LENGTH(COALESCE(names.classification,'')) > 0",
        "LENGTH(COALESCE(names.classification,'')) = 0",
    );
    common::do_search(q, "classification_has", "classification")?;
    common::do_boolean(
        q,
        "has_notes",
        "LENGTH(COALESCE(names.notes,'')) > 0",
        "LENGTH(COALESCE(names.notes,'')) = 0",
    );
    common::do_search(q, "notes_has", "notes")?;
    comments_filters(q)?;
    common::do_boolean(
        q,
        "has_default_desc",
        "names.description_id IS NOT NULL",
        "names.description_id IS NULL",
    );

    let wants_desc = q.params.get_str("desc_type").is_some()
        || q.params.get_list("desc_project").is_some()
        || q.params.get_list("desc_creator").is_some()
        || q.params.get_str("desc_content").is_some();
    match q.params.get_str("join_desc") {
        Some("default") => q.add_join(&["name_descriptions.default"]),
        Some("any") => q.add_join(&["name_descriptions"]),
        _ => {
            if wants_desc {
                q.add_join(&["name_descriptions"]);
            }
        }
    }
    common::do_desc_type(q);
    common::do_objects_by_name(
        q,
        store,
        Model::Project,
        "desc_project",
        "name_descriptions.project_id",
        NameFilter::None,
        &[],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::User,
        "desc_creator",
        "name_descriptions.user_id",
        NameFilter::None,
        &[],
    )?;
    if q.params.get_str("desc_content").is_some() {
        let fields: Vec<String> = NAME_DESC_NOTE_FIELDS
            .iter()
            .map(|f| format!("COALESCE(name_descriptions.{f},'')"))
            .collect();
        let concat = format!("CONCAT({})", fields.join(","));
        common::do_search(q, "desc_content", &concat)?;
    }
    Ok(())
}

fn observation(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    times_and_users(q)?;
    common::do_date(q, "date", "when")?;
    common::do_objects_by_name(q, store, Model::Name, "names", "name_id", NameFilter::None, &[])?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "synonym_names",
        "name_id",
        NameFilter::Synonyms,
        &[],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "children_names",
        "name_id",
        NameFilter::AllChildren,
        &[],
    )?;
    common::do_locations(q, store, "observations", &[])?;
    common::do_objects_by_name(
        q,
        store,
        Model::Project,
        "projects",
        "observations_projects.project_id",
        NameFilter::None,
        &["observations_projects"],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::SpeciesList,
        "species_lists",
        "observations_species_lists.species_list_id",
        NameFilter::None,
        &["observations_species_lists"],
    )?;
    common::do_range(q, "confidence", "vote_cache");
    common::do_search(q, "notes_has", "notes")?;
    common::do_boolean(
        q,
        "is_col_loc",
        "observations.is_collection_location IS TRUE",
        "observations.is_collection_location IS FALSE",
    );
    common::do_boolean(
        q,
        "has_location",
        "observations.location_id IS NOT NULL",
        "observations.location_id IS NULL",
    );
    if q.params.get_bool("has_name").is_some() {
        let id = store.unknown_name_id()?;
        common::do_boolean(
            q,
            "has_name",
            &format!("observations.name_id != {id}"),
            &format!("observations.name_id = {id}"),
        );
    }
    common::do_boolean(
        q,
        "has_notes",
        "LENGTH(COALESCE(observations.notes,'')) > 0",
        "LENGTH(COALESCE(observations.notes,'')) = 0",
    );
    common::do_boolean(
        q,
        "has_votes",
        "observations.vote_cache IS NOT NULL",
        "observations.vote_cache IS NULL",
    );
    comments_filters(q)?;
    common::do_bounding_box(q, false);
    common::observation_filters(q);
    Ok(())
}

fn project(q: &mut Query) -> QueryResult<()> {
    times_and_users(q)?;
    if q.params.get_str("has_images").is_some() {
        q.add_join(&["images_projects"]);
    }
    if q.params.get_str("has_observations").is_some() {
        q.add_join(&["observations_projects"]);
    }
    if q.params.get_str("has_species_lists").is_some() {
        q.add_join(&["projects_species_lists"]);
    }
    common::do_search(q, "title_has", "title")?;
    // Projects keep their free text in the summary column.
    common::do_search(q, "notes_has", "summary")?;
    common::do_boolean(
        q,
        "has_notes",
        "LENGTH(COALESCE(projects.summary,'')) > 0",
        "LENGTH(COALESCE(projects.summary,'')) = 0",
    );
    comments_filters(q)?;
    Ok(())
}

fn rss_log(q: &mut Query) -> QueryResult<()> {
    common::do_time(q, "updated_at", "updated_at")
}

fn species_list(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    times_and_users(q)?;
    common::do_date(q, "date", "when")?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "names",
        "observations.name_id",
        NameFilter::None,
        &["observations_species_lists", "observations"],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "synonym_names",
        "observations.name_id",
        NameFilter::Synonyms,
        &["observations_species_lists", "observations"],
    )?;
    common::do_objects_by_name(
        q,
        store,
        Model::Name,
        "children_names",
        "observations.name_id",
        NameFilter::AllChildren,
        &["observations_species_lists", "observations"],
    )?;
    common::do_locations(q, store, "species_lists", &[])?;
    common::do_objects_by_name(
        q,
        store,
        Model::Project,
        "projects",
        "projects_species_lists.project_id",
        NameFilter::None,
        &["projects_species_lists"],
    )?;
    common::do_search(q, "title_has", "title")?;
    common::do_search(q, "notes_has", "notes")?;
    common::do_boolean(
        q,
        "has_notes",
        "LENGTH(COALESCE(species_lists.notes,'')) > 0",
        "LENGTH(COALESCE(species_lists.notes,'')) = 0",
    );
    comments_filters(q)?;
    Ok(())
}

fn user(q: &mut Query) -> QueryResult<()> {
    common::do_time(q, "created_at", "created_at")?;
    common::do_time(q, "updated_at", "updated_at")
}

/// Shared comment presence/content filters.
fn comments_filters(q: &mut Query) -> QueryResult<()> {
    if q.params.get_str("has_comments").is_some() {
        q.add_join(&["comments"]);
    }
    if q.params.get_str("comments_has").is_some() {
        common::do_search(q, "comments_has", "CONCAT(comments.summary,COALESCE(comments.comment,''))")?;
        q.add_join(&["comments"]);
    }
    Ok(())
}

/// Location descriptive-text columns, for search concatenations.
pub(crate) fn location_note_fields() -> Vec<String> {
    LOCATION_DESC_NOTE_FIELDS
        .iter()
        .map(|f| format!("COALESCE(location_descriptions.{f},'')"))
        .collect()
}

/// Name descriptive-text columns, for search concatenations.
pub(crate) fn name_note_fields() -> Vec<String> {
    NAME_DESC_NOTE_FIELDS
        .iter()
        .map(|f| format!("COALESCE(name_descriptions.{f},'')"))
        .collect()
}
