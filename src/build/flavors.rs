//! Flavor handlers for identity, relational, set, and taxonomy queries.
use super::common;
use crate::constants::{Rank, RSS_LOG_TYPES};
use crate::flavor::Flavor;
use crate::google;
use crate::lookup::{resolve_single, Store};
use crate::metadata::Model;
use crate::params::Value;
use crate::query::{id_set, Query};
use crate::result::{QueryError, QueryResult};

/// The unfiltered query.  RSS logs may restrict to the object types the
/// caller cares about.
pub(crate) fn all(q: &mut Query) -> QueryResult<()> {
    if let Some(by) = q.params.get_str("by") {
        q.title.tag = "query_title_all_by".to_string();
        let by = by.to_string();
        q.title.set("order", &by);
    }

    if q.model() == Model::RssLog {
        let types = q.params.get_str("type").unwrap_or("all").to_string();
        let types: Vec<&str> = types.split_whitespace().collect();
        if !types.contains(&"all") {
            let known: Vec<&str> = types
                .iter()
                .copied()
                .filter(|t| RSS_LOG_TYPES.contains(t))
                .collect();
            if known.is_empty() {
                q.add_where("FALSE");
            } else {
                let conds: Vec<String> = known
                    .iter()
                    .map(|t| format!("rss_logs.{t}_id IS NOT NULL"))
                    .collect();
                q.add_where(conds.join(" OR "));
            }
        }
    }
    Ok(())
}

pub(crate) fn by_rss_log(q: &mut Query) -> QueryResult<()> {
    q.add_join(&["rss_logs"]);
    q.default_by("rss_log");
    Ok(())
}

pub(crate) fn by_user(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let user = common::required_param(q, "user")?;
    let (id, display) = resolve_single(store, Model::User, &user)?;
    q.title.set("user", &display);
    q.params.insert("user", Value::Int(id));

    if !q.model().has_column("user_id") {
        return Err(QueryError::Message(format!(
            "Can't figure out how to select {} by user_id",
            q.model()
        )));
    }
    let table = q.table();
    q.add_where(format!("{table}.user_id = {id}"));

    match q.model() {
        Model::Observation | Model::Image => q.default_by("updated_at"),
        Model::Location | Model::Name | Model::LocationDescription | Model::NameDescription => {
            q.default_by("name")
        }
        Model::SpeciesList => q.default_by("title"),
        Model::Comment => q.default_by("created_at"),
        _ => (),
    }
    Ok(())
}

/// Authorship and editorship are recorded differently per model: versioned
/// models track editors in their versions table, descriptions keep explicit
/// author/editor glue tables.
pub(crate) fn by_author_or_editor(
    q: &mut Query,
    store: &mut dyn Store,
    flavor: Flavor,
) -> QueryResult<()> {
    let user = common::required_param(q, "user")?;
    let (id, display) = resolve_single(store, Model::User, &user)?;
    q.title.set("user", &display);
    q.params.insert("user", Value::Int(id));

    let table = q.table();
    match q.model() {
        Model::Name | Model::Location => {
            let version_table = format!("{table}_versions");
            q.add_join(&[version_table.as_str()]);
            q.add_where(format!("{version_table}.user_id = {id}"));
            q.add_where(format!("{table}.user_id != {id}"));
        }
        Model::NameDescription | Model::LocationDescription => {
            let glue = if flavor == Flavor::ByAuthor {
                "authors"
            } else {
                "editors"
            };
            let glue_table = format!("{table}_{glue}");
            q.add_join(&[glue_table.as_str()]);
            q.add_where(format!("{glue_table}.user_id = {id}"));
            q.default_by("name");
        }
        _ => {
            return Err(QueryError::Message(format!(
                "No editors or authors in {}",
                q.model()
            )))
        }
    }
    Ok(())
}

pub(crate) fn for_project(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let project = common::required_param(q, "project")?;
    let (id, display) = resolve_single(store, Model::Project, &project)?;
    q.title.set("project", &display);
    q.params.insert("project", Value::Int(id));

    let mut tables = [q.table(), "projects"];
    tables.sort();
    let join_table = tables.join("_");
    q.add_join(&[join_table.as_str()]);
    q.add_where(format!("{join_table}.project_id = {id}"));
    Ok(())
}

pub(crate) fn for_target(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let type_name = q.params.get_str("type").unwrap_or_default().to_string();
    let target_model = Model::parse(&type_name).ok_or_else(|| {
        QueryError::Message(format!("Invalid target type: '{type_name}'"))
    })?;
    if !target_model.has_comments() {
        return Err(QueryError::Message(format!(
            "The model {type_name} does not support comments"
        )));
    }

    let target = common::required_param(q, "target")?;
    let (id, display) = resolve_single(store, target_model, &target)?;
    q.title.set("object", &display);

    q.add_where(format!("comments.target_id = {id}"));
    q.add_where_binds("comments.target_type = ?", vec![type_name]);
    q.default_by("created_at");
    Ok(())
}

pub(crate) fn for_user(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let user = common::required_param(q, "user")?;
    let (id, display) = resolve_single(store, Model::User, &user)?;
    q.title.set("user", &display);
    q.params.insert("user", Value::Int(id));

    q.add_join(&["observations"]);
    q.add_where(format!("observations.user_id = {id}"));
    q.default_by("created_at");
    Ok(())
}

pub(crate) fn in_set(q: &mut Query) -> QueryResult<()> {
    let ids = q.params.get_id_list("ids").unwrap_or_default();
    let table = q.table();
    let set = id_set(&ids);
    q.add_where(format!("{table}.id IN ({set})"));
    if !ids.is_empty() {
        // Preserve the caller's ordering.
        q.order = format!("array_position(ARRAY[{set}], {table}.id) ASC");
    }
    Ok(())
}

pub(crate) fn at_location(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let location = common::required_param(q, "location")?;
    let (id, display) = resolve_single(store, Model::Location, &location)?;
    q.title.set("location", &display);
    q.params.insert("location", Value::Int(id));

    if q.model() == Model::Observation {
        q.add_join(&["names"]);
    }
    let table = q.table();
    q.add_where(format!("{table}.location_id = {id}"));
    q.default_by("name");
    Ok(())
}

pub(crate) fn at_where(q: &mut Query) -> QueryResult<()> {
    let user_where = q.params.get_str("user_where").unwrap_or_default().to_string();
    q.title.set("where", &user_where);

    let pattern = q.params.get_str("location").unwrap_or_default();
    let pattern = format!("%{}%", google::clean_pattern(pattern));

    if q.model() == Model::Observation {
        q.add_join(&["names"]);
    }
    let table = q.table();
    q.add_where_binds(format!("{table}.where ILIKE ?"), vec![pattern]);
    q.default_by("name");
    Ok(())
}

pub(crate) fn in_species_list(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let list = common::required_param(q, "species_list")?;
    let (id, display) = resolve_single(store, Model::SpeciesList, &list)?;
    q.title.set("species_list", &display);
    q.params.insert("species_list", Value::Int(id));

    q.add_join(&["names"]);
    q.add_join(&["observations_species_lists"]);
    q.add_where(format!("observations_species_lists.species_list_id = {id}"));
    q.default_by("name");
    Ok(())
}

/// Nested query: the images belonging to one observation of an outer
/// observation query, thumbnail first.
pub(crate) fn inside_observation(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let obs = common::required_param(q, "observation")?;
    let (obs_id, display) = resolve_single(store, Model::Observation, &obs)?;
    q.title.set("observation", &display);

    let ids = store.observation_image_ids(obs_id)?;
    let set = id_set(&ids);
    q.add_where(format!("images.id IN ({set})"));
    if !ids.is_empty() {
        q.order = format!("array_position(ARRAY[{set}], images.id) ASC");
    }

    let outer_desc = match q.params.get("outer") {
        Some(Value::Query(desc)) => desc.clone(),
        _ => return Err(QueryError::MissingParam("outer".to_string())),
    };
    let mut outer = Query::from_description(&outer_desc, store)?;
    // The outer query must skip observations with no images.
    outer.add_join(&["images_observations"]);
    q.outer = Some(Box::new(outer));
    Ok(())
}

/// Mode flags controlling `of_name` queries.
struct NameModes {
    synonyms: String,
    nonconsensus: String,
}

/// Select observations (or objects derived from them) identified as a
/// given name, with orthogonal synonym- and nonconsensus-inclusion modes.
pub(crate) fn of_name(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let name_val = common::required_param(q, "name")?;
    let name_ids_anchor: Vec<i64> = match &name_val {
        Value::Int(id) => vec![*id],
        Value::Str(s) => store.ids_matching(Model::Name, s)?,
        _ => Vec::new(),
    };

    let modes = NameModes {
        synonyms: q.params.get_str("synonyms").unwrap_or("no").to_string(),
        nonconsensus: q.params.get_str("nonconsensus").unwrap_or("no").to_string(),
    };

    q.title.tag = "query_title_of_name".to_string();
    if modes.synonyms != "no" {
        q.title.tag = "query_title_of_name_synonym".to_string();
    }
    if modes.nonconsensus != "no" {
        q.title.tag = "query_title_of_name_nonconsensus".to_string();
    }
    let display = if name_ids_anchor.len() == 1 {
        store
            .display_name(Model::Name, name_ids_anchor[0])?
            .unwrap_or_else(|| format!("name #{}", name_ids_anchor[0]))
    } else {
        match &name_val {
            Value::Str(s) => s.clone(),
            Value::Int(id) => format!("name #{id}"),
            _ => String::new(),
        }
    };
    q.title.set("name", &display);

    let mut name_ids: Vec<i64> = Vec::new();
    match modes.synonyms.as_str() {
        "no" => {
            name_ids.extend(&name_ids_anchor);
            for id in &name_ids_anchor {
                name_ids.extend(store.name_misspelling_ids(*id)?);
            }
        }
        "all" => {
            for id in &name_ids_anchor {
                name_ids.extend(store.name_synonym_ids(*id)?);
            }
        }
        "exclusive" => {
            let mut excluded: Vec<i64> = name_ids_anchor.clone();
            for id in &name_ids_anchor {
                excluded.extend(store.name_misspelling_ids(*id)?);
            }
            for id in &name_ids_anchor {
                for syn in store.name_synonym_ids(*id)? {
                    if !excluded.contains(&syn) {
                        name_ids.push(syn);
                    }
                }
            }
        }
        other => {
            return Err(QueryError::InvalidEnum {
                param: "synonyms".to_string(),
                value: other.to_string(),
            })
        }
    }
    name_ids.sort_unstable();
    name_ids.dedup();
    let set = id_set(&name_ids);

    let mut extra_joins: Vec<String> = Vec::new();
    match modes.nonconsensus.as_str() {
        "no" => {
            q.add_where(format!(
                "observations.name_id IN ({set}) AND \
                 COALESCE(observations.vote_cache,0) >= 0"
            ));
            q.order =
                "COALESCE(observations.vote_cache,0) DESC, observations.when DESC".to_string();
        }
        "all" => {
            q.add_where(format!("namings.name_id IN ({set})"));
            q.order = "COALESCE(namings.vote_cache,0) DESC, observations.when DESC".to_string();
            extra_joins.push("namings".to_string());
        }
        "exclusive" => {
            q.add_where(format!(
                "namings.name_id IN ({set}) AND \
                 (observations.name_id NOT IN ({set}) OR \
                 COALESCE(observations.vote_cache,0) < 0)"
            ));
            q.order = "COALESCE(namings.vote_cache,0) DESC, observations.when DESC".to_string();
            extra_joins.push("namings".to_string());
        }
        other => {
            return Err(QueryError::InvalidEnum {
                param: "nonconsensus".to_string(),
                value: other.to_string(),
            })
        }
    }

    // Optional restriction to one project, species list, or user.
    if let Some(project) = q.params.get("project").cloned() {
        let (id, _) = resolve_single(store, Model::Project, &project)?;
        q.add_where(format!("observations_projects.project_id = {id}"));
        extra_joins.push("observations_projects".to_string());
    }
    if let Some(list) = q.params.get("species_list").cloned() {
        let (id, _) = resolve_single(store, Model::SpeciesList, &list)?;
        q.add_where(format!("observations_species_lists.species_list_id = {id}"));
        extra_joins.push("observations_species_lists".to_string());
    }
    if let Some(user) = q.params.get("user").cloned() {
        let (id, _) = resolve_single(store, Model::User, &user)?;
        q.add_where(format!("observations.user_id = {id}"));
    }

    // Join paths differ per model.
    match q.model() {
        Model::Observation => {
            for table in &extra_joins {
                q.add_join(&[table.as_str()]);
            }
        }
        Model::Location => {
            q.add_join(&["observations"]);
            for table in &extra_joins {
                q.add_join(&["observations", table.as_str()]);
            }
            q.add_where("observations.is_collection_location IS TRUE");
        }
        Model::Image => {
            q.add_join(&["images_observations", "observations"]);
            for table in &extra_joins {
                q.add_join(&["observations", table.as_str()]);
            }
        }
        _ => (),
    }
    Ok(())
}

/// Children of a name.  At or below genus the hierarchy is deduced from
/// the name's own syntax; above genus (or when all descendants are wanted)
/// the id set comes from the classification strings.
pub(crate) fn of_children(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let name_val = common::required_param(q, "name")?;
    let (name_id, display) = resolve_single(store, Model::Name, &name_val)?;
    q.title.set("name", &display);
    let all = q.params.get_bool("all").unwrap_or(false);
    q.default_by("name");

    let (rank, text_name) = store
        .name_rank_text(name_id)?
        .ok_or_else(|| QueryError::ReferenceNotFound(format!("name #{name_id}")))?;

    if all || !rank.at_or_below_genus() {
        let ids = store.name_children_ids(name_id, all)?;
        q.add_where(format!("names.id IN ({})", id_set(&ids)));
    } else {
        let clean = google::clean_pattern(&text_name);
        q.add_where_binds("names.text_name LIKE ?", vec![format!("{clean} %")]);
        // Limit depth to direct children: one extra epithet below genus,
        // two below species (e.g. "var. x" or "f. y").
        let depth_pattern = if rank == Rank::Genus {
            format!("{clean} % %")
        } else {
            format!("{clean} % % %")
        };
        q.add_where_binds("names.text_name NOT LIKE ?", vec![depth_pattern]);
    }

    match q.model() {
        Model::Observation => q.add_join(&["names"]),
        Model::Image => {
            q.add_join(&["images_observations", "observations"]);
            q.add_join(&["observations", "names"]);
        }
        Model::Location => q.add_join(&["observations", "names"]),
        _ => (),
    }
    Ok(())
}

/// Immediate parents of a name.
pub(crate) fn of_parents(q: &mut Query, store: &mut dyn Store) -> QueryResult<()> {
    let name_val = common::required_param(q, "name")?;
    let (name_id, display) = resolve_single(store, Model::Name, &name_val)?;
    q.title.set("name", &display);

    let ids = store.name_parent_ids(name_id, false)?;
    q.add_where(format!("names.id IN ({})", id_set(&ids)));
    q.default_by("name");
    Ok(())
}
