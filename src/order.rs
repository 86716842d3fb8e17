//! Sort-key resolution: maps a `by` key to a concrete ORDER BY expression,
//! model-dependently, adding joins (and occasionally predicates or
//! grouping) as a side effect.
//!
//! An unrecognized key is not an error; the query falls back to its
//! model's default ordering.
use crate::flavor;
use crate::metadata::Model;
use crate::query::{reverse_order, Query};
use crate::result::QueryResult;

/// Resolve the query's ordering from its `by` parameter or the model
/// default.  Queries whose flavor already set an explicit order keep it
/// unless the caller asked for something else.
pub(crate) fn apply(q: &mut Query) -> QueryResult<()> {
    let by_param = q.params.get_str("by").map(str::to_string);
    if by_param.is_none() && !q.order.is_empty() {
        return Ok(());
    }

    let mut by = by_param.unwrap_or_else(|| flavor::default_order(q.model()).to_string());
    let reverse = by.starts_with("reverse_");
    if reverse {
        by = by["reverse_".len()..].to_string();
    }

    let mut expr = resolve(q, &by);

    // Fall back to the model default, then to a stable id ordering.
    if expr.is_none() {
        let default = flavor::default_order(q.model());
        if by != default {
            expr = resolve(q, default);
        }
    }
    let expr = expr.unwrap_or_else(|| format!("{}.id ASC", q.table()));

    q.order = if reverse { reverse_order(&expr) } else { expr };
    Ok(())
}

fn resolve(q: &mut Query, by: &str) -> Option<String> {
    let model = q.model();
    let table = q.table();

    match by {
        "updated_at" | "created_at" | "last_login" | "num_views" => {
            if model.has_column(by) {
                Some(format!("{table}.{by} DESC"))
            } else {
                None
            }
        }

        "date" => {
            if model.has_column("date") {
                Some(format!("{table}.date DESC"))
            } else if model.has_column("when") {
                Some(format!("{table}.when DESC"))
            } else if model.has_column("created_at") {
                Some(format!("{table}.created_at DESC"))
            } else {
                None
            }
        }

        "name" => match model {
            Model::Image => {
                q.add_join(&["images_observations", "observations"]);
                q.add_join(&["observations", "names"]);
                q.group = "images.id".to_string();
                Some("MIN(names.sort_name) ASC, images.when DESC".to_string())
            }
            Model::Location => Some("locations.name ASC".to_string()),
            Model::LocationDescription => {
                q.add_join(&["locations"]);
                Some("locations.name ASC, location_descriptions.created_at ASC".to_string())
            }
            Model::Name => Some("names.sort_name ASC".to_string()),
            Model::NameDescription => {
                q.add_join(&["names"]);
                Some("names.sort_name ASC, name_descriptions.created_at ASC".to_string())
            }
            Model::Observation => {
                q.add_join(&["names"]);
                Some("names.sort_name ASC, observations.when DESC".to_string())
            }
            _ => {
                if model.has_column("sort_name") {
                    Some(format!("{table}.sort_name ASC"))
                } else if model.has_column("name") {
                    Some(format!("{table}.name ASC"))
                } else if model.has_column("title") {
                    Some(format!("{table}.title ASC"))
                } else {
                    None
                }
            }
        },

        "title" | "login" | "summary" | "copyright_holder" | "where" | "herbarium_label" => {
            if model.has_column(by) {
                Some(format!("{table}.{by} ASC"))
            } else {
                None
            }
        }

        "user" => {
            if model.has_column("user_id") {
                q.add_join(&["users"]);
                Some(
                    "CASE WHEN users.name IS NULL OR users.name = '' \
                     THEN users.login ELSE users.name END ASC"
                        .to_string(),
                )
            } else {
                None
            }
        }

        "location" => {
            if model.has_column("location_id") {
                q.add_join(&["locations"]);
                Some("locations.name ASC".to_string())
            } else {
                None
            }
        }

        "rss_log" => {
            if model.has_column("rss_log_id") {
                q.add_join(&["rss_logs"]);
                Some("rss_logs.updated_at DESC".to_string())
            } else {
                None
            }
        }

        "confidence" => match model {
            Model::Image => {
                q.add_join(&["images_observations", "observations"]);
                Some("observations.vote_cache DESC".to_string())
            }
            Model::Observation => Some("observations.vote_cache DESC".to_string()),
            _ => None,
        },

        "image_quality" => {
            if model == Model::Image {
                Some("images.vote_cache DESC".to_string())
            } else {
                None
            }
        }

        "thumbnail_quality" => {
            if model == Model::Observation {
                q.add_join(&["images.thumb_image"]);
                Some("images.vote_cache DESC, observations.vote_cache DESC".to_string())
            } else {
                None
            }
        }

        "owners_quality" => {
            if model == Model::Image {
                q.add_join(&["image_votes"]);
                q.add_where("image_votes.user_id = images.user_id");
                Some("image_votes.value DESC".to_string())
            } else {
                None
            }
        }

        "owners_thumbnail_quality" => {
            if model == Model::Observation {
                q.add_join(&["images.thumb_image", "image_votes"]);
                q.add_where("images.user_id = observations.user_id");
                q.add_where("image_votes.user_id = observations.user_id");
                Some(
                    "image_votes.value DESC, images.vote_cache DESC, \
                     observations.vote_cache DESC"
                        .to_string(),
                )
            } else {
                None
            }
        }

        "contribution" => {
            if model == Model::User {
                Some("users.contribution DESC".to_string())
            } else {
                None
            }
        }

        "original_name" => {
            if model == Model::Image {
                Some("images.original_name ASC".to_string())
            } else {
                None
            }
        }

        "id" => Some(format!("{table}.id ASC")),

        _ => None,
    }
}
