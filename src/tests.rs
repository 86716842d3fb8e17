//! End-to-end build and coercion tests over a canned in-memory store.
use crate::coerce;
use crate::constants::Rank;
use crate::flavor::{self, Flavor, ParamDecl, ParamType};
use crate::lookup::Store;
use crate::metadata::Model;
use crate::query::{Executor, Query};
use crate::result::{QueryError, QueryResult};

/// Store stub with a handful of fixed rows:
/// user 42 "mary", location 3 "Burbank, California", project 7,
/// species list 5, names 1 (Fungi), 10 (Agaricus, genus),
/// 11 (Agaricus campestris), 20 (Amanita muscaria, synonyms 20+22,
/// misspelling 21), observation 100 with images 7,8,9.
struct StubStore;

impl Store for StubStore {
    fn display_name(&mut self, model: Model, id: i64) -> QueryResult<Option<String>> {
        let name = match (model, id) {
            (Model::User, 42) => "Mary Newbie",
            (Model::Location, 3) => "Burbank, California",
            (Model::Project, 7) => "Bolete Project",
            (Model::SpeciesList, 5) => "Fall Foray List",
            (Model::Name, 10) => "**__Agaricus__**",
            (Model::Name, 11) => "**__Agaricus campestris__**",
            (Model::Name, 20) => "**__Amanita muscaria__**",
            (Model::Observation, 100) => "Amanita muscaria (100)",
            _ => return Ok(None),
        };
        Ok(Some(name.to_string()))
    }

    fn ids_matching(&mut self, model: Model, text: &str) -> QueryResult<Vec<i64>> {
        Ok(match (model, text) {
            (Model::User, "mary") => vec![42],
            (Model::Location, "Burbank") => vec![3],
            (Model::Location, "gualala") => vec![],
            (Model::Project, "Bolete Project") => vec![7],
            (Model::SpeciesList, "Fall Foray List") => vec![5],
            (Model::Name, "Amanita muscaria") => vec![20],
            (Model::Name, "Agaricus") => vec![10],
            (Model::Name, "ambiguous") => vec![10, 11],
            _ => vec![],
        })
    }

    fn name_misspelling_ids(&mut self, name_id: i64) -> QueryResult<Vec<i64>> {
        Ok(if name_id == 20 { vec![21] } else { vec![] })
    }

    fn name_synonym_ids(&mut self, name_id: i64) -> QueryResult<Vec<i64>> {
        Ok(match name_id {
            20 | 22 => vec![20, 22],
            other => vec![other],
        })
    }

    fn name_rank_text(&mut self, name_id: i64) -> QueryResult<Option<(Rank, String)>> {
        Ok(match name_id {
            1 => Some((Rank::Kingdom, "Fungi".to_string())),
            10 => Some((Rank::Genus, "Agaricus".to_string())),
            11 => Some((Rank::Species, "Agaricus campestris".to_string())),
            20 => Some((Rank::Species, "Amanita muscaria".to_string())),
            _ => None,
        })
    }

    fn name_children_ids(&mut self, name_id: i64, _all: bool) -> QueryResult<Vec<i64>> {
        Ok(match name_id {
            1 => vec![10, 11, 20],
            10 => vec![11],
            _ => vec![],
        })
    }

    fn name_parent_ids(&mut self, name_id: i64, _all: bool) -> QueryResult<Vec<i64>> {
        Ok(match name_id {
            11 => vec![10],
            20 => vec![],
            _ => vec![],
        })
    }

    fn observation_image_ids(&mut self, obs_id: i64) -> QueryResult<Vec<i64>> {
        Ok(if obs_id == 100 { vec![7, 8, 9] } else { vec![] })
    }

    fn unknown_name_id(&mut self) -> QueryResult<i64> {
        Ok(1)
    }

    fn select_ids(&mut self, _sql: &str, _params: &[String]) -> QueryResult<Vec<i64>> {
        Ok(vec![101, 102])
    }
}

/// Minimal raw parameters satisfying exactly the required entries of a
/// flavor's schema.
fn minimal_params(flavor: Flavor) -> json::JsonValue {
    let mut raw = json::object! {};
    for decl in flavor::flavor_params(flavor) {
        if !decl.required {
            continue;
        }
        raw[decl.name] = minimal_value(decl);
    }
    // Advanced search declares nothing required but insists on at least
    // one condition.
    if flavor == Flavor::AdvancedSearch {
        raw["name"] = "gualala".into();
    }
    raw
}

fn minimal_value(decl: &ParamDecl) -> json::JsonValue {
    match decl.name {
        "user" => return 42.into(),
        "project" => return 7.into(),
        "species_list" => return 5.into(),
        "observation" => return 100.into(),
        "name" => return 20.into(),
        "target" => return 100.into(),
        "type" => return "Observation".into(),
        "ids" => return json::array![1, 2],
        "outer" => {
            return json::object! {
                model: "Observation",
                flavor: "by_user",
                params: { user: 42 },
            }
        }
        _ => (),
    }
    match decl.ptype {
        ParamType::Record(Model::Location) => 3.into(),
        ParamType::String => "gualala".into(),
        ParamType::Boolean => false.into(),
        ParamType::Float => (1.0).into(),
        _ => "gualala".into(),
    }
}

#[test]
fn all_allowed_pairs_build_with_required_params() {
    let mut store = StubStore;
    for model in Model::ALL {
        for flavor in flavor::allowed_flavors(model) {
            let raw = minimal_params(*flavor);
            let result = Query::build(model, *flavor, &raw, &mut store);
            assert!(
                result.is_ok(),
                "({model}, {flavor}) failed: {:?}",
                result.err()
            );
            let query = result.unwrap();
            // Every build must render valid SQL with matching binds.
            assert!(query.sql().is_ok(), "({model}, {flavor}) failed to render");
        }
    }
}

#[test]
fn disallowed_pairs_are_rejected() {
    let mut store = StubStore;
    for model in Model::ALL {
        for flavor in Flavor::ALL {
            if flavor::is_allowed(model, flavor) {
                continue;
            }
            let raw = minimal_params(flavor);
            match Query::build(model, flavor, &raw, &mut store) {
                Err(QueryError::UnknownFlavorForModel { .. }) => (),
                other => panic!("({model}, {flavor}) should be rejected, got {other:?}"),
            }
        }
    }
}

#[test]
fn by_user_example() {
    let mut store = StubStore;
    let raw = json::object! { user: 42 };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();

    assert_eq!(query.where_clauses(), &["observations.user_id = 42".to_string()]);
    assert_eq!(query.order(), "observations.updated_at DESC");
    assert_eq!(query.title().args.get("user").unwrap(), "Mary Newbie");
    assert_eq!(
        query.sql().unwrap(),
        "SELECT DISTINCT observations.id FROM observations \
         WHERE (observations.user_id = 42) \
         ORDER BY observations.updated_at DESC"
    );
}

#[test]
fn by_user_with_unknown_id_still_builds() {
    let mut store = StubStore;
    let raw = json::object! { user: 99999 };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();
    assert_eq!(query.where_clauses(), &["observations.user_id = 99999".to_string()]);
    // Falls back to a tag + id label when the row is gone.
    assert_eq!(query.title().args.get("user").unwrap(), "user #99999");
}

#[test]
fn ambiguous_string_reference_is_fatal_for_single_instance_flavors() {
    let mut store = StubStore;
    let raw = json::object! { name: "ambiguous" };
    match Query::build(Model::Name, Flavor::OfChildren, &raw, &mut store) {
        Err(QueryError::AmbiguousReference(_)) => (),
        other => panic!("expected AmbiguousReference, got {other:?}"),
    }

    let raw = json::object! { location: "gualala" };
    match Query::build(Model::Observation, Flavor::AtLocation, &raw, &mut store) {
        Err(QueryError::ReferenceNotFound(_)) => (),
        other => panic!("expected ReferenceNotFound, got {other:?}"),
    }
}

#[test]
fn pattern_search_example() {
    let mut store = StubStore;
    let raw = json::object! { pattern: "amanita -muscaria" };
    let query = Query::build(Model::Name, Flavor::PatternSearch, &raw, &mut store).unwrap();

    let where_ = query.where_clauses().join(" ");
    assert!(where_.contains("ILIKE ?"));
    assert!(where_.contains("NOT ILIKE ?"));
    assert!(where_.contains("names.search_name"));
    assert_eq!(query.binds(), &["%amanita%".to_string(), "%muscaria%".to_string()]);

    // The optional default description is joined LEFT OUTER so names
    // without one are kept.
    let sql = query.sql().unwrap();
    assert!(sql.contains("LEFT OUTER JOIN name_descriptions"));
}

#[test]
fn date_range_wraps_around_new_year() {
    let mut store = StubStore;
    let raw = json::object! { user: 42, date: ["12-01", "02-01"] };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();

    let wrap = query
        .where_clauses()
        .iter()
        .find(|w| w.contains("EXTRACT(MONTH"))
        .expect("expected a wrap-around month predicate");
    assert!(wrap.contains("> 12"));
    assert!(wrap.contains("< 2"));
    assert!(wrap.contains("OR"));
}

#[test]
fn absent_date_range_adds_no_predicate() {
    let mut store = StubStore;
    let raw = json::object! { user: 42 };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();
    assert_eq!(query.where_clauses().len(), 1);
}

#[test]
fn bounding_box_variants_share_bounds() {
    let mut store = StubStore;
    let raw = json::object! { north: 35.0, south: 34.0, east: -118.0, west: -119.0 };

    let loc = Query::build(Model::Location, Flavor::All, &raw, &mut store).unwrap();
    let loc_where = loc.where_clauses().join(" AND ");
    assert!(loc_where.contains("locations.south >= 34"));
    assert!(loc_where.contains("locations.north <= 35"));
    assert!(loc_where.contains("locations.west <= locations.east"));

    let obs = Query::build(Model::Observation, Flavor::All, &raw, &mut store).unwrap();
    let obs_where = obs.where_clauses().join(" AND ");
    assert!(obs_where.contains("observations.lat >= 34"));
    assert!(obs_where.contains("observations.lat <= 35"));
    assert!(obs_where.contains("locations.south >= 34"));
    assert!(obs_where.contains("* 1.2"));
    assert!(obs.sql().unwrap().contains("LEFT OUTER JOIN locations"));
}

#[test]
fn meridian_crossing_box_uses_disjunction() {
    let mut store = StubStore;
    let raw = json::object! { north: 20.0, south: 10.0, east: -170.0, west: 170.0 };
    let obs = Query::build(Model::Observation, Flavor::All, &raw, &mut store).unwrap();
    let where_ = obs.where_clauses().join(" AND ");
    assert!(where_.contains("observations.long >= 170 OR observations.long <= -170"));
    assert!(where_.contains("locations.west > locations.east"));
}

#[test]
fn synonym_and_nonconsensus_modes_are_distinct() {
    let mut store = StubStore;
    let mut seen = Vec::new();
    for synonyms in ["no", "all", "exclusive"] {
        for nonconsensus in ["no", "all", "exclusive"] {
            let raw = json::object! {
                name: 20,
                synonyms: synonyms,
                nonconsensus: nonconsensus,
            };
            let query =
                Query::build(Model::Observation, Flavor::OfName, &raw, &mut store).unwrap();
            let key = query.where_clauses().join(" / ");
            assert!(
                !seen.contains(&key),
                "duplicate predicates for ({synonyms}, {nonconsensus})"
            );
            seen.push(key);
        }
    }
    assert_eq!(seen.len(), 9);
}

#[test]
fn of_name_modes_build_expected_id_sets() {
    let mut store = StubStore;

    // no: the name plus its misspellings, consensus only.
    let raw = json::object! { name: 20 };
    let query = Query::build(Model::Observation, Flavor::OfName, &raw, &mut store).unwrap();
    let where_ = query.where_clauses().join(" ");
    assert!(where_.contains("observations.name_id IN (20,21)"));
    assert!(where_.contains("COALESCE(observations.vote_cache,0) >= 0"));

    // exclusive: the synonym set minus the name and its misspellings,
    // proposed but not consensus.
    let raw = json::object! { name: 20, synonyms: "exclusive", nonconsensus: "exclusive" };
    let query = Query::build(Model::Observation, Flavor::OfName, &raw, &mut store).unwrap();
    let where_ = query.where_clauses().join(" ");
    assert!(where_.contains("namings.name_id IN (22)"));
    assert!(where_.contains("observations.name_id NOT IN (22)"));
    assert!(query.sql().unwrap().contains("JOIN namings"));
}

#[test]
fn invalid_mode_is_a_construction_error() {
    let mut store = StubStore;
    let raw = json::object! { name: 20, synonyms: "some" };
    match Query::build(Model::Observation, Flavor::OfName, &raw, &mut store) {
        Err(QueryError::InvalidEnum { param, .. }) => assert_eq!(param, "synonyms"),
        other => panic!("expected InvalidEnum, got {other:?}"),
    }
}

#[test]
fn of_children_below_genus_is_syntactic() {
    let mut store = StubStore;
    let raw = json::object! { name: 10 };
    let query = Query::build(Model::Name, Flavor::OfChildren, &raw, &mut store).unwrap();

    let where_ = query.where_clauses().join(" ");
    assert!(where_.contains("names.text_name LIKE ?"));
    assert!(where_.contains("names.text_name NOT LIKE ?"));
    assert_eq!(
        query.binds(),
        &["Agaricus %".to_string(), "Agaricus % %".to_string()]
    );
}

#[test]
fn of_children_above_genus_uses_id_set() {
    let mut store = StubStore;
    let raw = json::object! { name: 1 };
    let query = Query::build(Model::Name, Flavor::OfChildren, &raw, &mut store).unwrap();
    assert!(query
        .where_clauses()
        .iter()
        .any(|w| w.contains("names.id IN (10,11,20)")));
}

#[test]
fn of_parents_returns_immediate_parents_only() {
    let mut store = StubStore;
    let raw = json::object! { name: 11 };
    let query = Query::build(Model::Name, Flavor::OfParents, &raw, &mut store).unwrap();
    assert!(query
        .where_clauses()
        .iter()
        .any(|w| w.contains("names.id IN (10)")));
}

#[test]
fn in_set_preserves_caller_order() {
    let mut store = StubStore;
    let raw = json::object! { ids: [8, 3, 5] };
    let query = Query::build(Model::Observation, Flavor::InSet, &raw, &mut store).unwrap();
    assert!(query
        .where_clauses()
        .iter()
        .any(|w| w.contains("observations.id IN (8,3,5)")));
    assert!(query.order().contains("array_position(ARRAY[8,3,5]"));
}

#[test]
fn inside_observation_nests_an_outer_query() {
    let mut store = StubStore;
    let raw = json::object! {
        observation: 100,
        outer: { model: "Observation", flavor: "by_user", params: { user: 42 } },
    };
    let query =
        Query::build(Model::Image, Flavor::InsideObservation, &raw, &mut store).unwrap();

    assert!(query
        .where_clauses()
        .iter()
        .any(|w| w.contains("images.id IN (7,8,9)")));

    let outer = query.outer().expect("outer query expected");
    assert_eq!(outer.model(), Model::Observation);
    // The outer query must skip observations with no images.
    assert!(outer.sql().unwrap().contains("JOIN images_observations"));
}

#[test]
fn advanced_search_content_uses_union_executor() {
    let mut store = StubStore;
    let raw = json::object! { content: "delicious" };
    let query =
        Query::build(Model::Observation, Flavor::AdvancedSearch, &raw, &mut store).unwrap();

    match query.executor() {
        Some(Executor::ContentUnion {
            plain_where,
            join_path,
            commented_where,
            ..
        }) => {
            assert!(plain_where[0].contains("observations.notes ILIKE ?"));
            assert_eq!(join_path, &["comments".to_string()]);
            assert!(commented_where[0].contains("comments.summary"));
        }
        other => panic!("expected ContentUnion, got {other:?}"),
    }

    // The union path must drive execution instead of the single statement.
    let ids = query.result_ids(&mut store).unwrap();
    assert_eq!(ids, vec![101, 102]);
}

#[test]
fn advanced_search_image_content_runs_observations_first() {
    let mut store = StubStore;
    let raw = json::object! { content: "delicious", name: "amanita" };
    let query = Query::build(Model::Image, Flavor::AdvancedSearch, &raw, &mut store).unwrap();

    match query.executor() {
        Some(Executor::ObservationsFirst { inner }) => {
            assert_eq!(inner.model(), Model::Observation);
            assert_eq!(inner.flavor(), Flavor::AdvancedSearch);
            // The observation side carries the content union itself.
            assert!(matches!(
                inner.executor(),
                Some(Executor::ContentUnion { .. })
            ));
        }
        other => panic!("expected ObservationsFirst, got {other:?}"),
    }
}

#[test]
fn advanced_search_requires_a_condition() {
    let mut store = StubStore;
    let raw = json::object! {};
    assert!(Query::build(Model::Observation, Flavor::AdvancedSearch, &raw, &mut store).is_err());
}

#[test]
fn rss_log_query_coerces_to_target_model() {
    let mut store = StubStore;
    let raw = json::object! { "type": "observation" };
    let query = Query::build(Model::RssLog, Flavor::All, &raw, &mut store).unwrap();
    assert!(query
        .where_clauses()
        .iter()
        .any(|w| w.contains("rss_logs.observation_id IS NOT NULL")));

    let coerced = coerce::coerce(&query, Model::Observation, &mut store)
        .unwrap()
        .expect("coercion should apply");
    assert_eq!(coerced.flavor(), Flavor::ByRssLog);
    assert!(coerced.sql().unwrap().contains("JOIN rss_logs"));
    assert_eq!(coerced.order(), "rss_logs.updated_at DESC");
}

#[test]
fn with_observations_coerces_to_observations_and_back() {
    let mut store = StubStore;
    let raw = json::object! { location: 3 };
    let query = Query::build(
        Model::Image,
        Flavor::WithObservationsAtLocation,
        &raw,
        &mut store,
    )
    .unwrap();
    assert!(query.sql().unwrap().contains("JOIN images_observations"));

    // Rule 2: unwrap to the observations themselves.
    let obs = coerce::coerce(&query, Model::Observation, &mut store)
        .unwrap()
        .expect("unwrap rule should apply");
    assert_eq!(obs.flavor(), Flavor::AtLocation);
    assert!(obs
        .where_clauses()
        .iter()
        .any(|w| w.contains("observations.location_id = 3")));

    // Rule 3: wrap back up to images.
    let back = coerce::coerce(&obs, Model::Image, &mut store)
        .unwrap()
        .expect("wrap rule should apply");
    assert_eq!(back.flavor(), Flavor::WithObservationsAtLocation);
}

#[test]
fn search_queries_wrap_by_materializing_result_ids() {
    let mut store = StubStore;
    let raw = json::object! { pattern: "amanita" };
    let query =
        Query::build(Model::Observation, Flavor::PatternSearch, &raw, &mut store).unwrap();

    let coerced = coerce::coerce(&query, Model::Image, &mut store)
        .unwrap()
        .expect("wrap rule should apply");
    assert_eq!(coerced.flavor(), Flavor::WithObservationsInSet);
    // StubStore materializes ids 101 and 102.
    assert!(coerced
        .where_clauses()
        .iter()
        .any(|w| w.contains("observations.id IN (101,102)")));
}

#[test]
fn at_location_coerces_to_location_in_set() {
    let mut store = StubStore;
    let raw = json::object! { location: 3 };
    let query = Query::build(Model::Observation, Flavor::AtLocation, &raw, &mut store).unwrap();

    let coerced = coerce::coerce(&query, Model::Location, &mut store)
        .unwrap()
        .expect("rule should apply");
    assert_eq!(coerced.flavor(), Flavor::InSet);
    assert!(coerced
        .where_clauses()
        .iter()
        .any(|w| w.contains("locations.id IN (3)")));
}

#[test]
fn unsupported_coercion_returns_none() {
    let mut store = StubStore;
    let raw = json::object! { user: 42 };
    let query = Query::build(Model::Comment, Flavor::ByUser, &raw, &mut store).unwrap();
    assert!(coerce::coerce(&query, Model::Image, &mut store).unwrap().is_none());
    assert!(!coerce::can_coerce(&query, Model::Image));
}

#[test]
fn can_coerce_matches_coerce_without_queries() {
    let mut store = StubStore;
    let raw = json::object! { pattern: "amanita" };
    let query =
        Query::build(Model::Observation, Flavor::PatternSearch, &raw, &mut store).unwrap();
    // Applicability is decided without materializing ids.
    assert!(coerce::can_coerce(&query, Model::Image));
    assert!(coerce::can_coerce(&query, Model::Location));
    assert!(!coerce::can_coerce(&query, Model::Project));
}

#[test]
fn serialized_queries_rebuild_identically() {
    let mut store = StubStore;
    let raw = json::object! { user: 42, has_specimen: true };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();

    let desc = query.to_description();
    let rebuilt = Query::from_description(&desc, &mut store).unwrap();
    assert_eq!(rebuilt.sql().unwrap(), query.sql().unwrap());
    assert_eq!(rebuilt.binds(), query.binds());
}

#[test]
fn caller_title_lines_override_args() {
    let mut store = StubStore;
    let raw = json::object! { user: 42, title: ["user Somebody Else"] };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();
    assert_eq!(query.title().args.get("user").unwrap(), "Somebody Else");

    let raw = json::object! { user: 42, title: ["raw Everything Mary Found"] };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();
    assert_eq!(query.title().text(), "Everything Mary Found");
}

#[test]
fn image_name_sort_groups_by_image() {
    let mut store = StubStore;
    let raw = json::object! { user: 42, by: "name" };
    let query = Query::build(Model::Image, Flavor::ByUser, &raw, &mut store).unwrap();
    assert_eq!(query.group(), "images.id");
    assert!(query.order().contains("MIN(names.sort_name) ASC"));
    let sql = query.sql().unwrap();
    assert!(sql.contains("GROUP BY images.id"));
    assert!(sql.contains("JOIN observations"));
}

#[test]
fn unknown_sort_key_falls_back_to_default() {
    let mut store = StubStore;
    let raw = json::object! { user: 42, by: "felicity" };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();
    // Observation default is "date", which sorts on the when column.
    assert_eq!(query.order(), "observations.when DESC");
}

#[test]
fn reverse_sort_keys_flip_direction() {
    let mut store = StubStore;
    let raw = json::object! { user: 42, by: "reverse_date" };
    let query = Query::build(Model::Observation, Flavor::ByUser, &raw, &mut store).unwrap();
    assert_eq!(query.order(), "observations.when ASC");
}
