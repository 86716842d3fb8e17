//! Flavor registry: the named query templates, the models each is legal
//! for, and the parameter schema each declares.
//!
//! All tables here are static; `schema` lookups are pure.
use crate::constants::ALL_RANK_NAMES;
use crate::metadata::Model;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    AdvancedSearch,
    All,
    AtLocation,
    AtWhere,
    ByAuthor,
    ByEditor,
    ByRssLog,
    ByUser,
    ForProject,
    ForTarget,
    ForUser,
    InSet,
    InSpeciesList,
    InsideObservation,
    OfChildren,
    OfName,
    OfParents,
    PatternSearch,
    RegexpSearch,
    WithDescriptions,
    WithDescriptionsByAuthor,
    WithDescriptionsByEditor,
    WithDescriptionsByUser,
    WithDescriptionsInSet,
    WithObservations,
    WithObservationsAtLocation,
    WithObservationsAtWhere,
    WithObservationsByUser,
    WithObservationsForProject,
    WithObservationsInSet,
    WithObservationsInSpeciesList,
    WithObservationsOfChildren,
    WithObservationsOfName,
}

impl Flavor {
    pub const ALL: [Flavor; 33] = [
        Flavor::AdvancedSearch,
        Flavor::All,
        Flavor::AtLocation,
        Flavor::AtWhere,
        Flavor::ByAuthor,
        Flavor::ByEditor,
        Flavor::ByRssLog,
        Flavor::ByUser,
        Flavor::ForProject,
        Flavor::ForTarget,
        Flavor::ForUser,
        Flavor::InSet,
        Flavor::InSpeciesList,
        Flavor::InsideObservation,
        Flavor::OfChildren,
        Flavor::OfName,
        Flavor::OfParents,
        Flavor::PatternSearch,
        Flavor::RegexpSearch,
        Flavor::WithDescriptions,
        Flavor::WithDescriptionsByAuthor,
        Flavor::WithDescriptionsByEditor,
        Flavor::WithDescriptionsByUser,
        Flavor::WithDescriptionsInSet,
        Flavor::WithObservations,
        Flavor::WithObservationsAtLocation,
        Flavor::WithObservationsAtWhere,
        Flavor::WithObservationsByUser,
        Flavor::WithObservationsForProject,
        Flavor::WithObservationsInSet,
        Flavor::WithObservationsInSpeciesList,
        Flavor::WithObservationsOfChildren,
        Flavor::WithObservationsOfName,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Flavor::AdvancedSearch => "advanced_search",
            Flavor::All => "all",
            Flavor::AtLocation => "at_location",
            Flavor::AtWhere => "at_where",
            Flavor::ByAuthor => "by_author",
            Flavor::ByEditor => "by_editor",
            Flavor::ByRssLog => "by_rss_log",
            Flavor::ByUser => "by_user",
            Flavor::ForProject => "for_project",
            Flavor::ForTarget => "for_target",
            Flavor::ForUser => "for_user",
            Flavor::InSet => "in_set",
            Flavor::InSpeciesList => "in_species_list",
            Flavor::InsideObservation => "inside_observation",
            Flavor::OfChildren => "of_children",
            Flavor::OfName => "of_name",
            Flavor::OfParents => "of_parents",
            Flavor::PatternSearch => "pattern_search",
            Flavor::RegexpSearch => "regexp_search",
            Flavor::WithDescriptions => "with_descriptions",
            Flavor::WithDescriptionsByAuthor => "with_descriptions_by_author",
            Flavor::WithDescriptionsByEditor => "with_descriptions_by_editor",
            Flavor::WithDescriptionsByUser => "with_descriptions_by_user",
            Flavor::WithDescriptionsInSet => "with_descriptions_in_set",
            Flavor::WithObservations => "with_observations",
            Flavor::WithObservationsAtLocation => "with_observations_at_location",
            Flavor::WithObservationsAtWhere => "with_observations_at_where",
            Flavor::WithObservationsByUser => "with_observations_by_user",
            Flavor::WithObservationsForProject => "with_observations_for_project",
            Flavor::WithObservationsInSet => "with_observations_in_set",
            Flavor::WithObservationsInSpeciesList => "with_observations_in_species_list",
            Flavor::WithObservationsOfChildren => "with_observations_of_children",
            Flavor::WithObservationsOfName => "with_observations_of_name",
        }
    }

    pub fn parse(name: &str) -> Option<Flavor> {
        Flavor::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type descriptor for one declared parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamType {
    Boolean,
    Float,
    String,
    /// YYYY[-MM[-DD]] or MM[-DD] partial date string.
    Date,
    /// YYYY[-MM[-DD[-HH[-MM[-SS]]]]] partial time string.
    Time,
    /// Bare object id with no string-resolution rule (e.g. a license).
    Id,
    /// Reference to a row of the given model: integer id or a string
    /// resolved by the model-specific lookup rule.
    Record(Model),
    /// Reference to a row of a model named by a sibling `type` parameter.
    AnyRecord,
    /// A taxonomic name: integer id or a verbatim name string.
    NameRef,
    /// One of a fixed set of literal strings.
    EnumStr(&'static [&'static str]),
    /// List of positive integer ids.
    IdList,
    /// Homogeneous list of the inner type.
    List(&'static ParamType),
    /// A nested (model, flavor, params) query description.
    QueryRef,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDecl {
    pub name: &'static str,
    pub ptype: ParamType,
    pub required: bool,
}

macro_rules! req {
    ($name:literal, $ptype:expr) => {
        ParamDecl { name: $name, ptype: $ptype, required: true }
    };
}

macro_rules! opt {
    ($name:literal, $ptype:expr) => {
        ParamDecl { name: $name, ptype: $ptype, required: false }
    };
}

/// Parameters accepted by every query regardless of model or flavor.
pub const GLOBAL_PARAMS: &[ParamDecl] = &[
    opt!("title", ParamType::List(&ParamType::String)),
    opt!("by", ParamType::String),
    opt!("order", ParamType::String),
    opt!("where", ParamType::List(&ParamType::String)),
    opt!("join", ParamType::List(&ParamType::String)),
];

const SYN_MODES: &[&str] = &["no", "all", "exclusive"];
const YES_ONLY: &[&str] = &["yes"];

pub fn flavor_params(flavor: Flavor) -> &'static [ParamDecl] {
    match flavor {
        Flavor::AdvancedSearch => &[
            opt!("name", ParamType::String),
            opt!("location", ParamType::String),
            opt!("user", ParamType::String),
            opt!("content", ParamType::String),
            opt!("search_location_notes", ParamType::Boolean),
        ],
        Flavor::All | Flavor::ByRssLog | Flavor::WithDescriptions | Flavor::WithObservations => &[],
        Flavor::AtLocation => &[req!("location", ParamType::Record(Model::Location))],
        Flavor::AtWhere => &[
            req!("location", ParamType::String),
            req!("user_where", ParamType::String),
        ],
        Flavor::ByAuthor | Flavor::ByEditor | Flavor::ByUser | Flavor::ForUser => {
            &[req!("user", ParamType::Record(Model::User))]
        }
        Flavor::ForProject => &[req!("project", ParamType::Record(Model::Project))],
        Flavor::ForTarget => &[
            req!("target", ParamType::AnyRecord),
            req!("type", ParamType::String),
        ],
        Flavor::InSet => &[req!("ids", ParamType::IdList)],
        Flavor::InSpeciesList => {
            &[req!("species_list", ParamType::Record(Model::SpeciesList))]
        }
        Flavor::InsideObservation => &[
            req!("observation", ParamType::Record(Model::Observation)),
            req!("outer", ParamType::QueryRef),
        ],
        Flavor::OfChildren => &[
            req!("name", ParamType::Record(Model::Name)),
            opt!("all", ParamType::Boolean),
        ],
        Flavor::OfName => &[
            req!("name", ParamType::NameRef),
            opt!("synonyms", ParamType::EnumStr(SYN_MODES)),
            opt!("nonconsensus", ParamType::EnumStr(SYN_MODES)),
            opt!("project", ParamType::Record(Model::Project)),
            opt!("species_list", ParamType::Record(Model::SpeciesList)),
            opt!("user", ParamType::Record(Model::User)),
        ],
        Flavor::OfParents => &[req!("name", ParamType::Record(Model::Name))],
        Flavor::PatternSearch => &[req!("pattern", ParamType::String)],
        Flavor::RegexpSearch => &[req!("regexp", ParamType::String)],
        Flavor::WithDescriptionsByAuthor
        | Flavor::WithDescriptionsByEditor
        | Flavor::WithDescriptionsByUser => &[req!("user", ParamType::Record(Model::User))],
        Flavor::WithDescriptionsInSet => &[
            req!("ids", ParamType::IdList),
            opt!("old_title", ParamType::String),
            opt!("old_by", ParamType::String),
        ],
        Flavor::WithObservationsAtLocation => &[
            req!("location", ParamType::Record(Model::Location)),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsAtWhere => &[
            req!("location", ParamType::String),
            req!("user_where", ParamType::String),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsByUser => &[
            req!("user", ParamType::Record(Model::User)),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsForProject => &[
            req!("project", ParamType::Record(Model::Project)),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsInSet => &[
            req!("ids", ParamType::IdList),
            opt!("old_title", ParamType::String),
            opt!("old_by", ParamType::String),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsInSpeciesList => &[
            req!("species_list", ParamType::Record(Model::SpeciesList)),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsOfChildren => &[
            req!("name", ParamType::Record(Model::Name)),
            opt!("all", ParamType::Boolean),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Flavor::WithObservationsOfName => &[
            req!("name", ParamType::NameRef),
            opt!("synonyms", ParamType::EnumStr(SYN_MODES)),
            opt!("nonconsensus", ParamType::EnumStr(SYN_MODES)),
            opt!("project", ParamType::Record(Model::Project)),
            opt!("species_list", ParamType::Record(Model::SpeciesList)),
            opt!("user", ParamType::Record(Model::User)),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
    }
}

/// Optional filter parameters accepted by every query of a given model.
pub fn model_params(model: Model) -> &'static [ParamDecl] {
    match model {
        Model::Comment => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("types", ParamType::String),
            opt!("summary_has", ParamType::String),
            opt!("content_has", ParamType::String),
        ],
        Model::Herbarium | Model::Specimen => &[],
        Model::Image => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("date", ParamType::List(&ParamType::Date)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("names", ParamType::List(&ParamType::String)),
            opt!("synonym_names", ParamType::List(&ParamType::String)),
            opt!("children_names", ParamType::List(&ParamType::String)),
            opt!("locations", ParamType::List(&ParamType::String)),
            opt!("projects", ParamType::List(&ParamType::String)),
            opt!("species_lists", ParamType::List(&ParamType::String)),
            opt!("has_observation", ParamType::EnumStr(YES_ONLY)),
            opt!("size", ParamType::List(&ParamType::EnumStr(crate::constants::IMAGE_SIZES))),
            opt!("content_types", ParamType::String),
            opt!("has_notes", ParamType::Boolean),
            opt!("notes_has", ParamType::String),
            opt!("copyright_holder_has", ParamType::String),
            opt!("license", ParamType::Id),
            opt!("has_votes", ParamType::Boolean),
            opt!("quality", ParamType::List(&ParamType::Float)),
            opt!("confidence", ParamType::List(&ParamType::Float)),
            opt!("ok_for_export", ParamType::Boolean),
        ],
        Model::Location => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("north", ParamType::Float),
            opt!("south", ParamType::Float),
            opt!("east", ParamType::Float),
            opt!("west", ParamType::Float),
        ],
        Model::LocationDescription | Model::NameDescription => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
        ],
        Model::Name => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("names", ParamType::List(&ParamType::String)),
            opt!("synonym_names", ParamType::List(&ParamType::String)),
            opt!("children_names", ParamType::List(&ParamType::String)),
            opt!("misspellings", ParamType::EnumStr(&["no", "either", "only"])),
            opt!("deprecated", ParamType::EnumStr(&["either", "no", "only"])),
            opt!("has_synonyms", ParamType::Boolean),
            opt!("locations", ParamType::List(&ParamType::String)),
            opt!("species_lists", ParamType::List(&ParamType::String)),
            opt!("rank", ParamType::List(&ParamType::EnumStr(ALL_RANK_NAMES))),
            opt!("is_deprecated", ParamType::Boolean),
            opt!("text_name_has", ParamType::String),
            opt!("has_author", ParamType::Boolean),
            opt!("author_has", ParamType::String),
            opt!("has_citation", ParamType::Boolean),
            opt!("citation_has", ParamType::String),
            opt!("has_classification", ParamType::Boolean),
            opt!("classification_has", ParamType::String),
            opt!("has_notes", ParamType::Boolean),
            opt!("notes_has", ParamType::String),
            opt!("has_comments", ParamType::EnumStr(YES_ONLY)),
            opt!("comments_has", ParamType::String),
            opt!("has_default_desc", ParamType::Boolean),
            opt!("join_desc", ParamType::EnumStr(&["default", "any"])),
            opt!("desc_type", ParamType::String),
            opt!("desc_project", ParamType::List(&ParamType::String)),
            opt!("desc_creator", ParamType::List(&ParamType::Record(Model::User))),
            opt!("desc_content", ParamType::String),
            opt!("ok_for_export", ParamType::Boolean),
        ],
        Model::Observation => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("date", ParamType::List(&ParamType::Date)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("names", ParamType::List(&ParamType::String)),
            opt!("synonym_names", ParamType::List(&ParamType::String)),
            opt!("children_names", ParamType::List(&ParamType::String)),
            opt!("locations", ParamType::List(&ParamType::String)),
            opt!("projects", ParamType::List(&ParamType::String)),
            opt!("species_lists", ParamType::List(&ParamType::String)),
            opt!("confidence", ParamType::List(&ParamType::Float)),
            opt!("is_col_loc", ParamType::Boolean),
            opt!("has_specimen", ParamType::Boolean),
            opt!("has_location", ParamType::Boolean),
            opt!("has_notes", ParamType::Boolean),
            opt!("has_name", ParamType::Boolean),
            opt!("has_images", ParamType::Boolean),
            opt!("has_votes", ParamType::Boolean),
            opt!("has_comments", ParamType::EnumStr(YES_ONLY)),
            opt!("notes_has", ParamType::String),
            opt!("comments_has", ParamType::String),
            opt!("north", ParamType::Float),
            opt!("south", ParamType::Float),
            opt!("east", ParamType::Float),
            opt!("west", ParamType::Float),
            opt!("has_obs_tag", ParamType::List(&ParamType::String)),
            opt!("has_name_tag", ParamType::List(&ParamType::String)),
        ],
        Model::Project => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("has_images", ParamType::EnumStr(YES_ONLY)),
            opt!("has_observations", ParamType::EnumStr(YES_ONLY)),
            opt!("has_species_lists", ParamType::EnumStr(YES_ONLY)),
            opt!("has_comments", ParamType::EnumStr(YES_ONLY)),
            opt!("has_notes", ParamType::Boolean),
            opt!("title_has", ParamType::String),
            opt!("notes_has", ParamType::String),
            opt!("comments_has", ParamType::String),
        ],
        Model::RssLog => &[
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("type", ParamType::String),
        ],
        Model::SpeciesList => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
            opt!("date", ParamType::List(&ParamType::Date)),
            opt!("users", ParamType::List(&ParamType::Record(Model::User))),
            opt!("names", ParamType::List(&ParamType::String)),
            opt!("synonym_names", ParamType::List(&ParamType::String)),
            opt!("children_names", ParamType::List(&ParamType::String)),
            opt!("locations", ParamType::List(&ParamType::String)),
            opt!("projects", ParamType::List(&ParamType::String)),
            opt!("title_has", ParamType::String),
            opt!("has_notes", ParamType::Boolean),
            opt!("notes_has", ParamType::String),
            opt!("has_comments", ParamType::EnumStr(YES_ONLY)),
            opt!("comments_has", ParamType::String),
        ],
        Model::User => &[
            opt!("created_at", ParamType::List(&ParamType::Time)),
            opt!("updated_at", ParamType::List(&ParamType::Time)),
        ],
    }
}

/// Flavors each model may be queried by.
pub fn allowed_flavors(model: Model) -> &'static [Flavor] {
    match model {
        Model::Comment => &[
            Flavor::All,
            Flavor::ByUser,
            Flavor::InSet,
            Flavor::ForTarget,
            Flavor::ForUser,
            Flavor::PatternSearch,
        ],
        Model::Herbarium => &[Flavor::All, Flavor::PatternSearch],
        Model::Image => &[
            Flavor::AdvancedSearch,
            Flavor::All,
            Flavor::ByUser,
            Flavor::ForProject,
            Flavor::InSet,
            Flavor::InsideObservation,
            Flavor::PatternSearch,
            Flavor::WithObservations,
            Flavor::WithObservationsAtLocation,
            Flavor::WithObservationsAtWhere,
            Flavor::WithObservationsByUser,
            Flavor::WithObservationsForProject,
            Flavor::WithObservationsInSet,
            Flavor::WithObservationsInSpeciesList,
            Flavor::WithObservationsOfChildren,
            Flavor::WithObservationsOfName,
        ],
        Model::Location => &[
            Flavor::AdvancedSearch,
            Flavor::All,
            Flavor::ByUser,
            Flavor::ByEditor,
            Flavor::ByRssLog,
            Flavor::InSet,
            Flavor::PatternSearch,
            Flavor::RegexpSearch,
            Flavor::WithDescriptions,
            Flavor::WithDescriptionsByAuthor,
            Flavor::WithDescriptionsByEditor,
            Flavor::WithDescriptionsByUser,
            Flavor::WithDescriptionsInSet,
            Flavor::WithObservations,
            Flavor::WithObservationsByUser,
            Flavor::WithObservationsForProject,
            Flavor::WithObservationsInSet,
            Flavor::WithObservationsInSpeciesList,
            Flavor::WithObservationsOfChildren,
            Flavor::WithObservationsOfName,
        ],
        Model::LocationDescription => &[
            Flavor::All,
            Flavor::ByAuthor,
            Flavor::ByEditor,
            Flavor::ByUser,
            Flavor::InSet,
        ],
        Model::Name => &[
            Flavor::AdvancedSearch,
            Flavor::All,
            Flavor::ByUser,
            Flavor::ByEditor,
            Flavor::ByRssLog,
            Flavor::InSet,
            Flavor::OfChildren,
            Flavor::OfParents,
            Flavor::PatternSearch,
            Flavor::WithDescriptions,
            Flavor::WithDescriptionsByAuthor,
            Flavor::WithDescriptionsByEditor,
            Flavor::WithDescriptionsByUser,
            Flavor::WithDescriptionsInSet,
            Flavor::WithObservations,
            Flavor::WithObservationsAtLocation,
            Flavor::WithObservationsAtWhere,
            Flavor::WithObservationsByUser,
            Flavor::WithObservationsForProject,
            Flavor::WithObservationsInSet,
            Flavor::WithObservationsInSpeciesList,
        ],
        Model::NameDescription => &[
            Flavor::All,
            Flavor::ByAuthor,
            Flavor::ByEditor,
            Flavor::ByUser,
            Flavor::InSet,
        ],
        Model::Observation => &[
            Flavor::AdvancedSearch,
            Flavor::All,
            Flavor::AtLocation,
            Flavor::AtWhere,
            Flavor::ByRssLog,
            Flavor::ByUser,
            Flavor::ForProject,
            Flavor::InSet,
            Flavor::InSpeciesList,
            Flavor::OfChildren,
            Flavor::OfName,
            Flavor::PatternSearch,
        ],
        Model::Project => &[
            Flavor::All,
            Flavor::ByRssLog,
            Flavor::InSet,
            Flavor::PatternSearch,
        ],
        Model::RssLog => &[Flavor::All, Flavor::InSet],
        Model::SpeciesList => &[
            Flavor::All,
            Flavor::AtLocation,
            Flavor::AtWhere,
            Flavor::ByRssLog,
            Flavor::ByUser,
            Flavor::ForProject,
            Flavor::InSet,
            Flavor::PatternSearch,
        ],
        Model::Specimen => &[Flavor::All, Flavor::PatternSearch],
        Model::User => &[Flavor::All, Flavor::InSet, Flavor::PatternSearch],
    }
}

pub fn is_allowed(model: Model, flavor: Flavor) -> bool {
    allowed_flavors(model).contains(&flavor)
}

/// Default sort key for each model, used when the caller gives no `by`.
pub fn default_order(model: Model) -> &'static str {
    match model {
        Model::Comment => "created_at",
        Model::Herbarium => "name",
        Model::Image => "created_at",
        Model::Location => "name",
        Model::LocationDescription => "name",
        Model::Name => "name",
        Model::NameDescription => "name",
        Model::Observation => "date",
        Model::Project => "title",
        Model::RssLog => "updated_at",
        Model::SpeciesList => "title",
        Model::Specimen => "herbarium_label",
        Model::User => "name",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_names_round_trip() {
        for flavor in Flavor::ALL {
            assert_eq!(Flavor::parse(flavor.as_str()), Some(flavor));
        }
    }

    #[test]
    fn allow_list_membership() {
        assert!(is_allowed(Model::Observation, Flavor::ByUser));
        assert!(is_allowed(Model::Location, Flavor::RegexpSearch));
        assert!(!is_allowed(Model::Observation, Flavor::RegexpSearch));
        assert!(!is_allowed(Model::RssLog, Flavor::PatternSearch));
        assert!(!is_allowed(Model::Comment, Flavor::ByEditor));
    }

    #[test]
    fn every_allowed_flavor_has_a_schema() {
        for model in Model::ALL {
            for flavor in allowed_flavors(model) {
                // Just exercising the lookups; they must not panic.
                let _ = flavor_params(*flavor);
                let _ = model_params(model);
            }
        }
    }

    #[test]
    fn of_name_requires_name() {
        let decls = flavor_params(Flavor::OfName);
        let name = decls.iter().find(|d| d.name == "name").unwrap();
        assert!(name.required);
        assert_eq!(name.ptype, ParamType::NameRef);
        assert!(decls.iter().any(|d| d.name == "nonconsensus" && !d.required));
    }
}
