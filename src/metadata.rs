//! Static model and join metadata.
//!
//! Loaded once into the binary as consts; all lookups are pure and safe for
//! unsynchronized concurrent reads.
use std::fmt;

/// The domain entity kinds a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Comment,
    Herbarium,
    Image,
    Location,
    LocationDescription,
    Name,
    NameDescription,
    Observation,
    Project,
    RssLog,
    SpeciesList,
    Specimen,
    User,
}

impl Model {
    pub const ALL: [Model; 13] = [
        Model::Comment,
        Model::Herbarium,
        Model::Image,
        Model::Location,
        Model::LocationDescription,
        Model::Name,
        Model::NameDescription,
        Model::Observation,
        Model::Project,
        Model::RssLog,
        Model::SpeciesList,
        Model::Specimen,
        Model::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Model::Comment => "Comment",
            Model::Herbarium => "Herbarium",
            Model::Image => "Image",
            Model::Location => "Location",
            Model::LocationDescription => "LocationDescription",
            Model::Name => "Name",
            Model::NameDescription => "NameDescription",
            Model::Observation => "Observation",
            Model::Project => "Project",
            Model::RssLog => "RssLog",
            Model::SpeciesList => "SpeciesList",
            Model::Specimen => "Specimen",
            Model::User => "User",
        }
    }

    /// Snake-case tag used in title metadata, e.g. "species_list".
    pub fn type_tag(&self) -> &'static str {
        match *self {
            Model::Comment => "comment",
            Model::Herbarium => "herbarium",
            Model::Image => "image",
            Model::Location => "location",
            Model::LocationDescription => "location_description",
            Model::Name => "name",
            Model::NameDescription => "name_description",
            Model::Observation => "observation",
            Model::Project => "project",
            Model::RssLog => "rss_log",
            Model::SpeciesList => "species_list",
            Model::Specimen => "specimen",
            Model::User => "user",
        }
    }

    pub fn table(&self) -> &'static str {
        match *self {
            Model::Comment => "comments",
            Model::Herbarium => "herbaria",
            Model::Image => "images",
            Model::Location => "locations",
            Model::LocationDescription => "location_descriptions",
            Model::Name => "names",
            Model::NameDescription => "name_descriptions",
            Model::Observation => "observations",
            Model::Project => "projects",
            Model::RssLog => "rss_logs",
            Model::SpeciesList => "species_lists",
            Model::Specimen => "specimens",
            Model::User => "users",
        }
    }

    /// Model whose table is the given name, if any.
    pub fn from_table(table: &str) -> Option<Model> {
        Model::ALL.iter().copied().find(|m| m.table() == table)
    }

    /// Parse a model name, e.g. "Observation".
    pub fn parse(name: &str) -> Option<Model> {
        Model::ALL.iter().copied().find(|m| m.as_str() == name)
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match *self {
            Model::Comment => &[
                "id", "created_at", "updated_at", "user_id", "summary", "comment",
                "target_type", "target_id",
            ],
            Model::Herbarium => &[
                "id", "created_at", "updated_at", "mailing_address", "location_id",
                "email", "name", "description", "code", "personal_user_id",
            ],
            Model::Image => &[
                "id", "created_at", "updated_at", "content_type", "user_id", "when",
                "notes", "copyright_holder", "license_id", "num_views", "last_view",
                "width", "height", "vote_cache", "ok_for_export", "original_name",
                "transferred",
            ],
            Model::Location => &[
                "id", "version", "created_at", "updated_at", "user_id",
                "description_id", "rss_log_id", "num_views", "last_view", "north",
                "south", "west", "east", "high", "low", "ok_for_export", "notes",
                "name", "scientific_name",
            ],
            Model::LocationDescription => &[
                "id", "version", "created_at", "updated_at", "user_id",
                "location_id", "num_views", "last_view", "source_type",
                "source_name", "locale", "public", "license_id", "merge_source_id",
                "gen_desc", "ecology", "species", "notes", "refs", "ok_for_export",
                "project_id",
            ],
            Model::Name => &[
                "id", "version", "created_at", "updated_at", "user_id",
                "description_id", "rss_log_id", "num_views", "last_view", "rank",
                "text_name", "search_name", "display_name", "sort_name", "citation",
                "deprecated", "synonym_id", "correct_spelling_id", "notes",
                "classification", "ok_for_export", "author",
            ],
            Model::NameDescription => &[
                "id", "version", "created_at", "updated_at", "user_id", "name_id",
                "review_status", "last_review", "reviewer_id", "ok_for_export",
                "num_views", "last_view", "source_type", "source_name", "locale",
                "public", "license_id", "merge_source_id", "gen_desc", "diag_desc",
                "distribution", "habitat", "look_alikes", "uses", "notes", "refs",
                "classification", "project_id",
            ],
            Model::Observation => &[
                "id", "created_at", "updated_at", "when", "user_id", "specimen",
                "notes", "thumb_image_id", "name_id", "location_id",
                "is_collection_location", "vote_cache", "num_views", "last_view",
                "rss_log_id", "lat", "long", "where", "alt",
            ],
            Model::Project => &[
                "id", "created_at", "updated_at", "user_id", "admin_group_id",
                "user_group_id", "title", "summary", "rss_log_id",
            ],
            Model::RssLog => &[
                "id", "updated_at", "observation_id", "species_list_id", "notes",
                "name_id", "location_id",
            ],
            Model::SpeciesList => &[
                "id", "created_at", "updated_at", "when", "user_id", "where",
                "title", "notes", "rss_log_id", "location_id",
            ],
            Model::Specimen => &[
                "id", "created_at", "updated_at", "herbarium_id", "when", "notes",
                "user_id", "herbarium_label",
            ],
            Model::User => &[
                "id", "created_at", "updated_at", "login", "email", "name",
                "last_login", "verified", "license_id", "contribution",
                "location_id", "image_id", "admin", "notes", "mailing_address",
            ],
        }
    }

    pub fn has_column(&self, col: &str) -> bool {
        self.columns().contains(&col)
    }

    /// True if rows of this model can carry an RSS log.
    pub fn has_rss_log(&self) -> bool {
        self.has_column("rss_log_id")
    }

    /// True if comments can be attached to rows of this model.
    pub fn has_comments(&self) -> bool {
        matches!(
            *self,
            Model::Location
                | Model::LocationDescription
                | Model::Name
                | Model::NameDescription
                | Model::Observation
                | Model::Project
                | Model::SpeciesList
        )
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How two tables connect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinKey {
    /// `from.<col> = to.id`
    Fk(&'static str),
    /// `from.<col>_id = to.id AND from.<col>_type = '<Model>'`
    Poly(&'static str),
    /// `from.<col1> = to.<col2>` -- both columns named explicitly.
    Pair(&'static str, &'static str),
}

/// Map of each table to the join targets it knows about.  A target may be a
/// plain table name or a dotted "table.alias" for alternate associations.
const JOIN_CONDITIONS: &[(&str, &[(&str, JoinKey)])] = &[
    (
        "comments",
        &[
            ("location_descriptions", JoinKey::Poly("target")),
            ("locations", JoinKey::Poly("target")),
            ("name_descriptions", JoinKey::Poly("target")),
            ("names", JoinKey::Poly("target")),
            ("observations", JoinKey::Poly("target")),
            ("projects", JoinKey::Poly("target")),
            ("species_lists", JoinKey::Poly("target")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "image_votes",
        &[
            ("images", JoinKey::Fk("image_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "images",
        &[
            ("users", JoinKey::Fk("user_id")),
            ("licenses", JoinKey::Fk("license_id")),
        ],
    ),
    (
        "images_observations",
        &[
            ("images", JoinKey::Fk("image_id")),
            ("observations", JoinKey::Fk("observation_id")),
        ],
    ),
    (
        "images_projects",
        &[
            ("images", JoinKey::Fk("image_id")),
            ("projects", JoinKey::Fk("project_id")),
        ],
    ),
    (
        "interests",
        &[
            ("locations", JoinKey::Poly("target")),
            ("names", JoinKey::Poly("target")),
            ("observations", JoinKey::Poly("target")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "location_descriptions",
        &[
            ("locations", JoinKey::Fk("location_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "location_descriptions_admins",
        &[
            ("location_descriptions", JoinKey::Fk("location_description_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
        ],
    ),
    (
        "location_descriptions_authors",
        &[
            ("location_descriptions", JoinKey::Fk("location_description_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "location_descriptions_editors",
        &[
            ("location_descriptions", JoinKey::Fk("location_description_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "location_descriptions_readers",
        &[
            ("location_descriptions", JoinKey::Fk("location_description_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
        ],
    ),
    (
        "location_descriptions_versions",
        &[("location_descriptions", JoinKey::Fk("location_description_id"))],
    ),
    (
        "location_descriptions_writers",
        &[
            ("location_descriptions", JoinKey::Fk("location_description_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
        ],
    ),
    (
        "locations",
        &[
            ("licenses", JoinKey::Fk("license_id")),
            ("location_descriptions.default", JoinKey::Fk("description_id")),
            ("rss_logs", JoinKey::Fk("rss_log_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    ("locations_versions", &[("locations", JoinKey::Fk("location_id"))]),
    (
        "name_descriptions",
        &[
            ("names", JoinKey::Fk("name_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "name_descriptions_admins",
        &[
            ("name_descriptions", JoinKey::Fk("name_description_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
        ],
    ),
    (
        "name_descriptions_authors",
        &[
            ("name_descriptions", JoinKey::Fk("name_description_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "name_descriptions_editors",
        &[
            ("name_descriptions", JoinKey::Fk("name_description_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "name_descriptions_readers",
        &[
            ("name_descriptions", JoinKey::Fk("name_description_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
        ],
    ),
    (
        "name_descriptions_versions",
        &[("name_descriptions", JoinKey::Fk("name_description_id"))],
    ),
    (
        "name_descriptions_writers",
        &[
            ("name_descriptions", JoinKey::Fk("name_description_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
        ],
    ),
    (
        "names",
        &[
            ("licenses", JoinKey::Fk("license_id")),
            ("name_descriptions.default", JoinKey::Fk("description_id")),
            ("rss_logs", JoinKey::Fk("rss_log_id")),
            ("users", JoinKey::Fk("user_id")),
            ("users.reviewer", JoinKey::Fk("reviewer_id")),
        ],
    ),
    ("names_versions", &[("names", JoinKey::Fk("name_id"))]),
    (
        "namings",
        &[
            ("names", JoinKey::Fk("name_id")),
            ("observations", JoinKey::Fk("observation_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "notifications",
        &[
            ("names", JoinKey::Poly("obj")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "observations",
        &[
            ("locations", JoinKey::Fk("location_id")),
            ("names", JoinKey::Fk("name_id")),
            ("rss_logs", JoinKey::Fk("rss_log_id")),
            ("users", JoinKey::Fk("user_id")),
            ("images.thumb_image", JoinKey::Fk("thumb_image_id")),
            ("image_votes.thumb_image", JoinKey::Pair("thumb_image_id", "image_id")),
        ],
    ),
    (
        "observations_projects",
        &[
            ("observations", JoinKey::Fk("observation_id")),
            ("projects", JoinKey::Fk("project_id")),
        ],
    ),
    (
        "observations_species_lists",
        &[
            ("observations", JoinKey::Fk("observation_id")),
            ("species_lists", JoinKey::Fk("species_list_id")),
        ],
    ),
    (
        "projects",
        &[
            ("users", JoinKey::Fk("user_id")),
            ("rss_logs", JoinKey::Fk("rss_log_id")),
            ("user_groups", JoinKey::Fk("user_group_id")),
            ("user_groups.admin_group", JoinKey::Fk("admin_group_id")),
        ],
    ),
    (
        "projects_species_lists",
        &[
            ("projects", JoinKey::Fk("project_id")),
            ("species_lists", JoinKey::Fk("species_list_id")),
        ],
    ),
    (
        "rss_logs",
        &[
            ("locations", JoinKey::Fk("location_id")),
            ("names", JoinKey::Fk("name_id")),
            ("observations", JoinKey::Fk("observation_id")),
            ("species_lists", JoinKey::Fk("species_list_id")),
        ],
    ),
    (
        "species_lists",
        &[
            ("locations", JoinKey::Fk("location_id")),
            ("rss_logs", JoinKey::Fk("rss_log_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "user_groups_users",
        &[
            ("user_groups", JoinKey::Fk("user_group_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
    (
        "users",
        &[
            ("images", JoinKey::Fk("image_id")),
            ("licenses", JoinKey::Fk("license_id")),
            ("locations", JoinKey::Fk("location_id")),
        ],
    ),
    (
        "votes",
        &[
            ("namings", JoinKey::Fk("naming_id")),
            ("observations", JoinKey::Fk("observation_id")),
            ("users", JoinKey::Fk("user_id")),
        ],
    ),
];

/// Foreign key connecting `from` to the join target `to`, which may carry a
/// ".alias" suffix for alternate associations.  Direct lookup only; the join
/// planner also tries the reverse direction.
pub fn join_key(from: &str, to: &str) -> Option<JoinKey> {
    let from = from.split('.').next().unwrap_or(from);
    JOIN_CONDITIONS
        .iter()
        .find(|(table, _)| *table == from)
        .and_then(|(_, targets)| {
            targets.iter().find(|(t, _)| *t == to).map(|(_, k)| *k)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_tables_round_trip() {
        for model in Model::ALL {
            assert_eq!(Model::from_table(model.table()), Some(model));
            assert_eq!(Model::parse(model.as_str()), Some(model));
            assert!(model.has_column("id"));
        }
    }

    #[test]
    fn forward_and_aliased_join_keys() {
        assert_eq!(join_key("observations", "names"), Some(JoinKey::Fk("name_id")));
        assert_eq!(
            join_key("locations", "location_descriptions.default"),
            Some(JoinKey::Fk("description_id"))
        );
        assert_eq!(
            join_key("observations", "image_votes.thumb_image"),
            Some(JoinKey::Pair("thumb_image_id", "image_id"))
        );
        assert_eq!(join_key("comments", "observations"), Some(JoinKey::Poly("target")));
        assert_eq!(join_key("observations", "herbaria"), None);
    }
}
