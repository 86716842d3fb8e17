//! Fixed domain vocabularies shared by the schema tables and the condition
//! builders.

/// Taxonomic ranks from lowest to highest, plus the catch-all "Group".
/// The integer values match the `names.rank` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Form = 1,
    Variety = 2,
    Subspecies = 3,
    Species = 4,
    Genus = 5,
    Family = 6,
    Order = 7,
    Class = 8,
    Phylum = 9,
    Kingdom = 10,
    Group = 11,
}

impl Rank {
    pub const ALL: [Rank; 11] = [
        Rank::Form,
        Rank::Variety,
        Rank::Subspecies,
        Rank::Species,
        Rank::Genus,
        Rank::Family,
        Rank::Order,
        Rank::Class,
        Rank::Phylum,
        Rank::Kingdom,
        Rank::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Rank::Form => "Form",
            Rank::Variety => "Variety",
            Rank::Subspecies => "Subspecies",
            Rank::Species => "Species",
            Rank::Genus => "Genus",
            Rank::Family => "Family",
            Rank::Order => "Order",
            Rank::Class => "Class",
            Rank::Phylum => "Phylum",
            Rank::Kingdom => "Kingdom",
            Rank::Group => "Group",
        }
    }

    pub fn parse(s: &str) -> Option<Rank> {
        Rank::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    pub fn from_int(n: i64) -> Option<Rank> {
        Rank::ALL.iter().copied().find(|r| *r as i64 == n)
    }

    /// Position in the low-to-high ordering, 0-based.
    pub fn index(&self) -> usize {
        Rank::ALL.iter().position(|r| r == self).unwrap_or(0)
    }

    pub fn at_or_below_genus(&self) -> bool {
        *self <= Rank::Genus
    }
}

/// Rank names as they appear in parameter declarations.
pub const ALL_RANK_NAMES: &[&str] = &[
    "Form",
    "Variety",
    "Subspecies",
    "Species",
    "Genus",
    "Family",
    "Order",
    "Class",
    "Phylum",
    "Kingdom",
    "Group",
];

/// Models that support attached comments, i.e. legal values of
/// `comments.target_type`.
pub const COMMENT_TARGET_TYPES: &[&str] = &[
    "Location",
    "LocationDescription",
    "Name",
    "NameDescription",
    "Observation",
    "Project",
    "SpeciesList",
];

/// Object kinds an RSS log entry can point at.  Each has a matching
/// `rss_logs.<type>_id` column.
pub const RSS_LOG_TYPES: &[&str] = &["location", "name", "observation", "species_list"];

/// Image size classes, smallest first.  `full_size` is unbounded and is not
/// offered as a filter value.
pub const IMAGE_SIZES: &[&str] = &["thumbnail", "small", "medium", "large", "huge"];

/// Maximum pixel dimension of each size class, aligned with `IMAGE_SIZES`
/// plus a final entry for `full_size`.
pub const IMAGE_SIZE_PIXELS: &[i64] = &[160, 320, 640, 960, 1280, i64::MAX];

/// Filterable image file formats.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "gif", "png", "raw"];

/// Content types matching `IMAGE_EXTENSIONS` (raw matches anything else).
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/gif", "image/png"];

/// Descriptive text fields on name descriptions, in UI order.
pub const NAME_DESC_NOTE_FIELDS: &[&str] = &[
    "classification",
    "gen_desc",
    "diag_desc",
    "distribution",
    "habitat",
    "look_alikes",
    "uses",
    "refs",
    "notes",
];

/// Descriptive text fields on location descriptions.
pub const LOCATION_DESC_NOTE_FIELDS: &[&str] =
    &["gen_desc", "ecology", "species", "notes", "refs"];

/// Description provenance kinds; integer values match
/// `*_descriptions.source_type`.
pub const DESC_SOURCE_TYPES: &[(&str, i64)] = &[
    ("public", 0),
    ("foreign", 1),
    ("project", 2),
    ("source", 3),
    ("user", 4),
];

/// Hard cap on the number of ids interpolated into an `IN (...)` set.
pub const QUERY_MAX_ARRAY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_ordering() {
        assert!(Rank::Form < Rank::Genus);
        assert!(Rank::Variety.at_or_below_genus());
        assert!(!Rank::Family.at_or_below_genus());
        assert_eq!(Rank::parse("Species"), Some(Rank::Species));
        assert_eq!(Rank::from_int(11), Some(Rank::Group));
        assert_eq!(Rank::Kingdom.index(), 9);
    }
}
