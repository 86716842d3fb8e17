//! Common result and error types for query construction.
//!
//! Every failure the engine can produce during a build pass is represented
//! here as a typed variant so callers can distinguish user errors (bad
//! parameters) from programmer errors (unknown join paths, stale metadata).
use std::error::Error;
use std::fmt;

pub type QueryResult<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The (model, flavor) pair is not in the allow-list.
    UnknownFlavorForModel { model: &'static str, flavor: &'static str },

    /// A required parameter was not supplied.
    MissingParam(String),

    /// A parameter was supplied that the flavor does not declare.
    UnexpectedParam(String),

    /// A parameter value fell outside its declared choice set.
    InvalidEnum { param: String, value: String },

    /// A parameter value could not be coerced to its declared type.
    InvalidValueType { param: String, expected: &'static str },

    /// An object reference resolved to nothing when a canonical instance
    /// was required.
    ReferenceNotFound(String),

    /// An object reference resolved to more than one row when a single
    /// canonical instance was required.
    AmbiguousReference(String),

    /// The join metadata has no route between two tables.  Indicates a bug
    /// in a condition builder or stale metadata, not a user error.
    NoJoinPath { from: String, to: String },

    /// The relational store rejected a lookup query.
    Db(String),

    /// General failure not covered by a more specific variant.
    Message(String),
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlavorForModel { model, flavor } => {
                write!(f, "Invalid query flavor '{flavor}' for {model} model")
            }
            Self::MissingParam(p) => write!(f, "Missing :{p} parameter"),
            Self::UnexpectedParam(p) => write!(f, "Unexpected parameter :{p}"),
            Self::InvalidEnum { param, value } => {
                write!(f, "Value '{value}' for :{param} is not in the allowed set")
            }
            Self::InvalidValueType { param, expected } => {
                write!(f, "Value for :{param} should be {expected}")
            }
            Self::ReferenceNotFound(what) => write!(f, "Couldn't find {what}"),
            Self::AmbiguousReference(what) => {
                write!(f, "More than one match for {what}")
            }
            Self::NoJoinPath { from, to } => {
                write!(f, "Don't know how to join from {from} to {to}")
            }
            Self::Db(e) => write!(f, "DB error: {e}"),
            Self::Message(m) => write!(f, "{m}"),
        }
    }
}

impl From<String> for QueryError {
    fn from(msg: String) -> Self {
        QueryError::Message(msg)
    }
}

impl From<&str> for QueryError {
    fn from(msg: &str) -> Self {
        QueryError::Message(msg.to_string())
    }
}

/// Lets `?` propagate postgres errors out of reference-resolution lookups.
impl From<postgres::Error> for QueryError {
    fn from(original: postgres::Error) -> Self {
        QueryError::Db(original.to_string())
    }
}
