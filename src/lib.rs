pub use flavor::Flavor;
pub use lookup::PgStore;
pub use lookup::Store;
pub use metadata::Model;
pub use params::ParamValues;
pub use params::Value;
pub use query::Executor;
pub use query::Query;
pub use result::QueryError;
pub use result::QueryResult;

mod build;
pub mod coerce;
pub mod constants;
pub mod date;
pub mod db;
pub mod flavor;
pub mod google;
pub mod join;
pub mod lookup;
pub mod metadata;
mod order;
pub mod params;
pub mod query;
pub mod result;
pub mod util;

#[cfg(test)]
mod tests;
