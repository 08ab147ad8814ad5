//! Price data providers and input validation.

pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod validate;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use provider::{DataError, DataProvider, DataSource, StaticProvider};
pub use synthetic::SyntheticProvider;
pub use validate::validate_points;
pub use yahoo::{RetryPolicy, YahooProvider};
