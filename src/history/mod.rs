pub mod repo;
pub mod repo_types;

pub use repo::HistoryLedger;
pub use repo_types::{IndicatorQuery, NewIndicatorQuery};
