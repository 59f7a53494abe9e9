// Library interface for coachload modules
// The CLI and integration tests go through these exports

pub mod config;
pub mod display;
pub mod error;
pub mod internal_load;
pub mod load;
pub mod logging;
pub mod models;
pub mod store;
pub mod tables;
pub mod trend;
pub mod weekly;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use error::{CoachLoadError, DataWarning, Result};
pub use internal_load::{internal_load_series, WeeklyInternalLoad};
pub use load::{SessionTotals, ZoneWeights};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use store::CsvStore;
pub use tables::{SessionFilter, SessionSort, Tables};
pub use trend::{PercentChange, TrendComparator};
pub use weekly::{aggregate_assignments, WeeklyAggregate, WeeklyAggregator};
pub use zones::ZoneTimeAnalyzer;
