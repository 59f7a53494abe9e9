//! Unified error hierarchy for coachload
//!
//! Fatal conditions are errors; missing or orphaned references found while
//! aggregating are [`DataWarning`]s that travel next to the computed records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Week;

/// Top-level error type for all coachload operations
#[derive(Debug, Error)]
pub enum CoachLoadError {
    /// Domain value rejected by a constructor
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Table file read/write errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Lookup by natural key failed
    #[error("Record not found: {table}.{key}")]
    NotFound { table: &'static str, key: String },

    /// Natural key already taken
    #[error("Duplicate entry: {table}.{key}")]
    Duplicate { table: &'static str, key: String },
}

/// Rejected domain values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("zone must be between 1 and 7, got {0}")]
    ZoneOutOfRange(i64),

    #[error("no zone digit in label '{0}'")]
    ZoneLabel(String),

    #[error("block duration must be >= 0, got {0}")]
    NegativeDuration(Decimal),

    #[error("block repetitions must be >= 1, got {0}")]
    InvalidRepetitions(i64),

    #[error("perceived effort must be between 1 and 10, got {0}")]
    EffortOutOfRange(i64),

    #[error("carbohydrate intake must be at most 200 g/h, got {0}")]
    CarbsOutOfRange(u16),

    #[error("unrecognised week label '{0}'")]
    WeekLabel(String),

    #[error("{0} is not a Monday")]
    NotMonday(NaiveDate),

    #[error("week label '{label}' names week {stated} but {monday} is in week {actual}")]
    WeekNumberMismatch {
        label: String,
        stated: u32,
        actual: u32,
        monday: NaiveDate,
    },

    #[error("zone weights must be 7 non-negative coefficients")]
    ZoneWeights,

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("unrecognised yes/no flag '{0}'")]
    Flag(String),

    #[error("unrecognised date '{0}'")]
    DateTime(String),

    #[error("unknown cycle phase '{0}'")]
    CyclePhase(String),

    #[error("unrecognised number '{0}'")]
    Number(String),
}

/// Table store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid blocks JSON for session '{session}': {source}")]
    BlocksJson {
        session: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for coachload operations
pub type Result<T> = std::result::Result<T, CoachLoadError>;

impl CoachLoadError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoachLoadError::Validation(_) => ErrorSeverity::Warning,
            CoachLoadError::NotFound { .. } => ErrorSeverity::Warning,
            CoachLoadError::Duplicate { .. } => ErrorSeverity::Warning,
            CoachLoadError::Configuration(_) => ErrorSeverity::Error,
            CoachLoadError::Store(_) | CoachLoadError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CoachLoadError::NotFound { table, key } => {
                format!("No {} named '{}' exists.", table.trim_end_matches('s'), key)
            }
            CoachLoadError::Duplicate { table, key } => {
                format!("'{}' is already registered in {}.", key, table)
            }
            CoachLoadError::Store(StoreError::Csv { path, .. }) => {
                format!("Could not read table file {}", path.display())
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

/// Non-fatal data problem surfaced to the user alongside a result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataWarning {
    /// Assignment whose session no longer exists
    #[error("session '{session_name}' assigned to {athlete_id} in {week} no longer exists")]
    OrphanedAssignment {
        athlete_id: String,
        session_name: String,
        week: Week,
    },

    /// Feedback whose session no longer exists
    #[error("feedback from {athlete_id} on '{session_name}' ({week}) refers to a deleted session")]
    OrphanedFeedback {
        athlete_id: String,
        session_name: String,
        week: Week,
    },

    /// Block dropped from a session because it could not be interpreted
    #[error("block #{} of session '{session_name}' skipped: {reason}", .index + 1)]
    MalformedBlock {
        session_name: String,
        index: usize,
        reason: String,
    },

    /// Stored totals disagree with the block sums and were recomputed
    #[error("stored totals of session '{session_name}' were recomputed")]
    StaleTotals { session_name: String },

    /// Table row that could not be parsed
    #[error("{table} line {line} skipped: {reason}")]
    SkippedRow {
        table: &'static str,
        line: u64,
        reason: String,
    },

    /// Cycle phase recorded for an athlete without cycle tracking
    #[error("cycle phase ignored: {athlete_id} has no cycle tracking")]
    CycleTrackingIgnored { athlete_id: String },
}

impl DataWarning {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DataWarning::StaleTotals { .. } | DataWarning::CycleTrackingIgnored { .. } => {
                ErrorSeverity::Info
            }
            _ => ErrorSeverity::Warning,
        }
    }

    /// Whether this warning names an orphaned reference
    pub fn is_orphan(&self) -> bool {
        matches!(
            self,
            DataWarning::OrphanedAssignment { .. } | DataWarning::OrphanedFeedback { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = CoachLoadError::NotFound {
            table: "sessions",
            key: "Tempo".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = CoachLoadError::Configuration("bad weights".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_user_messages() {
        let err = CoachLoadError::NotFound {
            table: "athletes",
            key: "Alice".to_string(),
        };
        assert_eq!(err.user_message(), "No athlete named 'Alice' exists.");
    }

    #[test]
    fn test_orphan_warning_display() {
        let week = Week::from_ymd(2024, 3, 4).unwrap();
        let warning = DataWarning::OrphanedAssignment {
            athlete_id: "Alice".to_string(),
            session_name: "Fartlek".to_string(),
            week,
        };
        assert!(warning.is_orphan());
        assert_eq!(warning.severity(), ErrorSeverity::Warning);
        assert_eq!(
            warning.to_string(),
            "session 'Fartlek' assigned to Alice in S10 - 04/03 no longer exists"
        );
    }

    #[test]
    fn test_block_and_row_warning_display() {
        let warning = DataWarning::MalformedBlock {
            session_name: "Fartlek".to_string(),
            index: 0,
            reason: "no zone digit in label 'easy'".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "block #1 of session 'Fartlek' skipped: no zone digit in label 'easy'"
        );

        let warning = DataWarning::SkippedRow {
            table: "feedback",
            line: 4,
            reason: "perceived effort must be between 1 and 10, got 11".to_string(),
        };
        assert_eq!(warning.severity(), ErrorSeverity::Warning);
        assert_eq!(
            warning.to_string(),
            "feedback line 4 skipped: perceived effort must be between 1 and 10, got 11"
        );
    }
}
