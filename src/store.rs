//! CSV table files
//!
//! One file per table under a data directory. Column headers of the original
//! French dashboard are accepted as aliases on read; writes use the English
//! headers. A missing file is an empty table and unparseable rows are skipped.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DataWarning, Result, StoreError, ValidationError};
use crate::load::ZoneWeights;
use crate::models::{
    parse_flag, Athlete, Assignment, BlockRecord, CyclePhase, ExtraSession, Feedback, Rpe, Session,
    Week,
};
use crate::tables::{ExtraTable, Tables};

pub const ATHLETES_FILE: &str = "athletes.csv";
pub const SESSIONS_FILE: &str = "sessions.csv";
pub const ASSIGNMENTS_FILE: &str = "assignments.csv";
pub const FEEDBACK_FILE: &str = "feedback.csv";
pub const EXTRAS_FILE: &str = "extras.csv";
/// Read when `extras.csv` is absent
pub const LEGACY_EXTRAS_FILE: &str = "extras_seances.csv";

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(alias = "Nom")]
    name: String,
    /// JSON array of block records
    #[serde(alias = "Blocs")]
    blocks: String,
    #[serde(alias = "Charge totale", default)]
    total_load: Option<Decimal>,
    #[serde(alias = "Volume total", default)]
    total_volume: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssignmentRecord {
    #[serde(alias = "Athlete")]
    athlete: String,
    #[serde(alias = "Seance")]
    session: String,
    #[serde(alias = "Semaine")]
    week: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeedbackRecord {
    #[serde(alias = "Athlete")]
    athlete: String,
    #[serde(alias = "Seance")]
    session: String,
    #[serde(alias = "Semaine")]
    week: String,
    #[serde(alias = "Effectuee")]
    completed: String,
    #[serde(alias = "RPE")]
    rpe: i64,
    #[serde(alias = "Commentaire", default)]
    comment: Option<String>,
    #[serde(alias = "Phase menstruelle", default)]
    cycle_phase: Option<String>,
    #[serde(alias = "Glucides (g/h)", default)]
    carbs_g_per_h: Option<u16>,
    #[serde(alias = "Symptomes", default)]
    symptoms: Option<String>,
    #[serde(alias = "Date seance", default)]
    logged_at: Option<String>,
}

/// Reads and writes [`Tables`] as CSV files in one directory
#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
    weights: ZoneWeights,
    default_year: i32,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>, default_year: i32) -> Self {
        CsvStore {
            data_dir: data_dir.into(),
            weights: ZoneWeights::default(),
            default_year,
        }
    }

    /// Zone weights applied to the sessions read back
    pub fn with_weights(mut self, weights: ZoneWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Load every table, collecting row-level warnings
    pub fn load(&self) -> Result<(Tables, Vec<DataWarning>)> {
        let mut tables = Tables::new();
        let mut warnings = Vec::new();

        for (line, athlete) in self.read_rows::<Athlete>(ATHLETES_FILE, "athletes", &mut warnings)? {
            if let Err(e) = tables.athletes.add(athlete) {
                warnings.push(skipped("athletes", line, e.to_string()));
            }
        }

        for (line, record) in self.read_rows::<SessionRecord>(SESSIONS_FILE, "sessions", &mut warnings)? {
            let session = match self.session_from_record(&record, &mut warnings) {
                Ok(session) => session,
                Err(e) => {
                    warnings.push(skipped("sessions", line, e.to_string()));
                    continue;
                }
            };
            if let Err(e) = tables.sessions.create(session) {
                warnings.push(skipped("sessions", line, e.to_string()));
            }
        }

        for (line, record) in
            self.read_rows::<AssignmentRecord>(ASSIGNMENTS_FILE, "assignments", &mut warnings)?
        {
            match Week::parse(&record.week, self.default_year) {
                Ok(week) => tables
                    .assignments
                    .push(Assignment::new(record.athlete, record.session, week)),
                Err(e) => warnings.push(skipped("assignments", line, e.to_string())),
            }
        }

        for (line, record) in self.read_rows::<FeedbackRecord>(FEEDBACK_FILE, "feedback", &mut warnings)? {
            match self.feedback_from_record(record) {
                Ok(feedback) => {
                    tables.feedback.save(feedback);
                }
                Err(e) => warnings.push(skipped("feedback", line, e.to_string())),
            }
        }

        let extras_file = if self.path(EXTRAS_FILE).exists() || !self.path(LEGACY_EXTRAS_FILE).exists() {
            EXTRAS_FILE
        } else {
            LEGACY_EXTRAS_FILE
        };
        for (line, extra) in self.read_rows::<ExtraSession>(extras_file, "extras", &mut warnings)? {
            if let Err(e) = tables.extras.add(extra) {
                warnings.push(skipped("extras", line, e.to_string()));
            }
        }

        tracing::info!(
            dir = %self.data_dir.display(),
            athletes = tables.athletes.len(),
            sessions = tables.sessions.len(),
            assignments = tables.assignments.len(),
            feedback = tables.feedback.len(),
            extras = tables.extras.len(),
            warnings = warnings.len(),
            "Tables loaded"
        );

        Ok((tables, warnings))
    }

    /// Write every table, replacing existing files
    pub fn save(&self, tables: &Tables) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        self.write_rows(ATHLETES_FILE, tables.athletes.iter())?;

        let sessions = tables
            .sessions
            .iter()
            .map(|session| -> Result<SessionRecord> {
                let blocks: Vec<BlockRecord> = session.blocks().iter().map(BlockRecord::from).collect();
                let blocks = serde_json::to_string(&blocks).map_err(|source| StoreError::BlocksJson {
                    session: session.name().to_string(),
                    source,
                })?;
                Ok(SessionRecord {
                    name: session.name().to_string(),
                    blocks,
                    total_load: Some(session.total_load()),
                    total_volume: Some(session.total_volume()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.write_rows(SESSIONS_FILE, sessions.iter())?;

        let assignments = tables.assignments.iter().map(|a| AssignmentRecord {
            athlete: a.athlete_id.clone(),
            session: a.session_name.clone(),
            week: String::from(a.week),
        });
        self.write_rows(ASSIGNMENTS_FILE, assignments)?;

        let feedback = tables.feedback.iter().map(|f| FeedbackRecord {
            athlete: f.athlete_id.clone(),
            session: f.session_name.clone(),
            week: String::from(f.week),
            completed: f.completed.to_string(),
            rpe: f.perceived_effort.value() as i64,
            comment: Some(f.comment.clone()).filter(|c| !c.is_empty()),
            cycle_phase: f.cycle_phase.map(|p| p.label().to_string()),
            carbs_g_per_h: f.carbs_g_per_h,
            symptoms: f.symptoms.clone(),
            logged_at: Some(f.logged_at.format(LOGGED_AT_FORMAT).to_string()),
        });
        self.write_rows(FEEDBACK_FILE, feedback)?;
        self.write_rows(EXTRAS_FILE, tables.extras.iter())?;

        tracing::info!(dir = %self.data_dir.display(), "Tables saved");
        Ok(())
    }

    /// Write only the extra-sessions table
    pub fn save_extras(&self, extras: &ExtraTable) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        self.write_rows(EXTRAS_FILE, extras.iter())?;
        tracing::info!(dir = %self.data_dir.display(), extras = extras.len(), "Extra sessions saved");
        Ok(())
    }

    /// Rows that parsed, with their line numbers
    fn read_rows<R: DeserializeOwned>(
        &self,
        file: &str,
        table: &'static str,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<Vec<(u64, R)>> {
        let path = self.path(file);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Table file missing, starting empty");
            return Ok(Vec::new());
        }

        let csv_error = |source: csv::Error| StoreError::Csv {
            path: path.clone(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(&path)
            .map_err(csv_error)?;
        let headers = reader.headers().map_err(csv_error)?.clone();

        let mut rows = Vec::new();
        let mut record = StringRecord::new();
        loop {
            match reader.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    let line = record.position().map(|p| p.line()).unwrap_or_default();
                    match record.deserialize::<R>(Some(&headers)) {
                        Ok(row) => rows.push((line, row)),
                        Err(e) => {
                            tracing::warn!(table, line, error = %e, "Skipping unparseable row");
                            warnings.push(skipped(table, line, e.to_string()));
                        }
                    }
                }
                Err(e) if e.is_io_error() => return Err(csv_error(e).into()),
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    tracing::warn!(table, line, error = %e, "Skipping malformed row");
                    warnings.push(skipped(table, line, e.to_string()));
                }
            }
        }
        Ok(rows)
    }

    fn write_rows<S, I>(&self, file: &str, rows: I) -> Result<()>
    where
        S: Serialize,
        I: IntoIterator<Item = S>,
    {
        let path = self.path(file);
        let csv_error = |source: csv::Error| StoreError::Csv {
            path: path.clone(),
            source,
        };
        let mut writer = WriterBuilder::new().from_path(&path).map_err(csv_error)?;
        for row in rows {
            writer.serialize(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(())
    }

    fn session_from_record(
        &self,
        record: &SessionRecord,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<Session> {
        let blocks: Vec<BlockRecord> = if record.blocks.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&record.blocks).map_err(|source| StoreError::BlocksJson {
                session: record.name.clone(),
                source,
            })?
        };

        let (session, block_warnings) = Session::from_records(record.name.clone(), &blocks, self.weights);
        warnings.extend(block_warnings);

        let stale = record.total_load.is_some_and(|load| load != session.total_load())
            || record.total_volume.is_some_and(|volume| volume != session.total_volume());
        if stale {
            tracing::debug!(session = %record.name, "Stored totals differ from block sums");
            warnings.push(DataWarning::StaleTotals {
                session_name: record.name.clone(),
            });
        }
        Ok(session)
    }

    fn feedback_from_record(&self, record: FeedbackRecord) -> std::result::Result<Feedback, ValidationError> {
        let week = Week::parse(&record.week, self.default_year)?;
        let completed =
            parse_flag(&record.completed).ok_or_else(|| ValidationError::Flag(record.completed.clone()))?;
        let rpe = Rpe::new(record.rpe)?;
        let logged_at = match record.logged_at.as_deref() {
            Some(raw) => parse_logged_at(raw).ok_or_else(|| ValidationError::DateTime(raw.to_string()))?,
            None => week.monday().and_time(chrono::NaiveTime::MIN),
        };

        let mut feedback = Feedback::new(record.athlete, record.session, week, completed, rpe, logged_at);
        if let Some(comment) = record.comment {
            feedback = feedback.with_comment(comment);
        }
        if let Some(phase) = record.cycle_phase {
            let phase: CyclePhase = phase.parse()?;
            feedback = feedback.with_cycle(phase, record.symptoms);
        }
        if let Some(carbs) = record.carbs_g_per_h {
            feedback = feedback.with_carbs(carbs)?;
        }
        Ok(feedback)
    }
}

const LOGGED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn skipped(table: &'static str, line: u64, reason: String) -> DataWarning {
    DataWarning::SkippedRow { table, line, reason }
}

fn parse_logged_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, LOGGED_AT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
}
