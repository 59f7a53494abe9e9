//! In-memory tables keyed by natural identifiers
//!
//! Aggregation functions borrow these tables; nothing here performs I/O.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoachLoadError, DataWarning, Result, ValidationError};
use crate::models::{Assignment, Athlete, Block, ExtraSession, Feedback, FeedbackKey, Session, Week};

/// Athletes keyed by name
#[derive(Debug, Clone, Default)]
pub struct AthleteTable {
    rows: BTreeMap<String, Athlete>,
}

impl AthleteTable {
    pub fn add(&mut self, athlete: Athlete) -> Result<()> {
        if athlete.name.trim().is_empty() {
            return Err(ValidationError::Empty("athlete name").into());
        }
        if self.rows.contains_key(&athlete.name) {
            return Err(CoachLoadError::Duplicate {
                table: "athletes",
                key: athlete.name,
            });
        }
        self.rows.insert(athlete.name.clone(), athlete);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Athlete> {
        self.rows.remove(name).ok_or_else(|| CoachLoadError::NotFound {
            table: "athletes",
            key: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Athlete> {
        self.rows.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Athlete> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ordering applied to a session listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSort {
    Name,
    Volume,
    Load,
}

/// Criteria for [`SessionTable::search`]; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub names: Option<BTreeSet<String>>,
    pub text: Option<String>,
    pub min_volume: Option<Decimal>,
    pub max_volume: Option<Decimal>,
    pub min_load: Option<Decimal>,
    pub max_load: Option<Decimal>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        let volume = session.total_volume();
        let load = session.total_load();
        self.names
            .as_ref()
            .map_or(true, |names| names.contains(session.name()))
            && self
                .text
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map_or(true, |t| session.matches_text(t.trim()))
            && self.min_volume.map_or(true, |min| volume >= min)
            && self.max_volume.map_or(true, |max| volume <= max)
            && self.min_load.map_or(true, |min| load >= min)
            && self.max_load.map_or(true, |max| load <= max)
    }
}

/// Structured sessions keyed by name
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    rows: BTreeMap<String, Session>,
}

impl SessionTable {
    /// Store a new session; names are unique
    pub fn create(&mut self, session: Session) -> Result<()> {
        if session.name().trim().is_empty() {
            return Err(ValidationError::Empty("session name").into());
        }
        if self.rows.contains_key(session.name()) {
            return Err(CoachLoadError::Duplicate {
                table: "sessions",
                key: session.name().to_string(),
            });
        }
        tracing::debug!(
            session = session.name(),
            volume = %session.total_volume(),
            load = %session.total_load(),
            "Session created"
        );
        self.rows.insert(session.name().to_string(), session);
        Ok(())
    }

    /// Replace the blocks of an existing session, recomputing its totals
    pub fn update_blocks(&mut self, name: &str, blocks: Vec<Block>) -> Result<&Session> {
        let session = self.rows.get_mut(name).ok_or_else(|| CoachLoadError::NotFound {
            table: "sessions",
            key: name.to_string(),
        })?;
        session.set_blocks(blocks);
        Ok(session)
    }

    /// Remove a session; assignments that reference it become orphans
    pub fn delete(&mut self, name: &str) -> Result<Session> {
        self.rows.remove(name).ok_or_else(|| CoachLoadError::NotFound {
            table: "sessions",
            key: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Session> {
        self.rows.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn search(&self, filter: &SessionFilter, sort: SessionSort, ascending: bool) -> Vec<&Session> {
        let mut found: Vec<&Session> = self.rows.values().filter(|s| filter.matches(s)).collect();
        match sort {
            SessionSort::Name => found.sort_by(|a, b| a.name().cmp(b.name())),
            SessionSort::Volume => found.sort_by(|a, b| {
                a.total_volume()
                    .cmp(&b.total_volume())
                    .then_with(|| a.name().cmp(b.name()))
            }),
            SessionSort::Load => found.sort_by(|a, b| {
                a.total_load()
                    .cmp(&b.total_load())
                    .then_with(|| a.name().cmp(b.name()))
            }),
        }
        if !ascending {
            found.reverse();
        }
        found
    }
}

/// Session-to-athlete assignments in insertion order
#[derive(Debug, Clone, Default)]
pub struct AssignmentTable {
    rows: Vec<Assignment>,
}

impl AssignmentTable {
    /// Append without reference checks, as when loading stored rows
    pub fn push(&mut self, assignment: Assignment) {
        self.rows.push(assignment);
    }

    pub fn remove(&mut self, index: usize) -> Result<Assignment> {
        if index >= self.rows.len() {
            return Err(CoachLoadError::NotFound {
                table: "assignments",
                key: index.to_string(),
            });
        }
        Ok(self.rows.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn for_athlete<'a, 'b>(
        &'a self,
        athlete_id: &'b str,
    ) -> impl Iterator<Item = &'a Assignment> + 'b
    where
        'a: 'b,
    {
        self.rows.iter().filter(move |a| a.athlete_id == athlete_id)
    }

    /// Assignments of one athlete whose Monday lies in `[start, start + 6 days]`
    pub fn in_window<'a, 'b>(
        &'a self,
        athlete_id: &'b str,
        start: NaiveDate,
    ) -> impl Iterator<Item = &'a Assignment> + 'b
    where
        'a: 'b,
    {
        let end = start + Duration::days(6);
        self.for_athlete(athlete_id)
            .filter(move |a| a.week.monday() >= start && a.week.monday() <= end)
    }

    /// Distinct weeks with at least one assignment for the athlete, oldest first
    pub fn weeks_for(&self, athlete_id: &str) -> Vec<Week> {
        self.for_athlete(athlete_id)
            .map(|a| a.week)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Assignments from the last `weeks` weeks before `reference`, sorted by athlete then week
    pub fn recent(&self, reference: NaiveDate, weeks: u32) -> Vec<&Assignment> {
        let limit = reference - Duration::weeks(weeks as i64);
        let mut recent: Vec<&Assignment> =
            self.rows.iter().filter(|a| a.week.monday() >= limit).collect();
        recent.sort_by(|a, b| {
            a.athlete_id
                .cmp(&b.athlete_id)
                .then_with(|| a.week.cmp(&b.week))
        });
        recent
    }
}

/// Feedback with at most one entry per (athlete, session, week)
#[derive(Debug, Clone, Default)]
pub struct FeedbackTable {
    rows: BTreeMap<FeedbackKey, Feedback>,
}

impl FeedbackTable {
    /// Insert or overwrite; returns the entry that was replaced
    pub fn save(&mut self, feedback: Feedback) -> Option<Feedback> {
        self.rows.insert(feedback.key(), feedback)
    }

    pub fn get(&self, athlete_id: &str, session_name: &str, week: Week) -> Option<&Feedback> {
        self.rows.get(&FeedbackKey {
            athlete_id: athlete_id.to_string(),
            session_name: session_name.to_string(),
            week,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feedback> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn for_athlete<'a, 'b>(
        &'a self,
        athlete_id: &'b str,
    ) -> impl Iterator<Item = &'a Feedback> + 'b
    where
        'a: 'b,
    {
        self.rows.values().filter(move |f| f.athlete_id == athlete_id)
    }

    /// Feedback logged in the last `days` days before `reference`, newest first
    pub fn recent(&self, athlete_id: &str, reference: NaiveDate, days: u32) -> Vec<&Feedback> {
        let limit = reference - Duration::days(days as i64);
        let mut recent: Vec<&Feedback> = self
            .rows
            .values()
            .filter(|f| f.athlete_id == athlete_id && f.logged_at.date() >= limit)
            .collect();
        recent.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        recent
    }
}

/// Off-plan sessions in the order they were reported
#[derive(Debug, Clone, Default)]
pub struct ExtraTable {
    rows: Vec<ExtraSession>,
}

impl ExtraTable {
    pub fn add(&mut self, extra: ExtraSession) -> Result<()> {
        if extra.athlete_id.trim().is_empty() {
            return Err(ValidationError::Empty("athlete name").into());
        }
        if extra.description.trim().is_empty() {
            return Err(ValidationError::Empty("extra session description").into());
        }
        self.rows.push(extra);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtraSession> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extras dated in the last `days` days before `reference`, newest first
    ///
    /// `athlete_id` of `None` lists every athlete.
    pub fn recent(&self, athlete_id: Option<&str>, reference: NaiveDate, days: u32) -> Vec<&ExtraSession> {
        let limit = reference - Duration::days(days as i64);
        let mut recent: Vec<&ExtraSession> = self
            .rows
            .iter()
            .filter(|e| athlete_id.map_or(true, |name| e.athlete_id == name))
            .filter(|e| e.date >= limit && e.date <= reference)
            .collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent
    }
}

/// All tables of one dashboard
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub athletes: AthleteTable,
    pub sessions: SessionTable,
    pub assignments: AssignmentTable,
    pub feedback: FeedbackTable,
    pub extras: ExtraTable,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an existing session to an existing athlete
    pub fn assign(&mut self, athlete_id: &str, session_name: &str, week: Week) -> Result<&Assignment> {
        if !self.athletes.contains(athlete_id) {
            return Err(CoachLoadError::NotFound {
                table: "athletes",
                key: athlete_id.to_string(),
            });
        }
        if !self.sessions.contains(session_name) {
            return Err(CoachLoadError::NotFound {
                table: "sessions",
                key: session_name.to_string(),
            });
        }
        self.assignments
            .push(Assignment::new(athlete_id, session_name, week));
        tracing::debug!(athlete = athlete_id, session = session_name, week = %week, "Session assigned");
        Ok(&self.assignments.rows[self.assignments.rows.len() - 1])
    }

    /// Store feedback, dropping the cycle phase for athletes who do not track it
    pub fn save_feedback(&mut self, mut feedback: Feedback) -> (Option<Feedback>, Vec<DataWarning>) {
        let mut warnings = Vec::new();
        let tracks_cycle = self
            .athletes
            .get(&feedback.athlete_id)
            .is_some_and(Athlete::tracks_cycle);
        if feedback.cycle_phase.is_some() && !tracks_cycle {
            tracing::warn!(athlete = %feedback.athlete_id, "Dropping cycle phase");
            feedback.cycle_phase = None;
            feedback.symptoms = None;
            warnings.push(DataWarning::CycleTrackingIgnored {
                athlete_id: feedback.athlete_id.clone(),
            });
        }
        if !self.sessions.contains(&feedback.session_name) {
            tracing::warn!(
                athlete = %feedback.athlete_id,
                session = %feedback.session_name,
                week = %feedback.week,
                "Feedback refers to a missing session"
            );
            warnings.push(DataWarning::OrphanedFeedback {
                athlete_id: feedback.athlete_id.clone(),
                session_name: feedback.session_name.clone(),
                week: feedback.week,
            });
        }
        (self.feedback.save(feedback), warnings)
    }

    /// Record an off-plan session for a known athlete
    pub fn add_extra(&mut self, extra: ExtraSession) -> Result<()> {
        if !self.athletes.contains(&extra.athlete_id) {
            return Err(CoachLoadError::NotFound {
                table: "athletes",
                key: extra.athlete_id,
            });
        }
        tracing::debug!(athlete = %extra.athlete_id, date = %extra.date, "Extra session recorded");
        self.extras.add(extra)
    }

    /// Every assignment and feedback entry whose session is missing
    pub fn orphans(&self) -> Vec<DataWarning> {
        let assignments = self
            .assignments
            .iter()
            .filter(|a| !self.sessions.contains(&a.session_name))
            .map(|a| DataWarning::OrphanedAssignment {
                athlete_id: a.athlete_id.clone(),
                session_name: a.session_name.clone(),
                week: a.week,
            });
        let feedback = self
            .feedback
            .iter()
            .filter(|f| !self.sessions.contains(&f.session_name))
            .map(|f| DataWarning::OrphanedFeedback {
                athlete_id: f.athlete_id.clone(),
                session_name: f.session_name.clone(),
                week: f.week,
            });
        assignments.chain(feedback).collect()
    }
}
