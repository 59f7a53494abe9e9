//! External vs internal load from athlete feedback
//!
//! External load is the planned session load. Internal load is the session
//! volume multiplied by the athlete's RPE. Only completed feedback counts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DataWarning;
use crate::models::Week;
use crate::tables::Tables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyInternalLoad {
    pub week: Week,
    pub session_count: u32,
    pub external_load_total: Decimal,
    pub external_load_mean: Decimal,
    pub volume_total: Decimal,
    pub internal_load_total: Decimal,
    pub internal_load_mean: Decimal,
}

impl WeeklyInternalLoad {
    fn new(week: Week) -> Self {
        WeeklyInternalLoad {
            week,
            session_count: 0,
            external_load_total: Decimal::ZERO,
            external_load_mean: Decimal::ZERO,
            volume_total: Decimal::ZERO,
            internal_load_total: Decimal::ZERO,
            internal_load_mean: Decimal::ZERO,
        }
    }
}

/// Weekly external/internal load of one athlete from the week containing `since`
pub fn internal_load_series(
    tables: &Tables,
    athlete_id: &str,
    since: NaiveDate,
) -> (Vec<WeeklyInternalLoad>, Vec<DataWarning>) {
    let first_week = Week::containing(since);
    let mut by_week: BTreeMap<Week, WeeklyInternalLoad> = BTreeMap::new();
    let mut warnings = Vec::new();

    for feedback in tables.feedback.for_athlete(athlete_id) {
        if feedback.week < first_week || !feedback.completed {
            continue;
        }
        let Some(session) = tables.sessions.get(&feedback.session_name) else {
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
            continue;
        };

        let entry = by_week
            .entry(feedback.week)
            .or_insert_with(|| WeeklyInternalLoad::new(feedback.week));
        entry.session_count += 1;
        entry.external_load_total += session.total_load();
        entry.volume_total += session.total_volume();
        entry.internal_load_total +=
            session.total_volume() * Decimal::from(feedback.perceived_effort.value());
    }

    let series: Vec<WeeklyInternalLoad> = by_week
        .into_values()
        .map(|mut week| {
            let count = Decimal::from(week.session_count);
            week.external_load_mean = week.external_load_total / count;
            week.internal_load_mean = week.internal_load_total / count;
            week
        })
        .collect();

    tracing::debug!(athlete = athlete_id, weeks = series.len(), "Internal load series computed");
    (series, warnings)
}
