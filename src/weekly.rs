use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DataWarning;
use crate::models::{Assignment, Week};
use crate::tables::{SessionTable, Tables};
use crate::trend::{TrendComparator, WeeklyTrend};

/// Load and volume of one athlete's assigned sessions in one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    /// Monday of the window
    pub week_start: NaiveDate,
    /// Sunday of the window
    pub week_end: NaiveDate,
    pub total_load: Decimal,
    pub mean_load: Decimal,
    /// Minutes
    pub total_volume: Decimal,
    pub mean_volume: Decimal,
    /// Sessions that resolved and contributed to the sums
    pub session_count: u32,
}

impl WeeklyAggregate {
    pub fn empty(week: Week) -> Self {
        WeeklyAggregate {
            week_start: week.monday(),
            week_end: week.sunday(),
            total_load: Decimal::ZERO,
            mean_load: Decimal::ZERO,
            total_volume: Decimal::ZERO,
            mean_volume: Decimal::ZERO,
            session_count: 0,
        }
    }

    pub fn week(&self) -> Week {
        Week::containing(self.week_start)
    }
}

/// Aggregate plus the warnings raised while computing it
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub aggregate: WeeklyAggregate,
    pub warnings: Vec<DataWarning>,
}

/// Current week against the previous one
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyComparison {
    pub current: WeeklyAggregate,
    pub previous: WeeklyAggregate,
    pub trend: WeeklyTrend,
    pub warnings: Vec<DataWarning>,
}

/// Sum the resolved sessions of `assignments` into one weekly aggregate
///
/// Assignments are taken as given: callers restrict them to one athlete and
/// one window. Unresolved sessions are excluded and reported.
pub fn aggregate_assignments<'a, I>(assignments: I, sessions: &SessionTable, week: Week) -> WeeklyReport
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let mut aggregate = WeeklyAggregate::empty(week);
    let mut warnings = Vec::new();

    for assignment in assignments {
        match sessions.get(&assignment.session_name) {
            Some(session) => {
                aggregate.total_load += session.total_load();
                aggregate.total_volume += session.total_volume();
                aggregate.session_count += 1;
            }
            None => {
                tracing::warn!(
                    athlete = %assignment.athlete_id,
                    session = %assignment.session_name,
                    week = %assignment.week,
                    "Assigned session no longer exists"
                );
                warnings.push(DataWarning::OrphanedAssignment {
                    athlete_id: assignment.athlete_id.clone(),
                    session_name: assignment.session_name.clone(),
                    week: assignment.week,
                });
            }
        }
    }

    if aggregate.session_count > 0 {
        let count = Decimal::from(aggregate.session_count);
        aggregate.mean_load = aggregate.total_load / count;
        aggregate.mean_volume = aggregate.total_volume / count;
    }

    WeeklyReport {
        aggregate,
        warnings,
    }
}

/// Weekly statistics over borrowed tables
pub struct WeeklyAggregator<'a> {
    tables: &'a Tables,
    comparator: TrendComparator,
}

impl<'a> WeeklyAggregator<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        Self::with_comparator(tables, TrendComparator::default())
    }

    pub fn with_comparator(tables: &'a Tables, comparator: TrendComparator) -> Self {
        WeeklyAggregator { tables, comparator }
    }

    /// Aggregate the athlete's sessions assigned in `[monday, monday + 6 days]`
    pub fn aggregate_week(&self, athlete_id: &str, week: Week) -> WeeklyReport {
        let assignments = self.tables.assignments.in_window(athlete_id, week.monday());
        let report = aggregate_assignments(assignments, &self.tables.sessions, week);
        tracing::debug!(
            athlete = athlete_id,
            week = %week,
            sessions = report.aggregate.session_count,
            total_load = %report.aggregate.total_load,
            "Weekly aggregate computed"
        );
        report
    }

    /// Compare `week` with the week before it
    pub fn compare_with_previous(&self, athlete_id: &str, week: Week) -> WeeklyComparison {
        let current = self.aggregate_week(athlete_id, week);
        let previous = self.aggregate_week(athlete_id, week.previous());
        let trend = self.comparator.compare(&current.aggregate, &previous.aggregate);

        let mut warnings = current.warnings;
        warnings.extend(previous.warnings);

        WeeklyComparison {
            current: current.aggregate,
            previous: previous.aggregate,
            trend,
            warnings,
        }
    }

    /// One aggregate per week with assignments, oldest first
    pub fn series(&self, athlete_id: &str) -> (Vec<WeeklyAggregate>, Vec<DataWarning>) {
        let mut warnings = Vec::new();
        let aggregates = self
            .tables
            .assignments
            .weeks_for(athlete_id)
            .into_iter()
            .map(|week| {
                let report = self.aggregate_week(athlete_id, week);
                warnings.extend(report.warnings);
                report.aggregate
            })
            .collect();
        (aggregates, warnings)
    }
}
