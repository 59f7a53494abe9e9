use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DataWarning;
use crate::models::{Week, Zone};
use crate::tables::Tables;

/// Default length of the trailing window, in weeks
pub const DEFAULT_WINDOW_WEEKS: u32 = 6;
/// Ten years of weeks
pub const MAX_WINDOW_WEEKS: u32 = 520;

/// Minutes spent in each zone during one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekZoneTime {
    pub week: Week,
    /// Zone 1 first
    pub minutes: [Decimal; Zone::COUNT],
}

impl WeekZoneTime {
    pub fn new(week: Week) -> Self {
        WeekZoneTime {
            week,
            minutes: [Decimal::ZERO; Zone::COUNT],
        }
    }

    pub fn minutes_in(&self, zone: Zone) -> Decimal {
        self.minutes[zone.index()]
    }

    pub fn total(&self) -> Decimal {
        self.minutes.iter().copied().sum()
    }
}

/// Per-zone time over a trailing window of weeks, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTimeBreakdown {
    pub weeks: Vec<WeekZoneTime>,
    pub warnings: Vec<DataWarning>,
}

impl ZoneTimeBreakdown {
    /// Minutes per zone summed across the window
    pub fn zone_totals(&self) -> [Decimal; Zone::COUNT] {
        let mut totals = [Decimal::ZERO; Zone::COUNT];
        for week in &self.weeks {
            for (total, minutes) in totals.iter_mut().zip(week.minutes.iter()) {
                *total += *minutes;
            }
        }
        totals
    }

    pub fn total(&self) -> Decimal {
        self.weeks.iter().map(WeekZoneTime::total).sum()
    }
}

/// Decomposes assigned sessions into time per intensity zone
#[derive(Debug, Clone, Copy)]
pub struct ZoneTimeAnalyzer {
    window_weeks: u32,
}

impl ZoneTimeAnalyzer {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW_WEEKS)
    }

    /// The window is kept within `1..=MAX_WINDOW_WEEKS`
    pub fn with_window(window_weeks: u32) -> Self {
        let clamped = window_weeks.clamp(1, MAX_WINDOW_WEEKS);
        if clamped != window_weeks {
            tracing::warn!(requested = window_weeks, used = clamped, "Zone window out of range");
        }
        ZoneTimeAnalyzer {
            window_weeks: clamped,
        }
    }

    pub fn window_weeks(&self) -> u32 {
        self.window_weeks
    }

    /// Weeks of the window ending at `reference`, oldest first
    pub fn window(&self, reference: Week) -> Vec<Week> {
        (0..self.window_weeks as i64)
            .rev()
            .filter_map(|back| reference.checked_offset(-back))
            .collect()
    }

    /// Accumulate duration × repetitions per zone for each week of the window
    pub fn breakdown(&self, tables: &Tables, athlete_id: &str, reference: Week) -> ZoneTimeBreakdown {
        let mut warnings = Vec::new();
        let weeks = self
            .window(reference)
            .into_iter()
            .map(|week| {
                let mut zone_time = WeekZoneTime::new(week);
                for assignment in tables.assignments.in_window(athlete_id, week.monday()) {
                    let Some(session) = tables.sessions.get(&assignment.session_name) else {
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
                        continue;
                    };
                    for block in session.blocks() {
                        zone_time.minutes[block.zone.index()] += block.volume();
                    }
                }
                zone_time
            })
            .collect();

        tracing::debug!(
            athlete = athlete_id,
            reference = %reference,
            window = self.window_weeks,
            orphans = warnings.len(),
            "Zone-time breakdown computed"
        );

        ZoneTimeBreakdown { weeks, warnings }
    }
}

impl Default for ZoneTimeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
