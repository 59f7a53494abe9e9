//! Terminal rendering of reports
//!
//! Plain-text helpers for durations and paces, and `tabled` tables for the
//! CLI. Trend arrows are green while the change stays within the notable
//! threshold and red beyond it.

use colored::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tabled::{settings::Style, Table, Tabled};

use crate::error::{DataWarning, ErrorSeverity};
use crate::internal_load::WeeklyInternalLoad;
use crate::models::{Athlete, RaceDistance, Session, Zone};
use crate::trend::Trend;
use crate::weekly::WeeklyComparison;
use crate::zones::ZoneTimeBreakdown;

/// `1h05min`, `45min`, or `—` for zero
pub fn format_duration_min(minutes: Decimal) -> String {
    if minutes <= Decimal::ZERO {
        return "—".to_string();
    }
    let total = minutes.trunc().to_u64().unwrap_or(0);
    let (hours, mins) = (total / 60, total % 60);
    if hours > 0 {
        format!("{}h{:02}min", hours, mins)
    } else {
        format!("{}min", mins)
    }
}

/// `04:30 min/km` from a pace in decimal minutes
pub fn format_pace(pace_min_per_km: Decimal) -> String {
    let minutes = pace_min_per_km.trunc();
    let mut seconds = ((pace_min_per_km - minutes) * dec!(60)).round().to_u32().unwrap_or(0);
    let mut minutes = minutes.to_u32().unwrap_or(0);
    if seconds == 60 {
        minutes += 1;
        seconds = 0;
    }
    format!("{:02}:{:02} min/km", minutes, seconds)
}

pub fn colored_trend(trend: &Trend) -> String {
    let rendered = trend.render();
    if trend.change.is_undefined() {
        rendered.dimmed().to_string()
    } else if trend.notable {
        rendered.red().to_string()
    } else {
        rendered.green().to_string()
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "This week")]
    current: String,
    #[tabled(rename = "Last week")]
    previous: String,
    #[tabled(rename = "Change")]
    change: String,
}

/// Weekly load and volume against the previous week
pub fn weekly_comparison_table(comparison: &WeeklyComparison) -> String {
    let trend = &comparison.trend;
    let load = |t: &Trend| (t.current.round().to_string(), t.previous.round().to_string());
    let volume = |t: &Trend| (format_duration_min(t.current), format_duration_min(t.previous));

    let rows = [
        ("Total load", load(&trend.total_load), &trend.total_load),
        ("Mean load", load(&trend.mean_load), &trend.mean_load),
        ("Total volume", volume(&trend.total_volume), &trend.total_volume),
        ("Mean volume", volume(&trend.mean_volume), &trend.mean_volume),
    ]
    .into_iter()
    .map(|(metric, (current, previous), t)| MetricRow {
        metric,
        current,
        previous,
        change: colored_trend(t),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// One row per week, one column per zone
pub fn zone_breakdown_table(breakdown: &ZoneTimeBreakdown) -> String {
    let mut builder = tabled::builder::Builder::default();
    let mut header = vec!["Week".to_string()];
    header.extend(Zone::all().map(|z| z.to_string()));
    header.push("Total".to_string());
    builder.push_record(header);

    for week in &breakdown.weeks {
        let mut row = vec![week.week.label()];
        row.extend(week.minutes.iter().map(|m| format_duration_min(*m)));
        row.push(format_duration_min(week.total()));
        builder.push_record(row);
    }

    builder.build().with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Session")]
    name: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Load")]
    load: String,
    #[tabled(rename = "Blocks")]
    blocks: String,
}

pub fn sessions_table<'a, I>(sessions: I) -> String
where
    I: IntoIterator<Item = &'a Session>,
{
    let rows = sessions.into_iter().map(|s| SessionRow {
        name: s.name().to_string(),
        volume: format_duration_min(s.total_volume()),
        load: s.total_load().normalize().to_string(),
        blocks: s.format_blocks(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct InternalRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Sessions")]
    sessions: u32,
    #[tabled(rename = "External load")]
    external: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Internal load")]
    internal: String,
    #[tabled(rename = "Internal / session")]
    internal_mean: String,
}

pub fn internal_load_table(series: &[WeeklyInternalLoad]) -> String {
    let rows = series.iter().map(|w| InternalRow {
        week: w.week.label(),
        sessions: w.session_count,
        external: w.external_load_total.round().to_string(),
        volume: format_duration_min(w.volume_total),
        internal: w.internal_load_total.round().to_string(),
        internal_mean: w.internal_load_mean.round_dp(1).to_string(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Profile lines with BMI and record paces
pub fn athlete_summary(athlete: &Athlete) -> Vec<String> {
    let mut lines = vec![athlete.name.bold().to_string()];
    if let Some(bmi) = athlete.bmi() {
        lines.push(format!("  BMI: {}", bmi));
    }
    for distance in RaceDistance::all() {
        if let (Some(record), Some(pace)) = (athlete.record(distance), athlete.pace(distance)) {
            lines.push(format!(
                "  {}: {} ({})",
                distance.label(),
                format_duration_min(record),
                format_pace(pace)
            ));
        }
    }
    lines
}

/// One line per warning, colored by severity
pub fn warning_lines(warnings: &[DataWarning]) -> Vec<String> {
    warnings
        .iter()
        .map(|w| match w.severity() {
            ErrorSeverity::Error => format!("✗ {}", w).red().to_string(),
            ErrorSeverity::Warning => format!("⚠ {}", w).yellow().to_string(),
            ErrorSeverity::Info => format!("ℹ {}", w).dimmed().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_min(dec!(65)), "1h05min");
        assert_eq!(format_duration_min(dec!(45)), "45min");
        assert_eq!(format_duration_min(dec!(120.7)), "2h00min");
        assert_eq!(format_duration_min(Decimal::ZERO), "—");
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(dec!(4.5)), "04:30 min/km");
        assert_eq!(format_pace(dec!(5.02)), "05:01 min/km");
        assert_eq!(format_pace(dec!(3.999)), "04:00 min/km");
    }

    #[test]
    fn test_sessions_table_lists_names() {
        use crate::models::{Block, BlockType};
        let session = Session::new(
            "Fartlek",
            vec![Block::new(BlockType::Intervals, dec!(3), 4, Zone::new(4).unwrap()).unwrap()],
        );
        let table = sessions_table([&session]);
        assert!(table.contains("Fartlek"));
        assert!(table.contains("12min"));
    }
}
