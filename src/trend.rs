//! Week-over-week trend comparison
//!
//! Percent change is `(current - previous) / previous × 100`. A zero previous
//! value yields [`PercentChange::Undefined`], never zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::weekly::WeeklyAggregate;

/// Default magnitude above which a change is flagged, in percent
pub const DEFAULT_NOTABLE_THRESHOLD: Decimal = dec!(12);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "percent")]
pub enum PercentChange {
    /// Rounded to two decimals
    Defined(Decimal),
    Undefined,
}

impl PercentChange {
    pub fn between(current: Decimal, previous: Decimal) -> Self {
        if previous.is_zero() {
            return PercentChange::Undefined;
        }
        PercentChange::Defined(((current - previous) / previous * dec!(100)).round_dp(2))
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            PercentChange::Defined(pct) => Some(*pct),
            PercentChange::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, PercentChange::Undefined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
        }
    }
}

/// Change of one metric between two weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub current: Decimal,
    pub previous: Decimal,
    pub change: PercentChange,
    /// `None` when the change is undefined; zero counts as up
    pub direction: Option<Direction>,
    pub notable: bool,
}

impl Trend {
    /// `▲ 20.0%`, or `n/a` when undefined
    pub fn render(&self) -> String {
        match (self.change, self.direction) {
            (PercentChange::Defined(pct), Some(direction)) => {
                format!("{} {:.1}%", direction.arrow(), pct.abs())
            }
            _ => "n/a".to_string(),
        }
    }
}

/// Trends of the four weekly metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTrend {
    pub total_load: Trend,
    pub mean_load: Trend,
    pub total_volume: Trend,
    pub mean_volume: Trend,
}

impl WeeklyTrend {
    pub fn any_notable(&self) -> bool {
        [self.total_load, self.mean_load, self.total_volume, self.mean_volume]
            .iter()
            .any(|t| t.notable)
    }
}

/// Compares weekly aggregates against a notable-change threshold
#[derive(Debug, Clone, Copy)]
pub struct TrendComparator {
    notable_threshold: Decimal,
}

impl TrendComparator {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_NOTABLE_THRESHOLD)
    }

    pub fn with_threshold(notable_threshold: Decimal) -> Self {
        TrendComparator {
            notable_threshold: notable_threshold.abs(),
        }
    }

    pub fn notable_threshold(&self) -> Decimal {
        self.notable_threshold
    }

    pub fn evaluate(&self, current: Decimal, previous: Decimal) -> Trend {
        let change = PercentChange::between(current, previous);
        let (direction, notable) = match change {
            PercentChange::Defined(pct) => {
                let direction = if pct >= Decimal::ZERO {
                    Direction::Up
                } else {
                    Direction::Down
                };
                (Some(direction), pct.abs() > self.notable_threshold)
            }
            PercentChange::Undefined => (None, false),
        };
        Trend {
            current,
            previous,
            change,
            direction,
            notable,
        }
    }

    pub fn compare(&self, current: &WeeklyAggregate, previous: &WeeklyAggregate) -> WeeklyTrend {
        WeeklyTrend {
            total_load: self.evaluate(current.total_load, previous.total_load),
            mean_load: self.evaluate(current.mean_load, previous.mean_load),
            total_volume: self.evaluate(current.total_volume, previous.total_volume),
            mean_volume: self.evaluate(current.mean_volume, previous.mean_volume),
        }
    }
}

impl Default for TrendComparator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change_values() {
        assert_eq!(
            PercentChange::between(dec!(120), dec!(100)),
            PercentChange::Defined(dec!(20))
        );
        assert_eq!(
            PercentChange::between(dec!(0), dec!(100)),
            PercentChange::Defined(dec!(-100))
        );
        assert!(PercentChange::between(dec!(50), dec!(0)).is_undefined());
        assert!(PercentChange::between(dec!(0), dec!(0)).is_undefined());
        assert_eq!(
            PercentChange::between(dec!(100), dec!(300)).value(),
            Some(dec!(-66.67))
        );
    }

    #[test]
    fn test_trend_direction_and_notable() {
        let comparator = TrendComparator::new();

        let up = comparator.evaluate(dec!(112), dec!(100));
        assert_eq!(up.direction, Some(Direction::Up));
        assert!(!up.notable);

        let big_up = comparator.evaluate(dec!(113), dec!(100));
        assert!(big_up.notable);

        let down = comparator.evaluate(dec!(80), dec!(100));
        assert_eq!(down.direction, Some(Direction::Down));
        assert!(down.notable);

        let flat = comparator.evaluate(dec!(100), dec!(100));
        assert_eq!(flat.direction, Some(Direction::Up));
        assert!(!flat.notable);

        let undefined = comparator.evaluate(dec!(100), dec!(0));
        assert_eq!(undefined.direction, None);
        assert!(!undefined.notable);
    }

    #[test]
    fn test_custom_threshold() {
        let comparator = TrendComparator::with_threshold(dec!(25));
        assert!(!comparator.evaluate(dec!(120), dec!(100)).notable);
        assert!(comparator.evaluate(dec!(130), dec!(100)).notable);
    }

    #[test]
    fn test_trend_render() {
        let comparator = TrendComparator::new();
        assert_eq!(comparator.evaluate(dec!(120), dec!(100)).render(), "▲ 20.0%");
        assert_eq!(comparator.evaluate(dec!(90), dec!(120)).render(), "▼ 25.0%");
        assert_eq!(comparator.evaluate(dec!(90), dec!(0)).render(), "n/a");
    }

    #[test]
    fn test_percent_change_serialization() {
        let json = serde_json::to_string(&PercentChange::Undefined).unwrap();
        assert_eq!(json, r#"{"status":"undefined"}"#);
    }
}
