//! Block and session load model
//!
//! Volume is minutes of work (duration × repetitions). Load is volume weighted
//! by a per-zone coefficient; the default coefficient of zone N is N.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{Block, Zone};

/// Per-zone load coefficients, zone 1 first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Decimal>", into = "Vec<Decimal>")]
pub struct ZoneWeights([Decimal; Zone::COUNT]);

impl ZoneWeights {
    pub fn new(coefficients: [Decimal; Zone::COUNT]) -> Result<Self, ValidationError> {
        if coefficients.iter().any(|c| *c < Decimal::ZERO) {
            return Err(ValidationError::ZoneWeights);
        }
        Ok(ZoneWeights(coefficients))
    }

    pub fn weight(&self, zone: Zone) -> Decimal {
        self.0[zone.index()]
    }

    pub fn coefficients(&self) -> &[Decimal; Zone::COUNT] {
        &self.0
    }
}

impl Default for ZoneWeights {
    /// Zone number used as its own weight
    fn default() -> Self {
        let mut coefficients = [Decimal::ZERO; Zone::COUNT];
        for zone in Zone::all() {
            coefficients[zone.index()] = Decimal::from(zone.number());
        }
        ZoneWeights(coefficients)
    }
}

impl TryFrom<Vec<Decimal>> for ZoneWeights {
    type Error = ValidationError;

    fn try_from(values: Vec<Decimal>) -> Result<Self, Self::Error> {
        let coefficients: [Decimal; Zone::COUNT] =
            values.try_into().map_err(|_| ValidationError::ZoneWeights)?;
        ZoneWeights::new(coefficients)
    }
}

impl From<ZoneWeights> for Vec<Decimal> {
    fn from(weights: ZoneWeights) -> Self {
        weights.0.to_vec()
    }
}

/// Cached sums over a session's blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Minutes
    pub volume: Decimal,
    pub load: Decimal,
}

impl SessionTotals {
    pub fn from_blocks(blocks: &[Block], weights: &ZoneWeights) -> Self {
        blocks.iter().fold(SessionTotals::default(), |acc, block| SessionTotals {
            volume: acc.volume + block.volume(),
            load: acc.load + block.load(weights),
        })
    }
}
