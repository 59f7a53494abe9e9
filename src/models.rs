use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DataWarning, ValidationError};
use crate::load::{SessionTotals, ZoneWeights};

/// Kind of workout segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    WarmUp,
    Intervals,
    Recovery,
    /// Continuous effort at a steady pace
    Steady,
    CoolDown,
    Other,
}

impl BlockType {
    /// Parse a block type label; unknown labels map to `Other`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "warmup" | "warm-up" | "warm up" | "échauffement" | "echauffement" => Self::WarmUp,
            "intervals" | "interval" | "intervalles" => Self::Intervals,
            "recovery" | "récupération" | "recuperation" => Self::Recovery,
            "steady" | "continuous" | "allure continue" => Self::Steady,
            "cooldown" | "cool-down" | "cool down" | "retour au calme" => Self::CoolDown,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WarmUp => "Warm-up",
            Self::Intervals => "Intervals",
            Self::Recovery => "Recovery",
            Self::Steady => "Steady",
            Self::CoolDown => "Cool-down",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Intensity band, 1 (low) to 7 (max)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Zone(u8);

impl Zone {
    pub const COUNT: usize = 7;

    pub fn new(number: i64) -> Result<Self, ValidationError> {
        if (1..=Self::COUNT as i64).contains(&number) {
            Ok(Zone(number as u8))
        } else {
            Err(ValidationError::ZoneOutOfRange(number))
        }
    }

    /// Zone from a free-text label such as `"🔵Zone 2"`: the last digit wins
    pub fn from_label(label: &str) -> Result<Self, ValidationError> {
        let digit = label
            .chars()
            .rev()
            .find_map(|c| c.to_digit(10))
            .ok_or_else(|| ValidationError::ZoneLabel(label.to_string()))?;
        Self::new(digit as i64)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position for per-zone arrays
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = Zone> {
        (1..=Self::COUNT as u8).map(Zone)
    }
}

impl TryFrom<u8> for Zone {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Zone::new(value as i64)
    }
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> Self {
        zone.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone {}", self.0)
    }
}

/// Atomic workout segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    /// Minutes per repetition
    pub duration_min: Decimal,
    pub repetitions: u32,
    pub zone: Zone,
    pub description: Option<String>,
}

impl Block {
    pub fn new(
        block_type: BlockType,
        duration_min: Decimal,
        repetitions: u32,
        zone: Zone,
    ) -> Result<Self, ValidationError> {
        if duration_min < Decimal::ZERO {
            return Err(ValidationError::NegativeDuration(duration_min));
        }
        if repetitions < 1 {
            return Err(ValidationError::InvalidRepetitions(repetitions as i64));
        }
        Ok(Block {
            block_type,
            duration_min,
            repetitions,
            zone,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Duration × repetitions, in minutes
    pub fn volume(&self) -> Decimal {
        self.duration_min * Decimal::from(self.repetitions)
    }

    /// Volume weighted by the zone coefficient
    pub fn load(&self, weights: &ZoneWeights) -> Decimal {
        self.volume() * weights.weight(self.zone)
    }

    /// One-line rendering, e.g. `4× 5min Zone 4 [Intervals] - hills`
    pub fn format_line(&self) -> String {
        let mut line = format!(
            "{}× {}min {} [{}]",
            self.repetitions,
            self.duration_min.normalize(),
            self.zone,
            self.block_type
        );
        if let Some(description) = &self.description {
            line.push_str(" - ");
            line.push_str(description);
        }
        line
    }
}

/// Block as stored in the sessions table, before validation
///
/// Accepts the dashboard's original French keys as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(rename = "type", alias = "Type", default)]
    pub block_type: String,
    #[serde(rename = "duration", alias = "Durée", default)]
    pub duration_min: Option<Decimal>,
    #[serde(alias = "Répétitions", default)]
    pub repetitions: Option<i64>,
    #[serde(rename = "zone_num", alias = "Zone_num", default)]
    pub zone_number: Option<i64>,
    #[serde(rename = "zone", alias = "Zone", default)]
    pub zone_label: Option<String>,
    #[serde(alias = "Description", default)]
    pub description: Option<String>,
}

impl BlockRecord {
    /// Validate into a [`Block`]; the numeric zone field wins over the label
    pub fn to_block(&self) -> Result<Block, ValidationError> {
        let zone = match (self.zone_number, self.zone_label.as_deref()) {
            (Some(number), _) => Zone::new(number)?,
            (None, Some(label)) => Zone::from_label(label)?,
            (None, None) => return Err(ValidationError::ZoneLabel(String::new())),
        };
        let repetitions = self.repetitions.unwrap_or(1);
        if repetitions < 1 || repetitions > u32::MAX as i64 {
            return Err(ValidationError::InvalidRepetitions(repetitions));
        }
        let block = Block::new(
            BlockType::parse(&self.block_type),
            self.duration_min.unwrap_or(Decimal::ZERO),
            repetitions as u32,
            zone,
        )?;
        Ok(match &self.description {
            Some(description) => block.with_description(description.clone()),
            None => block,
        })
    }
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        BlockRecord {
            block_type: block.block_type.label().to_string(),
            duration_min: Some(block.duration_min),
            repetitions: Some(block.repetitions as i64),
            zone_number: Some(block.zone.number() as i64),
            zone_label: Some(block.zone.to_string()),
            description: block.description.clone(),
        }
    }
}

/// Named ordered collection of blocks with cached totals
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    blocks: Vec<Block>,
    weights: ZoneWeights,
    totals: SessionTotals,
}

impl Session {
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self::with_weights(name, blocks, ZoneWeights::default())
    }

    pub fn with_weights(name: impl Into<String>, blocks: Vec<Block>, weights: ZoneWeights) -> Self {
        let totals = SessionTotals::from_blocks(&blocks, &weights);
        Session {
            name: name.into(),
            blocks,
            weights,
            totals,
        }
    }

    /// Build from stored block records, dropping the ones that fail validation
    pub fn from_records(
        name: impl Into<String>,
        records: &[BlockRecord],
        weights: ZoneWeights,
    ) -> (Self, Vec<DataWarning>) {
        let name = name.into();
        let mut warnings = Vec::new();
        let blocks = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match record.to_block() {
                Ok(block) => Some(block),
                Err(e) => {
                    tracing::warn!(session = %name, index, error = %e, "Skipping malformed block");
                    warnings.push(DataWarning::MalformedBlock {
                        session_name: name.clone(),
                        index,
                        reason: e.to_string(),
                    });
                    None
                }
            })
            .collect();
        (Self::with_weights(name, blocks, weights), warnings)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn weights(&self) -> &ZoneWeights {
        &self.weights
    }

    pub fn totals(&self) -> SessionTotals {
        self.totals
    }

    pub fn total_volume(&self) -> Decimal {
        self.totals.volume
    }

    pub fn total_load(&self) -> Decimal {
        self.totals.load
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
        self.recompute();
    }

    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index >= self.blocks.len() {
            return None;
        }
        let removed = self.blocks.remove(index);
        self.recompute();
        Some(removed)
    }

    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.recompute();
    }

    /// Switch to another zone coefficient table
    pub fn reweigh(&mut self, weights: ZoneWeights) {
        self.weights = weights;
        self.recompute();
    }

    /// Case-insensitive match on the name or any block description
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.blocks.iter().any(|b| {
                b.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
    }

    pub fn format_blocks(&self) -> String {
        self.blocks
            .iter()
            .map(Block::format_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn recompute(&mut self) {
        self.totals = SessionTotals::from_blocks(&self.blocks, &self.weights);
    }
}

/// ISO week, identified by its Monday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Week(NaiveDate);

impl Week {
    pub fn from_monday(date: NaiveDate) -> Result<Self, ValidationError> {
        if date.weekday() == Weekday::Mon {
            Ok(Week(date))
        } else {
            Err(ValidationError::NotMonday(date))
        }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ValidationError::WeekLabel(format!("{}-{}-{}", year, month, day)))?;
        Self::from_monday(date)
    }

    /// Week `week` of ISO year `year`
    pub fn from_iso(year: i32, week: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(Week)
            .ok_or_else(|| ValidationError::WeekLabel(format!("{}-W{:02}", year, week)))
    }

    /// The week a date falls in
    pub fn containing(date: NaiveDate) -> Self {
        Week(date - Duration::days(date.weekday().num_days_from_monday() as i64))
    }

    /// Parse `YYYY-MM-DD`, `Sww - dd/mm/yyyy` or `Sww - dd/mm` (using `default_year`)
    pub fn parse(label: &str, default_year: i32) -> Result<Self, ValidationError> {
        let trimmed = label.trim();

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Self::from_monday(date);
        }
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
            return Self::from_monday(datetime.date());
        }

        let invalid = || ValidationError::WeekLabel(label.to_string());
        let rest = trimmed
            .strip_prefix('S')
            .or_else(|| trimmed.strip_prefix('s'))
            .ok_or_else(invalid)?;
        let (week_part, date_part) = rest.split_once('-').ok_or_else(invalid)?;
        let stated: u32 = week_part.trim().parse().map_err(|_| invalid())?;

        let fields: Vec<&str> = date_part.trim().split('/').collect();
        let (day, month, year) = match fields.as_slice() {
            [d, m] => (*d, *m, default_year),
            [d, m, y] => (*d, *m, y.trim().parse().map_err(|_| invalid())?),
            _ => return Err(invalid()),
        };
        let day: u32 = day.trim().parse().map_err(|_| invalid())?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;
        let monday = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

        let week = Self::from_monday(monday)?;
        if week.iso_week() != stated {
            return Err(ValidationError::WeekNumberMismatch {
                label: label.to_string(),
                stated,
                actual: week.iso_week(),
                monday,
            });
        }
        Ok(week)
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    pub fn sunday(&self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    pub fn iso_week(&self) -> u32 {
        self.0.iso_week().week()
    }

    pub fn iso_year(&self) -> i32 {
        self.0.iso_week().year()
    }

    /// Shift by a signed number of weeks
    ///
    /// Panics outside the representable date range; see [`Week::checked_offset`].
    pub fn offset(&self, weeks: i64) -> Self {
        Week(self.0 + Duration::days(7 * weeks))
    }

    pub fn checked_offset(&self, weeks: i64) -> Option<Self> {
        let days = weeks.checked_mul(7)?;
        Duration::try_days(days)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Week)
    }

    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.monday() && date <= self.sunday()
    }

    /// `S10 - 04/03`
    pub fn label(&self) -> String {
        format!("S{:02} - {}", self.iso_week(), self.0.format("%d/%m"))
    }

    /// `S10 04/03 - 10/03`
    pub fn range_label(&self) -> String {
        format!(
            "S{:02} {} - {}",
            self.iso_week(),
            self.0.format("%d/%m"),
            self.sunday().format("%d/%m")
        )
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Week {
    type Err = ValidationError;

    /// Labels without a year are rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.matches('/').count() == 1 {
            return Err(ValidationError::WeekLabel(s.to_string()));
        }
        Week::parse(trimmed, 0)
    }
}

impl TryFrom<String> for Week {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Week> for String {
    fn from(week: Week) -> Self {
        week.monday().format("%Y-%m-%d").to_string()
    }
}

/// A session planned for one athlete in one week
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub athlete_id: String,
    pub session_name: String,
    pub week: Week,
}

impl Assignment {
    pub fn new(athlete_id: impl Into<String>, session_name: impl Into<String>, week: Week) -> Self {
        Assignment {
            athlete_id: athlete_id.into(),
            session_name: session_name.into(),
            week,
        }
    }
}

/// Rate of perceived exertion, 1 to 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rpe(u8);

impl Rpe {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (1..=10).contains(&value) {
            Ok(Rpe(value as u8))
        } else {
            Err(ValidationError::EffortOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rpe {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rpe::new(value as i64)
    }
}

impl From<Rpe> for u8 {
    fn from(rpe: Rpe) -> Self {
        rpe.0
    }
}

/// Menstrual cycle phase reported with feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    #[serde(alias = "Règles")]
    Menstruation,
    #[serde(alias = "Post-règles")]
    PostMenstruation,
    Ovulation,
    #[serde(alias = "Prémenstruel")]
    Premenstrual,
}

impl CyclePhase {
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Menstruation => "Menstruation",
            CyclePhase::PostMenstruation => "Post-menstruation",
            CyclePhase::Ovulation => "Ovulation",
            CyclePhase::Premenstrual => "Premenstrual",
        }
    }
}

impl FromStr for CyclePhase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "menstruation" | "règles" | "regles" => Ok(CyclePhase::Menstruation),
            "post-menstruation" | "postmenstruation" | "post-règles" | "post-regles" => {
                Ok(CyclePhase::PostMenstruation)
            }
            "ovulation" => Ok(CyclePhase::Ovulation),
            "premenstrual" | "prémenstruel" | "premenstruel" => Ok(CyclePhase::Premenstrual),
            _ => Err(ValidationError::CyclePhase(s.to_string())),
        }
    }
}

/// Unique key of a feedback entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedbackKey {
    pub athlete_id: String,
    pub session_name: String,
    pub week: Week,
}

/// Athlete's report on an assigned session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub athlete_id: String,
    pub session_name: String,
    pub week: Week,
    pub completed: bool,
    pub perceived_effort: Rpe,
    pub comment: String,
    pub cycle_phase: Option<CyclePhase>,
    /// Carbohydrate intake, g/h
    pub carbs_g_per_h: Option<u16>,
    pub symptoms: Option<String>,
    pub logged_at: NaiveDateTime,
}

impl Feedback {
    pub fn new(
        athlete_id: impl Into<String>,
        session_name: impl Into<String>,
        week: Week,
        completed: bool,
        perceived_effort: Rpe,
        logged_at: NaiveDateTime,
    ) -> Self {
        Feedback {
            athlete_id: athlete_id.into(),
            session_name: session_name.into(),
            week,
            completed,
            perceived_effort,
            comment: String::new(),
            cycle_phase: None,
            carbs_g_per_h: None,
            symptoms: None,
            logged_at,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_cycle(mut self, phase: CyclePhase, symptoms: Option<String>) -> Self {
        self.cycle_phase = Some(phase);
        self.symptoms = symptoms.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_carbs(mut self, grams_per_hour: u16) -> Result<Self, ValidationError> {
        if grams_per_hour > 200 {
            return Err(ValidationError::CarbsOutOfRange(grams_per_hour));
        }
        self.carbs_g_per_h = Some(grams_per_hour);
        Ok(self)
    }

    pub fn key(&self) -> FeedbackKey {
        FeedbackKey {
            athlete_id: self.athlete_id.clone(),
            session_name: self.session_name.clone(),
            week: self.week,
        }
    }
}

/// Off-plan session reported by an athlete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSession {
    #[serde(rename = "athlete", alias = "Athlete")]
    pub athlete_id: String,
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    /// Free text: content, duration, how it felt
    #[serde(alias = "Description")]
    pub description: String,
}

impl ExtraSession {
    pub fn new(athlete_id: impl Into<String>, date: NaiveDate, description: impl Into<String>) -> Self {
        ExtraSession {
            athlete_id: athlete_id.into(),
            date,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(alias = "Homme")]
    Male,
    #[serde(alias = "Femme")]
    Female,
}

/// Race distances with a personal record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceDistance {
    FiveK,
    TenK,
    HalfMarathon,
    Marathon,
}

impl RaceDistance {
    pub fn km(&self) -> Decimal {
        match self {
            RaceDistance::FiveK => dec!(5),
            RaceDistance::TenK => dec!(10),
            RaceDistance::HalfMarathon => dec!(21.097),
            RaceDistance::Marathon => dec!(42.195),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RaceDistance::FiveK => "5 km",
            RaceDistance::TenK => "10 km",
            RaceDistance::HalfMarathon => "Half marathon",
            RaceDistance::Marathon => "Marathon",
        }
    }

    pub fn all() -> [RaceDistance; 4] {
        [
            RaceDistance::FiveK,
            RaceDistance::TenK,
            RaceDistance::HalfMarathon,
            RaceDistance::Marathon,
        ]
    }
}

/// Athlete profile as held in the athletes table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    #[serde(alias = "Nom")]
    pub name: String,
    #[serde(alias = "Sexe")]
    pub sex: Sex,
    #[serde(
        alias = "Amenorrhee",
        alias = "Aménorrhée",
        default,
        deserialize_with = "deserialize_flag"
    )]
    pub amenorrhea: bool,
    #[serde(alias = "Date de naissance", default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(alias = "Taille (cm)", default, deserialize_with = "deserialize_whole_number")]
    pub height_cm: Option<u16>,
    #[serde(alias = "Poids (kg)", default)]
    pub weight_kg: Option<Decimal>,
    #[serde(alias = "Sports", default)]
    pub sports: Option<String>,
    #[serde(alias = "Objectif", default)]
    pub objective: Option<String>,
    /// Personal records, in minutes
    #[serde(alias = "Record 5km", default)]
    pub record_5k_min: Option<Decimal>,
    #[serde(alias = "Record 10km", default)]
    pub record_10k_min: Option<Decimal>,
    #[serde(alias = "Record Semi", default)]
    pub record_half_min: Option<Decimal>,
    #[serde(alias = "Record Marathon", default)]
    pub record_marathon_min: Option<Decimal>,
}

/// `true`/`false`, `oui`/`non`, `yes`/`no`, `1`/`0`, any case
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "oui" | "yes" | "1" => Some(true),
        "false" | "non" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// An empty cell reads as `false`
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(false),
        Some(raw) if raw.trim().is_empty() => Ok(false),
        Some(raw) => parse_flag(&raw).ok_or_else(|| de::Error::custom(ValidationError::Flag(raw))),
    }
}

/// Accepts `168` as well as `168.0`
fn deserialize_whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(raw)
        .ok()
        .filter(|value| value.fract().is_zero())
        .and_then(|value| value.to_u16())
        .map(Some)
        .ok_or_else(|| de::Error::custom(ValidationError::Number(raw.to_string())))
}

impl Athlete {
    pub fn new(name: impl Into<String>, sex: Sex) -> Self {
        Athlete {
            name: name.into(),
            sex,
            amenorrhea: false,
            date_of_birth: None,
            height_cm: None,
            weight_kg: None,
            sports: None,
            objective: None,
            record_5k_min: None,
            record_10k_min: None,
            record_half_min: None,
            record_marathon_min: None,
        }
    }

    /// Whether feedback for this athlete carries a cycle phase
    pub fn tracks_cycle(&self) -> bool {
        self.sex == Sex::Female && !self.amenorrhea
    }

    /// Age in whole years on `date`
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        let born = self.date_of_birth?;
        let days = (date - born).num_days();
        if days < 0 {
            return None;
        }
        (Decimal::from(days) / dec!(365.25)).trunc().to_u32()
    }

    /// Body mass index, one decimal
    pub fn bmi(&self) -> Option<Decimal> {
        let weight = self.weight_kg?;
        let height_m = Decimal::from(self.height_cm?) / dec!(100);
        if height_m <= Decimal::ZERO {
            return None;
        }
        Some((weight / (height_m * height_m)).round_dp(1))
    }

    pub fn record(&self, distance: RaceDistance) -> Option<Decimal> {
        match distance {
            RaceDistance::FiveK => self.record_5k_min,
            RaceDistance::TenK => self.record_10k_min,
            RaceDistance::HalfMarathon => self.record_half_min,
            RaceDistance::Marathon => self.record_marathon_min,
        }
    }

    /// Record pace in min/km, two decimals
    pub fn pace(&self, distance: RaceDistance) -> Option<Decimal> {
        let minutes = self.record(distance)?;
        if minutes <= Decimal::ZERO {
            return None;
        }
        Some((minutes / distance.km()).round_dp(2))
    }
}
