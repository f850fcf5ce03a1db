//! Core record definitions.
//!
//! Defines [`SoilRecord`] (a structured soil observation with sensor readings
//! and a feedback-driven reinforcement score) and [`WisdomRecord`] (a
//! free-text farming-wisdom snippet). Both serialize directly to the payload
//! stored alongside their vector.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::encoder::ENCODER_DIM;

/// Collection holding soil observations (vectors are text embedding + 4 sensor features).
pub const SOIL_COLLECTION: &str = "soil_records";
/// Collection holding wisdom snippets (text embedding only).
pub const WISDOM_COLLECTION: &str = "wisdom_records";

/// Scalar features appended to a soil record's text embedding:
/// moisture, pH, temperature, normalized success count.
pub const SOIL_FEATURE_DIMS: usize = 4;

/// Stored vector width of the soil collection.
pub const SOIL_VECTOR_DIM: usize = ENCODER_DIM + SOIL_FEATURE_DIMS;
/// Stored vector width of the wisdom collection.
pub const WISDOM_VECTOR_DIM: usize = ENCODER_DIM;

/// Success counts normalize to the reinforcement score by this divisor, so
/// the score reaches 1.0 at 20 confirmed successes. No ceiling is enforced.
pub const SUCCESS_COUNT_SCALE: f64 = 20.0;

/// Observed yield quality of a soil record's crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldQuality {
    Good,
    Average,
    Poor,
}

impl YieldQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Average => "average",
            Self::Poor => "poor",
        }
    }
}

impl std::fmt::Display for YieldQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for YieldQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Self::Good),
            "average" => Ok(Self::Average),
            "poor" => Ok(Self::Poor),
            _ => Err(format!("unknown yield quality: {s}")),
        }
    }
}

/// Where an observation was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub state: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

/// One set of sensor readings. Moisture is a fraction, pH on the usual
/// 0–14 scale, temperature in °C, N/P/K as normalized fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorData {
    pub moisture: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub temperature: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

/// A structured soil observation.
///
/// Invariant: `reinforcement_score == round(success_count / 20, 2)`. The two
/// fields are only ever written together, by the reinforcement updater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilRecord {
    /// Stable identifier in the form `soil_<ordinal>`.
    pub id: String,
    pub soil_type: String,
    pub location: Location,
    pub crop_grown: String,
    /// 1–3 practice labels; order carries no meaning.
    pub traditional_methods: Vec<String>,
    pub sensor_data: SensorData,
    pub yield_quality: YieldQuality,
    pub date: NaiveDate,
    /// Monotonically non-decreasing count of confirmed successes.
    pub success_count: u32,
    /// Derived: `round(success_count / 20, 2)`. May exceed 1.0.
    pub reinforcement_score: f64,
    pub season: String,
    /// Free-text annotation, last-write-wins.
    pub farmer_feedback: String,
}

/// A free-text farming-wisdom snippet. Read-only after the initial load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WisdomRecord {
    /// Stable identifier in the form `wisdom_<ordinal>`.
    pub id: String,
    pub farmer_name: String,
    pub experience_years: u32,
    pub topic: String,
    pub advice: String,
    pub language: String,
    pub season_applicable: String,
    pub soil_types_applicable: Vec<String>,
    pub popularity_score: u32,
    pub date_recorded: NaiveDate,
}

/// Round to two decimal places, matching the stored reinforcement score.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The reinforcement score a given success count must carry.
pub fn reinforcement_score_for(success_count: u32) -> f64 {
    round2(f64::from(success_count) / SUCCESS_COUNT_SCALE)
}
