#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use bhumi::encoder::{TextEncoder, ENCODER_DIM};
use bhumi::memory::types::{
    reinforcement_score_for, Location, SensorData, SoilRecord, WisdomRecord, YieldQuality,
};
use bhumi::store;

/// Open a fresh in-memory database with the collection registry initialized.
pub fn test_db() -> Connection {
    store::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    store::init_registry(&conn).unwrap();
    conn
}

/// Generate a deterministic embedding with a spike at position `seed`.
/// Each seed produces a distinct, mutually orthogonal vector.
pub fn spike_vector(dim: usize, seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dim];
    v[seed % dim] = 1.0;
    v
}

/// Deterministic stand-in encoder: spikes one dimension per known keyword the
/// text contains (case-insensitive), so texts sharing a keyword embed close
/// together and unrelated texts stay near-orthogonal. A constant baseline in
/// the last dimension keeps every vector nonzero.
pub struct KeywordEncoder {
    keywords: Vec<String>,
}

impl KeywordEncoder {
    pub fn new(keywords: &[&str]) -> Self {
        assert!(keywords.len() < ENCODER_DIM - 1);
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl TextEncoder for KeywordEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        let mut v = vec![0.0f32; ENCODER_DIM];
        for (i, keyword) in self.keywords.iter().enumerate() {
            if text.contains(keyword) {
                v[i] = 100.0;
            }
        }
        v[ENCODER_DIM - 1] = 1.0;
        Ok(v)
    }
}

/// Build a soil record with fixed sensor readings and location, so retrieval
/// ranking in tests is driven purely by the text fields.
pub fn soil_record(
    id: &str,
    soil_type: &str,
    crop: &str,
    methods: &[&str],
    yield_quality: YieldQuality,
    season: &str,
    success_count: u32,
) -> SoilRecord {
    SoilRecord {
        id: id.to_string(),
        soil_type: soil_type.to_string(),
        location: Location {
            state: "Odisha".into(),
            latitude: 20.9517,
            longitude: 85.0985,
        },
        crop_grown: crop.to_string(),
        traditional_methods: methods.iter().map(|m| m.to_string()).collect(),
        sensor_data: SensorData {
            moisture: 0.35,
            ph: 6.2,
            temperature: 28.5,
            nitrogen: 0.4,
            phosphorus: 0.2,
            potassium: 0.5,
        },
        yield_quality,
        date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        success_count,
        reinforcement_score: reinforcement_score_for(success_count),
        season: season.to_string(),
        farmer_feedback: "Observed over one season".into(),
    }
}

/// Build a wisdom record with fixed metadata.
pub fn wisdom_record(id: &str, topic: &str, advice: &str, soil_types: &[&str]) -> WisdomRecord {
    WisdomRecord {
        id: id.to_string(),
        farmer_name: "Lakshmi Devi".into(),
        experience_years: 40,
        topic: topic.to_string(),
        advice: advice.to_string(),
        language: "Odia/Hindi/English".into(),
        season_applicable: "monsoon".into(),
        soil_types_applicable: soil_types.iter().map(|s| s.to_string()).collect(),
        popularity_score: 50,
        date_recorded: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
    }
}
