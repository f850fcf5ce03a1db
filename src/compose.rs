//! Embedding composer — builds the stored and query vectors.
//!
//! A soil record's vector is the text embedding of a descriptive blob
//! concatenated with four scalar features `[moisture, pH, temperature,
//! success_count / 20]`, in that fixed order. A wisdom record's vector is the
//! text embedding alone. The concatenation order is load-bearing: changing it
//! invalidates every vector already in the soil collection.
//!
//! Query vectors must always match the width of the collection they target,
//! so soil queries are padded with the defaults below even when the caller
//! supplies no sensor context.

use anyhow::Result;

use crate::encoder::TextEncoder;
use crate::memory::types::{SoilRecord, WisdomRecord, SOIL_FEATURE_DIMS, SUCCESS_COUNT_SCALE};

/// Feature defaults used to pad soil query vectors.
pub const DEFAULT_MOISTURE: f32 = 0.3;
pub const DEFAULT_PH: f32 = 7.0;
pub const DEFAULT_TEMPERATURE: f32 = 30.0;

/// Partial sensor readings supplied with a soil query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorContext {
    pub moisture: Option<f64>,
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
}

impl SensorContext {
    pub fn is_empty(&self) -> bool {
        self.moisture.is_none() && self.ph.is_none() && self.temperature.is_none()
    }
}

/// Build the stored vector for a soil record: encoded text blob plus
/// `[moisture, pH, temperature, success_count / 20]`.
///
/// Output length is always `encoder.dimensions() + 4`.
pub fn soil_vector(encoder: &dyn TextEncoder, record: &SoilRecord) -> Result<Vec<f32>> {
    let mut vector = encoder.encode(&soil_text(record))?;
    debug_assert_eq!(vector.len(), encoder.dimensions());

    vector.extend_from_slice(&[
        record.sensor_data.moisture as f32,
        record.sensor_data.ph as f32,
        record.sensor_data.temperature as f32,
        (f64::from(record.success_count) / SUCCESS_COUNT_SCALE) as f32,
    ]);
    debug_assert_eq!(vector.len(), encoder.dimensions() + SOIL_FEATURE_DIMS);
    Ok(vector)
}

/// Build the stored vector for a wisdom record: encoded text blob only.
///
/// Output length is always `encoder.dimensions()`.
pub fn wisdom_vector(encoder: &dyn TextEncoder, record: &WisdomRecord) -> Result<Vec<f32>> {
    encoder.encode(&wisdom_text(record))
}

/// Build a query vector for the soil collection.
///
/// When sensor context is supplied, moisture and pH are folded into the query
/// text and the known readings fill the feature suffix; missing readings fall
/// back to the defaults. The success-count slot is always 0 for queries.
pub fn soil_query_vector(
    encoder: &dyn TextEncoder,
    query: &str,
    sensor: Option<&SensorContext>,
) -> Result<Vec<f32>> {
    let (text, features) = match sensor {
        Some(ctx) => {
            let moisture = ctx.moisture.map_or(DEFAULT_MOISTURE, |v| v as f32);
            let ph = ctx.ph.map_or(DEFAULT_PH, |v| v as f32);
            let temperature = ctx.temperature.map_or(DEFAULT_TEMPERATURE, |v| v as f32);
            (
                format!("{query} Moisture: {moisture} pH: {ph}"),
                [moisture, ph, temperature, 0.0],
            )
        }
        None => (
            query.to_string(),
            [DEFAULT_MOISTURE, DEFAULT_PH, DEFAULT_TEMPERATURE, 0.0],
        ),
    };

    let mut vector = encoder.encode(&text)?;
    vector.extend_from_slice(&features);
    debug_assert_eq!(vector.len(), encoder.dimensions() + SOIL_FEATURE_DIMS);
    Ok(vector)
}

/// Build a query vector for the wisdom collection (no feature suffix).
pub fn wisdom_query_vector(encoder: &dyn TextEncoder, query: &str) -> Result<Vec<f32>> {
    encoder.encode(query)
}

/// Descriptive text blob for a soil record.
fn soil_text(record: &SoilRecord) -> String {
    format!(
        "Soil type: {}\n\
         Location: {}\n\
         Crop: {}\n\
         Methods: {}\n\
         Moisture: {}\n\
         pH: {}\n\
         Temperature: {}\n\
         Season: {}\n\
         Yield: {}",
        record.soil_type,
        record.location.state,
        record.crop_grown,
        record.traditional_methods.join(", "),
        record.sensor_data.moisture,
        record.sensor_data.ph,
        record.sensor_data.temperature,
        record.season,
        record.yield_quality,
    )
}

/// Descriptive text blob for a wisdom record.
fn wisdom_text(record: &WisdomRecord) -> String {
    format!(
        "Topic: {}\n\
         Advice: {}\n\
         Farmer: {} with {} years experience\n\
         Season: {}\n\
         Soil types: {}",
        record.topic,
        record.advice,
        record.farmer_name,
        record.experience_years,
        record.season_applicable,
        record.soil_types_applicable.join(", "),
    )
}
