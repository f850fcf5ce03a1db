//! Caller-facing similarity search over both collections.
//!
//! Query vectors are composed to match the target collection's width: soil
//! queries carry the four-feature suffix (defaults when no sensor context is
//! given), wisdom queries are text-only. An empty result is a valid outcome,
//! never an error.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::compose::{self, SensorContext};
use crate::encoder::TextEncoder;
use crate::memory::types::{SoilRecord, WisdomRecord, SOIL_COLLECTION, WISDOM_COLLECTION};
use crate::store::{self, Filter};

/// A soil search hit: the full record plus its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SoilHit {
    pub score: f64,
    pub record: SoilRecord,
}

/// A wisdom search hit.
#[derive(Debug, Clone, Serialize)]
pub struct WisdomHit {
    pub score: f64,
    pub record: WisdomRecord,
}

/// Search soil records by natural-language query, optionally constrained to a
/// season and enriched with partial sensor readings.
pub fn search_soil(
    conn: &Connection,
    encoder: &dyn TextEncoder,
    query: &str,
    sensor: Option<&SensorContext>,
    season_filter: Option<&str>,
    limit: usize,
) -> Result<Vec<SoilHit>> {
    let query_vector = compose::soil_query_vector(encoder, query, sensor)?;

    let filter = season_filter.map(|season| Filter::new().must_match("season", season));
    let hits = store::search(conn, SOIL_COLLECTION, &query_vector, filter.as_ref(), limit)?;

    hits.into_iter()
        .map(|hit| {
            let record: SoilRecord = serde_json::from_value(hit.payload)?;
            Ok(SoilHit {
                score: hit.score,
                record,
            })
        })
        .collect()
}

/// Search wisdom snippets by natural-language query, optionally constrained
/// to entries applicable to a soil type.
pub fn search_wisdom(
    conn: &Connection,
    encoder: &dyn TextEncoder,
    query: &str,
    soil_type_filter: Option<&str>,
    limit: usize,
) -> Result<Vec<WisdomHit>> {
    let query_vector = compose::wisdom_query_vector(encoder, query)?;

    let filter =
        soil_type_filter.map(|st| Filter::new().must_match("soil_types_applicable", st));
    let hits = store::search(conn, WISDOM_COLLECTION, &query_vector, filter.as_ref(), limit)?;

    hits.into_iter()
        .map(|hit| {
            let record: WisdomRecord = serde_json::from_value(hit.payload)?;
            Ok(WisdomHit {
                score: hit.score,
                record,
            })
        })
        .collect()
}
