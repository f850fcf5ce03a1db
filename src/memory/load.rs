//! Initial bulk load — the write path.
//!
//! Records arrive as already-validated structured data (schema validation is
//! upstream's job), get their composite vectors built, and are upserted in one
//! batch per collection. Soil records are mutated afterwards only through the
//! reinforcement updater; wisdom records stay read-only.

use anyhow::{ensure, Result};
use rusqlite::Connection;

use crate::compose;
use crate::encoder::TextEncoder;
use crate::memory::types::{
    reinforcement_score_for, SoilRecord, WisdomRecord, SOIL_COLLECTION, SOIL_VECTOR_DIM,
    WISDOM_COLLECTION, WISDOM_VECTOR_DIM,
};
use crate::store::{self, DistanceMetric, Point};

/// Create both collections if absent. A width or metric mismatch with an
/// existing collection fails with `SchemaMismatch`.
pub fn ensure_collections(conn: &Connection) -> Result<()> {
    store::ensure_collection(conn, SOIL_COLLECTION, SOIL_VECTOR_DIM, DistanceMetric::Cosine)?;
    store::ensure_collection(
        conn,
        WISDOM_COLLECTION,
        WISDOM_VECTOR_DIM,
        DistanceMetric::Cosine,
    )?;
    Ok(())
}

/// Embed and upsert a batch of soil records. Returns the number stored.
pub fn load_soil(
    conn: &mut Connection,
    encoder: &dyn TextEncoder,
    records: &[SoilRecord],
) -> Result<usize> {
    let mut points = Vec::with_capacity(records.len());
    for record in records {
        // Score and count must never diverge; a mismatch in input data is a
        // bug somewhere upstream and has to fail loudly.
        ensure!(
            (record.reinforcement_score - reinforcement_score_for(record.success_count)).abs()
                < 1e-9,
            "reinforcement_score {} of {} does not match success_count {}",
            record.reinforcement_score,
            record.id,
            record.success_count
        );

        points.push(Point {
            id: record.id.clone(),
            vector: compose::soil_vector(encoder, record)?,
            payload: serde_json::to_value(record)?,
        });
    }

    store::upsert(conn, SOIL_COLLECTION, &points)?;
    tracing::info!(count = points.len(), "soil records loaded");
    Ok(points.len())
}

/// Embed and upsert a batch of wisdom records. Returns the number stored.
pub fn load_wisdom(
    conn: &mut Connection,
    encoder: &dyn TextEncoder,
    records: &[WisdomRecord],
) -> Result<usize> {
    let mut points = Vec::with_capacity(records.len());
    for record in records {
        points.push(Point {
            id: record.id.clone(),
            vector: compose::wisdom_vector(encoder, record)?,
            payload: serde_json::to_value(record)?,
        });
    }

    store::upsert(conn, WISDOM_COLLECTION, &points)?;
    tracing::info!(count = points.len(), "wisdom records loaded");
    Ok(points.len())
}
