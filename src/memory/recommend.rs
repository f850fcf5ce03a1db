//! Recommendation extraction.
//!
//! Derives a ranked, deduplicated list of traditional practices for a soil
//! record from its nearest good-yield neighbors of the same soil type.

use anyhow::{anyhow, Result};
use rusqlite::Connection;

use crate::memory::types::{YieldQuality, SOIL_COLLECTION};
use crate::store::{self, Filter};

/// Hard cap on distinct practices returned by [`recommend`].
pub const MAX_PRACTICES: usize = 5;

/// Recommend practices for a soil record from its most similar good-yield
/// neighbors of the same soil type.
///
/// The search is driven by the source record's own stored vector, not query
/// text. Neighbors are walked in ranked order; the source record is skipped,
/// each practice appears at most once (first-seen order), and accumulation
/// stops at [`MAX_PRACTICES`]. No qualifying neighbors is an empty result,
/// not an error.
pub fn recommend(conn: &Connection, soil_id: &str, limit: usize) -> Result<Vec<String>> {
    let source = store::retrieve(conn, SOIL_COLLECTION, soil_id)?;
    let soil_type = source
        .payload
        .get("soil_type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("record {soil_id} has no soil_type"))?;

    let filter = Filter::new()
        .must_match("yield_quality", YieldQuality::Good.as_str())
        .must_match("soil_type", soil_type);

    let neighbors = store::search(conn, SOIL_COLLECTION, &source.vector, Some(&filter), limit)?;

    let mut practices: Vec<String> = Vec::new();
    'neighbors: for neighbor in &neighbors {
        if neighbor.id == soil_id {
            continue;
        }
        let methods = neighbor
            .payload
            .get("traditional_methods")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|m| m.as_str()))
            .into_iter()
            .flatten();

        for method in methods {
            if !practices.iter().any(|p| p == method) {
                practices.push(method.to_string());
                if practices.len() >= MAX_PRACTICES {
                    break 'neighbors;
                }
            }
        }
    }

    tracing::debug!(soil_id, count = practices.len(), "practices recommended");
    Ok(practices)
}
