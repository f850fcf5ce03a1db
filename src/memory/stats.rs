//! Aggregate statistics over the soil collection.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

use crate::memory::types::{round2, SOIL_COLLECTION};
use crate::store;

/// Response from [`soil_stats`].
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Number of soil records in the scanned page.
    pub total: u64,
    /// Record count per soil type.
    pub soil_types: HashMap<String, u64>,
    /// Mean reinforcement score, rounded to 2 decimals; 0 when empty.
    pub mean_reinforcement: f64,
    /// Up to 5 most frequent practices, descending by count. Ties keep the
    /// order in which the practices were first encountered.
    pub top_practices: Vec<(String, u64)>,
}

/// Compute distribution statistics over one page of soil records.
///
/// The scan is bounded by `page_limit`; once the collection outgrows it the
/// aggregates are an approximation over the first page, which is part of the
/// contract.
pub fn soil_stats(conn: &Connection, page_limit: usize) -> Result<StatsResponse> {
    let page = store::scan_all(conn, SOIL_COLLECTION, page_limit)?;

    let mut soil_types: HashMap<String, u64> = HashMap::new();
    let mut score_sum = 0.0f64;

    // Practices keep first-encounter order so the top-5 sort breaks ties stably.
    let mut practice_order: Vec<String> = Vec::new();
    let mut practice_counts: HashMap<String, u64> = HashMap::new();

    for (_, payload) in &page {
        if let Some(soil_type) = payload.get("soil_type").and_then(|v| v.as_str()) {
            *soil_types.entry(soil_type.to_string()).or_insert(0) += 1;
        }

        score_sum += payload
            .get("reinforcement_score")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        if let Some(methods) = payload.get("traditional_methods").and_then(|v| v.as_array()) {
            for method in methods.iter().filter_map(|m| m.as_str()) {
                let count = practice_counts.entry(method.to_string()).or_insert(0);
                if *count == 0 {
                    practice_order.push(method.to_string());
                }
                *count += 1;
            }
        }
    }

    let total = page.len() as u64;
    let mean_reinforcement = if total == 0 {
        0.0
    } else {
        round2(score_sum / total as f64)
    };

    let mut top_practices: Vec<(String, u64)> = practice_order
        .into_iter()
        .map(|p| {
            let count = practice_counts[&p];
            (p, count)
        })
        .collect();
    // Stable sort: equal counts stay in first-encounter order.
    top_practices.sort_by(|a, b| b.1.cmp(&a.1));
    top_practices.truncate(5);

    Ok(StatsResponse {
        total,
        soil_types,
        mean_reinforcement,
        top_practices,
    })
}
