//! Reinforcement updater — the only mutation path for soil records.
//!
//! The memory never forgets: a confirmed-effective outcome increments the
//! success count, a negative outcome is recorded only through the feedback
//! text. Count and score are written together so they can never diverge.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

use crate::memory::types::{reinforcement_score_for, SOIL_COLLECTION};
use crate::store;

/// Feedback annotation written on a confirmed-effective outcome.
pub const FEEDBACK_CONFIRMED: &str = "Method confirmed effective";
/// Feedback annotation written on a negative outcome.
pub const FEEDBACK_NEEDS_ADJUSTMENT: &str = "Needs adjustment";

/// Record outcome feedback for a soil record and return the new success count.
///
/// `worked_well == true` increments the count by exactly 1; `false` leaves it
/// unchanged. Either way the derived score and the feedback annotation are
/// rewritten. The read-modify-write runs in one transaction, so callers
/// sharing a connection (the unit of write serialization) cannot lose
/// increments to a concurrent update of the same record.
pub fn reinforce(conn: &mut Connection, soil_id: &str, worked_well: bool) -> Result<u32> {
    let tx = conn.transaction()?;

    let point = store::retrieve(&tx, SOIL_COLLECTION, soil_id)?;
    let current = point
        .payload
        .get("success_count")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let new_count = if worked_well { current + 1 } else { current };
    let feedback = if worked_well {
        FEEDBACK_CONFIRMED
    } else {
        FEEDBACK_NEEDS_ADJUSTMENT
    };

    store::update_payload(
        &tx,
        SOIL_COLLECTION,
        soil_id,
        &json!({
            "success_count": new_count,
            "reinforcement_score": reinforcement_score_for(new_count),
            "farmer_feedback": feedback,
        }),
    )?;

    tx.commit()?;

    tracing::info!(soil_id, success_count = new_count, worked_well, "memory reinforced");
    Ok(new_count)
}
