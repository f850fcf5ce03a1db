use anyhow::Result;

use crate::config::BhumiConfig;

/// Print practice recommendations for a soil record.
pub fn recommend(config: &BhumiConfig, soil_id: &str, limit: Option<usize>) -> Result<()> {
    let conn = crate::store::open_database(config.resolved_db_path())?;
    let limit = limit.unwrap_or(config.retrieval.recommend_limit);

    let practices = crate::memory::recommend::recommend(&conn, soil_id, limit)?;

    if practices.is_empty() {
        println!("No recommendations — no similar high-yield records of the same soil type.");
        return Ok(());
    }

    println!("Recommended practices for {soil_id}:");
    for (i, practice) in practices.iter().enumerate() {
        println!("  {}. {}", i + 1, practice);
    }

    Ok(())
}
