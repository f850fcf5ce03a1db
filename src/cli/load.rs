use anyhow::{Context, Result};
use std::path::Path;

use crate::config::BhumiConfig;
use crate::memory::types::{SoilRecord, WisdomRecord};

/// Load the two initial record sets from JSON files into the memory bank.
pub fn load(config: &BhumiConfig, soil_file: &Path, wisdom_file: &Path) -> Result<()> {
    let soil_json = std::fs::read_to_string(soil_file)
        .with_context(|| format!("failed to read soil data: {}", soil_file.display()))?;
    let soil_records: Vec<SoilRecord> =
        serde_json::from_str(&soil_json).context("failed to parse soil JSON")?;

    let wisdom_json = std::fs::read_to_string(wisdom_file)
        .with_context(|| format!("failed to read wisdom data: {}", wisdom_file.display()))?;
    let wisdom_records: Vec<WisdomRecord> =
        serde_json::from_str(&wisdom_json).context("failed to parse wisdom JSON")?;

    let mut conn = crate::store::open_database(config.resolved_db_path())?;
    crate::memory::load::ensure_collections(&conn)?;

    let encoder = crate::encoder::create_encoder(&config.embedding)?;

    let soil_count = crate::memory::load::load_soil(&mut conn, encoder.as_ref(), &soil_records)?;
    println!("Loaded {soil_count} soil records");

    let wisdom_count =
        crate::memory::load::load_wisdom(&mut conn, encoder.as_ref(), &wisdom_records)?;
    println!("Loaded {wisdom_count} wisdom snippets");

    Ok(())
}
