use anyhow::Result;

use crate::compose::SensorContext;
use crate::config::BhumiConfig;

/// Run a soil search from the terminal.
pub fn search_soil(
    config: &BhumiConfig,
    query: &str,
    sensor: SensorContext,
    season: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let conn = crate::store::open_database(config.resolved_db_path())?;
    let encoder = crate::encoder::create_encoder(&config.embedding)?;

    let sensor = (!sensor.is_empty()).then_some(sensor);
    let limit = limit.unwrap_or(config.retrieval.default_limit);

    let hits = crate::memory::search::search_soil(
        &conn,
        encoder.as_ref(),
        query,
        sensor.as_ref(),
        season,
        limit,
    )?;

    if hits.is_empty() {
        println!("No matching soil records.");
        return Ok(());
    }

    println!("Found {} soil record(s)\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let r = &hit.record;
        println!(
            "  {}. {} — {} / {} ({}, score: {:.4})",
            i + 1,
            r.id,
            r.soil_type,
            r.crop_grown,
            r.location.state,
            hit.score,
        );
        println!(
            "     yield: {}, season: {}, reinforcement: {:.2}",
            r.yield_quality, r.season, r.reinforcement_score
        );
        println!("     methods: {}", r.traditional_methods.join(", "));
        println!();
    }

    Ok(())
}

/// Run a wisdom search from the terminal.
pub fn search_wisdom(
    config: &BhumiConfig,
    query: &str,
    soil_type: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let conn = crate::store::open_database(config.resolved_db_path())?;
    let encoder = crate::encoder::create_encoder(&config.embedding)?;

    let limit = limit.unwrap_or(config.retrieval.default_limit);
    let hits =
        crate::memory::search::search_wisdom(&conn, encoder.as_ref(), query, soil_type, limit)?;

    if hits.is_empty() {
        println!("No matching wisdom entries.");
        return Ok(());
    }

    println!("Found {} wisdom entr(ies)\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let r = &hit.record;
        println!(
            "  {}. [{}] {} (score: {:.4})",
            i + 1,
            r.topic,
            r.id,
            hit.score
        );
        println!("     \"{}\"", r.advice);
        println!(
            "     — {} ({} years), season: {}, soils: {}",
            r.farmer_name,
            r.experience_years,
            r.season_applicable,
            r.soil_types_applicable.join(", ")
        );
        println!();
    }

    Ok(())
}
