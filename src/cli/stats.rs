use anyhow::Result;

use crate::config::BhumiConfig;

/// Display soil memory statistics in the terminal.
pub fn stats(config: &BhumiConfig) -> Result<()> {
    let conn = crate::store::open_database(config.resolved_db_path())?;

    let response =
        crate::memory::stats::soil_stats(&conn, config.retrieval.stats_page_limit)?;

    println!("Soil Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total records:       {}", response.total);
    println!("  Mean reinforcement:  {:.2}", response.mean_reinforcement);
    println!();

    if !response.soil_types.is_empty() {
        println!("By Soil Type:");
        let mut types: Vec<_> = response.soil_types.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (soil_type, count) in types {
            println!("  {soil_type:<16} {count}");
        }
        println!();
    }

    if !response.top_practices.is_empty() {
        println!("Top Practices:");
        for (practice, count) in &response.top_practices {
            println!("  {practice:<24} {count}");
        }
    }

    Ok(())
}
