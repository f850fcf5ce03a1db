use anyhow::Result;

use crate::config::BhumiConfig;

/// Record outcome feedback for a soil record.
pub fn reinforce(config: &BhumiConfig, soil_id: &str, worked_well: bool) -> Result<()> {
    let mut conn = crate::store::open_database(config.resolved_db_path())?;

    let new_count = crate::memory::reinforce::reinforce(&mut conn, soil_id, worked_well)?;

    println!("Reinforced memory for {soil_id}: success_count = {new_count}");
    Ok(())
}
