//! The memory engine: record types, initial load, retrieval, recommendation
//! extraction, reinforcement, and aggregate statistics.

pub mod load;
pub mod recommend;
pub mod reinforce;
pub mod search;
pub mod stats;
pub mod types;
