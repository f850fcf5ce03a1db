//! Bhumi — a soil wisdom memory bank.
//!
//! Stores two kinds of records: structured soil observations and free-text
//! farming-wisdom snippets. Retrieval combines semantic text similarity with
//! normalized sensor features: a soil record's stored vector is its text
//! embedding concatenated with `[moisture, pH, temperature, success_count/20]`
//! (388 dimensions), a wisdom record's vector is the text embedding alone
//! (384 dimensions). Outcome feedback reinforces soil records by incrementing
//! a success counter and recomputing a normalized reinforcement score — the
//! memory never decrements, it only reinforces.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   as the nearest-neighbor index, one collection per record kind
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 behind the
//!   [`encoder::TextEncoder`] trait
//! - **Search**: cosine top-k with conjunctive payload filters
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`encoder`] — Text-to-vector boundary (trait + local ONNX implementation)
//! - [`compose`] — Composite vector construction for records and queries
//! - [`store`] — Collection-scoped key/vector/payload store with similarity search
//! - [`memory`] — Domain engine: load, search, recommend, reinforce, stats

pub mod compose;
pub mod config;
pub mod encoder;
pub mod memory;
pub mod store;
