//! Text-to-vector encoding boundary.
//!
//! The retrieval engine treats the encoder as an opaque, deterministic
//! function from text to a fixed-length vector. [`LocalTextEncoder`] runs
//! all-MiniLM-L6-v2 (384 dimensions, L2-normalized) through ONNX Runtime;
//! tests substitute their own [`TextEncoder`] implementations.

pub mod local;

pub use local::LocalTextEncoder;

use anyhow::Result;

/// Width of the text embedding produced by all-MiniLM-L6-v2.
pub const ENCODER_DIM: usize = 384;

/// An opaque text → fixed-length-vector function.
///
/// Implementations must be deterministic for a given model version and
/// produce vectors of exactly [`dimensions`](TextEncoder::dimensions) entries.
/// Methods are synchronous; async callers should wrap them in
/// `tokio::task::spawn_blocking`.
pub trait TextEncoder: Send + Sync {
    /// Encode a single text string into a vector.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode a batch of texts. Implementations may override for batched inference.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// Number of dimensions this encoder produces.
    fn dimensions(&self) -> usize {
        ENCODER_DIM
    }
}

/// Create an encoder from config.
///
/// Only `"local"` is supported (ONNX Runtime + all-MiniLM-L6-v2). Fails if
/// the model files are missing — run `bhumi model download` first.
pub fn create_encoder(config: &crate::config::EmbeddingConfig) -> Result<Box<dyn TextEncoder>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(LocalTextEncoder::new(config)?)),
        other => anyhow::bail!("unknown encoder provider: {other}. Supported: local"),
    }
}
