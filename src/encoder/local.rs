//! ONNX Runtime implementation of [`TextEncoder`].
//!
//! Runs all-MiniLM-L6-v2: tokenize, transformer inference, attention-masked
//! mean pooling, then L2 normalization.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{TextEncoder, ENCODER_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

pub struct LocalTextEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex, which guarantees
// exclusive access during run().
unsafe impl Send for LocalTextEncoder {}
unsafe impl Sync for LocalTextEncoder {}

/// Flattened i64 token tensors for one batch, padded to a common length.
struct TokenBatch {
    ids: Vec<i64>,
    mask: Vec<i64>,
    batch: usize,
    seq: usize,
}

impl LocalTextEncoder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = cache_dir.join("model.onnx");
        let tokenizer_path = cache_dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `bhumi model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `bhumi model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow::anyhow!("failed to set optimization level: {e}"))?
            .with_intra_threads(4)
            .map_err(|e| anyhow::anyhow!("failed to set intra threads: {e}"))?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn tokenize(&self, texts: &[&str]) -> Result<TokenBatch> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch = encodings.len();
        let seq = encodings[0].get_ids().len();

        let mut ids = Vec::with_capacity(batch * seq);
        let mut mask = Vec::with_capacity(batch * seq);
        for encoding in &encodings {
            ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }

        Ok(TokenBatch {
            ids,
            mask,
            batch,
            seq,
        })
    }
}

impl TextEncoder for LocalTextEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.encode_batch(&[text])?;
        Ok(results.into_iter().next().expect("batch had one input"))
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let tokens = self.tokenize(texts)?;
        let shape = vec![tokens.batch as i64, tokens.seq as i64];

        let ids_tensor = Tensor::from_array((shape.clone(), tokens.ids.into_boxed_slice()))?;
        let mask_tensor =
            Tensor::from_array((shape.clone(), tokens.mask.clone().into_boxed_slice()))?;
        // token_type_ids: all zeros (single sentence, no segment B)
        let type_ids = vec![0i64; tokens.batch * tokens.seq];
        let type_ids_tensor = Tensor::from_array((shape, type_ids.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_ids_tensor,
        })?;

        // Token embeddings, shape [batch, seq, 384]. The output name varies by
        // ONNX export, so try the common names before falling back to index 0.
        let token_emb = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);
        let (out_shape, data) = token_emb
            .try_extract_tensor::<f32>()
            .context("failed to extract token_embeddings tensor")?;

        let dims: &[i64] = &out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == ENCODER_DIM as i64,
            "unexpected token_embeddings shape: {dims:?}, expected [batch, seq, {ENCODER_DIM}]"
        );
        let seq = dims[1] as usize;

        Ok((0..tokens.batch)
            .map(|b| {
                let row_data = &data[b * seq * ENCODER_DIM..(b + 1) * seq * ENCODER_DIM];
                let row_mask = &tokens.mask[b * tokens.seq..b * tokens.seq + seq];
                l2_normalize(&masked_mean(row_data, row_mask))
            })
            .collect())
    }
}

/// Mean of the token embeddings weighted by the attention mask.
///
/// `data` is one sequence laid out as `seq × ENCODER_DIM`; padding positions
/// (mask 0) are excluded from both the sum and the divisor.
fn masked_mean(data: &[f32], mask: &[i64]) -> Vec<f32> {
    let mut sum = vec![0.0f32; ENCODER_DIM];
    let mut count = 0.0f32;

    for (s, &m) in mask.iter().enumerate() {
        if m > 0 {
            let token = &data[s * ENCODER_DIM..(s + 1) * ENCODER_DIM];
            for (acc, x) in sum.iter_mut().zip(token) {
                *acc += x;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for x in &mut sum {
            *x /= count;
        }
    }
    sum
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_unit_length() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn masked_mean_skips_padding() {
        // Two real tokens, one padding token with a poisoned value.
        let mut data = vec![0.0f32; 3 * ENCODER_DIM];
        data[0] = 2.0; // token 0, dim 0
        data[ENCODER_DIM] = 4.0; // token 1, dim 0
        data[2 * ENCODER_DIM] = 100.0; // token 2 (padding), dim 0

        let mean = masked_mean(&data, &[1, 1, 0]);
        assert_eq!(mean[0], 3.0);
        assert_eq!(mean[1], 0.0);
    }

    fn model_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir: dirs::home_dir()
                .expect("home dir")
                .join(".bhumi/models")
                .to_string_lossy()
                .into_owned(),
        }
    }

    #[test]
    #[ignore] // Requires model files — run with: cargo test -- --ignored
    fn encode_produces_384_dims() {
        let encoder = LocalTextEncoder::new(&model_config()).unwrap();
        let vector = encoder.encode("red loam soil with rice crop").unwrap();
        assert_eq!(vector.len(), ENCODER_DIM);
    }

    #[test]
    #[ignore]
    fn encode_is_deterministic() {
        let encoder = LocalTextEncoder::new(&model_config()).unwrap();
        let a = encoder.encode("mulching improves water retention").unwrap();
        let b = encoder.encode("mulching improves water retention").unwrap();
        assert_eq!(a, b, "same input must produce identical output");
    }

    #[test]
    #[ignore]
    fn encode_batch_normalized() {
        let encoder = LocalTextEncoder::new(&model_config()).unwrap();
        let vectors = encoder
            .encode_batch(&["monsoon preparation", "soil revival", "pest control"])
            .unwrap();
        assert_eq!(vectors.len(), 3);
        for v in &vectors {
            assert_eq!(v.len(), ENCODER_DIM);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }
}
