pub mod load;
pub mod recommend;
pub mod reinforce;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::config::EmbeddingConfig;

const HF_BASE: &str = "https://huggingface.co/sentence-transformers";

/// Files the local encoder needs: (cache file name, path within the model's
/// repository). [`LocalTextEncoder`](crate::encoder::LocalTextEncoder) looks
/// these up by the cache file name.
const MODEL_ARTIFACTS: [(&str, &str); 2] = [
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
];

fn artifact_url(model: &str, remote_path: &str) -> String {
    format!("{HF_BASE}/{model}/resolve/main/{remote_path}")
}

/// Fetch the configured embedding model and its tokenizer into the cache
/// directory. Artifacts already present are left untouched, so a partial
/// earlier run can be resumed by re-invoking the command.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    for (file_name, remote_path) in MODEL_ARTIFACTS {
        let dest = cache_dir.join(file_name);
        if dest.exists() {
            println!("{file_name} already present at {}", dest.display());
            continue;
        }

        println!("Fetching {file_name} for {}...", config.model);
        download_file(&artifact_url(&config.model, remote_path), &dest).await?;
        println!("Saved {}", dest.display());
    }

    println!("Embedding model ready; `bhumi load` can now build vectors.");
    Ok(())
}

/// Download one artifact, writing through a sibling temp file so an
/// interrupted transfer never leaves a truncated file at the final path.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;
    anyhow::ensure!(
        response.status().is_success(),
        "{url} returned HTTP {}",
        response.status()
    );

    let bar = match response.content_length() {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {bytes}/{total_bytes} {wide_bar:.green} {eta}")
                    .expect("valid template"),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let body = response.bytes().await.context("error reading response body")?;
    bar.inc(body.len() as u64);

    let tmp = dest.with_extension("partial");
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp.display()))?;
    file.write_all(&body).await.context("error writing artifact")?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, dest)
        .await
        .context("failed to move artifact into place")?;

    bar.finish_and_clear();
    Ok(())
}
