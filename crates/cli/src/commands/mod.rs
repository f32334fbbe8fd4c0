//! CLI subcommands.

pub mod ask;
pub mod chat;
pub mod onboard;

use anyhow::{bail, Context};
use colloquy_config::AppConfig;
use colloquy_context::retrieval::RetrievalSettings;
use colloquy_core::message::Conversation;
use colloquy_core::provider::{EmbeddingRequest, Provider};
use colloquy_memory::InMemoryIndex;
use colloquy_providers::OpenAiProvider;
use colloquy_session::TurnRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Build a turn runner and a fresh conversation from config plus CLI flags.
pub async fn build_session(
    config: &AppConfig,
    ingest: &[PathBuf],
    reference: Option<&Path>,
) -> anyhow::Result<(TurnRunner, Conversation)> {
    let Some(api_key) = config.api_key.as_deref() else {
        bail!(
            "No API key configured. Set COLLOQUY_API_KEY or OPENAI_API_KEY, \
             or add api_key to {}",
            AppConfig::config_dir().join("config.toml").display()
        );
    };

    let provider: Arc<dyn Provider> =
        Arc::new(OpenAiProvider::new("openai", &config.base_url, api_key)?);

    let mut runner = TurnRunner::new(
        provider.clone(),
        &config.default_model,
        config.context.budget,
        &config.context.instructions,
    )
    .with_temperature(config.temperature);

    if config.max_tokens > 0 {
        runner = runner.with_max_tokens(config.max_tokens);
    }

    if let Some(path) = reference {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading reference file {}", path.display()))?;
        runner = runner.with_reference_text(text);
    }

    if !ingest.is_empty() || config.retrieval.enabled {
        let index = ingest_files(provider.as_ref(), config, ingest).await?;
        let settings = RetrievalSettings {
            top_k: config.retrieval.top_k,
            snippet_limit: config.retrieval.snippet_limit,
            embedding_model: config.retrieval.embedding_model.clone(),
        };
        runner = runner.with_retrieval(Arc::new(index), settings);
    }

    let tools = colloquy_tools::default_registry(config.weather.api_key.as_deref());
    if !tools.is_empty() {
        runner = runner.with_tools(Arc::new(tools));
    }

    let conversation = Conversation::with_greeting(&config.context.greeting);
    Ok((runner, conversation))
}

/// Embed and index the given files for per-turn retrieval.
async fn ingest_files(
    provider: &dyn Provider,
    config: &AppConfig,
    paths: &[PathBuf],
) -> anyhow::Result<InMemoryIndex> {
    let index = InMemoryIndex::new();
    if paths.is_empty() {
        return Ok(index);
    }

    let mut ids = Vec::with_capacity(paths.len());
    let mut texts = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        ids.push(path.display().to_string());
        texts.push(text);
    }

    let response = provider
        .embed(EmbeddingRequest {
            model: config.retrieval.embedding_model.clone(),
            inputs: texts.clone(),
        })
        .await
        .context("embedding ingested documents")?;

    if response.embeddings.len() != texts.len() {
        bail!(
            "embedding count mismatch: {} documents, {} vectors",
            texts.len(),
            response.embeddings.len()
        );
    }

    use colloquy_core::index::SimilarityIndex;
    for ((id, text), embedding) in ids.iter().zip(&texts).zip(response.embeddings) {
        index.add(text, id, embedding).await?;
    }

    info!(documents = ids.len(), "Indexed documents for retrieval");
    Ok(index)
}
