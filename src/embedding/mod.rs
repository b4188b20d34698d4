//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait (the external model behind a narrow
//! request/response contract), the [`EmbeddingAdapter`] that enforces that
//! contract, and [`create_provider`] to build a provider from configuration.

pub mod openai;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::{MatchError, ProviderFailure};

/// An embedding model reachable through one batched call.
///
/// Implementations must return exactly one vector per input text, in input
/// order. The adapter re-checks this, so a misbehaving provider is reported as
/// a [`ProviderFailure`] instead of corrupting a ranking.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in a single round trip.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderFailure>;

    /// Short provider identifier, e.g. `"openai"`.
    fn name(&self) -> &str;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;
}

/// Validating wrapper around an injected [`EmbeddingProvider`].
#[derive(Clone)]
pub struct EmbeddingAdapter {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl EmbeddingAdapter {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed `texts`, returning vectors positionally aligned with the input.
    ///
    /// Input problems (empty batch, blank text) are rejected before the
    /// provider is called. Every contract violation in the response (wrong
    /// count, ragged or empty dimensions, non-finite components) becomes a
    /// [`ProviderFailure`]; no vector is ever fabricated.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MatchError> {
        if texts.is_empty() {
            return Err(MatchError::invalid("nothing to embed"));
        }
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(MatchError::invalid(format!("text {i} is blank")));
        }

        let started = Instant::now();
        let vectors = match tokio::time::timeout(self.timeout, self.provider.embed_batch(texts)).await
        {
            Ok(Ok(vectors)) => vectors,
            Ok(Err(failure)) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %failure,
                    "embedding provider failed"
                );
                return Err(failure.into());
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "embedding call timed out"
                );
                return Err(ProviderFailure::Timeout(self.timeout).into());
            }
        };

        check_batch(texts.len(), &vectors)?;

        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            texts = texts.len(),
            dim = vectors[0].len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "embedded batch"
        );
        Ok(vectors)
    }
}

/// Verify a provider response against the adapter contract.
fn check_batch(expected: usize, vectors: &[Vec<f32>]) -> Result<(), ProviderFailure> {
    if vectors.len() != expected {
        return Err(ProviderFailure::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    let dim = vectors[0].len();
    if dim == 0 {
        return Err(ProviderFailure::MalformedResponse(
            "embedding 0 is empty".into(),
        ));
    }
    for (index, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(ProviderFailure::DimensionMismatch {
                index,
                expected: dim,
                actual: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(ProviderFailure::MalformedResponse(format!(
                "embedding {index} contains non-finite values"
            )));
        }
    }
    Ok(())
}

/// Create an embedding provider from config.
///
/// Currently only `"openai"` (any OpenAI-compatible `/embeddings` endpoint)
/// is supported.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => {
            let provider = openai::OpenAiEmbeddingProvider::from_config(config)?;
            Ok(Arc::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: openai"),
    }
}
