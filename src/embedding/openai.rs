//! OpenAI-compatible HTTP embedding provider.
//!
//! Implements [`EmbeddingProvider`] against `POST {base_url}/embeddings`.
//! The whole batch goes out in one request so every vector in a ranking comes
//! from the same model call.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::ProviderFailure;

/// Longest error body kept from a failed provider response.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbeddingProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbeddingProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        anyhow::ensure!(
            !config.api_key.is_empty(),
            "no API key for the embedding provider. Set OPENAI_API_KEY or embedding.api_key."
        );
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build HTTP client")?;
        tracing::info!(
            base_url = %config.base_url,
            model = %config.model,
            "openai embedding provider ready"
        );
        Ok(Self::new(
            client,
            &config.base_url,
            &config.api_key,
            &config.model,
            config.timeout(),
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderFailure> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderFailure::Timeout(self.timeout)
                } else {
                    ProviderFailure::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(ProviderFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderFailure::Timeout(self.timeout)
            } else {
                ProviderFailure::MalformedResponse(e.to_string())
            }
        })?;

        order_by_index(texts.len(), parsed.data)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Place each returned embedding at the position named by its `index`.
fn order_by_index(
    expected: usize,
    data: Vec<EmbeddingData>,
) -> Result<Vec<Vec<f32>>, ProviderFailure> {
    if data.len() != expected {
        return Err(ProviderFailure::CountMismatch {
            expected,
            actual: data.len(),
        });
    }
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            ProviderFailure::MalformedResponse(format!(
                "embedding index {} out of range for {expected} inputs",
                item.index
            ))
        })?;
        if slot.is_some() {
            return Err(ProviderFailure::MalformedResponse(format!(
                "duplicate embedding index {}",
                item.index
            )));
        }
        *slot = Some(item.embedding);
    }
    // Count matched and no index repeated, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
