//! Request handling: validate, embed once, rank, shape the response.
//!
//! [`MatchService`] owns no retry or caching logic and keeps no state between
//! requests; concurrent calls share only the read-only adapter and config.

use std::time::Instant;

use crate::config::MatchingConfig;
use crate::embedding::EmbeddingAdapter;
use crate::error::MatchError;
use crate::matching::rank::{rank, RankOptions, Ranking};
use crate::matching::types::{ItemId, MatchRequest, MatchResponse, RankedItem, ScoredMatch};

#[derive(Clone)]
pub struct MatchService {
    adapter: EmbeddingAdapter,
    config: MatchingConfig,
}

/// Result of one matching request, before it is shaped for the wire.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub request: MatchRequest,
    pub ranking: Ranking,
    pub best: ScoredMatch,
}

impl MatchOutcome {
    /// Ranked items for the first `k` scored entries.
    pub fn top_k(&self, k: usize) -> Vec<RankedItem> {
        self.ranking
            .top_k(k)
            .iter()
            .map(|m| RankedItem {
                item: self.request.items[m.index].clone(),
                score: m.score,
                rank: m.rank,
            })
            .collect()
    }

    pub fn unscored_ids(&self) -> Vec<ItemId> {
        self.ranking
            .unscored()
            .iter()
            .map(|m| self.request.items[m.index].id.clone())
            .collect()
    }

    pub fn into_response(self) -> MatchResponse {
        let matches = self.request.top_k.map(|k| self.top_k(k));
        let unscored = self.unscored_ids();
        MatchResponse {
            best: self.request.items[self.best.index].clone(),
            score: self.best.score,
            matches,
            unscored,
        }
    }
}

impl MatchService {
    pub fn new(adapter: EmbeddingAdapter, config: MatchingConfig) -> Self {
        Self { adapter, config }
    }

    pub fn adapter(&self) -> &EmbeddingAdapter {
        &self.adapter
    }

    /// Check a request without touching the embedding provider.
    pub fn validate(&self, request: &MatchRequest) -> Result<(), MatchError> {
        if request.query.trim().is_empty() {
            return Err(MatchError::invalid("query must not be empty"));
        }
        if request.items.is_empty() {
            return Err(MatchError::invalid("items must not be empty"));
        }
        if request.items.len() > self.config.max_items {
            return Err(MatchError::invalid(format!(
                "too many items: {} (max {})",
                request.items.len(),
                self.config.max_items
            )));
        }
        if let Some(i) = request.items.iter().position(|it| it.text.trim().is_empty()) {
            return Err(MatchError::invalid(format!(
                "item {i} (id {}) has blank text",
                request.items[i].id
            )));
        }
        if request.top_k == Some(0) {
            return Err(MatchError::invalid("top_k must be at least 1"));
        }
        Ok(())
    }

    /// Embed the query and every candidate in one batch, then rank.
    ///
    /// Fails with [`MatchError::DegenerateVector`] if no candidate can be
    /// scored, so a successful outcome always has a defined best match.
    pub async fn rank_all(&self, request: MatchRequest) -> Result<MatchOutcome, MatchError> {
        self.validate(&request)?;
        let started = Instant::now();

        let mut texts = Vec::with_capacity(request.items.len() + 1);
        texts.push(request.query.clone());
        texts.extend(request.items.iter().map(|it| it.text.clone()));

        let mut vectors = self.adapter.embed(&texts).await?;
        let candidates = vectors.split_off(1);
        let query = &vectors[0];

        let ranking = rank(query, &candidates, &RankOptions::from(&self.config))?;
        let Some(best) = ranking.best().copied() else {
            return Err(MatchError::DegenerateVector {
                what: format!("every candidate embedding ({})", candidates.len()),
            });
        };

        tracing::info!(
            query_len = request.query.len(),
            items = request.items.len(),
            unscored = ranking.unscored().len(),
            best_index = best.index,
            best_id = %request.items[best.index].id,
            score = best.score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "match ranked"
        );

        Ok(MatchOutcome {
            request,
            ranking,
            best,
        })
    }

    /// The "find best match" operation: best candidate plus optional top-K.
    pub async fn find_best(&self, request: MatchRequest) -> Result<MatchResponse, MatchError> {
        let outcome = self.rank_all(request).await?;
        Ok(outcome.into_response())
    }
}
