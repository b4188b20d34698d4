use anyhow::{Context, Result};
use std::path::Path;

use medmatch::config::MedmatchConfig;
use medmatch::embedding::{self, EmbeddingAdapter};
use medmatch::matching::{CandidateItem, MatchRequest, MatchService};

/// Match `query` against the items in a JSON file and print the ranking.
pub async fn match_items(
    config: &MedmatchConfig,
    query: &str,
    items_path: &Path,
    top_k: Option<usize>,
) -> Result<()> {
    let contents = std::fs::read_to_string(items_path)
        .with_context(|| format!("failed to read items file: {}", items_path.display()))?;
    let items: Vec<CandidateItem> = serde_json::from_str(&contents)
        .context("items file must be a JSON array of {id, text} objects")?;

    let provider = embedding::create_provider(&config.embedding)?;
    let adapter = EmbeddingAdapter::new(provider, config.embedding.timeout());
    let service = MatchService::new(adapter, config.matching.clone());

    let k = top_k.unwrap_or(config.matching.default_top_k);
    let outcome = service
        .rank_all(MatchRequest::new(query, items).with_top_k(k))
        .await?;

    let best = &outcome.request.items[outcome.best.index];
    println!(
        "Best match: {} (id {}, score {:.4})\n",
        best.text, best.id, outcome.best.score
    );

    for ranked in outcome.top_k(k) {
        println!(
            "  {}. [{}] {} (score: {:.4})",
            ranked.rank + 1,
            ranked.item.id,
            ranked.item.text,
            ranked.score,
        );
    }

    let unscored = outcome.unscored_ids();
    if !unscored.is_empty() {
        println!();
        println!(
            "{} item(s) had zero-norm embeddings and were not scored:",
            unscored.len()
        );
        for id in unscored {
            println!("  - {id}");
        }
    }

    Ok(())
}
