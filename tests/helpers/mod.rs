#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use medmatch::config::MatchingConfig;
use medmatch::embedding::{EmbeddingAdapter, EmbeddingProvider};
use medmatch::error::ProviderFailure;
use medmatch::matching::{CandidateItem, MatchService};

/// How the stub answers a batch.
#[derive(Clone)]
pub enum StubBehavior {
    /// Look every text up in the vector table.
    Lookup,
    /// Drop the last vector so the count no longer matches.
    DropLast,
    /// Fail with the given error.
    Fail(ProviderFailure),
}

/// Deterministic embedding provider with known per-string vectors.
pub struct StubProvider {
    vectors: HashMap<String, Vec<f32>>,
    behavior: StubBehavior,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl StubProvider {
    pub fn new(table: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: table
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            behavior: StubBehavior::Lookup,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, behavior: StubBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every batch received so far, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(texts.to_vec());

        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            let v = self.vectors.get(text).cloned().ok_or_else(|| {
                ProviderFailure::MalformedResponse(format!("stub has no vector for {text:?}"))
            })?;
            vectors.push(v);
        }

        match &self.behavior {
            StubBehavior::Lookup => Ok(vectors),
            StubBehavior::DropLast => {
                vectors.pop();
                Ok(vectors)
            }
            StubBehavior::Fail(failure) => Err(failure.clone()),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

/// Build a service around `provider` with default matching settings.
pub fn service_with(provider: Arc<StubProvider>) -> MatchService {
    service_with_config(provider, MatchingConfig::default())
}

pub fn service_with_config(provider: Arc<StubProvider>, config: MatchingConfig) -> MatchService {
    let adapter = EmbeddingAdapter::new(provider, Duration::from_secs(5));
    MatchService::new(adapter, config)
}

/// The procedure table used across tests: "eye surgery" sits close to
/// cataract surgery and far from hip replacement.
pub fn procedure_table() -> Vec<(&'static str, Vec<f32>)> {
    vec![
        ("eye surgery", vec![0.9, 0.1, 0.0]),
        ("Cataract Surgery", vec![0.8, 0.2, 0.1]),
        ("Hip Replacement", vec![0.1, 0.2, 0.9]),
        ("Knee Arthroscopy", vec![0.0, 0.3, 0.8]),
        ("LASIK", vec![0.85, 0.15, 0.05]),
        ("Blank Scan", vec![0.0, 0.0, 0.0]),
        ("Void Panel", vec![0.0, 0.0, 0.0]),
    ]
}

pub fn items(pairs: &[(i64, &str)]) -> Vec<CandidateItem> {
    pairs
        .iter()
        .map(|(id, text)| CandidateItem::new(*id, *text))
        .collect()
}
