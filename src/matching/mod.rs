//! Semantic item matching: rank caller-supplied candidates against a query.
//!
//! - [`types`]: request, candidate, and response shapes
//! - [`rank`]: cosine-similarity ranker (pure, no I/O)
//! - [`service`]: request handler driving the embedding adapter and ranker

pub mod rank;
pub mod service;
pub mod types;

pub use rank::{cosine_similarity, rank, RankOptions, Ranking};
pub use service::{MatchOutcome, MatchService};
pub use types::{CandidateItem, ItemId, MatchRequest, MatchResponse, RankedItem, ScoredMatch};
