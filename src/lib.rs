//! Semantic item matching for healthcare cost lookup.
//!
//! Given a free-text query ("eye surgery") and a list of candidate items
//! (procedures, hospitals), medmatch finds the candidate whose meaning is
//! closest to the query. The query and all candidate texts are embedded in a
//! single batched call to an external embedding model, then ranked by cosine
//! similarity.
//!
//! # Architecture
//!
//! - **Embedding**: an injected [`embedding::EmbeddingProvider`] (OpenAI-compatible
//!   HTTP by default) behind an [`embedding::EmbeddingAdapter`] that enforces
//!   batch order, count and dimension
//! - **Ranking**: [`matching::rank()`], pure O(N·D) cosine scoring with a stable
//!   tie-break and a fixed zero-norm policy
//! - **Handling**: [`matching::MatchService`] validates, embeds, ranks and
//!   shapes the response
//! - **Transport**: JSON over HTTP via axum ([`server`])
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`error`]: Error taxonomy shared by the library and the HTTP layer
//! - [`embedding`]: Embedding provider trait, adapter, and OpenAI client
//! - [`matching`]: Ranking and request handling
//! - [`server`]: HTTP router and server entry point

pub mod config;
pub mod embedding;
pub mod error;
pub mod matching;
pub mod server;
