//! Cosine-similarity ranking of candidate vectors against one query vector.
//!
//! Pure computation: no I/O, deterministic for a given input. Cost is
//! O(N·D) time and O(N) extra space; the comparison is one-to-many, never
//! pairwise.
//!
//! Fixed policies:
//! - **Zero-norm candidate** (norm below `norm_epsilon`): scored
//!   `f64::NEG_INFINITY`, sorted after every finite score, never best.
//! - **Zero-norm query**: every similarity is undefined, so ranking fails with
//!   [`MatchError::DegenerateVector`].
//! - **Dimension mismatch**: [`MatchError::ShapeMismatch`], never padded or
//!   truncated.
//! - **Ties** (scores within `tie_tolerance` of each other): earlier input
//!   position ranks first. Tie groups are measured from the highest score in
//!   the group, see [`settle_ties`].

use std::cmp::Ordering;

use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::matching::types::ScoredMatch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub tie_tolerance: f64,
    pub norm_epsilon: f64,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            tie_tolerance: 1e-9,
            norm_epsilon: 1e-12,
        }
    }
}

impl From<&MatchingConfig> for RankOptions {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            tie_tolerance: config.tie_tolerance,
            norm_epsilon: config.norm_epsilon,
        }
    }
}

/// Full ranked result. Entries are sorted by score descending; unscored
/// (zero-norm) candidates come last in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    entries: Vec<ScoredMatch>,
}

impl Ranking {
    /// Highest-scoring candidate, if any candidate could be scored.
    pub fn best(&self) -> Option<&ScoredMatch> {
        self.entries.first().filter(|m| m.is_scored())
    }

    /// The first `k` scored entries.
    pub fn top_k(&self, k: usize) -> &[ScoredMatch] {
        &self.scored()[..k.min(self.scored_len())]
    }

    pub fn scored(&self) -> &[ScoredMatch] {
        &self.entries[..self.scored_len()]
    }

    pub fn unscored(&self) -> &[ScoredMatch] {
        &self.entries[self.scored_len()..]
    }

    /// Every entry, scored and unscored.
    pub fn entries(&self) -> &[ScoredMatch] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn scored_len(&self) -> usize {
        self.entries.partition_point(|m| m.is_scored())
    }
}

fn norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// Cosine similarity between `a` and `b`, clamped to `[-1, 1]`.
///
/// Returns `Ok(None)` when either vector's norm is below `norm_epsilon`.
pub fn cosine_similarity(
    a: &[f32],
    b: &[f32],
    norm_epsilon: f64,
) -> Result<Option<f64>, MatchError> {
    if a.len() != b.len() {
        return Err(MatchError::ShapeMismatch {
            index: 0,
            expected: a.len(),
            actual: b.len(),
        });
    }
    let (na, nb) = (norm(a), norm(b));
    if na < norm_epsilon || nb < norm_epsilon {
        return Ok(None);
    }
    Ok(Some((dot(a, b) / (na * nb)).clamp(-1.0, 1.0)))
}

/// Score every candidate against `query` and sort the result.
///
/// `rank(..).best()` is the single best match; `top_k` is a prefix of the
/// same ordering, so no recomputation is needed for either.
pub fn rank(
    query: &[f32],
    candidates: &[Vec<f32>],
    options: &RankOptions,
) -> Result<Ranking, MatchError> {
    let query_norm = norm(query);
    if query_norm < options.norm_epsilon {
        return Err(MatchError::DegenerateVector {
            what: "query embedding".into(),
        });
    }

    let mut entries = Vec::with_capacity(candidates.len());
    for (index, c) in candidates.iter().enumerate() {
        if c.len() != query.len() {
            return Err(MatchError::ShapeMismatch {
                index,
                expected: query.len(),
                actual: c.len(),
            });
        }
        let cn = norm(c);
        let score = if cn < options.norm_epsilon {
            f64::NEG_INFINITY
        } else {
            (dot(query, c) / (query_norm * cn)).clamp(-1.0, 1.0)
        };
        entries.push(ScoredMatch {
            index,
            score,
            rank: 0,
        });
    }

    // Exact total order first: score descending, then input position.
    entries.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
    settle_ties(&mut entries, options.tie_tolerance);

    for (rank, entry) in entries.iter_mut().enumerate() {
        entry.rank = rank;
    }
    Ok(Ranking { entries })
}

/// Reorder runs of near-equal scores by input position.
///
/// A run starts at its highest-scoring entry and extends while scores stay
/// within `tolerance` of that entry, so runs never chain beyond one tolerance
/// width. An entry that is within tolerance of a run member but not of the
/// run's head starts the next run: for scores `[0.8, 0.8 + 6e-10, 0.8 + 1.5e-9]`
/// the first run is indices `{1, 2}`, so index 1 is best even though index 0
/// is within tolerance of it.
fn settle_ties(entries: &mut [ScoredMatch], tolerance: f64) {
    let mut start = 0;
    while start < entries.len() {
        let head = entries[start].score;
        let mut end = start + 1;
        while end < entries.len() && within(head, entries[end].score, tolerance) {
            end += 1;
        }
        if end - start > 1 {
            entries[start..end].sort_by_key(|m| m.index);
        }
        start = end;
    }
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    if a.is_finite() && b.is_finite() {
        (a - b).abs() <= tolerance
    } else {
        a.total_cmp(&b) == Ordering::Equal
    }
}
