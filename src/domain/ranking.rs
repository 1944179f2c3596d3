// ============================================================
// Layer 3 — Ranking Metrics
// ============================================================
// Scores next-utterance predictions the way the Ubuntu
// Dialogue Corpus benchmark does.
//
// How examples become queries:
//   The validation and test files list each context followed
//   by its candidate responses (the true one first, then the
//   distractors). Consecutive examples with an identical context
//   form one query:
//
//     ctx A, resp 1 (label 1)  ┐
//     ctx A, resp 2 (label 0)  │ query 0
//     ctx A, resp 3 (label 0)  ┘
//     ctx B, resp 4 (label 1)  ┐ query 1
//     ...
//
// Metrics:
//   MRR     — mean over queries of 1 / rank of the best-ranked
//             relevant candidate
//   N-R@k   — restrict each query to its first N candidates and
//             count how often the relevant one lands in the top k
//             ("1 in 10 R@2" is R10_2)
//
// Queries without any relevant candidate are skipped; an empty
// evaluation yields NaN, never a division by zero panic.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Ranking quality of one split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingMetrics {
    /// Mean Reciprocal Rank over full candidate lists
    pub mrr: f64,
    /// 1 in 2 Recall@1
    pub r2_1: f64,
    /// 1 in 10 Recall@1
    pub r10_1: f64,
    /// 1 in 10 Recall@2
    pub r10_2: f64,
    /// 1 in 10 Recall@5
    pub r10_5: f64,
    /// Number of queries that contributed to MRR
    pub queries: usize,
}

impl RankingMetrics {
    /// Look a metric up by its report name (`MRR`, `R2_1`, `R10_1`, `R10_2`, `R10_5`).
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "MRR"   => Some(self.mrr),
            "R2_1"  => Some(self.r2_1),
            "R10_1" => Some(self.r10_1),
            "R10_2" => Some(self.r10_2),
            "R10_5" => Some(self.r10_5),
            _ => None,
        }
    }
}

/// Split examples into queries: maximal runs of equal consecutive contexts.
pub fn group_queries(contexts: &[&[u32]]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start  = 0;

    for i in 1..=contexts.len() {
        if i == contexts.len() || contexts[i] != contexts[start] {
            groups.push(start..i);
            start = i;
        }
    }

    groups
}

/// Compute MRR and the standard recall figures for one split.
///
/// `scores`, `contexts` and `labels` are parallel, in file order.
pub fn evaluate_ranking(
    scores:   &[f32],
    contexts: &[&[u32]],
    labels:   &[f32],
) -> Result<RankingMetrics> {
    if scores.len() != contexts.len() || labels.len() != contexts.len() {
        bail!(
            "Cannot rank {} scores against {} contexts and {} labels",
            scores.len(),
            contexts.len(),
            labels.len()
        );
    }

    let groups = group_queries(contexts);

    let mut rr_sum  = 0.0f64;
    let mut queries = 0usize;
    for g in &groups {
        if let Some(rank) = best_relevant_rank(&scores[g.clone()], &labels[g.clone()]) {
            rr_sum  += 1.0 / (rank + 1) as f64;
            queries += 1;
        }
    }

    let metrics = RankingMetrics {
        mrr:   if queries > 0 { rr_sum / queries as f64 } else { f64::NAN },
        r2_1:  recall_at(&groups, scores, labels, 2, 1),
        r10_1: recall_at(&groups, scores, labels, 10, 1),
        r10_2: recall_at(&groups, scores, labels, 10, 2),
        r10_5: recall_at(&groups, scores, labels, 10, 5),
        queries,
    };

    tracing::debug!(
        "Ranked {} queries ({} examples): MRR={:.4} R10_1={:.4}",
        groups.len(),
        scores.len(),
        metrics.mrr,
        metrics.r10_1,
    );

    Ok(metrics)
}

/// N-R@k: fraction of queries whose relevant candidate ranks in the top `k`
/// among the first `n` candidates of the query.
pub fn recall_at(
    groups: &[Range<usize>],
    scores: &[f32],
    labels: &[f32],
    n:      usize,
    k:      usize,
) -> f64 {
    let mut hits  = 0usize;
    let mut total = 0usize;

    for g in groups {
        let pool = g.start..(g.start + n).min(g.end);
        if let Some(rank) = best_relevant_rank(&scores[pool.clone()], &labels[pool]) {
            total += 1;
            if rank < k {
                hits += 1;
            }
        }
    }

    if total > 0 { hits as f64 / total as f64 } else { f64::NAN }
}

/// Zero-based rank of the highest scored relevant candidate.
/// Ties keep file order.
fn best_relevant_rank(scores: &[f32], labels: &[f32]) -> Option<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable, so equal scores keep their original order
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    order.iter().position(|&i| labels[i] > 0.5)
}
