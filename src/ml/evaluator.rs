// ============================================================
// Layer 5 — Split Evaluator
// ============================================================
// Scores every example of a split and turns the scores into
// ranking metrics.
//
// Unlike training, evaluation must see ALL examples, so it walks
// the split sequentially in file order and keeps the final,
// smaller batch. The order matters: candidates of one query are
// grouped by their position in the file.

use anyhow::{bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::PairBatcher, dataset::PairDataset};
use crate::domain::ranking::{evaluate_ranking, RankingMetrics};
use crate::ml::model::RankingModel;

/// Predict a score for every example of `dataset`, in file order.
pub fn predict_all<B: Backend, M: RankingModel<B>>(
    model:      &M,
    dataset:    &PairDataset,
    batcher:    &PairBatcher,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Vec<f32>> {
    if batch_size == 0 {
        bail!("eval batch_size must be at least 1");
    }

    let total      = dataset.sample_count();
    let mut scores = Vec::with_capacity(total);

    for start in (0..total).step_by(batch_size) {
        let items    = dataset.examples(start..start + batch_size);
        let expected = items.len();
        let batch    = Batcher::<B, _, _>::batch(batcher, items, device);

        let batch_scores = model.predict(batch)?;
        if batch_scores.len() != expected {
            bail!(
                "Model returned {} scores for a batch of {} pairs",
                batch_scores.len(),
                expected
            );
        }
        scores.extend(batch_scores);
    }

    Ok(scores)
}

/// Score `dataset` with `model` and compute its ranking metrics.
pub fn evaluate_split<B: Backend, M: RankingModel<B>>(
    model:      &M,
    dataset:    &PairDataset,
    batcher:    &PairBatcher,
    batch_size: usize,
    device:     &B::Device,
) -> Result<RankingMetrics> {
    let scores = predict_all::<B, M>(model, dataset, batcher, batch_size, device)?;
    score_split(&scores, dataset)
}

/// Ranking metrics of precomputed `scores` against `dataset`'s labels.
pub fn score_split(scores: &[f32], dataset: &PairDataset) -> Result<RankingMetrics> {
    evaluate_ranking(scores, &dataset.contexts(), &dataset.labels())
}
