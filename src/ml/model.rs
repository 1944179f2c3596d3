// ============================================================
// Layer 5 — Ranking Model Seam
// ============================================================
// The neural model itself lives in the training harness, not
// here. This trait is the contract between the two:
//
//   train_batch — one optimisation step on a padded batch,
//                 returning the batch loss
//   predict     — one relevance score per row of the batch,
//                 higher = more likely the true response
//
// Anything that implements it can be fitted with
// `DataLoaded::fit_model` and scored with `DataLoaded::eval`.

use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::PairBatch;

pub trait RankingModel<B: Backend> {
    /// Run one training step; returns the loss of the batch.
    fn train_batch(&mut self, batch: PairBatch<B>) -> Result<f64>;

    /// Score every pair in the batch, in row order.
    fn predict(&self, batch: PairBatch<B>) -> Result<Vec<f32>>;
}
