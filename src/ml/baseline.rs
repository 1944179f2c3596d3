// ============================================================
// Layer 5 — Token Overlap Baseline
// ============================================================
// A non-neural RankingModel used as a sanity floor: a candidate
// response scores the share of its tokens that also occur in
// the context.
//
//   context  [12 7 931 4]
//   response [88 12 0 0]   → 1 of 2 real tokens overlap → 0.5
//
// Padding (index 0) is ignored on both sides. There are no
// parameters, so training is a no-op.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::collections::HashSet;

use crate::data::batcher::PairBatch;
use crate::ml::model::RankingModel;

const PAD: i64 = 0;

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapBaseline;

impl<B: Backend> RankingModel<B> for OverlapBaseline {
    fn train_batch(&mut self, _batch: PairBatch<B>) -> Result<f64> {
        // Nothing to learn
        Ok(0.0)
    }

    fn predict(&self, batch: PairBatch<B>) -> Result<Vec<f32>> {
        let [n, context_len]  = batch.context.dims();
        let [_, response_len] = batch.response.dims();

        let context  = int_rows(batch.context)?;
        let response = int_rows(batch.response)?;

        let scores = (0..n)
            .map(|i| {
                let ctx: HashSet<i64> = context[i * context_len..(i + 1) * context_len]
                    .iter()
                    .copied()
                    .filter(|&t| t != PAD)
                    .collect();
                overlap(&ctx, &response[i * response_len..(i + 1) * response_len])
            })
            .collect();

        Ok(scores)
    }
}

fn int_rows<B: Backend>(t: Tensor<B, 2, Int>) -> Result<Vec<i64>> {
    t.into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read token ids back from the batch: {e:?}"))
}

fn overlap(context: &HashSet<i64>, response: &[i64]) -> f32 {
    let real: Vec<i64> = response.iter().copied().filter(|&t| t != PAD).collect();
    if real.is_empty() {
        return 0.0;
    }
    let shared = real.iter().filter(|&&t| context.contains(&t)).count();
    shared as f32 / real.len() as f32
}
