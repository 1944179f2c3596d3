// ============================================================
// Layer 5 — Fit Loop
// ============================================================
// Drives an external RankingModel over the block-shuffled batch
// stream of the training split.
//
// Epochs here are FRACTIONAL: the Ubuntu train set holds 1M
// pairs, so one "epoch" is only `epoch_fract` of it:
//
//   steps_per_epoch = max(1, floor(N * epoch_fract / batch_size))
//
// All epochs pull from ONE unbounded stream, so a quarter-epoch
// continues where the previous one stopped instead of replaying
// the same first blocks.
//
// After every epoch the validation split (if loaded) is scored
// and the row goes to metrics.csv.

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

use crate::data::{batcher::PairBatcher, dataset::PairDataset, sampler::sample_pairs};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::{evaluator::evaluate_split, model::RankingModel};

/// Knobs of one fit run. `batch_size` shapes the stream; everything
/// else is carried through to the loop unchanged.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub batch_size:      usize,
    pub epochs:          usize,
    pub epoch_fract:     f64,
    pub eval_batch_size: usize,
    /// Fixed seed for the block order; entropy when None
    pub seed:            Option<u64>,
    /// Directory for metrics.csv; no CSV when None
    pub metrics_dir:     Option<PathBuf>,
}

impl FitOptions {
    /// Batches drawn per (fractional) epoch from a training set of `n` pairs
    pub fn steps_per_epoch(&self, n: usize) -> usize {
        let steps = (n as f64 * self.epoch_fract / self.batch_size as f64).floor() as usize;
        steps.max(1)
    }
}

/// Per-epoch record of a finished fit
#[derive(Debug, Clone, Default)]
pub struct FitHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl FitHistory {
    /// Epoch with the best validation MRR, if any was measured
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        let mut best: Option<&EpochMetrics> = None;
        for m in &self.epochs {
            let best_mrr = best.map_or(f64::NAN, |b| b.val_mrr());
            if m.is_improvement(best_mrr) {
                best = Some(m);
            }
        }
        best
    }
}

pub fn run_fit<B: Backend, M: RankingModel<B>>(
    model:   &mut M,
    train:   &PairDataset,
    val:     Option<&PairDataset>,
    batcher: &PairBatcher,
    opts:    &FitOptions,
    device:  &B::Device,
) -> Result<FitHistory> {
    let rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };

    let mut stream = sample_pairs::<B, _>(
        train,
        batcher.clone(),
        opts.batch_size,
        false,
        rng,
        device.clone(),
    )?;
    if stream.block_count() == 0 {
        bail!(
            "Training set of {} pairs is smaller than one batch of {}",
            train.sample_count(),
            opts.batch_size
        );
    }

    let steps  = opts.steps_per_epoch(train.sample_count());
    let logger = opts.metrics_dir.as_ref().map(|dir| MetricsLogger::new(dir)).transpose()?;
    tracing::info!(
        "Fitting for {} epochs × {} steps (batch_size={}, {} blocks per pass)",
        opts.epochs,
        steps,
        opts.batch_size,
        stream.block_count()
    );

    let mut history = FitHistory::default();

    for epoch in 1..=opts.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        for step in 0..steps {
            let batch = stream
                .next()
                .context("Training stream ended unexpectedly")?;
            let loss = model.train_batch(batch)
                .with_context(|| format!("Training step {step} of epoch {epoch} failed"))?;
            loss_sum += loss;
        }
        let train_loss = loss_sum / steps as f64;

        // ── Validation phase ──────────────────────────────────────────────────
        let validation = match val {
            Some(ds) => Some(evaluate_split::<B, M>(
                model,
                ds,
                batcher,
                opts.eval_batch_size,
                device,
            )?),
            None => None,
        };

        let metrics = EpochMetrics::new(epoch, steps, train_loss, validation);
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_mrr={:.4}",
            epoch,
            opts.epochs,
            train_loss,
            metrics.val_mrr(),
        );

        if let Some(logger) = &logger {
            logger.log(&metrics)?;
        }
        history.epochs.push(metrics);
    }

    tracing::info!("Fit complete");
    Ok(history)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::PairBatch;
    use crate::domain::example::PairExample;
    use burn::backend::NdArray;
    use std::collections::HashSet;

    type TestBackend = NdArray;

    /// Remembers the first context token of every training row it sees.
    #[derive(Default)]
    struct Recorder {
        rows:    Vec<i64>,
        batches: usize,
    }

    impl RankingModel<TestBackend> for Recorder {
        fn train_batch(&mut self, batch: PairBatch<TestBackend>) -> Result<f64> {
            let [n, len] = batch.context.dims();
            let ids: Vec<i64> = batch.context.into_data().convert::<i64>().to_vec().unwrap();
            self.rows.extend((0..n).map(|i| ids[i * len]));
            self.batches += 1;
            Ok(self.batches as f64)
        }

        fn predict(&self, batch: PairBatch<TestBackend>) -> Result<Vec<f32>> {
            let [n, len] = batch.response.dims();
            let ids: Vec<i64> = batch.response.into_data().convert::<i64>().to_vec().unwrap();
            Ok((0..n).map(|i| ids[i * len] as f32).collect())
        }
    }

    fn dataset(n: u32) -> PairDataset {
        PairDataset::new(
            (0..n)
                .map(|i| PairExample::new(vec![i + 1], vec![i % 3 + 1], vec![], vec![], (i % 3 == 2) as u8 as f32))
                .collect(),
        )
    }

    fn options(batch_size: usize, epochs: usize, epoch_fract: f64) -> FitOptions {
        FitOptions {
            batch_size,
            epochs,
            epoch_fract,
            eval_batch_size: 4,
            seed: Some(5),
            metrics_dir: None,
        }
    }

    #[test]
    fn test_steps_per_epoch() {
        assert_eq!(options(192, 16, 0.25).steps_per_epoch(1_000_000), 1302);
        // Never zero, even for tiny fractions
        assert_eq!(options(10, 1, 0.01).steps_per_epoch(20), 1);
    }

    #[test]
    fn test_fractional_epochs_continue_the_stream() {
        // 8 pairs, batch 2 → 4 blocks; quarter epochs → 1 step each
        let mut model = Recorder::default();
        let train     = dataset(8);
        let batcher   = PairBatcher::new(2, 1, 1);
        let history   = run_fit::<TestBackend, _>(
            &mut model, &train, None, &batcher, &options(2, 4, 0.25), &Default::default(),
        ).unwrap();

        assert_eq!(history.epochs.len(), 4);
        assert!(history.epochs.iter().all(|e| e.steps == 1));
        // Four steps = one full pass over four distinct blocks
        let seen: HashSet<i64> = model.rows.iter().copied().collect();
        assert_eq!(seen.len(), 8);
        // Mean loss of epoch 3 is the 3rd batch counter
        assert_eq!(history.epochs[2].train_loss, 3.0);
    }

    #[test]
    fn test_validation_after_each_epoch_and_csv() {
        let dir       = tempfile::tempdir().unwrap();
        let mut model = Recorder::default();
        let train     = dataset(6);
        let val       = dataset(9);
        let batcher   = PairBatcher::new(2, 1, 1);
        let mut opts  = options(3, 2, 1.0);
        opts.metrics_dir = Some(dir.path().to_path_buf());

        let history = run_fit::<TestBackend, _>(
            &mut model, &train, Some(&val), &batcher, &opts, &Default::default(),
        ).unwrap();

        assert!(history.epochs.iter().all(|e| e.validation.is_some()));
        assert!(history.best_epoch().is_some());

        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_training_set_smaller_than_a_batch_fails() {
        let mut model = Recorder::default();
        let res = run_fit::<TestBackend, _>(
            &mut model, &dataset(3), None, &PairBatcher::new(2, 1, 1), &options(4, 1, 1.0), &Default::default(),
        );
        assert!(res.is_err());
        assert_eq!(model.batches, 0);
    }
}
