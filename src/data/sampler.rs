// ============================================================
// Layer 4 — Block-Shuffled Batch Sampler
// ============================================================
// Produces the training stream of padded batches.
//
// How sampling works here:
//   The dataset is cut ONCE into floor(N / batch_size)
//   contiguous blocks:
//
//     N = 5, batch_size = 2
//     [0 1] [2 3] (4)        ← sample 4 never appears
//
//   Every pass ("epoch") shuffles the ORDER of the blocks, not
//   the samples inside them. A block always holds the same
//   samples; only its position in the stream changes.
//
//   Samples are never swapped between blocks, and the tail that
//   does not fill a whole block is dropped on every pass. Both
//   are known simplifications of the sampling policy and are
//   kept as they are.
//
// The stream is lazy: each block is padded into a batch only
// when the consumer pulls it. Without `once` it never ends; with
// `once` it stops after exactly one shuffled pass.
//
// Reference: Rust Book §13 (Iterators)
//            rand crate documentation (SliceRandom)

use anyhow::{bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rand::{seq::SliceRandom, Rng};
use std::ops::Range;

use crate::data::{
    batcher::{PairBatch, PairBatcher},
    dataset::PairDataset,
};

// ─── BlockSampler ─────────────────────────────────────────────────────────────
/// Iterator over the index ranges of fixed, contiguous blocks,
/// reshuffled at the start of every pass.
pub struct BlockSampler<R: Rng> {
    batch_size: usize,
    /// Block ids in presentation order for the current pass
    order:      Vec<usize>,
    cursor:     usize,
    once:       bool,
    rng:        R,
}

impl<R: Rng> BlockSampler<R> {
    /// Partition `len` samples into blocks of `batch_size`.
    pub fn new(len: usize, batch_size: usize, once: bool, mut rng: R) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch_size must be at least 1");
        }

        let mut order: Vec<usize> = (0..len / batch_size).collect();
        order.shuffle(&mut rng);

        let dropped = len % batch_size;
        if dropped > 0 {
            tracing::debug!(
                "Dropping {} trailing samples that do not fill a batch of {}",
                dropped,
                batch_size
            );
        }
        if order.is_empty() {
            tracing::warn!(
                "Dataset of {} samples is smaller than one batch of {}; nothing to sample",
                len,
                batch_size
            );
        }

        Ok(Self { batch_size, order, cursor: 0, once, rng })
    }

    /// Number of blocks in one pass
    pub fn block_count(&self) -> usize {
        self.order.len()
    }
}

impl<R: Rng> Iterator for BlockSampler<R> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.order.is_empty() {
            return None;
        }

        if self.cursor == self.order.len() {
            if self.once {
                return None;
            }
            // Start the next pass in a fresh order
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }

        let block = self.order[self.cursor];
        self.cursor += 1;
        Some(block * self.batch_size..(block + 1) * self.batch_size)
    }
}

// ─── PairSampler ──────────────────────────────────────────────────────────────
/// Lazy stream of padded batches over a borrowed dataset.
/// Single owner: the consumer drives it by pulling.
pub struct PairSampler<'a, B: Backend, R: Rng> {
    dataset: &'a PairDataset,
    batcher: PairBatcher,
    device:  B::Device,
    blocks:  BlockSampler<R>,
}

impl<'a, B: Backend, R: Rng> PairSampler<'a, B, R> {
    pub fn block_count(&self) -> usize {
        self.blocks.block_count()
    }
}

impl<'a, B: Backend, R: Rng> Iterator for PairSampler<'a, B, R> {
    type Item = PairBatch<B>;

    fn next(&mut self) -> Option<PairBatch<B>> {
        let range = self.blocks.next()?;
        let items = self.dataset.examples(range);
        // Padded just before emission, one batch at a time
        Some(Batcher::<B, _, _>::batch(&self.batcher, items, &self.device))
    }
}

/// Build the batch stream for `dataset`.
///
/// # Arguments
/// * `batcher`    - Padding lengths for both sides of the pair
/// * `batch_size` - Samples per batch; the remainder is dropped
/// * `once`       - Stop after one shuffled pass instead of cycling forever
/// * `rng`        - Source of the block order (seed it for reproducibility)
pub fn sample_pairs<'a, B: Backend, R: Rng>(
    dataset:    &'a PairDataset,
    batcher:    PairBatcher,
    batch_size: usize,
    once:       bool,
    rng:        R,
    device:     B::Device,
) -> Result<PairSampler<'a, B, R>> {
    let blocks = BlockSampler::new(dataset.sample_count(), batch_size, once, rng)?;
    Ok(PairSampler { dataset, batcher, device, blocks })
}
