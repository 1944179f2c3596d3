// ============================================================
// Layer 4 — Pair Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<PairExample>
// into a strongly typed batch of tensors.
//
// Every field of the batch is padded on its own, with the
// policy from `padding.rs` (drop the beginning, pad the end):
//
//   context           [n, context_len]               Int
//   response          [n, response_len]              Int
//   context_features  [n, context_len, feature_dim]  Float
//   response_features [n, response_len, feature_dim] Float
//   label             [n]                            Float
//
// Padding happens here, per batch, right before the tensors
// are built, so the full padded dataset never sits in memory.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::padding::{pad_3d_sequence, pad_sequences};
use crate::domain::example::PairExample;

// ─── PairBatch ────────────────────────────────────────────────────────────────
/// A padded mini-batch of (context, response) pairs.
/// All tensors share `n` as their first dimension.
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Context token ids (s0) — shape: [n, context_len]
    pub context: Tensor<B, 2, Int>,

    /// Candidate response token ids (s1) — shape: [n, response_len]
    pub response: Tensor<B, 2, Int>,

    /// Context feature flags (f0) — shape: [n, context_len, feature_dim]
    pub context_features: Tensor<B, 3>,

    /// Response feature flags (f1) — shape: [n, response_len, feature_dim]
    pub response_features: Tensor<B, 3>,

    /// Binary relevance labels — shape: [n]
    pub label: Tensor<B, 1>,
}

impl<B: Backend> PairBatch<B> {
    /// Number of pairs in the batch
    pub fn len(&self) -> usize {
        self.label.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── PairBatcher ──────────────────────────────────────────────────────────────
/// Fixed padding lengths for both sides of the pair plus the
/// width of the per-token feature vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairBatcher {
    pub context_len:  usize,
    pub response_len: usize,
    pub feature_dim:  usize,
}

impl PairBatcher {
    pub fn new(context_len: usize, response_len: usize, feature_dim: usize) -> Self {
        Self { context_len, response_len, feature_dim }
    }
}

impl<B: Backend> Batcher<B, PairExample, PairBatch<B>> for PairBatcher {
    fn batch(&self, items: Vec<PairExample>, device: &B::Device) -> PairBatch<B> {
        let n = items.len();

        // Split the records back into per-field columns so each
        // column can be padded as one dense block
        let mut contexts          = Vec::with_capacity(n);
        let mut responses         = Vec::with_capacity(n);
        let mut context_features  = Vec::with_capacity(n);
        let mut response_features = Vec::with_capacity(n);
        let mut labels            = Vec::with_capacity(n);

        for item in items {
            contexts.push(item.context);
            responses.push(item.response);
            context_features.push(item.context_features);
            response_features.push(item.response_features);
            labels.push(item.label);
        }

        let context = pad_sequences(&contexts, self.context_len)
            .convert::<B::IntElem>();
        let response = pad_sequences(&responses, self.response_len)
            .convert::<B::IntElem>();
        let context_features = pad_3d_sequence(&context_features, self.context_len, self.feature_dim)
            .convert::<B::FloatElem>();
        let response_features = pad_3d_sequence(&response_features, self.response_len, self.feature_dim)
            .convert::<B::FloatElem>();
        let label = TensorData::new(labels, [n]).convert::<B::FloatElem>();

        PairBatch {
            context:           Tensor::from_data(context, device),
            response:          Tensor::from_data(response, device),
            context_features:  Tensor::from_data(context_features, device),
            response_features: Tensor::from_data(response_features, device),
            label:             Tensor::from_data(label, device),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn example(context: Vec<u32>, response: Vec<u32>, label: f32) -> PairExample {
        let cf = context.iter().map(|&t| vec![t as f32, 1.0]).collect();
        let rf = response.iter().map(|&t| vec![t as f32, 0.0]).collect();
        PairExample::new(context, response, cf, rf, label)
    }

    fn run(batcher: &PairBatcher, items: Vec<PairExample>) -> PairBatch<TestBackend> {
        let device = Default::default();
        Batcher::<TestBackend, _, _>::batch(batcher, items, &device)
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = PairBatcher::new(4, 3, 2);
        let batch   = run(
            &batcher,
            vec![example(vec![1, 2], vec![3], 1.0), example(vec![4; 9], vec![5; 9], 0.0)],
        );

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.context.dims(), [2, 4]);
        assert_eq!(batch.response.dims(), [2, 3]);
        assert_eq!(batch.context_features.dims(), [2, 4, 2]);
        assert_eq!(batch.response_features.dims(), [2, 3, 2]);
    }

    #[test]
    fn test_each_field_padded_independently() {
        let batcher = PairBatcher::new(3, 2, 2);
        let batch   = run(
            &batcher,
            vec![
                example(vec![1, 2, 3, 4, 5], vec![6], 1.0),
                example(vec![7], vec![8, 9, 10], 0.0),
            ],
        );

        let context: Vec<i64> = batch.context.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(context, vec![3, 4, 5, 7, 0, 0]);

        let response: Vec<i64> = batch.response.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(response, vec![6, 0, 9, 10]);

        // Features follow their own tokens, truncated the same way
        let cf: Vec<f32> = batch.context_features.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(cf, vec![3.0, 1.0, 4.0, 1.0, 5.0, 1.0, 7.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

        let label: Vec<f32> = batch.label.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(label, vec![1.0, 0.0]);
    }
}
