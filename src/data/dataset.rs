use anyhow::{bail, Result};
use burn::data::dataset::Dataset;
use serde::Serialize;
use std::ops::Range;

use crate::domain::example::PairExample;

/// All examples of one split, in file order, fully in memory.
#[derive(Debug, Clone, Default)]
pub struct PairDataset {
    examples: Vec<PairExample>,
}

impl PairDataset {
    pub fn new(examples: Vec<PairExample>) -> Self {
        Self { examples }
    }

    /// Assemble examples from the five parallel arrays of a set snapshot.
    /// Every array must have one entry per example.
    pub fn from_arrays(
        contexts:          Vec<Vec<u32>>,
        responses:         Vec<Vec<u32>>,
        context_features:  Vec<Vec<Vec<f32>>>,
        response_features: Vec<Vec<Vec<f32>>>,
        labels:            Vec<f32>,
    ) -> Result<Self> {
        let n = contexts.len();
        let lengths = [
            responses.len(),
            context_features.len(),
            response_features.len(),
            labels.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            bail!(
                "Parallel arrays disagree on example count: \
                 contexts={}, responses={}, context_features={}, response_features={}, labels={}",
                n, lengths[0], lengths[1], lengths[2], lengths[3]
            );
        }

        let examples = contexts
            .into_iter()
            .zip(responses)
            .zip(context_features)
            .zip(response_features)
            .zip(labels)
            .map(|((((c, r), cf), rf), y)| PairExample::new(c, r, cf, rf, y))
            .collect();

        Ok(Self { examples })
    }

    /// Borrow the examples in `range`; out-of-range ends are clamped.
    pub fn slice(&self, range: Range<usize>) -> &[PairExample] {
        let end   = range.end.min(self.examples.len());
        let start = range.start.min(end);
        &self.examples[start..end]
    }

    /// Owned copies of the examples in `range`, ready for a batcher.
    pub fn examples(&self, range: Range<usize>) -> Vec<PairExample> {
        self.slice(range).to_vec()
    }

    pub fn sample_count(&self) -> usize { self.examples.len() }

    pub fn as_slice(&self) -> &[PairExample] {
        &self.examples
    }

    pub fn labels(&self) -> Vec<f32> {
        self.examples.iter().map(|e| e.label).collect()
    }

    /// Context sequences, used to group candidates into queries
    pub fn contexts(&self) -> Vec<&[u32]> {
        self.examples.iter().map(|e| e.context.as_slice()).collect()
    }

    pub fn positive_count(&self) -> usize {
        self.examples.iter().filter(|e| e.is_relevant()).count()
    }

    /// Largest token index used on either side, if any token exists
    pub fn max_token(&self) -> Option<u32> {
        self.examples
            .iter()
            .flat_map(|e| e.context.iter().chain(&e.response))
            .copied()
            .max()
    }

    /// Shape summary of the split under the given padding and batch size
    pub fn stats(&self, context_len: usize, response_len: usize, batch_size: usize) -> SetStats {
        let n = self.examples.len();
        let mean = |f: fn(&PairExample) -> usize| {
            if n == 0 { 0.0 } else { self.examples.iter().map(f).sum::<usize>() as f64 / n as f64 }
        };

        SetStats {
            pairs:               n,
            relevant:            self.positive_count(),
            blocks:              if batch_size > 0 { n / batch_size } else { 0 },
            dropped:             if batch_size > 0 { n % batch_size } else { n },
            truncated_contexts:  self.examples.iter().filter(|e| e.context.len() > context_len).count(),
            truncated_responses: self.examples.iter().filter(|e| e.response.len() > response_len).count(),
            mean_context_len:    mean(|e| e.context.len()),
            mean_response_len:   mean(|e| e.response.len()),
        }
    }
}

/// Summary printed by `inspect`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetStats {
    pub pairs:               usize,
    pub relevant:            usize,
    /// Full training blocks per pass
    pub blocks:              usize,
    /// Trailing pairs no training batch will ever contain
    pub dropped:             usize,
    pub truncated_contexts:  usize,
    pub truncated_responses: usize,
    pub mean_context_len:    f64,
    pub mean_response_len:   f64,
}

impl Dataset<PairExample> for PairDataset {
    fn get(&self, index: usize) -> Option<PairExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrays(n: usize) -> PairDataset {
        PairDataset::from_arrays(
            (0..n as u32).map(|i| vec![i + 1]).collect(),
            (0..n as u32).map(|i| vec![i + 100]).collect(),
            vec![vec![vec![1.0]]; n],
            vec![vec![vec![0.0]]; n],
            (0..n).map(|i| (i % 2) as f32).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_assembles_parallel_arrays() {
        let ds = arrays(3);
        assert_eq!(ds.len(), 3);
        let second = ds.get(1).unwrap();
        assert_eq!(second.context, vec![2]);
        assert_eq!(second.response, vec![101]);
        assert_eq!(second.label, 1.0);
        assert_eq!(ds.positive_count(), 1);
    }

    #[test]
    fn test_mismatched_arrays_are_rejected() {
        let res = PairDataset::from_arrays(
            vec![vec![1], vec![2]],
            vec![vec![3]],
            vec![vec![], vec![]],
            vec![vec![], vec![]],
            vec![1.0, 0.0],
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_slice_clamps_to_bounds() {
        let ds = arrays(5);
        assert_eq!(ds.slice(2..4).len(), 2);
        assert_eq!(ds.slice(4..10).len(), 1);
        assert!(ds.slice(7..9).is_empty());
        assert_eq!(ds.examples(0..2)[1].context, vec![2]);
    }

    #[test]
    fn test_stats() {
        let ds = PairDataset::new(vec![
            PairExample::new(vec![1; 6], vec![2], vec![], vec![], 1.0),
            PairExample::new(vec![1; 2], vec![2; 5], vec![], vec![], 0.0),
            PairExample::new(vec![9], vec![2], vec![], vec![], 0.0),
        ]);
        let s = ds.stats(4, 4, 2);
        assert_eq!(s.pairs, 3);
        assert_eq!(s.relevant, 1);
        assert_eq!((s.blocks, s.dropped), (1, 1));
        assert_eq!((s.truncated_contexts, s.truncated_responses), (1, 1));
        assert_eq!(s.mean_context_len, 3.0);
        assert_eq!(ds.max_token(), Some(9));
    }
}
