// ============================================================
// Layer 4 — Sequence Padding
// ============================================================
// Turns ragged per-example sequences into dense, fixed-shape
// tensor data.
//
// Policy (both functions):
//   truncating = 'pre'   → a long sequence loses its BEGINNING,
//                          keeping the most recent tokens
//   padding    = 'post'  → a short sequence is left-aligned and
//                          zero-filled on the right
//
// For dialogue contexts the latest turns matter most, which is
// why the beginning is what gets cut.
//
//   max_len = 4
//   [1 2 3 4 5 6] → [3 4 5 6]
//   [7 8]         → [7 8 0 0]
//   []            → [0 0 0 0]
//
// The element type is kept: u32 token ids stay u32, f32
// feature flags stay f32.

use burn::tensor::{Element, TensorData};

/// Pad / truncate token-index sequences to shape `[seqs.len(), max_len]`.
pub fn pad_sequences<T: Element>(seqs: &[Vec<T>], max_len: usize) -> TensorData {
    let mut out = vec![T::default(); seqs.len() * max_len];

    if max_len > 0 {
        for (row, seq) in out.chunks_mut(max_len).zip(seqs) {
            let kept = tail(seq, max_len);
            row[..kept.len()].copy_from_slice(kept);
        }
    }

    TensorData::new(out, [seqs.len(), max_len])
}

/// Pad / truncate per-token feature vectors to shape
/// `[seqs.len(), max_len, feature_dim]`.
///
/// Token vectors longer than `feature_dim` are cut, shorter ones are
/// zero-filled, so ragged feature rows never panic.
pub fn pad_3d_sequence<T: Element>(
    seqs:        &[Vec<Vec<T>>],
    max_len:     usize,
    feature_dim: usize,
) -> TensorData {
    let row_len = max_len * feature_dim;
    let mut out = vec![T::default(); seqs.len() * row_len];

    if row_len > 0 {
        for (row, seq) in out.chunks_mut(row_len).zip(seqs) {
            for (slot, token) in row.chunks_mut(feature_dim).zip(tail(seq, max_len)) {
                let n = token.len().min(feature_dim);
                slot[..n].copy_from_slice(&token[..n]);
            }
        }
    }

    TensorData::new(out, [seqs.len(), max_len, feature_dim])
}

/// The last `max_len` items of `seq` (all of it when shorter).
fn tail<T>(seq: &[T], max_len: usize) -> &[T] {
    &seq[seq.len().saturating_sub(max_len)..]
}
