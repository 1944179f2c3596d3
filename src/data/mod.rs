// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the preprocessed snapshot files and the
// padded tensor batches a model consumes.
//
// The pipeline flows in this order:
//
//   set / vocab snapshots (.json, .bin)
//       │
//       ▼
//   loader            → decodes the five parallel arrays
//       │
//       ▼
//   PairDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   sampler           → fixed blocks, block order shuffled per pass
//       │
//       ▼
//   PairBatcher       → pads each field (padding.rs) into tensors
//       │
//       ▼
//   PairBatch         → handed to the model's training step
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads set and vocabulary snapshots (serde_json / bincode)
pub mod loader;

/// Pre-truncation, post-padding of index and feature sequences
pub mod padding;

/// Implements Burn's Dataset trait for (context, response) pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;

/// Block-shuffled, lazily padded training stream
pub mod sampler;
