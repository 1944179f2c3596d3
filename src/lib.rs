//! Ubuntu Dialogue Corpus adapter for sentence-pair ranking models.
//!
//! Loads preprocessed snapshots, pads pairs into fixed-shape burn
//! tensors, streams block-shuffled training batches and computes
//! next-utterance ranking metrics (MRR, N-R@k).
//!
//! ```text
//! UbuntuTask ──load_vocab──▶ VocabLoaded ──load_splits──▶ DataLoaded
//!                                                           ├─ fit_model
//!                                                           ├─ eval
//!                                                           └─ res_columns
//! ```

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
