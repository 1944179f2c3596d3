// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
//   metrics.rs — per-epoch training metrics appended to a CSV
//                file for plotting learning curves

/// Training metrics CSV logger
pub mod metrics;
