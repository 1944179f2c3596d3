// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// The model itself belongs to the training harness. This layer
// only defines how the task talks to it and drives it:
//
//   model.rs     — RankingModel trait: train_batch / predict
//   trainer.rs   — fractional-epoch fit loop with per-epoch
//                  validation and metrics logging
//   evaluator.rs — scores a whole split in file order and
//                  computes its ranking metrics
//   baseline.rs  — token-overlap scorer, a floor to compare
//                  real models against
//
// Reference: Burn Book §5 (Training)

pub mod model;

pub mod trainer;

pub mod evaluator;

pub mod baseline;
