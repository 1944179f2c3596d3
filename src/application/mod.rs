// ============================================================
// Layer 2 — Application
// ============================================================
// Coordinates the other layers into the Ubuntu task:
// configuration, loading, fitting, evaluation, reporting.
// No padding or metric math lives here.

/// Fixed task configuration and `key=value` overrides
pub mod config;

/// Lifecycle state machine: vocab → splits → fit / eval
pub mod task;
