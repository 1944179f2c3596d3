// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and pure functions — no Burn types, no I/O.
//
//   example.rs — one labelled (context, response) pair
//   vocab.rs   — the shared token → index mapping
//   ranking.rs — MRR and N-R@k over grouped candidates

pub mod example;

pub mod vocab;

pub mod ranking;
