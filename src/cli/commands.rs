// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands, all working on preprocessed snapshots:
//   inspect   — shape statistics of one split
//   evaluate  — ranking metrics of externally produced scores
//   baseline  — ranking metrics of the token-overlap baseline
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report size, label balance and truncation of one split
    Inspect(InspectArgs),

    /// Score splits with per-split score files written by a model
    Evaluate(EvaluateArgs),

    /// Score splits with the token-overlap baseline
    Baseline(SplitArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Vocabulary snapshot (.json or .bin)
    #[arg(long)]
    pub vocab: PathBuf,

    /// Split snapshot to inspect
    #[arg(long)]
    pub set_file: PathBuf,
}

/// The vocabulary plus the three splits of the corpus.
/// Validation and test are optional.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Vocabulary snapshot (.json or .bin)
    #[arg(long)]
    pub vocab: PathBuf,

    /// Training split snapshot
    #[arg(long)]
    pub train: PathBuf,

    /// Validation split snapshot
    #[arg(long)]
    pub val: Option<PathBuf>,

    /// Test split snapshot
    #[arg(long)]
    pub test: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub splits: SplitArgs,

    /// Directory holding `<split file stem>.scores.json`, one JSON
    /// array of scores per loaded split, in file order
    #[arg(long)]
    pub scores_dir: PathBuf,
}
