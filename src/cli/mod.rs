// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
// This layer only routes and prints; it never computes metrics.
//
// Every command accepts repeated `--set key=value` overrides of
// the task configuration, e.g.
//
//   ubuntu-anssel --set batch_size=128 --set s0pad=200 inspect ...

pub mod commands;

use anyhow::{Context, Result};
use burn::backend::NdArray;
use clap::Parser;
use std::path::{Path, PathBuf};

use commands::{Commands, EvaluateArgs, InspectArgs, SplitArgs};
use crate::application::{
    config::TaskConfig,
    task::{DataLoaded, EvalReport, UbuntuTask},
};
use crate::data::loader::load_scores;
use crate::ml::baseline::OverlapBaseline;

/// CPU backend; the CLI only pads batches and runs the baseline
type CliBackend = NdArray;

#[derive(Parser, Debug)]
#[command(
    name = "ubuntu-anssel",
    version,
    about = "Ubuntu Dialogue Corpus adapter: inspect snapshots and compute ranking metrics."
)]
pub struct Cli {
    /// Task configuration override, `key=value` (repeatable)
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = TaskConfig::default().with_overrides(self.overrides.as_slice())?;
        tracing::debug!("Task config: {:?}", config);

        match self.command {
            Commands::Inspect(args)  => run_inspect(config, args),
            Commands::Evaluate(args) => run_evaluate(config, args),
            Commands::Baseline(args) => run_baseline(config, args),
        }
    }
}

fn run_inspect(config: TaskConfig, args: InspectArgs) -> Result<()> {
    let task = UbuntuTask::new(config).load_vocab(&args.vocab)?;
    let set  = task.load_set(&args.set_file)?;
    let cfg  = task.config();

    let stats = set.dataset.stats(cfg.s0pad, cfg.s1pad, cfg.batch_size);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn run_evaluate(config: TaskConfig, args: EvaluateArgs) -> Result<()> {
    let task = load(config, &args.splits)?;
    let dir  = args.scores_dir;

    let report = task.eval_with(|set| {
        let path = scores_path(&dir, Path::new(&set.name))?;
        load_scores(&path)
    })?;

    print_report(&task, &report);
    Ok(())
}

fn run_baseline(config: TaskConfig, args: SplitArgs) -> Result<()> {
    let task   = load(config, &args)?;
    let device = Default::default();
    let report = task.eval::<CliBackend, _>(&OverlapBaseline, &device)?;

    print_report(&task, &report);
    Ok(())
}

fn load(config: TaskConfig, args: &SplitArgs) -> Result<DataLoaded> {
    UbuntuTask::new(config)
        .load_vocab(&args.vocab)?
        .load_splits(&args.train, args.val.as_deref(), args.test.as_deref())
}

/// `<dir>/<stem of the split file>.scores.json`
fn scores_path(dir: &Path, split: &Path) -> Result<PathBuf> {
    let stem = split
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Cannot derive a score file name from '{}'", split.display()))?;
    Ok(dir.join(format!("{stem}.scores.json")))
}

fn print_report(task: &DataLoaded, report: &EvalReport) {
    for r in [&report.train, &report.val, &report.test].into_iter().flatten() {
        let m = &r.metrics;
        println!(
            "{}  MRR {:.6}  2-R@1 {:.6}  10-R@1 {:.6}  10-R@2 {:.6}  10-R@5 {:.6}",
            r.name, m.mrr, m.r2_1, m.r10_1, m.r10_2, m.r10_5
        );
    }
    println!("\n|{}|", task.res_columns(&report.by_name(), ' '));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_path_uses_the_split_stem() {
        let p = scores_path(Path::new("out"), Path::new("data/anssel/ubuntu/v2-valset.bin")).unwrap();
        assert_eq!(p, PathBuf::from("out/v2-valset.scores.json"));
    }

    #[test]
    fn test_global_overrides_parse() {
        let cli = Cli::try_parse_from([
            "ubuntu-anssel", "baseline",
            "--vocab", "v.json", "--train", "t.json",
            "--set", "batch_size=64",
        ])
        .unwrap();
        assert_eq!(cli.overrides, vec!["batch_size=64"]);
        assert!(matches!(cli.command, Commands::Baseline(_)));
    }
}
