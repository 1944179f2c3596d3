// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch training progress to a CSV file.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - steps:      batches consumed in this epoch
//   - train_loss: mean loss reported by the model
//   - val_mrr:    Mean Reciprocal Rank on the validation split
//   - val_r2_1:   1 in 2 Recall@1 on the validation split
//   - val_r10_1:  1 in 10 Recall@1
//   - val_r10_2:  1 in 10 Recall@2
//   - val_r10_5:  1 in 10 Recall@5
//
// Validation columns are NaN when no validation split is loaded.
//
// Output file: <metrics_dir>/metrics.csv
//
// Example CSV output:
//   epoch,steps,train_loss,val_mrr,val_r2_1,val_r10_1,val_r10_2,val_r10_5
//   1,1302,0.612300,0.581200,0.801000,0.431000,0.592000,0.842000
//   2,1302,0.544100,0.603400,0.815000,0.458000,0.617000,0.858000

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::ranking::RankingMetrics;

const CSV_HEADER: &str = "epoch,steps,train_loss,val_mrr,val_r2_1,val_r10_1,val_r10_2,val_r10_5";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Number of batches the model was trained on this epoch
    pub steps: usize,

    /// Mean of the per-batch losses returned by the model
    pub train_loss: f64,

    /// Ranking quality on the validation split, if one is loaded
    pub validation: Option<RankingMetrics>,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        steps:      usize,
        train_loss: f64,
        validation: Option<RankingMetrics>,
    ) -> Self {
        Self { epoch, steps, train_loss, validation }
    }

    /// Validation MRR, NaN without a validation split
    pub fn val_mrr(&self) -> f64 {
        self.validation.map_or(f64::NAN, |m| m.mrr)
    }

    /// Returns true if validation MRR beat the previous best.
    /// Higher MRR is better; NaN never counts as an improvement.
    pub fn is_improvement(&self, best_val_mrr: f64) -> bool {
        let mrr = self.val_mrr();
        !mrr.is_nan() && (best_val_mrr.is_nan() || mrr > best_val_mrr)
    }

    fn csv_row(&self) -> String {
        let v = self.validation;
        let col = |f: fn(&RankingMetrics) -> f64| v.as_ref().map_or(f64::NAN, f);
        format!(
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            self.epoch,
            self.steps,
            self.train_loss,
            col(|m| m.mrr),
            col(|m| m.r2_1),
            col(|m| m.r10_1),
            col(|m| m.r10_2),
            col(|m| m.r10_5),
        )
    }
}

/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger in `dir`.
    /// Writes the CSV header only if the file doesn't exist yet,
    /// so consecutive runs append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_mrr={:.4}",
            m.epoch,
            m.train_loss,
            m.val_mrr(),
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(mrr: f64) -> RankingMetrics {
        RankingMetrics { mrr, r2_1: 0.8, r10_1: 0.4, r10_2: 0.6, r10_5: 0.9, queries: 10 }
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 10, 0.5, Some(ranking(0.6)));
        assert!(m.is_improvement(0.5));
        assert!(!m.is_improvement(0.7));
        // First epoch: nothing to beat yet
        assert!(m.is_improvement(f64::NAN));

        let no_val = EpochMetrics::new(1, 10, 0.5, None);
        assert!(!no_val.is_improvement(0.1));
    }

    #[test]
    fn test_csv_appends_rows_under_one_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 4, 0.25, Some(ranking(0.5)))).unwrap();

        // A second logger on the same directory must not repeat the header
        let again = MetricsLogger::new(dir.path()).unwrap();
        again.log(&EpochMetrics::new(2, 4, 0.125, None)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,4,0.250000,0.500000,0.800000,0.400000,0.600000,0.900000");
        assert!(lines[2].starts_with("2,4,0.125000,NaN"));
    }
}
