// ============================================================
// Layer 2 — Task Configuration
// ============================================================
// Fixed training setup the Ubuntu task hands to the harness,
// plus the padding lengths every batch is shaped with.
//
// Defaults:
//   loss         binary_crossentropy
//   nb_epoch     16
//   batch_size   192   (lower it on out-of-memory, raise it
//                       for small models to speed things up)
//   epoch_fract  1/4   (one "epoch" = a quarter of the 1M pairs)
//   s0pad/s1pad  160 tokens for context and response
//   flags_dim    4 feature flags per token
//
// Overrides arrive as `key=value` strings (the harness passes
// e.g. `batch_size=128`). They are applied through a JSON
// round-trip so every value gets the same type checking as a
// config file would.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::batcher::PairBatcher;
use crate::ml::trainer::FitOptions;

/// Objective the harness should compile the model with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    BinaryCrossentropy,
    #[serde(rename = "ranknet")]
    RankNet,
    #[serde(rename = "ranksvm")]
    RankSvm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskConfig {
    pub loss:            Loss,
    pub nb_epoch:        usize,
    pub batch_size:      usize,
    pub epoch_fract:     f64,
    /// Batch size used when scoring a whole split
    pub eval_batch_size: usize,
    /// Context padding length
    pub s0pad:           usize,
    /// Response padding length
    pub s1pad:           usize,
    /// Width of the per-token feature vectors
    pub flags_dim:       usize,
    pub seed:            Option<u64>,
    pub metrics_dir:     Option<PathBuf>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            loss:            Loss::BinaryCrossentropy,
            nb_epoch:        16,
            batch_size:      192,
            epoch_fract:     0.25,
            eval_batch_size: 2048,
            s0pad:           160,
            s1pad:           160,
            flags_dim:       4,
            seed:            None,
            metrics_dir:     None,
        }
    }
}

impl TaskConfig {
    /// Apply one `key=value` override.
    ///
    /// The value is parsed as JSON (`128`, `0.5`, `null`, `"x"`); anything
    /// that is not valid JSON is taken as a plain string, and a value in
    /// single quotes (`'data/run1'`) is unquoted first.
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let Some((key, raw)) = assignment.split_once('=') else {
            bail!("Config override '{assignment}' is not of the form key=value");
        };
        let key = key.trim();
        let raw = raw.trim();

        let value = match raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            Some(quoted) => serde_json::Value::String(quoted.to_string()),
            None => serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
        };

        let mut json = serde_json::to_value(&*self)?;
        let fields = json
            .as_object_mut()
            .context("TaskConfig must serialise to a JSON object")?;
        if !fields.contains_key(key) {
            bail!("Unknown config key '{key}'");
        }
        fields.insert(key.to_string(), value);

        *self = serde_json::from_value(json)
            .with_context(|| format!("Invalid value for '{key}': {raw}"))?;

        tracing::debug!("Config override {key}={raw}");
        Ok(())
    }

    /// Apply a list of overrides in order
    pub fn with_overrides<S: AsRef<str>>(mut self, overrides: &[S]) -> Result<Self> {
        for o in overrides {
            self.apply_override(o.as_ref())?;
        }
        Ok(self)
    }

    /// Batcher that shapes every batch of this task
    pub fn batcher(&self) -> PairBatcher {
        PairBatcher::new(self.s0pad, self.s1pad, self.flags_dim)
    }

    /// Fit options derived from this config
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            batch_size:      self.batch_size,
            epochs:          self.nb_epoch,
            epoch_fract:     self.epoch_fract,
            eval_batch_size: self.eval_batch_size,
            seed:            self.seed,
            metrics_dir:     self.metrics_dir.clone(),
        }
    }
}
