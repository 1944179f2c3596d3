// ============================================================
// Layer 2 — Ubuntu Task
// ============================================================
// Plugs the Ubuntu Dialogue Corpus into the ranking harness.
//
// The task moves through three states, each its own type:
//
//   UbuntuTask  ──load_vocab──▶  VocabLoaded  ──load_splits──▶  DataLoaded
//   (config)                     (+ vocabulary)                 (+ train/val/test)
//
// Each transition consumes the previous state, so a set can
// never be loaded before the vocabulary it indexes into, and a
// model can never be fitted before there is data. Those are
// compile errors rather than runtime surprises.
//
// Once in DataLoaded:
//   fit_model   — trains the model on block-shuffled batches
//   eval        — scores every loaded split (None for missing ones)
//   res_columns — formats one README results-table row

use anyhow::Result;
use burn::prelude::*;
use std::{
    collections::BTreeMap,
    path::Path,
    sync::Arc,
};

use crate::application::config::TaskConfig;
use crate::data::{
    dataset::PairDataset,
    loader::{load_pair_set, load_vocab},
};
use crate::domain::{ranking::RankingMetrics, vocab::Vocabulary};
use crate::ml::{
    evaluator::{predict_all, score_split},
    model::RankingModel,
    trainer::{run_fit, FitHistory, FitOptions},
};

// ─── UbuntuTask ───────────────────────────────────────────────────────────────
/// Configured task with nothing loaded yet.
#[derive(Debug, Clone, Default)]
pub struct UbuntuTask {
    config: TaskConfig,
}

impl UbuntuTask {
    pub const NAME: &'static str = "ubuntu";

    pub fn new(config: TaskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Load the vocabulary every split indexes into.
    pub fn load_vocab(self, path: impl AsRef<Path>) -> Result<VocabLoaded> {
        let vocab = Arc::new(load_vocab(path.as_ref())?);
        Ok(VocabLoaded { config: self.config, vocab })
    }
}

// ─── LoadedSet ────────────────────────────────────────────────────────────────
/// One split: its examples, labels and the vocabulary they index into.
#[derive(Debug, Clone)]
pub struct LoadedSet {
    /// Originating file name; metrics are keyed by it
    pub name:    String,
    pub dataset: PairDataset,
    pub labels:  Vec<f32>,
    pub vocab:   Arc<Vocabulary>,
}

// ─── VocabLoaded ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct VocabLoaded {
    config: TaskConfig,
    vocab:  Arc<Vocabulary>,
}

impl VocabLoaded {
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// Load one split snapshot and assemble its examples.
    pub fn load_set(&self, path: impl AsRef<Path>) -> Result<LoadedSet> {
        let path    = path.as_ref();
        let dataset = load_pair_set(path)?;

        // Token ids past the vocabulary would index outside the embedding matrix
        let rows = self.vocab.embedding_rows();
        if let Some(max) = dataset.max_token() {
            if max as usize >= rows {
                tracing::warn!(
                    "'{}' uses token index {} but the vocabulary only covers {} rows",
                    path.display(),
                    max,
                    rows
                );
            }
        }

        Ok(LoadedSet {
            name:    path.display().to_string(),
            labels:  dataset.labels(),
            dataset,
            vocab:   Arc::clone(&self.vocab),
        })
    }

    /// Load the training split and, if given, validation and test.
    pub fn load_splits(
        self,
        train: impl AsRef<Path>,
        val:   Option<&Path>,
        test:  Option<&Path>,
    ) -> Result<DataLoaded> {
        let train = self.load_set(train)?;
        let val   = val.map(|p| self.load_set(p)).transpose()?;
        let test  = test.map(|p| self.load_set(p)).transpose()?;

        Ok(DataLoaded { config: self.config, vocab: self.vocab, train, val, test })
    }
}

// ─── Evaluation results ───────────────────────────────────────────────────────
/// Metrics of one split, tagged with the file they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub name:    String,
    pub metrics: RankingMetrics,
}

/// Per-split results; a split that was not loaded is None.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub train: Option<SplitResult>,
    pub val:   Option<SplitResult>,
    pub test:  Option<SplitResult>,
}

impl EvalReport {
    pub fn into_tuple(self) -> (Option<SplitResult>, Option<SplitResult>, Option<SplitResult>) {
        (self.train, self.val, self.test)
    }

    /// Metrics keyed by originating file name
    pub fn by_name(&self) -> BTreeMap<String, RankingMetrics> {
        [&self.train, &self.val, &self.test]
            .into_iter()
            .flatten()
            .map(|r| (r.name.clone(), r.metrics))
            .collect()
    }
}

// ─── DataLoaded ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct DataLoaded {
    config: TaskConfig,
    vocab:  Arc<Vocabulary>,
    train:  LoadedSet,
    val:    Option<LoadedSet>,
    test:   Option<LoadedSet>,
}

impl DataLoaded {
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    pub fn train(&self) -> &LoadedSet {
        &self.train
    }

    pub fn val(&self) -> Option<&LoadedSet> {
        self.val.as_ref()
    }

    pub fn test(&self) -> Option<&LoadedSet> {
        self.test.as_ref()
    }

    /// Train `model` with the task's own fit options.
    pub fn fit_model<B: Backend, M: RankingModel<B>>(
        &self,
        model:  &mut M,
        device: &B::Device,
    ) -> Result<FitHistory> {
        self.fit_model_with(model, self.config.fit_options(), device)
    }

    /// Train `model` with explicit options; `batch_size` shapes the batch
    /// stream, the rest is handed to the fit loop unchanged.
    pub fn fit_model_with<B: Backend, M: RankingModel<B>>(
        &self,
        model:   &mut M,
        options: FitOptions,
        device:  &B::Device,
    ) -> Result<FitHistory> {
        tracing::info!(
            "Fitting on '{}' ({} pairs)",
            self.train.name,
            self.train.dataset.sample_count()
        );
        run_fit::<B, M>(
            model,
            &self.train.dataset,
            self.val.as_ref().map(|s| &s.dataset),
            &self.config.batcher(),
            &options,
            device,
        )
    }

    /// Score every loaded split with `model`.
    pub fn eval<B: Backend, M: RankingModel<B>>(
        &self,
        model:  &M,
        device: &B::Device,
    ) -> Result<EvalReport> {
        let batcher = self.config.batcher();
        self.eval_with(|set| {
            predict_all::<B, M>(model, &set.dataset, &batcher, self.config.eval_batch_size, device)
        })
    }

    /// Evaluate with scores from any source, e.g. a model or a score file.
    /// `scores` is called once per loaded split.
    pub fn eval_with<F>(&self, mut scores: F) -> Result<EvalReport>
    where
        F: FnMut(&LoadedSet) -> Result<Vec<f32>>,
    {
        let mut run = |set: Option<&LoadedSet>| -> Result<Option<SplitResult>> {
            let Some(set) = set else { return Ok(None) };
            let metrics = score_split(&scores(set)?, &set.dataset)?;
            tracing::info!(
                "{}: MRR={:.6} 2-R@1={:.6} 10-R@1={:.6} 10-R@2={:.6} 10-R@5={:.6}",
                set.name, metrics.mrr, metrics.r2_1, metrics.r10_1, metrics.r10_2, metrics.r10_5,
            );
            Ok(Some(SplitResult { name: set.name.clone(), metrics }))
        };

        Ok(EvalReport {
            train: run(Some(&self.train))?,
            val:   run(self.val.as_ref())?,
            test:  run(self.test.as_ref())?,
        })
    }

    /// One README-format markdown table row piece:
    ///
    /// `train MRR | train 2-R@1 | val MRR | val 2-R@1 | val 10-R@2 | test MRR | test 2-R@1 | test 10-R@2`
    ///
    /// `mres` holds metrics keyed by split file name (usually averaged over
    /// several runs); a missing split or metric prints NaN.
    pub fn res_columns(&self, mres: &BTreeMap<String, RankingMetrics>, pfx: char) -> String {
        let train = Some(self.train.name.as_str());
        let val   = self.val.as_ref().map(|s| s.name.as_str());
        let test  = self.test.as_ref().map(|s| s.name.as_str());

        let cell = |split: Option<&str>, key: &str| -> f64 {
            split
                .and_then(|name| mres.get(name))
                .and_then(|m| m.get(key))
                .unwrap_or(f64::NAN)
        };

        let columns = [
            (cell(train, "MRR"),   "   |"),
            (cell(train, "R2_1"),  "     |"),
            (cell(val,   "MRR"),   "   |"),
            (cell(val,   "R2_1"),  "   |"),
            (cell(val,   "R10_2"), "    |"),
            (cell(test,  "MRR"),   "  |"),
            (cell(test,  "R2_1"),  "   |"),
            (cell(test,  "R10_2"), "   "),
        ];

        columns
            .iter()
            .map(|(value, sep)| format!("{pfx}{value:.6}{sep}"))
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::PairBatch, loader::{write_snapshot, SetSnapshot}};
    use crate::ml::baseline::OverlapBaseline;
    use burn::backend::NdArray;
    use std::path::PathBuf;

    type TestBackend = NdArray;

    struct Fixture {
        _dir:  tempfile::TempDir,
        vocab: PathBuf,
        train: PathBuf,
        val:   PathBuf,
    }

    /// Counts train steps; scores by the first response token.
    #[derive(Default)]
    struct Counter {
        steps: usize,
    }

    impl RankingModel<TestBackend> for Counter {
        fn train_batch(&mut self, batch: PairBatch<TestBackend>) -> Result<f64> {
            assert_eq!(batch.context.dims()[1], 8);
            self.steps += 1;
            Ok(0.5)
        }

        fn predict(&self, batch: PairBatch<TestBackend>) -> Result<Vec<f32>> {
            let [n, len] = batch.response.dims();
            let ids: Vec<i64> = batch.response.into_data().convert::<i64>().to_vec().unwrap();
            Ok((0..n).map(|i| ids[i * len] as f32).collect())
        }
    }

    fn set(queries: u32, candidates: u32) -> SetSnapshot {
        let mut s: SetSnapshot = Default::default();
        for q in 0..queries {
            for c in 0..candidates {
                // First candidate is the true response, with the largest token id
                let first = if c == 0 { 30 } else { 20 - c };
                s.0.push(vec![q + 1, q + 2, 3]);
                s.1.push(vec![first, 3]);
                s.2.push(vec![vec![0.0; 4]; 3]);
                s.3.push(vec![vec![1.0; 4]; 2]);
                s.4.push(if c == 0 { 1.0 } else { 0.0 });
            }
        }
        s
    }

    fn fixture() -> Fixture {
        let dir   = tempfile::tempdir().unwrap();
        let vocab = dir.path().join("v2-vocab.json");
        let train = dir.path().join("v2-trainset.bin");
        let val   = dir.path().join("v2-valset.json");

        let words: Vocabulary = (0..40u32).map(|i| (format!("w{i}"), i)).collect();
        write_snapshot(&vocab, &words).unwrap();
        write_snapshot(&train, &set(5, 2)).unwrap();
        write_snapshot(&val, &set(3, 10)).unwrap();

        Fixture { _dir: dir, vocab, train, val }
    }

    fn config() -> TaskConfig {
        TaskConfig::default()
            .with_overrides(&["s0pad=8", "s1pad=8", "batch_size=4", "nb_epoch=2", "epoch_fract=1.0", "seed=3"])
            .unwrap()
    }

    #[test]
    fn test_load_set_returns_dataset_labels_and_vocab() {
        let f = fixture();
        let loaded = UbuntuTask::new(config()).load_vocab(&f.vocab).unwrap();
        let set    = loaded.load_set(&f.train).unwrap();

        assert_eq!(set.dataset.sample_count(), 10);
        assert_eq!(set.labels.iter().filter(|&&y| y == 1.0).count(), 5);
        assert_eq!(set.vocab.len(), 40);
        assert!(Arc::ptr_eq(&set.vocab, loaded.vocab()));
        assert!(set.name.ends_with("v2-trainset.bin"));
    }

    #[test]
    fn test_eval_with_only_training_set() {
        let f    = fixture();
        let task = UbuntuTask::new(config())
            .load_vocab(&f.vocab).unwrap()
            .load_splits(&f.train, None, None).unwrap();

        let (train, val, test) = task.eval::<TestBackend, _>(&Counter::default(), &Default::default())
            .unwrap()
            .into_tuple();

        let train = train.unwrap();
        assert_eq!(train.metrics.mrr, 1.0);
        assert!(val.is_none());
        assert!(test.is_none());
    }

    #[test]
    fn test_fit_then_eval() {
        let f    = fixture();
        let task = UbuntuTask::new(config())
            .load_vocab(&f.vocab).unwrap()
            .load_splits(&f.train, Some(f.val.as_path()), None).unwrap();

        let mut model = Counter::default();
        let history   = task.fit_model::<TestBackend, _>(&mut model, &Default::default()).unwrap();

        // 10 pairs / batch 4 → 2 steps per full epoch, 2 epochs
        assert_eq!(model.steps, 4);
        assert_eq!(history.epochs.len(), 2);
        assert_eq!(history.epochs[0].val_mrr(), 1.0);

        let report = task.eval::<TestBackend, _>(&model, &Default::default()).unwrap();
        let val    = report.val.as_ref().unwrap();
        assert_eq!(val.metrics.queries, 3);
        assert_eq!(val.metrics.r10_1, 1.0);
        assert_eq!(report.by_name().len(), 2);
    }

    #[test]
    fn test_baseline_through_eval() {
        let f    = fixture();
        let task = UbuntuTask::new(config())
            .load_vocab(&f.vocab).unwrap()
            .load_splits(&f.train, Some(f.val.as_path()), None).unwrap();

        let report = task.eval::<TestBackend, _>(&OverlapBaseline, &Default::default()).unwrap();
        // Every candidate shares token 3 with its context: all tie at 0.5 and
        // the relevant first candidate wins on file order
        assert_eq!(report.val.unwrap().metrics.mrr, 1.0);
    }

    #[test]
    fn test_res_columns() {
        let f    = fixture();
        let task = UbuntuTask::new(config())
            .load_vocab(&f.vocab).unwrap()
            .load_splits(&f.train, Some(f.val.as_path()), None).unwrap();

        let report = task.eval::<TestBackend, _>(&Counter::default(), &Default::default()).unwrap();
        let row    = task.res_columns(&report.by_name(), ' ');

        assert!(row.starts_with(" 1.000000   | 1.000000     | 1.000000   |"));
        // No test split loaded
        assert!(row.ends_with(" NaN  | NaN   | NaN   "));
        assert_eq!(row.matches('|').count(), 7);
    }

    #[test]
    fn test_missing_vocab_file_fails() {
        assert!(UbuntuTask::default().load_vocab("does/not/exist.json").is_err());
    }
}
