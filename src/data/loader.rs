// ============================================================
// Layer 4 — Snapshot Loader
// ============================================================
// Reads the files produced by the preprocessing tool:
//
//   <split>.json / <split>.bin   — one set snapshot per split:
//       (context_seqs, response_seqs, context_feats, response_feats, labels)
//   vocab.json / vocab.bin       — token → index mapping
//
// The encoding is picked from the file extension:
//   .json            → serde_json (readable, slow, large)
//   .bin / .bincode  → bincode    (compact binary, fast)
// Both hold the same serde types, so a snapshot can be
// converted by reading one encoding and writing the other.
//
// Loading is eager and blocking. A missing or corrupt file is
// fatal: the error names the file and aborts the load.
//
// Reference: Rust Book §9 (Error Handling)
//            serde / bincode crate documentation

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::data::dataset::PairDataset;
use crate::domain::vocab::Vocabulary;

/// On-disk layout of one split, as five parallel arrays:
/// (context token ids, response token ids, context features, response features, labels)
pub type SetSnapshot = (
    Vec<Vec<u32>>,
    Vec<Vec<u32>>,
    Vec<Vec<Vec<f32>>>,
    Vec<Vec<Vec<f32>>>,
    Vec<f32>,
);

/// Serialisation used for a snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
}

impl SnapshotFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json")            => Ok(Self::Json),
            Some("bin" | "bincode") => Ok(Self::Bincode),
            other => bail!(
                "Unsupported snapshot extension {:?} for '{}' (expected .json, .bin or .bincode)",
                other,
                path.display()
            ),
        }
    }
}

/// Deserialize any snapshot value from `path`.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = SnapshotFormat::from_path(path)?;
    let file   = File::open(path)
        .with_context(|| format!("Cannot open snapshot '{}'", path.display()))?;
    let reader = BufReader::new(file);

    let value = match format {
        SnapshotFormat::Json => serde_json::from_reader(reader)
            .with_context(|| format!("Corrupt JSON snapshot '{}'", path.display()))?,
        SnapshotFormat::Bincode => bincode::deserialize_from(reader)
            .with_context(|| format!("Corrupt bincode snapshot '{}'", path.display()))?,
    };

    Ok(value)
}

/// Serialize `value` to `path`, in the format named by its extension.
pub fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = SnapshotFormat::from_path(path)?;
    let file   = File::create(path)
        .with_context(|| format!("Cannot create snapshot '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        SnapshotFormat::Json    => serde_json::to_writer(&mut writer, value)?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, value)?,
    }
    writer.flush()?;

    tracing::debug!("Wrote {:?} snapshot '{}'", format, path.display());
    Ok(())
}

/// Load the shared vocabulary
pub fn load_vocab(path: &Path) -> Result<Vocabulary> {
    let vocab: Vocabulary = read_snapshot(path)?;
    tracing::info!("Loaded vocabulary of {} tokens from '{}'", vocab.len(), path.display());
    Ok(vocab)
}

/// Load one split and assemble it into a PairDataset
pub fn load_pair_set(path: &Path) -> Result<PairDataset> {
    let (contexts, responses, context_features, response_features, labels): SetSnapshot =
        read_snapshot(path)?;

    let dataset = PairDataset::from_arrays(
        contexts,
        responses,
        context_features,
        response_features,
        labels,
    )
    .with_context(|| format!("Malformed set snapshot '{}'", path.display()))?;

    tracing::info!(
        "Loaded {} pairs ({} relevant) from '{}'",
        dataset.sample_count(),
        dataset.positive_count(),
        path.display()
    );
    Ok(dataset)
}

/// Load externally produced relevance scores: a flat array, one per example.
pub fn load_scores(path: &Path) -> Result<Vec<f32>> {
    read_snapshot(path)
}
