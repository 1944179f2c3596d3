// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// Token string → integer index mapping.
//
// Built once from the training split by the preprocessing tool
// and reused unchanged for validation and test, so the same
// word always maps to the same embedding row.
//
// Read-only after load. Shared between splits via Arc.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token → index mapping shared by every split of the corpus.
///
/// Serialised as a plain JSON object (`{"ubuntu": 5, ...}`),
/// which is why the struct is `transparent` over its map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    words: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn new(words: HashMap<String, u32>) -> Self {
        Self { words }
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Index of `token`, if it is in the vocabulary
    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.words.get(token).copied()
    }

    /// Number of embedding rows a model needs: largest index + 1.
    ///
    /// Indices are not guaranteed to be dense, so this can be
    /// larger than `len()`.
    pub fn embedding_rows(&self) -> usize {
        self.words
            .values()
            .max()
            .map(|&max| max as usize + 1)
            .unwrap_or(0)
    }
}

impl FromIterator<(String, u32)> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self { words: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        [("__PAD__", 0), ("ubuntu", 3), ("mount", 7)]
            .into_iter()
            .map(|(w, i)| (w.to_string(), i))
            .collect()
    }

    #[test]
    fn test_lookup() {
        let v = sample();
        assert_eq!(v.index_of("mount"), Some(7));
        assert_eq!(v.index_of("windows"), None);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_embedding_rows_handles_sparse_indices() {
        assert_eq!(sample().embedding_rows(), 8);
        assert_eq!(Vocabulary::default().embedding_rows(), 0);
    }

    #[test]
    fn test_json_is_a_plain_object() {
        let v: Vocabulary = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        assert_eq!(v.index_of("b"), Some(2));
    }
}
