use std::{collections::HashMap, fs, path::Path};

use log::info;
use serde::Deserialize;

use crate::error::{Result, TokenizerErr};

/// On-disk shape of the bundled tokenizer resource. The original training
/// pipeline dumps the whole Keras tokenizer; only `word_index` matters here.
#[derive(Deserialize)]
struct TokenizerFile {
    word_index: HashMap<String, i32>,
}

/// Immutable word→id table, loaded once per process lifetime.
#[derive(Debug, Clone)]
pub struct WordIndex {
    index: HashMap<String, i32>,
}

impl WordIndex {
    /// Loads the table from a tokenizer JSON file containing a `word_index`
    /// object.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|source| TokenizerErr::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TokenizerFile =
            serde_json::from_slice(&raw).map_err(|source| TokenizerErr::Json {
                path: path.to_path_buf(),
                source,
            })?;

        info!(words = file.word_index.len(); "word index loaded");
        Ok(Self {
            index: file.word_index,
        })
    }

    pub fn from_map(index: HashMap<String, i32>) -> Self {
        Self { index }
    }

    /// Id for a (already lowercased) word, if the table knows it.
    #[inline]
    pub fn id(&self, word: &str) -> Option<i32> {
        self.index.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
