use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, info, log_enabled, Level};
use serde::{Deserialize, Serialize};

use crate::corpus::Sentence;
use crate::error::NerError;
use crate::features::{
    location_key, FeatureExtractor, FeatureType, ABBREVIATED, CAPITALIZED, IS_LOCATION,
};

/// Frozen mapping from feature key to a contiguous, zero based id.
///
/// Keys are stored in id order, so `keys()[id]` is the key for `id`.
/// Serialized as a JSON array of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct FeatureIds {
    ids: HashMap<String, usize>,
    keys: Vec<String>,
}

impl FeatureIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id to `key` unless it already has one.
    /// Returns `true` if the key was new.
    fn insert(&mut self, key: &str) -> bool {
        if self.ids.contains_key(key) {
            return false;
        }
        self.ids.insert(key.to_string(), self.keys.len());
        self.keys.push(key.to_string());
        true
    }

    /// Gets the id of a feature key.
    ///
    /// # Example
    /// ```
    /// use nerfeat::corpus::Token;
    /// use nerfeat::features::{FeatureExtractor, FeatureTypes};
    /// use nerfeat::locations::Locations;
    /// use nerfeat::vocabulary::VocabularyBuilder;
    ///
    /// let extractor = FeatureExtractor::new(FeatureTypes::default(), Locations::new()).unwrap();
    /// let mut builder = VocabularyBuilder::new(&extractor);
    /// builder.add_sentence(&vec![Token::new("O", "NN", "cat")]);
    /// let table = builder.finish();
    ///
    /// assert_eq!(table.get("word-cat"), Some(0));
    /// assert_eq!(table.get("word-UNK"), Some(1));
    /// assert_eq!(table.get("word-dog"), None);
    /// ```
    pub fn get(&self, key: &str) -> Option<usize> {
        self.ids.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ids.contains_key(key)
    }

    /// Gets the key that owns `id`.
    pub fn key(&self, id: usize) -> Option<&str> {
        self.keys.get(id).map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Iterates `(id, key)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.keys.iter().map(String::as_str).enumerate()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Writes the table as a JSON array of keys, index = id.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save(&self, path: &Path) -> Result<(), NerError> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a table written by [`FeatureIds::save`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not a JSON array of
    /// strings, or lists the same key twice.
    pub fn load(path: &Path) -> Result<Self, NerError> {
        let file = File::open(path)?;
        let keys: Vec<String> = serde_json::from_reader(io::BufReader::new(file))?;
        Self::try_from(keys)
    }
}

impl fmt::Display for FeatureIds {
    /// One `<id> <key>` line per feature, in id order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, key) in self.iter() {
            writeln!(f, "{} {}", id, key)?;
        }
        Ok(())
    }
}

impl From<FeatureIds> for Vec<String> {
    fn from(table: FeatureIds) -> Self {
        table.keys
    }
}

impl TryFrom<Vec<String>> for FeatureIds {
    type Error = NerError;

    fn try_from(keys: Vec<String>) -> Result<Self, Self::Error> {
        let mut table = FeatureIds::new();
        for key in keys {
            if !table.insert(&key) {
                return Err(NerError::DuplicateFeature { key });
            }
        }
        Ok(table)
    }
}

/// Builds a [`FeatureIds`] table from training sentences.
///
/// Ids are handed out in first seen order: per token the word, its word
/// context, its POS tag and its POS context. [`VocabularyBuilder::finish`]
/// then appends the orthographic and gazetteer features and the reserved
/// UNK/PHI/OMEGA entries.
pub struct VocabularyBuilder<'a> {
    extractor: &'a FeatureExtractor,
    table: FeatureIds,
    num_sentences: usize,
}

impl<'a> VocabularyBuilder<'a> {
    pub fn new(extractor: &'a FeatureExtractor) -> Self {
        VocabularyBuilder {
            extractor,
            table: FeatureIds::new(),
            num_sentences: 0,
        }
    }

    /// Adds every feature key derived from a training sentence.
    pub fn add_sentence(&mut self, sentence: &Sentence) {
        for i in 0..sentence.len() {
            for key in self.extractor.vocabulary_keys(sentence, i) {
                self.table.insert(&key);
            }
        }
        self.num_sentences += 1;
    }

    /// Appends the sentence independent features and freezes the table.
    ///
    /// # Returns
    /// The finished [`FeatureIds`]; no ids are added after this point.
    pub fn finish(mut self) -> FeatureIds {
        // Everything so far came from the sentences themselves.
        let lexical = self.table.len();

        // Scalar predicates get one id each, locations one id per name.
        if self.extractor.enabled(FeatureType::Abbreviation) {
            self.table.insert(ABBREVIATED);
        }
        if self.extractor.enabled(FeatureType::Capitalization) {
            self.table.insert(CAPITALIZED);
        }
        if self.extractor.enabled(FeatureType::Location) {
            self.table.insert(IS_LOCATION);
            for location in self.extractor.locations().iter() {
                self.table.insert(&location_key(location));
            }
        }
        let orthographic = self.table.len() - lexical;

        // Reserved UNK/PHI/OMEGA entries always come last.
        for key in self.extractor.pseudo_keys() {
            self.table.insert(key);
        }

        debug!(
            "{} lexical, {} orthographic/gazetteer, {} reserved feature ids",
            lexical,
            orthographic,
            self.table.len() - lexical - orthographic
        );
        if log_enabled!(Level::Debug) {
            debug!("feature ids:\n{}", self.table);
        }
        info!(
            "built {} feature ids from {} sentences",
            self.table.len(),
            self.num_sentences
        );
        self.table
    }

    /// Consumes a whole training pass and returns the frozen table.
    ///
    /// # Errors
    /// Returns the first error produced by `sentences`.
    pub fn build<I>(extractor: &'a FeatureExtractor, sentences: I) -> Result<FeatureIds, NerError>
    where
        I: IntoIterator<Item = Result<Sentence, NerError>>,
    {
        let mut builder = VocabularyBuilder::new(extractor);
        for sentence in sentences {
            builder.add_sentence(&sentence?);
        }
        Ok(builder.finish())
    }
}
