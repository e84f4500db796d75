use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::corpus::Corpus;
use crate::encoder::{EncodeMode, Encoder};
use crate::error::NerError;
use crate::features::{FeatureExtractor, FeatureTypes};
use crate::locations::Locations;
use crate::vocabulary::{FeatureIds, VocabularyBuilder};

const READABLE_EXTENSION: &str = "readable";
const VECTOR_EXTENSION: &str = "vector";

/// Inputs and outputs of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub locations_path: PathBuf,
    pub feature_types: FeatureTypes,
    /// Where `.readable` / `.vector` files go; next to each input if unset.
    pub output_dir: Option<PathBuf>,
    /// Optional JSON dump of the feature-id table.
    pub feature_ids_path: Option<PathBuf>,
}

impl ExtractorConfig {
    pub fn new(train_path: &Path, test_path: &Path, locations_path: &Path) -> Self {
        ExtractorConfig {
            train_path: train_path.to_path_buf(),
            test_path: test_path.to_path_buf(),
            locations_path: locations_path.to_path_buf(),
            feature_types: FeatureTypes::default(),
            output_dir: None,
            feature_ids_path: None,
        }
    }

    /// Derives an output path: `<dir>/<input file name>.<extension>`.
    ///
    /// # Example
    /// ```
    /// use std::path::{Path, PathBuf};
    ///
    /// use nerfeat::extractor::ExtractorConfig;
    ///
    /// let config = ExtractorConfig::new(
    ///     Path::new("data/train.txt"),
    ///     Path::new("data/test.txt"),
    ///     Path::new("data/locs.txt"),
    /// );
    /// assert_eq!(
    ///     config.output_path(&config.train_path, "vector"),
    ///     PathBuf::from("data/train.txt.vector")
    /// );
    /// ```
    pub fn output_path(&self, input: &Path, extension: &str) -> PathBuf {
        let mut file_name = input.file_name().unwrap_or_default().to_os_string();
        file_name.push(".");
        file_name.push(extension);
        match &self.output_dir {
            Some(dir) => dir.join(file_name),
            None => input.with_file_name(file_name),
        }
    }
}

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub num_features: usize,
    pub num_train_tokens: usize,
    pub num_test_tokens: usize,
}

/// Extractor drives the whole pipeline: it builds the feature-id table from
/// the training corpus, then encodes the training and test corpora into
/// `.readable` and `.vector` files.
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Extractor { config }
    }

    /// Runs all passes: vocabulary from the training file, then encoding of
    /// the training file and the test file.
    ///
    /// # Returns
    /// A [`Summary`] of the table size and the number of tokens encoded.
    ///
    /// # Errors
    /// Returns the first I/O, parse or label error encountered. Output files
    /// written before the error are left as they are.
    pub fn run(&self) -> Result<Summary, NerError> {
        // Unknown feature names are accepted but enable nothing.
        for name in self.config.feature_types.unrecognized() {
            warn!("ignoring unknown feature type {:?}", name);
        }

        // The gazetteer and feature types are fixed for every pass.
        let locations = Locations::load(&self.config.locations_path)?;
        let extractor = FeatureExtractor::new(self.config.feature_types.clone(), locations)?;

        // Pass 1: the feature-id table comes from the training file only.
        info!("building vocabulary from {}", self.config.train_path.display());
        let table = VocabularyBuilder::build(&extractor, Corpus::open(&self.config.train_path)?)?;

        if let Some(path) = &self.config.feature_ids_path {
            table.save(path)?;
            info!("wrote feature ids to {}", path.display());
        }

        // Pass 2 and 3: re-read the training file, then the test file.
        let num_train_tokens =
            self.encode_file(&extractor, &table, &self.config.train_path, EncodeMode::Train)?;
        let num_test_tokens =
            self.encode_file(&extractor, &table, &self.config.test_path, EncodeMode::Test)?;

        Ok(Summary {
            num_features: table.len(),
            num_train_tokens,
            num_test_tokens,
        })
    }

    /// Encodes one corpus into its `.readable` and `.vector` files.
    ///
    /// # Returns
    /// The number of tokens encoded.
    fn encode_file(
        &self,
        extractor: &FeatureExtractor,
        table: &FeatureIds,
        corpus_path: &Path,
        mode: EncodeMode,
    ) -> Result<usize, NerError> {
        let readable_path = self.config.output_path(corpus_path, READABLE_EXTENSION);
        let vector_path = self.config.output_path(corpus_path, VECTOR_EXTENSION);

        let mut readable = io::BufWriter::new(File::create(&readable_path)?);
        let mut vectors = io::BufWriter::new(File::create(&vector_path)?);

        let encoder = Encoder::new(extractor, table, mode);
        let num_tokens =
            encoder.encode_all(Corpus::open(corpus_path)?, &mut readable, &mut vectors)?;

        info!(
            "encoded {} tokens from {} ({:?} mode) into {}",
            num_tokens,
            corpus_path.display(),
            encoder.mode(),
            vector_path.display()
        );
        Ok(num_tokens)
    }
}
