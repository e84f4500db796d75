use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use log::{info, warn};

use crate::error::NerError;

/// Gazetteer of location names used by the `LOCATION` feature.
///
/// Names are kept sorted so that iterating them (and therefore assigning
/// `location-<name>` ids) gives the same order on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    names: BTreeSet<String>,
}

impl Locations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a locations file: one name per line, surrounding whitespace
    /// trimmed, blank lines skipped.
    ///
    /// # Arguments
    /// * `path` - The path to the locations file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub fn load(path: &Path) -> Result<Self, NerError> {
        let file = File::open(path)?;
        let locations = Self::from_reader(io::BufReader::new(file))?;
        if locations.is_empty() {
            warn!("{} lists no locations", path.display());
        }
        info!(
            "loaded {} locations from {}",
            locations.len(),
            path.display()
        );
        Ok(locations)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, NerError> {
        let mut locations = Locations::new();
        for line in reader.lines() {
            let line = line?;
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if !locations.insert(name) {
                warn!("duplicate location {:?} ignored", name);
            }
        }
        Ok(locations)
    }

    /// Adds a name, returning `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.names.contains(word)
    }

    /// Iterates the names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Locations {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut locations = Locations::new();
        for name in iter {
            let name = name.as_ref().trim();
            if !name.is_empty() {
                locations.insert(name);
            }
        }
        locations
    }
}
