use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::corpus::{Sentence, Token};
use crate::error::NerError;
use crate::locations::Locations;

/// Short words made of letters and periods that end in a period, e.g. `Mr.`, `U.S.`.
const ABBREVIATION_PATTERN: &str = r"^[A-Za-z.]{1,3}\.$";

pub const WORD_UNK: &str = "word-UNK";
pub const PREV_WORD_UNK: &str = "prev-word-UNK";
pub const NEXT_WORD_UNK: &str = "next-word-UNK";
pub const PREV_WORD_PHI: &str = "prev-word-PHI";
pub const NEXT_WORD_OMEGA: &str = "next-word-OMEGA";
pub const POS_UNK: &str = "pos-UNKPOS";
pub const PREV_POS_UNK: &str = "prev-pos-UNKPOS";
pub const NEXT_POS_UNK: &str = "next-pos-UNKPOS";
pub const PREV_POS_PHI: &str = "prev-pos-PHIPOS";
pub const NEXT_POS_OMEGA: &str = "next-pos-OMEGAPOS";

pub const ABBREVIATED: &str = "abbreviated";
pub const CAPITALIZED: &str = "capitalized";
pub const IS_LOCATION: &str = "is-location";

pub fn word_key(word: &str) -> String {
    format!("word-{}", word)
}

pub fn prev_word_key(word: &str) -> String {
    format!("prev-word-{}", word)
}

pub fn next_word_key(word: &str) -> String {
    format!("next-word-{}", word)
}

pub fn pos_key(pos: &str) -> String {
    format!("pos-{}", pos)
}

pub fn prev_pos_key(pos: &str) -> String {
    format!("prev-pos-{}", pos)
}

pub fn next_pos_key(pos: &str) -> String {
    format!("next-pos-{}", pos)
}

pub fn location_key(location: &str) -> String {
    format!("location-{}", location)
}

/// A configurable family of per-token features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureType {
    Word,
    WordContext,
    Pos,
    PosContext,
    Abbreviation,
    Capitalization,
    Location,
}

impl FeatureType {
    /// All feature types in report order.
    pub const ALL: [FeatureType; 7] = [
        FeatureType::Word,
        FeatureType::WordContext,
        FeatureType::Pos,
        FeatureType::PosContext,
        FeatureType::Abbreviation,
        FeatureType::Capitalization,
        FeatureType::Location,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureType::Word => "WORD",
            FeatureType::WordContext => "WORDCON",
            FeatureType::Pos => "POS",
            FeatureType::PosContext => "POSCON",
            FeatureType::Abbreviation => "ABBR",
            FeatureType::Capitalization => "CAP",
            FeatureType::Location => "LOCATION",
        }
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WORD" => Ok(FeatureType::Word),
            "WORDCON" | "WORDCONTEXT" => Ok(FeatureType::WordContext),
            "POS" => Ok(FeatureType::Pos),
            "POSCON" | "POSCONTEXT" => Ok(FeatureType::PosContext),
            "ABBR" => Ok(FeatureType::Abbreviation),
            "CAP" => Ok(FeatureType::Capitalization),
            "LOCATION" => Ok(FeatureType::Location),
            _ => Err(format!("unknown feature type: {s:?}")),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of enabled feature types. `WORD` is always enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTypes {
    enabled: BTreeSet<FeatureType>,
    unrecognized: Vec<String>,
}

impl Default for FeatureTypes {
    fn default() -> Self {
        FeatureTypes {
            enabled: BTreeSet::from([FeatureType::Word]),
            unrecognized: Vec::new(),
        }
    }
}

impl FeatureTypes {
    /// Builds the set from command line names.
    ///
    /// Unknown names are remembered but never enable anything.
    ///
    /// # Example
    /// ```
    /// use nerfeat::features::{FeatureType, FeatureTypes};
    ///
    /// let types = FeatureTypes::from_names(["POS", "CAP", "SHAPE"]);
    /// assert!(types.contains(FeatureType::Word));
    /// assert!(types.contains(FeatureType::Pos));
    /// assert!(!types.contains(FeatureType::Location));
    /// assert_eq!(types.unrecognized(), ["SHAPE"]);
    /// ```
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut types = FeatureTypes::default();
        for name in names {
            let name = name.as_ref();
            match name.parse::<FeatureType>() {
                Ok(feature_type) => {
                    types.enabled.insert(feature_type);
                }
                Err(_) => {
                    if !types.unrecognized.iter().any(|n| n == name) {
                        types.unrecognized.push(name.to_string());
                    }
                }
            }
        }
        types
    }

    pub fn contains(&self, feature_type: FeatureType) -> bool {
        self.enabled.contains(&feature_type)
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureType> + '_ {
        self.enabled.iter().copied()
    }
}

/// Feature derivation shared by vocabulary building and encoding, so both
/// phases name every feature the same way.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    feature_types: FeatureTypes,
    locations: Locations,
    abbreviation: Regex,
}

impl FeatureExtractor {
    /// Creates a new instance of [`FeatureExtractor`].
    ///
    /// # Arguments
    /// * `feature_types` - The enabled feature types.
    /// * `locations` - The gazetteer consulted by the `LOCATION` feature.
    ///
    /// # Errors
    /// Returns an error if the abbreviation pattern cannot be compiled.
    pub fn new(feature_types: FeatureTypes, locations: Locations) -> Result<Self, NerError> {
        Ok(FeatureExtractor {
            feature_types,
            locations,
            abbreviation: Regex::new(ABBREVIATION_PATTERN)?,
        })
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn enabled(&self, feature_type: FeatureType) -> bool {
        self.feature_types.contains(feature_type)
    }

    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviation.is_match(word)
    }

    pub fn is_capitalized(&self, word: &str) -> bool {
        word.chars().next().is_some_and(char::is_uppercase)
    }

    pub fn is_location(&self, word: &str) -> bool {
        self.locations.contains(word)
    }

    /// Keys a token contributes to the vocabulary, in id assignment order:
    /// word, previous/next word, POS tag, previous/next POS tag.
    ///
    /// Context keys are only derived for neighbours that exist; sentence
    /// edges are covered by the reserved PHI/OMEGA entries instead.
    pub fn vocabulary_keys(&self, sentence: &Sentence, i: usize) -> Vec<String> {
        let token = &sentence[i];
        let prev = previous(sentence, i);
        let next = following(sentence, i);
        let mut keys = vec![word_key(&token.word)];

        if self.enabled(FeatureType::WordContext) {
            keys.extend(prev.map(|t| prev_word_key(&t.word)));
            keys.extend(next.map(|t| next_word_key(&t.word)));
        }
        if self.enabled(FeatureType::Pos) {
            keys.push(pos_key(&token.pos));
        }
        if self.enabled(FeatureType::PosContext) {
            keys.extend(prev.map(|t| prev_pos_key(&t.pos)));
            keys.extend(next.map(|t| next_pos_key(&t.pos)));
        }
        keys
    }

    /// Reserved placeholder keys for the enabled context categories, in
    /// id assignment order.
    pub fn pseudo_keys(&self) -> Vec<&'static str> {
        let mut keys = vec![WORD_UNK];
        if self.enabled(FeatureType::WordContext) {
            keys.extend([PREV_WORD_UNK, NEXT_WORD_UNK, PREV_WORD_PHI, NEXT_WORD_OMEGA]);
        }
        if self.enabled(FeatureType::Pos) {
            keys.push(POS_UNK);
        }
        if self.enabled(FeatureType::PosContext) {
            keys.extend([PREV_POS_UNK, NEXT_POS_UNK, PREV_POS_PHI, NEXT_POS_OMEGA]);
        }
        keys
    }
}

/// The token before position `i`, if any.
pub fn previous(sentence: &Sentence, i: usize) -> Option<&Token> {
    i.checked_sub(1).and_then(|j| sentence.get(j))
}

/// The token after position `i`, if any.
pub fn following(sentence: &Sentence, i: usize) -> Option<&Token> {
    sentence.get(i + 1)
}
