use std::fmt;
use std::io::Write;

use log::warn;

use crate::corpus::Sentence;
use crate::error::NerError;
use crate::features::{
    following, next_pos_key, next_word_key, pos_key, prev_pos_key, prev_word_key, previous,
    word_key, FeatureExtractor, FeatureType, ABBREVIATED, CAPITALIZED, IS_LOCATION, NEXT_POS_OMEGA,
    NEXT_POS_UNK, NEXT_WORD_OMEGA, NEXT_WORD_UNK, POS_UNK, PREV_POS_PHI, PREV_POS_UNK,
    PREV_WORD_PHI, PREV_WORD_UNK, WORD_UNK,
};
use crate::label::Label;
use crate::vocabulary::FeatureIds;

const NOT_APPLICABLE: &str = "n/a";

/// Which table the encoded sentences come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    /// The sentences built the table, so every derived key should be present.
    /// A missing key still falls back to UNK, with a warning.
    Train,
    /// Unseen data; missing keys fall back to the category's UNK entry.
    Test,
}

/// One `.vector` line: the label code and the ids of the active features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseVector {
    pub label: u8,
    pub feature_ids: Vec<usize>,
}

impl SparseVector {
    /// Ids are sorted ascending; duplicates are kept.
    ///
    /// # Example
    /// ```
    /// use nerfeat::encoder::SparseVector;
    ///
    /// let vector = SparseVector::new(3, vec![7, 2, 9, 2]);
    /// assert_eq!(vector.to_string(), "3 2:1 2:1 7:1 9:1");
    /// ```
    pub fn new(label: u8, mut feature_ids: Vec<usize>) -> Self {
        feature_ids.sort_unstable();
        SparseVector { label, feature_ids }
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        for id in &self.feature_ids {
            write!(f, " {}:1", id)?;
        }
        Ok(())
    }
}

/// Human readable view of the values a token resolved to, one field per
/// feature type. `None` means the feature type is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadableToken {
    pub word: String,
    pub word_context: Option<String>,
    pub pos: Option<String>,
    pub pos_context: Option<String>,
    pub abbreviation: Option<bool>,
    pub capitalization: Option<bool>,
    pub location: Option<bool>,
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => NOT_APPLICABLE,
    }
}

impl fmt::Display for ReadableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let na = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_APPLICABLE.into());
        writeln!(f, "WORD: {}", self.word)?;
        writeln!(f, "WORDCON: {}", na(&self.word_context))?;
        writeln!(f, "POS: {}", na(&self.pos))?;
        writeln!(f, "POSCON: {}", na(&self.pos_context))?;
        writeln!(f, "ABBR: {}", yes_no(self.abbreviation))?;
        writeln!(f, "CAP: {}", yes_no(self.capitalization))?;
        writeln!(f, "LOCATION: {}", yes_no(self.location))?;
        writeln!(f)
    }
}

/// The result of encoding one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedToken {
    pub vector: SparseVector,
    pub readable: ReadableToken,
}

/// How a single key resolved against the table.
struct Resolved {
    id: usize,
    value: String,
}

/// Re-derives feature keys for sentences and maps them onto a frozen
/// [`FeatureIds`] table.
pub struct Encoder<'a> {
    extractor: &'a FeatureExtractor,
    table: &'a FeatureIds,
    mode: EncodeMode,
}

impl<'a> Encoder<'a> {
    /// Creates a new instance of [`Encoder`].
    ///
    /// # Arguments
    /// * `extractor` - The extractor the table was built with.
    /// * `table` - The frozen feature-id table.
    /// * `mode` - Whether a missing key is logged as unexpected (train) or not (test).
    pub fn new(extractor: &'a FeatureExtractor, table: &'a FeatureIds, mode: EncodeMode) -> Self {
        Encoder {
            extractor,
            table,
            mode,
        }
    }

    pub fn mode(&self) -> EncodeMode {
        self.mode
    }

    fn lookup(&self, key: &str) -> Result<usize, NerError> {
        self.table.get(key).ok_or_else(|| NerError::MissingFeature {
            key: key.to_string(),
        })
    }

    /// Looks up `key`; an unknown key resolves to `unknown` and shows up as
    /// `unknown_value` in the readable output.
    ///
    /// # Returns
    /// The resolved id and the value to report for it.
    fn resolve(
        &self,
        key: String,
        value: &str,
        unknown: &str,
        unknown_value: &str,
    ) -> Result<Resolved, NerError> {
        if let Some(id) = self.table.get(&key) {
            return Ok(Resolved {
                id,
                value: value.to_string(),
            });
        }

        // Training tokens built the table, so this only happens when the
        // table and the corpus disagree.
        if self.mode == EncodeMode::Train {
            warn!("feature {:?} missing from the table, using {:?}", key, unknown);
        }
        Ok(Resolved {
            id: self.lookup(unknown)?,
            value: unknown_value.to_string(),
        })
    }

    /// Resolves one side of a context window. A missing neighbour maps to the
    /// reserved boundary entry.
    fn resolve_context(
        &self,
        neighbour: Option<&str>,
        make_key: fn(&str) -> String,
        boundary: &str,
        boundary_value: &str,
        unknown: &str,
        unknown_value: &str,
    ) -> Result<Resolved, NerError> {
        match neighbour {
            Some(value) => self.resolve(make_key(value), value, unknown, unknown_value),
            None => Ok(Resolved {
                id: self.lookup(boundary)?,
                value: boundary_value.to_string(),
            }),
        }
    }

    /// Encodes the token at position `i` of `sentence`.
    ///
    /// # Errors
    /// Returns [`NerError::BadLabel`] for a label outside the BIO set and
    /// [`NerError::MissingFeature`] if a reserved entry the enabled feature
    /// types need is not in the table.
    pub fn encode_token(&self, sentence: &Sentence, i: usize) -> Result<EncodedToken, NerError> {
        let token = &sentence[i];
        let label: Label = token.label.parse()?;
        let prev = previous(sentence, i);
        let next = following(sentence, i);
        let mut ids = Vec::new();
        let mut readable = ReadableToken::default();

        // The word itself is always a feature.
        let word = self.resolve(word_key(&token.word), &token.word, WORD_UNK, "UNK")?;
        ids.push(word.id);
        readable.word = word.value;

        // Neighbouring words; sentence edges map to PHI/OMEGA.
        if self.extractor.enabled(FeatureType::WordContext) {
            let before = self.resolve_context(
                prev.map(|t| t.word.as_str()),
                prev_word_key,
                PREV_WORD_PHI,
                "PHI",
                PREV_WORD_UNK,
                "UNK",
            )?;
            let after = self.resolve_context(
                next.map(|t| t.word.as_str()),
                next_word_key,
                NEXT_WORD_OMEGA,
                "OMEGA",
                NEXT_WORD_UNK,
                "UNK",
            )?;
            ids.extend([before.id, after.id]);
            readable.word_context = Some(format!("{} {}", before.value, after.value));
        }

        if self.extractor.enabled(FeatureType::Pos) {
            let pos = self.resolve(pos_key(&token.pos), &token.pos, POS_UNK, "UNKPOS")?;
            ids.push(pos.id);
            readable.pos = Some(pos.value);
        }

        // Neighbouring POS tags, same edge handling as words.
        if self.extractor.enabled(FeatureType::PosContext) {
            let before = self.resolve_context(
                prev.map(|t| t.pos.as_str()),
                prev_pos_key,
                PREV_POS_PHI,
                "PHIPOS",
                PREV_POS_UNK,
                "UNKPOS",
            )?;
            let after = self.resolve_context(
                next.map(|t| t.pos.as_str()),
                next_pos_key,
                NEXT_POS_OMEGA,
                "OMEGAPOS",
                NEXT_POS_UNK,
                "UNKPOS",
            )?;
            ids.extend([before.id, after.id]);
            readable.pos_context = Some(format!("{} {}", before.value, after.value));
        }

        // Predicates only add an id when they hold; "no" is absence.
        if self.extractor.enabled(FeatureType::Abbreviation) {
            let abbreviated = self.extractor.is_abbreviation(&token.word);
            if abbreviated {
                ids.push(self.lookup(ABBREVIATED)?);
            }
            readable.abbreviation = Some(abbreviated);
        }

        if self.extractor.enabled(FeatureType::Capitalization) {
            let capitalized = self.extractor.is_capitalized(&token.word);
            if capitalized {
                ids.push(self.lookup(CAPITALIZED)?);
            }
            readable.capitalization = Some(capitalized);
        }

        if self.extractor.enabled(FeatureType::Location) {
            let location = self.extractor.is_location(&token.word);
            if location {
                ids.push(self.lookup(IS_LOCATION)?);
            }
            readable.location = Some(location);
        }

        // SparseVector sorts the ids.
        Ok(EncodedToken {
            vector: SparseVector::new(label.code(), ids),
            readable,
        })
    }

    /// Encodes every token of a sentence, in order.
    pub fn encode_sentence(&self, sentence: &Sentence) -> Result<Vec<EncodedToken>, NerError> {
        (0..sentence.len())
            .map(|i| self.encode_token(sentence, i))
            .collect()
    }

    /// Encodes a whole pass of sentences, writing the readable report to
    /// `readable` and one vector line per token to `vectors`.
    ///
    /// # Returns
    /// The number of tokens written.
    ///
    /// # Errors
    /// Stops at the first read, encoding or write error.
    pub fn encode_all<I, R, V>(
        &self,
        sentences: I,
        readable: &mut R,
        vectors: &mut V,
    ) -> Result<usize, NerError>
    where
        I: IntoIterator<Item = Result<Sentence, NerError>>,
        R: Write,
        V: Write,
    {
        let mut num_tokens = 0;
        for sentence in sentences {
            for token in self.encode_sentence(&sentence?)? {
                write!(readable, "{}", token.readable)?;
                writeln!(vectors, "{}", token.vector)?;
                num_tokens += 1;
            }
        }
        readable.flush()?;
        vectors.flush()?;
        Ok(num_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::corpus::{Corpus, Token};
    use crate::features::FeatureTypes;
    use crate::locations::Locations;
    use crate::vocabulary::VocabularyBuilder;

    const TRAIN: &str = "\
B-LOC NNP Paris
O VBZ is
O JJ big

O NNP The
O NN cat

O NN Earth
";

    fn setup(names: &[&str]) -> (FeatureExtractor, FeatureIds) {
        let locations: Locations = ["Paris", "Tokyo"].into_iter().collect();
        let extractor = FeatureExtractor::new(FeatureTypes::from_names(names), locations).unwrap();
        let table =
            VocabularyBuilder::build(&extractor, Corpus::new(Cursor::new(TRAIN), "train")).unwrap();
        (extractor, table)
    }

    fn sentences(text: &str) -> Vec<Sentence> {
        Corpus::new(Cursor::new(text), "text")
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn id(table: &FeatureIds, key: &str) -> usize {
        table.get(key).unwrap()
    }

    #[test]
    fn test_sparse_vector_sorts_and_keeps_duplicates() {
        let vector = SparseVector::new(0, vec![7, 2, 9, 2]);
        assert_eq!(vector.feature_ids, vec![2, 2, 7, 9]);
        assert_eq!(vector.to_string(), "0 2:1 2:1 7:1 9:1");
        assert_eq!(SparseVector::new(6, vec![]).to_string(), "6");
    }

    #[test]
    fn test_word_only_train() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&[]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Train);
        let encoded = encoder.encode_sentence(&sentences(TRAIN)[0])?;

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded[0].vector, SparseVector::new(3, vec![id(&table, "word-Paris")]));
        for token in &encoded {
            assert_eq!(token.vector.feature_ids.len(), 1);
            assert!(table.key(token.vector.feature_ids[0]).unwrap().starts_with("word-"));
        }
        Ok(())
    }

    #[test]
    fn test_unknown_word_in_test_mode() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["POS"]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Test);
        let encoded = encoder.encode_sentence(&sentences("O FW Zanzibar\n")[0])?;

        assert_eq!(
            encoded[0].vector.feature_ids,
            vec![id(&table, "word-UNK"), id(&table, "pos-UNKPOS")]
        );
        assert_eq!(encoded[0].readable.word, "UNK");
        assert_eq!(encoded[0].readable.pos.as_deref(), Some("UNKPOS"));
        Ok(())
    }

    #[test]
    fn test_unknown_word_in_train_mode_falls_back() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["WORDCON"]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Train);
        let encoded = encoder.encode_sentence(&sentences("O NN Zanzibar\nO NN cat\n")[0])?;

        assert_eq!(encoded[0].readable.word, "UNK");
        assert!(encoded[0].vector.feature_ids.contains(&id(&table, "word-UNK")));
        assert!(encoded[1].vector.feature_ids.contains(&id(&table, "prev-word-UNK")));
        assert_eq!(encoded[1].readable.word_context.as_deref(), Some("UNK OMEGA"));
        Ok(())
    }

    #[test]
    fn test_missing_reserved_entry_is_an_error() {
        let (extractor, _) = setup(&["WORDCON"]);
        // A table built without WORDCON lacks the PHI/OMEGA entries.
        let (_, word_only) = setup(&[]);
        let encoder = Encoder::new(&extractor, &word_only, EncodeMode::Test);
        let result = encoder.encode_sentence(&sentences("O NNP The\nO NN cat\n")[0]);
        assert!(matches!(result, Err(NerError::MissingFeature { key }) if key == "prev-word-PHI"));
    }

    #[test]
    fn test_word_context_boundaries() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["WORDCON"]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Train);
        let encoded = encoder.encode_sentence(&sentences("O NNP The\nO NN cat\n")[0])?;

        let first = &encoded[0].vector.feature_ids;
        assert!(first.contains(&id(&table, "prev-word-PHI")));
        assert!(first.contains(&id(&table, "next-word-cat")));
        let last = &encoded[1].vector.feature_ids;
        assert!(last.contains(&id(&table, "prev-word-The")));
        assert!(last.contains(&id(&table, "next-word-OMEGA")));

        assert_eq!(encoded[0].readable.word_context.as_deref(), Some("PHI cat"));
        assert_eq!(encoded[1].readable.word_context.as_deref(), Some("The OMEGA"));
        Ok(())
    }

    #[test]
    fn test_single_token_sentence() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["WORDCON", "POSCON"]);
        for mode in [EncodeMode::Train, EncodeMode::Test] {
            let encoder = Encoder::new(&extractor, &table, mode);
            let encoded = encoder.encode_sentence(&vec![Token::new("O", "NN", "Earth")])?;
            assert_eq!(
                encoded[0].vector.feature_ids,
                vec![
                    id(&table, "word-Earth"),
                    id(&table, "prev-word-PHI"),
                    id(&table, "next-word-OMEGA"),
                    id(&table, "prev-pos-PHIPOS"),
                    id(&table, "next-pos-OMEGAPOS"),
                ]
            );
        }
        Ok(())
    }

    #[test]
    fn test_context_fallbacks_in_test_mode() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["WORDCON", "POSCON"]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Test);
        let encoded = encoder.encode_sentence(&sentences("O XX dog\nO NNP Paris\nO YY barks\n")[0])?;

        let middle = &encoded[1];
        let mut expected = vec![
            id(&table, "word-Paris"),
            id(&table, "prev-word-UNK"),
            id(&table, "next-word-UNK"),
            id(&table, "prev-pos-UNKPOS"),
            id(&table, "next-pos-UNKPOS"),
        ];
        expected.sort();
        assert_eq!(middle.vector.feature_ids, expected);
        assert_eq!(middle.readable.word_context.as_deref(), Some("UNK UNK"));
        assert_eq!(middle.readable.pos_context.as_deref(), Some("UNKPOS UNKPOS"));
        Ok(())
    }

    #[test]
    fn test_orthographic_and_location_features() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["ABBR", "CAP", "LOCATION"]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Test);
        let encoded = encoder.encode_sentence(&sentences("B-LOC NNP Paris\nO VBZ is\nO NNP Dr.\n")[0])?;

        let is_location = id(&table, "is-location");
        let capitalized = id(&table, "capitalized");
        let abbreviated = id(&table, "abbreviated");

        assert!(encoded[0].vector.feature_ids.contains(&is_location));
        assert!(encoded[0].vector.feature_ids.contains(&capitalized));
        assert!(!encoded[0].vector.feature_ids.contains(&abbreviated));
        assert_eq!(encoded[1].vector.feature_ids, vec![id(&table, "word-is")]);
        assert!(encoded[2].vector.feature_ids.contains(&abbreviated));
        assert!(!encoded[2].vector.feature_ids.contains(&is_location));

        assert_eq!(encoded[1].readable.location, Some(false));
        assert_eq!(encoded[0].readable.location, Some(true));
        Ok(())
    }

    #[test]
    fn test_bad_label() {
        let (extractor, table) = setup(&[]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Test);
        let result = encoder.encode_sentence(&vec![Token::new("X-FOO", "NN", "cat")]);
        assert!(matches!(result, Err(NerError::BadLabel { label }) if label == "X-FOO"));
    }

    #[test]
    fn test_readable_output() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&["POS", "CAP"]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Train);
        let encoded = encoder.encode_sentence(&sentences(TRAIN)[0])?;

        assert_eq!(
            encoded[0].readable.to_string(),
            "WORD: Paris\nWORDCON: n/a\nPOS: NNP\nPOSCON: n/a\nABBR: n/a\nCAP: yes\nLOCATION: n/a\n\n"
        );
        Ok(())
    }

    #[test]
    fn test_encode_all() -> Result<(), Box<dyn std::error::Error>> {
        let (extractor, table) = setup(&[]);
        let encoder = Encoder::new(&extractor, &table, EncodeMode::Train);
        let mut readable = Vec::new();
        let mut vectors = Vec::new();

        let num_tokens = encoder.encode_all(
            Corpus::new(Cursor::new(TRAIN), "train"),
            &mut readable,
            &mut vectors,
        )?;

        assert_eq!(num_tokens, 6);
        let vectors = String::from_utf8(vectors)?;
        let lines: Vec<&str> = vectors.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], format!("3 {}:1", id(&table, "word-Paris")));
        assert_eq!(lines[5], format!("0 {}:1", id(&table, "word-Earth")));

        let readable = String::from_utf8(readable)?;
        assert_eq!(readable.matches("WORD: ").count(), 6);
        assert!(readable.ends_with("LOCATION: n/a\n\n"));
        Ok(())
    }
}
