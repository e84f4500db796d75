use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::NerError;

/// One corpus line: `LABEL POS WORD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub label: String,
    pub pos: String,
    pub word: String,
}

impl Token {
    pub fn new(label: &str, pos: &str, word: &str) -> Self {
        Token {
            label: label.to_string(),
            pos: pos.to_string(),
            word: word.to_string(),
        }
    }
}

/// A non-empty run of tokens between blank lines.
pub type Sentence = Vec<Token>;

/// Iterator over the sentences of a tagged corpus.
///
/// Sentences are separated by one or more blank lines. The last sentence is
/// yielded even when the input does not end with a blank line. Every call to
/// [`Corpus::open`] starts a fresh pass over the file.
pub struct Corpus<R> {
    reader: R,
    source_name: String,
    line_number: usize,
    buf: String,
    done: bool,
}

impl Corpus<io::BufReader<File>> {
    /// Opens a corpus file for one reading pass.
    ///
    /// # Arguments
    /// * `path` - The path to the tagged corpus.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, NerError> {
        let file = File::open(path)?;
        Ok(Corpus::new(
            io::BufReader::new(file),
            path.display().to_string(),
        ))
    }
}

impl<R: BufRead> Corpus<R> {
    /// Wraps any buffered reader. `source_name` only shows up in error messages.
    ///
    /// # Example
    /// ```
    /// use std::io::Cursor;
    ///
    /// use nerfeat::corpus::Corpus;
    ///
    /// let text = "B-LOC NNP Paris\nO VBZ is\n\nO NN rain\n";
    /// let sentences = Corpus::new(Cursor::new(text), "inline")
    ///     .collect::<Result<Vec<_>, _>>()
    ///     .unwrap();
    /// assert_eq!(sentences.len(), 2);
    /// assert_eq!(sentences[0][0].word, "Paris");
    /// ```
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        Corpus {
            reader,
            source_name: source_name.into(),
            line_number: 0,
            buf: String::new(),
            done: false,
        }
    }

    fn parse_line(&self, line: &str) -> Result<Token, NerError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [label, pos, word] => Ok(Token::new(label, pos, word)),
            _ => Err(NerError::MalformedLine {
                source_name: self.source_name.clone(),
                line_number: self.line_number,
                line: line.to_string(),
            }),
        }
    }

    fn next_sentence(&mut self) -> Result<Option<Sentence>, NerError> {
        let mut sentence = Sentence::new();
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                // Flush whatever is pending at end of input.
                self.done = true;
                return Ok((!sentence.is_empty()).then_some(sentence));
            }
            self.line_number += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                if !sentence.is_empty() {
                    return Ok(Some(sentence));
                }
                continue;
            }
            sentence.push(self.parse_line(line)?);
        }
    }
}

impl<R: BufRead> Iterator for Corpus<R> {
    type Item = Result<Sentence, NerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_sentence() {
            Ok(sentence) => sentence.map(Ok),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
