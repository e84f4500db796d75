use std::fmt;
use std::str::FromStr;

use crate::error::NerError;

/// BIO named entity label.
///
/// Each label maps to the small integer code the vector files carry:
/// `O=0, B-PER=1, I-PER=2, B-LOC=3, I-LOC=4, B-ORG=5, I-ORG=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Outside,
    BeginPerson,
    InsidePerson,
    BeginLocation,
    InsideLocation,
    BeginOrganization,
    InsideOrganization,
}

impl Label {
    /// Returns the integer code written at the start of each vector line.
    ///
    /// # Example
    /// ```
    /// use nerfeat::label::Label;
    ///
    /// let label: Label = "B-LOC".parse().unwrap();
    /// assert_eq!(label.code(), 3);
    /// ```
    pub fn code(self) -> u8 {
        match self {
            Label::Outside => 0,
            Label::BeginPerson => 1,
            Label::InsidePerson => 2,
            Label::BeginLocation => 3,
            Label::InsideLocation => 4,
            Label::BeginOrganization => 5,
            Label::InsideOrganization => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Outside => "O",
            Label::BeginPerson => "B-PER",
            Label::InsidePerson => "I-PER",
            Label::BeginLocation => "B-LOC",
            Label::InsideLocation => "I-LOC",
            Label::BeginOrganization => "B-ORG",
            Label::InsideOrganization => "I-ORG",
        }
    }
}

impl FromStr for Label {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "O" => Ok(Label::Outside),
            "B-PER" => Ok(Label::BeginPerson),
            "I-PER" => Ok(Label::InsidePerson),
            "B-LOC" => Ok(Label::BeginLocation),
            "I-LOC" => Ok(Label::InsideLocation),
            "B-ORG" => Ok(Label::BeginOrganization),
            "I-ORG" => Ok(Label::InsideOrganization),
            _ => Err(NerError::BadLabel {
                label: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
