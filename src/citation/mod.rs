//! Citation domain types shared between the batch engine and the
//! collaborator services: styles, source types, and metadata records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Citation formatting style.
///
/// Exactly one style is active for a whole batch; a batch never mixes
/// styles. The wire form is the canonical name ("APA", "Chicago", ...),
/// matching what the formatting service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    /// American Psychological Association (7th edition)
    #[serde(rename = "APA")]
    Apa,
    /// Modern Language Association (9th edition)
    #[serde(rename = "MLA")]
    Mla,
    /// Chicago Manual of Style
    Chicago,
    /// Harvard referencing
    Harvard,
}

impl Style {
    /// Returns the canonical wire/display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apa => "APA",
            Self::Mla => "MLA",
            Self::Chicago => "Chicago",
            Self::Harvard => "Harvard",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Style {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "apa" => Ok(Self::Apa),
            "mla" => Ok(Self::Mla),
            "chicago" => Ok(Self::Chicago),
            "harvard" => Ok(Self::Harvard),
            _ => Err(format!(
                "unknown citation style '{value}' (expected APA, MLA, Chicago, or Harvard)"
            )),
        }
    }
}

/// Category of cited work, determining which metadata fields the formatting
/// service requires.
///
/// Batch runs always submit [`SourceType::Website`]; the other variants are
/// part of the formatting service contract and are used by single-citation
/// callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A web page addressed by URL.
    Website,
    /// A published book.
    Book,
    /// A journal article.
    Journal,
}

impl SourceType {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Book => "book",
            Self::Journal => "journal",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata extracted for a single source.
///
/// All fields are plain strings; anything the extraction service could not
/// determine is an empty string, never a missing value. Serde defaults keep
/// that invariant when fields are absent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    /// Page or work title.
    pub title: String,
    /// Author name as reported by the source.
    pub author: String,
    /// Publication date string (format is source-dependent).
    pub date: String,
    /// Publisher or site name.
    pub publisher: String,
}

impl MetadataRecord {
    /// Returns the title, or `fallback` when the title is empty.
    #[must_use]
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.is_empty() {
            fallback
        } else {
            &self.title
        }
    }

    /// Returns true if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.author.is_empty()
            && self.date.is_empty()
            && self.publisher.is_empty()
    }
}
