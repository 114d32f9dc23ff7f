//! Certificate data model – the single record an editing session holds.
//!
//! The JSON shape mirrors what the admin form produces: camelCase keys, the
//! certificate kind under `"type"`, and every field optional.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CertificateError, Result};

/// Heading used when `title` is blank.
pub const FALLBACK_TITLE: &str = "CERTIFICADO";

/// Which composition rule applies to a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateKind {
    /// Authorship of a single chapter.
    #[default]
    Chapter,
    /// Authorship of a whole book.
    Book,
    /// Regional validity certificate, optionally referencing a chapter.
    Region,
}

impl CertificateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateKind::Chapter => "chapter",
            CertificateKind::Book => "book",
            CertificateKind::Region => "region",
        }
    }
}

impl fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One certificate instance. Never persisted by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateData {
    #[serde(rename = "type")]
    pub kind: CertificateKind,
    pub title: String,
    pub book_title: String,
    pub chapter_title: String,
    pub chapter_number: String,
    pub authors: Vec<String>,
    pub coauthors: Vec<String>,
    pub isbn: String,
    pub pages: String,
    pub total_pages: String,
    pub publication_date: String,
    pub region: String,
    pub validation_url: String,
    pub logo: Option<String>,
    pub signature: Option<String>,
    pub header_image: Option<String>,
    pub footer_image: Option<String>,
    pub custom_text: String,
}

/// A required field that is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationIssue {
    MissingAuthors,
    MissingBookTitle,
    MissingChapterTitle,
    MissingRegion,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidationIssue::MissingAuthors => "at least one author is required",
            ValidationIssue::MissingBookTitle => "book title is required",
            ValidationIssue::MissingChapterTitle => "chapter title is required",
            ValidationIssue::MissingRegion => "region is required",
        };
        f.write_str(msg)
    }
}

impl CertificateData {
    /// A blank certificate of the given kind.
    pub fn new(kind: CertificateKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CertificateError::InvalidData(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Heading text, or [`FALLBACK_TITLE`] when blank.
    pub fn display_title(&self) -> &str {
        non_blank(&self.title).unwrap_or(FALLBACK_TITLE)
    }

    /// Authors with blank entries dropped, in order.
    pub fn named_authors(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().filter_map(|a| non_blank(a))
    }

    pub fn named_coauthors(&self) -> impl Iterator<Item = &str> {
        self.coauthors.iter().filter_map(|a| non_blank(a))
    }

    /// True when a region certificate references a specific chapter.
    pub fn references_chapter(&self) -> bool {
        match self.kind {
            CertificateKind::Chapter => true,
            CertificateKind::Book => false,
            CertificateKind::Region => non_blank(&self.chapter_title).is_some(),
        }
    }

    /// Required-field checks. Composition never depends on the result.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.named_authors().next().is_none() {
            issues.push(ValidationIssue::MissingAuthors);
        }
        if non_blank(&self.book_title).is_none() {
            issues.push(ValidationIssue::MissingBookTitle);
        }
        match self.kind {
            CertificateKind::Chapter => {
                if non_blank(&self.chapter_title).is_none() {
                    issues.push(ValidationIssue::MissingChapterTitle);
                }
            }
            CertificateKind::Region => {
                if non_blank(&self.region).is_none() {
                    issues.push(ValidationIssue::MissingRegion);
                }
            }
            CertificateKind::Book => {}
        }
        issues
    }
}

/// `Some(trimmed)` when the value carries any non-whitespace text.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
