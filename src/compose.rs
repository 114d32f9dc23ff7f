//! Content composer – maps [`CertificateData`] to a structured [`Fragment`].
//!
//! The fragment is an ordered list of paragraphs made of typed inline runs.
//! Presentation (PDF layout, HTML markup) is left to its consumers.

use serde::{Deserialize, Serialize};

use crate::date::format_long_date;
use crate::model::{non_blank, CertificateData, CertificateKind};

const INTRO: &str = "Por medio del presente se certifica que ";

/// A run of text inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Inline {
    Text(String),
    Strong(String),
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Text(s) | Inline::Strong(s) => s,
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Inline::Strong(_))
    }
}

/// What a paragraph says, so renderers can space or style it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockRole {
    Body,
    Coauthors,
    Metadata,
    Closing,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub role: BlockRole,
    pub inlines: Vec<Inline>,
}

impl Block {
    fn new(role: BlockRole) -> Self {
        Self {
            role,
            inlines: Vec::new(),
        }
    }

    fn text(mut self, s: impl Into<String>) -> Self {
        self.inlines.push(Inline::Text(s.into()));
        self
    }

    fn strong(mut self, s: impl Into<String>) -> Self {
        self.inlines.push(Inline::Strong(s.into()));
        self
    }

    pub fn plain_text(&self) -> String {
        self.inlines.iter().map(Inline::text).collect()
    }
}

/// Composed certificate body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub blocks: Vec<Block>,
}

impl Fragment {
    /// Paragraphs joined by newlines, without any styling.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.blocks.iter().any(|b| b.plain_text().contains(needle))
    }

    pub fn has_role(&self, role: BlockRole) -> bool {
        self.blocks.iter().any(|b| b.role == role)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn push_metadata(&mut self, label: &str, value: &str) {
        if let Some(v) = non_blank(value) {
            self.push(Block::new(BlockRole::Metadata).text(label).strong(v));
        }
    }
}

/// Compose the certificate body for `data`. Pure and deterministic.
pub fn compose(data: &CertificateData) -> Fragment {
    let mut fragment = Fragment::default();
    let authors = data.named_authors().collect::<Vec<_>>().join(", ");
    let book = non_blank(&data.book_title).unwrap_or_default();

    let body = Block::new(BlockRole::Body).text(INTRO).strong(authors);
    let body = match data.kind {
        CertificateKind::Chapter => chapter_clause(body, data).text(" del libro ").strong(book),
        CertificateKind::Book => body.text(" es autor(a) del libro ").strong(book),
        CertificateKind::Region if data.references_chapter() => {
            chapter_clause(body, data).text(" del libro ").strong(book)
        }
        CertificateKind::Region => body.text(" es autor(a) del libro ").strong(book),
    };
    fragment.push(body.text("."));

    let coauthors = data.named_coauthors().collect::<Vec<_>>();
    if !coauthors.is_empty() {
        fragment.push(
            Block::new(BlockRole::Coauthors)
                .text("En coautoría con ")
                .strong(coauthors.join(", "))
                .text("."),
        );
    }

    fragment.push_metadata("ISBN: ", &data.isbn);
    if data.references_chapter() {
        fragment.push_metadata("Páginas del capítulo: ", &data.pages);
    } else {
        fragment.push_metadata("Número total de páginas: ", &data.total_pages);
    }
    fragment.push_metadata(
        "Fecha de publicación: ",
        &format_long_date(&data.publication_date),
    );

    if data.kind == CertificateKind::Region {
        fragment.push(
            Block::new(BlockRole::Closing)
                .text("El presente certificado es válido para la región de ")
                .strong(data.region.as_str())
                .text("."),
        );
    }

    if let Some(custom) = non_blank(&data.custom_text) {
        fragment.push(Block::new(BlockRole::Custom).text(custom));
    }

    log::debug!(
        "Composed {} certificate with {} blocks",
        data.kind,
        fragment.blocks.len()
    );
    fragment
}

fn chapter_clause(block: Block, data: &CertificateData) -> Block {
    let title = non_blank(&data.chapter_title).unwrap_or_default();
    let qualified = match non_blank(&data.chapter_number) {
        Some(n) => format!("{n}. {title}"),
        None => title.to_string(),
    };
    block.text(" es autor(a) del capítulo ").strong(qualified)
}
