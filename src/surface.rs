//! Surface – the frozen layout between the preview renderer and the export
//! pipeline. It encodes exactly what goes on the certificate page, in CSS
//! pixels with the origin at the top-left corner.

use std::collections::HashMap;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A laid-out certificate page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    pub width_px: f32,
    /// At least the configured page height; taller when content overflows.
    pub height_px: f32,
    /// Boxes in paint order (top to bottom).
    pub boxes: Vec<LayoutBox>,
    /// Decoded bitmaps referenced by [`ImageContent::asset`].
    #[serde(skip)]
    pub assets: HashMap<String, DynamicImage>,
}

/// What part of the certificate a box holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxRole {
    /// Decorative border around the page.
    Frame,
    Header,
    Logo,
    Title,
    Content,
    Code,
    Signature,
    Footer,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub role: BoxRole,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    /// Content (exactly one is set for non-decorative boxes)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,
    pub code: Option<CodeContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub line_height: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Y offset from the top of the box.
    pub y_offset: f32,
    /// The whole line as plain text.
    pub text: String,
    pub runs: Vec<TextRun>,
}

/// Same-weight text at a fixed offset within its line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub x_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    /// Key into [`Surface::assets`].
    pub asset: String,
    pub width: f32,
    pub height: f32,
}

/// A scannable code drawn at export time from its exact payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeContent {
    pub payload: String,
    pub size: f32,
}

impl Surface {
    pub fn new(title: impl Into<String>, width_px: f32, height_px: f32) -> Self {
        Self {
            title: title.into(),
            width_px,
            height_px,
            boxes: Vec::new(),
            assets: HashMap::new(),
        }
    }

    pub fn find(&self, role: BoxRole) -> Option<&LayoutBox> {
        self.boxes.iter().find(|b| b.role == role)
    }

    pub fn roles(&self) -> Vec<BoxRole> {
        self.boxes.iter().map(|b| b.role).collect()
    }

    /// All text on the surface, one line per entry.
    pub fn text_lines(&self) -> Vec<String> {
        self.boxes
            .iter()
            .filter_map(|b| b.text.as_ref())
            .flat_map(|t| t.lines.iter())
            .map(|l| l.text.clone())
            .collect()
    }

    /// Serialise the layout (without bitmaps) to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise a layout; assets must be re-attached by the caller.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl LayoutBox {
    pub fn new(role: BoxRole, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            role,
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            code: None,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}
