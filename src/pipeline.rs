//! Pipeline – ties together composition, preview layout and export into a
//! single function call, plus the configuration shared by every stage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compose::compose;
use crate::error::{CertificateError, Result};
use crate::export::{ExportedDocument, Exporter};
use crate::images::{ImageLoader, ImageSet};
use crate::model::CertificateData;
use crate::preview::render_preview;
use crate::surface::Surface;

/// Largest accepted raster upscaling factor.
pub const MAX_UPSCALE: f32 = 8.0;
/// Largest accepted validation code side, in surface px.
pub const MAX_CODE_SIZE_PX: f32 = 1024.0;

/// Configuration for the certificate pipeline. Every field has a default, so
/// a config file only needs the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub document_title: String,
    /// Preview surface width in CSS px (default: A4 at 96 dpi).
    pub surface_width_px: f32,
    /// Minimum preview surface height in CSS px.
    pub surface_height_px: f32,
    /// Inner padding of the surface.
    pub padding_px: f32,
    /// Raster layers are rendered at this multiple of their displayed size.
    pub upscale: f32,
    /// Physical page width; page height follows the surface aspect ratio.
    pub page_width_mm: f32,
    /// Side of the validation code box.
    pub code_size_px: f32,
    pub title_font_px: f32,
    pub body_font_px: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub paragraph_gap_px: f32,
    pub logo_max_height_px: f32,
    pub signature_max_height_px: f32,
    /// Draw a thin frame inside the padding.
    pub frame: bool,
    /// Refuse to export certificates that fail required-field checks.
    pub strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            document_title: "Certificado".to_string(),
            surface_width_px: 794.0,
            surface_height_px: 1123.0,
            padding_px: 56.0,
            upscale: 2.0,
            page_width_mm: 210.0,
            code_size_px: 120.0,
            title_font_px: 28.0,
            body_font_px: 15.0,
            line_height: 1.5,
            paragraph_gap_px: 10.0,
            logo_max_height_px: 90.0,
            signature_max_height_px: 80.0,
            frame: true,
            strict: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CertificateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            CertificateError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        log::debug!("Loaded pipeline config from {}", path.display());
        Self::from_json(&json)
    }

    /// Rejects values that cannot lay out, or whose raster layers would
    /// not fit in memory.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("surface_width_px", self.surface_width_px),
            ("surface_height_px", self.surface_height_px),
            ("page_width_mm", self.page_width_mm),
            ("code_size_px", self.code_size_px),
            ("title_font_px", self.title_font_px),
            ("body_font_px", self.body_font_px),
            ("line_height", self.line_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CertificateError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.upscale.is_finite() && (1.0..=MAX_UPSCALE).contains(&self.upscale)) {
            return Err(CertificateError::Config(format!(
                "upscale must be between 1 and {MAX_UPSCALE}, got {}",
                self.upscale
            )));
        }
        if self.code_size_px > MAX_CODE_SIZE_PX {
            return Err(CertificateError::Config(format!(
                "code_size_px must be at most {MAX_CODE_SIZE_PX}, got {}",
                self.code_size_px
            )));
        }
        if self.padding_px < 0.0 || 2.0 * self.padding_px >= self.surface_width_px {
            return Err(CertificateError::Config(format!(
                "padding {} does not fit a {} px wide surface",
                self.padding_px, self.surface_width_px
            )));
        }
        Ok(())
    }

    /// Content width between the paddings.
    pub fn content_width(&self) -> f32 {
        self.surface_width_px - 2.0 * self.padding_px
    }
}

/// Compose and lay out `data` without exporting – useful for previews and
/// tests.
pub fn preview_certificate(
    data: &CertificateData,
    config: &PipelineConfig,
    loader: &dyn ImageLoader,
) -> Surface {
    let fragment = compose(data);
    let images = ImageSet::resolve(data, loader);
    render_preview(data, &fragment, &images, config)
}

/// Full pipeline: certificate data → named PDF document.
pub fn generate_certificate(
    data: &CertificateData,
    config: &PipelineConfig,
    loader: &dyn ImageLoader,
) -> Result<ExportedDocument> {
    config.validate()?;
    Exporter::new(config.clone()).export(data, loader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::EmbeddedOnlyLoader;
    use crate::samples;

    #[test]
    fn pipeline_basic() {
        let doc = generate_certificate(
            &samples::chapter(),
            &PipelineConfig::default(),
            &EmbeddedOnlyLoader,
        )
        .unwrap();
        assert_eq!(&doc.bytes[0..5], b"%PDF-");
        assert!(doc.filename.ends_with(".pdf"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{"upscale": 3, "strict": true}"#).unwrap();
        assert_eq!(config.upscale, 3.0);
        assert!(config.strict);
        assert_eq!(config.page_width_mm, 210.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(PipelineConfig::from_json(r#"{"upscale": 0.5}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"body_font_px": 0}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"padding_px": 500}"#).is_err());
    }

    #[test]
    fn raster_bounds_are_enforced() {
        assert!(PipelineConfig::from_json(r#"{"upscale": 1000}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"code_size_px": 100000}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"upscale": 8, "code_size_px": 1024}"#).is_ok());

        let config = PipelineConfig {
            upscale: 1000.0,
            ..PipelineConfig::default()
        };
        let err = generate_certificate(&samples::region(), &config, &EmbeddedOnlyLoader);
        assert!(matches!(err, Err(CertificateError::Config(_))));
    }
}
