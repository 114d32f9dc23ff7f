//! Scannable validation code – encodes the validation URL as a QR symbol and
//! rasterises it to a grayscale bitmap.

use std::fmt;

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::{CertificateError, Result};

/// Light modules required around the symbol for reliable scanning.
pub const QUIET_ZONE: usize = 4;

/// An encoded symbol.
pub struct QrMatrix {
    code: QrCode,
}

impl fmt::Debug for QrMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrMatrix")
            .field("width", &self.code.width())
            .field("version", &self.code.version())
            .finish()
    }
}

impl QrMatrix {
    /// Encode `payload` byte-for-byte. No normalisation is applied.
    pub fn encode(payload: &str) -> Result<Self> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| CertificateError::Code(e.to_string()))?;
        Ok(Self { code })
    }

    /// Modules per side, without the quiet zone.
    pub fn width(&self) -> usize {
        self.code.width()
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.code[(x, y)] == Color::Dark
    }

    /// Modules per side including the quiet zone on both edges.
    pub fn total_modules(&self) -> usize {
        self.width() + 2 * QUIET_ZONE
    }

    /// Rasterise with `module_px` pixels per module (minimum 1).
    pub fn to_bitmap(&self, module_px: u32) -> GrayImage {
        let module_px = module_px.max(1);
        self.code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(module_px, module_px)
            .build()
    }

    /// Rasterise so that the bitmap is at least `target_px` wide.
    pub fn to_bitmap_at_least(&self, target_px: u32) -> GrayImage {
        let modules = self.total_modules() as u32;
        self.to_bitmap(target_px.div_ceil(modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_has_finder_corner() {
        let m = QrMatrix::encode("https://example.org/v/1").unwrap();
        assert!(m.width() >= 21);
        // Finder patterns are dark at their outer corners.
        assert!(m.is_dark(0, 0));
        assert!(m.is_dark(m.width() - 1, 0));
        assert!(m.is_dark(0, m.width() - 1));
    }

    #[test]
    fn bitmap_has_quiet_zone() {
        let m = QrMatrix::encode("abc").unwrap();
        let bmp = m.to_bitmap(3);
        assert_eq!(bmp.width(), m.total_modules() as u32 * 3);
        assert_eq!(bmp.get_pixel(0, 0).0[0], 255);
        let edge = QUIET_ZONE as u32 * 3;
        assert_eq!(bmp.get_pixel(edge, edge).0[0], 0);
    }

    #[test]
    fn bitmap_matches_module_grid() {
        let m = QrMatrix::encode("https://example.org/v/REG-7").unwrap();
        let px = 2;
        let bmp = m.to_bitmap(px);
        let quiet = QUIET_ZONE as u32 * px;
        for y in 0..m.width() {
            for x in 0..m.width() {
                let luma = bmp.get_pixel(quiet + x as u32 * px, quiet + y as u32 * px).0[0];
                assert_eq!(luma == 0, m.is_dark(x, y), "module ({x}, {y})");
            }
        }
    }

    #[test]
    fn at_least_rounds_up() {
        let m = QrMatrix::encode("abc").unwrap();
        let bmp = m.to_bitmap_at_least(240);
        assert!(bmp.width() >= 240);
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let huge = "x".repeat(5000);
        assert!(matches!(QrMatrix::encode(&huge), Err(CertificateError::Code(_))));
    }
}
