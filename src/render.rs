//! PDF assembly – rasterises the bitmap layers of a [`Surface`] at the
//! configured upscaling factor and writes a single-page PDF using `printpdf`
//! (v0.8 ops-based API).
//!
//! The page is `page_width_mm` wide; its height follows the surface aspect
//! ratio, so overflowing certificates produce a taller page instead of a
//! second one.

use std::collections::HashMap;
use std::io::Cursor;

use ::image::{imageops::FilterType, DynamicImage, ImageFormat};
use printpdf::*;

use crate::error::{CertificateError, Result};
use crate::qr::QrMatrix;
use crate::surface::{LayoutBox, Surface};

const MM_PER_PT: f32 = 0.352778;
/// Asset key of the rasterised validation code.
pub const CODE_ASSET: &str = "validation-code";

/// A bitmap ready for embedding, with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    pub png: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

/// Rasterise every image and code box of `surface`.
///
/// Images are downsampled to `upscale ×` their displayed size (never
/// enlarged). An image box whose asset is missing is skipped with a warning;
/// a code that cannot be encoded is an error.
pub fn rasterize_layers(surface: &Surface, upscale: f32) -> Result<HashMap<String, RasterLayer>> {
    let mut layers = HashMap::new();

    for lbox in &surface.boxes {
        if let Some(img) = &lbox.image {
            let Some(bitmap) = surface.assets.get(&img.asset) else {
                log::warn!("Skipping image box, asset '{}' not loaded", img.asset);
                continue;
            };
            let target_w = (img.width * upscale).ceil().max(1.0) as u32;
            let target_h = (img.height * upscale).ceil().max(1.0) as u32;
            let resized = if bitmap.width() > target_w || bitmap.height() > target_h {
                bitmap.resize(target_w, target_h, FilterType::Triangle)
            } else {
                bitmap.clone()
            };
            layers.insert(img.asset.clone(), encode_png(&resized)?);
        }

        if let Some(code) = &lbox.code {
            let matrix = QrMatrix::encode(&code.payload)?;
            let target = (code.size * upscale).ceil().max(1.0) as u32;
            let bitmap = DynamicImage::ImageLuma8(matrix.to_bitmap_at_least(target));
            layers.insert(CODE_ASSET.to_string(), encode_png(&bitmap)?);
        }
    }

    Ok(layers)
}

fn encode_png(img: &DynamicImage) -> Result<RasterLayer> {
    let mut png = Vec::new();
    // Flatten to RGB: the PDF image filter handles 8-bit RGB reliably.
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| CertificateError::Render(format!("PNG encode error: {e}")))?;
    Ok(RasterLayer {
        png,
        px_width: img.width(),
        px_height: img.height(),
    })
}

/// Page size in points for a surface rendered `page_width_mm` wide.
pub fn page_size_pt(surface: &Surface, page_width_mm: f32) -> (f32, f32) {
    let width_pt = page_width_mm / MM_PER_PT;
    let height_pt = surface.height_px * width_pt / surface.width_px;
    (width_pt, height_pt)
}

/// Render a surface into PDF bytes.
pub fn render_pdf(surface: &Surface, upscale: f32, page_width_mm: f32) -> Result<Vec<u8>> {
    let layers = rasterize_layers(surface, upscale)?;

    let (page_w_pt, page_h_pt) = page_size_pt(surface, page_width_mm);
    let page = PageGeometry {
        height_pt: page_h_pt,
        pt_per_px: page_w_pt / surface.width_px,
    };

    let mut doc = PdfDocument::new(&surface.title);

    // ── Register raster layers ────────────────────────────────────────────
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut xobjects: HashMap<&str, (XObjectId, &RasterLayer)> = HashMap::new();
    for (key, layer) in &layers {
        let raw = RawImage::decode_from_bytes(&layer.png, &mut warnings)
            .map_err(|e| CertificateError::Render(format!("PDF image error: {e}")))?;
        xobjects.insert(key.as_str(), (doc.add_image(&raw), layer));
    }

    // ── Paint boxes ───────────────────────────────────────────────────────
    let mut ops = Vec::new();
    for lbox in &surface.boxes {
        render_box(&mut ops, lbox, &page, &xobjects);
    }

    let pdf_page = PdfPage::new(Mm(page_w_pt * MM_PER_PT), Mm(page_h_pt * MM_PER_PT), ops);
    doc.with_pages(vec![pdf_page]);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());

    log::debug!(
        "Rendered PDF: {} bytes, {} raster layers",
        bytes.len(),
        layers.len()
    );
    Ok(bytes)
}

/// Converts surface pixels (top-left origin) to PDF points (bottom-left).
struct PageGeometry {
    height_pt: f32,
    pt_per_px: f32,
}

impl PageGeometry {
    fn x(&self, px: f32) -> f32 {
        px * self.pt_per_px
    }

    fn y(&self, px: f32) -> f32 {
        self.height_pt - px * self.pt_per_px
    }

    fn len(&self, px: f32) -> f32 {
        px * self.pt_per_px
    }
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn corner_points(x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<LinePoint> {
    [(x1, y2), (x2, y2), (x2, y1), (x1, y1)]
        .into_iter()
        .map(|(x, y)| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        })
        .collect()
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: the result is not valid UTF-8 whenever the text has a glyph in
    // 0x80-0xFF (accented Latin letters such as á é í ó ú ñ live in
    // 0xA0-0xFF). It is never inspected as `str`: it goes straight into a
    // `TextItem`, whose bytes printpdf copies verbatim into the content
    // stream for WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page: &PageGeometry,
    xobjects: &HashMap<&str, (XObjectId, &RasterLayer)>,
) {
    let x1 = page.x(lbox.x);
    let x2 = page.x(lbox.x + lbox.width);
    let y_top = page.y(lbox.y);
    let y_bottom = page.y(lbox.bottom());

    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: corner_points(x1, y_bottom, x2, y_top),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(&border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(page.len(border.width)),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: corner_points(x1, y_bottom, x2, y_top),
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let font_pt = page.len(text.font_size);
        let half_leading = (text.line_height - text.font_size) / 2.0;
        for line in &text.lines {
            // Baseline ≈ top of line + half leading + ascender (0.75 em).
            let baseline =
                page.y(lbox.y + line.y_offset + half_leading) - font_pt * 0.75;
            for run in line.runs.iter().filter(|r| !r.text.is_empty()) {
                let font = if run.bold {
                    BuiltinFont::HelveticaBold
                } else {
                    BuiltinFont::Helvetica
                };
                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(page.x(lbox.x + run.x_offset)),
                        y: Pt(baseline),
                    },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(font_pt),
                    font,
                });
                ops.push(Op::SetFillColor {
                    col: rgb(&text.color),
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(to_winlatin(&run.text))],
                    font,
                });
                ops.push(Op::EndTextSection);
            }
        }
    }

    let layer_key = match (&lbox.image, &lbox.code) {
        (Some(img), _) => Some(img.asset.as_str()),
        (None, Some(_)) => Some(CODE_ASSET),
        (None, None) => None,
    };
    if let Some((id, layer)) = layer_key.and_then(|k| xobjects.get(k)) {
        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = target_pt / px.
        let scale_x = page.len(lbox.width) / layer.px_width.max(1) as f32;
        let scale_y = page.len(lbox.height) / layer.px_height.max(1) as f32;
        ops.push(Op::UseXobject {
            id: id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(x1)),
                translate_y: Some(Pt(y_bottom)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        });
    }
}
