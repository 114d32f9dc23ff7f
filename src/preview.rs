//! Preview renderer – lays out a composed [`Fragment`] and the certificate
//! imagery on a fixed-width [`Surface`].
//!
//! Vertical order: header image, logo, title, content paragraphs,
//! validation code, signature, footer image. The footer is anchored to the
//! bottom of the page; when content runs past the page the surface grows.

use image::DynamicImage;

use crate::compose::{Fragment, Inline};
use crate::fonts::{wrap_runs, WrappedLine};
use crate::images::{ImageSet, ImageSlot};
use crate::model::{non_blank, CertificateData};
use crate::pipeline::PipelineConfig;
use crate::surface::*;

const TITLE_COLOR: [f32; 4] = [0.102, 0.212, 0.365, 1.0];
const BODY_COLOR: [f32; 4] = [0.13, 0.13, 0.13, 1.0];
const FRAME_COLOR: [f32; 4] = [0.65, 0.52, 0.2, 1.0];
const FRAME_WIDTH: f32 = 1.5;

/// Lay out one certificate page. Pure: images that are missing from
/// `images` are simply not drawn.
pub fn render_preview(
    data: &CertificateData,
    fragment: &Fragment,
    images: &ImageSet,
    config: &PipelineConfig,
) -> Surface {
    let mut surface = Surface::new(
        config.document_title.clone(),
        config.surface_width_px,
        config.surface_height_px,
    );
    let page_w = config.surface_width_px;
    let pad = config.padding_px;
    let content_w = config.content_width();
    let gap = config.paragraph_gap_px;

    let mut y = 0.0;

    if let Some(img) = images.get(ImageSlot::Header) {
        let (w, h) = fit(img, page_w, f32::INFINITY);
        place_image(&mut surface, ImageSlot::Header, img, 0.0, 0.0, w, h);
        y = h;
    }
    y += pad;

    if let Some(img) = images.get(ImageSlot::Logo) {
        let (w, h) = fit(img, content_w, config.logo_max_height_px);
        place_image(&mut surface, ImageSlot::Logo, img, (page_w - w) / 2.0, y, w, h);
        y += h + 2.0 * gap;
    }

    let title = [Inline::Strong(data.display_title().to_string())];
    let title_lines = wrap_runs(&title, config.title_font_px, content_w);
    y = place_text(
        &mut surface,
        BoxRole::Title,
        &title_lines,
        config.title_font_px,
        config.line_height,
        TITLE_COLOR,
        pad,
        y,
        content_w,
    ) + 2.0 * gap;

    for block in &fragment.blocks {
        let lines = wrap_runs(&block.inlines, config.body_font_px, content_w);
        y = place_text(
            &mut surface,
            BoxRole::Content,
            &lines,
            config.body_font_px,
            config.line_height,
            BODY_COLOR,
            pad,
            y,
            content_w,
        ) + gap;
    }

    if non_blank(&data.validation_url).is_some() {
        y += gap;
        let size = config.code_size_px;
        let mut lbox = LayoutBox::new(BoxRole::Code, (page_w - size) / 2.0, y, size, size);
        // The payload is the field exactly as typed.
        lbox.code = Some(CodeContent {
            payload: data.validation_url.clone(),
            size,
        });
        surface.boxes.push(lbox);
        y += size + gap;
    }

    if let Some(img) = images.get(ImageSlot::Signature) {
        y += gap;
        let (w, h) = fit(img, content_w / 2.0, config.signature_max_height_px);
        place_image(&mut surface, ImageSlot::Signature, img, (page_w - w) / 2.0, y, w, h);
        y += h;
    }

    let mut bottom = y + pad;
    if let Some(img) = images.get(ImageSlot::Footer) {
        let (w, h) = fit(img, page_w, f32::INFINITY);
        let footer_y = bottom.max(config.surface_height_px - h);
        place_image(&mut surface, ImageSlot::Footer, img, 0.0, footer_y, w, h);
        bottom = footer_y + h;
    }

    surface.height_px = config.surface_height_px.max(bottom);

    if config.frame {
        let inset = pad / 2.0;
        let mut frame = LayoutBox::new(
            BoxRole::Frame,
            inset,
            inset,
            page_w - 2.0 * inset,
            surface.height_px - 2.0 * inset,
        );
        frame.border = Some(BorderStyle {
            width: FRAME_WIDTH,
            color: FRAME_COLOR,
        });
        surface.boxes.insert(0, frame);
    }

    log::debug!(
        "Laid out {} boxes on a {}x{} px surface",
        surface.boxes.len(),
        surface.width_px,
        surface.height_px
    );
    surface
}

/// Scale `img` to fit `max_w` × `max_h`, keeping its aspect ratio.
fn fit(img: &DynamicImage, max_w: f32, max_h: f32) -> (f32, f32) {
    let (iw, ih) = (img.width() as f32, img.height() as f32);
    let scale = (max_w / iw).min(max_h / ih);
    (iw * scale, ih * scale)
}

fn place_image(
    surface: &mut Surface,
    slot: ImageSlot,
    img: &DynamicImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    let role = match slot {
        ImageSlot::Header => BoxRole::Header,
        ImageSlot::Logo => BoxRole::Logo,
        ImageSlot::Signature => BoxRole::Signature,
        ImageSlot::Footer => BoxRole::Footer,
    };
    let asset = slot.asset_id().to_string();
    let mut lbox = LayoutBox::new(role, x, y, width, height);
    lbox.image = Some(ImageContent {
        asset: asset.clone(),
        width,
        height,
    });
    surface.boxes.push(lbox);
    surface.assets.insert(asset, img.clone());
}

/// Place centred lines at `y`; returns the y just below the box.
#[allow(clippy::too_many_arguments)]
fn place_text(
    surface: &mut Surface,
    role: BoxRole,
    lines: &[WrappedLine],
    font_size: f32,
    line_height: f32,
    color: [f32; 4],
    x: f32,
    y: f32,
    width: f32,
) -> f32 {
    let lh = font_size * line_height;
    let text_lines: Vec<TextLine> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let align = ((width - line.width) / 2.0).max(0.0);
            TextLine {
                y_offset: i as f32 * lh,
                text: line.text(),
                runs: line
                    .segments
                    .iter()
                    .map(|seg| TextRun {
                        text: seg.text.clone(),
                        bold: seg.bold,
                        x_offset: align + seg.x,
                    })
                    .collect(),
            }
        })
        .collect();
    let height = lines.len() as f32 * lh;
    let mut lbox = LayoutBox::new(role, x, y, width, height);
    lbox.text = Some(TextContent {
        lines: text_lines,
        font_size,
        line_height: lh,
        color,
    });
    surface.boxes.push(lbox);
    y + height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;
    use crate::images::{EmbeddedOnlyLoader, ImageSet};
    use crate::samples;

    fn layout(data: &CertificateData) -> Surface {
        let images = ImageSet::resolve(data, &EmbeddedOnlyLoader);
        render_preview(data, &compose(data), &images, &PipelineConfig::default())
    }

    #[test]
    fn vertical_order_is_fixed() {
        let surface = layout(&samples::chapter());
        let order: Vec<BoxRole> = surface
            .roles()
            .into_iter()
            .filter(|r| *r != BoxRole::Content && *r != BoxRole::Frame)
            .collect();
        assert_eq!(
            order,
            vec![
                BoxRole::Header,
                BoxRole::Logo,
                BoxRole::Title,
                BoxRole::Code,
                BoxRole::Signature,
                BoxRole::Footer,
            ]
        );
        let mut last_y = f32::MIN;
        for b in surface.boxes.iter().filter(|b| b.role != BoxRole::Frame) {
            assert!(b.y >= last_y, "{:?} overlaps its predecessor", b.role);
            last_y = b.y;
        }
    }

    #[test]
    fn missing_images_are_omitted() {
        let mut data = samples::chapter();
        data.header_image = None;
        data.logo = Some("https://example.invalid/logo.png".into());
        data.signature = Some("data:image/png;base64,!!!".into());
        let surface = layout(&data);
        assert!(surface.find(BoxRole::Header).is_none());
        assert!(surface.find(BoxRole::Logo).is_none());
        assert!(surface.find(BoxRole::Signature).is_none());
        assert!(!surface.assets.contains_key("logo"));
    }

    #[test]
    fn blank_url_has_no_code_box() {
        let mut data = samples::book();
        data.validation_url = "   ".into();
        assert!(layout(&data).find(BoxRole::Code).is_none());
    }

    #[test]
    fn fallback_title_is_drawn() {
        let mut data = samples::book();
        data.title.clear();
        let lines = layout(&data).text_lines();
        assert_eq!(lines[0], "CERTIFICADO");
    }

    #[test]
    fn long_content_grows_surface() {
        let mut data = samples::book();
        data.custom_text = "Texto adicional de prueba. ".repeat(400);
        let surface = layout(&data);
        assert!(surface.height_px > PipelineConfig::default().surface_height_px);
        let footer = surface.find(BoxRole::Footer).unwrap();
        assert!((footer.bottom() - surface.height_px).abs() < 0.01);
    }

    #[test]
    fn footer_is_anchored_to_page_bottom() {
        let surface = layout(&samples::chapter());
        let footer = surface.find(BoxRole::Footer).unwrap();
        assert!((footer.bottom() - surface.height_px).abs() < 0.01);
        assert_eq!(surface.height_px, PipelineConfig::default().surface_height_px);
    }

    #[test]
    fn lines_stay_inside_content_width() {
        let config = PipelineConfig::default();
        let surface = layout(&samples::region());
        for b in surface.boxes.iter().filter(|b| b.text.is_some()) {
            assert!(b.x >= config.padding_px - 0.01);
            assert!(b.x + b.width <= config.surface_width_px - config.padding_px + 0.01);
        }
    }
}
