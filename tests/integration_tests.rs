//! Integration tests for the certificate pipeline.
//!
//! These tests validate:
//! - Composition is deterministic and honours the per-kind rules
//! - The validation code decodes back to the exact URL
//! - Filenames follow the derivation rule
//! - Exported PDFs exist, are well-formed and are page-width scaled

use sha2::{Digest, Sha256};

use cert_forge::compose::{compose, BlockRole};
use cert_forge::export::{derive_filename, DirectorySink, Exporter};
use cert_forge::images::{EmbeddedOnlyLoader, ImageLoader};
use cert_forge::markup::to_html;
use cert_forge::model::{CertificateData, CertificateKind};
use cert_forge::pipeline::{generate_certificate, preview_certificate, PipelineConfig};
use cert_forge::qr::QrMatrix;
use cert_forge::render::{page_size_pt, rasterize_layers, render_pdf, CODE_ASSET};
use cert_forge::samples;
use cert_forge::session::EditingSession;
use cert_forge::surface::{BoxRole, Surface};
use cert_forge::CertificateError;

// =====================================================================
// Helpers
// =====================================================================

fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn digest(s: &str) -> Vec<u8> {
    Sha256::digest(s.as_bytes()).to_vec()
}

fn decode_code(gray: &image::GrayImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        gray.width() as usize,
        gray.height() as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one code");
    let (_, content) = grids[0].decode().expect("code should decode");
    content
}

fn scenario() -> CertificateData {
    CertificateData::from_json(
        r#"{
            "type": "chapter",
            "authors": ["Juan Pérez"],
            "chapterTitle": "Introducción",
            "bookTitle": "Manual Clínico",
            "isbn": "978-1-23",
            "pages": "12",
            "publicationDate": "2024-05-01"
        }"#,
    )
    .unwrap()
}

// =====================================================================
// Composition
// =====================================================================

#[test]
fn composition_is_deterministic_for_every_kind() {
    for data in [samples::chapter(), samples::book(), samples::region()] {
        let first = compose(&data).to_json();
        let second = compose(&data).to_json();
        assert_eq!(digest(&first), digest(&second), "kind {}", data.kind);
        assert_eq!(to_html(&compose(&data)), to_html(&compose(&data)));
    }
}

#[test]
fn coauthor_line_only_when_present() {
    let mut data = samples::book();
    data.coauthors.clear();
    let fragment = compose(&data);
    assert!(!fragment.has_role(BlockRole::Coauthors));
    assert!(!fragment.plain_text().contains("coautoría"));

    data.coauthors = vec!["Zoe Abad".into(), "Ángel Brea".into(), "Iria Costa".into()];
    let fragment = compose(&data);
    assert!(fragment.contains("Zoe Abad, Ángel Brea, Iria Costa"));
}

#[test]
fn region_name_appears_verbatim() {
    let mut data = samples::region();
    data.region = "Comunitat Valenciana".into();
    assert!(compose(&data).contains("Comunitat Valenciana"));
}

#[test]
fn end_to_end_chapter_scenario() {
    let data = scenario();
    let text = compose(&data).plain_text();
    for needle in [
        "Juan Pérez",
        "Introducción",
        "Manual Clínico",
        "978-1-23",
        "12",
        "1 de mayo de 2024",
    ] {
        assert!(text.contains(needle), "{needle:?} missing from {text:?}");
    }

    let doc = generate_certificate(&data, &default_config(), &EmbeddedOnlyLoader).unwrap();
    assert!(doc.filename.contains("_capitulo_juan"));
    assert_valid_pdf(&doc.bytes);
}

// =====================================================================
// Preview
// =====================================================================

#[test]
fn blank_url_omits_code() {
    let mut data = samples::chapter();
    data.validation_url = String::new();
    let surface = preview_certificate(&data, &default_config(), &EmbeddedOnlyLoader);
    assert!(surface.find(BoxRole::Code).is_none());
    assert!(!rasterize_layers(&surface, 2.0)
        .unwrap()
        .contains_key(CODE_ASSET));
}

#[test]
fn code_decodes_to_exact_url() {
    let url = "https://certificados.example.org/v/REG-2024-0107?lang=es&x=%20";
    let matrix = QrMatrix::encode(url).unwrap();
    assert_eq!(decode_code(&matrix.to_bitmap(4)), url);
}

#[test]
fn exported_code_layer_decodes_to_url() {
    let data = samples::region();
    let surface = preview_certificate(&data, &default_config(), &EmbeddedOnlyLoader);
    let code_box = surface.find(BoxRole::Code).unwrap();
    assert_eq!(code_box.code.as_ref().unwrap().payload, data.validation_url);

    let layers = rasterize_layers(&surface, default_config().upscale).unwrap();
    let png = &layers[CODE_ASSET].png;
    let gray = image::load_from_memory(png).unwrap().to_luma8();
    assert_eq!(decode_code(&gray), data.validation_url);
}

#[test]
fn surface_json_roundtrip() {
    let surface = preview_certificate(&samples::book(), &default_config(), &EmbeddedOnlyLoader);
    let parsed = Surface::from_json(&surface.to_json()).unwrap();
    assert_eq!(parsed.boxes.len(), surface.boxes.len());
    assert!((parsed.height_px - surface.height_px).abs() < 0.01);
    assert!(parsed.assets.is_empty());
    // Without bitmaps the images are skipped, the rest still renders.
    assert_valid_pdf(&render_pdf(&parsed, 2.0, 210.0).unwrap());
}

#[test]
fn failing_loader_never_breaks_the_render() {
    struct Unreachable;
    impl ImageLoader for Unreachable {
        fn load(&self, reference: &str) -> cert_forge::Result<Vec<u8>> {
            Err(CertificateError::Image(format!("{reference} unreachable")))
        }
    }
    let surface = preview_certificate(&samples::chapter(), &default_config(), &Unreachable);
    for role in [BoxRole::Header, BoxRole::Logo, BoxRole::Signature, BoxRole::Footer] {
        assert!(surface.find(role).is_none(), "{role:?} should be absent");
    }
    assert!(surface.find(BoxRole::Title).is_some());
    assert!(surface.find(BoxRole::Code).is_some());
}

// =====================================================================
// Export
// =====================================================================

#[test]
fn region_filename_slug() {
    let data = CertificateData {
        kind: CertificateKind::Region,
        region: "País Vasco".into(),
        authors: vec!["Ana López".into()],
        ..CertificateData::default()
    };
    assert_eq!(derive_filename(&data), "certificado_país_vasco_ana.pdf");
}

#[test]
fn all_samples_export_successfully() {
    for data in [samples::chapter(), samples::book(), samples::region()] {
        let result = generate_certificate(&data, &default_config(), &EmbeddedOnlyLoader);
        assert!(result.is_ok(), "{} failed: {:?}", data.kind, result.err());
        assert_valid_pdf(&result.unwrap().bytes);
    }
}

#[test]
fn overflowing_certificate_gets_a_taller_page() {
    let mut data = samples::book();
    data.custom_text = "Se hace constar la participación en la obra. ".repeat(300);
    let config = default_config();
    let surface = preview_certificate(&data, &config, &EmbeddedOnlyLoader);
    let (w, h) = page_size_pt(&surface, config.page_width_mm);
    assert!((w - 595.28).abs() < 0.1);
    assert!(h > 841.9, "page height {h} should exceed A4");
    assert_valid_pdf(&generate_certificate(&data, &config, &EmbeddedOnlyLoader).unwrap().bytes);
}

#[test]
fn pdf_output_size_is_stable() {
    let data = samples::chapter();
    let a = generate_certificate(&data, &default_config(), &EmbeddedOnlyLoader).unwrap();
    let b = generate_certificate(&data, &default_config(), &EmbeddedOnlyLoader).unwrap();

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (a.bytes.len() as i64 - b.bytes.len() as i64).unsigned_abs();
    assert!(diff < 200, "PDF outputs differ: {} vs {} bytes", a.bytes.len(), b.bytes.len());
}

#[test]
fn session_export_writes_named_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());
    let mut session = EditingSession::start(samples::region(), default_config());
    session.update(|d| d.authors = vec!["Ane Etxeberria".into()]);

    let doc = session.export(&EmbeddedOnlyLoader, &sink).unwrap();
    assert_eq!(doc.filename, "certificado_país_vasco_ane.pdf");
    let written = std::fs::read(dir.path().join(&doc.filename)).unwrap();
    assert_valid_pdf(&written);
}

#[test]
fn exporter_is_reusable_after_each_export() {
    let exporter = Exporter::new(default_config());
    for _ in 0..3 {
        assert!(exporter.export(&samples::book(), &EmbeddedOnlyLoader).is_ok());
        assert!(!exporter.is_busy());
    }
}
