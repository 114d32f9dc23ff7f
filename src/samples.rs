//! Sample certificates for testing and demonstration.
//!
//! Each sample exercises one certificate kind and carries small embedded
//! PNG imagery so it renders without touching the network or filesystem.

use crate::model::{CertificateData, CertificateKind};

/// 1×1 white pixel.
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// 40×4 navy banner, used for header and footer.
pub const BANNER_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAACgAAAAECAIAAABz8up3AAAAE0lEQVR42mOQMosdEMQwajG9EAAUPmwh0YYcOQAAAABJRU5ErkJggg==";

/// 4×4 gold square standing in for a publisher logo.
pub const SEAL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAQAAAAECAIAAAAmkwkpAAAAEElEQVR42mNY1moMRwzEcQBAQhXhpGS0bwAAAABJRU5ErkJggg==";

/// 8×3 dark strip standing in for a scanned signature.
pub const SIGNATURE_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAgAAAADCAIAAAAhqtkfAAAAD0lEQVR42mPQwAEYSJYAAKY6C0HiMe0wAAAAAElFTkSuQmCC";

fn with_imagery(mut data: CertificateData) -> CertificateData {
    data.header_image = Some(BANNER_PNG.to_string());
    data.footer_image = Some(BANNER_PNG.to_string());
    data.logo = Some(SEAL_PNG.to_string());
    data.signature = Some(SIGNATURE_PNG.to_string());
    data
}

/// Chapter authorship certificate.
pub fn chapter() -> CertificateData {
    with_imagery(CertificateData {
        kind: CertificateKind::Chapter,
        title: "Certificado de autoría".into(),
        book_title: "Manual Clínico".into(),
        chapter_title: "Introducción".into(),
        chapter_number: "1".into(),
        authors: vec!["Juan Pérez".into()],
        coauthors: vec!["María García".into(), "Luis Martín".into()],
        isbn: "978-1-23".into(),
        pages: "12".into(),
        total_pages: "350".into(),
        publication_date: "2024-05-01".into(),
        validation_url: "https://certificados.example.org/v/CAP-2024-0001".into(),
        ..CertificateData::default()
    })
}

/// Whole-book authorship certificate.
pub fn book() -> CertificateData {
    with_imagery(CertificateData {
        kind: CertificateKind::Book,
        title: "Certificado de autoría".into(),
        book_title: "Atlas de Anatomía Aplicada".into(),
        authors: vec!["Carmen Ruiz Soler".into(), "Pablo Ortega".into()],
        isbn: "978-84-0000-000-1".into(),
        total_pages: "512".into(),
        publication_date: "2023-11-20".into(),
        validation_url: "https://certificados.example.org/v/LIB-2023-0042".into(),
        ..CertificateData::default()
    })
}

/// Regional validity certificate referencing a chapter.
pub fn region() -> CertificateData {
    with_imagery(CertificateData {
        kind: CertificateKind::Region,
        title: "Certificado de validez regional".into(),
        book_title: "Guía de Práctica Enfermera".into(),
        chapter_title: "Cuidados paliativos".into(),
        chapter_number: "7".into(),
        authors: vec!["Ana López".into()],
        isbn: "978-84-1111-222-3".into(),
        pages: "24".into(),
        total_pages: "410".into(),
        publication_date: "2024-02-10".into(),
        region: "País Vasco".into(),
        validation_url: "https://certificados.example.org/v/REG-2024-0107".into(),
        custom_text: "Expedido a efectos de baremación en procesos selectivos.".into(),
        ..CertificateData::default()
    })
}

/// Look up a sample by kind name.
pub fn by_name(name: &str) -> Option<CertificateData> {
    match name {
        "chapter" => Some(chapter()),
        "book" => Some(book()),
        "region" => Some(region()),
        _ => None,
    }
}
