//! Image references – loading and decoding of the four certificate image
//! slots (header, logo, signature, footer).
//!
//! A reference may be a base64 `data:` URI, a `file://` URL or plain path,
//! or an `http(s)://` URL (only with the `remote-images` feature). Loading
//! never fails the render: a reference that cannot be read or decoded is
//! logged and treated as absent.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::DynamicImage;

use crate::error::{CertificateError, Result};
use crate::model::{non_blank, CertificateData};

/// Source of raw image bytes for a reference string.
pub trait ImageLoader {
    fn load(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Dispatches on the reference scheme.
#[derive(Debug, Clone, Default)]
pub struct DefaultLoader;

impl ImageLoader for DefaultLoader {
    fn load(&self, reference: &str) -> Result<Vec<u8>> {
        if reference.starts_with("data:") {
            parse_data_uri(reference)
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            fetch_remote(reference)
        } else {
            let path = reference.strip_prefix("file://").unwrap_or(reference);
            read_file(Path::new(path))
        }
    }
}

/// Only resolves `data:` URIs; everything else is reported missing.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedOnlyLoader;

impl ImageLoader for EmbeddedOnlyLoader {
    fn load(&self, reference: &str) -> Result<Vec<u8>> {
        parse_data_uri(reference)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        CertificateError::Image(format!("cannot read '{}': {e}", path.display()))
    })
}

#[cfg(feature = "remote-images")]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| CertificateError::Image(format!("fetching {url}: {e}")))?;
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| CertificateError::Image(format!("reading {url}: {e}")))
}

#[cfg(not(feature = "remote-images"))]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    Err(CertificateError::Image(format!(
        "remote image {url} requires the `remote-images` feature"
    )))
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub fn parse_data_uri(src: &str) -> Result<Vec<u8>> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(CertificateError::Image(format!(
            "expected a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}"
        )));
    };
    let (header, b64_data) = rest.split_once(',').ok_or_else(|| {
        CertificateError::Image("invalid data URI: missing `,` separator".to_string())
    })?;
    if !header.contains(";base64") {
        return Err(CertificateError::Image(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    }
    BASE64_STD
        .decode(b64_data.trim())
        .map_err(|e| CertificateError::Image(format!("base64 decode error: {e}")))
}

/// Which image of the certificate a bitmap belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Header,
    Logo,
    Signature,
    Footer,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 4] = [
        ImageSlot::Header,
        ImageSlot::Logo,
        ImageSlot::Signature,
        ImageSlot::Footer,
    ];

    pub fn asset_id(&self) -> &'static str {
        match self {
            ImageSlot::Header => "header",
            ImageSlot::Logo => "logo",
            ImageSlot::Signature => "signature",
            ImageSlot::Footer => "footer",
        }
    }

    pub fn reference<'a>(&self, data: &'a CertificateData) -> Option<&'a str> {
        let field = match self {
            ImageSlot::Header => &data.header_image,
            ImageSlot::Logo => &data.logo,
            ImageSlot::Signature => &data.signature,
            ImageSlot::Footer => &data.footer_image,
        };
        field.as_deref().and_then(non_blank)
    }
}

/// Decoded bitmaps for the slots that resolved.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    pub header: Option<DynamicImage>,
    pub logo: Option<DynamicImage>,
    pub signature: Option<DynamicImage>,
    pub footer: Option<DynamicImage>,
}

impl ImageSet {
    /// Load and decode every referenced slot of `data`.
    pub fn resolve(data: &CertificateData, loader: &dyn ImageLoader) -> Self {
        let mut set = ImageSet::default();
        for slot in ImageSlot::ALL {
            let Some(reference) = slot.reference(data) else {
                continue;
            };
            match load_image(reference, loader) {
                Ok(img) => set.insert(slot, img),
                Err(e) => log::warn!("Skipping {} image: {e}", slot.asset_id()),
            }
        }
        set
    }

    pub fn get(&self, slot: ImageSlot) -> Option<&DynamicImage> {
        match slot {
            ImageSlot::Header => self.header.as_ref(),
            ImageSlot::Logo => self.logo.as_ref(),
            ImageSlot::Signature => self.signature.as_ref(),
            ImageSlot::Footer => self.footer.as_ref(),
        }
    }

    pub fn insert(&mut self, slot: ImageSlot, img: DynamicImage) {
        let target = match slot {
            ImageSlot::Header => &mut self.header,
            ImageSlot::Logo => &mut self.logo,
            ImageSlot::Signature => &mut self.signature,
            ImageSlot::Footer => &mut self.footer,
        };
        *target = Some(img);
    }
}

fn load_image(reference: &str, loader: &dyn ImageLoader) -> Result<DynamicImage> {
    let bytes = loader.load(reference)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| CertificateError::Image(format!("decode error: {e}")))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(CertificateError::Image("image has no pixels".to_string()));
    }
    Ok(img)
}
