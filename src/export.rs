//! Export pipeline – rasterises and assembles the certificate into a PDF,
//! derives its filename and hands it to a [`DownloadSink`].
//!
//! Exports are best effort: any failure is logged, no partial document is
//! produced and nothing is retried. Each [`Exporter`] runs at most one
//! export at a time; a trigger that arrives while one is in flight is
//! rejected.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compose::compose;
use crate::error::{CertificateError, Result};
use crate::images::{ImageLoader, ImageSet};
use crate::model::{non_blank, CertificateData, CertificateKind};
use crate::pipeline::PipelineConfig;
use crate::preview::render_preview;
use crate::render::render_pdf;

pub const PDF_EXTENSION: &str = "pdf";

/// A finished certificate document.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Derive the download name of a certificate.
///
/// `certificado_capitulo`, `certificado_libro` or `certificado_{region}`
/// (lower-cased, spaces to underscores), then `_{first name}` of the first
/// author when there is one, then the extension.
pub fn derive_filename(data: &CertificateData) -> String {
    let mut name = match data.kind {
        CertificateKind::Chapter => "certificado_capitulo".to_string(),
        CertificateKind::Book => "certificado_libro".to_string(),
        CertificateKind::Region => match non_blank(&data.region) {
            Some(region) => format!("certificado_{}", slug(region)),
            None => "certificado_region".to_string(),
        },
    };
    let first_name = data
        .named_authors()
        .next()
        .and_then(|a| a.split_whitespace().next());
    if let Some(token) = first_name {
        name.push('_');
        name.push_str(&slug(token));
    }
    format!("{name}.{PDF_EXTENSION}")
}

fn slug(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Destination of a finished document (a browser download, a directory...).
pub trait DownloadSink {
    fn deliver(&self, document: &ExportedDocument) -> Result<()>;
}

/// Writes documents into a directory under their derived name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, document: &ExportedDocument) -> PathBuf {
        self.dir.join(&document.filename)
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, document: &ExportedDocument) -> Result<()> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.path_for(document);
        write_whole(&path, &document.bytes)?;
        log::info!(
            "Wrote '{}' ({} bytes)",
            path.display(),
            document.bytes.len()
        );
        Ok(())
    }
}

/// Write to a sibling temp file and rename, so a failed write never leaves a
/// truncated document under the final name.
fn write_whole(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = partial_path(path);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// `<name>.pdf` → `<name>.pdf.part`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Runs exports with an at-most-one-in-flight guard.
#[derive(Debug)]
pub struct Exporter {
    config: PipelineConfig,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag when the export ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Exporter {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| CertificateError::ExportInFlight)
    }

    /// Compose, lay out and assemble `data` into a named PDF.
    pub fn export(
        &self,
        data: &CertificateData,
        loader: &dyn ImageLoader,
    ) -> Result<ExportedDocument> {
        let _guard = self.acquire()?;
        self.config.validate()?;

        if self.config.strict {
            let issues = data.validate();
            if !issues.is_empty() {
                return Err(CertificateError::Validation(issues));
            }
        }

        let fragment = compose(data);
        let images = ImageSet::resolve(data, loader);
        let surface = render_preview(data, &fragment, &images, &self.config);
        let bytes = render_pdf(&surface, self.config.upscale, self.config.page_width_mm)?;

        Ok(ExportedDocument {
            filename: derive_filename(data),
            bytes,
        })
    }

    /// Export and deliver to `sink`.
    pub fn export_to(
        &self,
        data: &CertificateData,
        loader: &dyn ImageLoader,
        sink: &dyn DownloadSink,
    ) -> Result<ExportedDocument> {
        let document = self.export(data, loader)?;
        sink.deliver(&document)?;
        Ok(document)
    }

    /// Fire-and-forget variant: failures are logged and yield `None`.
    pub fn export_best_effort(
        &self,
        data: &CertificateData,
        loader: &dyn ImageLoader,
        sink: &dyn DownloadSink,
    ) -> Option<ExportedDocument> {
        match self.export_to(data, loader, sink) {
            Ok(document) => Some(document),
            Err(CertificateError::ExportInFlight) => {
                log::warn!("Export ignored: another export is still running");
                None
            }
            Err(e) => {
                log::error!("Certificate export failed: {e}");
                None
            }
        }
    }
}
