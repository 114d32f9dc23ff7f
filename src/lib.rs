//! # cert-forge – authorship certificates as PDF
//!
//! This crate turns a plain certificate record into a downloadable PDF. The
//! pipeline stages are:
//!
//! 1. **Model** – the certificate record and its checks ([`model`])
//! 2. **Compose** – record → structured content fragment ([`compose`])
//! 3. **Preview** – fragment + imagery → laid-out surface ([`preview`])
//! 4. **Export** – rasterise, assemble and name the PDF ([`export`], [`render`])
//!
//! [`session::EditingSession`] is the context an editor holds while working
//! on one certificate.

pub mod compose;
pub mod date;
pub mod error;
pub mod export;
pub mod fonts;
pub mod images;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod preview;
pub mod qr;
pub mod render;
pub mod samples;
pub mod session;
pub mod surface;

// Re-exports for convenience
pub use error::{CertificateError, Result};
pub use model::{CertificateData, CertificateKind};
pub use pipeline::{generate_certificate, preview_certificate, PipelineConfig};
