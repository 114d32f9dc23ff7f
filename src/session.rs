//! Editing session – the explicit context that owns one certificate while
//! it is being edited.
//!
//! A session starts from an initial record, recomposes the whole fragment
//! after every change, and hands the record back when it ends. Nothing is
//! persisted.

use crate::compose::{compose, Fragment};
use crate::error::Result;
use crate::export::{DownloadSink, ExportedDocument, Exporter};
use crate::images::ImageLoader;
use crate::model::{CertificateData, CertificateKind, ValidationIssue};
use crate::pipeline::{preview_certificate, PipelineConfig};
use crate::surface::Surface;

#[derive(Debug)]
pub struct EditingSession {
    data: CertificateData,
    fragment: Fragment,
    exporter: Exporter,
}

impl EditingSession {
    pub fn start(data: CertificateData, config: PipelineConfig) -> Self {
        let fragment = compose(&data);
        log::debug!("Started editing session for a {} certificate", data.kind);
        Self {
            data,
            fragment,
            exporter: Exporter::new(config),
        }
    }

    /// A blank certificate of `kind`.
    pub fn blank(kind: CertificateKind, config: PipelineConfig) -> Self {
        Self::start(CertificateData::new(kind), config)
    }

    pub fn data(&self) -> &CertificateData {
        &self.data
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn config(&self) -> &PipelineConfig {
        self.exporter.config()
    }

    /// Apply an edit and recompose.
    pub fn update(&mut self, edit: impl FnOnce(&mut CertificateData)) -> &Fragment {
        edit(&mut self.data);
        self.fragment = compose(&self.data);
        &self.fragment
    }

    /// Replace the record wholesale (e.g. a new certificate was started).
    pub fn reset(&mut self, data: CertificateData) {
        self.data = data;
        self.fragment = compose(&self.data);
    }

    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.data.validate()
    }

    pub fn preview(&self, loader: &dyn ImageLoader) -> Surface {
        preview_certificate(&self.data, self.exporter.config(), loader)
    }

    pub fn export(
        &self,
        loader: &dyn ImageLoader,
        sink: &dyn DownloadSink,
    ) -> Result<ExportedDocument> {
        self.exporter.export_to(&self.data, loader, sink)
    }

    /// Best-effort export; failures are logged and yield `None`.
    pub fn export_best_effort(
        &self,
        loader: &dyn ImageLoader,
        sink: &dyn DownloadSink,
    ) -> Option<ExportedDocument> {
        self.exporter.export_best_effort(&self.data, loader, sink)
    }

    /// End the session, returning the final record.
    pub fn end(self) -> CertificateData {
        log::debug!("Ended editing session");
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::BlockRole;

    #[test]
    fn updates_recompose_wholesale() {
        let mut session = EditingSession::blank(CertificateKind::Book, PipelineConfig::default());
        assert!(!session.fragment().has_role(BlockRole::Coauthors));

        session.update(|d| d.coauthors = vec!["Eva".into(), "Iker".into()]);
        assert!(session.fragment().contains("Eva, Iker"));

        session.update(|d| d.coauthors.clear());
        assert!(!session.fragment().has_role(BlockRole::Coauthors));
    }

    #[test]
    fn kind_switch_changes_rule() {
        let mut session = EditingSession::blank(CertificateKind::Book, PipelineConfig::default());
        session.update(|d| {
            d.kind = CertificateKind::Region;
            d.region = "Aragón".into();
        });
        assert!(session.fragment().contains("región de Aragón"));
    }

    #[test]
    fn end_returns_final_record() {
        let mut session =
            EditingSession::blank(CertificateKind::Chapter, PipelineConfig::default());
        assert!(session.issues().contains(&ValidationIssue::MissingAuthors));
        session.update(|d| d.authors.push("Rosa".into()));
        assert!(!session.issues().contains(&ValidationIssue::MissingAuthors));
        let data = session.end();
        assert_eq!(data.authors, vec!["Rosa".to_string()]);
    }

    #[test]
    fn preview_and_export_use_session_config() {
        use crate::export::{DownloadSink, ExportedDocument};
        use crate::images::EmbeddedOnlyLoader;
        use crate::surface::BoxRole;

        struct Discard;
        impl DownloadSink for Discard {
            fn deliver(&self, _: &ExportedDocument) -> Result<()> {
                Ok(())
            }
        }

        let config = PipelineConfig {
            frame: false,
            ..PipelineConfig::default()
        };
        let session = EditingSession::start(crate::samples::book(), config);
        assert!(!session.config().frame);
        let surface = session.preview(&EmbeddedOnlyLoader);
        assert!(surface.find(BoxRole::Frame).is_none());
        let doc = session.export_best_effort(&EmbeddedOnlyLoader, &Discard).unwrap();
        assert_eq!(doc.filename, "certificado_libro_carmen.pdf");
    }

    #[test]
    fn reset_starts_a_new_certificate() {
        let mut session =
            EditingSession::start(crate::samples::region(), PipelineConfig::default());
        session.reset(CertificateData::new(CertificateKind::Book));
        assert_eq!(session.data().kind, CertificateKind::Book);
        assert!(!session.fragment().has_role(BlockRole::Closing));
    }
}
