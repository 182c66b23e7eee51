//! Filesystem-backed `BaseDocumentService`.
//!
//! Files land under `<root>/<document type>/<document id>.<ext>`; the
//! reference handed out is the path relative to the root.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::info;

use super::BaseDocumentService;
use crate::common::{DocumentId, UserId};
use crate::domains::documents::{
    check_upload, extension_for, DocumentMetadata, DocumentRef, DocumentType,
};

pub struct LocalDocumentService {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalDocumentService {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Resolve a reference to a path, refusing anything that escapes the root.
    fn resolve(&self, document: &DocumentRef) -> Result<PathBuf> {
        let relative = Path::new(document.as_str());
        let safe = !document.is_blank()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            bail!("Invalid document reference: {}", document);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BaseDocumentService for LocalDocumentService {
    async fn create_document(
        &self,
        owner: UserId,
        bytes: Vec<u8>,
        metadata: &DocumentMetadata,
        document_type: DocumentType,
    ) -> Result<DocumentRef> {
        if let Err(errors) = check_upload(metadata, bytes.len(), self.max_bytes) {
            bail!("Rejected upload: {}", errors);
        }
        let extension = extension_for(metadata)
            .context("Content type has no file extension")?;

        let id = DocumentId::new();
        let document = DocumentRef::new(format!("{}/{}.{}", document_type, id, extension));
        let path = self.resolve(&document)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            document = %document,
            owner = %owner,
            size = bytes.len(),
            "Stored document"
        );
        Ok(document)
    }

    async fn delete_document(&self, document: &DocumentRef) -> Result<()> {
        let path = self.resolve(document)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(document = %document, "Deleted document");
                Ok(())
            }
            // Already gone
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LocalDocumentService {
        let root = std::env::temp_dir().join(format!("registry-docs-{}", uuid::Uuid::new_v4()));
        LocalDocumentService::new(root, 1024)
    }

    fn pdf() -> DocumentMetadata {
        DocumentMetadata {
            file_name: "cv.pdf".to_string(),
            content_type: "application/pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let service = service();
        let document = service
            .create_document(UserId::new(), b"%PDF-1.4".to_vec(), &pdf(), DocumentType::Cv)
            .await
            .unwrap();

        assert!(document.as_str().starts_with("cv/"));
        assert!(document.as_str().ends_with(".pdf"));

        let path = service.resolve(&document).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");

        service.delete_document(&document).await.unwrap();
        assert!(!path.exists());

        // Deleting twice is fine
        service.delete_document(&document).await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_before_writing() {
        let service = service();
        let result = service
            .create_document(UserId::new(), vec![0u8; 2048], &pdf(), DocumentType::Cv)
            .await;

        assert!(result.is_err());
        assert!(!service.root.exists());
    }

    #[tokio::test]
    async fn test_traversal_is_refused() {
        let service = service();
        for reference in ["../etc/passwd", "/etc/passwd", "", "cv/../../x"] {
            assert!(service
                .delete_document(&DocumentRef::new(reference))
                .await
                .is_err());
        }
    }
}
