//! Document storage for application uploads
//!
//! Filesystem-backed store for the two identity documents attached to an
//! application. Files land under a purpose-scoped subdirectory of the
//! storage root with uuid names, so concurrent submissions never collide.
//! Deletion is idempotent: removing an already-absent path is not an error.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

/// Hard cap on a single uploaded document (5 MiB)
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Extensions accepted for identity documents
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

/// MIME types accepted for identity documents
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// A file lifted out of the multipart body, not yet persisted
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Reject oversized or unsupported files before anything touches disk
    pub fn validate(&self) -> Result<(), String> {
        if self.bytes.is_empty() {
            return Err("The uploaded file is empty.".to_string());
        }
        if self.bytes.len() > MAX_DOCUMENT_BYTES {
            return Err("The file may not be greater than 5 MB.".to_string());
        }
        let mime_ok = match self.content_type.as_deref() {
            Some(mime) => ALLOWED_MIME_TYPES.contains(&mime),
            // Some clients omit the part content type; fall back to the name
            None => ALLOWED_EXTENSIONS.contains(&self.extension().as_str()),
        };
        if !mime_ok {
            return Err("The file must be of type: jpg, jpeg, png, pdf.".to_string());
        }
        Ok(())
    }

    /// Lowercased extension from the client file name, defaulting by MIME
    /// when the name carries none
    pub fn extension(&self) -> String {
        if let Some(ext) = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            return ext.to_ascii_lowercase();
        }
        match self.content_type.as_deref() {
            Some("image/jpeg") => "jpg".to_string(),
            Some("image/png") => "png".to_string(),
            _ => "pdf".to_string(),
        }
    }
}

/// Which of the two application documents a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    IdDocument,
    StudentId,
}

impl DocumentKind {
    /// Storage namespace for this document purpose
    pub fn subdir(&self) -> &'static str {
        match self {
            DocumentKind::IdDocument => "agent-applications/id-documents",
            DocumentKind::StudentId => "agent-applications/student-ids",
        }
    }

    /// Parse the URL segment used by the admin download route
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "id-document" => Some(DocumentKind::IdDocument),
            "student-id" => Some(DocumentKind::StudentId),
            _ => None,
        }
    }
}

/// Errors surfaced by the store
#[derive(Debug)]
pub enum DocumentStoreError {
    NotFound(String),
    Io(std::io::Error),
}

impl fmt::Display for DocumentStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStoreError::NotFound(path) => write!(f, "document not found: {}", path),
            DocumentStoreError::Io(err) => write!(f, "storage error: {}", err),
        }
    }
}

impl std::error::Error for DocumentStoreError {}

impl From<std::io::Error> for DocumentStoreError {
    fn from(err: std::io::Error) -> Self {
        DocumentStoreError::Io(err)
    }
}

/// Filesystem store rooted at STORAGE_ROOT
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist an upload and return its stable relative path
    pub async fn store(
        &self,
        kind: DocumentKind,
        upload: &DocumentUpload,
    ) -> Result<String, DocumentStoreError> {
        let relative = format!(
            "{}/{}.{}",
            kind.subdir(),
            Uuid::new_v4().simple(),
            upload.extension()
        );
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, &upload.bytes).await?;
        tracing::info!(path = %relative, size = upload.bytes.len(), "document stored");
        Ok(relative)
    }

    /// Read a previously stored document
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, DocumentStoreError> {
        let absolute = self.resolve(relative)?;
        match tokio::fs::read(&absolute).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(DocumentStoreError::NotFound(relative.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a stored document. Removing a missing path is a no-op.
    pub async fn delete(&self, relative: &str) -> Result<(), DocumentStoreError> {
        let absolute = self.resolve(relative)?;
        match tokio::fs::remove_file(&absolute).await {
            Ok(()) => {
                tracing::info!(path = %relative, "document deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Join a stored relative path onto the root, refusing anything that
    /// would escape it
    fn resolve(&self, relative: &str) -> Result<PathBuf, DocumentStoreError> {
        let candidate = Path::new(relative);
        let escapes = candidate.is_absolute()
            || candidate
                .components()
                .any(|part| matches!(part, Component::ParentDir | Component::RootDir));
        if escapes {
            return Err(DocumentStoreError::NotFound(relative.to_string()));
        }
        Ok(self.root.join(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_upload() -> DocumentUpload {
        DocumentUpload {
            file_name: "id-card.PNG".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![1u8; 256],
        }
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(png_upload().extension(), "png");
    }

    #[test]
    fn extension_falls_back_to_mime() {
        let upload = DocumentUpload {
            file_name: "scan".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![1u8; 4],
        };
        assert_eq!(upload.extension(), "jpg");
    }

    #[test]
    fn validate_rejects_oversize_and_bad_type() {
        let mut upload = png_upload();
        upload.bytes = vec![0u8; MAX_DOCUMENT_BYTES + 1];
        assert!(upload.validate().is_err());

        let upload = DocumentUpload {
            file_name: "macro.docm".to_string(),
            content_type: Some("application/msword".to_string()),
            bytes: vec![0u8; 16],
        };
        assert!(upload.validate().is_err());
    }

    #[tokio::test]
    async fn store_read_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let upload = png_upload();
        let path = store.store(DocumentKind::IdDocument, &upload).await.unwrap();
        assert!(path.starts_with("agent-applications/id-documents/"));
        assert!(path.ends_with(".png"));

        let bytes = store.read(&path).await.unwrap();
        assert_eq!(bytes, upload.bytes);

        store.delete(&path).await.unwrap();
        assert!(matches!(
            store.read(&path).await,
            Err(DocumentStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        store
            .delete("agent-applications/id-documents/missing.pdf")
            .await
            .expect("deleting a missing document must not fail");
    }

    #[tokio::test]
    async fn read_refuses_paths_escaping_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        assert!(matches!(
            store.read("../../etc/passwd").await,
            Err(DocumentStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stored_documents_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let upload = png_upload();
        let first = store.store(DocumentKind::StudentId, &upload).await.unwrap();
        let second = store.store(DocumentKind::StudentId, &upload).await.unwrap();
        assert_ne!(first, second);
    }
}
