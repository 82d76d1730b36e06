//! Input loading: turns the resume and job-description arguments into text.
//!
//! PDF files go through `pdf_extract`; everything else is read as UTF-8.
//! Extraction is blocking and runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("{0} contains no extractable text")]
    Empty(String),
}

/// Produces plain text from a document on disk.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Default extractor: PDF by extension, UTF-8 text otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let display = path.display().to_string();
        let text = if is_pdf(path) {
            pdf_extract::extract_text(path).map_err(|e| ExtractionError::Unreadable {
                path: display.clone(),
                reason: e.to_string(),
            })?
        } else {
            std::fs::read_to_string(path).map_err(|e| ExtractionError::Unreadable {
                path: display.clone(),
                reason: e.to_string(),
            })?
        };

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty(display));
        }
        Ok(text)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Reads the source resume. A missing file is an input error, not an extraction error.
pub async fn load_resume(
    extractor: Arc<dyn TextExtractor>,
    path: &Path,
) -> Result<String, AppError> {
    if !path.is_file() {
        return Err(AppError::Input(format!(
            "resume file not found: {}",
            path.display()
        )));
    }

    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))??;

    info!(path = %path.display(), chars = text.len(), "Loaded source resume");
    Ok(text)
}

/// Reads the job description. An argument naming an existing file is read from
/// disk; anything else is taken as the description text itself.
pub async fn load_job_description(
    extractor: Arc<dyn TextExtractor>,
    argument: &str,
) -> Result<String, AppError> {
    let candidate = PathBuf::from(argument);
    if candidate.is_file() {
        let owned = candidate.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}"))
            })??;
        info!(path = %candidate.display(), "Loaded job description from file");
        return Ok(text);
    }

    if argument.trim().is_empty() {
        return Err(AppError::Input("job description is empty".to_string()));
    }
    debug!("Job description argument is not a file; using it as literal text");
    Ok(argument.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn extractor() -> Arc<dyn TextExtractor> {
        Arc::new(FileExtractor)
    }

    #[tokio::test]
    async fn test_load_resume_reads_text_file() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "# Jane Doe\n\nPython developer").unwrap();

        let text = load_resume(extractor(), file.path()).await.unwrap();
        assert!(text.contains("Python developer"));
    }

    #[tokio::test]
    async fn test_missing_resume_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_resume(extractor(), &dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_blank_resume_is_empty_extraction() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "   \n\t").unwrap();

        let err = load_resume(extractor(), file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(ExtractionError::Empty(_))));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_unreadable() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "not really a pdf").unwrap();

        let err = load_resume(extractor(), file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::Unreadable { .. })
        ));
    }

    #[tokio::test]
    async fn test_job_description_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Senior Rust Engineer").unwrap();
        let arg = file.path().to_string_lossy().to_string();

        let text = load_job_description(extractor(), &arg).await.unwrap();
        assert_eq!(text, "Senior Rust Engineer");
    }

    #[tokio::test]
    async fn test_job_description_literal_text() {
        let text = load_job_description(extractor(), "We need a Go developer")
            .await
            .unwrap();
        assert_eq!(text, "We need a Go developer");
    }

    #[tokio::test]
    async fn test_blank_job_description_rejected() {
        let err = load_job_description(extractor(), "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[test]
    fn test_pdf_detection_is_case_insensitive() {
        assert!(is_pdf(Path::new("resume.PDF")));
        assert!(!is_pdf(Path::new("resume.md")));
    }
}
