//! Output artifacts.
//!
//! Every file is first written to a temp file in the destination directory and
//! only persisted once all of them have been written, so a failure part-way
//! leaves no partial set behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::errors::AppError;

/// Destination paths derived from the `--output` base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub analysis: PathBuf,
    pub markdown: PathBuf,
    pub document: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn from_base(base: &Path, document_extension: &str) -> Self {
        let with_suffix = |suffix: &str| {
            let mut name = base.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        Self {
            analysis: with_suffix("_analysis.json"),
            markdown: with_suffix(".md"),
            document: with_suffix(&format!(".{document_extension}")),
            report: with_suffix("_report.json"),
        }
    }
}

/// Contents of one finished run.
pub struct ArtifactSet<'a> {
    pub analysis_json: &'a [u8],
    pub markdown: &'a [u8],
    pub document: &'a [u8],
    pub report_json: &'a [u8],
}

fn artifact_error(path: &Path) -> impl FnOnce(std::io::Error) -> AppError + '_ {
    move |source| AppError::Artifact {
        path: path.display().to_string(),
        source,
    }
}

fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile, AppError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(artifact_error(path))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(artifact_error(path))?;
    staged.write_all(contents).map_err(artifact_error(path))?;
    staged.flush().map_err(artifact_error(path))?;
    Ok(staged)
}

/// Writes all four artifacts or none of them. A failed rename removes the
/// artifacts already persisted in this call.
pub fn write_all(paths: &ArtifactPaths, set: &ArtifactSet<'_>) -> Result<(), AppError> {
    let entries = [
        (&paths.analysis, set.analysis_json),
        (&paths.markdown, set.markdown),
        (&paths.document, set.document),
        (&paths.report, set.report_json),
    ];

    let mut staged = Vec::with_capacity(entries.len());
    for (path, contents) in entries {
        staged.push((path, stage(path, contents)?));
    }

    let mut persisted: Vec<&PathBuf> = Vec::with_capacity(staged.len());
    for (path, file) in staged {
        if let Err(e) = file.persist(path) {
            for done in &persisted {
                if let Err(remove_err) = std::fs::remove_file(done) {
                    warn!(path = %done.display(), error = %remove_err, "Failed to roll back artifact");
                }
            }
            return Err(artifact_error(path)(e.error));
        }
        persisted.push(path);
    }

    for path in persisted {
        info!(path = %path.display(), "Wrote artifact");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ArtifactSet<'static> {
        ArtifactSet {
            analysis_json: b"{\"skills\":[]}",
            markdown: b"# Jane",
            document: b"<html></html>",
            report_json: b"{}",
        }
    }

    #[test]
    fn test_paths_from_base() {
        let paths = ArtifactPaths::from_base(Path::new("out/jane_acme"), "pdf");
        assert_eq!(paths.analysis, PathBuf::from("out/jane_acme_analysis.json"));
        assert_eq!(paths.markdown, PathBuf::from("out/jane_acme.md"));
        assert_eq!(paths.document, PathBuf::from("out/jane_acme.pdf"));
        assert_eq!(paths.report, PathBuf::from("out/jane_acme_report.json"));
    }

    #[test]
    fn test_write_all_persists_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::from_base(&dir.path().join("tailored_resume"), "html");

        write_all(&paths, &set()).unwrap();

        assert_eq!(std::fs::read(&paths.markdown).unwrap(), b"# Jane");
        assert_eq!(std::fs::read(&paths.document).unwrap(), b"<html></html>");
        assert!(paths.analysis.exists());
        assert!(paths.report.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::from_base(&dir.path().join("nested/run"), "html");

        write_all(&paths, &set()).unwrap();
        assert!(paths.markdown.exists());
    }

    #[test]
    fn test_failure_leaves_no_partial_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = ArtifactPaths::from_base(&dir.path().join("run"), "html");
        // A regular file where a directory is expected makes staging the report fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        paths.report = blocker.join("run_report.json");

        let err = write_all(&paths, &set()).unwrap_err();
        assert!(matches!(err, AppError::Artifact { .. }));
        assert_eq!(err.exit_code(), 6);
        assert!(!paths.analysis.exists());
        assert!(!paths.markdown.exists());
        assert!(!paths.document.exists());
        // Only the blocker remains; staged temp files were cleaned up on drop.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_rename_rolls_back_persisted_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::from_base(&dir.path().join("run"), "html");
        // Staging succeeds, but a file cannot be renamed over a directory.
        std::fs::create_dir(&paths.report).unwrap();

        let err = write_all(&paths, &set()).unwrap_err();
        assert!(matches!(err, AppError::Artifact { .. }));
        assert!(!paths.analysis.exists());
        assert!(!paths.markdown.exists());
        assert!(!paths.document.exists());
        assert!(paths.report.is_dir());
        // Only the directory remains; the unpersisted temp file was removed on drop.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
