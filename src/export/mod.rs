pub mod csv;
pub mod guide;
pub mod json;

use crate::recorder::types::Step;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// The three files written at the end of every non-empty session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Json,
    Csv,
    Guide,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [Artifact::Json, Artifact::Csv, Artifact::Guide];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Json => "data.json",
            Artifact::Csv => "data.csv",
            Artifact::Guide => "training_guide.txt",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.file_name())
    }
}

/// Failure writing a single artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv encoding failed: {0}")]
    Csv(#[from] ::csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    pub artifact: Artifact,
    pub message: String,
}

/// One or more artifacts could not be written. Artifacts in `written` are on disk.
#[derive(Debug, Clone, Error)]
#[error("export to \"{}\" incomplete: {}", .directory.display(), describe(.failures))]
pub struct ExportError {
    pub directory: PathBuf,
    pub written: Vec<Artifact>,
    pub failures: Vec<ArtifactFailure>,
}

fn describe(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.artifact, failure.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turn an artifact error into a user-friendly message.
fn friendly_write_error(error: &ArtifactError, path: &Path) -> String {
    let ArtifactError::Io(e) = error else {
        return error.to_string();
    };
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            format!("cannot save to \"{}\": permission denied", path.display())
        }
        std::io::ErrorKind::NotFound => {
            format!("the folder for \"{}\" does not exist", path.display())
        }
        _ if e.raw_os_error() == Some(28) /* ENOSPC */ => {
            "not enough disk space to save the file".to_string()
        }
        _ => format!("could not save \"{}\": {e}", path.display()),
    }
}

fn write_artifact(
    artifact: Artifact,
    path: &Path,
    steps: &[Step],
    generated_at: DateTime<Local>,
) -> Result<(), ArtifactError> {
    match artifact {
        Artifact::Json => json::write(path, steps),
        Artifact::Csv => csv::write(path, steps),
        Artifact::Guide => guide::write(path, steps, generated_at),
    }
}

/// Write every artifact for `steps` into `dir`.
///
/// Each artifact is attempted even if an earlier one failed; nothing already
/// written is rolled back.
pub fn export_session(
    dir: &Path,
    steps: &[Step],
    generated_at: DateTime<Local>,
) -> Result<(), ExportError> {
    let mut written = Vec::new();
    let mut failures = Vec::new();

    for artifact in Artifact::ALL {
        let path = dir.join(artifact.file_name());
        match write_artifact(artifact, &path, steps, generated_at) {
            Ok(()) => written.push(artifact),
            Err(error) => {
                let message = friendly_write_error(&error, &path);
                warn!(%artifact, "export failed: {message}");
                failures.push(ArtifactFailure { artifact, message });
            }
        }
    }

    if failures.is_empty() {
        info!(dir = %dir.display(), steps = steps.len(), "export complete");
        Ok(())
    } else {
        Err(ExportError {
            directory: dir.to_path_buf(),
            written,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> Vec<Step> {
        (1..=2).map(Step::sample).collect()
    }

    #[test]
    fn export_writes_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        export_session(dir.path(), &steps(), Local::now()).expect("export");
        for artifact in Artifact::ALL {
            assert!(dir.path().join(artifact.file_name()).is_file(), "{artifact}");
        }
    }

    #[test]
    fn one_failing_artifact_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes data.csv unwritable.
        std::fs::create_dir(dir.path().join("data.csv")).unwrap();

        let err = export_session(dir.path(), &steps(), Local::now()).unwrap_err();
        assert_eq!(err.written, vec![Artifact::Json, Artifact::Guide]);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].artifact, Artifact::Csv);
        assert!(err.to_string().contains("data.csv"));
        assert!(dir.path().join("data.json").is_file());
        assert!(dir.path().join("training_guide.txt").is_file());
    }

    #[test]
    fn missing_directory_fails_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");

        let err = export_session(&gone, &steps(), Local::now()).unwrap_err();
        assert!(err.written.is_empty());
        assert_eq!(err.failures.len(), 3);
        assert!(err.failures[0].message.contains("does not exist"));
    }
}
