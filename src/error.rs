use std::{io, path::PathBuf};

use thiserror::Error;

use crate::export::ExportError;
use crate::recorder::hooks::HookError;

/// Errors surfaced by the session engine's public verbs.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// `start()` was called while a recording is already running.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// The session folder (or its `screenshots` subfolder) could not be created.
    #[error(
        "could not create output folder \"{}\": {source}. Try running StepSnap from a writable location.",
        path.display()
    )]
    DirectoryCreation { path: PathBuf, source: io::Error },

    /// The OS declined to install the global mouse or hotkey hook.
    #[error("could not install input hooks: {0}")]
    HookRegistration(#[from] HookError),

    /// One or more export artifacts failed to write.
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("could not install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;
