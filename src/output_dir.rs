//! Picks the folder recordings are written under, once per process.

use crate::config::RecorderConfig;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Overrides the Documents location when set.
pub const OUTPUT_DIR_ENV: &str = "STEPSNAP_OUTPUT_DIR";

/// Resolve the base output directory: `$STEPSNAP_OUTPUT_DIR`, then
/// `<Documents>/<output_folder_name>`, then the current working directory.
pub fn resolve_base_dir(config: &RecorderConfig) -> PathBuf {
    let mut candidates = Vec::new();
    if let Some(dir) = std::env::var_os(OUTPUT_DIR_ENV).filter(|value| !value.is_empty()) {
        candidates.push(PathBuf::from(dir));
    }
    if let Some(documents) = dirs::document_dir() {
        candidates.push(documents.join(&config.output_folder_name));
    }
    let fallback = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(candidates, fallback)
}

/// First candidate that can be created and written to, else `fallback`.
pub fn resolve_from(candidates: impl IntoIterator<Item = PathBuf>, fallback: PathBuf) -> PathBuf {
    for candidate in candidates {
        match probe_writable(&candidate) {
            Ok(()) => {
                info!(dir = %candidate.display(), "using output directory");
                return candidate;
            }
            Err(err) => {
                warn!(dir = %candidate.display(), "output directory not writable: {err}");
            }
        }
    }
    info!(dir = %fallback.display(), "falling back to working directory");
    fallback
}

/// Create `dir` if needed and prove it is writable with a throwaway file.
fn probe_writable(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe_path = dir.join(format!(".stepsnap_probe_{}", std::process::id()));
    let created = std::fs::File::create(&probe_path);
    let _ = std::fs::remove_file(&probe_path);
    created.map(|_| ())
}
