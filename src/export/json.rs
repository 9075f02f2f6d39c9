use super::ArtifactError;
use crate::recorder::types::Step;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::Path;

/// Write `steps` as a JSON array indented with four spaces.
pub fn write(path: &Path, steps: &[Step]) -> Result<(), ArtifactError> {
    let mut json = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut json, formatter);
    steps.serialize(&mut serializer)?;
    std::fs::write(path, json)?;
    Ok(())
}
