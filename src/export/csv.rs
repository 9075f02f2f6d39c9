use super::ArtifactError;
use crate::recorder::types::Step;
use std::fs::File;
use std::path::Path;

/// Write `steps` as CSV with a header row named after the `Step` fields.
pub fn write(path: &Path, steps: &[Step]) -> Result<(), ArtifactError> {
    let file = File::create(path)?;
    let mut writer = ::csv::Writer::from_writer(file);
    for step in steps {
        writer.serialize(step)?;
    }
    writer.flush()?;
    Ok(())
}
