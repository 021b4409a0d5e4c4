//! Intake filtering for picked or dropped file batches.

use tracing::debug;

use crate::core::PickedFile;
use crate::utils::{CompressorResult, ValidationError};

/// Filters a batch down to the files whose declared type is an image.
///
/// A batch with no surviving files is rejected outright; the caller emits
/// the user-facing warning and mutates nothing.
pub fn accept(files: Vec<PickedFile>) -> CompressorResult<Vec<PickedFile>> {
    let total = files.len();
    let images: Vec<PickedFile> = files.into_iter().filter(PickedFile::is_image).collect();
    debug!("Intake accepted {}/{} files", images.len(), total);

    if images.is_empty() {
        return Err(ValidationError::NoImageInput.into());
    }
    Ok(images)
}
