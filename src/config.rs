use crate::enums::{ExtractionMode, Interpolation, Orientation, SortBy};
use std::path::PathBuf;

/// Thumbnail run configuration
#[derive(Debug, Clone, Default)]
pub struct ThumbnailConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: ExtractionMode,
    pub orientation: Orientation,
    pub interpolation: Interpolation,
    /// Slice ordering for DICOM series directories
    pub sort_by: SortBy,
}
