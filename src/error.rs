use crate::volume_loader::VolumeLoaderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Unable to handle images with {0} dimensions.")]
    UnsupportedDimension(usize),

    #[error("Image has an empty axis (shape {0:?})")]
    EmptyImage(Vec<usize>),

    #[error("Slice index {index} is out of bounds for an axis of length {len}")]
    SliceOutOfBounds { index: usize, len: usize },

    #[error("Pixel buffer does not match image shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Dicom(#[from] VolumeLoaderError),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
