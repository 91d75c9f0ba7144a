use crate::error::ThumbnailError;
use crate::volume::Volume;

use ndarray::{Array2, ArrayD, Ix2, Ix3};

/// A decoded input image, either a single plane or a volume.
#[derive(Debug, Clone)]
pub enum MedicalImage {
    /// (height, width)
    Planar(Array2<f32>),
    Volumetric(Volume),
}

impl MedicalImage {
    /// Build an image from data with any number of axes, ordered slowest
    /// first: (height, width) or (depth, height, width).
    ///
    /// # Errors
    ///
    /// [`ThumbnailError::UnsupportedDimension`] unless the data has two or
    /// three axes, and [`ThumbnailError::EmptyImage`] if any axis is empty.
    pub fn from_dyn(data: ArrayD<f32>, spacing: (f32, f32, f32)) -> Result<Self, ThumbnailError> {
        let image = match data.ndim() {
            2 => MedicalImage::Planar(data.into_dimensionality::<Ix2>()?),
            3 => MedicalImage::Volumetric(Volume::new(
                data.into_dimensionality::<Ix3>()?,
                spacing,
            )),
            n => return Err(ThumbnailError::UnsupportedDimension(n)),
        };

        let shape = image.shape();
        if shape.contains(&0) {
            return Err(ThumbnailError::EmptyImage(shape));
        }
        Ok(image)
    }

    pub fn dimension(&self) -> usize {
        match self {
            MedicalImage::Planar(_) => 2,
            MedicalImage::Volumetric(_) => 3,
        }
    }

    /// Size per axis in (width, height[, depth]) order
    pub fn size(&self) -> Vec<usize> {
        match self {
            MedicalImage::Planar(plane) => {
                let (height, width) = plane.dim();
                vec![width, height]
            }
            MedicalImage::Volumetric(volume) => {
                let (depth, height, width) = volume.dim();
                vec![width, height, depth]
            }
        }
    }

    fn shape(&self) -> Vec<usize> {
        match self {
            MedicalImage::Planar(plane) => plane.shape().to_vec(),
            MedicalImage::Volumetric(volume) => volume.data().shape().to_vec(),
        }
    }
}
