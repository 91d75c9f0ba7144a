use crate::enums::Interpolation;
use crate::enums::Orientation;
use crate::interpolator::Interpolator;

use ndarray::Array2;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::Zip;

#[derive(Debug, Clone, Default)]
pub struct Volume {
    data: Array3<f32>,
    spacing: (f32, f32, f32),
    interpolated_dim: (u32, u32, u32),
}

impl Volume {
    /// Wrap voxel data laid out as (depth, height, width).
    ///
    /// `spacing` is the voxel size along (x, y, z).
    pub fn new(data: Array3<f32>, spacing: (f32, f32, f32)) -> Self {
        let original_dim = data.dim();
        Self {
            data,
            spacing,
            interpolated_dim: Interpolator::get_isotropic_dimensions(spacing, original_dim),
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    /// Number of slices along `orientation`
    pub fn len_of(&self, orientation: Orientation) -> usize {
        self.data.len_of(orientation.axis())
    }

    /// Index of the medial slice along `orientation`, `floor(len / 2)`.
    pub fn medial_index(&self, orientation: Orientation) -> usize {
        self.len_of(orientation) / 2
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, f32>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        Some(self.data.index_axis(orientation.axis(), index))
    }

    /// Collapse the volume to a single slice holding the maximum along
    /// `orientation`. The projected axis keeps length 1.
    pub fn max_intensity_projection(&self, orientation: Orientation) -> Volume {
        let axis = orientation.axis();
        let projected: Array2<f32> = Zip::from(self.data.lanes(axis))
            .par_map_collect(|lane| lane.fold(f32::NEG_INFINITY, |max, &v| max.max(v)));
        Volume::new(projected.insert_axis(axis), self.spacing)
    }

    fn get_output_dimensions(&self, orientation: Orientation) -> (u32, u32) {
        // Always (width, height)
        match orientation {
            // Looking down Z-axis: X is width, Y is height
            Orientation::Axial => (self.interpolated_dim.2, self.interpolated_dim.1),
            // Looking down Y-axis: X is width, Z is height
            Orientation::Coronal => (self.interpolated_dim.2, self.interpolated_dim.0),
            // Looking down X-axis: Y is width, Z is height
            Orientation::Sagittal => (self.interpolated_dim.1, self.interpolated_dim.0),
        }
    }

    /// Slice at `index` along `orientation` as an owned (height, width) plane.
    pub fn get_image_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
        interpolation: Interpolation,
    ) -> Option<Array2<f32>> {
        let slice = self.get_slice_from_axis(index, orientation)?;

        match interpolation {
            Interpolation::None => Some(slice.to_owned()),
            Interpolation::Bilinear => {
                // Axial doesn't need interpolation (already isotropic in-plane)
                if matches!(orientation, Orientation::Axial) {
                    return Some(slice.to_owned());
                }
                let (width, height) = self.get_output_dimensions(orientation);
                Some(Interpolator::resample(&slice, width, height))
            }
        }
    }

    fn is_valid_index(&self, index: usize, orientation: Orientation) -> bool {
        index < self.len_of(orientation)
    }
}
