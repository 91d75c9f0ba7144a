use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Voxel counts of the volume resampled to the finest spacing.
    ///
    /// `spacing` is (x, y, z), `original_dim` is (depth, height, width);
    /// the result is in the same (depth, height, width) order.
    pub(crate) fn get_isotropic_dimensions(
        spacing: (f32, f32, f32),
        original_dim: (usize, usize, usize),
    ) -> (u32, u32, u32) {
        let (x_spacing, y_spacing, z_spacing) = spacing;
        let min_spacing = x_spacing.min(y_spacing).min(z_spacing);
        if !(min_spacing.is_finite() && min_spacing > 0.0) {
            return (
                original_dim.0 as u32,
                original_dim.1 as u32,
                original_dim.2 as u32,
            );
        }
        let inv_min_spacing = 1.0 / min_spacing;

        let scaled = |len: usize, spacing: f32| -> u32 {
            if len == 0 {
                return 0;
            }
            ((len as f32 * spacing * inv_min_spacing) as u32).max(1)
        };

        (
            scaled(original_dim.0, z_spacing),
            scaled(original_dim.1, y_spacing),
            scaled(original_dim.2, x_spacing),
        )
    }

    #[inline]
    pub(crate) fn bilinear_interpolate(slice: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
        let (height, width) = slice.dim();

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f32;
        let dx = x - x0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = slice[[y0, x0]];
        let v01 = slice[[y0, x1]];
        let v10 = slice[[y1, x0]];
        let v11 = slice[[y1, x1]];

        let v0 = v00.mul_add(one_minus_dx, v01 * dx);
        let v1 = v10.mul_add(one_minus_dx, v11 * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }

    /// Resample `slice` onto a `width` x `height` grid.
    pub(crate) fn resample(slice: &ArrayView2<f32>, width: u32, height: u32) -> Array2<f32> {
        let (slice_height, slice_width) = slice.dim();
        if slice_height == 0 || slice_width == 0 || width == 0 || height == 0 {
            return Array2::zeros((height as usize, width as usize));
        }

        let pixel_data: Vec<f32> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    // Sample at pixel centres
                    let norm_x = (x as f32 + 0.5) / width as f32;
                    let norm_y = (y as f32 + 0.5) / height as f32;

                    let src_x = norm_x * slice_width as f32 - 0.5;
                    let src_y = norm_y * slice_height as f32 - 0.5;

                    let src_x = src_x.max(0.0).min((slice_width - 1) as f32);
                    let src_y = src_y.max(0.0).min((slice_height - 1) as f32);

                    Self::bilinear_interpolate(slice, src_y, src_x)
                })
            })
            .collect();

        Array2::from_shape_vec((height as usize, width as usize), pixel_data)
            .unwrap_or_else(|_| Array2::zeros((height as usize, width as usize)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn isotropic_dimensions_scale_to_finest_spacing() {
        // 10 slices of 2.5mm over a 0.5mm in-plane grid
        let dims = Interpolator::get_isotropic_dimensions((0.5, 0.5, 2.5), (10, 64, 32));
        assert_eq!(dims, (50, 64, 32));
    }

    #[test]
    fn isotropic_dimensions_fall_back_on_invalid_spacing() {
        let dims = Interpolator::get_isotropic_dimensions((0.0, 1.0, 1.0), (3, 4, 5));
        assert_eq!(dims, (3, 4, 5));
    }

    #[test]
    fn bilinear_hits_grid_points_and_midpoints() {
        let slice = array![[0.0f32, 10.0], [20.0, 30.0]];
        let view = slice.view();
        assert_eq!(Interpolator::bilinear_interpolate(&view, 0.0, 1.0), 10.0);
        assert_eq!(Interpolator::bilinear_interpolate(&view, 1.0, 0.0), 20.0);
        assert!((Interpolator::bilinear_interpolate(&view, 0.5, 0.5) - 15.0).abs() < 1e-5);
    }

    #[test]
    fn resample_stretches_rows() {
        let slice = array![[1.0f32, 1.0], [3.0, 3.0]];
        let resampled = Interpolator::resample(&slice.view(), 2, 4);
        assert_eq!(resampled.dim(), (4, 2));
        assert_eq!(resampled[[0, 0]], 1.0);
        assert_eq!(resampled[[3, 1]], 3.0);
        assert!(resampled[[1, 0]] < resampled[[2, 0]]);
    }
}
