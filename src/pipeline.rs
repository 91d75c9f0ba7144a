use crate::config::ThumbnailConfig;
use crate::enums::{ExtractionMode, Interpolation, Orientation};
use crate::error::ThumbnailError;
use crate::medical_image::MedicalImage;
use crate::reader::read_image;
use crate::volume::Volume;

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array2;
use std::path::PathBuf;
use tracing::{debug, info};
use web_time::Instant;

const OUTPUT_MINIMUM: f32 = 0.0;
const OUTPUT_MAXIMUM: f32 = 255.0;

/// What a thumbnail run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSummary {
    /// Dimensionality of the input image (2 or 3)
    pub source_dimension: usize,
    /// Index of the extracted slice, `None` for 2D inputs
    pub slice_index: Option<usize>,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

/// A 2D plane taken out of an input image.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// (height, width)
    pub plane: Array2<f32>,
    pub slice_index: Option<usize>,
}

/// Reduces an image to a grey RGB thumbnail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thumbnailer {
    mode: ExtractionMode,
    orientation: Orientation,
    interpolation: Interpolation,
}

impl Thumbnailer {
    pub fn new(mode: ExtractionMode, orientation: Orientation, interpolation: Interpolation) -> Self {
        Self {
            mode,
            orientation,
            interpolation,
        }
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self::new(config.mode, config.orientation, config.interpolation)
    }

    /// Take the plane the thumbnail is made from.
    ///
    /// 2D images pass through unchanged. Volumes are optionally projected
    /// first, then the medial slice along the configured orientation is
    /// taken from whichever volume results.
    pub fn extract(&self, image: &MedicalImage) -> Result<Extracted, ThumbnailError> {
        let volume = match image {
            MedicalImage::Planar(plane) => {
                info!("The input image is 2D.");
                return Ok(Extracted {
                    plane: plane.clone(),
                    slice_index: None,
                });
            }
            MedicalImage::Volumetric(volume) => volume,
        };
        info!("The input image is 3D.");

        let projected: Volume;
        let source = match self.mode {
            ExtractionMode::MedialSlice => volume,
            ExtractionMode::MaximumIntensityProjection => {
                info!(orientation = ?self.orientation, "Computing the maximum intensity projection.");
                let started = Instant::now();
                projected = volume.max_intensity_projection(self.orientation);
                debug!(elapsed = ?started.elapsed(), "Projection done");
                &projected
            }
        };

        let index = source.medial_index(self.orientation);
        info!("The medial slice is {index}.");
        info!("Extracting the medial slice.");
        let plane = source
            .get_image_from_axis(index, self.orientation, self.interpolation)
            .ok_or(ThumbnailError::SliceOutOfBounds {
                index,
                len: source.len_of(self.orientation),
            })?;

        Ok(Extracted {
            plane,
            slice_index: Some(index),
        })
    }

    /// Run every in-memory stage: extract, rescale, cast and colorize.
    pub fn render(&self, image: &MedicalImage) -> Result<(RgbImage, Option<usize>), ThumbnailError> {
        let started = Instant::now();
        let Extracted { plane, slice_index } = self.extract(image)?;
        debug!(elapsed = ?started.elapsed(), "Extraction done");

        info!("Rescaling image intensities between 0 and 255.");
        let rescaled = rescale_intensity(&plane, OUTPUT_MINIMUM, OUTPUT_MAXIMUM);

        info!("Casting the image to 8-bit unsigned integers.");
        let gray = cast_to_u8(&rescaled)?;

        info!("Converting the image to RGB.");
        let color = colorize(gray);
        debug!(elapsed = ?started.elapsed(), "Rendering done");

        Ok((color, slice_index))
    }
}

/// Linearly map intensities so the minimum lands on `out_min` and the
/// maximum on `out_max`.
///
/// A constant plane has no range to stretch; it is scaled by its own value
/// instead, which sends it to `out_min`.
pub fn rescale_intensity(plane: &Array2<f32>, out_min: f32, out_max: f32) -> Array2<f32> {
    let (min, max) = plane.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return plane.clone();
    }

    // The maximum has to land exactly on `out_max`, which f32 misses
    let (min, max) = (f64::from(min), f64::from(max));
    let (out_min, out_max) = (f64::from(out_min), f64::from(out_max));
    let scale = if max != min {
        (out_max - out_min) / (max - min)
    } else if max != 0.0 {
        (out_max - out_min) / max
    } else {
        0.0
    };
    let shift = out_min - min * scale;
    debug!(min, max, scale, shift, "Rescale parameters");

    let mut rescaled = plane.clone();
    rescaled.par_mapv_inplace(|v| f64::from(v).mul_add(scale, shift) as f32);
    rescaled
}

#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Cast a (height, width) plane into an 8-bit grey image.
pub fn cast_to_u8(plane: &Array2<f32>) -> Result<GrayImage, ThumbnailError> {
    let (height, width) = plane.dim();
    let pixels: Vec<u8> = plane.iter().map(|&v| to_u8(v)).collect();
    GrayImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| ThumbnailError::EmptyImage(vec![height, width]))
}

/// Grey colormap: each channel carries the intensity.
pub fn colorize(gray: GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(gray).into_rgb8()
}

/// Read the input, render the thumbnail and write it to the output path.
pub fn generate(config: &ThumbnailConfig) -> Result<ThumbnailSummary, ThumbnailError> {
    let started = Instant::now();
    let image = read_image(&config.input, config.sort_by)?;
    debug!(size = ?image.size(), elapsed = ?started.elapsed(), "Input read");

    let (thumbnail, slice_index) = Thumbnailer::from_config(config).render(&image)?;

    info!("Output image statistics");
    info!("Number of Dimensions: 2");
    info!("Width: {}", thumbnail.width());
    info!("Height: {}", thumbnail.height());
    info!("Depth (should be 0): 0");
    info!("Writing the output to disk.");
    thumbnail.save(&config.output)?;
    debug!(elapsed = ?started.elapsed(), output = %config.output.display(), "Thumbnail written");

    Ok(ThumbnailSummary {
        source_dimension: image.dimension(),
        slice_index,
        width: thumbnail.width(),
        height: thumbnail.height(),
        output: config.output.clone(),
    })
}
