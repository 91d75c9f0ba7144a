//! # Volume thumbnailer
//!
//! This crate makes 2D preview thumbnails from 2D or 3D medical images.
//!
//! Inputs can be a single DICOM file (one or several frames), a directory
//! holding a DICOM series, a NIfTI-1 file, or any raster format the `image`
//! crate decodes. Every input becomes a [`MedicalImage`] of dimension 2 or 3;
//! anything else is rejected.
//!
//! A volume is reduced to one plane in one of two ways:
//!  - Medial slice: the slice at `floor(len / 2)` along the chosen axis
//!  - Maximum intensity projection: the volume is first collapsed along the
//!    chosen axis, and the medial slice of the projection is taken
//!
//! The plane is then rescaled to `[0, 255]`, cast to 8 bits and passed
//! through a grey colormap into RGB before it is written. Coronal and
//! sagittal slices can be resampled to isotropic pixels using the voxel
//! spacing.
//!
//! # Examples
//!
//! ## Thumbnail of the central axial slice
//!
//! ```no_run
//! # use volume_thumbnailer::{ThumbnailConfig, pipeline};
//! # use std::path::PathBuf;
//! let config = ThumbnailConfig {
//!     input: PathBuf::from("brain.nii.gz"),
//!     output: PathBuf::from("brain.jpg"),
//!     ..Default::default()
//! };
//! let summary = pipeline::generate(&config).expect("should have written thumbnail");
//! println!("{}x{} from slice {:?}", summary.width, summary.height, summary.slice_index);
//! ```
//!
//! ## Projection through a DICOM series
//!
//! ```no_run
//! # use volume_thumbnailer::{MedicalImage, Thumbnailer, VolumeLoader};
//! # use volume_thumbnailer::enums::{ExtractionMode, Interpolation, Orientation, SortBy};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let thumbnailer = Thumbnailer::new(
//!     ExtractionMode::MaximumIntensityProjection,
//!     Orientation::Coronal,
//!     Interpolation::Bilinear,
//! );
//! let (image, _) = thumbnailer
//!     .render(&MedicalImage::Volumetric(volume))
//!     .expect("should have rendered projection");
//! image.save("mip.png").expect("should have saved thumbnail");
//! ```

pub mod config;
pub mod enums;
pub mod error;
mod interpolator;
pub mod medical_image;
pub mod pipeline;
pub mod reader;
pub mod volume;
pub mod volume_loader;

pub use config::ThumbnailConfig;
pub use error::ThumbnailError;
pub use medical_image::MedicalImage;
pub use pipeline::{ThumbnailSummary, Thumbnailer};
pub use volume::Volume;
pub use volume_loader::VolumeLoader;
