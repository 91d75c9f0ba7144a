//! Input decoding.
//!
//! The format is picked from the path: directories are DICOM series,
//! NIfTI files go by extension, DICOM files by extension or by the `DICM`
//! preamble magic, and everything else is handed to the `image` crate.
use crate::enums::{InputFormat, SortBy};
use crate::error::ThumbnailError;
use crate::medical_image::MedicalImage;
use crate::volume_loader::VolumeLoader;

use ndarray::{Array2, ArrayD, IxDyn};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const NIFTI_SUFFIXES: [&str; 4] = [".nii", ".nii.gz", ".hdr", ".hdr.gz"];
const DICOM_MAGIC_OFFSET: usize = 128;

impl InputFormat {
    /// Work out how to decode `path`.
    pub fn detect(path: &Path) -> Result<Self, std::io::Error> {
        if path.is_dir() {
            return Ok(InputFormat::DicomSeries);
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if NIFTI_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return Ok(InputFormat::Nifti);
        }
        if name.ends_with(".dcm") || name.ends_with(".dicom") || has_dicom_magic(path)? {
            return Ok(InputFormat::Dicom);
        }
        Ok(InputFormat::Raster)
    }
}

fn has_dicom_magic(path: &Path) -> Result<bool, std::io::Error> {
    let mut preamble = [0u8; DICOM_MAGIC_OFFSET + 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut preamble) {
        Ok(()) => Ok(&preamble[DICOM_MAGIC_OFFSET..] == b"DICM"),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Read `path` into a 2D or 3D image.
///
/// `sort_by` only applies to DICOM series directories.
pub fn read_image(path: &Path, sort_by: SortBy) -> Result<MedicalImage, ThumbnailError> {
    let format = InputFormat::detect(path)?;
    debug!(?format, path = %path.display(), "Reading input");

    match format {
        InputFormat::DicomSeries => {
            let volume = VolumeLoader::load_from_directory(path, sort_by)?;
            Ok(MedicalImage::Volumetric(volume))
        }
        InputFormat::Dicom => {
            let (data, spacing) = VolumeLoader::load_from_file(path)?;
            MedicalImage::from_dyn(data, spacing)
        }
        InputFormat::Nifti => {
            let (data, spacing) = read_nifti(path)?;
            MedicalImage::from_dyn(data, spacing)
        }
        InputFormat::Raster => read_raster(path),
    }
}

/// Voxels come back slowest axis first, i.e. (..., z, y, x).
fn read_nifti(path: &Path) -> Result<(ArrayD<f32>, (f32, f32, f32)), ThumbnailError> {
    let object = ReaderOptions::new().read_file(path)?;
    let pixdim = object.header().pixdim;
    let volume = object.into_volume().into_ndarray::<f32>()?;

    // NIfTI is indexed (x, y, z, ...). The nifti crate builds on an older
    // ndarray, so the voxels are moved over by value.
    let shape = volume.shape().to_vec();
    let voxels: Vec<f32> = volume.iter().copied().collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), voxels)?.reversed_axes();

    let spacing_of = |i: usize| {
        let value = pixdim[i].abs();
        if value.is_finite() && value > 0.0 { value } else { 1.0 }
    };
    Ok((data, (spacing_of(1), spacing_of(2), spacing_of(3))))
}

fn read_raster(path: &Path) -> Result<MedicalImage, ThumbnailError> {
    let luma = image::open(path)?.to_luma32f();
    let (width, height) = luma.dimensions();
    let plane = Array2::from_shape_vec((height as usize, width as usize), luma.into_raw())?;
    MedicalImage::from_dyn(plane.into_dyn(), (1.0, 1.0, 1.0))
}
