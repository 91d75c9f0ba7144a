use crate::{enums::SortBy, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, ArrayD, Axis, s};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("DICOM pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

const DEFAULT_SPACING: (f32, f32, f32) = (1.0, 1.0, 1.0);

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects, one slice per object
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut images_with_order: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_image_with_order(dicom_object, sort_by))
            .collect();

        if images_with_order.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        if images_with_order.len() < dicom_objects.len() {
            warn!(
                skipped = dicom_objects.len() - images_with_order.len(),
                "Some DICOM objects had no decodable image or sort key"
            );
        }

        Self::sort_images(&mut images_with_order, sort_by);

        let images: Vec<_> = images_with_order
            .into_iter()
            .map(|(_, image)| image)
            .collect();

        Self::validate_dimensions(&images)?;

        let volume_array = Self::build_volume_array(&images);
        let spacing = dicom_objects
            .iter()
            .find_map(Self::get_spacing)
            .unwrap_or_else(|| {
                debug!("No spacing information found, assuming 1mm isotropic voxels");
                DEFAULT_SPACING
            });

        Ok(Volume::new(volume_array, spacing))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        debug!(files = paths.len(), "Loading DICOM series");
        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Load every frame of a single DICOM file.
    ///
    /// A single frame comes back as (rows, columns), several frames as
    /// (frames, rows, columns). Only the first sample of each pixel is kept.
    pub fn load_from_file(
        path: impl AsRef<Path>,
    ) -> Result<(ArrayD<f32>, (f32, f32, f32)), VolumeLoaderError> {
        let dicom_object = open_file(path.as_ref())?;
        let frames = Self::decode_frames(&dicom_object)?;
        let spacing = Self::get_spacing(&dicom_object).unwrap_or(DEFAULT_SPACING);

        let data = if frames.len_of(Axis(0)) == 1 {
            frames.index_axis_move(Axis(0), 0).into_dyn()
        } else {
            frames.into_dyn()
        };
        Ok((data, spacing))
    }

    fn extract_image_with_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<(Option<f32>, Array2<f32>)> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let frames = Self::decode_frames(dicom_object).ok()?;
        Some((order, frames.index_axis_move(Axis(0), 0)))
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    /// (frames, rows, columns)
    fn decode_frames(
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<Array3<f32>, VolumeLoaderError> {
        let pixel_data = dicom_object.decode_pixel_data()?;
        // Modality LUT only; windowing would clip what the rescale stretches
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Identity);
        let frames = pixel_data
            .to_ndarray_with_options::<f32>(&options)?
            .slice_move(s![.., .., .., 0]);
        Ok(frames)
    }

    fn sort_images(images_with_order: &mut [(Option<f32>, Array2<f32>)], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            images_with_order
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            images_with_order.reverse();
        }
    }

    fn validate_dimensions(images: &[Array2<f32>]) -> Result<(), VolumeLoaderError> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(images: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }

    /// Voxel spacing as (x, y, z). PixelSpacing is stored row spacing first.
    fn get_spacing(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<(f32, f32, f32)> {
        let pixel_spacing = dicom_object
            .element(tags::PIXEL_SPACING)
            .ok()?
            .to_multi_float32()
            .ok()?;
        let (row_spacing, column_spacing) = (*pixel_spacing.first()?, *pixel_spacing.get(1)?);

        let slice_spacing = [tags::SPACING_BETWEEN_SLICES, tags::SLICE_THICKNESS]
            .into_iter()
            .find_map(|tag| dicom_object.element(tag).ok()?.to_float32().ok())
            .unwrap_or(1.0);

        Some((column_spacing, row_spacing, slice_spacing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MedicalImage, Thumbnailer, reader::read_image};
    use dicom::core::{DataElement, PrimitiveValue, VR, dicom_value};
    use dicom::dictionary_std::uids;
    use dicom::object::{FileMetaTableBuilder, mem::InMemElement};
    use std::path::Path;

    /// Write a CT file with 16-bit unsigned pixels, a -1024 rescale
    /// intercept and a narrow soft-tissue window.
    ///
    /// `pixels` holds `frames` frames of `rows` x `cols`, row-major.
    fn write_ct(path: &Path, rows: u16, cols: u16, frames: u32, pixels: &[u16], instance: i32) {
        assert_eq!(pixels.len(), rows as usize * cols as usize * frames as usize);
        let sop_instance_uid = format!("1.2.826.0.1.3680043.9.7{instance:03}");
        let pixel_bytes: Vec<u8> = pixels.iter().flat_map(|p| p.to_le_bytes()).collect();

        let element =
            |tag, vr, value: PrimitiveValue| -> InMemElement { DataElement::new(tag, vr, value) };
        let object = InMemDicomObject::from_element_iter([
            element(tags::SOP_CLASS_UID, VR::UI, uids::CT_IMAGE_STORAGE.into()),
            element(tags::SOP_INSTANCE_UID, VR::UI, sop_instance_uid.as_str().into()),
            element(tags::INSTANCE_NUMBER, VR::IS, instance.to_string().into()),
            element(tags::SLICE_THICKNESS, VR::DS, "2.5".into()),
            element(tags::SAMPLES_PER_PIXEL, VR::US, 1u16.into()),
            element(tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2".into()),
            element(tags::NUMBER_OF_FRAMES, VR::IS, frames.to_string().into()),
            element(tags::ROWS, VR::US, rows.into()),
            element(tags::COLUMNS, VR::US, cols.into()),
            element(tags::PIXEL_SPACING, VR::DS, dicom_value!(Strs, ["0.5", "0.8"])),
            element(tags::BITS_ALLOCATED, VR::US, 16u16.into()),
            element(tags::BITS_STORED, VR::US, 16u16.into()),
            element(tags::HIGH_BIT, VR::US, 15u16.into()),
            element(tags::PIXEL_REPRESENTATION, VR::US, 0u16.into()),
            element(tags::WINDOW_CENTER, VR::DS, "40".into()),
            element(tags::WINDOW_WIDTH, VR::DS, "400".into()),
            element(tags::RESCALE_INTERCEPT, VR::DS, "-1024".into()),
            element(tags::RESCALE_SLOPE, VR::DS, "1".into()),
            element(tags::PIXEL_DATA, VR::OW, pixel_bytes.into()),
        ]);

        object
            .with_meta(
                FileMetaTableBuilder::new().transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN),
            )
            .unwrap()
            .write_to_file(path)
            .unwrap();
    }

    fn plane(value: f32) -> Array2<f32> {
        Array2::from_elem((2, 3), value)
    }

    fn order_of(images: &[(Option<f32>, Array2<f32>)]) -> Vec<f32> {
        images.iter().map(|(_, image)| image[[0, 0]]).collect()
    }

    #[test]
    fn instance_number_sorts_ascending() {
        let mut images = vec![(Some(3.0), plane(3.0)), (Some(1.0), plane(1.0)), (Some(2.0), plane(2.0))];
        VolumeLoader::sort_images(&mut images, SortBy::InstanceNumber);
        assert_eq!(order_of(&images), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn image_position_sorts_descending() {
        let mut images = vec![(Some(-5.0), plane(1.0)), (Some(5.0), plane(2.0)), (Some(0.0), plane(3.0))];
        VolumeLoader::sort_images(&mut images, SortBy::ImagePositionPatient);
        assert_eq!(order_of(&images), vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn unsorted_keeps_input_order() {
        let mut images = vec![(Some(0.0), plane(2.0)), (Some(0.0), plane(1.0))];
        VolumeLoader::sort_images(&mut images, SortBy::None);
        assert_eq!(order_of(&images), vec![2.0, 1.0]);
    }

    #[test]
    fn mismatched_slices_are_rejected() {
        let images = vec![plane(0.0), Array2::zeros((3, 3))];
        assert!(matches!(
            VolumeLoader::validate_dimensions(&images),
            Err(VolumeLoaderError::InconsistentDimensions)
        ));
    }

    #[test]
    fn slices_stack_along_depth() {
        let volume = VolumeLoader::build_volume_array(&[plane(1.0), plane(2.0)]);
        assert_eq!(volume.dim(), (2, 2, 3));
        assert_eq!(volume[[1, 1, 2]], 2.0);
    }

    #[test]
    fn directory_without_dicom_files_has_no_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a dicom").unwrap();
        assert!(matches!(
            VolumeLoader::load_from_directory(dir.path(), SortBy::default()),
            Err(VolumeLoaderError::NoValidImages)
        ));
    }

    #[test]
    fn single_frame_file_is_planar_in_hounsfield_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.dcm");
        write_ct(&path, 2, 2, 1, &[0, 1000, 2000, 3000], 1);

        let (data, spacing) = VolumeLoader::load_from_file(&path).unwrap();
        assert_eq!(data.shape(), &[2, 2]);
        assert_eq!(data.iter().copied().collect::<Vec<_>>(), vec![-1024.0, -24.0, 976.0, 1976.0]);
        // PixelSpacing is row spacing first
        assert_eq!(spacing, (0.8, 0.5, 2.5));

        let image = read_image(&path, SortBy::default()).unwrap();
        assert_eq!(image.dimension(), 2);
    }

    #[test]
    fn window_does_not_clip_the_intensity_ramp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.dcm");
        write_ct(&path, 2, 2, 1, &[0, 1000, 2000, 3000], 1);

        let image = read_image(&path, SortBy::default()).unwrap();
        let (thumbnail, _) = Thumbnailer::default().render(&image).unwrap();
        let levels: Vec<u8> = thumbnail.pixels().map(|p| p.0[0]).collect();
        assert_eq!(levels, vec![0, 85, 170, 255]);
    }

    #[test]
    fn multi_frame_file_is_a_volume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.dcm");
        let pixels: Vec<u16> = (0..3u16).flat_map(|frame| [frame * 100; 4]).collect();
        write_ct(&path, 2, 2, 3, &pixels, 1);

        let image = read_image(&path, SortBy::default()).unwrap();
        assert_eq!(image.dimension(), 3);
        assert_eq!(image.size(), vec![2, 2, 3]);

        let extracted = Thumbnailer::default().extract(&image).unwrap();
        assert_eq!(extracted.slice_index, Some(1));
        assert!(extracted.plane.iter().all(|&v| v == 100.0 - 1024.0));
    }

    #[test]
    fn directory_series_stacks_in_sort_order() {
        let dir = tempfile::tempdir().unwrap();
        write_ct(&dir.path().join("a.dcm"), 2, 3, 1, &[500; 6], 2);
        write_ct(&dir.path().join("b.dcm"), 2, 3, 1, &[100; 6], 1);

        let volume = VolumeLoader::load_from_directory(dir.path(), SortBy::InstanceNumber).unwrap();
        assert_eq!(volume.dim(), (2, 2, 3));
        assert_eq!(volume.data()[[0, 0, 0]], 100.0 - 1024.0);
        assert_eq!(volume.data()[[1, 1, 2]], 500.0 - 1024.0);
        assert_eq!(volume.spacing(), (0.8, 0.5, 2.5));

        let image = read_image(dir.path(), SortBy::InstanceNumber).unwrap();
        assert!(matches!(image, MedicalImage::Volumetric(_)));
    }
}
