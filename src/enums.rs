use clap::ValueEnum;
use ndarray::Axis;

/// Anatomical axis a slice is taken from, or a projection runs along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Orientation {
    #[default]
    Axial,
    Coronal,
    Sagittal,
}

impl Orientation {
    /// Array axis of a (depth, height, width) volume
    pub fn axis(self) -> Axis {
        match self {
            Orientation::Axial => Axis(0),
            Orientation::Coronal => Axis(1),
            Orientation::Sagittal => Axis(2),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Interpolation {
    Bilinear,
    #[default]
    None,
}

/// How a volume is reduced to the 2D plane that becomes the thumbnail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    #[default]
    MedialSlice,
    MaximumIntensityProjection,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// Directory of `.dcm` files forming one series
    DicomSeries,
    Dicom,
    Nifti,
    /// Anything the `image` crate can decode
    Raster,
}
