use std::{io::IsTerminal, path::PathBuf};

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use volume_thumbnailer::{
    config::ThumbnailConfig,
    enums::{ExtractionMode, Interpolation, Orientation, SortBy},
    pipeline,
};

#[derive(Parser, Debug)]
#[command(name = "thumbnailer")]
#[command(about = "Generate a thumbnail from a 2D or 3D image")]
#[command(version)]
pub struct Args {
    /// Input file, or a directory holding a DICOM series
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Output thumbnail; the format follows the extension
    #[arg(value_name = "OUTPUT_FILE")]
    pub output: PathBuf,

    /// Output with extreme verbosity
    #[arg(short = 'l', long = "loud", visible_alias = "verbose")]
    pub loud: bool,

    /// Use a maximum intensity projection instead of the medial slice
    #[arg(short = 'm', long = "mip")]
    pub mip: bool,

    /// Axis to take the slice from and to project along
    #[arg(short = 'a', long, value_enum, default_value_t = Orientation::Axial)]
    pub axis: Orientation,

    /// Resample coronal and sagittal slices to isotropic pixels
    #[arg(short = 'i', long, value_enum, default_value_t = Interpolation::None)]
    pub interpolation: Interpolation,

    /// Slice order for DICOM series directories
    #[arg(long, value_enum, default_value_t = SortBy::ImagePositionPatient)]
    pub sort_by: SortBy,
}

impl From<Args> for ThumbnailConfig {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            output: args.output,
            mode: if args.mip {
                ExtractionMode::MaximumIntensityProjection
            } else {
                ExtractionMode::MedialSlice
            },
            orientation: args.axis,
            interpolation: args.interpolation,
            sort_by: args.sort_by,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.loud {
        EnvFilter::new("warn,volume_thumbnailer=debug,thumbnailer=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();

    let config = ThumbnailConfig::from(args);
    let summary = pipeline::generate(&config)?;
    tracing::debug!(?summary, "Done");
    Ok(())
}
