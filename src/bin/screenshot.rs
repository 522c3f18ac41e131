//! Capture screenshots and encode them the way the streaming pipeline does.
//!
//! Run with: `picoproj-screenshot --frames 5 --resolution 800x480`

use std::path::PathBuf;

use clap::Parser;

use picoproj::capture;
use picoproj::encode::{
    Geometry, JpegPictureEncoder, PictureEncoder, ResizeFilter, DEFAULT_MAX_PICTURE_BYTES,
};
use picoproj::util;

#[derive(Parser)]
#[command(name = "picoproj-screenshot")]
#[command(about = "Capture the screen and encode projector-ready JPEG files")]
struct Args {
    /// Number of screenshots to take.
    #[arg(short, long, default_value_t = 1)]
    frames: u32,

    /// Prefix for the output filenames.
    #[arg(short, long, default_value = "screenshot")]
    prefix: String,

    /// Target resolution, e.g. 800x480.
    #[arg(short, long, default_value = "800x480")]
    resolution: Geometry,

    /// Resize filter (nearest, triangle, catmullrom, gaussian, lanczos).
    #[arg(long, default_value = "triangle")]
    filter: ResizeFilter,

    /// Keep the native screen resolution.
    #[arg(long)]
    no_resize: bool,

    /// Overwrite existing output files.
    #[arg(long)]
    overwrite: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let geometry = if args.no_resize {
        Geometry {
            width: None,
            height: None,
        }
    } else {
        args.resolution
    };

    let mut capture = capture::probe(&capture::default_backends())?;
    println!("Capturing with the {} backend", capture.name());

    for index in 0..args.frames {
        capture.update_screenshot()?;
        let image = capture.image()?;

        let encoder = JpegPictureEncoder::new(
            &image,
            geometry,
            args.filter,
            DEFAULT_MAX_PICTURE_BYTES,
        )?;

        let path = PathBuf::from(format!("{}-{index:04}.jpg", args.prefix));
        util::write_to_file(&path, encoder.encoded_bytes(), false, args.overwrite)?;
        println!("Wrote {} ({} bytes)", path.display(), encoder.encoded_len());
    }

    Ok(())
}
