//! Emit raw widget frames to a file, for poking the device by hand.
//!
//! Run with: `picoproj-widget frame.bin --picture-size 6749`
//! or: `picoproj-widget frame.bin --brightness low`

use std::path::PathBuf;

use clap::Parser;

use picoproj::util;
use picoproj::widget::{Brightness, BrightnessWidget, PictureWidget, WIDGET_SIZE};

#[derive(Parser)]
#[command(name = "picoproj-widget")]
#[command(about = "Write a picture or brightness widget frame to a file")]
struct Args {
    /// Output file.
    output: PathBuf,

    /// Emit a picture widget announcing a payload of this many bytes.
    #[arg(long, conflicts_with = "brightness")]
    picture_size: Option<usize>,

    /// Emit a brightness widget for this level.
    #[arg(long)]
    brightness: Option<Brightness>,

    /// Append to the output file if it exists.
    #[arg(long)]
    append: bool,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    overwrite: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let data: [u8; WIDGET_SIZE] = match (args.picture_size, args.brightness) {
        (Some(picture_size), None) => *PictureWidget::new(picture_size)?.as_bytes(),
        (None, Some(brightness)) => *BrightnessWidget::new(brightness).as_bytes(),
        _ => return Err("pass exactly one of --picture-size or --brightness".into()),
    };

    util::write_to_file(&args.output, &data, args.append, args.overwrite)?;
    println!(
        "Wrote {WIDGET_SIZE} byte widget to {}",
        args.output.display()
    );
    Ok(())
}
