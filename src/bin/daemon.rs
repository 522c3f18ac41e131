//! Stream the local screen to an attached projector until interrupted.
//!
//! Run with: `picoproj-daemon --brightness high`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use picoproj::{Brightness, Geometry, Projector, ProjectorConfig, ResizeFilter};

#[derive(Parser)]
#[command(name = "picoproj-daemon")]
#[command(about = "Stream the local screen to a USB pico projector")]
struct Args {
    /// Lamp brightness level (maximum, high, medium, low).
    #[arg(long, default_value = "high")]
    brightness: Brightness,

    /// Target resolution, e.g. 800x480.
    #[arg(long, default_value = "800x480")]
    resolution: Geometry,

    /// Resize filter (nearest, triangle, catmullrom, gaussian, lanczos).
    #[arg(long, default_value = "triangle")]
    filter: ResizeFilter,

    /// Print the rolling frame duration every N frames (0 = never).
    #[arg(long, default_value_t = 25)]
    report_every: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    let config = ProjectorConfig {
        resolution: args.resolution,
        filter: args.filter,
        ..ProjectorConfig::default()
    };
    let mut projector = Projector::open_with(config)?;
    projector.set_brightness(args.brightness)?;

    println!("Streaming to the projector... press Ctrl-C to stop");

    let mut frame = 0u64;
    while !stop.load(Ordering::SeqCst) {
        projector.run_cycle()?;
        frame += 1;
        if args.report_every > 0 && frame % args.report_every == 0 {
            if let Some(duration) = projector.average_frame_duration() {
                println!("duration per frame: {duration:?}");
            }
        }
    }

    println!("Got stop signal, shutting down after {frame} frames");
    Ok(())
}
