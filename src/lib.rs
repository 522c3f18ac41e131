//! Driver for Acer C11x-series USB pico projectors.
//!
//! This crate captures the local screen, resizes and JPEG-encodes it under a
//! byte budget, and streams it to the projector over USB bulk transfers
//! using the device's 24-byte widget frame protocol. Brightness control
//! frames ride the same endpoint.
//!
//! # Getting started
//!
//! ```no_run
//! use picoproj::{Brightness, Projector};
//!
//! let mut projector = Projector::open()?;
//! projector.set_brightness(Brightness::High)?;
//!
//! for frame in 0u32.. {
//!     projector.run_cycle()?;
//!     if frame % 25 == 0 {
//!         if let Some(duration) = projector.average_frame_duration() {
//!             println!("duration per frame: {duration:?}");
//!         }
//!     }
//! }
//! # Ok::<(), picoproj::Error>(())
//! ```
//!
//! The pipeline is fully synchronous and single-threaded: every capture,
//! encode and transfer blocks the calling thread, and the caller drives the
//! loop (checking its own stop flag between cycles). One thread owns one
//! device; nothing here is safe to share across threads.
//!
//! # Backends
//!
//! Screen capture and picture encoding are trait objects picked at runtime:
//!
//! - `x11-capture` — capture through Xlib (`XGetImage`) on Linux.
//! - `jpeg-encode` (default) — resize and JPEG-encode via the `image` crate.
//!
//! Capture backends are probed in order at startup and the first one that
//! comes up wins; custom backends plug in through
//! [`Projector::with_transport`].

pub mod capture;
pub mod counter;
pub mod encode;
mod error;
pub mod projector;
pub mod usb;
pub mod util;
pub mod widget;

// Crate-level error types
pub use error::{Error, Result};

// Pipeline types
pub use counter::FrameCounter;
pub use projector::{
    list_projectors, FrameSink, Projector, ProjectorConfig, ProjectorInfo, ACER_C110,
    DEFAULT_RESOLUTION, KNOWN_PROJECTORS,
};

// Provider contracts
pub use capture::{ScreenCapture, ScreenImage};
pub use encode::{Geometry, PictureEncoder, ResizeFilter, DEFAULT_MAX_PICTURE_BYTES};

// Topology and wire protocol types
pub use usb::{DeviceId, UsbBus};
pub use widget::{
    Brightness, BrightnessWidget, PictureWidget, MAX_PICTURE_SIZE, WIDGET_SIZE,
};

// Conditional exports based on features

#[cfg(feature = "jpeg-encode")]
pub use encode::JpegPictureEncoder;

#[cfg(all(feature = "x11-capture", target_os = "linux"))]
pub use capture::X11Capture;

// Re-export rusb for consumers that need descriptor types directly.
pub use rusb;
