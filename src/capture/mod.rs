//! Screen capture providers.
//!
//! A [`ScreenCapture`] backend grabs the current screen contents and hands
//! them to the pipeline as a tightly packed RGB image. Backends are selected
//! at startup by probing an ordered list of factories and taking the first
//! one that comes up; later entries are fallbacks for environments where the
//! preferred backend is unavailable.

#[cfg(all(feature = "x11-capture", target_os = "linux"))]
pub mod x11;

#[cfg(all(feature = "x11-capture", target_os = "linux"))]
pub use x11::X11Capture;

use thiserror::Error;

/// Errors that can occur while capturing the screen.
#[derive(Error, Debug)]
pub enum Error {
    /// No display connection could be established.
    #[error("no display connection: {0}")]
    DisplayUnavailable(String),

    /// A screenshot could not be taken.
    #[error("screenshot capture failed: {0}")]
    CaptureFailed(String),

    /// Every capture backend in the probe list failed to start.
    #[error("no usable screen capture backend found")]
    NoBackend,
}

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A captured screen image: tightly packed 8-bit RGB rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ScreenImage {
    /// Wrap tightly packed RGB8 pixel data.
    ///
    /// `data` must hold exactly `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        ScreenImage {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel data, row by row, three bytes per pixel.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image and return its pixel data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Contract for screen capture backends.
pub trait ScreenCapture {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Take a fresh screenshot, replacing any previously captured one.
    fn update_screenshot(&mut self) -> Result<()>;

    /// The most recent screenshot.
    ///
    /// Captures one first if [`update_screenshot`](Self::update_screenshot)
    /// has never been called.
    fn image(&mut self) -> Result<ScreenImage>;
}

/// A named constructor for a capture backend.
pub type CaptureFactory = (&'static str, fn() -> Result<Box<dyn ScreenCapture>>);

/// Try each factory in order and return the first backend that starts.
///
/// Failures are logged at debug level and fall through to the next entry;
/// [`Error::NoBackend`] is returned once the list is exhausted.
pub fn probe(factories: &[CaptureFactory]) -> Result<Box<dyn ScreenCapture>> {
    for (name, factory) in factories {
        match factory() {
            Ok(backend) => {
                log::debug!("using {name} screen capture");
                return Ok(backend);
            }
            Err(err) => log::debug!("{name} screen capture unavailable: {err}"),
        }
    }
    Err(Error::NoBackend)
}

/// The built-in capture backends, most preferred first.
pub fn default_backends() -> Vec<CaptureFactory> {
    #[allow(unused_mut)]
    let mut factories: Vec<CaptureFactory> = Vec::new();

    #[cfg(all(feature = "x11-capture", target_os = "linux"))]
    factories.push(("x11", || {
        X11Capture::open().map(|capture| Box::new(capture) as Box<dyn ScreenCapture>)
    }));

    factories
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticCapture;

    impl ScreenCapture for StaticCapture {
        fn name(&self) -> &'static str {
            "static"
        }

        fn update_screenshot(&mut self) -> Result<()> {
            Ok(())
        }

        fn image(&mut self) -> Result<ScreenImage> {
            Ok(ScreenImage::new(1, 1, vec![0, 0, 0]))
        }
    }

    #[test]
    fn test_probe_returns_first_working_backend() {
        let factories: Vec<CaptureFactory> = vec![
            ("broken", || {
                Err(Error::DisplayUnavailable("not here".into()))
            }),
            ("static", || Ok(Box::new(StaticCapture))),
        ];

        let backend = probe(&factories).unwrap();
        assert_eq!(backend.name(), "static");
    }

    #[test]
    fn test_probe_exhausted_list_is_no_backend() {
        let factories: Vec<CaptureFactory> = vec![
            ("broken", || {
                Err(Error::DisplayUnavailable("not here".into()))
            }),
            ("also-broken", || {
                Err(Error::CaptureFailed("nope".into()))
            }),
        ];

        assert!(matches!(probe(&factories), Err(Error::NoBackend)));
    }

    #[test]
    fn test_probe_empty_list_is_no_backend() {
        assert!(matches!(probe(&[]), Err(Error::NoBackend)));
    }
}
