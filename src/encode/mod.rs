//! Picture encoders.
//!
//! A [`PictureEncoder`] turns a captured [`ScreenImage`] into the JPEG bytes
//! the projector displays, resizing to a target [`Geometry`] and staying
//! under a caller-supplied byte budget. The pipeline constructs its encoder
//! lazily, bound to the first captured image, so backends are supplied as
//! [`EncoderFactory`] functions.

#[cfg(feature = "jpeg-encode")]
pub mod jpeg;

#[cfg(feature = "jpeg-encode")]
pub use jpeg::JpegPictureEncoder;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::capture::ScreenImage;

/// Default byte budget for an encoded picture.
///
/// The device stalls on payloads much larger than this.
pub const DEFAULT_MAX_PICTURE_BYTES: usize = 240_000;

/// Errors that can occur while encoding pictures.
#[derive(Error, Debug)]
pub enum Error {
    /// The encoder could not get the picture under its byte budget.
    #[error("encoded picture is {size} bytes, over the {budget} byte budget")]
    TooLarge { size: usize, budget: usize },

    /// The captured image does not describe a valid pixel buffer.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    /// No encoder backend is compiled in.
    #[error("no picture encoder available (enable the jpeg-encode feature)")]
    NoBackend,

    /// The underlying image library failed.
    #[cfg(feature = "jpeg-encode")]
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for encoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A target resolution, either side optionally left open.
///
/// An open side is derived from the source aspect ratio when fitting; with
/// both sides given the source is scaled to fit inside the box, aspect
/// preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Geometry {
    /// A geometry with both sides fixed.
    pub const fn new(width: u32, height: u32) -> Self {
        Geometry {
            width: Some(width),
            height: Some(height),
        }
    }

    /// The size a `source_width` × `source_height` image scales to.
    ///
    /// Aspect ratio is always preserved; open sides follow the fixed one.
    /// Never returns a zero dimension.
    pub fn fit(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        if source_width == 0 || source_height == 0 {
            return (source_width.max(1), source_height.max(1));
        }

        let scale = match (self.width, self.height) {
            (None, None) => return (source_width, source_height),
            (Some(width), None) => width as f64 / source_width as f64,
            (None, Some(height)) => height as f64 / source_height as f64,
            (Some(width), Some(height)) => {
                let horizontal = width as f64 / source_width as f64;
                let vertical = height as f64 / source_height as f64;
                horizontal.min(vertical)
            }
        };

        let width = (source_width as f64 * scale).round() as u32;
        let height = (source_height as f64 * scale).round() as u32;
        (width.max(1), height.max(1))
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(width) = self.width {
            write!(f, "{width}")?;
        }
        write!(f, "x")?;
        if let Some(height) = self.height {
            write!(f, "{height}")?;
        }
        Ok(())
    }
}

/// Error returned when parsing a malformed geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid resolution value {0:?} (expected WxH, Wx or xH)")]
pub struct ParseGeometryError(String);

impl FromStr for Geometry {
    type Err = ParseGeometryError;

    /// Accepts `800x480`, `800x` (width only) and `x480` (height only).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ParseGeometryError(s.to_string());

        let (left, right) = s
            .split_once(&['x', 'X'][..])
            .ok_or_else(invalid)?;

        let parse_side = |side: &str| -> std::result::Result<Option<u32>, ParseGeometryError> {
            if side.is_empty() {
                return Ok(None);
            }
            match side.parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(value) => Ok(Some(value)),
            }
        };

        let width = parse_side(left)?;
        let height = parse_side(right)?;
        if width.is_none() && height.is_none() {
            return Err(invalid());
        }

        Ok(Geometry { width, height })
    }
}

/// Resampling kernel used when resizing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    /// Bilinear resampling, a cheap default that looks fine at projector
    /// resolutions.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos,
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmullrom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos => "lanczos",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown filter name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid resize filter {0:?} (expected nearest, triangle, catmullrom, gaussian or lanczos)")]
pub struct ParseFilterError(String);

impl FromStr for ResizeFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" => Ok(ResizeFilter::Triangle),
            "catmullrom" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos" => Ok(ResizeFilter::Lanczos),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}

/// Contract for picture encoders.
///
/// An encoder is bound to a target geometry and byte budget at construction
/// and re-encodes every time it is fed a new image. Its output must never
/// exceed the budget; when that cannot be met it reports
/// [`Error::TooLarge`].
pub trait PictureEncoder {
    /// Replace the source image and re-encode.
    fn update_image(&mut self, image: &ScreenImage) -> Result<()>;

    /// Byte length of the current encoding.
    fn encoded_len(&self) -> usize;

    /// The current encoding.
    fn encoded_bytes(&self) -> &[u8];

    /// Change the resampling kernel for subsequent encodes.
    fn set_filter(&mut self, filter: ResizeFilter);
}

/// Constructor for a [`PictureEncoder`] bound to an initial image, a target
/// geometry, a resampling kernel and a byte budget.
pub type EncoderFactory =
    Box<dyn Fn(&ScreenImage, Geometry, ResizeFilter, usize) -> Result<Box<dyn PictureEncoder>>>;

/// The built-in encoder factory, if one is compiled in.
pub fn default_encoder_factory() -> Option<EncoderFactory> {
    #[cfg(feature = "jpeg-encode")]
    {
        Some(Box::new(|image, geometry, filter, max_bytes| {
            JpegPictureEncoder::new(image, geometry, filter, max_bytes)
                .map(|encoder| Box::new(encoder) as Box<dyn PictureEncoder>)
        }))
    }
    #[cfg(not(feature = "jpeg-encode"))]
    {
        None
    }
}
