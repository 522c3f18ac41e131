//! The projector's widget frame protocol.
//!
//! Everything sent to the device that is not JPEG payload is a "widget": a
//! fixed 24-byte control block. A picture widget announces the byte length of
//! the JPEG payload that follows it; a brightness widget stands alone and
//! switches the lamp level. The byte layouts are a hardware contract and must
//! be reproduced exactly.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Size of every widget frame in bytes.
pub const WIDGET_SIZE: usize = 24;

/// Largest payload length representable in the picture widget's 24-bit
/// little-endian size field.
pub const MAX_PICTURE_SIZE: usize = 0xFF_FFFF;

/// Template for picture widgets. Bytes 20..23 carry the payload size.
const PICTURE_TEMPLATE: [u8; WIDGET_SIZE] = [
    0x02, 0x00, 0x00, 0x00, 0x00, 0x10, 0x3e, 0x10, 0x01, 0x00, 0x00, 0x00, 0x20, 0x03, 0x00,
    0x00, 0xe0, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Template for brightness widgets. Bytes 12 and 16 carry the level; the
/// meaning of the remaining bytes is not documented by the vendor.
const BRIGHTNESS_TEMPLATE: [u8; WIDGET_SIZE] = [
    0x04, 0x00, 0x00, 0x00, 0x00, 0x0c, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Errors that can occur while building widget frames.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The payload length does not fit the 24-bit size field.
    #[error("picture size {0} exceeds the 24-bit length field")]
    PictureTooLarge(usize),
}

/// Result type alias for widget construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Widget frame announcing a JPEG payload of a given byte length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PictureWidget {
    data: [u8; WIDGET_SIZE],
}

impl PictureWidget {
    /// Build a picture widget for a payload of `picture_size` bytes.
    pub fn new(picture_size: usize) -> Result<Self> {
        let mut widget = PictureWidget {
            data: PICTURE_TEMPLATE,
        };
        widget.set_picture_size(picture_size)?;
        Ok(widget)
    }

    /// Encode `picture_size` into the 24-bit little-endian size field.
    ///
    /// Sizes above [`MAX_PICTURE_SIZE`] are rejected; the field cannot
    /// represent them.
    pub fn set_picture_size(&mut self, picture_size: usize) -> Result<()> {
        if picture_size > MAX_PICTURE_SIZE {
            return Err(Error::PictureTooLarge(picture_size));
        }
        self.data[20] = (picture_size & 0xff) as u8;
        self.data[21] = ((picture_size >> 8) & 0xff) as u8;
        self.data[22] = ((picture_size >> 16) & 0xff) as u8;
        Ok(())
    }

    /// The wire representation of this widget.
    pub fn as_bytes(&self) -> &[u8; WIDGET_SIZE] {
        &self.data
    }
}

/// Brightness levels supported by the lamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Brightness {
    /// Full lamp power. This is what an untouched brightness widget encodes.
    #[default]
    Maximum,
    High,
    Medium,
    Low,
}

impl Brightness {
    /// The values of widget bytes 12 and 16 for this level.
    fn level_bytes(self) -> (u8, u8) {
        match self {
            Brightness::Maximum => (0, 0),
            Brightness::High => (1, 1),
            Brightness::Medium => (1, 0),
            Brightness::Low => (0, 1),
        }
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Brightness::Maximum => "maximum",
            Brightness::High => "high",
            Brightness::Medium => "medium",
            Brightness::Low => "low",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown brightness name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid brightness value {0:?} (expected maximum, high, medium or low)")]
pub struct ParseBrightnessError(String);

impl FromStr for Brightness {
    type Err = ParseBrightnessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "maximum" => Ok(Brightness::Maximum),
            "high" => Ok(Brightness::High),
            "medium" => Ok(Brightness::Medium),
            "low" => Ok(Brightness::Low),
            other => Err(ParseBrightnessError(other.to_string())),
        }
    }
}

/// Widget frame switching the lamp to a [`Brightness`] level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrightnessWidget {
    data: [u8; WIDGET_SIZE],
}

impl BrightnessWidget {
    /// Build a brightness widget for the given level.
    pub fn new(brightness: Brightness) -> Self {
        let mut widget = BrightnessWidget {
            data: BRIGHTNESS_TEMPLATE,
        };
        widget.set_brightness(brightness);
        widget
    }

    /// Encode a level into bytes 12 and 16.
    ///
    /// Pure function of the level: repeated calls with the same level produce
    /// byte-identical frames.
    pub fn set_brightness(&mut self, brightness: Brightness) {
        let (b12, b16) = brightness.level_bytes();
        self.data[12] = b12;
        self.data[16] = b16;
    }

    /// The wire representation of this widget.
    pub fn as_bytes(&self) -> &[u8; WIDGET_SIZE] {
        &self.data
    }
}
