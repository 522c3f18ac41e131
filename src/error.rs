//! Crate-level error type.

use thiserror::Error;

use crate::usb::DeviceId;
use crate::{capture, encode, usb, widget};

/// Any error a projector session can produce.
#[derive(Error, Debug)]
pub enum Error {
    /// No attached device matched the requested identity.
    #[error("no projector matching {device_id} is attached")]
    DeviceNotFound { device_id: DeviceId },

    /// The matched device does not expose the expected descriptor layout.
    #[error("unsupported device layout: {0}")]
    UnsupportedDevice(&'static str),

    /// A bulk write transferred fewer bytes than requested.
    #[error("short bulk write: sent {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// USB controller, claim or transfer failure.
    #[error(transparent)]
    Usb(#[from] usb::Error),

    /// Widget frame construction failure.
    #[error(transparent)]
    Widget(#[from] widget::Error),

    /// Screen capture failure.
    #[error("screen capture failed: {0}")]
    Capture(#[from] capture::Error),

    /// Picture encoding failure.
    #[error("picture encoding failed: {0}")]
    Encode(#[from] encode::Error),
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;
