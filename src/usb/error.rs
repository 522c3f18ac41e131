//! Error types for USB topology and transfer operations.

use thiserror::Error;

/// Errors that can occur while enumerating or talking to USB devices.
#[derive(Error, Debug)]
pub enum Error {
    /// The USB host controller could not be initialised.
    #[error("could not initialise USB host controller: {0}")]
    HostController(#[source] rusb::Error),

    /// The host controller could not be queried for attached devices.
    #[error("could not enumerate USB devices: {0}")]
    Enumerate(#[source] rusb::Error),

    /// A device could not be opened.
    #[error("could not open USB device: {0}")]
    OpenDevice(#[source] rusb::Error),

    /// A descriptor or descriptor string could not be read.
    #[error("could not read USB descriptor: {0}")]
    Descriptor(#[source] rusb::Error),

    /// An interface could not be claimed.
    #[error("could not claim interface {interface}: {source}")]
    Claim {
        interface: u8,
        #[source]
        source: rusb::Error,
    },

    /// An interface could not be released.
    #[error("could not release interface {interface}: {source}")]
    Release {
        interface: u8,
        #[source]
        source: rusb::Error,
    },

    /// An alternate setting could not be activated.
    #[error("could not select alt setting {setting} on interface {interface}: {source}")]
    AltSetting {
        interface: u8,
        setting: u8,
        #[source]
        source: rusb::Error,
    },

    /// A bulk transfer failed or timed out.
    #[error("bulk transfer on endpoint {endpoint:#04x} failed: {source}")]
    Transfer {
        endpoint: u8,
        #[source]
        source: rusb::Error,
    },
}

/// Result type alias for USB operations.
pub type Result<T> = std::result::Result<T, Error>;
