//! The frame pipeline orchestrator.
//!
//! [`Projector`] ties the pieces together: it resolves and claims the USB
//! device, captures the screen through a [`ScreenCapture`] backend, encodes
//! frames through an [`encode::PictureEncoder`], and streams widget frames
//! plus JPEG payloads to the device. The caller drives the loop by invoking
//! [`run_cycle`](Projector::run_cycle) repeatedly and checking its own stop
//! condition between cycles.

use std::time::Duration;

use crate::capture::{self, ScreenCapture};
use crate::counter::FrameCounter;
use crate::encode::{
    self, EncoderFactory, Geometry, ResizeFilter, DEFAULT_MAX_PICTURE_BYTES,
};
use crate::error::{Error, Result};
use crate::usb::{self, DeviceId, Endpoint, Interface, UsbBus, DEFAULT_TRANSFER_TIMEOUT};
use crate::widget::{Brightness, BrightnessWidget, PictureWidget};

/// USB identity of the Acer C110.
pub const ACER_C110: DeviceId = DeviceId::new(0x1de1, 0xc101);

/// Projector models this crate knows how to drive.
pub const KNOWN_PROJECTORS: &[DeviceId] = &[ACER_C110];

/// Native panel resolution of the C11x series.
pub const DEFAULT_RESOLUTION: Geometry = Geometry::new(800, 480);

/// Where the pipeline writes widget frames and payloads.
///
/// Implemented by bulk-OUT [`Endpoint`]s; tests and custom transports supply
/// their own implementation.
pub trait FrameSink {
    /// Write `data`, returning the number of bytes actually transferred.
    fn write(&mut self, data: &[u8], timeout: Duration) -> usb::Result<usize>;
}

impl FrameSink for Endpoint {
    fn write(&mut self, data: &[u8], timeout: Duration) -> usb::Result<usize> {
        self.bulk_write(data, timeout)
    }
}

/// Session parameters for a [`Projector`].
#[derive(Clone, Debug)]
pub struct ProjectorConfig {
    /// Identity to search for on the bus.
    pub device_id: DeviceId,
    /// Target resolution for encoded frames.
    pub resolution: Geometry,
    /// Resampling kernel used when resizing.
    pub filter: ResizeFilter,
    /// Byte budget for one encoded frame.
    pub max_picture_bytes: usize,
    /// Timeout for each bulk transfer.
    pub transfer_timeout: Duration,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        ProjectorConfig {
            device_id: ACER_C110,
            resolution: DEFAULT_RESOLUTION,
            filter: ResizeFilter::default(),
            max_picture_bytes: DEFAULT_MAX_PICTURE_BYTES,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }
}

/// A known projector attached to the bus.
#[derive(Clone, Debug)]
pub struct ProjectorInfo {
    /// Vendor/product identity.
    pub id: DeviceId,
    /// Bus the device is attached to.
    pub bus_number: u8,
    /// Device address on its bus.
    pub address: u8,
    /// Product string, when the device volunteers one.
    pub product: Option<String>,
}

/// Scan the bus for attached projectors of any known model.
///
/// Purely informational; no interface is claimed.
pub fn list_projectors() -> Result<Vec<ProjectorInfo>> {
    let bus = UsbBus::new()?;
    let infos = bus
        .match_ids(KNOWN_PROJECTORS)
        .into_iter()
        .map(|device| ProjectorInfo {
            id: DeviceId::new(device.vendor_id(), device.product_id()),
            bus_number: device.bus_number(),
            address: device.address(),
            product: device.product_string().ok(),
        })
        .collect();
    Ok(infos)
}

/// A running projector session.
///
/// Owns the claimed interface, the capture and encode backends and the
/// latency counter. The interface is released when the session is dropped.
pub struct Projector {
    sink: Box<dyn FrameSink>,
    capture: Box<dyn ScreenCapture>,
    encoder_factory: EncoderFactory,
    encoder: Option<Box<dyn encode::PictureEncoder>>,
    claimed_interface: Option<Interface>,
    resolution: Geometry,
    filter: ResizeFilter,
    max_picture_bytes: usize,
    transfer_timeout: Duration,
    brightness: Brightness,
    counter: FrameCounter,
}

impl Projector {
    /// Open the default projector (Acer C110) with default settings.
    pub fn open() -> Result<Self> {
        Self::open_with(ProjectorConfig::default())
    }

    /// Open a projector over USB with the given settings.
    ///
    /// Resolves the device identity on the bus, claims its interface and
    /// probes the capture and encode backends. Finding no matching device is
    /// an error; finding more than one logs a warning and picks the first.
    pub fn open_with(config: ProjectorConfig) -> Result<Self> {
        let bus = UsbBus::new()?;
        let matches = bus.match_ids(&[config.device_id]);

        let device = match matches.as_slice() {
            [] => {
                return Err(Error::DeviceNotFound {
                    device_id: config.device_id,
                })
            }
            [device] => *device,
            [device, ..] => {
                log::warn!(
                    "found {} projectors matching {}, using the one at bus {:03} device {:03}",
                    matches.len(),
                    config.device_id,
                    device.bus_number(),
                    device.address()
                );
                *device
            }
        };
        log::debug!("opening projector {device}");

        let configuration = device
            .configurations()
            .first()
            .ok_or(Error::UnsupportedDevice("device has no configurations"))?;
        let interface = configuration
            .interfaces()
            .first()
            .ok_or(Error::UnsupportedDevice("configuration has no interfaces"))?;
        interface.claim()?;
        let claimed = interface.clone();

        let alt_setting = interface
            .alt_settings()
            .first()
            .ok_or(Error::UnsupportedDevice("interface has no alt settings"))?;
        // The C110 accepts frames on the second declared endpoint only; the
        // first one is never used for picture upload.
        let endpoint = alt_setting
            .endpoints()
            .get(1)
            .cloned()
            .ok_or(Error::UnsupportedDevice(
                "first alt setting declares fewer than two endpoints",
            ))?;

        let capture = capture::probe(&capture::default_backends())?;
        let encoder_factory =
            encode::default_encoder_factory().ok_or(Error::Encode(encode::Error::NoBackend))?;

        let mut projector = Self::with_transport(
            Box::new(endpoint),
            capture,
            encoder_factory,
            config,
        );
        projector.claimed_interface = Some(claimed);
        Ok(projector)
    }

    /// Assemble a session from explicit parts.
    ///
    /// This is the seam for tests and for transports other than a claimed
    /// USB endpoint; no device discovery is performed.
    pub fn with_transport(
        sink: Box<dyn FrameSink>,
        capture: Box<dyn ScreenCapture>,
        encoder_factory: EncoderFactory,
        config: ProjectorConfig,
    ) -> Self {
        Projector {
            sink,
            capture,
            encoder_factory,
            encoder: None,
            claimed_interface: None,
            resolution: config.resolution,
            filter: config.filter,
            max_picture_bytes: config.max_picture_bytes,
            transfer_timeout: config.transfer_timeout,
            brightness: Brightness::default(),
            counter: FrameCounter::default(),
        }
    }

    /// Capture, encode and transmit one frame.
    ///
    /// Writes the 24-byte picture widget followed by the JPEG payload and
    /// updates the latency counter. Transfer problems surface as typed
    /// errors ([`Error::ShortWrite`], [`usb::Error::Transfer`]); nothing is
    /// retried here.
    pub fn run_cycle(&mut self) -> Result<()> {
        self.capture.update_screenshot()?;
        let image = self.capture.image()?;

        // The encoder is constructed on the first cycle, bound to the
        // session geometry and budget; afterwards it is fed each new frame.
        // A failed cycle drops it and the next cycle starts fresh.
        let encoder = match self.encoder.take() {
            Some(mut encoder) => {
                encoder.update_image(&image)?;
                encoder
            }
            None => (self.encoder_factory)(
                &image,
                self.resolution,
                self.filter,
                self.max_picture_bytes,
            )?,
        };

        let header = PictureWidget::new(encoder.encoded_len())?;
        self.write_exact(header.as_bytes())?;
        self.write_exact(encoder.encoded_bytes())?;

        self.encoder = Some(encoder);
        self.counter.update();
        Ok(())
    }

    /// Switch the lamp to the given brightness level.
    pub fn set_brightness(&mut self, level: Brightness) -> Result<()> {
        let widget = BrightnessWidget::new(level);
        self.write_exact(widget.as_bytes())?;
        self.brightness = level;
        Ok(())
    }

    /// The most recently transmitted brightness level.
    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// Change the resampling kernel for subsequent frames.
    pub fn set_resize_filter(&mut self, filter: ResizeFilter) {
        self.filter = filter;
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.set_filter(filter);
        }
    }

    /// Average duration between recent cycles, `None` before the first one.
    pub fn average_frame_duration(&self) -> Option<Duration> {
        self.counter.average_frame_duration()
    }

    fn write_exact(&mut self, data: &[u8]) -> Result<()> {
        let written = self.sink.write(data, self.transfer_timeout)?;
        if written != data.len() {
            return Err(Error::ShortWrite {
                expected: data.len(),
                written,
            });
        }
        Ok(())
    }
}

impl Drop for Projector {
    fn drop(&mut self) {
        // Best effort; the device may already be gone.
        if let Some(interface) = self.claimed_interface.take() {
            if let Err(err) = interface.release() {
                log::debug!("could not release interface on shutdown: {err}");
            }
        }
    }
}
