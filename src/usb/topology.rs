//! Owned model of the USB device hierarchy.
//!
//! A [`Device`] owns its [`Configuration`]s, which own their [`Interface`]s,
//! which own their [`AltSetting`]s, which own their [`Endpoint`]s. All
//! descriptor data is copied out of the device when the tree is built and is
//! immutable afterwards; runtime operations (claim, release, bulk transfer)
//! change device and kernel state, never the model.
//!
//! Child collections are exposed as slices, so every caller gets its own
//! independent iterator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rusb::{Context, DeviceHandle};

use crate::usb::error::{Error, Result};
use crate::usb::DEFAULT_TRANSFER_TIMEOUT;

pub use rusb::{Direction, TransferType};

/// A single device attached to the bus.
///
/// Building a `Device` opens a handle to the hardware; the handle is shared
/// with every node below it and closed when the last node is dropped.
pub struct Device {
    handle: Arc<DeviceHandle<Context>>,
    descriptor: rusb::DeviceDescriptor,
    bus_number: u8,
    address: u8,
    configurations: Vec<Configuration>,
}

impl Device {
    /// Open a device and read its full descriptor tree.
    pub(crate) fn discover(device: rusb::Device<Context>) -> Result<Self> {
        let descriptor = device.device_descriptor().map_err(Error::Descriptor)?;
        let handle = Arc::new(device.open().map_err(Error::OpenDevice)?);

        let mut configurations = Vec::with_capacity(descriptor.num_configurations() as usize);
        for index in 0..descriptor.num_configurations() {
            let config = device.config_descriptor(index).map_err(Error::Descriptor)?;
            configurations.push(Configuration::read(&config, &handle));
        }

        Ok(Device {
            bus_number: device.bus_number(),
            address: device.address(),
            handle,
            descriptor,
            configurations,
        })
    }

    /// The vendor identification number, as provided by the device.
    pub fn vendor_id(&self) -> u16 {
        self.descriptor.vendor_id()
    }

    /// The product identification number, as provided by the device.
    pub fn product_id(&self) -> u16 {
        self.descriptor.product_id()
    }

    /// The device revision, nominally binary coded decimal.
    pub fn device_version(&self) -> rusb::Version {
        self.descriptor.device_version()
    }

    /// The device class code.
    ///
    /// Zero means the class is specified per interface; 0xFF marks a
    /// vendor-specific protocol.
    pub fn class_code(&self) -> u8 {
        self.descriptor.class_code()
    }

    /// The device subclass code.
    pub fn sub_class_code(&self) -> u8 {
        self.descriptor.sub_class_code()
    }

    /// The device protocol code.
    pub fn protocol_code(&self) -> u8 {
        self.descriptor.protocol_code()
    }

    /// Number of configurations this device exposes.
    pub fn num_configurations(&self) -> u8 {
        self.descriptor.num_configurations()
    }

    /// The bus the device is attached to.
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    /// The device address on its bus.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The configurations of this device, in declaration order.
    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Read the product string descriptor, in the device's first language.
    pub fn product_string(&self) -> Result<String> {
        let languages = self
            .handle
            .read_languages(DEFAULT_TRANSFER_TIMEOUT)
            .map_err(Error::Descriptor)?;
        let language = languages
            .first()
            .copied()
            .ok_or(Error::Descriptor(rusb::Error::NotFound))?;
        self.handle
            .read_product_string(language, &self.descriptor, DEFAULT_TRANSFER_TIMEOUT)
            .map_err(Error::Descriptor)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} (bus {:03} device {:03}, class {:02x}h)",
            self.vendor_id(),
            self.product_id(),
            self.bus_number,
            self.address,
            self.class_code()
        )
    }
}

/// One configuration of a [`Device`].
pub struct Configuration {
    value: u8,
    max_power_ma: u16,
    self_powered: bool,
    remote_wakeup: bool,
    interfaces: Vec<Interface>,
}

impl Configuration {
    fn read(descriptor: &rusb::ConfigDescriptor, handle: &Arc<DeviceHandle<Context>>) -> Self {
        let interfaces = descriptor
            .interfaces()
            .map(|interface| Interface::read(&interface, handle))
            .collect();

        Configuration {
            value: descriptor.number(),
            max_power_ma: descriptor.max_power(),
            self_powered: descriptor.self_powered(),
            remote_wakeup: descriptor.remote_wakeup(),
            interfaces,
        }
    }

    /// The configuration value used to select this configuration.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Maximum bus power draw in milliamperes.
    pub fn max_power_ma(&self) -> u16 {
        self.max_power_ma
    }

    /// Whether the device is self-powered in this configuration.
    pub fn self_powered(&self) -> bool {
        self.self_powered
    }

    /// Whether remote wakeup is supported in this configuration.
    pub fn remote_wakeup(&self) -> bool {
        self.remote_wakeup
    }

    /// Number of interfaces in this configuration.
    pub fn num_interfaces(&self) -> usize {
        self.interfaces.len()
    }

    /// The interfaces of this configuration, in declaration order.
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration {} ({} interfaces, {} mA{})",
            self.value,
            self.interfaces.len(),
            self.max_power_ma,
            if self.self_powered {
                ", self-powered"
            } else {
                ""
            }
        )
    }
}

/// One interface of a [`Configuration`].
///
/// An interface must be claimed before any transfer is issued on endpoints
/// below it, and released once the session is over.
#[derive(Clone)]
pub struct Interface {
    handle: Arc<DeviceHandle<Context>>,
    number: u8,
    alt_settings: Vec<AltSetting>,
}

impl Interface {
    fn read(interface: &rusb::Interface<'_>, handle: &Arc<DeviceHandle<Context>>) -> Self {
        let alt_settings = interface
            .descriptors()
            .map(|descriptor| AltSetting::read(&descriptor, handle))
            .collect();

        Interface {
            handle: Arc::clone(handle),
            number: interface.number(),
            alt_settings,
        }
    }

    /// The interface number within its configuration.
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Number of alternate settings this interface has.
    pub fn num_alt_settings(&self) -> usize {
        self.alt_settings.len()
    }

    /// The alternate settings of this interface, in declaration order.
    pub fn alt_settings(&self) -> &[AltSetting] {
        &self.alt_settings
    }

    /// Claim this interface.
    ///
    /// Required before performing transfers on any endpoint under it. Fails
    /// if another driver or process currently owns the interface.
    pub fn claim(&self) -> Result<()> {
        self.handle
            .claim_interface(self.number)
            .map_err(|source| Error::Claim {
                interface: self.number,
                source,
            })
    }

    /// Release this interface.
    ///
    /// Must not be called while a transfer is pending.
    pub fn release(&self) -> Result<()> {
        self.handle
            .release_interface(self.number)
            .map_err(|source| Error::Release {
                interface: self.number,
                source,
            })
    }

    /// Activate one of the interface's alternate settings.
    pub fn set_alt_setting(&self, setting: u8) -> Result<()> {
        self.handle
            .set_alternate_setting(self.number, setting)
            .map_err(|source| Error::AltSetting {
                interface: self.number,
                setting,
                source,
            })
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interface {} ({} alt settings)",
            self.number,
            self.alt_settings.len()
        )
    }
}

/// One alternate setting of an [`Interface`].
#[derive(Clone)]
pub struct AltSetting {
    setting: u8,
    class_code: u8,
    sub_class_code: u8,
    protocol_code: u8,
    endpoints: Vec<Endpoint>,
}

impl AltSetting {
    fn read(descriptor: &rusb::InterfaceDescriptor<'_>, handle: &Arc<DeviceHandle<Context>>) -> Self {
        let endpoints = descriptor
            .endpoint_descriptors()
            .map(|endpoint| Endpoint::read(&endpoint, handle))
            .collect();

        AltSetting {
            setting: descriptor.setting_number(),
            class_code: descriptor.class_code(),
            sub_class_code: descriptor.sub_class_code(),
            protocol_code: descriptor.protocol_code(),
            endpoints,
        }
    }

    /// The alternate setting number.
    pub fn setting_number(&self) -> u8 {
        self.setting
    }

    /// The interface class code of this setting.
    pub fn class_code(&self) -> u8 {
        self.class_code
    }

    /// The interface subclass code of this setting.
    pub fn sub_class_code(&self) -> u8 {
        self.sub_class_code
    }

    /// The interface protocol code of this setting.
    pub fn protocol_code(&self) -> u8 {
        self.protocol_code
    }

    /// Number of endpoints declared by this setting.
    pub fn num_endpoints(&self) -> usize {
        self.endpoints.len()
    }

    /// The endpoints of this setting, in declaration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

impl fmt::Display for AltSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alt setting {} (class {:02x}h, {} endpoints)",
            self.setting,
            self.class_code,
            self.endpoints.len()
        )
    }
}

/// A device endpoint, the leaf of the topology and the place where bulk
/// transfers happen.
///
/// Transfers are only valid while the owning interface is claimed; issuing a
/// transfer on an unclaimed interface is an error reported by the host
/// controller.
#[derive(Clone)]
pub struct Endpoint {
    handle: Arc<DeviceHandle<Context>>,
    address: u8,
    direction: Direction,
    transfer_type: TransferType,
    max_packet_size: u16,
    interval: u8,
}

impl Endpoint {
    fn read(descriptor: &rusb::EndpointDescriptor<'_>, handle: &Arc<DeviceHandle<Context>>) -> Self {
        Endpoint {
            handle: Arc::clone(handle),
            address: descriptor.address(),
            direction: descriptor.direction(),
            transfer_type: descriptor.transfer_type(),
            max_packet_size: descriptor.max_packet_size(),
            interval: descriptor.interval(),
        }
    }

    /// The endpoint address, including the direction bit.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The transfer direction of this endpoint.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The transfer type of this endpoint.
    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    /// Maximum packet size in bytes.
    pub fn max_packet_size(&self) -> u16 {
        self.max_packet_size
    }

    /// Polling interval, in frames (interrupt and isochronous endpoints).
    pub fn interval(&self) -> u8 {
        self.interval
    }

    /// Perform a blocking bulk write on this endpoint.
    ///
    /// Returns the number of bytes actually transferred, which the caller
    /// must compare against the requested length: partial writes are not
    /// retried at this layer. The endpoint must be an OUT endpoint and its
    /// interface must be claimed.
    pub fn bulk_write(&self, data: &[u8], timeout: Duration) -> Result<usize> {
        self.handle
            .write_bulk(self.address, data, timeout)
            .map_err(|source| Error::Transfer {
                endpoint: self.address,
                source,
            })
    }

    /// Perform a blocking bulk read of at most `max_length` bytes.
    ///
    /// The endpoint must be an IN endpoint and its interface must be claimed.
    pub fn bulk_read(&self, max_length: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; max_length];
        let received = self
            .handle
            .read_bulk(self.address, &mut buffer, timeout)
            .map_err(|source| Error::Transfer {
                endpoint: self.address,
                source,
            })?;
        buffer.truncate(received);
        Ok(buffer)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "endpoint {:#04x} ({:?} {:?}, max packet {})",
            self.address, self.direction, self.transfer_type, self.max_packet_size
        )
    }
}
