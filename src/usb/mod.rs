//! Access to Universal Serial Bus devices.
//!
//! [`UsbBus`] enumerates every device attached to the host controller into an
//! owned descriptor tree ([`Device`] → [`Configuration`] → [`Interface`] →
//! [`AltSetting`] → [`Endpoint`]) and matches devices against vendor/product
//! identities. The tree is stable until [`UsbBus::rescan`] discards and
//! rebuilds it.

mod error;
mod topology;

pub use error::{Error, Result};
pub use topology::{AltSetting, Configuration, Device, Direction, Endpoint, Interface, TransferType};

use std::fmt;
use std::time::Duration;

use rusb::UsbContext;

/// Default timeout for bulk transfers and descriptor reads.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(100);

/// A vendor/product identification pair, used to match devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId {
    vendor_id: u16,
    product_id: u16,
}

impl DeviceId {
    /// Create an identity from a vendor and product number.
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        DeviceId {
            vendor_id,
            product_id,
        }
    }

    /// The 16 bit vendor number.
    pub const fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// The 16 bit product number.
    pub const fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Whether this identity matches the given vendor/product pair.
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Whether any identity in `ids` matches the given vendor/product pair.
fn id_matches(ids: &[DeviceId], vendor_id: u16, product_id: u16) -> bool {
    ids.iter().any(|id| id.matches(vendor_id, product_id))
}

/// All devices currently attached to the host controller.
///
/// Devices that cannot be opened or whose descriptors cannot be read (hubs
/// without permission, devices detached mid-scan) are skipped with a debug
/// log rather than aborting the scan.
pub struct UsbBus {
    context: rusb::Context,
    devices: Vec<Device>,
}

impl UsbBus {
    /// Initialise the host controller and perform an initial scan.
    pub fn new() -> Result<Self> {
        let context = rusb::Context::new().map_err(Error::HostController)?;
        let mut bus = UsbBus {
            context,
            devices: Vec::new(),
        };
        bus.rescan()?;
        Ok(bus)
    }

    /// Discard the current tree and rebuild it from the bus.
    ///
    /// There is no portable hotplug notification for this protocol family,
    /// so callers that care about attach/detach have to rescan themselves.
    pub fn rescan(&mut self) -> Result<()> {
        let list = self.context.devices().map_err(Error::Enumerate)?;

        self.devices.clear();
        for device in list.iter() {
            match Device::discover(device) {
                Ok(device) => self.devices.push(device),
                Err(err) => log::debug!("skipping USB device during scan: {err}"),
            }
        }
        Ok(())
    }

    /// The enumerated devices, in bus order.
    ///
    /// The order is stable for the lifetime of the process unless
    /// [`rescan`](Self::rescan) is called.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Every enumerated device whose (vendor, product) pair appears in `ids`.
    ///
    /// Enumeration order is preserved. An empty identity set or an empty bus
    /// yields an empty list, not an error.
    pub fn match_ids(&self, ids: &[DeviceId]) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|device| id_matches(ids, device.vendor_id(), device.product_id()))
            .collect()
    }

    /// Every enumerated device with the given device class code.
    pub fn match_class(&self, class_code: u8) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|device| device.class_code() == class_code)
            .collect()
    }
}
