//! The address-mapped bus: a registry of [`Device`]s keyed by the absolute
//! word address each occupies.

use crate::device::Device;
use std::collections::HashMap;

/// Routes word reads/writes to whichever registered [`Device`] owns the
/// address. A single device may be registered at more than one address
/// range (aliasing), but two devices may never claim the same address.
#[derive(Default)]
pub struct Bus {
    devices: Vec<Box<dyn Device>>,
    addr_map: HashMap<u16, usize>,
}

impl Bus {
    /// An empty bus with no devices registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `device` at `base`, claiming `[base, base + device.size())`.
    /// Panics if any address in that span is already claimed — two devices
    /// overlapping is a wiring bug, not a recoverable runtime condition.
    pub fn register(&mut self, base: u16, mut device: Box<dyn Device>) {
        device.set_base(base);
        let size = device.size();
        let index = self.devices.len();
        for addr in u32::from(base)..u32::from(base) + u32::from(size) {
            let addr = addr as u16;
            let prev = self.addr_map.insert(addr, index);
            assert!(prev.is_none(), "bus address 0x{addr:04x} claimed twice");
        }
        log::debug!("registered device at base 0x{base:04x}, size {size}");
        self.devices.push(device);
    }

    /// Read the word at `addr`. Panics if no device is registered there —
    /// per spec, accessing unmapped memory is a fatal invariant violation,
    /// not a recoverable error.
    pub fn read(&mut self, addr: u16) -> u16 {
        let index = *self
            .addr_map
            .get(&addr)
            .unwrap_or_else(|| panic!("read from unmapped address 0x{addr:04x}"));
        self.devices[index].read(addr)
    }

    /// Write `data` to `addr`. Panics if no device is registered there.
    pub fn write(&mut self, addr: u16, data: u16) {
        let index = *self
            .addr_map
            .get(&addr)
            .unwrap_or_else(|| panic!("write to unmapped address 0x{addr:04x}"));
        self.devices[index].write(addr, data);
    }

    /// The device registered at `addr`, for tests that need to inspect a
    /// specific device's internal state after simulation.
    #[must_use]
    pub fn device_at(&self, addr: u16) -> Option<&dyn Device> {
        self.addr_map.get(&addr).map(|&i| self.devices[i].as_ref())
    }

    /// Mutable counterpart to [`Bus::device_at`].
    pub fn device_at_mut(&mut self, addr: u16) -> Option<&mut dyn Device> {
        let index = *self.addr_map.get(&addr)?;
        Some(self.devices[index].as_mut())
    }
}
