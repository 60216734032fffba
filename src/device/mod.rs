//! Typed handles for each device family.
//!
//! A handle borrows the [`Session`] mutably for as long as it lives, so operations on different
//! devices can never interleave on the bus.

pub mod eeprom;
pub mod hts221;
pub mod isl29023;
pub mod mma8652;
pub mod mpl3115a2;

use crate::bus::Bus;
use crate::register::DeviceFamily;
use crate::session::{Device, Session};
use embedded_hal::i2c::SevenBitAddress;
use embedded_hal_async::delay::DelayNs;

pub use eeprom::Eeprom;
pub use hts221::Hts221;
pub use isl29023::Isl29023;
pub use mma8652::Mma8652;
pub use mpl3115a2::Mpl3115a2;

impl<B, D> Session<B, D>
where
    B: Bus,
    D: DelayNs,
{
    /// HTS221 at its default address.
    pub fn hts221(&mut self) -> Hts221<'_, B, D> {
        self.hts221_at(DeviceFamily::Hts221.default_address())
    }

    pub fn hts221_at(&mut self, address: SevenBitAddress) -> Hts221<'_, B, D> {
        Hts221::new(self, Device::at(DeviceFamily::Hts221, address))
    }

    /// ISL29023 at its default address.
    pub fn isl29023(&mut self) -> Isl29023<'_, B, D> {
        self.isl29023_at(DeviceFamily::Isl29023.default_address())
    }

    pub fn isl29023_at(&mut self, address: SevenBitAddress) -> Isl29023<'_, B, D> {
        Isl29023::new(self, Device::at(DeviceFamily::Isl29023, address))
    }

    /// MMA8652FC at its default address.
    pub fn mma8652(&mut self) -> Mma8652<'_, B, D> {
        self.mma8652_at(DeviceFamily::Mma8652.default_address())
    }

    pub fn mma8652_at(&mut self, address: SevenBitAddress) -> Mma8652<'_, B, D> {
        Mma8652::new(self, Device::at(DeviceFamily::Mma8652, address))
    }

    /// MPL3115A2 at its default address.
    pub fn mpl3115a2(&mut self) -> Mpl3115a2<'_, B, D> {
        self.mpl3115a2_at(DeviceFamily::Mpl3115a2.default_address())
    }

    pub fn mpl3115a2_at(&mut self, address: SevenBitAddress) -> Mpl3115a2<'_, B, D> {
        Mpl3115a2::new(self, Device::at(DeviceFamily::Mpl3115a2, address))
    }

    /// ID EEPROM at its default address.
    pub fn eeprom(&mut self) -> Eeprom<'_, B, D> {
        self.eeprom_at(DeviceFamily::Eeprom.default_address())
    }

    pub fn eeprom_at(&mut self, address: SevenBitAddress) -> Eeprom<'_, B, D> {
        Eeprom::new(self, Device::at(DeviceFamily::Eeprom, address))
    }
}
