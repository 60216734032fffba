//! Register maps of the supported device families.
//!
//! Each family is described once as static data: its fields with their decode tables, the
//! who-am-I pair, how the mode is controlled and observed, and whether configuration writes are
//! restricted to Standby. Typed enums live next to each map for callers who prefer them over
//! field names.

pub mod eeprom;
pub mod hts221;
pub mod isl29023;
pub mod mma8652;
pub mod mpl3115a2;

use crate::field::BitField;
use crate::session::Mode;
use embedded_hal::i2c::SevenBitAddress;

/// Raw value with no corresponding typed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnexpectedValue(pub u8);

/// A decoded field value that has no entry in the field's decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownFieldValue {
    pub register: u8,
    pub bit_offset: u8,
    pub raw: u8,
}

/// Symbolic name of one raw field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub raw: u8,
    pub name: &'static str,
}

impl Variant {
    pub const fn new(raw: u8, name: &'static str) -> Self {
        Self { raw, name }
    }
}

/// How a field reacts to writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadWrite,
    /// Status, identification and event source bits.
    ReadOnly,
    /// Command bits the device clears once the command completes.
    SelfClearing,
}

/// A named field of a register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field: BitField,
    pub table: Option<&'static [Variant]>,
    /// Configuration field. On families that require it, only writable in Standby.
    pub is_config: bool,
    pub access: Access,
}

impl FieldDef {
    pub const fn new(name: &'static str, field: BitField) -> Self {
        Self {
            name,
            field,
            table: None,
            is_config: false,
            access: Access::ReadWrite,
        }
    }

    pub const fn read_only(self) -> Self {
        Self {
            access: Access::ReadOnly,
            ..self
        }
    }

    pub const fn self_clearing(self) -> Self {
        Self {
            access: Access::SelfClearing,
            ..self
        }
    }

    pub const fn with_table(self, table: &'static [Variant]) -> Self {
        Self {
            table: Some(table),
            ..self
        }
    }

    pub const fn config(self) -> Self {
        Self {
            is_config: true,
            ..self
        }
    }

    pub fn register(&self) -> u8 {
        self.field.register
    }

    /// Maps a raw field value to its symbolic name.
    ///
    /// Fields without a decode table yield `Ok(None)`, the raw value is the meaning.
    pub fn symbol(&self, raw: u8) -> Result<Option<&'static str>, UnknownFieldValue> {
        match self.table {
            None => Ok(None),
            Some(table) => table
                .iter()
                .find(|variant| variant.raw == raw)
                .map(|variant| Some(variant.name))
                .ok_or(UnknownFieldValue {
                    register: self.field.register,
                    bit_offset: self.field.bit_offset,
                    raw,
                }),
        }
    }
}

/// Register and expected value of a family's identification register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub register: u8,
    pub value: u8,
}

/// How the Standby/Active mode of a family is written and read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeControl {
    /// Field written to change mode.
    pub control: BitField,
    /// Field read back to observe the mode. May differ from `control` (MMA8652 SYSMOD).
    pub status: BitField,
    pub standby: u8,
    pub active: u8,
    /// Observed raw status values and the mode they stand for.
    pub observed: &'static [(u8, Mode)],
}

impl ModeControl {
    pub fn observe(&self, raw: u8) -> Result<Mode, UnknownFieldValue> {
        self.observed
            .iter()
            .find(|(value, _)| *value == raw)
            .map(|(_, mode)| *mode)
            .ok_or(UnknownFieldValue {
                register: self.status.register,
                bit_offset: self.status.bit_offset,
                raw,
            })
    }
}

/// Static description of one device family.
#[derive(Debug)]
pub struct RegisterMap {
    pub family: DeviceFamily,
    pub default_address: SevenBitAddress,
    pub identity: Option<Identity>,
    pub mode: Option<ModeControl>,
    /// Self-clearing bit that triggers a software reset.
    pub reset: Option<BitField>,
    pub self_test: Option<BitField>,
    pub config_requires_standby: bool,
    pub fields: &'static [FieldDef],
}

impl RegisterMap {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|def| def.name == name)
    }

    /// Every field living in `register`, highest bit first.
    pub fn fields_of(&self, register: u8) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(move |def| def.field.register == register)
    }
}

/// Supported device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceFamily {
    /// HTS221 temperature and humidity sensor
    Hts221,
    /// ISL29023 ambient and infrared light sensor
    Isl29023,
    /// MMA8652FC 3-axis accelerometer
    Mma8652,
    /// MPL3115A2 pressure, altitude and temperature sensor
    Mpl3115a2,
    /// Identification EEPROM present on every cog
    Eeprom,
}

impl DeviceFamily {
    pub fn map(self) -> &'static RegisterMap {
        match self {
            DeviceFamily::Hts221 => &hts221::MAP,
            DeviceFamily::Isl29023 => &isl29023::MAP,
            DeviceFamily::Mma8652 => &mma8652::MAP,
            DeviceFamily::Mpl3115a2 => &mpl3115a2::MAP,
            DeviceFamily::Eeprom => &eeprom::MAP,
        }
    }

    pub fn default_address(self) -> SevenBitAddress {
        self.map().default_address
    }

    pub fn lookup(self, name: &str) -> Option<&'static FieldDef> {
        self.map().field(name)
    }
}

/// Decode table of a plain on/off bit.
pub(crate) const ENABLE: &[Variant] = &[Variant::new(0, "disabled"), Variant::new(1, "enabled")];
