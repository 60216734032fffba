//! ### ISL29023 ambient and infrared light sensor (Ls.1)
//!
//! The part has no identification register. Its operating mode doubles as the power mode:
//! any measuring operation counts as Active, power-down as Standby.

use super::{DeviceFamily, FieldDef, ModeControl, RegisterMap, UnexpectedValue, Variant};
use crate::field::BitField;
use crate::raw::{ByteOrder, RawLayout, Signedness};
use crate::session::Mode;

pub const DEFAULT_ADDRESS: u8 = 0x44;

pub const COMMAND1: u8 = 0x00;
pub const COMMAND2: u8 = 0x01;
pub const DATA_LSB: u8 = 0x02;
pub const DATA_MSB: u8 = 0x03;

pub const OP: BitField = BitField::at(COMMAND1, 5, 3);
pub const FLAG: BitField = BitField::bit(COMMAND1, 2);
pub const PRST: BitField = BitField::at(COMMAND1, 0, 2);
pub const RES: BitField = BitField::at(COMMAND2, 2, 2);
pub const RANGE: BitField = BitField::at(COMMAND2, 0, 2);

pub const DATA: RawLayout = RawLayout {
    registers: &[DATA_LSB, DATA_MSB],
    order: ByteOrder::LsbFirst,
    width: 16,
    signedness: Signedness::Unsigned,
    shift: 0,
    frac_bits: 0,
};

/// COMMAND1.OP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationMode {
    PowerDown,
    /// One visible-light conversion, then power-down.
    AlsOnce,
    /// One infrared conversion, then power-down.
    IrOnce,
    AlsContinuous,
    IrContinuous,
}

impl OperationMode {
    pub fn is_infrared(self) -> bool {
        matches!(self, OperationMode::IrOnce | OperationMode::IrContinuous)
    }
}

impl TryFrom<u8> for OperationMode {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b000 => Ok(OperationMode::PowerDown),
            0b001 => Ok(OperationMode::AlsOnce),
            0b010 => Ok(OperationMode::IrOnce),
            0b101 => Ok(OperationMode::AlsContinuous),
            0b110 => Ok(OperationMode::IrContinuous),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<OperationMode> for u8 {
    fn from(value: OperationMode) -> Self {
        match value {
            OperationMode::PowerDown => 0b000,
            OperationMode::AlsOnce => 0b001,
            OperationMode::IrOnce => 0b010,
            OperationMode::AlsContinuous => 0b101,
            OperationMode::IrContinuous => 0b110,
        }
    }
}

/// COMMAND1.PRST, integration cycles out of threshold before the interrupt flag is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Persist {
    Cycles1,
    Cycles4,
    Cycles8,
    Cycles16,
}

impl TryFrom<u8> for Persist {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(Persist::Cycles1),
            0b01 => Ok(Persist::Cycles4),
            0b10 => Ok(Persist::Cycles8),
            0b11 => Ok(Persist::Cycles16),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<Persist> for u8 {
    fn from(value: Persist) -> Self {
        value as u8
    }
}

/// COMMAND2.RES
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits16,
    Bits12,
    Bits8,
    Bits4,
}

impl TryFrom<u8> for Resolution {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(Resolution::Bits16),
            0b01 => Ok(Resolution::Bits12),
            0b10 => Ok(Resolution::Bits8),
            0b11 => Ok(Resolution::Bits4),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<Resolution> for u8 {
    fn from(value: Resolution) -> Self {
        value as u8
    }
}

/// COMMAND2.RANGE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
    Lux1000,
    Lux4000,
    Lux16000,
    Lux64000,
}

impl TryFrom<u8> for Range {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(Range::Lux1000),
            0b01 => Ok(Range::Lux4000),
            0b10 => Ok(Range::Lux16000),
            0b11 => Ok(Range::Lux64000),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<Range> for u8 {
    fn from(value: Range) -> Self {
        value as u8
    }
}

const OP_TABLE: &[Variant] = &[
    Variant::new(0b000, "power-down"),
    Variant::new(0b001, "ALS once"),
    Variant::new(0b010, "IR once"),
    Variant::new(0b101, "ALS continuous"),
    Variant::new(0b110, "IR continuous"),
];

const FLAG_TABLE: &[Variant] = &[Variant::new(0, "no interrupt"), Variant::new(1, "interrupt triggered")];

const PRST_TABLE: &[Variant] = &[
    Variant::new(0b00, "1 cycle"),
    Variant::new(0b01, "4 cycles"),
    Variant::new(0b10, "8 cycles"),
    Variant::new(0b11, "16 cycles"),
];

const RES_TABLE: &[Variant] = &[
    Variant::new(0b00, "16-bit"),
    Variant::new(0b01, "12-bit"),
    Variant::new(0b10, "8-bit"),
    Variant::new(0b11, "4-bit"),
];

const RANGE_TABLE: &[Variant] = &[
    Variant::new(0b00, "1000 lux"),
    Variant::new(0b01, "4000 lux"),
    Variant::new(0b10, "16000 lux"),
    Variant::new(0b11, "64000 lux"),
];

const FIELDS: &[FieldDef] = &[
    FieldDef::new("OP", OP).with_table(OP_TABLE),
    FieldDef::new("FLAG", FLAG).with_table(FLAG_TABLE),
    FieldDef::new("PRST", PRST).with_table(PRST_TABLE),
    FieldDef::new("RES", RES).with_table(RES_TABLE),
    FieldDef::new("RANGE", RANGE).with_table(RANGE_TABLE),
];

pub static MAP: RegisterMap = RegisterMap {
    family: DeviceFamily::Isl29023,
    default_address: DEFAULT_ADDRESS,
    identity: None,
    mode: Some(ModeControl {
        control: OP,
        status: OP,
        standby: 0b000,
        active: 0b101,
        observed: &[
            (0b000, Mode::Standby),
            (0b001, Mode::Active),
            (0b010, Mode::Active),
            (0b101, Mode::Active),
            (0b110, Mode::Active),
        ],
    }),
    reset: None,
    self_test: None,
    config_requires_standby: false,
    fields: FIELDS,
};
