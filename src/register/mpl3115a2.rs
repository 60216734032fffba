//! ### MPL3115A2 pressure, altitude and temperature sensor (Ps.3)
//!
//! OUT_P holds a different format per CTRL_REG1 setting:
//! - RAW: 24-bit unsigned ADC counts
//! - barometer: unsigned Q18.2 Pa, left-justified in 24 bits
//! - altimeter: signed Q16.4 m, left-justified in 24 bits
//!
//! OUT_T is signed Q8.4 °C, left-justified in 16 bits.

use super::{DeviceFamily, FieldDef, Identity, ModeControl, RegisterMap, UnexpectedValue, Variant, ENABLE};
use crate::field::BitField;
use crate::raw::{ByteOrder, RawLayout, Signedness};
use crate::session::Mode;

pub const DEFAULT_ADDRESS: u8 = 0x60;

pub const STATUS: u8 = 0x00;
pub const OUT_P_MSB: u8 = 0x01;
pub const OUT_P_CSB: u8 = 0x02;
pub const OUT_P_LSB: u8 = 0x03;
pub const OUT_T_MSB: u8 = 0x04;
pub const OUT_T_LSB: u8 = 0x05;
pub const OUT_P_DELTA_MSB: u8 = 0x07;
pub const OUT_P_DELTA_CSB: u8 = 0x08;
pub const OUT_P_DELTA_LSB: u8 = 0x09;
pub const OUT_T_DELTA_MSB: u8 = 0x0A;
pub const OUT_T_DELTA_LSB: u8 = 0x0B;
pub const WHO_AM_I: u8 = 0x0C;
pub const WHO_AM_I_VALUE: u8 = 0xC4;
pub const PT_DATA_CFG: u8 = 0x13;
pub const BAR_IN_MSB: u8 = 0x14;
pub const BAR_IN_LSB: u8 = 0x15;
pub const CTRL_REG1: u8 = 0x26;

/// BAR_IN resolution in Pa.
pub const BAR_IN_PA_PER_LSB: f32 = 2.0;

pub const PTDR: BitField = BitField::bit(STATUS, 3);
pub const PDR: BitField = BitField::bit(STATUS, 2);
pub const TDR: BitField = BitField::bit(STATUS, 1);
pub const DREM: BitField = BitField::bit(PT_DATA_CFG, 2);
pub const PDEFE: BitField = BitField::bit(PT_DATA_CFG, 1);
pub const TDEFE: BitField = BitField::bit(PT_DATA_CFG, 0);
pub const BAR_IN_HIGH: BitField = BitField::byte(BAR_IN_MSB);
pub const BAR_IN_LOW: BitField = BitField::byte(BAR_IN_LSB);
pub const ALT: BitField = BitField::bit(CTRL_REG1, 7);
pub const RAW: BitField = BitField::bit(CTRL_REG1, 6);
pub const OS: BitField = BitField::at(CTRL_REG1, 3, 3);
pub const RST: BitField = BitField::bit(CTRL_REG1, 2);
pub const OST: BitField = BitField::bit(CTRL_REG1, 1);
pub const SBYB: BitField = BitField::bit(CTRL_REG1, 0);

pub const PRESSURE_RAW: RawLayout = RawLayout {
    registers: &[OUT_P_MSB, OUT_P_CSB, OUT_P_LSB],
    order: ByteOrder::MsbFirst,
    width: 24,
    signedness: Signedness::Unsigned,
    shift: 0,
    frac_bits: 0,
};

pub const PRESSURE: RawLayout = RawLayout {
    width: 20,
    shift: 4,
    frac_bits: 2,
    ..PRESSURE_RAW
};

pub const ALTITUDE: RawLayout = RawLayout {
    signedness: Signedness::Signed,
    frac_bits: 4,
    ..PRESSURE
};

pub const TEMPERATURE: RawLayout = RawLayout {
    registers: &[OUT_T_MSB, OUT_T_LSB],
    order: ByteOrder::MsbFirst,
    width: 12,
    signedness: Signedness::Signed,
    shift: 4,
    frac_bits: 4,
};

pub const PRESSURE_DELTA: RawLayout = RawLayout {
    registers: &[OUT_P_DELTA_MSB, OUT_P_DELTA_CSB, OUT_P_DELTA_LSB],
    signedness: Signedness::Signed,
    ..PRESSURE
};

pub const ALTITUDE_DELTA: RawLayout = RawLayout {
    registers: &[OUT_P_DELTA_MSB, OUT_P_DELTA_CSB, OUT_P_DELTA_LSB],
    ..ALTITUDE
};

pub const TEMPERATURE_DELTA: RawLayout = RawLayout {
    registers: &[OUT_T_DELTA_MSB, OUT_T_DELTA_LSB],
    ..TEMPERATURE
};

/// CTRL_REG1.ALT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementMode {
    Barometer,
    Altimeter,
}

impl TryFrom<u8> for MeasurementMode {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MeasurementMode::Barometer),
            1 => Ok(MeasurementMode::Altimeter),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<MeasurementMode> for u8 {
    fn from(value: MeasurementMode) -> Self {
        value as u8
    }
}

/// CTRL_REG1.RAW
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// Compensated pressure or altitude.
    Normal,
    /// Uncompensated ADC counts, no altitude or deltas.
    Raw,
}

impl TryFrom<u8> for OutputMode {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OutputMode::Normal),
            1 => Ok(OutputMode::Raw),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<OutputMode> for u8 {
    fn from(value: OutputMode) -> Self {
        value as u8
    }
}

/// CTRL_REG1.OS, samples per conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    X1,
    X2,
    X4,
    X8,
    X16,
    X32,
    X64,
    X128,
}

impl TryFrom<u8> for Oversampling {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Oversampling::X1,
            1 => Oversampling::X2,
            2 => Oversampling::X4,
            3 => Oversampling::X8,
            4 => Oversampling::X16,
            5 => Oversampling::X32,
            6 => Oversampling::X64,
            7 => Oversampling::X128,
            _ => return Err(UnexpectedValue(value)),
        })
    }
}

impl From<Oversampling> for u8 {
    fn from(value: Oversampling) -> Self {
        value as u8
    }
}

const NEW_DATA_TABLE: &[Variant] = &[Variant::new(0, "no new data"), Variant::new(1, "new data")];
const ALT_TABLE: &[Variant] = &[Variant::new(0, "barometer"), Variant::new(1, "altimeter")];
const RAW_TABLE: &[Variant] = &[Variant::new(0, "normal"), Variant::new(1, "raw")];
const RST_TABLE: &[Variant] = &[Variant::new(0, "idle"), Variant::new(1, "reset in progress")];
const OST_TABLE: &[Variant] = &[Variant::new(0, "idle"), Variant::new(1, "measurement in progress")];
const SBYB_TABLE: &[Variant] = &[Variant::new(0, "standby"), Variant::new(1, "active")];

const OS_TABLE: &[Variant] = &[
    Variant::new(0, "1 sample"),
    Variant::new(1, "2 samples"),
    Variant::new(2, "4 samples"),
    Variant::new(3, "8 samples"),
    Variant::new(4, "16 samples"),
    Variant::new(5, "32 samples"),
    Variant::new(6, "64 samples"),
    Variant::new(7, "128 samples"),
];

const FIELDS: &[FieldDef] = &[
    FieldDef::new("PTDR", PTDR).with_table(NEW_DATA_TABLE).read_only(),
    FieldDef::new("PDR", PDR).with_table(NEW_DATA_TABLE).read_only(),
    FieldDef::new("TDR", TDR).with_table(NEW_DATA_TABLE).read_only(),
    FieldDef::new("WHO_AM_I", BitField::byte(WHO_AM_I)).read_only(),
    FieldDef::new("DREM", DREM).with_table(ENABLE).config(),
    FieldDef::new("PDEFE", PDEFE).with_table(ENABLE).config(),
    FieldDef::new("TDEFE", TDEFE).with_table(ENABLE).config(),
    FieldDef::new("BAR_IN_MSB", BAR_IN_HIGH).config(),
    FieldDef::new("BAR_IN_LSB", BAR_IN_LOW).config(),
    FieldDef::new("ALT", ALT).with_table(ALT_TABLE).config(),
    FieldDef::new("RAW", RAW).with_table(RAW_TABLE).config(),
    FieldDef::new("OS", OS).with_table(OS_TABLE).config(),
    FieldDef::new("RST", RST).with_table(RST_TABLE).self_clearing(),
    FieldDef::new("OST", OST).with_table(OST_TABLE).self_clearing(),
    FieldDef::new("SBYB", SBYB).with_table(SBYB_TABLE),
];

pub static MAP: RegisterMap = RegisterMap {
    family: DeviceFamily::Mpl3115a2,
    default_address: DEFAULT_ADDRESS,
    identity: Some(Identity { register: WHO_AM_I, value: WHO_AM_I_VALUE }),
    mode: Some(ModeControl {
        control: SBYB,
        status: SBYB,
        standby: 0,
        active: 1,
        observed: &[(0, Mode::Standby), (1, Mode::Active)],
    }),
    reset: Some(RST),
    self_test: None,
    config_requires_standby: true,
    fields: FIELDS,
};
