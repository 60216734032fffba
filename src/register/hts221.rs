//! ### HTS221 capacitive humidity and temperature sensor (Ts.1)
//!
//! Humidity and temperature outputs are signed 16-bit, LSB first. Every part carries its own
//! two-point calibration in 0x30..=0x3F.

use super::{DeviceFamily, FieldDef, Identity, ModeControl, RegisterMap, UnexpectedValue, Variant, ENABLE};
use crate::field::BitField;
use crate::raw::{ByteOrder, RawLayout, Signedness};
use crate::session::Mode;

pub const DEFAULT_ADDRESS: u8 = 0x5F;

pub const WHO_AM_I: u8 = 0x0F;
pub const WHO_AM_I_VALUE: u8 = 0xBC;
pub const AV_CONF: u8 = 0x10;
pub const CTRL_REG1: u8 = 0x20;
pub const CTRL_REG2: u8 = 0x21;
pub const CTRL_REG3: u8 = 0x22;
pub const STATUS_REG: u8 = 0x27;
pub const HUMIDITY_OUT_L: u8 = 0x28;
pub const HUMIDITY_OUT_H: u8 = 0x29;
pub const TEMP_OUT_L: u8 = 0x2A;
pub const TEMP_OUT_H: u8 = 0x2B;
pub const CALIBRATION_START: u8 = 0x30;
pub const CALIBRATION_LEN: usize = 16;

pub const AVGT: BitField = BitField::at(AV_CONF, 3, 3);
pub const AVGH: BitField = BitField::at(AV_CONF, 0, 3);
pub const PD: BitField = BitField::bit(CTRL_REG1, 7);
pub const BDU: BitField = BitField::bit(CTRL_REG1, 2);
pub const ODR: BitField = BitField::at(CTRL_REG1, 0, 2);
pub const BOOT: BitField = BitField::bit(CTRL_REG2, 7);
pub const HEATER: BitField = BitField::bit(CTRL_REG2, 1);
pub const ONE_SHOT: BitField = BitField::bit(CTRL_REG2, 0);
pub const DRDY_H_L: BitField = BitField::bit(CTRL_REG3, 7);
pub const PP_OD: BitField = BitField::bit(CTRL_REG3, 6);
pub const DRDY_EN: BitField = BitField::bit(CTRL_REG3, 2);
pub const H_DA: BitField = BitField::bit(STATUS_REG, 1);
pub const T_DA: BitField = BitField::bit(STATUS_REG, 0);

pub const HUMIDITY_OUT: RawLayout = RawLayout {
    registers: &[HUMIDITY_OUT_L, HUMIDITY_OUT_H],
    order: ByteOrder::LsbFirst,
    width: 16,
    signedness: Signedness::Signed,
    shift: 0,
    frac_bits: 0,
};

pub const TEMPERATURE_OUT: RawLayout = RawLayout {
    registers: &[TEMP_OUT_L, TEMP_OUT_H],
    ..HUMIDITY_OUT
};

/// Number of internal temperature samples averaged per output (AV_CONF.AVGT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureAveraging {
    X2,
    X4,
    X8,
    X16,
    X32,
    X64,
    X128,
    X256,
}

impl TryFrom<u8> for TemperatureAveraging {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => TemperatureAveraging::X2,
            1 => TemperatureAveraging::X4,
            2 => TemperatureAveraging::X8,
            3 => TemperatureAveraging::X16,
            4 => TemperatureAveraging::X32,
            5 => TemperatureAveraging::X64,
            6 => TemperatureAveraging::X128,
            7 => TemperatureAveraging::X256,
            _ => return Err(UnexpectedValue(value)),
        })
    }
}

impl From<TemperatureAveraging> for u8 {
    fn from(value: TemperatureAveraging) -> Self {
        value as u8
    }
}

/// Number of internal humidity samples averaged per output (AV_CONF.AVGH).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HumidityAveraging {
    X4,
    X8,
    X16,
    X32,
    X64,
    X128,
    X256,
    X512,
}

impl TryFrom<u8> for HumidityAveraging {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => HumidityAveraging::X4,
            1 => HumidityAveraging::X8,
            2 => HumidityAveraging::X16,
            3 => HumidityAveraging::X32,
            4 => HumidityAveraging::X64,
            5 => HumidityAveraging::X128,
            6 => HumidityAveraging::X256,
            7 => HumidityAveraging::X512,
            _ => return Err(UnexpectedValue(value)),
        })
    }
}

impl From<HumidityAveraging> for u8 {
    fn from(value: HumidityAveraging) -> Self {
        value as u8
    }
}

/// CTRL_REG1.ODR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputDataRate {
    /// Conversions only on a ONE_SHOT trigger.
    OneShot,
    R1Hz,
    R7Hz,
    R12p5Hz,
}

impl TryFrom<u8> for OutputDataRate {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(OutputDataRate::OneShot),
            0b01 => Ok(OutputDataRate::R1Hz),
            0b10 => Ok(OutputDataRate::R7Hz),
            0b11 => Ok(OutputDataRate::R12p5Hz),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<OutputDataRate> for u8 {
    fn from(value: OutputDataRate) -> Self {
        match value {
            OutputDataRate::OneShot => 0b00,
            OutputDataRate::R1Hz => 0b01,
            OutputDataRate::R7Hz => 0b10,
            OutputDataRate::R12p5Hz => 0b11,
        }
    }
}

const AVGT_TABLE: &[Variant] = &[
    Variant::new(0, "2 samples"),
    Variant::new(1, "4 samples"),
    Variant::new(2, "8 samples"),
    Variant::new(3, "16 samples"),
    Variant::new(4, "32 samples"),
    Variant::new(5, "64 samples"),
    Variant::new(6, "128 samples"),
    Variant::new(7, "256 samples"),
];

const AVGH_TABLE: &[Variant] = &[
    Variant::new(0, "4 samples"),
    Variant::new(1, "8 samples"),
    Variant::new(2, "16 samples"),
    Variant::new(3, "32 samples"),
    Variant::new(4, "64 samples"),
    Variant::new(5, "128 samples"),
    Variant::new(6, "256 samples"),
    Variant::new(7, "512 samples"),
];

const ODR_TABLE: &[Variant] = &[
    Variant::new(0, "one-shot"),
    Variant::new(1, "1 Hz"),
    Variant::new(2, "7 Hz"),
    Variant::new(3, "12.5 Hz"),
];

const PD_TABLE: &[Variant] = &[Variant::new(0, "power-down"), Variant::new(1, "active")];
const BDU_TABLE: &[Variant] = &[Variant::new(0, "continuous"), Variant::new(1, "update after read")];
const BOOT_TABLE: &[Variant] = &[Variant::new(0, "normal"), Variant::new(1, "reboot memory")];
const ONE_SHOT_TABLE: &[Variant] = &[Variant::new(0, "idle"), Variant::new(1, "start")];
const DRDY_H_L_TABLE: &[Variant] = &[Variant::new(0, "active high"), Variant::new(1, "active low")];
const PP_OD_TABLE: &[Variant] = &[Variant::new(0, "push-pull"), Variant::new(1, "open drain")];
const NEW_DATA_TABLE: &[Variant] = &[Variant::new(0, "no new data"), Variant::new(1, "new data")];

const FIELDS: &[FieldDef] = &[
    FieldDef::new("WHO_AM_I", BitField::byte(WHO_AM_I)).read_only(),
    FieldDef::new("AVGT", AVGT).with_table(AVGT_TABLE),
    FieldDef::new("AVGH", AVGH).with_table(AVGH_TABLE),
    FieldDef::new("PD", PD).with_table(PD_TABLE),
    FieldDef::new("BDU", BDU).with_table(BDU_TABLE),
    FieldDef::new("ODR", ODR).with_table(ODR_TABLE),
    FieldDef::new("BOOT", BOOT).with_table(BOOT_TABLE).self_clearing(),
    FieldDef::new("HEATER", HEATER).with_table(ENABLE),
    FieldDef::new("ONE_SHOT", ONE_SHOT).with_table(ONE_SHOT_TABLE).self_clearing(),
    FieldDef::new("DRDY_H_L", DRDY_H_L).with_table(DRDY_H_L_TABLE),
    FieldDef::new("PP_OD", PP_OD).with_table(PP_OD_TABLE),
    FieldDef::new("DRDY_EN", DRDY_EN).with_table(ENABLE),
    FieldDef::new("H_DA", H_DA).with_table(NEW_DATA_TABLE).read_only(),
    FieldDef::new("T_DA", T_DA).with_table(NEW_DATA_TABLE).read_only(),
];

pub static MAP: RegisterMap = RegisterMap {
    family: DeviceFamily::Hts221,
    default_address: DEFAULT_ADDRESS,
    identity: Some(Identity { register: WHO_AM_I, value: WHO_AM_I_VALUE }),
    mode: Some(ModeControl {
        control: PD,
        status: PD,
        standby: 0,
        active: 1,
        observed: &[(0, Mode::Standby), (1, Mode::Active)],
    }),
    reset: Some(BOOT),
    self_test: None,
    config_requires_standby: false,
    fields: FIELDS,
};
