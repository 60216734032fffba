//! ### MMA8652FC 3-axis 12-bit accelerometer (Rs.2)
//!
//! Output data is 12-bit two's complement, left-justified over an MSB/LSB register pair.
//! Configuration registers only accept writes in Standby. The mode is written through
//! CTRL_REG1.ACTIVE and observed through SYSMOD, which also reports the auto-sleep state.

use super::{DeviceFamily, FieldDef, Identity, ModeControl, RegisterMap, UnexpectedValue, Variant, ENABLE};
use crate::field::BitField;
use crate::raw::{ByteOrder, RawLayout, Signedness};
use crate::session::Mode;

pub const DEFAULT_ADDRESS: u8 = 0x1D;

pub const STATUS: u8 = 0x00;
pub const OUT_X_MSB: u8 = 0x01;
pub const OUT_X_LSB: u8 = 0x02;
pub const OUT_Y_MSB: u8 = 0x03;
pub const OUT_Y_LSB: u8 = 0x04;
pub const OUT_Z_MSB: u8 = 0x05;
pub const OUT_Z_LSB: u8 = 0x06;
pub const F_SETUP: u8 = 0x09;
pub const SYSMOD: u8 = 0x0B;
pub const WHO_AM_I: u8 = 0x0D;
pub const WHO_AM_I_VALUE: u8 = 0x4A;
pub const XYZ_DATA_CFG: u8 = 0x0E;
pub const PULSE_CFG: u8 = 0x21;
pub const PULSE_SRC: u8 = 0x22;
pub const PULSE_THSX: u8 = 0x23;
pub const PULSE_THSY: u8 = 0x24;
pub const PULSE_THSZ: u8 = 0x25;
pub const PULSE_TMLT: u8 = 0x26;
pub const PULSE_LTCY: u8 = 0x27;
pub const CTRL_REG1: u8 = 0x2A;
pub const CTRL_REG2: u8 = 0x2B;
pub const CTRL_REG4: u8 = 0x2D;
pub const CTRL_REG5: u8 = 0x2E;

pub const ZYXOW: BitField = BitField::bit(STATUS, 7);
pub const ZYXDR: BitField = BitField::bit(STATUS, 3);
pub const F_MODE: BitField = BitField::at(F_SETUP, 6, 2);
pub const F_WMRK: BitField = BitField::at(F_SETUP, 0, 6);
/// Samples the FIFO holds.
pub const FIFO_DEPTH: u8 = 32;
pub const FGERR: BitField = BitField::bit(SYSMOD, 7);
pub const FGT: BitField = BitField::at(SYSMOD, 2, 5);
pub const SYSMOD_MODE: BitField = BitField::at(SYSMOD, 0, 2);
pub const HPF_OUT: BitField = BitField::bit(XYZ_DATA_CFG, 4);
pub const FS: BitField = BitField::at(XYZ_DATA_CFG, 0, 2);
pub const PULSE_CFG_ALL: BitField = BitField::byte(PULSE_CFG);
pub const PULSE_SRC_ALL: BitField = BitField::byte(PULSE_SRC);
pub const EA: BitField = BitField::bit(PULSE_SRC, 7);
pub const AXZ: BitField = BitField::bit(PULSE_SRC, 6);
pub const AXY: BitField = BitField::bit(PULSE_SRC, 5);
pub const AXX: BitField = BitField::bit(PULSE_SRC, 4);
pub const DPE: BitField = BitField::bit(PULSE_SRC, 3);
pub const POL: BitField = BitField::at(PULSE_SRC, 0, 3);
pub const PULSE_THS_X: BitField = BitField::at(PULSE_THSX, 0, 7);
pub const PULSE_THS_Y: BitField = BitField::at(PULSE_THSY, 0, 7);
pub const PULSE_THS_Z: BitField = BitField::at(PULSE_THSZ, 0, 7);
pub const PULSE_TMLT_ALL: BitField = BitField::byte(PULSE_TMLT);
pub const PULSE_LTCY_ALL: BitField = BitField::byte(PULSE_LTCY);
pub const ASLP_RATE: BitField = BitField::at(CTRL_REG1, 6, 2);
pub const DR: BitField = BitField::at(CTRL_REG1, 3, 3);
pub const F_READ: BitField = BitField::bit(CTRL_REG1, 1);
pub const ACTIVE: BitField = BitField::bit(CTRL_REG1, 0);
pub const ST: BitField = BitField::bit(CTRL_REG2, 7);
pub const RST: BitField = BitField::bit(CTRL_REG2, 6);
pub const SMODS: BitField = BitField::at(CTRL_REG2, 3, 2);
pub const SLPE: BitField = BitField::bit(CTRL_REG2, 2);
pub const MODS: BitField = BitField::at(CTRL_REG2, 0, 2);
pub const INT_EN_PULSE: BitField = BitField::bit(CTRL_REG4, 3);
pub const INT_EN_DRDY: BitField = BitField::bit(CTRL_REG4, 0);
pub const INT_CFG_PULSE: BitField = BitField::bit(CTRL_REG5, 3);
pub const INT_CFG_DRDY: BitField = BitField::bit(CTRL_REG5, 0);

pub const OUT_X: RawLayout = RawLayout {
    registers: &[OUT_X_MSB, OUT_X_LSB],
    order: ByteOrder::MsbFirst,
    width: 12,
    signedness: Signedness::Signed,
    shift: 4,
    frac_bits: 0,
};

pub const OUT_Y: RawLayout = RawLayout {
    registers: &[OUT_Y_MSB, OUT_Y_LSB],
    ..OUT_X
};

pub const OUT_Z: RawLayout = RawLayout {
    registers: &[OUT_Z_MSB, OUT_Z_LSB],
    ..OUT_X
};

/// PULSE_CFG value enabling single-pulse detection on all axes.
pub const PULSE_CFG_SINGLE: u8 = 0b0001_0101;
/// PULSE_CFG value enabling double-pulse detection on all axes.
pub const PULSE_CFG_DOUBLE: u8 = 0b0010_1010;
/// PULSE_CFG.ELE, latch events into PULSE_SRC until it is read.
pub const PULSE_CFG_LATCH: u8 = 0b0100_0000;

/// XYZ_DATA_CFG.FS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullScale {
    G2,
    G4,
    G8,
}

impl TryFrom<u8> for FullScale {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(FullScale::G2),
            0b01 => Ok(FullScale::G4),
            0b10 => Ok(FullScale::G8),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<FullScale> for u8 {
    fn from(value: FullScale) -> Self {
        value as u8
    }
}

/// F_SETUP.F_MODE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoMode {
    Disabled,
    /// Oldest sample is discarded on overflow.
    Circular,
    /// FIFO stops accepting samples on overflow.
    Stop,
    Trigger,
}

impl TryFrom<u8> for FifoMode {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(FifoMode::Disabled),
            0b01 => Ok(FifoMode::Circular),
            0b10 => Ok(FifoMode::Stop),
            0b11 => Ok(FifoMode::Trigger),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<FifoMode> for u8 {
    fn from(value: FifoMode) -> Self {
        value as u8
    }
}

/// SYSMOD.SYSMOD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemMode {
    Standby,
    Wake,
    Sleep,
}

impl TryFrom<u8> for SystemMode {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(SystemMode::Standby),
            0b01 => Ok(SystemMode::Wake),
            0b10 => Ok(SystemMode::Sleep),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

/// CTRL_REG2.SMODS and CTRL_REG2.MODS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerScheme {
    Normal,
    LowNoiseLowPower,
    HighResolution,
    LowPower,
}

impl TryFrom<u8> for PowerScheme {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(PowerScheme::Normal),
            0b01 => Ok(PowerScheme::LowNoiseLowPower),
            0b10 => Ok(PowerScheme::HighResolution),
            0b11 => Ok(PowerScheme::LowPower),
            _ => Err(UnexpectedValue(value)),
        }
    }
}

impl From<PowerScheme> for u8 {
    fn from(value: PowerScheme) -> Self {
        value as u8
    }
}

/// CTRL_REG1.DR, output data rate while awake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    R800Hz,
    R400Hz,
    R200Hz,
    R100Hz,
    R50Hz,
    R12p5Hz,
    R6p25Hz,
    R1p56Hz,
}

impl TryFrom<u8> for DataRate {
    type Error = UnexpectedValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => DataRate::R800Hz,
            1 => DataRate::R400Hz,
            2 => DataRate::R200Hz,
            3 => DataRate::R100Hz,
            4 => DataRate::R50Hz,
            5 => DataRate::R12p5Hz,
            6 => DataRate::R6p25Hz,
            7 => DataRate::R1p56Hz,
            _ => return Err(UnexpectedValue(value)),
        })
    }
}

impl From<DataRate> for u8 {
    fn from(value: DataRate) -> Self {
        value as u8
    }
}

const ZYXOW_TABLE: &[Variant] = &[Variant::new(0, "no overwrite"), Variant::new(1, "data overwritten")];
const ZYXDR_TABLE: &[Variant] = &[Variant::new(0, "no new data"), Variant::new(1, "new data")];

const F_MODE_TABLE: &[Variant] = &[
    Variant::new(0b00, "disabled"),
    Variant::new(0b01, "circular"),
    Variant::new(0b10, "stop on overflow"),
    Variant::new(0b11, "trigger"),
];

const FGERR_TABLE: &[Variant] = &[Variant::new(0, "no gate error"), Variant::new(1, "gate error")];

const SYSMOD_TABLE: &[Variant] = &[
    Variant::new(0b00, "standby"),
    Variant::new(0b01, "wake"),
    Variant::new(0b10, "sleep"),
];

const FS_TABLE: &[Variant] = &[
    Variant::new(0b00, "2g"),
    Variant::new(0b01, "4g"),
    Variant::new(0b10, "8g"),
];

const PULSE_CFG_TABLE: &[Variant] = &[
    Variant::new(0x00, "off"),
    Variant::new(PULSE_CFG_SINGLE, "single tap"),
    Variant::new(PULSE_CFG_DOUBLE, "double tap"),
    Variant::new(PULSE_CFG_SINGLE | PULSE_CFG_LATCH, "single tap, latched"),
    Variant::new(PULSE_CFG_DOUBLE | PULSE_CFG_LATCH, "double tap, latched"),
];

const PULSE_SRC_AXIS_TABLE: &[Variant] = &[Variant::new(0, "no event"), Variant::new(1, "event")];
const DPE_TABLE: &[Variant] = &[Variant::new(0, "single pulse"), Variant::new(1, "double pulse")];
const POLARITY_TABLE: &[Variant] = &[Variant::new(0, "positive"), Variant::new(1, "negative")];

const ASLP_RATE_TABLE: &[Variant] = &[
    Variant::new(0b00, "50 Hz"),
    Variant::new(0b01, "12.5 Hz"),
    Variant::new(0b10, "6.25 Hz"),
    Variant::new(0b11, "1.56 Hz"),
];

const DR_TABLE: &[Variant] = &[
    Variant::new(0, "800 Hz"),
    Variant::new(1, "400 Hz"),
    Variant::new(2, "200 Hz"),
    Variant::new(3, "100 Hz"),
    Variant::new(4, "50 Hz"),
    Variant::new(5, "12.5 Hz"),
    Variant::new(6, "6.25 Hz"),
    Variant::new(7, "1.56 Hz"),
];

const F_READ_TABLE: &[Variant] = &[Variant::new(0, "normal read"), Variant::new(1, "fast read")];
const ACTIVE_TABLE: &[Variant] = &[Variant::new(0, "standby"), Variant::new(1, "active")];
const RST_TABLE: &[Variant] = &[Variant::new(0, "idle"), Variant::new(1, "reset in progress")];

const INT_PIN_TABLE: &[Variant] = &[Variant::new(0, "INT2"), Variant::new(1, "INT1")];

const POWER_SCHEME_TABLE: &[Variant] = &[
    Variant::new(0b00, "normal"),
    Variant::new(0b01, "low noise low power"),
    Variant::new(0b10, "high resolution"),
    Variant::new(0b11, "low power"),
];

const FIELDS: &[FieldDef] = &[
    FieldDef::new("ZYXOW", ZYXOW).with_table(ZYXOW_TABLE).read_only(),
    FieldDef::new("ZYXDR", ZYXDR).with_table(ZYXDR_TABLE).read_only(),
    FieldDef::new("F_MODE", F_MODE).with_table(F_MODE_TABLE).config(),
    FieldDef::new("F_WMRK", F_WMRK).config(),
    FieldDef::new("FGERR", FGERR).with_table(FGERR_TABLE).read_only(),
    FieldDef::new("FGT", FGT).read_only(),
    FieldDef::new("SYSMOD", SYSMOD_MODE).with_table(SYSMOD_TABLE).read_only(),
    FieldDef::new("WHO_AM_I", BitField::byte(WHO_AM_I)).read_only(),
    FieldDef::new("HPF_OUT", HPF_OUT).with_table(ENABLE).config(),
    FieldDef::new("FS", FS).with_table(FS_TABLE).config(),
    FieldDef::new("PULSE_CFG", PULSE_CFG_ALL).with_table(PULSE_CFG_TABLE).config(),
    FieldDef::new("EA", EA).with_table(PULSE_SRC_AXIS_TABLE).read_only(),
    FieldDef::new("AXZ", AXZ).with_table(PULSE_SRC_AXIS_TABLE).read_only(),
    FieldDef::new("AXY", AXY).with_table(PULSE_SRC_AXIS_TABLE).read_only(),
    FieldDef::new("AXX", AXX).with_table(PULSE_SRC_AXIS_TABLE).read_only(),
    FieldDef::new("DPE", DPE).with_table(DPE_TABLE).read_only(),
    FieldDef::new("POLZ", BitField::bit(PULSE_SRC, 2)).with_table(POLARITY_TABLE).read_only(),
    FieldDef::new("POLY", BitField::bit(PULSE_SRC, 1)).with_table(POLARITY_TABLE).read_only(),
    FieldDef::new("POLX", BitField::bit(PULSE_SRC, 0)).with_table(POLARITY_TABLE).read_only(),
    FieldDef::new("PULSE_THSX", PULSE_THS_X).config(),
    FieldDef::new("PULSE_THSY", PULSE_THS_Y).config(),
    FieldDef::new("PULSE_THSZ", PULSE_THS_Z).config(),
    FieldDef::new("PULSE_TMLT", PULSE_TMLT_ALL).config(),
    FieldDef::new("PULSE_LTCY", PULSE_LTCY_ALL).config(),
    FieldDef::new("ASLP_RATE", ASLP_RATE).with_table(ASLP_RATE_TABLE).config(),
    FieldDef::new("DR", DR).with_table(DR_TABLE).config(),
    FieldDef::new("F_READ", F_READ).with_table(F_READ_TABLE).config(),
    FieldDef::new("ACTIVE", ACTIVE).with_table(ACTIVE_TABLE),
    FieldDef::new("ST", ST).with_table(ENABLE).config(),
    FieldDef::new("RST", RST).with_table(RST_TABLE).self_clearing(),
    FieldDef::new("SMODS", SMODS).with_table(POWER_SCHEME_TABLE).config(),
    FieldDef::new("SLPE", SLPE).with_table(ENABLE).config(),
    FieldDef::new("MODS", MODS).with_table(POWER_SCHEME_TABLE).config(),
    FieldDef::new("INT_EN_PULSE", INT_EN_PULSE).with_table(ENABLE).config(),
    FieldDef::new("INT_EN_DRDY", INT_EN_DRDY).with_table(ENABLE).config(),
    FieldDef::new("INT_CFG_PULSE", INT_CFG_PULSE).with_table(INT_PIN_TABLE).config(),
    FieldDef::new("INT_CFG_DRDY", INT_CFG_DRDY).with_table(INT_PIN_TABLE).config(),
];

pub static MAP: RegisterMap = RegisterMap {
    family: DeviceFamily::Mma8652,
    default_address: DEFAULT_ADDRESS,
    identity: Some(Identity { register: WHO_AM_I, value: WHO_AM_I_VALUE }),
    mode: Some(ModeControl {
        control: ACTIVE,
        status: SYSMOD_MODE,
        standby: 0,
        active: 1,
        observed: &[(0b00, Mode::Standby), (0b01, Mode::Active), (0b10, Mode::Sleep)],
    }),
    reset: Some(RST),
    self_test: Some(ST),
    config_requires_standby: true,
    fields: FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f_setup_decode() {
        let byte = 0b0110_0100;
        assert_eq!(Ok(FifoMode::Circular), FifoMode::try_from(F_MODE.decode(byte)));
        assert_eq!(0b10_0100, F_WMRK.decode(byte));
    }

    #[test]
    fn sysmod_decode() {
        let byte = 0b1000_1010;
        assert_eq!(1, FGERR.decode(byte));
        assert_eq!(0b00010, FGT.decode(byte));
        assert_eq!(Ok(SystemMode::Sleep), SystemMode::try_from(SYSMOD_MODE.decode(byte)));
        assert_eq!(Err(UnexpectedValue(0b11)), SystemMode::try_from(0b11));
    }

    #[test]
    fn xyz_data_cfg_encode() {
        // 8g -> 2g must clear bit 1
        let byte = FS.encode(0b0001_0010, FullScale::G2.into()).unwrap();
        assert_eq!(0b0001_0000, byte);

        let byte = FS.encode(byte, FullScale::G4.into()).unwrap();
        assert_eq!(0b0001_0001, byte);
    }

    #[test]
    fn ctrl_reg1_decode() {
        // ODR 400 Hz, active
        let byte = 0b0000_1001;
        assert_eq!(Ok(DataRate::R400Hz), DataRate::try_from(DR.decode(byte)));
        assert_eq!(1, ACTIVE.decode(byte));
        assert_eq!(0, F_READ.decode(byte));
    }

    #[test]
    fn ctrl_reg2_decode() {
        let byte = 0b1101_0110;
        assert_eq!(1, ST.decode(byte));
        assert_eq!(1, RST.decode(byte));
        assert_eq!(Ok(PowerScheme::HighResolution), PowerScheme::try_from(SMODS.decode(byte)));
        assert_eq!(1, SLPE.decode(byte));
        assert_eq!(Ok(PowerScheme::HighResolution), PowerScheme::try_from(MODS.decode(byte)));
    }

    #[test]
    fn pulse_interrupt_enable_is_bit_3() {
        assert_eq!(0b0000_1000, INT_EN_PULSE.encode(0x00, 1).unwrap());
    }

    #[test]
    fn sleep_is_observed_through_sysmod() {
        let mode = MAP.mode.unwrap();
        assert_eq!(CTRL_REG1, mode.control.register);
        assert_eq!(Ok(Mode::Sleep), mode.observe(0b10));
    }
}
