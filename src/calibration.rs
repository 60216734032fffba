//! Conversion of raw device counts into physical units.
//!
//! Two mechanisms cover every family: a two-point linear calibration for parts that ship
//! factory reference points (HTS221), and scale tables keyed by a mode field for parts whose
//! resolution depends on configuration (MMA8652 full scale, ISL29023 range and resolution).

use crate::field::BitField;
use crate::register::{isl29023, mma8652, UnknownFieldValue};

/// The two reference points of a calibration share the same raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationDegenerate;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    pub raw: i32,
    pub physical: f32,
}

impl CalibrationPoint {
    pub fn new(raw: i32, physical: f32) -> Self {
        Self { raw, physical }
    }
}

/// Two reference points defining a linear mapping from raw counts to a physical value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPair {
    pub ref0: CalibrationPoint,
    pub ref1: CalibrationPoint,
}

impl CalibrationPair {
    pub fn new(ref0: CalibrationPoint, ref1: CalibrationPoint) -> Result<Self, CalibrationDegenerate> {
        if ref0.raw == ref1.raw {
            return Err(CalibrationDegenerate);
        }

        Ok(Self { ref0, ref1 })
    }

    /// `physical0 + (raw - raw0) * (physical1 - physical0) / (raw1 - raw0)`
    pub fn interpolate(&self, raw: i32) -> Result<f32, CalibrationDegenerate> {
        let span = self.ref1.raw as i64 - self.ref0.raw as i64;
        if span == 0 {
            return Err(CalibrationDegenerate);
        }

        let offset = (raw as i64 - self.ref0.raw as i64) as f32;
        Ok(self.ref0.physical + offset * (self.ref1.physical - self.ref0.physical) / span as f32)
    }
}

/// Multipliers keyed by the raw value of a mode field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTable {
    pub field: BitField,
    pub entries: &'static [(u8, f32)],
}

impl ScaleTable {
    pub fn lookup(&self, key: u8) -> Result<f32, UnknownFieldValue> {
        self.entries
            .iter()
            .find(|(raw, _)| *raw == key)
            .map(|(_, scale)| *scale)
            .ok_or(UnknownFieldValue {
                register: self.field.register,
                bit_offset: self.field.bit_offset,
                raw: key,
            })
    }
}

/// g per LSB of 12-bit accelerometer data, keyed by XYZ_DATA_CFG.FS.
pub const ACCEL_G_PER_LSB: ScaleTable = ScaleTable {
    field: mma8652::FS,
    entries: &[(0b00, 1.0 / 1024.0), (0b01, 1.0 / 512.0), (0b10, 1.0 / 256.0)],
};

/// Full-scale range in lux of visible-light measurements, keyed by COMMAND2.RANGE.
pub const LIGHT_FULL_SCALE: ScaleTable = ScaleTable {
    field: isl29023::RANGE,
    entries: &[(0b00, 1000.0), (0b01, 4000.0), (0b10, 16000.0), (0b11, 64000.0)],
};

/// Number of ADC counts, keyed by COMMAND2.RES.
pub const LIGHT_ADC_COUNTS: ScaleTable = ScaleTable {
    field: isl29023::RES,
    entries: &[(0b00, 65536.0), (0b01, 4096.0), (0b10, 256.0), (0b11, 16.0)],
};

/// Full-scale value used in the infrared modes regardless of COMMAND2.RANGE.
pub const IR_FULL_SCALE: f32 = 65535.0;

/// `full_scale / adc_counts * count`
pub fn lux(full_scale: f32, adc_counts: f32, count: u16) -> f32 {
    full_scale / adc_counts * count as f32
}

/// Factory calibration of one HTS221, stored in registers 0x30..=0x3F.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hts221Calibration {
    pub humidity: CalibrationPair,
    pub temperature: CalibrationPair,
}

impl Hts221Calibration {
    pub fn from_registers(block: &[u8; 16]) -> Result<Self, CalibrationDegenerate> {
        let i16_at = |offset: usize| i16::from_le_bytes([block[offset], block[offset + 1]]) as i32;

        let h0_rh = block[0] as f32 / 2.0;
        let h1_rh = block[1] as f32 / 2.0;

        // T0/T1 are 10-bit, their two MSBs each sit in 0x35
        let msb = block[5];
        let t0_degc = ((((msb & 0x03) as u16) << 8) | block[2] as u16) as f32 / 8.0;
        let t1_degc = (((((msb & 0x0C) >> 2) as u16) << 8) | block[3] as u16) as f32 / 8.0;

        Ok(Self {
            humidity: CalibrationPair::new(
                CalibrationPoint::new(i16_at(6), h0_rh),
                CalibrationPoint::new(i16_at(10), h1_rh),
            )?,
            temperature: CalibrationPair::new(
                CalibrationPoint::new(i16_at(12), t0_degc),
                CalibrationPoint::new(i16_at(14), t1_degc),
            )?,
        })
    }

    /// Relative humidity in %, clamped to 0..=100.
    pub fn humidity(&self, raw: i16) -> Result<f32, CalibrationDegenerate> {
        Ok(self.humidity.interpolate(raw as i32)?.clamp(0.0, 100.0))
    }

    /// Temperature in °C.
    pub fn temperature(&self, raw: i16) -> Result<f32, CalibrationDegenerate> {
        self.temperature.interpolate(raw as i32)
    }
}
