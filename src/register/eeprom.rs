//! ### Identification EEPROM (24xx02-class, 256 bytes)
//!
//! Memory map version 0.2:
//!
//! | Address      | Content                                   |
//! |--------------|-------------------------------------------|
//! | 0x00..=0x01  | map version, major then minor             |
//! | 0x0E..=0x0F  | checksum, high then low byte              |
//! | 0x10         | bus type of the sensor (0x01 = I2C)       |
//! | 0x11         | sensor I2C address                        |
//! | 0x15..=0x16  | sensor type                               |
//! | 0x20..=0x7F  | six 16-byte calibration blocks            |
//! | 0x36..=0x39  | user scratch                              |
//! | 0xFA         | manufacturer ID (factory, read-only)      |
//! | 0xFB         | device ID (factory, read-only)            |
//! | 0xFC..=0xFF  | UUID (factory, read-only)                 |

use super::{DeviceFamily, FieldDef, RegisterMap, Variant};
use crate::field::BitField;
use crate::raw::{ByteOrder, RawLayout, Signedness};

pub const DEFAULT_ADDRESS: u8 = 0x50;

pub const MAP_VERSION_MAJOR: u8 = 0x00;
pub const MAP_VERSION_MINOR: u8 = 0x01;
pub const CHECKSUM_HIGH: u8 = 0x0E;
pub const CHECKSUM_LOW: u8 = 0x0F;
pub const BUS_TYPE: u8 = 0x10;
pub const SENSOR_ADDRESS: u8 = 0x11;
pub const SENSOR_TYPE_HIGH: u8 = 0x15;
pub const SENSOR_TYPE_LOW: u8 = 0x16;
pub const CALIBRATION_START: u8 = 0x20;
pub const CALIBRATION_BLOCK_LEN: usize = 16;
pub const CALIBRATION_BLOCKS: usize = 6;
pub const SCRATCH_START: u8 = 0x36;
pub const SCRATCH_LEN: usize = 4;
pub const MANUFACTURER_ID: u8 = 0xFA;
pub const DEVICE_ID: u8 = 0xFB;
pub const UUID_START: u8 = 0xFC;

/// First factory-programmed address, everything from here up is read-only.
pub const READ_ONLY_START: u8 = MANUFACTURER_ID;
/// Bytes 0x00..CHECKSUM_SPAN are covered by the checksum.
pub const CHECKSUM_SPAN: usize = 0x80;
/// Inclusive address ranges written as 0x00 by the defaults.
pub const BLANKS: [(u8, u8); 2] = [(0x12, 0x14), (0x17, 0x1F)];

pub const MAP_VERSION_VALUE: [u8; 2] = [0x00, 0x02];
pub const BUS_TYPE_I2C: u8 = 0x01;
pub const BLANK: u8 = 0x00;

pub const UUID: RawLayout = RawLayout {
    registers: &[UUID_START, UUID_START + 1, UUID_START + 2, UUID_START + 3],
    order: ByteOrder::MsbFirst,
    width: 32,
    signedness: Signedness::Unsigned,
    shift: 0,
    frac_bits: 0,
};

pub const CHECKSUM: RawLayout = RawLayout {
    registers: &[CHECKSUM_HIGH, CHECKSUM_LOW],
    width: 16,
    ..UUID
};

pub fn is_read_only(address: u8) -> bool {
    address >= READ_ONLY_START
}

/// Address of the first byte of calibration block `index` (0..6).
pub fn calibration_block(index: usize) -> Option<u8> {
    (index < CALIBRATION_BLOCKS).then(|| CALIBRATION_START + (index * CALIBRATION_BLOCK_LEN) as u8)
}

const BUS_TYPE_TABLE: &[Variant] = &[Variant::new(BUS_TYPE_I2C, "I2C")];

const FIELDS: &[FieldDef] = &[
    FieldDef::new("MAP_VERSION_MAJOR", BitField::byte(MAP_VERSION_MAJOR)),
    FieldDef::new("MAP_VERSION_MINOR", BitField::byte(MAP_VERSION_MINOR)),
    FieldDef::new("CHECKSUM_HIGH", BitField::byte(CHECKSUM_HIGH)),
    FieldDef::new("CHECKSUM_LOW", BitField::byte(CHECKSUM_LOW)),
    FieldDef::new("BUS_TYPE", BitField::byte(BUS_TYPE)).with_table(BUS_TYPE_TABLE),
    FieldDef::new("SENSOR_ADDRESS", BitField::byte(SENSOR_ADDRESS)),
    FieldDef::new("SENSOR_TYPE_HIGH", BitField::byte(SENSOR_TYPE_HIGH)),
    FieldDef::new("SENSOR_TYPE_LOW", BitField::byte(SENSOR_TYPE_LOW)),
    FieldDef::new("MANUFACTURER_ID", BitField::byte(MANUFACTURER_ID)).read_only(),
    FieldDef::new("DEVICE_ID", BitField::byte(DEVICE_ID)).read_only(),
];

pub static MAP: RegisterMap = RegisterMap {
    family: DeviceFamily::Eeprom,
    default_address: DEFAULT_ADDRESS,
    identity: None,
    mode: None,
    reset: None,
    self_test: None,
    config_requires_standby: false,
    fields: FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_blocks_tile_upper_half() {
        assert_eq!(Some(0x20), calibration_block(0));
        assert_eq!(Some(0x70), calibration_block(5));
        assert_eq!(None, calibration_block(6));
        assert_eq!(
            CHECKSUM_SPAN,
            CALIBRATION_START as usize + CALIBRATION_BLOCKS * CALIBRATION_BLOCK_LEN
        );
    }

    #[test]
    fn factory_area_is_read_only() {
        assert!(!is_read_only(0xF9));
        assert!(is_read_only(MANUFACTURER_ID));
        assert!(is_read_only(0xFF));
    }

    #[test]
    fn uuid_is_msb_first() {
        assert_eq!(
            0xDEAD_BEEF,
            UUID.decode(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap().count
        );
    }
}
