//! Sub-byte field codec.
//!
//! Every register write in this crate goes through [`encode`], which clears the target bits before
//! setting the new value. A field can therefore move from `1` to `0` as well as from `0` to `1`.

/// A value that does not fit the field it is written to, or a field that does not fit in a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidFieldValue {
    pub value: u8,
    pub bit_offset: u8,
    pub width: u8,
}

impl InvalidFieldValue {
    pub fn new(value: u8, bit_offset: u8, width: u8) -> Self {
        Self { value, bit_offset, width }
    }
}

/// Right-aligned mask of `width` ones.
#[inline]
pub const fn mask(width: u8) -> u8 {
    if width >= 8 {
        0xFF
    } else {
        (1u8 << width) - 1
    }
}

#[inline]
const fn fits(bit_offset: u8, width: u8) -> bool {
    width >= 1 && width <= 8 && bit_offset <= 7 && bit_offset + width <= 8
}

/// Extracts the `width`-bit field starting at `bit_offset` from `byte`.
///
/// Offsets and widths that do not fit in a byte are clipped by the mask, use [`BitField::new`]
/// to validate them up front.
#[inline]
pub fn decode(byte: u8, bit_offset: u8, width: u8) -> u8 {
    (byte >> (bit_offset & 0x07)) & mask(width)
}

/// Returns `byte` with the `width`-bit field at `bit_offset` replaced by `value`.
///
/// Fails with [`InvalidFieldValue`] when `value` needs more than `width` bits or when the field
/// does not fit in a byte.
pub fn encode(byte: u8, bit_offset: u8, width: u8, value: u8) -> Result<u8, InvalidFieldValue> {
    if !fits(bit_offset, width) || value & !mask(width) != 0 {
        return Err(InvalidFieldValue::new(value, bit_offset, width));
    }

    let positioned = mask(width) << bit_offset;
    Ok((byte & !positioned) | ((value & mask(width)) << bit_offset))
}

/// Location of a field inside a single register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitField {
    pub register: u8,
    pub bit_offset: u8,
    pub width: u8,
}

impl BitField {
    /// Compile-time constructor used by the static register maps.
    ///
    /// # Panics
    /// When `bit_offset + width > 8` or `width == 0`. In a `const` context this is a build error.
    pub const fn at(register: u8, bit_offset: u8, width: u8) -> Self {
        assert!(fits(bit_offset, width), "bit field does not fit in one byte");
        Self { register, bit_offset, width }
    }

    /// Single-bit field.
    pub const fn bit(register: u8, bit: u8) -> Self {
        Self::at(register, bit, 1)
    }

    /// Whole-register field.
    pub const fn byte(register: u8) -> Self {
        Self::at(register, 0, 8)
    }

    /// Run-time constructor.
    pub fn new(register: u8, bit_offset: u8, width: u8) -> Result<Self, InvalidFieldValue> {
        if fits(bit_offset, width) {
            Ok(Self { register, bit_offset, width })
        } else {
            Err(InvalidFieldValue::new(0, bit_offset, width))
        }
    }

    /// Mask of the field in register position.
    pub fn positioned_mask(&self) -> u8 {
        mask(self.width) << self.bit_offset
    }

    pub fn max_value(&self) -> u8 {
        mask(self.width)
    }

    pub fn decode(&self, byte: u8) -> u8 {
        decode(byte, self.bit_offset, self.width)
    }

    pub fn encode(&self, byte: u8, value: u8) -> Result<u8, InvalidFieldValue> {
        encode(byte, self.bit_offset, self.width, value)
    }
}
