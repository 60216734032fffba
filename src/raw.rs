//! Assembly of multi-register readings into signed or unsigned, fixed-point values.
//!
//! Nothing here touches the bus: the session reads the bytes named by a [`RawLayout`] and hands
//! them to [`RawLayout::decode`].

/// Widths a raw reading may have once right-justified.
pub const SUPPORTED_WIDTHS: [u8; 5] = [12, 16, 20, 24, 32];

/// Most registers a single layout spans.
pub const MAX_LAYOUT_BYTES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signedness {
    Unsigned,
    Signed,
}

/// The byte count or width of a layout is not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidRawLayout {
    pub bytes: usize,
    pub width: u8,
}

/// Where a reading lives and how to turn its bytes into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    /// Registers in the order they are read.
    pub registers: &'static [u8],
    pub order: ByteOrder,
    /// Width of the value after dropping the `shift` padding bits.
    pub width: u8,
    pub signedness: Signedness,
    /// Unused low bits of left-justified data.
    pub shift: u8,
    pub frac_bits: u8,
}

impl RawLayout {
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    fn validate(&self, bytes: usize) -> Result<(), InvalidRawLayout> {
        let err = InvalidRawLayout { bytes, width: self.width };

        if bytes != self.registers.len() || bytes == 0 || bytes > MAX_LAYOUT_BYTES {
            return Err(err);
        }
        if !SUPPORTED_WIDTHS.contains(&self.width) {
            return Err(err);
        }
        if self.width as usize + self.shift as usize != bytes * 8 {
            return Err(err);
        }

        Ok(())
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<RawValue, InvalidRawLayout> {
        self.validate(bytes.len())?;

        let value = assemble(bytes, self.order) >> self.shift;
        let count = match self.signedness {
            Signedness::Signed => sign_extend(value, self.width),
            Signedness::Unsigned => value as i64,
        };

        Ok(RawValue { count, frac_bits: self.frac_bits })
    }
}

/// A decoded raw reading, still in device counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawValue {
    pub count: i64,
    pub frac_bits: u8,
}

impl RawValue {
    /// Count interpreted as a fixed-point number.
    pub fn value(&self) -> f32 {
        to_fixed_point(self.count, self.frac_bits)
    }
}

/// Accumulates up to four bytes into an unsigned integer.
pub fn assemble(bytes: &[u8], order: ByteOrder) -> u32 {
    let fold = |acc: u32, byte: &u8| (acc << 8) | *byte as u32;

    match order {
        ByteOrder::MsbFirst => bytes.iter().fold(0, fold),
        ByteOrder::LsbFirst => bytes.iter().rev().fold(0, fold),
    }
}

/// Interprets the low `width` bits of `value` as two's complement.
pub fn sign_extend(value: u32, width: u8) -> i64 {
    let width = width.clamp(1, 32) as u32;
    let value = value as i64 & ((1i64 << width) - 1);

    if value & (1i64 << (width - 1)) != 0 {
        value - (1i64 << width)
    } else {
        value
    }
}

pub fn to_fixed_point(value: i64, frac_bits: u8) -> f32 {
    (value as f64 / (1u64 << frac_bits) as f64) as f32
}
