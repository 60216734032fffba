//! Errors that can occur when talking to an iCogs device.
//!
//! The error type is generic over the error type of the underlying bus, so transport failures are
//! passed through untouched.

use crate::calibration::CalibrationDegenerate;
use crate::field::InvalidFieldValue;
use crate::raw::InvalidRawLayout;
use crate::register::UnknownFieldValue;
use crate::session::Mode;

/// This represents all possible errors that can occur when using an iCogs device.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<BusError> {
    /// An error has occurred in the I2C driver. Never retried by this crate.
    Bus(BusError),

    /// A value does not fit the field it was written to.
    InvalidFieldValue(InvalidFieldValue),

    /// A field was read back with a value that has no symbolic meaning.
    ///
    /// Could indicate a reserved bit pattern, a faulty chip or interference.
    UnknownFieldValue(UnknownFieldValue),

    /// The family has no field with the requested name.
    NoSuchField,

    /// A raw layout was given the wrong number of bytes or an unsupported width.
    InvalidRawLayout(InvalidRawLayout),

    /// The mode read back after a transition is not the requested one. The caller may retry.
    ModeTransitionFailed { expected: Mode, observed: Mode },

    /// The requested mode can not be entered from the current one with a plain mode write.
    InvalidTransition { from: Mode, to: Mode },

    /// A configuration field was written while the device was not in Standby.
    RequiresStandby,

    /// Both calibration reference points share the same raw value.
    CalibrationDegenerate,

    /// The checksum stored in the EEPROM does not match the computed one.
    ChecksumMismatch { stored: u16, computed: u16 },

    /// A register did not hold the written value when read back.
    VerifyFailed { register: u8, expected: u8, observed: u8 },

    /// Write attempted to a read-only field or a factory-programmed EEPROM location.
    ReadOnly(u8),

    /// The device family lacks the register needed for this operation.
    UnsupportedOperation,

    /// The who-am-I register returned an unexpected value.
    ///
    /// Could possibly indicate wrong wiring or a different part at this address.
    WrongDevice { expected: u8, found: u8 },

    /// A bounded poll ran out of attempts.
    Timeout,

    /// The operation observed a cancellation request.
    Cancelled,
}

/// Type alias used to simplify return types throughout the crate
pub type IcogsResult<T, BusError> = Result<T, Error<BusError>>;

impl<BusError> From<InvalidFieldValue> for Error<BusError> {
    fn from(e: InvalidFieldValue) -> Self {
        Error::InvalidFieldValue(e)
    }
}

impl<BusError> From<UnknownFieldValue> for Error<BusError> {
    fn from(e: UnknownFieldValue) -> Self {
        Error::UnknownFieldValue(e)
    }
}

impl<BusError> From<InvalidRawLayout> for Error<BusError> {
    fn from(e: InvalidRawLayout) -> Self {
        Error::InvalidRawLayout(e)
    }
}

impl<BusError> From<CalibrationDegenerate> for Error<BusError> {
    fn from(_: CalibrationDegenerate) -> Self {
        Error::CalibrationDegenerate
    }
}
