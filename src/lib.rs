//! Async `no_std` drivers for the iCogs sensor family: the HTS221 humidity sensor, the ISL29023
//! light sensor, the MMA8652FC accelerometer, the MPL3115A2 pressure sensor and the
//! identification EEPROM fitted to every cog.
//!
//! All devices share one I2C bus owned by a [`Session`]. Each family is described by a static
//! register map, so fields can be accessed by name as well as through the typed handles returned
//! by [`Session::hts221`], [`Session::mma8652`] and friends.
//!
//! ```no_run
//! # use embedded_hal_async::{delay::DelayNs, i2c::I2c as I2cMaster};
//! use icogs::{CancelToken, I2c, Mode, Session, Timing};
//!
//! # async fn demo<I: I2cMaster, D: DelayNs>(i2c: I, delay: D) -> Result<(), icogs::Error<I::Error>> {
//! let mut session = Session::new(I2c::new(i2c), delay, Timing::default());
//! let cancel = CancelToken::new();
//!
//! let mut hts221 = session.hts221();
//! hts221.verify_identity().await?;
//! hts221.set_mode(Mode::Active).await?;
//! let measurement = hts221.measure(&cancel).await?;
//! # let _ = measurement;
//! # Ok(())
//! # }
//! ```
#![no_std]

mod fmt;

pub mod bus;
pub mod calibration;
pub mod config;
pub mod device;
pub mod error;
pub mod field;
pub mod raw;
pub mod register;
pub mod session;

#[cfg(test)]
mod testing;

pub use bus::{Bus, I2c};
pub use config::{SelfTestConfig, Timing};
pub use error::{Error, IcogsResult};
pub use register::DeviceFamily;
pub use session::{CancelToken, Device, FieldReading, Meaning, Mode, Session};
