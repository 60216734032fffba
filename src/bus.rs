//! Byte-level transport contract shared by every device on the bus.

use core::future::Future;
use embedded_hal::i2c::SevenBitAddress;

/// A transport able to read and write single registers of devices addressed on a shared bus.
///
/// Implementations report their own error type, which the session wraps in
/// [`Error::Bus`](crate::Error::Bus) without retrying.
pub trait Bus {
    type Error;

    fn read_byte(
        &mut self,
        device: SevenBitAddress,
        register: u8,
    ) -> impl Future<Output = Result<u8, Self::Error>>;

    fn write_byte(
        &mut self,
        device: SevenBitAddress,
        register: u8,
        value: u8,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Reads `data.len()` consecutive registers starting at `start`, one transaction per byte.
    ///
    /// Some parts (e.g. HTS221) only auto-increment when the sub-address carries a flag bit, so
    /// the default does not rely on burst reads.
    fn read_bytes(
        &mut self,
        device: SevenBitAddress,
        start: u8,
        data: &mut [u8],
    ) -> impl Future<Output = Result<(), Self::Error>> {
        async move {
            for (offset, byte) in data.iter_mut().enumerate() {
                *byte = self.read_byte(device, start.wrapping_add(offset as u8)).await?;
            }

            Ok(())
        }
    }
}

/// [`Bus`] over any `embedded-hal-async` I2C master.
pub struct I2c<I2cType> {
    i2c: I2cType,
}

impl<I2cType> I2c<I2cType>
where
    I2cType: embedded_hal_async::i2c::I2c,
{
    pub fn new(i2c: I2cType) -> Self {
        Self { i2c }
    }

    /// Gives back the wrapped I2C master.
    pub fn release(self) -> I2cType {
        self.i2c
    }
}

impl<I2cType> Bus for I2c<I2cType>
where
    I2cType: embedded_hal_async::i2c::I2c,
{
    type Error = <I2cType as embedded_hal_async::i2c::ErrorType>::Error;

    async fn read_byte(&mut self, device: SevenBitAddress, register: u8) -> Result<u8, Self::Error> {
        let mut data = [0u8; 1];
        self.i2c.write_read(device, &[register], &mut data).await?;

        Ok(data[0])
    }

    async fn write_byte(
        &mut self,
        device: SevenBitAddress,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        self.i2c.write(device, &[register, value]).await?;

        Ok(())
    }
}
