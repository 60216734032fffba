//! Identification EEPROM fitted to every iCogs board.
//!
//! Every write is read back after the settle delay. The checksum is only ever written on
//! request, a mismatch found by [`Eeprom::verify_checksum`] is reported and left alone.

use crate::bus::Bus;
use crate::error::{Error, IcogsResult};
use crate::register::eeprom;
use crate::session::{Device, Session};
use embedded_hal_async::delay::DelayNs;

/// Board-specific values written by [`Eeprom::write_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EepromDefaults {
    /// I2C address of the sensor on the board
    pub sensor_address: u8,
    pub sensor_type: [u8; 2],
}

impl Default for EepromDefaults {
    /// The Ts.1 humidity and temperature board.
    fn default() -> Self {
        Self {
            sensor_address: 0x5F,
            sensor_type: [0x03, 0x01],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Checksum {
    pub high: u8,
    pub low: u8,
}

impl Checksum {
    pub fn value(&self) -> u16 {
        u16::from_be_bytes([self.high, self.low])
    }
}

/// Sum of bytes 0x00..0x80 of `image`, the two checksum bytes counted as zero, modulo 65536.
///
/// Shorter images are summed as far as they go.
pub fn checksum(image: &[u8]) -> Checksum {
    let sum = image
        .iter()
        .take(eeprom::CHECKSUM_SPAN)
        .enumerate()
        .filter(|(address, _)| {
            *address != eeprom::CHECKSUM_HIGH as usize && *address != eeprom::CHECKSUM_LOW as usize
        })
        .fold(0u16, |sum, (_, byte)| sum.wrapping_add(*byte as u16));

    let [high, low] = sum.to_be_bytes();
    Checksum { high, low }
}

pub struct Eeprom<'a, B, D> {
    session: &'a mut Session<B, D>,
    device: Device,
}

impl<'a, B, D> Eeprom<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    pub(crate) fn new(session: &'a mut Session<B, D>, device: Device) -> Self {
        Self { session, device }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    async fn read(&mut self, address: u8) -> IcogsResult<u8, B::Error> {
        self.session.read_register(self.device, address).await
    }

    async fn write(&mut self, address: u8, value: u8) -> IcogsResult<(), B::Error> {
        self.session.write_verified(self.device, address, value).await
    }

    async fn write_all(&mut self, start: u8, values: &[u8]) -> IcogsResult<(), B::Error> {
        for (offset, value) in values.iter().enumerate() {
            self.write(start + offset as u8, *value).await?;
        }

        Ok(())
    }

    /// Memory map version as (major, minor).
    pub async fn map_version(&mut self) -> IcogsResult<(u8, u8), B::Error> {
        let major = self.read(eeprom::MAP_VERSION_MAJOR).await?;
        let minor = self.read(eeprom::MAP_VERSION_MINOR).await?;

        Ok((major, minor))
    }

    pub async fn bus_type(&mut self) -> IcogsResult<u8, B::Error> {
        self.read(eeprom::BUS_TYPE).await
    }

    pub async fn sensor_address(&mut self) -> IcogsResult<u8, B::Error> {
        self.read(eeprom::SENSOR_ADDRESS).await
    }

    pub async fn sensor_type(&mut self) -> IcogsResult<[u8; 2], B::Error> {
        let high = self.read(eeprom::SENSOR_TYPE_HIGH).await?;
        let low = self.read(eeprom::SENSOR_TYPE_LOW).await?;

        Ok([high, low])
    }

    pub async fn manufacturer_id(&mut self) -> IcogsResult<u8, B::Error> {
        self.read(eeprom::MANUFACTURER_ID).await
    }

    pub async fn device_id(&mut self) -> IcogsResult<u8, B::Error> {
        self.read(eeprom::DEVICE_ID).await
    }

    /// Factory-programmed unique ID, most significant byte first.
    pub async fn uuid(&mut self) -> IcogsResult<u32, B::Error> {
        let uuid = self.session.read_raw(self.device, &eeprom::UUID).await?.count as u32;
        info!("eeprom uuid {=u32:x}", uuid);

        Ok(uuid)
    }

    /// Calibration block `index` (0..6). Other indices fail with [`Error::UnsupportedOperation`].
    pub async fn calibration_block(&mut self, index: usize) -> IcogsResult<[u8; 16], B::Error> {
        let start = eeprom::calibration_block(index).ok_or(Error::UnsupportedOperation)?;

        let mut block = [0u8; eeprom::CALIBRATION_BLOCK_LEN];
        self.session.read_registers(self.device, start, &mut block).await?;

        Ok(block)
    }

    pub async fn write_calibration_block(&mut self, index: usize, block: &[u8; 16]) -> IcogsResult<(), B::Error> {
        let start = eeprom::calibration_block(index).ok_or(Error::UnsupportedOperation)?;

        self.write_all(start, block).await
    }

    /// The four user bytes at 0x36..=0x39.
    pub async fn scratch(&mut self) -> IcogsResult<[u8; 4], B::Error> {
        let mut data = [0u8; eeprom::SCRATCH_LEN];
        self.session
            .read_registers(self.device, eeprom::SCRATCH_START, &mut data)
            .await?;

        Ok(data)
    }

    pub async fn write_scratch(&mut self, data: &[u8; 4]) -> IcogsResult<(), B::Error> {
        self.write_all(eeprom::SCRATCH_START, data).await
    }

    /// Bytes covered by the checksum.
    pub async fn read_image(&mut self) -> IcogsResult<[u8; eeprom::CHECKSUM_SPAN], B::Error> {
        let mut image = [0u8; eeprom::CHECKSUM_SPAN];
        self.session.read_registers(self.device, 0x00, &mut image).await?;

        Ok(image)
    }

    pub async fn compute_checksum(&mut self) -> IcogsResult<Checksum, B::Error> {
        Ok(checksum(&self.read_image().await?))
    }

    pub async fn stored_checksum(&mut self) -> IcogsResult<Checksum, B::Error> {
        let stored = self.session.read_raw(self.device, &eeprom::CHECKSUM).await?.count as u16;
        let [high, low] = stored.to_be_bytes();

        Ok(Checksum { high, low })
    }

    /// Computes the checksum of the current contents and stores it.
    pub async fn write_checksum(&mut self) -> IcogsResult<Checksum, B::Error> {
        let computed = self.compute_checksum().await?;
        self.write(eeprom::CHECKSUM_HIGH, computed.high).await?;
        self.write(eeprom::CHECKSUM_LOW, computed.low).await?;

        info!("eeprom checksum written: {=u16:#x}", computed.value());
        Ok(computed)
    }

    /// Compares the stored checksum with one computed from the contents.
    pub async fn verify_checksum(&mut self) -> IcogsResult<Checksum, B::Error> {
        let computed = self.compute_checksum().await?;
        let stored = self.stored_checksum().await?;

        if stored != computed {
            warn!("eeprom checksum mismatch: stored {=u16:#x}, computed {=u16:#x}", stored.value(), computed.value());
            return Err(Error::ChecksumMismatch {
                stored: stored.value(),
                computed: computed.value(),
            });
        }

        Ok(computed)
    }

    /// Restores the memory map defaults: map version 0.2, I2C bus, the board's sensor address and
    /// type, blank reserved bytes and cleared calibration blocks. Finishes with a fresh checksum.
    pub async fn write_defaults(&mut self, defaults: &EepromDefaults) -> IcogsResult<Checksum, B::Error> {
        self.write_all(eeprom::MAP_VERSION_MAJOR, &eeprom::MAP_VERSION_VALUE).await?;
        self.write(eeprom::BUS_TYPE, eeprom::BUS_TYPE_I2C).await?;
        self.write(eeprom::SENSOR_ADDRESS, defaults.sensor_address).await?;

        for (first, last) in eeprom::BLANKS {
            for address in first..=last {
                self.write(address, eeprom::BLANK).await?;
            }
        }

        self.write_all(eeprom::SENSOR_TYPE_HIGH, &defaults.sensor_type).await?;

        let blank = [eeprom::BLANK; eeprom::CALIBRATION_BLOCK_LEN];
        for index in 0..eeprom::CALIBRATION_BLOCKS {
            self.write_calibration_block(index, &blank).await?;
        }

        info!("eeprom defaults written");
        self.write_checksum().await
    }

    /// All 256 bytes.
    pub async fn dump(&mut self) -> IcogsResult<[u8; 256], B::Error> {
        self.session.dump(self.device).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::testing::{Behaviour, FakeBus, FakeDelay};

    const ADDRESS: u8 = eeprom::DEFAULT_ADDRESS;

    fn session(bus: FakeBus) -> Session<FakeBus, FakeDelay> {
        Session::new(bus, FakeDelay::new(), Timing::immediate())
    }

    #[test]
    fn checksum_of_blank_image() {
        assert_eq!(Checksum { high: 0, low: 0 }, checksum(&[0u8; 256]));
    }

    #[test]
    fn checksum_ignores_its_own_bytes_and_upper_half() {
        let mut image = [0xFFu8; 256];
        image[0x80..].fill(0x11);
        // 126 * 0xFF
        assert_eq!(Checksum { high: 0x7D, low: 0x82 }, checksum(&image));

        image[eeprom::CHECKSUM_HIGH as usize] = 0x00;
        image[eeprom::CHECKSUM_LOW as usize] = 0x00;
        assert_eq!(0x7D82, checksum(&image).value());
    }

    #[test]
    fn checksum_sees_every_covered_byte() {
        let blank = checksum(&[0u8; 0x80]);
        for address in (0..0x80).filter(|a| *a != 0x0E && *a != 0x0F) {
            let mut image = [0u8; 0x80];
            image[address] = 1;
            assert_ne!(blank, checksum(&image));
        }
    }

    #[tokio::test]
    async fn defaults_for_ts1() {
        let mut bus = FakeBus::new();
        bus.with_registers(ADDRESS, eeprom::CALIBRATION_START, &[0xAA; 16]);
        let mut session = session(bus);
        let mut rom = session.eeprom();

        let written = rom.write_defaults(&EepromDefaults::default()).await.unwrap();
        // 0x02 + 0x01 + 0x5F + 0x03 + 0x01
        assert_eq!(Checksum { high: 0x00, low: 0x66 }, written);
        assert_eq!(Ok(written), rom.verify_checksum().await);
        assert_eq!(Ok((0, 2)), rom.map_version().await);
        assert_eq!(Ok([0x03, 0x01]), rom.sensor_type().await);
        assert_eq!(Ok([0u8; 16]), rom.calibration_block(0).await);

        let (bus, _) = session.release();
        assert_eq!(0x5F, bus.register(ADDRESS, eeprom::SENSOR_ADDRESS));
        assert_eq!(0x01, bus.register(ADDRESS, eeprom::BUS_TYPE));
        assert_eq!(1, bus.writes_to(ADDRESS, 0x7F));
        assert_eq!(0, bus.writes_to(ADDRESS, 0x80));
    }

    #[tokio::test]
    async fn checksum_mismatch_is_not_repaired() {
        let mut bus = FakeBus::new();
        bus.with_registers(ADDRESS, 0x00, &[0x00, 0x02]);
        bus.with_registers(ADDRESS, eeprom::CHECKSUM_HIGH, &[0x12, 0x34]);
        let mut session = session(bus);

        assert_eq!(
            Err(Error::ChecksumMismatch { stored: 0x1234, computed: 0x0002 }),
            session.eeprom().verify_checksum().await
        );
        assert_eq!(
            Ok(Checksum { high: 0x12, low: 0x34 }),
            session.eeprom().stored_checksum().await
        );

        let (bus, _) = session.release();
        assert_eq!(0, bus.writes_to(ADDRESS, eeprom::CHECKSUM_HIGH));
        assert_eq!(0x12, bus.register(ADDRESS, eeprom::CHECKSUM_HIGH));
    }

    #[tokio::test]
    async fn factory_data() {
        let mut bus = FakeBus::new();
        bus.with_registers(ADDRESS, eeprom::MANUFACTURER_ID, &[0x29, 0x41, 0x01, 0x23, 0x45, 0x67]);
        let mut session = session(bus);
        let mut rom = session.eeprom();

        assert_eq!(Ok(0x29), rom.manufacturer_id().await);
        assert_eq!(Ok(0x41), rom.device_id().await);
        assert_eq!(Ok(0x0123_4567), rom.uuid().await);
    }

    #[tokio::test]
    async fn scratch_round_trip_and_failed_write() {
        let mut session = session(FakeBus::new());

        session.eeprom().write_scratch(&[1, 2, 3, 4]).await.unwrap();
        assert_eq!(Ok([1, 2, 3, 4]), session.eeprom().scratch().await);

        let mut bus = FakeBus::new();
        bus.with_behaviour(ADDRESS, eeprom::SCRATCH_START + 1, Behaviour::Sticky);
        let mut session = self::session(bus);
        assert_eq!(
            Err(Error::VerifyFailed { register: eeprom::SCRATCH_START + 1, expected: 2, observed: 0 }),
            session.eeprom().write_scratch(&[1, 2, 3, 4]).await
        );
    }

    #[tokio::test]
    async fn calibration_block_index_is_bounded() {
        let mut session = session(FakeBus::new());

        assert_eq!(
            Err(Error::UnsupportedOperation),
            session.eeprom().calibration_block(eeprom::CALIBRATION_BLOCKS).await
        );
    }
}
