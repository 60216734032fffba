//! ISL29023 ambient and infrared light sensor.

use crate::bus::Bus;
use crate::calibration::{lux, IR_FULL_SCALE, LIGHT_ADC_COUNTS, LIGHT_FULL_SCALE};
use crate::error::{Error, IcogsResult};
use crate::register::isl29023::{self, OperationMode, Persist, Range, Resolution};
use crate::session::{Device, Mode, Session};
use embedded_hal_async::delay::DelayNs;

pub struct Isl29023<'a, B, D> {
    session: &'a mut Session<B, D>,
    device: Device,
}

impl<'a, B, D> Isl29023<'a, B, D>
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

    pub async fn mode(&mut self) -> IcogsResult<Mode, B::Error> {
        self.session.mode(self.device).await
    }

    /// `Active` selects continuous visible-light conversion, `Standby` powers down.
    pub async fn set_mode(&mut self, mode: Mode) -> IcogsResult<(), B::Error> {
        self.session.set_mode(self.device, mode).await
    }

    pub async fn operation_mode(&mut self) -> IcogsResult<OperationMode, B::Error> {
        self.session.read_as(self.device, isl29023::OP).await
    }

    /// Single conversions power the device down again on their own, so they are not read back.
    pub async fn set_operation_mode(&mut self, mode: OperationMode) -> IcogsResult<(), B::Error> {
        match mode {
            OperationMode::AlsOnce | OperationMode::IrOnce => {
                self.session.write_bits(self.device, isl29023::OP, mode.into()).await
            }
            _ => self.session.update(self.device, isl29023::OP, mode.into()).await,
        }
    }

    pub async fn range(&mut self) -> IcogsResult<Range, B::Error> {
        self.session.read_as(self.device, isl29023::RANGE).await
    }

    pub async fn set_range(&mut self, range: Range) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, isl29023::RANGE, range.into()).await
    }

    pub async fn resolution(&mut self) -> IcogsResult<Resolution, B::Error> {
        self.session.read_as(self.device, isl29023::RES).await
    }

    pub async fn set_resolution(&mut self, resolution: Resolution) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, isl29023::RES, resolution.into()).await
    }

    pub async fn persist(&mut self) -> IcogsResult<Persist, B::Error> {
        self.session.read_as(self.device, isl29023::PRST).await
    }

    pub async fn set_persist(&mut self, persist: Persist) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, isl29023::PRST, persist.into()).await
    }

    /// Whether the threshold interrupt has been raised.
    pub async fn interrupt_flag(&mut self) -> IcogsResult<bool, B::Error> {
        Ok(self.session.read_bits(self.device, isl29023::FLAG).await? == 1)
    }

    /// The last conversion in ADC counts, visible or infrared depending on the operation mode.
    pub async fn raw_data(&mut self) -> IcogsResult<u16, B::Error> {
        let value = self.session.read_raw(self.device, &isl29023::DATA).await?;

        Ok(value.count as u16)
    }

    /// The last infrared conversion in ADC counts. Fails with [`Error::UnsupportedOperation`]
    /// while a visible-light mode is selected.
    pub async fn infrared(&mut self) -> IcogsResult<u16, B::Error> {
        if !self.operation_mode().await?.is_infrared() {
            return Err(Error::UnsupportedOperation);
        }

        self.raw_data().await
    }

    /// The last conversion scaled by range and resolution.
    ///
    /// In the infrared modes the full scale is fixed at 65535 whatever the range.
    pub async fn lux(&mut self) -> IcogsResult<f32, B::Error> {
        let mode = self.operation_mode().await?;
        let full_scale = if mode.is_infrared() {
            IR_FULL_SCALE
        } else {
            let range = self.session.read_bits(self.device, isl29023::RANGE).await?;
            LIGHT_FULL_SCALE.lookup(range)?
        };

        let resolution = self.session.read_bits(self.device, isl29023::RES).await?;
        let adc_counts = LIGHT_ADC_COUNTS.lookup(resolution)?;

        let count = self.raw_data().await?;
        let value = lux(full_scale, adc_counts, count);
        debug!("isl29023: {=u16} counts, {=f32} lux", count, value);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::register::{DeviceFamily, UnknownFieldValue};
    use crate::testing::{FakeBus, FakeDelay};

    const ADDRESS: u8 = isl29023::DEFAULT_ADDRESS;

    fn session(bus: FakeBus) -> Session<FakeBus, FakeDelay> {
        Session::new(bus, FakeDelay::new(), Timing::immediate())
    }

    #[tokio::test]
    async fn visible_light_lux() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, isl29023::COMMAND1, 0b1010_0000);
        bus.with_register(ADDRESS, isl29023::COMMAND2, 0b0000_0001);
        bus.with_registers(ADDRESS, isl29023::DATA_LSB, &[0x00, 0x80]);
        let mut session = session(bus);

        // 4000 lux over 65536 counts
        assert_eq!(Ok(2000.0), session.isl29023().lux().await);
    }

    #[tokio::test]
    async fn infrared_ignores_range() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, isl29023::COMMAND1, 0b1100_0000);
        bus.with_register(ADDRESS, isl29023::COMMAND2, 0b0000_1111);
        bus.with_registers(ADDRESS, isl29023::DATA_LSB, &[0x10, 0x00]);
        let mut session = session(bus);
        let mut sensor = session.isl29023();

        assert_eq!(Ok(16), sensor.infrared().await);
        assert_eq!(Ok(65535.0), sensor.lux().await);
    }

    #[tokio::test]
    async fn infrared_needs_infrared_mode() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, isl29023::COMMAND1, 0b1010_0000);
        bus.with_registers(ADDRESS, isl29023::DATA_LSB, &[0x10, 0x00]);
        let mut session = session(bus);
        let mut sensor = session.isl29023();

        assert_eq!(Err(Error::UnsupportedOperation), sensor.infrared().await);
        assert_eq!(Ok(16), sensor.raw_data().await);
    }

    #[tokio::test]
    async fn reserved_operation_mode() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, isl29023::COMMAND1, 0b1110_0000);
        let mut session = session(bus);

        assert_eq!(
            Err(Error::UnknownFieldValue(UnknownFieldValue {
                register: isl29023::COMMAND1,
                bit_offset: 5,
                raw: 0b111
            })),
            session.isl29023().lux().await
        );
    }

    #[tokio::test]
    async fn active_means_continuous_visible_light() {
        let mut session = session(FakeBus::new());
        let mut sensor = session.isl29023();

        assert_eq!(Ok(Mode::Standby), sensor.mode().await);
        sensor.set_mode(Mode::Active).await.unwrap();
        assert_eq!(Ok(OperationMode::AlsContinuous), sensor.operation_mode().await);

        // IR continuous counts as active too
        sensor.set_operation_mode(OperationMode::IrContinuous).await.unwrap();
        assert_eq!(Ok(Mode::Active), sensor.mode().await);
        sensor.set_mode(Mode::Standby).await.unwrap();
        assert_eq!(Ok(OperationMode::PowerDown), sensor.operation_mode().await);
    }

    #[tokio::test]
    async fn range_resolution_and_persist() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, isl29023::COMMAND1, 0b0000_0100);
        let mut session = session(bus);
        let mut sensor = session.isl29023();

        sensor.set_range(Range::Lux64000).await.unwrap();
        sensor.set_resolution(Resolution::Bits12).await.unwrap();
        sensor.set_persist(Persist::Cycles16).await.unwrap();

        assert_eq!(Ok(Range::Lux64000), sensor.range().await);
        assert_eq!(Ok(Resolution::Bits12), sensor.resolution().await);
        assert_eq!(Ok(Persist::Cycles16), sensor.persist().await);
        assert_eq!(Ok(true), sensor.interrupt_flag().await);

        let (bus, _) = session.release();
        assert_eq!(0b0000_0111, bus.register(ADDRESS, isl29023::COMMAND2));
        assert_eq!(0b0000_0111, bus.register(ADDRESS, isl29023::COMMAND1));
    }

    #[tokio::test]
    async fn identity_is_not_available() {
        let mut session = session(FakeBus::new());

        assert_eq!(
            Err(Error::UnsupportedOperation),
            session.verify_identity(Device::new(DeviceFamily::Isl29023)).await
        );
    }
}
