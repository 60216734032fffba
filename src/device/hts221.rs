//! HTS221 relative humidity and temperature sensor.

use crate::bus::Bus;
use crate::calibration::Hts221Calibration;
use crate::error::IcogsResult;
use crate::register::hts221::{self, HumidityAveraging, OutputDataRate, TemperatureAveraging};
use crate::session::{CancelToken, Device, Mode, Session};
use embedded_hal_async::delay::DelayNs;

/// One calibrated humidity and temperature reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Relative humidity in %
    pub humidity: f32,
    /// Temperature in °C
    pub temperature: f32,
}

#[cfg(feature = "uom")]
impl Measurement {
    pub fn humidity_uom(&self) -> uom::si::f32::Ratio {
        uom::si::ratio::Ratio::new::<uom::si::ratio::percent>(self.humidity)
    }

    pub fn temperature_uom(&self) -> uom::si::f32::ThermodynamicTemperature {
        uom::si::thermodynamic_temperature::ThermodynamicTemperature::new::<
            uom::si::thermodynamic_temperature::degree_celsius,
        >(self.temperature)
    }
}

pub struct Hts221<'a, B, D> {
    session: &'a mut Session<B, D>,
    device: Device,
}

impl<'a, B, D> Hts221<'a, B, D>
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

    pub async fn verify_identity(&mut self) -> IcogsResult<(), B::Error> {
        self.session.verify_identity(self.device).await
    }

    pub async fn mode(&mut self) -> IcogsResult<Mode, B::Error> {
        self.session.mode(self.device).await
    }

    /// Powers the device up (`Active`) or down (`Standby`) through CTRL_REG1.PD.
    pub async fn set_mode(&mut self, mode: Mode) -> IcogsResult<(), B::Error> {
        self.session.set_mode(self.device, mode).await
    }

    pub async fn temperature_averaging(&mut self) -> IcogsResult<TemperatureAveraging, B::Error> {
        self.session.read_as(self.device, hts221::AVGT).await
    }

    pub async fn set_temperature_averaging(&mut self, averaging: TemperatureAveraging) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, hts221::AVGT, averaging.into()).await
    }

    pub async fn humidity_averaging(&mut self) -> IcogsResult<HumidityAveraging, B::Error> {
        self.session.read_as(self.device, hts221::AVGH).await
    }

    pub async fn set_humidity_averaging(&mut self, averaging: HumidityAveraging) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, hts221::AVGH, averaging.into()).await
    }

    pub async fn output_data_rate(&mut self) -> IcogsResult<OutputDataRate, B::Error> {
        self.session.read_as(self.device, hts221::ODR).await
    }

    pub async fn set_output_data_rate(&mut self, rate: OutputDataRate) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, hts221::ODR, rate.into()).await
    }

    /// With block data update on, output registers are not updated until both bytes were read.
    pub async fn set_block_data_update(&mut self, enabled: bool) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, hts221::BDU, enabled as u8).await
    }

    /// Internal heater, used to drive off condensation.
    pub async fn set_heater(&mut self, enabled: bool) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, hts221::HEATER, enabled as u8).await
    }

    pub async fn set_data_ready_output(&mut self, enabled: bool) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, hts221::DRDY_EN, enabled as u8).await
    }

    /// Reads the factory calibration from registers 0x30..=0x3F.
    pub async fn calibration(&mut self) -> IcogsResult<Hts221Calibration, B::Error> {
        let mut block = [0u8; hts221::CALIBRATION_LEN];
        self.session
            .read_registers(self.device, hts221::CALIBRATION_START, &mut block)
            .await?;

        Ok(Hts221Calibration::from_registers(&block)?)
    }

    pub async fn raw_humidity(&mut self) -> IcogsResult<i16, B::Error> {
        let value = self.session.read_raw(self.device, &hts221::HUMIDITY_OUT).await?;

        Ok(value.count as i16)
    }

    pub async fn raw_temperature(&mut self) -> IcogsResult<i16, B::Error> {
        let value = self.session.read_raw(self.device, &hts221::TEMPERATURE_OUT).await?;

        Ok(value.count as i16)
    }

    /// Waits for fresh humidity and temperature data and converts it with `calibration`.
    pub async fn measure_with(
        &mut self,
        calibration: &Hts221Calibration,
        cancel: &CancelToken,
    ) -> IcogsResult<Measurement, B::Error> {
        self.session.wait_data_ready(self.device, hts221::H_DA, cancel).await?;
        self.session.wait_data_ready(self.device, hts221::T_DA, cancel).await?;

        let humidity = calibration.humidity(self.raw_humidity().await?)?;
        let temperature = calibration.temperature(self.raw_temperature().await?)?;
        debug!("hts221: {=f32} %rH, {=f32} C", humidity, temperature);

        Ok(Measurement { humidity, temperature })
    }

    /// Reads the calibration, then one measurement.
    pub async fn measure(&mut self, cancel: &CancelToken) -> IcogsResult<Measurement, B::Error> {
        let calibration = self.calibration().await?;

        self.measure_with(&calibration, cancel).await
    }

    /// Starts a single conversion and waits for its result. The device must be active with
    /// [`OutputDataRate::OneShot`].
    pub async fn one_shot(&mut self, cancel: &CancelToken) -> IcogsResult<Measurement, B::Error> {
        let calibration = self.calibration().await?;
        self.session.trigger(self.device, hts221::ONE_SHOT).await?;

        self.measure_with(&calibration, cancel).await
    }

    /// Relative humidity in %.
    pub async fn humidity(&mut self, cancel: &CancelToken) -> IcogsResult<f32, B::Error> {
        Ok(self.measure(cancel).await?.humidity)
    }

    /// Temperature in °C.
    pub async fn temperature(&mut self, cancel: &CancelToken) -> IcogsResult<f32, B::Error> {
        Ok(self.measure(cancel).await?.temperature)
    }

    /// Reloads the trimming parameters from flash through CTRL_REG2.BOOT.
    pub async fn reboot(&mut self, cancel: &CancelToken) -> IcogsResult<(), B::Error> {
        self.session.software_reset(self.device, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::error::Error;
    use crate::testing::{Behaviour, FakeBus, FakeDelay, Transaction};

    const ADDRESS: u8 = hts221::DEFAULT_ADDRESS;

    // 20 %rH @ 0, 80 %rH @ 10000, 10 °C @ 300, 35 °C @ 2800
    const CALIBRATION: [u8; 16] = [
        40, 160, 80, 0x18, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x10, 0x27, 0x2C, 0x01, 0xF0, 0x0A,
    ];

    fn calibrated_bus() -> FakeBus {
        let mut bus = FakeBus::new();
        bus.with_registers(ADDRESS, hts221::CALIBRATION_START, &CALIBRATION);
        // 5000 and 1550 counts
        bus.with_registers(ADDRESS, hts221::HUMIDITY_OUT_L, &[0x88, 0x13, 0x0E, 0x06]);
        bus
    }

    #[tokio::test]
    async fn measure_waits_for_both_flags() {
        let mut bus = calibrated_bus();
        bus.with_sequence(ADDRESS, hts221::STATUS_REG, &[0b00, 0b10, 0b01]);
        let mut session = Session::new(bus, FakeDelay::new(), Timing::immediate());

        let measurement = session.hts221().measure(&CancelToken::new()).await.unwrap();
        assert_eq!(Measurement { humidity: 50.0, temperature: 22.5 }, measurement);
    }

    #[tokio::test]
    async fn measure_times_out_without_data() {
        let mut session = Session::new(
            calibrated_bus(),
            FakeDelay::new(),
            Timing::immediate().data_ready_max_polls(3),
        );

        assert_eq!(Err(Error::Timeout), session.hts221().measure(&CancelToken::new()).await);
    }

    #[tokio::test]
    async fn degenerate_calibration() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, hts221::STATUS_REG, 0b11);
        let mut session = Session::new(bus, FakeDelay::new(), Timing::immediate());

        assert_eq!(
            Err(Error::CalibrationDegenerate),
            session.hts221().measure(&CancelToken::new()).await
        );
    }

    #[tokio::test]
    async fn one_shot_sets_self_clearing_bit() {
        let mut bus = calibrated_bus();
        bus.with_register(ADDRESS, hts221::STATUS_REG, 0b11);
        bus.with_behaviour(ADDRESS, hts221::CTRL_REG2, Behaviour::AutoClear { mask: 0x01 });
        let mut session = Session::new(bus, FakeDelay::new(), Timing::immediate());

        let measurement = session.hts221().one_shot(&CancelToken::new()).await.unwrap();
        assert_eq!(22.5, measurement.temperature);

        let (bus, _) = session.release();
        assert!(bus.log().contains(&Transaction::Write {
            device: ADDRESS,
            register: hts221::CTRL_REG2,
            value: 0x01
        }));
        assert_eq!(0, bus.register(ADDRESS, hts221::CTRL_REG2));
    }

    #[tokio::test]
    async fn typed_configuration() {
        let mut bus = FakeBus::new();
        bus.with_register(ADDRESS, hts221::AV_CONF, 0x1B);
        let mut session = Session::new(bus, FakeDelay::new(), Timing::immediate());
        let mut sensor = session.hts221();

        assert_eq!(Ok(TemperatureAveraging::X16), sensor.temperature_averaging().await);
        assert_eq!(Ok(HumidityAveraging::X32), sensor.humidity_averaging().await);

        sensor.set_temperature_averaging(TemperatureAveraging::X256).await.unwrap();
        sensor.set_output_data_rate(OutputDataRate::R12p5Hz).await.unwrap();
        sensor.set_block_data_update(true).await.unwrap();
        sensor.set_mode(Mode::Active).await.unwrap();

        assert_eq!(Ok(OutputDataRate::R12p5Hz), sensor.output_data_rate().await);
        assert_eq!(Ok(Mode::Active), sensor.mode().await);

        let (bus, _) = session.release();
        assert_eq!(0x3B, bus.register(ADDRESS, hts221::AV_CONF));
        assert_eq!(0x87, bus.register(ADDRESS, hts221::CTRL_REG1));
    }

    #[tokio::test]
    async fn identity_at_alternate_address() {
        let mut bus = FakeBus::new();
        bus.with_register(0x5E, hts221::WHO_AM_I, hts221::WHO_AM_I_VALUE);
        let mut session = Session::new(bus, FakeDelay::new(), Timing::immediate());

        session.hts221_at(0x5E).verify_identity().await.unwrap();
        assert!(session.hts221().verify_identity().await.is_err());
    }
}
