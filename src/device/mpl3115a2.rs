//! MPL3115A2 barometric pressure, altitude and temperature sensor.
//!
//! OUT_P holds pressure, altitude or raw counts depending on CTRL_REG1. Reading a quantity the
//! current configuration does not produce fails with [`Error::UnsupportedOperation`].

use crate::bus::Bus;
use crate::error::{Error, IcogsResult};
use crate::register::mpl3115a2::{self, MeasurementMode, OutputMode, Oversampling};
use crate::session::{CancelToken, Device, Mode, Session};
use embedded_hal_async::delay::DelayNs;

pub struct Mpl3115a2<'a, B, D> {
    session: &'a mut Session<B, D>,
    device: Device,
}

impl<'a, B, D> Mpl3115a2<'a, B, D>
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

    pub async fn set_mode(&mut self, mode: Mode) -> IcogsResult<(), B::Error> {
        self.session.set_mode(self.device, mode).await
    }

    pub async fn measurement_mode(&mut self) -> IcogsResult<MeasurementMode, B::Error> {
        self.session.read_as(self.device, mpl3115a2::ALT).await
    }

    pub async fn set_measurement_mode(&mut self, mode: MeasurementMode) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mpl3115a2::ALT, mode.into()).await
    }

    pub async fn output_mode(&mut self) -> IcogsResult<OutputMode, B::Error> {
        self.session.read_as(self.device, mpl3115a2::RAW).await
    }

    pub async fn set_output_mode(&mut self, mode: OutputMode) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mpl3115a2::RAW, mode.into()).await
    }

    pub async fn oversampling(&mut self) -> IcogsResult<Oversampling, B::Error> {
        self.session.read_as(self.device, mpl3115a2::OS).await
    }

    pub async fn set_oversampling(&mut self, oversampling: Oversampling) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mpl3115a2::OS, oversampling.into()).await
    }

    /// Raise data-ready events for new pressure and temperature samples.
    pub async fn set_data_ready_events(&mut self, enabled: bool) -> IcogsResult<(), B::Error> {
        for flag in [mpl3115a2::PDEFE, mpl3115a2::TDEFE, mpl3115a2::DREM] {
            self.session.update(self.device, flag, enabled as u8).await?;
        }

        Ok(())
    }

    /// Sea-level reference pressure used by the altimeter, in Pa.
    pub async fn barometric_input(&mut self) -> IcogsResult<f32, B::Error> {
        let high = self.session.read_bits(self.device, mpl3115a2::BAR_IN_HIGH).await?;
        let low = self.session.read_bits(self.device, mpl3115a2::BAR_IN_LOW).await?;

        Ok(u16::from_be_bytes([high, low]) as f32 * mpl3115a2::BAR_IN_PA_PER_LSB)
    }

    /// Sets the sea-level reference pressure in units of 2 Pa.
    pub async fn set_barometric_input(&mut self, counts: u16) -> IcogsResult<(), B::Error> {
        let [high, low] = counts.to_be_bytes();
        self.session.update(self.device, mpl3115a2::BAR_IN_HIGH, high).await?;
        self.session.update(self.device, mpl3115a2::BAR_IN_LOW, low).await
    }

    async fn require(&mut self, wanted: MeasurementMode) -> IcogsResult<(), B::Error> {
        if self.output_mode().await? == OutputMode::Raw || self.measurement_mode().await? != wanted {
            return Err(Error::UnsupportedOperation);
        }

        Ok(())
    }

    /// Temperature in °C.
    pub async fn temperature(&mut self) -> IcogsResult<f32, B::Error> {
        Ok(self.session.read_raw(self.device, &mpl3115a2::TEMPERATURE).await?.value())
    }

    /// Pressure in Pa. Needs barometer mode with compensated output.
    pub async fn pressure(&mut self) -> IcogsResult<f32, B::Error> {
        self.require(MeasurementMode::Barometer).await?;

        Ok(self.session.read_raw(self.device, &mpl3115a2::PRESSURE).await?.value())
    }

    /// Altitude in m. Needs altimeter mode with compensated output.
    pub async fn altitude(&mut self) -> IcogsResult<f32, B::Error> {
        self.require(MeasurementMode::Altimeter).await?;

        Ok(self.session.read_raw(self.device, &mpl3115a2::ALTITUDE).await?.value())
    }

    #[cfg(feature = "uom")]
    pub async fn temperature_uom(&mut self) -> IcogsResult<uom::si::f32::ThermodynamicTemperature, B::Error> {
        use uom::si::thermodynamic_temperature::{degree_celsius, ThermodynamicTemperature};

        Ok(ThermodynamicTemperature::new::<degree_celsius>(self.temperature().await?))
    }

    #[cfg(feature = "uom")]
    pub async fn pressure_uom(&mut self) -> IcogsResult<uom::si::f32::Pressure, B::Error> {
        use uom::si::pressure::{pascal, Pressure};

        Ok(Pressure::new::<pascal>(self.pressure().await?))
    }

    #[cfg(feature = "uom")]
    pub async fn altitude_uom(&mut self) -> IcogsResult<uom::si::f32::Length, B::Error> {
        use uom::si::length::{meter, Length};

        Ok(Length::new::<meter>(self.altitude().await?))
    }

    /// Uncompensated 24-bit pressure counts. Only meaningful in raw output mode.
    pub async fn raw_pressure(&mut self) -> IcogsResult<u32, B::Error> {
        Ok(self.session.read_raw(self.device, &mpl3115a2::PRESSURE_RAW).await?.count as u32)
    }

    /// Pressure change since the previous sample, in Pa.
    pub async fn pressure_delta(&mut self) -> IcogsResult<f32, B::Error> {
        self.require(MeasurementMode::Barometer).await?;

        Ok(self.session.read_raw(self.device, &mpl3115a2::PRESSURE_DELTA).await?.value())
    }

    /// Altitude change since the previous sample, in m.
    pub async fn altitude_delta(&mut self) -> IcogsResult<f32, B::Error> {
        self.require(MeasurementMode::Altimeter).await?;

        Ok(self.session.read_raw(self.device, &mpl3115a2::ALTITUDE_DELTA).await?.value())
    }

    /// Temperature change since the previous sample, in °C.
    pub async fn temperature_delta(&mut self) -> IcogsResult<f32, B::Error> {
        if self.output_mode().await? == OutputMode::Raw {
            return Err(Error::UnsupportedOperation);
        }

        Ok(self.session.read_raw(self.device, &mpl3115a2::TEMPERATURE_DELTA).await?.value())
    }

    /// Waits until a new pressure/altitude and temperature sample is available.
    pub async fn wait_data_ready(&mut self, cancel: &CancelToken) -> IcogsResult<(), B::Error> {
        self.session.wait_data_ready(self.device, mpl3115a2::PTDR, cancel).await
    }

    /// Starts a conversion from Standby and waits for it to complete.
    pub async fn one_shot(&mut self, cancel: &CancelToken) -> IcogsResult<(), B::Error> {
        self.session.trigger(self.device, mpl3115a2::OST).await?;

        let max_polls = self.session.timing().data_ready_max_polls;
        self.session
            .poll_until(self.device, mpl3115a2::OST, max_polls, cancel, |busy| busy == 0)
            .await?;

        self.wait_data_ready(cancel).await
    }

    pub async fn software_reset(&mut self, cancel: &CancelToken) -> IcogsResult<(), B::Error> {
        self.session.software_reset(self.device, cancel).await
    }
}
