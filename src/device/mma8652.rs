//! MMA8652FC 3-axis accelerometer.
//!
//! Configuration only sticks in Standby, writes attempted while active fail with
//! [`Error::RequiresStandby`]. Readings are scaled by the current full-scale range.

use crate::bus::Bus;
use crate::calibration::ACCEL_G_PER_LSB;
use crate::config::SelfTestConfig;
use crate::error::{Error, IcogsResult};
use crate::field::InvalidFieldValue;
use crate::register::mma8652::{self, DataRate, FifoMode, FullScale, PowerScheme, SystemMode};
use crate::register::ModeControl;
use crate::session::{CancelToken, Device, Mode, Session};
use embedded_hal_async::delay::DelayNs;

/// Acceleration in g.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[cfg(feature = "uom")]
impl Acceleration {
    /// X, Y and Z as SI quantities.
    pub fn into_uom(self) -> [uom::si::f32::Acceleration; 3] {
        use uom::si::acceleration::{standard_gravity, Acceleration};

        [self.x, self.y, self.z].map(Acceleration::new::<standard_gravity>)
    }
}

/// Sign-extended 12-bit output counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawAcceleration {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawAcceleration {
    fn to_array(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    Pass,
    Fail,
}

/// Outcome of the self-test on one axis, in counts at 2g.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisVerdict {
    pub baseline: f32,
    pub perturbed: f32,
    pub delta: f32,
    pub threshold: f32,
    pub verdict: Verdict,
}

/// Self-test outcome for X, Y and Z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestReport {
    pub axes: [AxisVerdict; 3],
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.axes.iter().all(|axis| axis.verdict == Verdict::Pass)
    }
}

/// Compares averaged outputs with self-test off and on.
///
/// An axis passes when `perturbed - baseline` exceeds its nominal change times the threshold
/// factor.
pub fn evaluate_self_test(baseline: [f32; 3], perturbed: [f32; 3], config: &SelfTestConfig) -> SelfTestReport {
    let verdict = |axis: usize| {
        let delta = perturbed[axis] - baseline[axis];
        let threshold = config.threshold(axis);

        AxisVerdict {
            baseline: baseline[axis],
            perturbed: perturbed[axis],
            delta,
            threshold,
            verdict: if delta > threshold { Verdict::Pass } else { Verdict::Fail },
        }
    };

    SelfTestReport { axes: [verdict(0), verdict(1), verdict(2)] }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapAxis {
    X,
    Y,
    Z,
    /// No axis flag identified the event.
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapDirection {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapEvent {
    pub axis: TapAxis,
    pub direction: TapDirection,
    pub double: bool,
    /// PULSE_SRC as read
    pub source: u8,
}

impl TapEvent {
    /// Decodes PULSE_SRC. The Z flag wins over Y, Y over X. Any polarity bit set means negative.
    pub fn decode(source: u8) -> Self {
        let axis = if mma8652::AXZ.decode(source) == 1 {
            TapAxis::Z
        } else if mma8652::AXY.decode(source) == 1 {
            TapAxis::Y
        } else if mma8652::AXX.decode(source) == 1 {
            TapAxis::X
        } else {
            TapAxis::Multiple
        };

        let direction = if mma8652::POL.decode(source) == 0 {
            TapDirection::Positive
        } else {
            TapDirection::Negative
        };

        Self {
            axis,
            direction,
            double: mma8652::DPE.decode(source) == 1,
            source,
        }
    }
}

/// Pulse detection parameters, all in raw register units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapConfig {
    pub double: bool,
    /// X, Y and Z thresholds, 7 bits each
    pub threshold: [u8; 3],
    pub time_limit: u8,
    pub latency: u8,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            double: true,
            threshold: [0x20; 3],
            time_limit: 0x28,
            latency: 0x28,
        }
    }
}

pub struct Mma8652<'a, B, D> {
    session: &'a mut Session<B, D>,
    device: Device,
}

impl<'a, B, D> Mma8652<'a, B, D>
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

    pub async fn system_mode(&mut self) -> IcogsResult<SystemMode, B::Error> {
        self.session.read_as(self.device, mma8652::SYSMOD_MODE).await
    }

    pub async fn full_scale(&mut self) -> IcogsResult<FullScale, B::Error> {
        self.session.read_as(self.device, mma8652::FS).await
    }

    pub async fn set_full_scale(&mut self, full_scale: FullScale) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::FS, full_scale.into()).await
    }

    pub async fn data_rate(&mut self) -> IcogsResult<DataRate, B::Error> {
        self.session.read_as(self.device, mma8652::DR).await
    }

    pub async fn set_data_rate(&mut self, rate: DataRate) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::DR, rate.into()).await
    }

    pub async fn fifo_mode(&mut self) -> IcogsResult<FifoMode, B::Error> {
        self.session.read_as(self.device, mma8652::F_MODE).await
    }

    pub async fn set_fifo_mode(&mut self, mode: FifoMode) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::F_MODE, mode.into()).await
    }

    pub async fn fifo_watermark(&mut self) -> IcogsResult<u8, B::Error> {
        self.session.read_bits(self.device, mma8652::F_WMRK).await
    }

    /// Sample count (0..=32) that raises the FIFO watermark flag.
    pub async fn set_fifo_watermark(&mut self, samples: u8) -> IcogsResult<(), B::Error> {
        if samples > mma8652::FIFO_DEPTH {
            let field = mma8652::F_WMRK;
            return Err(InvalidFieldValue::new(samples, field.bit_offset, field.width).into());
        }

        self.session.update(self.device, mma8652::F_WMRK, samples).await
    }

    /// Oversampling scheme while awake.
    pub async fn power_scheme(&mut self) -> IcogsResult<PowerScheme, B::Error> {
        self.session.read_as(self.device, mma8652::MODS).await
    }

    pub async fn set_power_scheme(&mut self, scheme: PowerScheme) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::MODS, scheme.into()).await
    }

    /// Oversampling scheme while auto-sleeping.
    pub async fn sleep_power_scheme(&mut self) -> IcogsResult<PowerScheme, B::Error> {
        self.session.read_as(self.device, mma8652::SMODS).await
    }

    pub async fn set_sleep_power_scheme(&mut self, scheme: PowerScheme) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::SMODS, scheme.into()).await
    }

    pub async fn set_auto_sleep(&mut self, enabled: bool) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::SLPE, enabled as u8).await
    }

    /// Output high-pass filtered data.
    pub async fn set_high_pass_output(&mut self, enabled: bool) -> IcogsResult<(), B::Error> {
        self.session.update(self.device, mma8652::HPF_OUT, enabled as u8).await
    }

    pub async fn raw_acceleration(&mut self) -> IcogsResult<RawAcceleration, B::Error> {
        let x = self.session.read_raw(self.device, &mma8652::OUT_X).await?;
        let y = self.session.read_raw(self.device, &mma8652::OUT_Y).await?;
        let z = self.session.read_raw(self.device, &mma8652::OUT_Z).await?;

        Ok(RawAcceleration {
            x: x.count as i16,
            y: y.count as i16,
            z: z.count as i16,
        })
    }

    async fn g_per_count(&mut self) -> IcogsResult<f32, B::Error> {
        let full_scale = self.session.read_bits(self.device, mma8652::FS).await?;

        Ok(ACCEL_G_PER_LSB.lookup(full_scale)?)
    }

    /// The current output registers in g, without waiting for new data.
    pub async fn acceleration(&mut self) -> IcogsResult<Acceleration, B::Error> {
        let scale = self.g_per_count().await?;
        let raw = self.raw_acceleration().await?;

        Ok(Acceleration {
            x: raw.x as f32 * scale,
            y: raw.y as f32 * scale,
            z: raw.z as f32 * scale,
        })
    }

    /// Waits for a new sample on all three axes, then reads it in g.
    pub async fn wait_acceleration(&mut self, cancel: &CancelToken) -> IcogsResult<Acceleration, B::Error> {
        self.session.wait_data_ready(self.device, mma8652::ZYXDR, cancel).await?;

        self.acceleration().await
    }

    /// Mean counts over `samples` fresh samples. At least one is taken.
    async fn average_counts(&mut self, samples: u16, cancel: &CancelToken) -> IcogsResult<[f32; 3], B::Error> {
        let samples = samples.max(1);
        let mut sum = [0.0f32; 3];
        for _ in 0..samples {
            self.session.wait_data_ready(self.device, mma8652::ZYXDR, cancel).await?;

            let sample = self.raw_acceleration().await?.to_array();
            for (total, value) in sum.iter_mut().zip(sample) {
                *total += value;
            }
        }

        let count = samples as f32;
        Ok(sum.map(|total| total / count))
    }

    /// Mean of `samples` fresh samples in g. Zero is treated as one sample.
    pub async fn average_acceleration(
        &mut self,
        samples: u16,
        cancel: &CancelToken,
    ) -> IcogsResult<Acceleration, B::Error> {
        let scale = self.g_per_count().await?;
        let [x, y, z] = self.average_counts(samples, cancel).await?;

        Ok(Acceleration { x: x * scale, y: y * scale, z: z * scale })
    }

    /// Runs the built-in self-test.
    ///
    /// Only allowed from Standby. The range is forced to 2g, averages are taken with the
    /// electrostatic actuation off and on, and the previous range is restored. The device is
    /// left in Standby with self-test off, also when the sequence fails halfway.
    pub async fn self_test(
        &mut self,
        config: &SelfTestConfig,
        cancel: &CancelToken,
    ) -> IcogsResult<SelfTestReport, B::Error> {
        let control = self.device.map().mode.ok_or(Error::UnsupportedOperation)?;

        let current = self.session.mode(self.device).await?;
        if current != Mode::Standby {
            return Err(Error::InvalidTransition { from: current, to: Mode::SelfTest });
        }

        let range = self.session.read_bits(self.device, mma8652::FS).await?;
        let result = self.run_self_test(control, range, config, cancel).await;

        if result.is_err() {
            warn!("mma8652 self-test aborted, restoring standby");
            if self.session.write_mode(self.device, control, Mode::Standby).await.is_err() {
                warn!("mma8652 cleanup: standby not restored");
            }
            if self.session.write_bits(self.device, mma8652::ST, 0).await.is_err() {
                warn!("mma8652 cleanup: self-test bit not cleared");
            }
            if self.session.write_bits(self.device, mma8652::FS, range).await.is_err() {
                warn!("mma8652 cleanup: full-scale range not restored");
            }
        }

        result
    }

    async fn run_self_test(
        &mut self,
        control: ModeControl,
        range: u8,
        config: &SelfTestConfig,
        cancel: &CancelToken,
    ) -> IcogsResult<SelfTestReport, B::Error> {
        self.session.update(self.device, mma8652::FS, FullScale::G2.into()).await?;

        self.session.write_mode(self.device, control, Mode::Active).await?;
        let baseline = self.average_counts(config.samples, cancel).await?;
        self.session.write_mode(self.device, control, Mode::Standby).await?;

        self.session.update(self.device, mma8652::ST, 1).await?;
        self.session.write_mode(self.device, control, Mode::Active).await?;
        let perturbed = self.average_counts(config.samples, cancel).await?;
        self.session.write_mode(self.device, control, Mode::Standby).await?;
        self.session.update(self.device, mma8652::ST, 0).await?;

        self.session.update(self.device, mma8652::FS, range).await?;

        let report = evaluate_self_test(baseline, perturbed, config);
        info!(
            "mma8652 self-test: x {}, y {}, z {}",
            report.axes[0].verdict,
            report.axes[1].verdict,
            report.axes[2].verdict
        );

        Ok(report)
    }

    /// Resets every register to its power-on value and waits for CTRL_REG2.RST to clear.
    pub async fn software_reset(&mut self, cancel: &CancelToken) -> IcogsResult<(), B::Error> {
        self.session.software_reset(self.device, cancel).await
    }

    /// Sets up latched pulse detection on all axes. Needs Standby.
    pub async fn configure_tap(&mut self, config: &TapConfig) -> IcogsResult<(), B::Error> {
        let pulse = if config.double {
            mma8652::PULSE_CFG_DOUBLE
        } else {
            mma8652::PULSE_CFG_SINGLE
        };
        self.session
            .update(self.device, mma8652::PULSE_CFG_ALL, pulse | mma8652::PULSE_CFG_LATCH)
            .await?;

        let thresholds = [mma8652::PULSE_THS_X, mma8652::PULSE_THS_Y, mma8652::PULSE_THS_Z];
        for (field, threshold) in thresholds.into_iter().zip(config.threshold) {
            self.session.update(self.device, field, threshold).await?;
        }

        self.session.update(self.device, mma8652::PULSE_TMLT_ALL, config.time_limit).await?;
        self.session.update(self.device, mma8652::PULSE_LTCY_ALL, config.latency).await?;
        self.session.update(self.device, mma8652::INT_EN_PULSE, 1).await
    }

    /// Polls PULSE_SRC until a pulse event is flagged. Reading PULSE_SRC clears it.
    pub async fn wait_for_tap(&mut self, cancel: &CancelToken) -> IcogsResult<TapEvent, B::Error> {
        let max_polls = self.session.timing().tap_max_polls;
        let source = self
            .session
            .poll_until(self.device, mma8652::PULSE_SRC_ALL, max_polls, cancel, |source| {
                mma8652::EA.decode(source) == 1
            })
            .await?;

        let event = TapEvent::decode(source);
        info!("tap on {} axis, {}", event.axis, event.direction);

        Ok(event)
    }
}
