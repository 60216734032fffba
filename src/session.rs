//! Serialized access to every device on one bus.
//!
//! The [`Session`] owns the transport and a delay provider. All operations take `&mut self`, so
//! at most one transaction is ever in flight. Every state-changing write is followed by the
//! configured settle delay and, where the register holds its value, a read-back.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::bus::Bus;
use crate::config::Timing;
use crate::error::{Error, IcogsResult};
use crate::field::BitField;
use crate::raw::{InvalidRawLayout, RawLayout, RawValue, MAX_LAYOUT_BYTES};
use crate::register::{eeprom, Access, DeviceFamily, FieldDef, ModeControl, RegisterMap, UnexpectedValue, UnknownFieldValue};
use embedded_hal::i2c::SevenBitAddress;
use embedded_hal_async::delay::DelayNs;

/// Operating mode of a device.
///
/// Only `Standby` and `Active` can be requested through [`Session::set_mode`]. `Sleep` is entered
/// by the MMA8652 auto-sleep logic, `SelfTest` and `SoftwareReset` by their own operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Standby,
    Active,
    Sleep,
    SelfTest,
    SoftwareReset,
}

impl Mode {
    /// `Sleep` is an auto-sleep substate of `Active`.
    fn satisfies(self, target: Mode) -> bool {
        self == target || (target == Mode::Active && self == Mode::Sleep)
    }
}

/// Cooperative cancellation flag, checked at every poll iteration.
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A device family at a bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device {
    pub family: DeviceFamily,
    pub address: SevenBitAddress,
}

impl Device {
    /// The family at its default address.
    pub fn new(family: DeviceFamily) -> Self {
        Self { family, address: family.default_address() }
    }

    pub fn at(family: DeviceFamily, address: SevenBitAddress) -> Self {
        Self { family, address }
    }

    pub fn map(&self) -> &'static RegisterMap {
        self.family.map()
    }
}

/// What a field value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Meaning {
    Symbol(&'static str),
    /// Numeric field without a decode table.
    Value(u8),
    /// Value missing from the field's decode table.
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldReading {
    pub name: &'static str,
    pub raw: u8,
    pub meaning: Meaning,
}

/// Owner of the bus shared by every device.
pub struct Session<B, D> {
    bus: B,
    delay: D,
    timing: Timing,
}

impl<B, D> Session<B, D>
where
    B: Bus,
    D: DelayNs,
{
    pub fn new(bus: B, delay: D, timing: Timing) -> Self {
        Self { bus, delay, timing }
    }

    /// Gives back the bus and the delay provider.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub(crate) async fn settle(&mut self) {
        self.delay.delay_ms(self.timing.settle_ms).await;
    }

    pub(crate) async fn pause(&mut self) {
        self.delay.delay_ms(self.timing.poll_interval_ms).await;
    }

    pub async fn read_register(&mut self, device: Device, register: u8) -> IcogsResult<u8, B::Error> {
        let value = self
            .bus
            .read_byte(device.address, register)
            .await
            .map_err(Error::Bus)?;
        debug!("read {=u8:#x}/{=u8:#x} = {=u8:#x}", device.address, register, value);

        Ok(value)
    }

    /// Reads consecutive registers starting at `start`.
    pub async fn read_registers(
        &mut self,
        device: Device,
        start: u8,
        data: &mut [u8],
    ) -> IcogsResult<(), B::Error> {
        self.bus
            .read_bytes(device.address, start, data)
            .await
            .map_err(Error::Bus)
    }

    async fn write_byte(&mut self, device: Device, register: u8, value: u8) -> IcogsResult<(), B::Error> {
        if device.family == DeviceFamily::Eeprom && eeprom::is_read_only(register) {
            return Err(Error::ReadOnly(register));
        }

        trace!("write {=u8:#x}/{=u8:#x} = {=u8:#x}", device.address, register, value);
        self.bus
            .write_byte(device.address, register, value)
            .await
            .map_err(Error::Bus)
    }

    /// Writes a whole register and waits for it to settle. Nothing is read back.
    pub async fn write_register(&mut self, device: Device, register: u8, value: u8) -> IcogsResult<(), B::Error> {
        self.write_byte(device, register, value).await?;
        self.settle().await;

        Ok(())
    }

    /// Writes a whole register, waits for it to settle and checks that it holds `value`.
    pub async fn write_verified(&mut self, device: Device, register: u8, value: u8) -> IcogsResult<(), B::Error> {
        self.write_register(device, register, value).await?;

        let observed = self.read_register(device, register).await?;
        if observed != value {
            warn!("verify failed at {=u8:#x}: wrote {=u8:#x}, read {=u8:#x}", register, value, observed);
            return Err(Error::VerifyFailed { register, expected: value, observed });
        }

        Ok(())
    }

    /// Reads every register of `layout` in order and decodes them.
    pub async fn read_raw(&mut self, device: Device, layout: &RawLayout) -> IcogsResult<RawValue, B::Error> {
        if layout.len() > MAX_LAYOUT_BYTES {
            return Err(InvalidRawLayout { bytes: layout.len(), width: layout.width }.into());
        }

        let mut bytes = [0u8; MAX_LAYOUT_BYTES];
        for (byte, register) in bytes.iter_mut().zip(layout.registers) {
            *byte = self.read_register(device, *register).await?;
        }

        Ok(layout.decode(&bytes[..layout.len()])?)
    }

    pub async fn read_bits(&mut self, device: Device, field: BitField) -> IcogsResult<u8, B::Error> {
        Ok(field.decode(self.read_register(device, field.register).await?))
    }

    /// Reads a field and converts it with its typed enum.
    pub(crate) async fn read_as<T>(&mut self, device: Device, field: BitField) -> IcogsResult<T, B::Error>
    where
        T: TryFrom<u8, Error = UnexpectedValue>,
    {
        let raw = self.read_bits(device, field).await?;

        T::try_from(raw).map_err(|UnexpectedValue(raw)| {
            Error::UnknownFieldValue(UnknownFieldValue {
                register: field.register,
                bit_offset: field.bit_offset,
                raw,
            })
        })
    }

    /// Reads a field by name.
    pub async fn read_field(&mut self, device: Device, name: &str) -> IcogsResult<u8, B::Error> {
        let def = device.family.lookup(name).ok_or(Error::NoSuchField)?;

        self.read_bits(device, def.field).await
    }

    /// Writes a field by name, read-modify-write with settle and verify.
    ///
    /// Read-only fields fail with [`Error::ReadOnly`] before any bus traffic. Self-clearing command
    /// bits are set without a read-back.
    pub async fn write_field(&mut self, device: Device, name: &str, value: u8) -> IcogsResult<(), B::Error> {
        let def = device.family.lookup(name).ok_or(Error::NoSuchField)?;

        self.update_field(device, def, value).await
    }

    /// Like [`write_field`](Self::write_field), addressing the field by location.
    pub(crate) async fn update(&mut self, device: Device, field: BitField, value: u8) -> IcogsResult<(), B::Error> {
        let def = device
            .map()
            .fields
            .iter()
            .find(|def| def.field == field)
            .ok_or(Error::NoSuchField)?;

        self.update_field(device, def, value).await
    }

    async fn update_field(&mut self, device: Device, def: &FieldDef, value: u8) -> IcogsResult<(), B::Error> {
        let field = def.field;
        // reject before touching the bus
        field.encode(0, value)?;

        match def.access {
            Access::ReadOnly => {
                warn!("{=str} is read-only", def.name);
                return Err(Error::ReadOnly(field.register));
            }
            // the device clears the bit by itself, writing 0 is a no-op
            Access::SelfClearing if value == 0 => return Ok(()),
            Access::SelfClearing => return self.trigger(device, field).await,
            Access::ReadWrite => {}
        }

        if def.is_config && device.map().config_requires_standby {
            let mode = self.power_state(device).await?;
            if mode != Mode::Standby {
                warn!("{=str} is only writable in standby", def.name);
                return Err(Error::RequiresStandby);
            }
        }

        let current = self.read_register(device, field.register).await?;
        let updated = field.encode(current, value)?;
        if updated == current {
            return Ok(());
        }

        self.write_register(device, field.register, updated).await?;

        let observed = self.read_register(device, field.register).await?;
        if field.decode(observed) != value {
            warn!("verify failed for {=str}: wrote {=u8}, read {=u8:#x}", def.name, value, observed);
            return Err(Error::VerifyFailed {
                register: field.register,
                expected: updated,
                observed,
            });
        }

        Ok(())
    }

    /// Read-modify-write of a field whose value the device changes on its own. Only settles.
    pub(crate) async fn write_bits(&mut self, device: Device, field: BitField, value: u8) -> IcogsResult<(), B::Error> {
        let current = self.read_register(device, field.register).await?;
        let updated = field.encode(current, value)?;

        self.write_register(device, field.register, updated).await
    }

    /// Sets a self-clearing bit (reset, one-shot).
    pub(crate) async fn trigger(&mut self, device: Device, field: BitField) -> IcogsResult<(), B::Error> {
        self.write_bits(device, field, 1).await
    }

    /// Every field of `register` together with its symbolic meaning.
    ///
    /// Values missing from a decode table are logged and reported as [`Meaning::Unknown`].
    pub async fn describe(
        &mut self,
        device: Device,
        register: u8,
    ) -> IcogsResult<heapless::Vec<FieldReading, 8>, B::Error> {
        let byte = self.read_register(device, register).await?;

        let mut readings = heapless::Vec::new();
        for def in device.map().fields_of(register) {
            let raw = def.field.decode(byte);
            let meaning = match def.symbol(raw) {
                Ok(Some(symbol)) => Meaning::Symbol(symbol),
                Ok(None) => Meaning::Value(raw),
                Err(_) => {
                    warn!("{=str} has unknown value {=u8:#x}", def.name, raw);
                    Meaning::Unknown(raw)
                }
            };

            // fields of one register never overlap, so there are at most 8
            let _ = readings.push(FieldReading { name: def.name, raw, meaning });
        }

        Ok(readings)
    }

    /// Reads all 256 registers of a device.
    pub async fn dump(&mut self, device: Device) -> IcogsResult<[u8; 256], B::Error> {
        let mut image = [0u8; 256];
        for (register, byte) in image.iter_mut().enumerate() {
            *byte = self.read_register(device, register as u8).await?;
        }

        Ok(image)
    }

    /// Checks the who-am-I register of the family.
    pub async fn verify_identity(&mut self, device: Device) -> IcogsResult<(), B::Error> {
        let identity = device.map().identity.ok_or(Error::UnsupportedOperation)?;

        let found = self.read_register(device, identity.register).await?;
        if found != identity.value {
            warn!("{} at {=u8:#x}: who-am-I {=u8:#x}", device.family, device.address, found);
            return Err(Error::WrongDevice { expected: identity.value, found });
        }

        info!("{} present at {=u8:#x}", device.family, device.address);
        Ok(())
    }

    fn mode_control(device: Device) -> IcogsResult<ModeControl, B::Error> {
        device.map().mode.ok_or(Error::UnsupportedOperation)
    }

    /// Mode as reported by the status field alone, ignoring reset and self-test bits.
    pub(crate) async fn power_state(&mut self, device: Device) -> IcogsResult<Mode, B::Error> {
        let control = Self::mode_control(device)?;
        let raw = self.read_bits(device, control.status).await?;

        Ok(control.observe(raw)?)
    }

    /// Re-reads the current mode of a device.
    ///
    /// A pending reset or an enabled self-test take precedence over the Standby/Active state.
    pub async fn mode(&mut self, device: Device) -> IcogsResult<Mode, B::Error> {
        let map = device.map();
        Self::mode_control(device)?;

        if let Some(reset) = map.reset {
            if self.read_bits(device, reset).await? == 1 {
                return Ok(Mode::SoftwareReset);
            }
        }
        if let Some(self_test) = map.self_test {
            if self.read_bits(device, self_test).await? == 1 {
                return Ok(Mode::SelfTest);
            }
        }

        self.power_state(device).await
    }

    /// Moves a device between Standby and Active.
    ///
    /// The mode is read back after the settle delay, a mismatch fails with
    /// [`Error::ModeTransitionFailed`] and may be retried. Requesting any other mode, or leaving a
    /// self-test or reset through this call, fails with [`Error::InvalidTransition`].
    pub async fn set_mode(&mut self, device: Device, target: Mode) -> IcogsResult<(), B::Error> {
        let control = Self::mode_control(device)?;
        let current = self.mode(device).await?;

        let requestable = matches!(target, Mode::Standby | Mode::Active);
        let leavable = !matches!(current, Mode::SelfTest | Mode::SoftwareReset);
        if !requestable || !leavable {
            return Err(Error::InvalidTransition { from: current, to: target });
        }
        if current.satisfies(target) {
            return Ok(());
        }

        self.write_mode(device, control, target).await
    }

    /// Writes the mode control field and verifies the outcome, whatever the current mode.
    pub(crate) async fn write_mode(
        &mut self,
        device: Device,
        control: ModeControl,
        target: Mode,
    ) -> IcogsResult<(), B::Error> {
        let raw = match target {
            Mode::Standby => control.standby,
            _ => control.active,
        };

        let current = self.read_register(device, control.control.register).await?;
        let updated = control.control.encode(current, raw)?;
        self.write_register(device, control.control.register, updated).await?;

        let observed = control.observe(self.read_bits(device, control.status).await?)?;
        if !observed.satisfies(target) {
            warn!("{} did not enter {}, observed {}", device.family, target, observed);
            return Err(Error::ModeTransitionFailed { expected: target, observed });
        }

        info!("{} at {=u8:#x} now {}", device.family, device.address, target);
        Ok(())
    }

    /// Polls `field` until `done` accepts its value.
    ///
    /// Gives up with [`Error::Timeout`] after `max_polls` reads and with [`Error::Cancelled`] as soon
    /// as `cancel` is set.
    pub async fn poll_until<F>(
        &mut self,
        device: Device,
        field: BitField,
        max_polls: u32,
        cancel: &CancelToken,
        done: F,
    ) -> IcogsResult<u8, B::Error>
    where
        F: Fn(u8) -> bool,
    {
        for attempt in 0..max_polls {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let value = self.read_bits(device, field).await?;
            trace!("poll {=u32} of {=u8:#x}: {=u8:#x}", attempt, field.register, value);
            if done(value) {
                return Ok(value);
            }

            self.pause().await;
        }

        Err(Error::Timeout)
    }

    /// Waits for a data-ready bit.
    pub async fn wait_data_ready(
        &mut self,
        device: Device,
        flag: BitField,
        cancel: &CancelToken,
    ) -> IcogsResult<(), B::Error> {
        let max_polls = self.timing.data_ready_max_polls;
        self.poll_until(device, flag, max_polls, cancel, |ready| ready == 1).await?;

        Ok(())
    }

    /// Sets the reset bit of the family and waits for the device to clear it.
    pub async fn software_reset(&mut self, device: Device, cancel: &CancelToken) -> IcogsResult<(), B::Error> {
        let reset = device.map().reset.ok_or(Error::UnsupportedOperation)?;

        self.trigger(device, reset).await?;

        let max_polls = self.timing.reset_max_polls;
        self.poll_until(device, reset, max_polls, cancel, |bit| bit == 0).await?;

        info!("{} at {=u8:#x} reset", device.family, device.address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{hts221, isl29023, mma8652};
    use crate::testing::{Behaviour, FakeBus, FakeBusError, FakeDelay, Transaction};

    const HTS221: u8 = hts221::DEFAULT_ADDRESS;
    const MMA8652: u8 = mma8652::DEFAULT_ADDRESS;

    fn session(bus: FakeBus) -> Session<FakeBus, FakeDelay> {
        Session::new(bus, FakeDelay::new(), Timing::default().settle_ms(1).poll_interval_ms(1))
    }

    fn hts221() -> Device {
        Device::new(DeviceFamily::Hts221)
    }

    fn mma8652() -> Device {
        Device::new(DeviceFamily::Mma8652)
    }

    #[tokio::test]
    async fn write_field_is_mask_then_set() {
        let mut bus = FakeBus::new();
        bus.with_register(HTS221, hts221::CTRL_REG1, 0b1000_0101);
        let mut session = session(bus);

        session.write_field(hts221(), "ODR", 0b10).await.unwrap();
        assert_eq!(0b10, session.read_field(hts221(), "ODR").await.unwrap());

        let (bus, delay) = session.release();
        assert_eq!(0b1000_0110, bus.register(HTS221, hts221::CTRL_REG1));
        assert_eq!(1_000_000, delay.elapsed_ns);
    }

    #[tokio::test]
    async fn write_field_skips_unchanged_value() {
        let mut bus = FakeBus::new();
        bus.with_register(HTS221, hts221::CTRL_REG1, 0b1000_0101);
        let mut session = session(bus);

        session.write_field(hts221(), "PD", 1).await.unwrap();

        let (bus, _) = session.release();
        assert_eq!(0, bus.writes_to(HTS221, hts221::CTRL_REG1));
    }

    #[tokio::test]
    async fn write_field_rejects_wide_value_before_bus_traffic() {
        let mut session = session(FakeBus::new());

        let result = session.write_field(hts221(), "ODR", 0b100).await;
        assert!(matches!(result, Err(Error::InvalidFieldValue(_))));

        let result = session.write_field(hts221(), "NOPE", 0).await;
        assert_eq!(Err(Error::NoSuchField), result);

        let (bus, _) = session.release();
        assert!(bus.log().is_empty());
    }

    #[tokio::test]
    async fn write_field_rejects_read_only_fields() {
        let mut bus = FakeBus::new();
        bus.with_register(HTS221, hts221::WHO_AM_I, hts221::WHO_AM_I_VALUE);
        let mut session = session(bus);

        assert_eq!(
            Err(Error::ReadOnly(hts221::WHO_AM_I)),
            session.write_field(hts221(), "WHO_AM_I", 0).await
        );
        assert_eq!(
            Err(Error::ReadOnly(mma8652::SYSMOD)),
            session.write_field(mma8652(), "SYSMOD", 1).await
        );
        assert_eq!(
            Err(Error::ReadOnly(mma8652::PULSE_SRC)),
            session.write_field(mma8652(), "EA", 1).await
        );

        let (bus, _) = session.release();
        assert!(bus.log().is_empty());
        assert_eq!(hts221::WHO_AM_I_VALUE, bus.register(HTS221, hts221::WHO_AM_I));
    }

    #[tokio::test]
    async fn write_field_triggers_self_clearing_bits() {
        let mut bus = FakeBus::new();
        bus.with_behaviour(MMA8652, mma8652::CTRL_REG2, Behaviour::AutoClear { mask: 0x40 });
        bus.with_behaviour(HTS221, hts221::CTRL_REG2, Behaviour::AutoClear { mask: 0x01 });
        let mut session = session(bus);

        session.write_field(mma8652(), "RST", 1).await.unwrap();
        session.write_field(hts221(), "ONE_SHOT", 1).await.unwrap();

        let (bus, _) = session.release();
        assert!(bus.log().contains(&Transaction::Write {
            device: MMA8652,
            register: mma8652::CTRL_REG2,
            value: 0x40
        }));
        assert!(bus.log().contains(&Transaction::Write {
            device: HTS221,
            register: hts221::CTRL_REG2,
            value: 0x01
        }));
        assert_eq!(0, bus.register(MMA8652, mma8652::CTRL_REG2));
    }

    #[tokio::test]
    async fn clearing_a_self_clearing_bit_does_nothing() {
        let mut session = session(FakeBus::new());

        session.write_field(hts221(), "BOOT", 0).await.unwrap();

        let (bus, _) = session.release();
        assert!(bus.log().is_empty());
    }

    #[tokio::test]
    async fn write_field_verify_failure() {
        let mut bus = FakeBus::new();
        bus.with_behaviour(HTS221, hts221::CTRL_REG2, Behaviour::Sticky);
        let mut session = session(bus);

        assert_eq!(
            Err(Error::VerifyFailed { register: hts221::CTRL_REG2, expected: 0b10, observed: 0 }),
            session.write_field(hts221(), "HEATER", 1).await
        );
    }

    #[tokio::test]
    async fn config_write_requires_standby() {
        let mut bus = FakeBus::new();
        bus.with_register(MMA8652, mma8652::CTRL_REG1, 0x01);
        bus.with_register(MMA8652, mma8652::SYSMOD, 0x01);
        let mut session = session(bus);

        assert_eq!(Err(Error::RequiresStandby), session.write_field(mma8652(), "FS", 0b01).await);

        let (bus, _) = session.release();
        assert_eq!(0, bus.writes_to(MMA8652, mma8652::XYZ_DATA_CFG));
    }

    #[tokio::test]
    async fn config_write_in_standby() {
        let mut session = session(FakeBus::new());

        session.write_field(mma8652(), "FS", 0b10).await.unwrap();
        assert_eq!(0b10, session.read_bits(mma8652(), mma8652::FS).await.unwrap());
    }

    #[tokio::test]
    async fn standby_to_active_with_echo() {
        let mut session = session(FakeBus::new());

        assert_eq!(Ok(Mode::Standby), session.mode(hts221()).await);
        session.set_mode(hts221(), Mode::Active).await.unwrap();
        assert_eq!(Ok(Mode::Active), session.mode(hts221()).await);
        session.set_mode(hts221(), Mode::Standby).await.unwrap();
        assert_eq!(Ok(Mode::Standby), session.mode(hts221()).await);
    }

    #[tokio::test]
    async fn mode_observed_through_separate_status_register() {
        let mut bus = FakeBus::new();
        bus.with_behaviour(
            MMA8652,
            mma8652::CTRL_REG1,
            Behaviour::Mirror { to: mma8652::SYSMOD, mask: 0x01 },
        );
        let mut session = session(bus);

        session.set_mode(mma8652(), Mode::Active).await.unwrap();
        assert_eq!(Ok(Mode::Active), session.mode(mma8652()).await);
    }

    #[tokio::test]
    async fn stuck_mode_fails_transition() {
        let mut bus = FakeBus::new();
        bus.with_behaviour(HTS221, hts221::CTRL_REG1, Behaviour::Sticky);
        let mut session = session(bus);

        assert_eq!(
            Err(Error::ModeTransitionFailed { expected: Mode::Active, observed: Mode::Standby }),
            session.set_mode(hts221(), Mode::Active).await
        );
    }

    #[tokio::test]
    async fn only_standby_and_active_are_requestable() {
        let mut session = session(FakeBus::new());

        assert_eq!(
            Err(Error::InvalidTransition { from: Mode::Standby, to: Mode::Sleep }),
            session.set_mode(mma8652(), Mode::Sleep).await
        );
        assert_eq!(
            Err(Error::InvalidTransition { from: Mode::Standby, to: Mode::SelfTest }),
            session.set_mode(mma8652(), Mode::SelfTest).await
        );
    }

    #[tokio::test]
    async fn self_test_blocks_set_mode() {
        let mut bus = FakeBus::new();
        bus.with_register(MMA8652, mma8652::CTRL_REG2, 0x80);
        let mut session = session(bus);

        assert_eq!(Ok(Mode::SelfTest), session.mode(mma8652()).await);
        assert_eq!(
            Err(Error::InvalidTransition { from: Mode::SelfTest, to: Mode::Active }),
            session.set_mode(mma8652(), Mode::Active).await
        );
    }

    #[tokio::test]
    async fn sleep_satisfies_active() {
        let mut bus = FakeBus::new();
        bus.with_register(MMA8652, mma8652::CTRL_REG1, 0x01);
        bus.with_register(MMA8652, mma8652::SYSMOD, 0b10);
        let mut session = session(bus);

        assert_eq!(Ok(Mode::Sleep), session.mode(mma8652()).await);
        session.set_mode(mma8652(), Mode::Active).await.unwrap();

        let (bus, _) = session.release();
        assert_eq!(0, bus.writes_to(MMA8652, mma8652::CTRL_REG1));
    }

    #[tokio::test]
    async fn mode_unsupported_on_eeprom() {
        let mut session = session(FakeBus::new());

        assert_eq!(
            Err(Error::UnsupportedOperation),
            session.mode(Device::new(DeviceFamily::Eeprom)).await
        );
    }

    #[tokio::test]
    async fn software_reset_waits_for_bit_to_clear() {
        let mut bus = FakeBus::new();
        bus.with_behaviour(MMA8652, mma8652::CTRL_REG2, Behaviour::AutoClear { mask: 0x40 });
        let mut session = session(bus);

        session.software_reset(mma8652(), &CancelToken::new()).await.unwrap();

        let (bus, _) = session.release();
        assert!(bus.log().contains(&Transaction::Write {
            device: MMA8652,
            register: mma8652::CTRL_REG2,
            value: 0x40
        }));
    }

    #[tokio::test]
    async fn software_reset_times_out() {
        let mut bus = FakeBus::new();
        bus.with_register(MMA8652, mma8652::CTRL_REG2, 0x40);
        bus.with_behaviour(MMA8652, mma8652::CTRL_REG2, Behaviour::Sticky);
        let mut session = Session::new(bus, FakeDelay::new(), Timing::immediate().reset_max_polls(5));

        assert_eq!(Err(Error::Timeout), session.software_reset(mma8652(), &CancelToken::new()).await);
    }

    #[tokio::test]
    async fn cancelled_poll() {
        let token = CancelToken::new();
        token.cancel();
        let mut session = session(FakeBus::new());

        assert_eq!(
            Err(Error::Cancelled),
            session.wait_data_ready(hts221(), hts221::T_DA, &token).await
        );

        token.reset();
        assert_eq!(
            Err(Error::Timeout),
            session.wait_data_ready(hts221(), hts221::T_DA, &token).await
        );
    }

    #[tokio::test]
    async fn describe_reports_unknown_values() {
        let isl = Device::new(DeviceFamily::Isl29023);
        let mut bus = FakeBus::new();
        bus.with_register(isl.address, isl29023::COMMAND1, 0b0110_0001);
        let mut session = session(bus);

        let readings = session.describe(isl, isl29023::COMMAND1).await.unwrap();
        assert_eq!(3, readings.len());
        assert_eq!(FieldReading { name: "OP", raw: 0b011, meaning: Meaning::Unknown(0b011) }, readings[0]);
        assert_eq!(Meaning::Symbol("no interrupt"), readings[1].meaning);
        assert_eq!(Meaning::Symbol("4 cycles"), readings[2].meaning);
    }

    #[tokio::test]
    async fn describe_numeric_fields() {
        let mut bus = FakeBus::new();
        bus.with_register(MMA8652, mma8652::F_SETUP, 0b1000_1010);
        let mut session = session(bus);

        let readings = session.describe(mma8652(), mma8652::F_SETUP).await.unwrap();
        assert_eq!(Meaning::Symbol("stop on overflow"), readings[0].meaning);
        assert_eq!(Meaning::Value(10), readings[1].meaning);
    }

    #[tokio::test]
    async fn identity_check() {
        let mut bus = FakeBus::new();
        bus.with_register(HTS221, hts221::WHO_AM_I, hts221::WHO_AM_I_VALUE);
        bus.with_register(MMA8652, mma8652::WHO_AM_I, 0x5A);
        let mut session = session(bus);

        session.verify_identity(hts221()).await.unwrap();
        assert_eq!(
            Err(Error::WrongDevice { expected: 0x4A, found: 0x5A }),
            session.verify_identity(mma8652()).await
        );
        assert_eq!(
            Err(Error::UnsupportedOperation),
            session.verify_identity(Device::new(DeviceFamily::Isl29023)).await
        );
    }

    #[tokio::test]
    async fn bus_errors_are_passed_through() {
        let mut bus = FakeBus::new();
        bus.fail_on(HTS221, hts221::WHO_AM_I);
        let mut session = session(bus);

        assert_eq!(
            Err(Error::Bus(FakeBusError::Nack { device: HTS221, register: hts221::WHO_AM_I })),
            session.verify_identity(hts221()).await
        );
    }

    #[tokio::test]
    async fn read_raw_layout() {
        let mut bus = FakeBus::new();
        bus.with_registers(HTS221, hts221::TEMP_OUT_L, &[0x18, 0xFC]);
        let mut session = session(bus);

        let value = session.read_raw(hts221(), &hts221::TEMPERATURE_OUT).await.unwrap();
        assert_eq!(-1000, value.count);
    }

    #[tokio::test]
    async fn dump_reads_every_register() {
        let mut bus = FakeBus::new();
        bus.with_register(HTS221, 0x00, 0x11);
        bus.with_register(HTS221, 0xFF, 0x22);
        let mut session = session(bus);

        let image = session.dump(hts221()).await.unwrap();
        assert_eq!(0x11, image[0x00]);
        assert_eq!(0x22, image[0xFF]);

        let (bus, _) = session.release();
        assert_eq!(256, bus.log().len());
    }

    #[tokio::test]
    async fn eeprom_factory_area_is_read_only() {
        let eeprom = Device::new(DeviceFamily::Eeprom);
        let mut session = session(FakeBus::new());

        assert_eq!(
            Err(Error::ReadOnly(eeprom::MANUFACTURER_ID)),
            session.write_register(eeprom, eeprom::MANUFACTURER_ID, 0x29).await
        );
        session.write_verified(eeprom, eeprom::SCRATCH_START, 0xA5).await.unwrap();
    }
}
