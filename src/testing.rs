use crate::bus::Bus;
use embedded_hal::i2c::SevenBitAddress;
use embedded_hal_async::delay::DelayNs;
use heapless::{Deque, LinearMap, Vec};

const MAX_REGISTERS: usize = 256;
const MAX_SPECIAL: usize = 16;
const MAX_SEQUENCE: usize = 32;
const MAX_LOG: usize = 1024;

type Key = (SevenBitAddress, u8);

/// How a register reacts to writes. Registers without a behaviour echo what was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Writes are accepted on the bus but never change the register.
    Sticky,
    /// Bits in `mask` clear themselves right after being written.
    AutoClear { mask: u8 },
    /// Bits in `mask` are also copied into register `to` of the same device.
    Mirror { to: u8, mask: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Read { device: SevenBitAddress, register: u8, value: u8 },
    Write { device: SevenBitAddress, register: u8, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBusError {
    /// The injected failure for this register fired.
    Nack { device: SevenBitAddress, register: u8 },
}

/// Register images of every device on a fake bus.
pub struct FakeBus {
    registers: LinearMap<Key, u8, MAX_REGISTERS>,
    behaviours: LinearMap<Key, Behaviour, MAX_SPECIAL>,
    sequences: LinearMap<Key, Deque<u8, MAX_SEQUENCE>, MAX_SPECIAL>,
    failures: Vec<Key, MAX_SPECIAL>,
    log: Vec<Transaction, MAX_LOG>,
}

pub struct FakeDelay {
    pub elapsed_ns: u64,
}

impl FakeDelay {
    pub fn new() -> Self {
        FakeDelay { elapsed_ns: 0 }
    }
}

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }
}

impl FakeBus {
    pub fn new() -> Self {
        FakeBus {
            registers: LinearMap::new(),
            behaviours: LinearMap::new(),
            sequences: LinearMap::new(),
            failures: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn with_register(&mut self, device: SevenBitAddress, register: u8, value: u8) {
        self.registers.insert((device, register), value).unwrap();
    }

    pub fn with_registers(&mut self, device: SevenBitAddress, start: u8, values: &[u8]) {
        for (offset, value) in values.iter().enumerate() {
            self.with_register(device, start + offset as u8, *value);
        }
    }

    pub fn with_behaviour(&mut self, device: SevenBitAddress, register: u8, behaviour: Behaviour) {
        self.behaviours.insert((device, register), behaviour).unwrap();
    }

    /// Reads of this register return `values` in order before falling back to the image.
    pub fn with_sequence(&mut self, device: SevenBitAddress, register: u8, values: &[u8]) {
        let mut queue = Deque::new();
        for value in values {
            queue.push_back(*value).unwrap();
        }
        self.sequences.insert((device, register), queue).unwrap();
    }

    pub fn fail_on(&mut self, device: SevenBitAddress, register: u8) {
        self.failures.push((device, register)).unwrap();
    }

    pub fn register(&self, device: SevenBitAddress, register: u8) -> u8 {
        self.registers.get(&(device, register)).copied().unwrap_or(0)
    }

    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    pub fn writes_to(&self, device: SevenBitAddress, register: u8) -> usize {
        self.log
            .iter()
            .filter(|t| matches!(t, Transaction::Write { device: d, register: r, .. } if *d == device && *r == register))
            .count()
    }

    fn store(&mut self, device: SevenBitAddress, register: u8, value: u8) {
        self.registers.insert((device, register), value).unwrap();
    }

    fn record(&mut self, transaction: Transaction) {
        let _ = self.log.push(transaction);
    }

    fn check(&self, device: SevenBitAddress, register: u8) -> Result<(), FakeBusError> {
        if self.failures.contains(&(device, register)) {
            return Err(FakeBusError::Nack { device, register });
        }

        Ok(())
    }
}

impl Bus for FakeBus {
    type Error = FakeBusError;

    async fn read_byte(&mut self, device: SevenBitAddress, register: u8) -> Result<u8, Self::Error> {
        self.check(device, register)?;

        let queued = self
            .sequences
            .get_mut(&(device, register))
            .and_then(|queue| queue.pop_front());
        let value = queued.unwrap_or_else(|| self.register(device, register));

        self.record(Transaction::Read { device, register, value });
        Ok(value)
    }

    async fn write_byte(&mut self, device: SevenBitAddress, register: u8, value: u8) -> Result<(), Self::Error> {
        self.check(device, register)?;
        self.record(Transaction::Write { device, register, value });

        match self.behaviours.get(&(device, register)).copied() {
            None => self.store(device, register, value),
            Some(Behaviour::Sticky) => {}
            Some(Behaviour::AutoClear { mask }) => self.store(device, register, value & !mask),
            Some(Behaviour::Mirror { to, mask }) => {
                self.store(device, register, value);
                let target = self.register(device, to);
                self.store(device, to, (target & !mask) | (value & mask));
            }
        }

        Ok(())
    }
}
