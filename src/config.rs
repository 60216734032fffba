/// Delays and poll bounds used by the [`Session`](crate::Session).
///
/// Every state-changing write waits `settle_ms` before it is read back. Polls wait
/// `poll_interval_ms` between attempts and give up with [`Error::Timeout`](crate::Error::Timeout)
/// after their maximum number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub(crate) settle_ms: u32,
    pub(crate) poll_interval_ms: u32,
    pub(crate) reset_max_polls: u32,
    pub(crate) data_ready_max_polls: u32,
    pub(crate) tap_max_polls: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            poll_interval_ms: 10,
            reset_max_polls: 50,
            data_ready_max_polls: 100,
            tap_max_polls: 1000,
        }
    }
}

impl Timing {
    /// Wait between a write and its read-back. 500 ms covers the slowest part of the family,
    /// EEPROM writes only need 5 ms.
    pub fn settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;

        self
    }

    pub fn poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;

        self
    }

    /// Attempts to observe a cleared reset bit after a software reset.
    pub fn reset_max_polls(mut self, max_polls: u32) -> Self {
        self.reset_max_polls = max_polls;

        self
    }

    /// Attempts to observe a data-ready flag before reading a measurement.
    pub fn data_ready_max_polls(mut self, max_polls: u32) -> Self {
        self.data_ready_max_polls = max_polls;

        self
    }

    pub fn tap_max_polls(mut self, max_polls: u32) -> Self {
        self.tap_max_polls = max_polls;

        self
    }

    /// No delays at all, for fake buses.
    pub fn immediate() -> Self {
        Self::default().settle_ms(0).poll_interval_ms(0)
    }
}

/// Parameters of the MMA8652 self-test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestConfig {
    pub(crate) samples: u16,
    pub(crate) threshold_factor: f32,
    pub(crate) nominal: [f32; 3],
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self {
            samples: 10,
            threshold_factor: 0.75,
            // X, Y, Z output change in counts at 2g
            nominal: [90.0, 104.0, 782.0],
        }
    }
}

impl SelfTestConfig {
    /// Samples averaged with self-test off and again with it on. At least one is taken.
    pub fn samples(mut self, samples: u16) -> Self {
        self.samples = samples.max(1);

        self
    }

    /// An axis passes when its change exceeds `nominal * threshold_factor`.
    pub fn threshold_factor(mut self, factor: f32) -> Self {
        self.threshold_factor = factor;

        self
    }

    pub fn nominal(mut self, nominal: [f32; 3]) -> Self {
        self.nominal = nominal;

        self
    }

    pub fn threshold(&self, axis: usize) -> f32 {
        self.nominal[axis] * self.threshold_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_builder() {
        let timing = Timing::default().settle_ms(5).reset_max_polls(3);
        assert_eq!(5, timing.settle_ms);
        assert_eq!(3, timing.reset_max_polls);
        assert_eq!(10, timing.poll_interval_ms);
    }

    #[test]
    fn self_test_thresholds() {
        let config = SelfTestConfig::default();
        assert_eq!(67.5, config.threshold(0));
        assert_eq!(78.0, config.threshold(1));
        assert_eq!(586.5, config.threshold(2));
        assert_eq!(1, SelfTestConfig::default().samples(0).samples);
    }
}
