//! Status to pattern mapping.

use crate::pattern::PatternConfig;
use crate::time::TimeDuration;
use crate::types::{PatternError, PatternStep, Status};

/// Read-only mapping from every [`Status`] to its blink pattern.
///
/// Build one at startup and share it with the sequencer by reference. A status
/// without an entry is rejected by `StatusSequencer::set`.
#[derive(Debug, Clone)]
pub struct PatternTable<D: TimeDuration, const N: usize> {
    patterns: [Option<PatternConfig<D, N>>; Status::COUNT],
}

impl<D: TimeDuration, const N: usize> PatternTable<D, N> {
    /// Creates a table with no entries.
    pub fn empty() -> Self {
        Self {
            patterns: core::array::from_fn(|_| None),
        }
    }

    /// Sets the pattern for `status`, replacing any previous entry.
    pub fn with(mut self, status: Status, pattern: PatternConfig<D, N>) -> Self {
        self.patterns[status.index()] = Some(pattern);
        self
    }

    /// Returns the pattern for `status`, if one is configured.
    pub fn get(&self, status: Status) -> Option<&PatternConfig<D, N>> {
        self.patterns[status.index()].as_ref()
    }

    /// Returns true if `status` has a pattern.
    pub fn contains(&self, status: Status) -> bool {
        self.get(status).is_some()
    }

    /// The device's standard pattern table.
    ///
    /// # Errors
    /// * `CapacityExceeded` - `N` is smaller than the longest standard pattern (3 steps)
    pub fn standard() -> Result<Self, PatternError> {
        let step = PatternStep::<D>::from_millis;
        let solid_2s = || pattern::<D, N>(&[step(2000, 0, 1, 1)], true);
        let off = || pattern::<D, N>(&[step(0, 0, 0, 0)], true);

        Ok(Self::empty()
            .with(Status::PowerOn, solid_2s()?)
            .with(Status::BlePairing, pattern(&[step(200, 800, 0, 1)], false)?)
            .with(Status::BlePairSuccess, solid_2s()?)
            .with(
                Status::BlePairFail,
                pattern(
                    &[
                        step(200, 200, 1, 2),
                        // 600ms plus the last flash's 200ms off gives a 1s pause
                        step(0, 600, 1, 1),
                        step(200, 200, 0, 2),
                    ],
                    false,
                )?,
            )
            .with(Status::FactoryReset, solid_2s()?)
            .with(Status::LowBattery, pattern(&[step(1000, 1000, 0, 1)], false)?)
            .with(Status::OtaUpdate, pattern(&[step(200, 2800, 0, 1)], false)?)
            .with(Status::OtaSuccess, off()?)
            .with(
                Status::OtaFail,
                pattern(&[step(100, 100, 1, 3), step(0, 2700, 1, 1)], false)?,
            )
            .with(Status::Charging, pattern(&[step(1000, 0, 0, 1)], false)?)
            .with(Status::ChargeComplete, off()?)
            .with(Status::Off, off()?))
    }
}

impl<D: TimeDuration, const N: usize> Default for PatternTable<D, N> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds a pattern whose auto-stop, when enabled, has no delay.
fn pattern<D: TimeDuration, const N: usize>(
    steps: &[PatternStep<D>],
    auto_stop: bool,
) -> Result<PatternConfig<D, N>, PatternError> {
    let mut builder = PatternConfig::builder();
    for step in steps {
        builder = builder.step(*step)?;
    }
    if auto_stop {
        builder = builder.auto_stop(D::ZERO);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoopCount;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Ms(u64);

    impl TimeDuration for Ms {
        const ZERO: Self = Ms(0);

        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            Ms(millis)
        }
    }

    #[test]
    fn standard_table_covers_every_status() {
        let table = PatternTable::<Ms, 4>::standard().unwrap();
        for status in Status::ALL {
            assert!(table.contains(status), "{:?} has no pattern", status);
        }
    }

    #[test]
    fn standard_table_needs_three_step_capacity() {
        assert_eq!(
            PatternTable::<Ms, 2>::standard().unwrap_err(),
            PatternError::CapacityExceeded
        );
        assert!(PatternTable::<Ms, 3>::standard().is_ok());
    }

    #[test]
    fn off_patterns_are_noops() {
        let table = PatternTable::<Ms, 4>::standard().unwrap();
        for status in [Status::Off, Status::OtaSuccess, Status::ChargeComplete] {
            assert!(table.get(status).unwrap().is_noop());
        }
        assert!(!table.get(Status::PowerOn).unwrap().is_noop());
    }

    #[test]
    fn pair_fail_loops_on_first_step_repeat_only() {
        let table = PatternTable::<Ms, 4>::standard().unwrap();
        let fail = table.get(Status::BlePairFail).unwrap();

        // the last step is infinite but the first is not, so the pattern completes
        assert_eq!(fail.get_step(2).unwrap().repeat, LoopCount::Infinite);
        assert!(!fail.loops());
        assert!(table.get(Status::BlePairing).unwrap().loops());
    }

    #[test]
    fn empty_table_has_no_entries() {
        let table = PatternTable::<Ms, 4>::empty();
        assert!(Status::ALL.iter().all(|s| !table.contains(*s)));
    }
}
