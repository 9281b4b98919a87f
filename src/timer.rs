//! Timer service abstraction.
//!
//! Components never own a timer implementation. They ask a [`TimerService`]
//! to fire later and the host hands the fired [`TimerToken`] back through the
//! component's `on_timer`. Every arming carries a fresh epoch, so a token that
//! was cancelled, replaced, or delivered twice is recognised and dropped.

use crate::time::TimeDuration;

/// A timer resource owned by one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerSlot {
    /// Advances the sequencer to its next on/off edge.
    Step,
    /// Returns a completed pattern to idle.
    AutoStop,
    /// Periodic battery sampling.
    Poll,
}

/// Identifies a single arming of a timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerToken {
    slot: TimerSlot,
    epoch: u32,
}

impl TimerToken {
    /// Creates a token for the given slot and epoch.
    #[inline]
    pub const fn new(slot: TimerSlot, epoch: u32) -> Self {
        Self { slot, epoch }
    }

    /// Returns the slot this token was armed on.
    #[inline]
    pub fn slot(&self) -> TimerSlot {
        self.slot
    }

    /// Returns the epoch this token was armed with.
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// What a component did with a fired timer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerOutcome {
    /// The pattern advanced to its next edge.
    Stepped,
    /// The auto-stop delay elapsed and the sequencer returned to idle.
    AutoStopped,
    /// A battery sample was taken.
    Sampled,
    /// The token no longer matches the armed timer and was ignored.
    Stale,
}

/// Timer setup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// The underlying runtime could not allocate the timer.
    Unavailable(TimerSlot),
}

impl core::fmt::Display for TimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimerError::Unavailable(slot) => {
                write!(f, "timer for {:?} slot could not be created", slot)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimerError {}

/// Trait for abstracting one-shot and periodic timer scheduling.
///
/// Implement this on top of your runtime's timer primitive (an RTOS software
/// timer, an embassy task, a hardware alarm). When a timer fires, deliver its
/// token to the component that armed it. Callbacks may run on any execution
/// context; the host is responsible for serialising `on_timer` calls with
/// other calls on the same component.
pub trait TimerService<D: TimeDuration> {
    /// Allocates the resource behind `slot`.
    ///
    /// Called once per slot when a component is constructed.
    fn create(&mut self, slot: TimerSlot) -> Result<(), TimerError>;

    /// Fires `token` once after `delay`.
    ///
    /// Re-arming a slot that is already armed replaces the pending timer.
    fn arm_once(&mut self, delay: D, token: TimerToken);

    /// Fires `token` every `period` until cancelled.
    fn arm_periodic(&mut self, period: D, token: TimerToken);

    /// Cancels any pending timer on `slot`. Cancelling an idle slot is a no-op.
    fn cancel(&mut self, slot: TimerSlot);
}

/// Allocates fresh epochs and remembers the single outstanding arming.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ArmedTimer {
    epoch: u32,
    pending: Option<TimerToken>,
}

impl ArmedTimer {
    pub(crate) const fn new() -> Self {
        Self {
            epoch: 0,
            pending: None,
        }
    }

    /// Produces the token for a new arming and records it as pending.
    pub(crate) fn next(&mut self, slot: TimerSlot) -> TimerToken {
        self.epoch = self.epoch.wrapping_add(1);
        let token = TimerToken::new(slot, self.epoch);
        self.pending = Some(token);
        token
    }

    /// True if `token` is the one currently armed.
    pub(crate) fn matches(&self, token: TimerToken) -> bool {
        self.pending == Some(token)
    }

    /// Consumes a one-shot arming. Returns false for stale tokens.
    pub(crate) fn take(&mut self, token: TimerToken) -> bool {
        if self.matches(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn clear(&mut self) {
        self.pending = None;
    }

    pub(crate) fn pending(&self) -> Option<TimerToken> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_arming_gets_a_new_epoch() {
        let mut armed = ArmedTimer::new();
        let first = armed.next(TimerSlot::Step);
        let second = armed.next(TimerSlot::Step);

        assert_ne!(first, second);
        assert!(!armed.matches(first));
        assert!(armed.matches(second));
    }

    #[test]
    fn take_consumes_the_pending_token_once() {
        let mut armed = ArmedTimer::new();
        let token = armed.next(TimerSlot::AutoStop);

        assert!(armed.take(token));
        assert!(!armed.take(token));
        assert_eq!(armed.pending(), None);
    }

    #[test]
    fn clear_invalidates_outstanding_token() {
        let mut armed = ArmedTimer::new();
        let token = armed.next(TimerSlot::Poll);
        armed.clear();

        assert!(!armed.matches(token));
    }

    #[test]
    fn slot_is_part_of_token_identity() {
        let step = TimerToken::new(TimerSlot::Step, 7);
        let auto_stop = TimerToken::new(TimerSlot::AutoStop, 7);
        assert_ne!(step, auto_stop);
        assert_eq!(step.slot(), TimerSlot::Step);
        assert_eq!(step.epoch(), 7);
    }
}
