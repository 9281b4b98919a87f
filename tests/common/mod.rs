//! Shared test infrastructure for status-indicator integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use status_indicator::{
    BatteryReading, BatterySource, BatteryState, BatteryStatus, Indicator, PatternTable,
    StatusSequencer, TimeDuration, TimeInstant, TimeSource, TimerError, TimerOutcome,
    TimerService, TimerSlot, TimerToken,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        self.0.checked_add(duration.0).map(TestInstant)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn now_millis(&self) -> u64 {
        self.current_time.get().0
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Indicator
// ============================================================================

/// Mock indicator that records every output command
pub struct MockIndicator {
    on: bool,
    history: heapless::Vec<bool, 128>,
}

impl MockIndicator {
    pub fn new() -> Self {
        Self {
            on: false,
            history: heapless::Vec::new(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn history(&self) -> &[bool] {
        &self.history
    }
}

impl Indicator for MockIndicator {
    fn set_output(&mut self, on: bool) {
        self.on = on;
        let _ = self.history.push(on);
    }
}

// ============================================================================
// Mock Timer Service
// ============================================================================

/// A timer currently waiting to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Armed {
    pub token: TimerToken,
    pub delay: TestDuration,
    pub periodic: bool,
}

/// Scripted timer service. Holds at most one pending timer per slot, like one
/// RTOS software timer per slot, and lets tests fire them by hand.
pub struct MockTimers {
    fail_slot: Option<TimerSlot>,
    created: RefCell<Vec<TimerSlot>>,
    pending: RefCell<Vec<Armed>>,
    arm_log: RefCell<Vec<Armed>>,
    cancels: Cell<usize>,
}

impl MockTimers {
    pub fn new() -> Self {
        Self {
            fail_slot: None,
            created: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            arm_log: RefCell::new(Vec::new()),
            cancels: Cell::new(0),
        }
    }

    /// A timer service that cannot create `slot`
    pub fn failing(slot: TimerSlot) -> Self {
        Self {
            fail_slot: Some(slot),
            ..Self::new()
        }
    }

    pub fn created(&self) -> Vec<TimerSlot> {
        self.created.borrow().clone()
    }

    pub fn pending(&self, slot: TimerSlot) -> Option<Armed> {
        self.pending
            .borrow()
            .iter()
            .find(|armed| armed.token.slot() == slot)
            .copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Delays of every arming so far, in order
    pub fn armed_delays(&self) -> Vec<u64> {
        self.arm_log.borrow().iter().map(|armed| armed.delay.0).collect()
    }

    pub fn arm_count(&self) -> usize {
        self.arm_log.borrow().len()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.get()
    }

    /// Removes and returns the next one-shot timer to expire. Periodic timers
    /// stay armed and are returned as-is.
    pub fn expire(&self, slot: TimerSlot) -> Option<Armed> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|armed| armed.token.slot() == slot)?;
        let armed = pending[index];
        if !armed.periodic {
            pending.remove(index);
        }
        Some(armed)
    }

    fn arm(&self, armed: Armed) {
        let mut pending = self.pending.borrow_mut();
        pending.retain(|p| p.token.slot() != armed.token.slot());
        pending.push(armed);
        self.arm_log.borrow_mut().push(armed);
    }
}

impl TimerService<TestDuration> for &MockTimers {
    fn create(&mut self, slot: TimerSlot) -> Result<(), TimerError> {
        if self.fail_slot == Some(slot) {
            return Err(TimerError::Unavailable(slot));
        }
        self.created.borrow_mut().push(slot);
        Ok(())
    }

    fn arm_once(&mut self, delay: TestDuration, token: TimerToken) {
        self.arm(Armed {
            token,
            delay,
            periodic: false,
        });
    }

    fn arm_periodic(&mut self, period: TestDuration, token: TimerToken) {
        self.arm(Armed {
            token,
            delay: period,
            periodic: true,
        });
    }

    fn cancel(&mut self, slot: TimerSlot) {
        self.cancels.set(self.cancels.get() + 1);
        self.pending
            .borrow_mut()
            .retain(|armed| armed.token.slot() != slot);
    }
}

// ============================================================================
// Sequencer helpers
// ============================================================================

pub type TestSequencer<'a> =
    StatusSequencer<'a, TestInstant, MockIndicator, MockTimeSource, &'a MockTimers, 4>;

pub fn standard_table() -> PatternTable<TestDuration, 4> {
    PatternTable::standard().unwrap()
}

pub fn new_sequencer<'a>(
    clock: &'a MockTimeSource,
    timers: &'a MockTimers,
    table: &'a PatternTable<TestDuration, 4>,
) -> TestSequencer<'a> {
    StatusSequencer::new(MockIndicator::new(), clock, timers, table).unwrap()
}

/// Lets the pending step or auto-stop timer run out and delivers it.
/// Returns None when nothing is armed.
pub fn fire(
    sequencer: &mut TestSequencer<'_>,
    clock: &MockTimeSource,
    timers: &MockTimers,
) -> Option<TimerOutcome> {
    let armed = timers
        .expire(TimerSlot::Step)
        .or_else(|| timers.expire(TimerSlot::AutoStop))?;
    clock.advance(armed.delay);
    Some(sequencer.on_timer(armed.token))
}

/// Fires `count` timers, panicking if the sequencer runs out of timers first.
pub fn fire_n(
    sequencer: &mut TestSequencer<'_>,
    clock: &MockTimeSource,
    timers: &MockTimers,
    count: usize,
) {
    for i in 0..count {
        assert!(
            fire(sequencer, clock, timers).is_some(),
            "no timer armed after {} fires",
            i
        );
    }
}

// ============================================================================
// Battery helpers
// ============================================================================

/// Battery source replaying a fixed list of readings, repeating the last one
pub struct ScriptedSource {
    readings: Vec<BatteryReading>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(readings: &[BatteryReading]) -> Self {
        Self {
            readings: readings.to_vec(),
            next: 0,
        }
    }
}

impl BatterySource for ScriptedSource {
    fn read(&mut self) -> BatteryReading {
        let index = self.next.min(self.readings.len() - 1);
        self.next += 1;
        self.readings[index]
    }
}

/// Recorded observer call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub old: BatteryState,
    pub new: BatteryState,
    pub status: BatteryStatus,
}

/// Observer that records every state change
#[derive(Default)]
pub struct RecordingObserver {
    pub transitions: Vec<Transition>,
}

impl status_indicator::BatteryObserver for RecordingObserver {
    fn on_battery_state_changed(
        &mut self,
        old: BatteryState,
        new: BatteryState,
        status: &BatteryStatus,
    ) {
        self.transitions.push(Transition {
            old,
            new,
            status: *status,
        });
    }
}
