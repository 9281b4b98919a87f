//! Status LED sequencer with pattern state management and timer coordination.
//!
//! Provides [`StatusSequencer`] which drives a single on/off indicator through
//! the blink pattern of the current [`Status`], arming one timer at a time and
//! advancing on every fired timer token. Also defines the [`Indicator`] trait
//! for hardware abstraction.

use crate::command::SequencerAction;
use crate::pattern::PatternConfig;
use crate::table::PatternTable;
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::timer::{ArmedTimer, TimerError, TimerOutcome, TimerService, TimerSlot, TimerToken};
use crate::types::Status;

/// Interval at which a sustained step is re-checked.
pub const SUSTAINED_RECHECK_MS: u64 = 1000;

/// Trait for abstracting the indicator hardware.
///
/// Implement this for your LED (GPIO pin, PWM channel, driver IC) to allow
/// the sequencer to control it. Handle any hardware errors internally - this
/// method cannot fail.
pub trait Indicator {
    /// Turns the indicator on or off.
    fn set_output(&mut self, on: bool);
}

/// The coarse state of a status sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternPhase {
    /// Nothing is driving the indicator. Indicator is off.
    Idle,
    /// Stepping through a pattern.
    Active,
    /// Pattern finished. Indicator is off, an auto-stop may be pending.
    Complete,
}

/// Errors that can occur during sequencer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// Raw status identifier outside the known set.
    InvalidStatus(u8),
    /// The pattern table has no entry for this status.
    NoPattern(Status),
    /// A timer could not be created during setup.
    TimerSetup(TimerError),
}

impl core::fmt::Display for SequencerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SequencerError::InvalidStatus(raw) => {
                write!(f, "invalid status identifier {}", raw)
            }
            SequencerError::NoPattern(status) => {
                write!(f, "no pattern configured for {:?}", status)
            }
            SequencerError::TimerSetup(err) => {
                write!(f, "sequencer setup failed: {}", err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SequencerError {}

/// Drives a single indicator through the blink pattern of the current status.
///
/// The sequencer never blocks. Every operation is a bounded state transition
/// that may drive the indicator and arm at most one timer on the
/// [`TimerService`]. When that timer fires, hand its token to
/// [`on_timer`](Self::on_timer); tokens from cancelled or superseded timers
/// are recognised and ignored.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source and pattern table references
/// * `I` - Time instant type
/// * `L` - Indicator implementation type
/// * `T` - Time source implementation type
/// * `S` - Timer service implementation type
/// * `N` - Maximum number of steps in patterns
pub struct StatusSequencer<
    't,
    I: TimeInstant,
    L: Indicator,
    T: TimeSource<I>,
    S: TimerService<I::Duration>,
    const N: usize,
> {
    indicator: L,
    time_source: &'t T,
    timers: S,
    table: &'t PatternTable<I::Duration, N>,
    status: Status,
    phase: PatternPhase,
    step_index: usize,
    flash_index: u8,
    output_on: bool,
    pattern_start_time: Option<I>,
    step_start_time: Option<I>,
    next_deadline: Option<I>,
    armed: ArmedTimer,
}

impl<'t, I, L, T, S, const N: usize> StatusSequencer<'t, I, L, T, S, N>
where
    I: TimeInstant,
    L: Indicator,
    T: TimeSource<I>,
    S: TimerService<I::Duration>,
{
    /// Creates an idle sequencer showing `Off` with the indicator turned off.
    ///
    /// # Errors
    /// * `TimerSetup` - The timer service could not create the step or auto-stop timer
    pub fn new(
        mut indicator: L,
        time_source: &'t T,
        mut timers: S,
        table: &'t PatternTable<I::Duration, N>,
    ) -> Result<Self, SequencerError> {
        for slot in [TimerSlot::Step, TimerSlot::AutoStop] {
            timers.create(slot).map_err(|err| {
                error!("failed to create {} timer", slot);
                SequencerError::TimerSetup(err)
            })?;
        }

        indicator.set_output(false);
        debug!("status sequencer initialized");

        Ok(Self {
            indicator,
            time_source,
            timers,
            table,
            status: Status::Off,
            phase: PatternPhase::Idle,
            step_index: 0,
            flash_index: 0,
            output_on: false,
            pattern_start_time: None,
            step_start_time: None,
            next_deadline: None,
            armed: ArmedTimer::new(),
        })
    }

    /// Handles a sequencer action by dispatching to the appropriate method.
    pub fn handle_action(&mut self, action: SequencerAction) -> Result<(), SequencerError> {
        match action {
            SequencerAction::Set(status) => self.set(status),
            SequencerAction::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    /// Switches to `status` and starts its pattern from the first step.
    ///
    /// Any pending timer from the previous status is cancelled first. The
    /// output is carried over: if the indicator is lit, the new pattern opens
    /// with the off half of its first flash. Statuses whose pattern never
    /// lights the indicator turn it off and go straight to `Complete`.
    ///
    /// # Errors
    /// * `NoPattern` - The table has no entry for `status`; nothing changes
    pub fn set(&mut self, status: Status) -> Result<(), SequencerError> {
        let table = self.table;
        let pattern = table.get(status).ok_or_else(|| {
            warn!("no pattern for {}", status);
            SequencerError::NoPattern(status)
        })?;

        self.cancel_timers();

        let now = self.time_source.now();
        self.status = status;
        self.step_index = 0;
        self.flash_index = 0;
        self.pattern_start_time = Some(now);
        self.step_start_time = Some(now);
        debug!("status set to {}", status);

        if pattern.is_noop() {
            self.drive(false);
            self.phase = PatternPhase::Complete;
            return Ok(());
        }

        self.phase = PatternPhase::Active;
        self.advance(pattern);
        Ok(())
    }

    /// Switches to the status with raw identifier `raw`.
    ///
    /// # Errors
    /// * `InvalidStatus` - `raw` does not name a status; nothing changes
    /// * `NoPattern` - The table has no entry for the status; nothing changes
    pub fn set_raw(&mut self, raw: u8) -> Result<(), SequencerError> {
        let status = Status::try_from(raw).inspect_err(|_| {
            warn!("rejected status identifier {}", raw);
        })?;
        self.set(status)
    }

    /// Cancels all timers, turns the indicator off and returns to `Idle`
    /// showing `Off`. Can be called from any phase; repeated calls are no-ops.
    pub fn stop(&mut self) {
        self.cancel_timers();
        self.drive(false);

        self.status = Status::Off;
        self.phase = PatternPhase::Idle;
        self.step_index = 0;
        self.flash_index = 0;
        self.pattern_start_time = None;
        self.step_start_time = None;
    }

    /// Handles a fired timer.
    ///
    /// Only the most recently armed token is honored. A token that was
    /// cancelled by `set`/`stop`, replaced by a newer arming, or delivered a
    /// second time returns [`TimerOutcome::Stale`] without touching state.
    pub fn on_timer(&mut self, token: TimerToken) -> TimerOutcome {
        if !self.armed.take(token) {
            debug!("ignoring stale timer {}", token);
            return TimerOutcome::Stale;
        }
        self.next_deadline = None;

        match token.slot() {
            TimerSlot::Step if self.phase == PatternPhase::Active => {
                let table = self.table;
                match table.get(self.status) {
                    Some(pattern) => {
                        self.advance(pattern);
                        TimerOutcome::Stepped
                    }
                    None => TimerOutcome::Stale,
                }
            }
            TimerSlot::AutoStop => {
                info!("auto-stopping {}", self.status);
                self.stop();
                TimerOutcome::AutoStopped
            }
            _ => TimerOutcome::Stale,
        }
    }

    /// Walks the pattern until the next edge that needs a timer, or until
    /// the pattern completes.
    fn advance(&mut self, pattern: &PatternConfig<I::Duration, N>) {
        loop {
            let Some(step) = pattern.get_step(self.step_index).copied() else {
                self.complete(pattern);
                return;
            };

            if step.is_finished(self.flash_index) {
                self.step_index += 1;
                if self.step_index == pattern.step_count() {
                    if !pattern.loops() {
                        self.complete(pattern);
                        return;
                    }
                    self.step_index = 0;
                }
                self.flash_index = 0;
                self.step_start_time = Some(self.time_source.now());
                continue;
            }

            let delay = if step.is_sustained() {
                // re-asserted on every recheck
                self.indicator.set_output(false);
                self.output_on = false;
                I::Duration::from_millis(SUSTAINED_RECHECK_MS)
            } else if !self.output_on {
                self.drive(true);
                step.on_time
            } else {
                self.drive(false);
                self.flash_index = self.flash_index.saturating_add(1);
                step.off_time
            };

            // zero-length edges are taken immediately instead of arming a timer
            if !delay.is_zero() {
                self.arm(TimerSlot::Step, delay);
                return;
            }
        }
    }

    fn complete(&mut self, pattern: &PatternConfig<I::Duration, N>) {
        self.phase = PatternPhase::Complete;
        self.drive(false);
        info!("pattern for {} complete", self.status);

        if pattern.auto_stop() && !pattern.auto_stop_delay().is_zero() {
            self.arm(TimerSlot::AutoStop, pattern.auto_stop_delay());
        }
    }

    fn arm(&mut self, slot: TimerSlot, delay: I::Duration) {
        let token = self.armed.next(slot);
        self.next_deadline = self.time_source.now().checked_add(delay);
        self.timers.arm_once(delay, token);
    }

    fn cancel_timers(&mut self) {
        self.timers.cancel(TimerSlot::Step);
        self.timers.cancel(TimerSlot::AutoStop);
        self.armed.clear();
        self.next_deadline = None;
    }

    /// Updates the indicator only when the output actually changes.
    /// Sustained steps write through directly.
    fn drive(&mut self, on: bool) {
        if self.output_on != on {
            self.indicator.set_output(on);
            self.output_on = on;
        }
    }

    /// Shows the power-on pattern.
    pub fn power_on(&mut self) -> Result<(), SequencerError> {
        self.set(Status::PowerOn)
    }

    /// Shows the BLE pairing pattern.
    pub fn ble_enter_pairing(&mut self) -> Result<(), SequencerError> {
        self.set(Status::BlePairing)
    }

    /// Shows the BLE pairing success pattern.
    pub fn ble_pairing_success(&mut self) -> Result<(), SequencerError> {
        self.set(Status::BlePairSuccess)
    }

    /// Shows the BLE pairing failure pattern.
    pub fn ble_pairing_failed(&mut self) -> Result<(), SequencerError> {
        self.set(Status::BlePairFail)
    }

    /// Shows the factory reset pattern.
    pub fn factory_reset(&mut self) -> Result<(), SequencerError> {
        self.set(Status::FactoryReset)
    }

    /// Shows the low battery warning.
    pub fn low_battery_warning(&mut self) -> Result<(), SequencerError> {
        self.set(Status::LowBattery)
    }

    /// Stops the low battery warning if it is what the indicator is showing.
    pub fn stop_low_battery_warning(&mut self) {
        if self.status == Status::LowBattery {
            self.stop();
        }
    }

    /// Shows the charging pattern.
    pub fn charging_started(&mut self) -> Result<(), SequencerError> {
        self.set(Status::Charging)
    }

    /// Shows the charge complete pattern.
    pub fn charging_complete(&mut self) -> Result<(), SequencerError> {
        self.set(Status::ChargeComplete)
    }

    /// Shows the OTA update pattern.
    pub fn ota_update_start(&mut self) -> Result<(), SequencerError> {
        self.set(Status::OtaUpdate)
    }

    /// Shows the OTA success pattern.
    pub fn ota_update_success(&mut self) -> Result<(), SequencerError> {
        self.set(Status::OtaSuccess)
    }

    /// Shows the OTA failure pattern.
    pub fn ota_update_failed(&mut self) -> Result<(), SequencerError> {
        self.set(Status::OtaFail)
    }

    /// Returns the status currently selected.
    pub fn current(&self) -> Status {
        self.status
    }

    /// Returns true while a pattern is being stepped through.
    pub fn is_active(&self) -> bool {
        self.phase == PatternPhase::Active
    }

    /// Returns the current phase.
    pub fn phase(&self) -> PatternPhase {
        self.phase
    }

    /// Index of the step being played.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Number of flashes completed in the current step.
    pub fn flash_index(&self) -> u8 {
        self.flash_index
    }

    /// Returns the last command sent to the indicator.
    pub fn output_on(&self) -> bool {
        self.output_on
    }

    /// Token of the timer currently armed, if any.
    pub fn pending_timer(&self) -> Option<TimerToken> {
        self.armed.pending()
    }

    /// When the armed timer is due, if any.
    pub fn next_deadline(&self) -> Option<I> {
        self.next_deadline
    }

    /// Time since the current status was set, if not idle.
    pub fn pattern_elapsed(&self) -> Option<I::Duration> {
        self.pattern_start_time
            .map(|start| self.time_source.now().duration_since(start))
    }

    /// Time since the current step was entered, if not idle.
    pub fn step_elapsed(&self) -> Option<I::Duration> {
        self.step_start_time
            .map(|start| self.time_source.now().duration_since(start))
    }

    /// Returns the indicator driven by this sequencer.
    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    /// Returns the timer service used by this sequencer.
    pub fn timers(&self) -> &S {
        &self.timers
    }

    /// Returns the pattern table.
    pub fn table(&self) -> &'t PatternTable<I::Duration, N> {
        self.table
    }
}
