//! Periodic battery sampling.
//!
//! [`BatteryMonitor`] arms a periodic timer on a [`TimerService`], reads a
//! [`BatterySource`] every time it fires and feeds the reading to its
//! [`BatteryClassifier`].

use crate::battery::{
    BatteryClassifier, BatteryObserver, BatteryReading, BatteryStateChange, BatteryStatus,
    NoObserver,
};
use crate::time::TimeDuration;
use crate::timer::{ArmedTimer, TimerError, TimerOutcome, TimerService, TimerSlot, TimerToken};

/// Default interval between battery samples.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 5000;

/// Trait for abstracting the battery measurement hardware (PMIC, fuel gauge, ADC).
pub trait BatterySource {
    /// Takes one reading. Handle hardware errors internally.
    fn read(&mut self) -> BatteryReading;
}

/// Placeholder source reporting a healthy, discharging battery.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubBatterySource;

impl StubBatterySource {
    /// The reading returned on every call.
    pub const READING: BatteryReading = BatteryReading::new(85, 3.8, 0.0);
}

impl BatterySource for StubBatterySource {
    fn read(&mut self) -> BatteryReading {
        Self::READING
    }
}

/// Errors that can occur while setting up the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryError {
    /// The poll timer could not be created.
    TimerSetup(TimerError),
}

impl core::fmt::Display for BatteryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BatteryError::TimerSetup(err) => {
                write!(f, "battery monitor setup failed: {}", err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BatteryError {}

/// Samples a battery source on a fixed period and classifies each reading.
///
/// # Type Parameters
/// * `D` - Duration type of the timer service
/// * `S` - Timer service implementation type
/// * `B` - Battery source implementation type
/// * `O` - Observer notified of state changes
pub struct BatteryMonitor<
    D: TimeDuration,
    S: TimerService<D>,
    B: BatterySource,
    O: BatteryObserver = NoObserver,
> {
    classifier: BatteryClassifier<O>,
    source: B,
    timers: S,
    period: D,
    active: bool,
    armed: ArmedTimer,
}

impl<D, S, B, O> BatteryMonitor<D, S, B, O>
where
    D: TimeDuration,
    S: TimerService<D>,
    B: BatterySource,
    O: BatteryObserver,
{
    /// Creates a stopped monitor polling every [`DEFAULT_POLL_PERIOD_MS`].
    ///
    /// # Errors
    /// * `TimerSetup` - The timer service could not create the poll timer
    pub fn new(
        classifier: BatteryClassifier<O>,
        source: B,
        mut timers: S,
    ) -> Result<Self, BatteryError> {
        timers.create(TimerSlot::Poll).map_err(|err| {
            error!("failed to create battery monitor timer");
            BatteryError::TimerSetup(err)
        })?;
        info!("battery monitor initialized");

        Ok(Self {
            classifier,
            source,
            timers,
            period: D::from_millis(DEFAULT_POLL_PERIOD_MS),
            active: false,
            armed: ArmedTimer::new(),
        })
    }

    /// Sets the poll period. Takes effect on the next [`start`](Self::start).
    pub fn with_poll_period(mut self, period: D) -> Self {
        self.period = period;
        self
    }

    /// Starts periodic sampling, restarting the period if already running.
    pub fn start(&mut self) {
        self.timers.cancel(TimerSlot::Poll);
        let token = self.armed.next(TimerSlot::Poll);
        self.timers.arm_periodic(self.period, token);
        self.active = true;
        info!("battery monitor started");
    }

    /// Stops sampling and clears the low battery warning.
    pub fn stop(&mut self) {
        self.timers.cancel(TimerSlot::Poll);
        self.armed.clear();
        self.classifier.clear_low_warning();
        self.active = false;
        info!("battery monitor stopped");
    }

    /// Handles a fired poll timer.
    ///
    /// Samples only while running and only for the token armed by the latest
    /// [`start`](Self::start); anything else is [`TimerOutcome::Stale`].
    pub fn on_timer(&mut self, token: TimerToken) -> TimerOutcome {
        if !self.active || !self.armed.matches(token) {
            debug!("ignoring stale poll timer {}", token);
            return TimerOutcome::Stale;
        }
        self.poll();
        TimerOutcome::Sampled
    }

    /// Reads the source once and classifies the reading immediately.
    pub fn poll(&mut self) -> Option<BatteryStateChange> {
        let reading = self.source.read();
        self.classifier.update_reading(reading)
    }

    /// Returns true while periodic sampling is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the poll period.
    pub fn poll_period(&self) -> D {
        self.period
    }

    /// Returns a copy of the current battery status.
    pub fn snapshot(&self) -> BatteryStatus {
        self.classifier.snapshot()
    }

    /// Returns the classifier.
    pub fn classifier(&self) -> &BatteryClassifier<O> {
        &self.classifier
    }

    /// Returns the classifier mutably, for manual updates.
    pub fn classifier_mut(&mut self) -> &mut BatteryClassifier<O> {
        &mut self.classifier
    }

    /// Returns the battery source mutably.
    pub fn source_mut(&mut self) -> &mut B {
        &mut self.source
    }

    /// Returns the timer service used by this monitor.
    pub fn timers(&self) -> &S {
        &self.timers
    }
}
