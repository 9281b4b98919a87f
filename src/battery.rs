//! Battery state classification.
//!
//! [`BatteryClassifier`] turns raw readings (percent, voltage, charging
//! current) into a discrete [`BatteryState`] using fixed thresholds and tells
//! a [`BatteryObserver`] whenever that state changes. Classification has no
//! hysteresis: every reading is judged on the thresholds alone.

use crate::types::Status;

/// Discrete battery condition derived from a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryState {
    /// No reading classified yet.
    #[default]
    Unknown,
    /// Discharging above the low threshold.
    Normal,
    /// Discharging at or below the low threshold.
    Low,
    /// Discharging at or below the critical threshold.
    Critical,
    /// Charging below the full threshold.
    Charging,
    /// Charging at or above the full threshold.
    Full,
}

impl BatteryState {
    /// Suggested indicator status for this battery state.
    ///
    /// This is a policy hint for the code wiring the classifier to a
    /// sequencer; nothing in this crate applies it automatically.
    pub fn indicator_status(self) -> Option<Status> {
        match self {
            BatteryState::Low | BatteryState::Critical => Some(Status::LowBattery),
            BatteryState::Charging => Some(Status::Charging),
            BatteryState::Full => Some(Status::ChargeComplete),
            BatteryState::Normal | BatteryState::Unknown => None,
        }
    }

    /// True for the states that raise the low battery warning.
    pub fn is_low(self) -> bool {
        matches!(self, BatteryState::Low | BatteryState::Critical)
    }
}

/// Classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryThresholds {
    /// Low battery warning at or below this percentage.
    pub low_percent: u8,
    /// Critical battery at or below this percentage.
    pub critical_percent: u8,
    /// Considered full at or above this percentage while charging.
    pub full_percent: u8,
    /// Minimum current (mA) to consider the battery charging. Exclusive.
    pub charging_current_ma: f32,
}

impl BatteryThresholds {
    /// Thresholds used by the device: 20 % low, 10 % critical, 95 % full, 50 mA charging.
    pub const DEFAULT: Self = Self {
        low_percent: 20,
        critical_percent: 10,
        full_percent: 95,
        charging_current_ma: 50.0,
    };

    /// True if `current_ma` is strictly above the charging threshold.
    #[inline]
    pub fn is_charging(&self, current_ma: f32) -> bool {
        current_ma > self.charging_current_ma
    }

    /// Classifies a reading.
    pub fn classify(&self, percent: u8, current_ma: f32) -> BatteryState {
        if self.is_charging(current_ma) {
            if percent >= self.full_percent {
                BatteryState::Full
            } else {
                BatteryState::Charging
            }
        } else if percent <= self.critical_percent {
            BatteryState::Critical
        } else if percent <= self.low_percent {
            BatteryState::Low
        } else {
            BatteryState::Normal
        }
    }
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One raw battery sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryReading {
    /// State of charge, 0-100.
    pub percent: u8,
    /// Terminal voltage in volts.
    pub voltage: f32,
    /// Charging current in milliamps.
    pub current_ma: f32,
}

impl BatteryReading {
    /// Creates a reading.
    pub const fn new(percent: u8, voltage: f32, current_ma: f32) -> Self {
        Self {
            percent,
            voltage,
            current_ma,
        }
    }
}

/// Snapshot of the classifier's view of the battery.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryStatus {
    /// State of charge, 0-100.
    pub percent: u8,
    /// Terminal voltage in volts.
    pub voltage: f32,
    /// Charging current in milliamps.
    pub charging_current_ma: f32,
    /// Classified state.
    pub state: BatteryState,
    /// Whether the current exceeds the charging threshold.
    pub is_charging: bool,
    /// Whether the low battery warning is raised.
    pub low_warning_active: bool,
}

impl BatteryStatus {
    /// A full, discharging battery: the state assumed before the first reading.
    pub const INITIAL: Self = Self {
        percent: 100,
        voltage: 4.2,
        charging_current_ma: 0.0,
        state: BatteryState::Normal,
        is_charging: false,
        low_warning_active: false,
    };

    /// Returns the raw reading behind this status.
    pub fn reading(&self) -> BatteryReading {
        BatteryReading::new(self.percent, self.voltage, self.charging_current_ma)
    }
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// A battery state transition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryStateChange {
    /// State before the reading.
    pub old: BatteryState,
    /// State after the reading.
    pub new: BatteryState,
    /// Full status after the reading.
    pub snapshot: BatteryStatus,
}

/// Receives battery state changes.
///
/// Implemented for closures taking `(old, new, &status)`, for [`NoObserver`],
/// and for pairs of observers so several can be chained.
pub trait BatteryObserver {
    /// Called once per state change, after the warning flag has been updated.
    fn on_battery_state_changed(
        &mut self,
        old: BatteryState,
        new: BatteryState,
        status: &BatteryStatus,
    );
}

/// Observer that ignores every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl BatteryObserver for NoObserver {
    fn on_battery_state_changed(&mut self, _: BatteryState, _: BatteryState, _: &BatteryStatus) {}
}

impl<F> BatteryObserver for F
where
    F: FnMut(BatteryState, BatteryState, &BatteryStatus),
{
    fn on_battery_state_changed(
        &mut self,
        old: BatteryState,
        new: BatteryState,
        status: &BatteryStatus,
    ) {
        self(old, new, status)
    }
}

impl<A: BatteryObserver, B: BatteryObserver> BatteryObserver for (A, B) {
    fn on_battery_state_changed(
        &mut self,
        old: BatteryState,
        new: BatteryState,
        status: &BatteryStatus,
    ) {
        self.0.on_battery_state_changed(old, new, status);
        self.1.on_battery_state_changed(old, new, status);
    }
}

/// Classifies battery readings and reports state changes.
///
/// Every reading is stored, whether or not the state changed. Calls must be
/// serialised by the host; the classifier is meant to be driven from a single
/// timer context.
pub struct BatteryClassifier<O: BatteryObserver = NoObserver> {
    status: BatteryStatus,
    thresholds: BatteryThresholds,
    observer: O,
}

impl BatteryClassifier<NoObserver> {
    /// Creates a classifier without an observer.
    pub fn new(thresholds: BatteryThresholds) -> Self {
        Self::with_observer(thresholds, NoObserver)
    }
}

impl Default for BatteryClassifier<NoObserver> {
    fn default() -> Self {
        Self::new(BatteryThresholds::DEFAULT)
    }
}

impl<O: BatteryObserver> BatteryClassifier<O> {
    /// Creates a classifier reporting to `observer`.
    pub fn with_observer(thresholds: BatteryThresholds, observer: O) -> Self {
        Self {
            status: BatteryStatus::INITIAL,
            thresholds,
            observer,
        }
    }

    /// Replaces the observer, keeping the current status and thresholds.
    pub fn set_observer<P: BatteryObserver>(self, observer: P) -> BatteryClassifier<P> {
        BatteryClassifier {
            status: self.status,
            thresholds: self.thresholds,
            observer,
        }
    }

    /// Stores a reading and reclassifies.
    ///
    /// Percentages above 100 are clamped. Returns the transition when the
    /// state changed; the observer has already been told by then.
    pub fn update(
        &mut self,
        percent: u8,
        voltage: f32,
        current_ma: f32,
    ) -> Option<BatteryStateChange> {
        self.status.percent = percent.min(100);
        self.status.voltage = voltage;
        self.status.charging_current_ma = current_ma;
        self.reclassify()
    }

    /// Stores a [`BatteryReading`] and reclassifies.
    pub fn update_reading(&mut self, reading: BatteryReading) -> Option<BatteryStateChange> {
        self.update(reading.percent, reading.voltage, reading.current_ma)
    }

    /// Reclassifies the last stored reading.
    ///
    /// Useful after [`set_thresholds`](Self::set_thresholds): if the new
    /// thresholds put the same reading in a different state, the observer
    /// hears about it.
    pub fn force_update(&mut self) -> Option<BatteryStateChange> {
        self.reclassify()
    }

    fn reclassify(&mut self) -> Option<BatteryStateChange> {
        let old = self.status.state;
        let current_ma = self.status.charging_current_ma;

        self.status.is_charging = self.thresholds.is_charging(current_ma);
        self.status.state = self.thresholds.classify(self.status.percent, current_ma);

        let new = self.status.state;
        if new == old {
            return None;
        }

        info!(
            "battery state changed: {} -> {} ({}%, {}V, {}mA)",
            old,
            new,
            self.status.percent,
            self.status.voltage,
            self.status.charging_current_ma
        );
        self.track_warning(new);
        self.observer
            .on_battery_state_changed(old, new, &self.status);

        Some(BatteryStateChange {
            old,
            new,
            snapshot: self.status,
        })
    }

    fn track_warning(&mut self, new: BatteryState) {
        match new {
            BatteryState::Low | BatteryState::Critical => {
                if !self.status.low_warning_active {
                    self.status.low_warning_active = true;
                    warn!("low battery warning activated");
                }
            }
            BatteryState::Charging | BatteryState::Full | BatteryState::Normal => {
                if self.status.low_warning_active {
                    self.status.low_warning_active = false;
                    info!("low battery warning cleared");
                }
            }
            BatteryState::Unknown => {}
        }
    }

    /// Clears the low battery warning without reclassifying.
    pub fn clear_low_warning(&mut self) {
        self.status.low_warning_active = false;
    }

    /// Returns a copy of the current status.
    pub fn snapshot(&self) -> BatteryStatus {
        self.status
    }

    /// Returns the classified state.
    pub fn state(&self) -> BatteryState {
        self.status.state
    }

    /// Returns the active thresholds.
    pub fn thresholds(&self) -> BatteryThresholds {
        self.thresholds
    }

    /// Replaces the thresholds. Takes effect on the next update.
    pub fn set_thresholds(&mut self, thresholds: BatteryThresholds) {
        self.thresholds = thresholds;
    }

    /// Returns the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Returns the observer mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Feeds a 15 %, 3.2 V, discharging reading.
    pub fn simulate_low_battery(&mut self) -> Option<BatteryStateChange> {
        info!("simulating low battery");
        self.update(15, 3.2, 0.0)
    }

    /// Feeds a 30 %, 3.5 V, 500 mA reading.
    pub fn simulate_charging_start(&mut self) -> Option<BatteryStateChange> {
        info!("simulating charging start");
        self.update(30, 3.5, 500.0)
    }

    /// Feeds a 100 %, 4.2 V, 20 mA trickle reading.
    ///
    /// 20 mA is below the charging threshold, so with default thresholds this
    /// classifies as `Normal`, not `Full`.
    pub fn simulate_charging_complete(&mut self) -> Option<BatteryStateChange> {
        info!("simulating charging complete");
        self.update(100, 4.2, 20.0)
    }
}
