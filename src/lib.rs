#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Status`**: The visual state to communicate (`PowerOn`, `BlePairing`, `OtaFail`, ...)
//! - **`PatternStep`**: On time + off time + flash count + repeat count
//! - **`PatternConfig`**: Ordered steps plus auto-stop behaviour for one status
//! - **`PatternTable`**: Read-only mapping from every status to its pattern
//! - **`StatusSequencer`**: Drives one indicator through the pattern of the current status
//! - **`Indicator`**: Trait to implement for your LED hardware
//! - **`TimerService`**: Trait to implement for your runtime's timers
//! - **`TimeSource`**: Trait to implement for your clock
//! - **`BatteryClassifier`**: Turns battery readings into states and reports changes
//! - **`BatteryMonitor`**: Samples a `BatterySource` on a periodic timer
//!
//! Timers are never called back directly. The host delivers each fired
//! `TimerToken` to the component's `on_timer`, and tokens from cancelled or
//! superseded timers are ignored.

#[macro_use]
mod log;

pub mod time;
pub mod timer;
pub mod types;
pub mod pattern;
pub mod table;
pub mod sequencer;
pub mod command;
pub mod battery;
pub mod monitor;

pub use types::{LoopCount, PatternError, PatternStep, Status};
pub use pattern::{PatternBuilder, PatternConfig};
pub use table::PatternTable;
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use timer::{TimerError, TimerOutcome, TimerService, TimerSlot, TimerToken};
pub use sequencer::{
    Indicator, PatternPhase, SequencerError, StatusSequencer, SUSTAINED_RECHECK_MS,
};
pub use command::SequencerAction;
pub use battery::{
    BatteryClassifier, BatteryObserver, BatteryReading, BatteryState, BatteryStateChange,
    BatteryStatus, BatteryThresholds, NoObserver,
};
pub use monitor::{
    BatteryError, BatteryMonitor, BatterySource, StubBatterySource, DEFAULT_POLL_PERIOD_MS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_compile() {
        let _ = LoopCount::Finite(1);
        let _ = LoopCount::Infinite;
        let _ = PatternPhase::Idle;
        let _ = SequencerAction::Stop;
        let _ = BatteryState::Unknown;
    }
}
