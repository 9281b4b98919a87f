//! Core types for pattern construction.

use crate::sequencer::SequencerError;
use crate::time::TimeDuration;

/// A visual state the indicator can communicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Solid for two seconds after boot.
    PowerOn = 0,
    /// Short flash every second while advertising.
    BlePairing,
    /// Solid for two seconds once bonded.
    BlePairSuccess,
    /// Double flash, pause, then double flash forever.
    BlePairFail,
    /// Solid for two seconds before wiping settings.
    FactoryReset,
    /// Slow blink while the battery is low.
    LowBattery,
    /// Short flash every three seconds while an update downloads.
    OtaUpdate,
    /// Off.
    OtaSuccess,
    /// Triple fast flash every three seconds.
    OtaFail,
    /// Held on while charging.
    Charging,
    /// Off once the battery is full.
    ChargeComplete,
    /// Off.
    Off,
}

impl Status {
    /// Number of statuses.
    pub const COUNT: usize = 12;

    /// Every status in identifier order.
    pub const ALL: [Status; Status::COUNT] = [
        Status::PowerOn,
        Status::BlePairing,
        Status::BlePairSuccess,
        Status::BlePairFail,
        Status::FactoryReset,
        Status::LowBattery,
        Status::OtaUpdate,
        Status::OtaSuccess,
        Status::OtaFail,
        Status::Charging,
        Status::ChargeComplete,
        Status::Off,
    ];

    /// Returns the status identifier as a table index.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Status {
    type Error = SequencerError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Status::ALL
            .get(usize::from(raw))
            .copied()
            .ok_or(SequencerError::InvalidStatus(raw))
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

/// How many times a pattern should repeat.
///
/// Only the first step's repeat count is consulted when a pattern runs off its
/// last step: `Infinite` restarts the pattern, anything else completes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopCount {
    /// Repeat a specific number of times.
    Finite(u8),

    /// Repeat indefinitely.
    Infinite,
}

impl LoopCount {
    /// Converts a raw repeat count where `0` means infinite.
    #[inline]
    pub const fn from_raw(count: u8) -> Self {
        match count {
            0 => LoopCount::Infinite,
            n => LoopCount::Finite(n),
        }
    }

    /// Returns true for `Infinite`.
    #[inline]
    pub fn is_infinite(&self) -> bool {
        matches!(self, LoopCount::Infinite)
    }
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Finite(1)
    }
}

/// A single step in a blink pattern.
///
/// With a non-zero `flash_count` the step produces that many on/off flashes
/// before moving on. A `flash_count` of zero toggles forever without ever
/// leaving the step. A step with both durations zero is a sustained-off hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternStep<D: TimeDuration> {
    /// How long the indicator stays on per flash.
    pub on_time: D,

    /// How long the indicator stays off per flash.
    pub off_time: D,

    /// Repeat behaviour (only meaningful on the first step).
    pub repeat: LoopCount,

    /// Number of flashes before advancing.
    pub flash_count: u8,
}

impl<D: TimeDuration> PatternStep<D> {
    /// Creates a new pattern step.
    #[inline]
    pub fn new(on_time: D, off_time: D, repeat: LoopCount, flash_count: u8) -> Self {
        Self {
            on_time,
            off_time,
            repeat,
            flash_count,
        }
    }

    /// Creates a step from raw millisecond values, `repeat == 0` meaning infinite.
    #[inline]
    pub fn from_millis(on_ms: u64, off_ms: u64, repeat: u8, flash_count: u8) -> Self {
        Self::new(
            D::from_millis(on_ms),
            D::from_millis(off_ms),
            LoopCount::from_raw(repeat),
            flash_count,
        )
    }

    /// True when both durations are zero.
    #[inline]
    pub fn is_sustained(&self) -> bool {
        self.on_time.is_zero() && self.off_time.is_zero()
    }

    /// True once `flash_index` flashes satisfy a counted step.
    #[inline]
    pub fn is_finished(&self, flash_index: u8) -> bool {
        self.flash_count > 0 && flash_index >= self.flash_count
    }
}

/// Pattern validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// No steps provided.
    EmptyPattern,

    /// Pattern capacity exceeded.
    CapacityExceeded,
}

impl core::fmt::Display for PatternError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PatternError::EmptyPattern => {
                write!(f, "pattern must have at least one step")
            }
            PatternError::CapacityExceeded => {
                write!(f, "pattern capacity exceeded")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}
