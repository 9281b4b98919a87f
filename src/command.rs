//! Command-based control for sequencers.

use crate::types::Status;

/// Actions for controlling a status sequencer.
///
/// Useful when requests arrive over a channel from other tasks rather than
/// as direct method calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerAction {
    /// Switch to a status and start its pattern.
    Set(Status),
    /// Stop and return to idle.
    Stop,
}

impl From<Status> for SequencerAction {
    fn from(status: Status) -> Self {
        SequencerAction::Set(status)
    }
}
