use crate::time::TimeDuration;
use crate::types::{PatternError, PatternStep};
use heapless::Vec;

/// A blink pattern: an ordered list of steps plus auto-stop behaviour.
///
/// Patterns are validated at construction and never change afterwards. The
/// sequencer walks the steps edge by edge, restarting from the first step when
/// the first step's repeat count is infinite and completing otherwise.
///
/// # Type Parameters
/// * `D` - The duration type (e.g., `embassy_time::Duration`)
/// * `N` - Maximum number of steps this pattern can hold
#[derive(Debug, Clone)]
pub struct PatternConfig<D: TimeDuration, const N: usize> {
    steps: Vec<PatternStep<D>, N>,
    auto_stop: bool,
    auto_stop_delay: D,
}

impl<D: TimeDuration, const N: usize> PatternConfig<D, N> {
    /// Creates a new pattern builder.
    pub fn builder() -> PatternBuilder<D, N> {
        PatternBuilder::new()
    }

    /// Returns the steps in playback order. Never empty.
    pub fn steps(&self) -> &[PatternStep<D>] {
        &self.steps
    }

    /// Returns the number of steps in this pattern.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns a reference to the step at the given index.
    pub fn get_step(&self, index: usize) -> Option<&PatternStep<D>> {
        self.steps.get(index)
    }

    /// Returns true if the pattern restarts after its last step.
    ///
    /// Only the first step's repeat count decides this.
    pub fn loops(&self) -> bool {
        self.steps.first().is_some_and(|step| step.repeat.is_infinite())
    }

    /// Returns true if a completed pattern should return to idle.
    pub fn auto_stop(&self) -> bool {
        self.auto_stop
    }

    /// Delay between completion and the automatic stop.
    pub fn auto_stop_delay(&self) -> D {
        self.auto_stop_delay
    }

    /// Returns true if every step is a sustained-off hold.
    ///
    /// Such patterns never drive the indicator, so selecting them completes
    /// immediately without arming any timer.
    pub fn is_noop(&self) -> bool {
        self.steps.iter().all(PatternStep::is_sustained)
    }
}

/// Builder for constructing validated patterns.
#[derive(Debug)]
pub struct PatternBuilder<D: TimeDuration, const N: usize> {
    steps: Vec<PatternStep<D>, N>,
    auto_stop: bool,
    auto_stop_delay: D,
}

impl<D: TimeDuration, const N: usize> PatternBuilder<D, N> {
    /// Creates a new empty pattern builder.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            auto_stop: false,
            auto_stop_delay: D::ZERO,
        }
    }

    /// Adds a step to the pattern.
    ///
    /// # Errors
    /// * `CapacityExceeded` - The pattern already holds `N` steps
    pub fn step(mut self, step: PatternStep<D>) -> Result<Self, PatternError> {
        self.steps
            .push(step)
            .map_err(|_| PatternError::CapacityExceeded)?;
        Ok(self)
    }

    /// Enables auto-stop after completion with the given delay.
    ///
    /// A zero delay marks the pattern as auto-stopping without ever arming the
    /// auto-stop timer, so the sequencer rests in `Complete`.
    pub fn auto_stop(mut self, delay: D) -> Self {
        self.auto_stop = true;
        self.auto_stop_delay = delay;
        self
    }

    /// Builds and validates the pattern.
    ///
    /// # Errors
    /// * `EmptyPattern` - No steps were added
    pub fn build(self) -> Result<PatternConfig<D, N>, PatternError> {
        if self.steps.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        Ok(PatternConfig {
            steps: self.steps,
            auto_stop: self.auto_stop,
            auto_stop_delay: self.auto_stop_delay,
        })
    }
}

impl<D: TimeDuration, const N: usize> Default for PatternBuilder<D, N> {
    fn default() -> Self {
        Self::new()
    }
}
