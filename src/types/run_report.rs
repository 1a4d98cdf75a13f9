use std::fmt;
use std::time::Duration;

/// Summary of one [`Runner::run`](crate::Runner::run) call.
///
/// Records which rules had their conditions evaluated, which of those
/// triggered, how many action invocations ran, and the wall-clock duration.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct RunReport {
    evaluated: Vec<usize>,
    triggered: Vec<usize>,
    actions_invoked: usize,
    duration: Duration,
}

impl RunReport {
    pub(crate) fn new(
        evaluated: Vec<usize>,
        triggered: Vec<usize>,
        actions_invoked: usize,
        duration: Duration,
    ) -> Self {
        Self {
            evaluated,
            triggered,
            actions_invoked,
            duration,
        }
    }

    /// Indices of rules whose conditions were evaluated, in order.
    #[must_use]
    pub fn evaluated(&self) -> &[usize] {
        &self.evaluated
    }

    /// Indices of rules whose conditions held.
    #[must_use]
    pub fn triggered(&self) -> &[usize] {
        &self.triggered
    }

    /// Whether at least one rule triggered.
    #[must_use]
    pub fn triggered_any(&self) -> bool {
        !self.triggered.is_empty()
    }

    #[must_use]
    pub fn actions_invoked(&self) -> usize {
        self.actions_invoked
    }

    /// Wall-clock duration of the run.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |indices: &[usize]| {
            indices
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "evaluated: [{}]", join(&self.evaluated))?;
        write!(f, ", triggered: [{}]", join(&self.triggered))?;
        write!(f, ", actions: {}", self.actions_invoked)?;
        write!(f, ", duration: {:?}", self.duration)
    }
}
