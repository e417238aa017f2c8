//! Typed step descriptors and the driver loop that executes them

use std::any::Any;
use std::collections::VecDeque;

use crate::error::{Result, ValueError};

/// Type-erased payload flowing between steps
pub(crate) type Payload = Box<dyn Any + Send>;

/// Outcome of the source computation or of any step
pub(crate) type Outcome = Result<Payload>;

/// One attached operator, kept in attachment order
pub(crate) enum Step {
    /// Replace the payload on success; skipped on failure
    Transform(Box<dyn FnOnce(Payload) -> Outcome + Send>),
    /// Observe the payload on success; skipped on failure
    Inspect(Box<dyn FnOnce(&Payload) + Send>),
    /// Switch to a fallback pipeline on failure; skipped on success
    Recover(Box<dyn FnOnce(ValueError) -> RawPipeline + Send>),
}

/// An unexecuted pipeline: a source computation plus its attached steps
pub(crate) struct RawPipeline {
    pub(crate) source: Box<dyn FnOnce() -> Outcome + Send>,
    pub(crate) steps: VecDeque<Step>,
}

impl RawPipeline {
    pub(crate) fn new(source: Box<dyn FnOnce() -> Outcome + Send>) -> Self {
        Self {
            source,
            steps: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }
}

/// Execute a pipeline to completion on the current thread.
///
/// Steps run in attachment order. A failure skips `Transform` and `Inspect`
/// steps until a `Recover` step intercepts it; the fallback pipeline is
/// spliced into the front of the queue, so the loop never recurses and stack
/// depth stays bounded. Failures raised while a spliced recovery segment is
/// executing are re-tagged as recovery failures.
pub(crate) fn run(pipeline: RawPipeline) -> Outcome {
    let RawPipeline { source, mut steps } = pipeline;

    // Number of steps at the front of the queue that belong to a spliced
    // recovery pipeline.
    let mut recovery_steps = 0usize;
    let mut outcome = source();

    while let Some(step) = steps.pop_front() {
        let in_recovery = recovery_steps > 0;
        if in_recovery {
            recovery_steps -= 1;
        }

        outcome = match (step, outcome) {
            (Step::Transform(apply), Ok(payload)) => {
                let next = apply(payload);
                if in_recovery {
                    next.map_err(ValueError::into_recovery)
                } else {
                    next
                }
            }
            (Step::Inspect(observe), Ok(payload)) => {
                observe(&payload);
                Ok(payload)
            }
            (Step::Recover(handler), Err(error)) => {
                tracing::warn!(error = %error, "pipeline failed, switching to recovery value");
                let fallback = handler(error);
                recovery_steps += fallback.steps.len();
                for step in fallback.steps.into_iter().rev() {
                    steps.push_front(step);
                }
                (fallback.source)().map_err(ValueError::into_recovery)
            }
            (Step::Transform(_) | Step::Inspect(_), Err(error)) => Err(error),
            (Step::Recover(_), Ok(payload)) => Ok(payload),
        };
    }

    if let Err(error) = &outcome {
        tracing::debug!(error = %error, "pipeline settled with failure");
    }
    outcome
}
