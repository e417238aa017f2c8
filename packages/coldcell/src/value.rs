//! Cold single-value pipelines

use std::fmt::Display;
use std::future::IntoFuture;
use std::mem;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::context::{ExecutionContext, InlineContext};
use crate::error::{Result, ValueError};
use crate::future::ValueFuture;
use crate::pipeline::{self, Outcome, Payload, RawPipeline, Step};

/// A deferred, single-value asynchronous computation.
///
/// An `AsyncValue` is cold: nothing executes until [`start`](Self::start) is
/// called, a consumer blocks on [`await_optional`](Self::await_optional), or
/// the value is `.await`ed. Operators assemble a descriptor chain; the chain
/// runs at most once per instance, on the context declared with
/// [`run_on`](Self::run_on), and the settled outcome is cached for the
/// lifetime of the instance.
pub struct AsyncValue<T> {
    state: State<T>,
}

enum State<T> {
    /// Pipeline assembled, nothing dispatched yet
    Unstarted {
        pipeline: RawPipeline,
        context: Arc<dyn ExecutionContext>,
    },
    /// Dispatched; the handoff cell will deliver the outcome
    Running { receiver: oneshot::Receiver<Outcome> },
    /// Terminal; cached so repeated awaits observe the same outcome
    Settled(Result<T>),
}

impl<T: Send + 'static> AsyncValue<T> {
    /// Defer a computation; `f` is not invoked until the value is started
    #[must_use]
    pub fn from_computation<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::from_pipeline(RawPipeline::new(Box::new(move || {
            Ok(Box::new(f()) as Payload)
        })))
    }

    /// Defer a fallible computation; a returned `Err` settles the pipeline
    /// with a computation failure
    #[must_use]
    pub fn from_try_computation<F, E>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: Display,
    {
        Self::from_pipeline(RawPipeline::new(Box::new(move || match f() {
            Ok(value) => Ok(Box::new(value) as Payload),
            Err(err) => Err(ValueError::computation(err.to_string())),
        })))
    }

    /// An already-successful value; the usual return of a recovery handler
    #[must_use]
    pub fn just(value: T) -> Self {
        Self::from_computation(move || value)
    }

    /// An already-failed value
    #[must_use]
    pub fn error(error: ValueError) -> Self {
        Self::from_pipeline(RawPipeline::new(Box::new(move || Err(error))))
    }

    fn from_pipeline(pipeline: RawPipeline) -> Self {
        Self {
            state: State::Unstarted {
                pipeline,
                context: Arc::new(InlineContext),
            },
        }
    }

    /// Declare which context executes the computation and every attached
    /// step.
    ///
    /// Composable: nothing runs here. Declarations after dispatch are
    /// ignored.
    #[must_use]
    pub fn run_on(mut self, context: Arc<dyn ExecutionContext>) -> Self {
        match &mut self.state {
            State::Unstarted { context: slot, .. } => *slot = context,
            State::Running { .. } | State::Settled(_) => {
                tracing::debug!("run_on called after dispatch; context unchanged");
            }
        }
        self
    }

    /// Apply a pure transformation once the pipeline succeeds; skipped on
    /// failure
    #[must_use]
    pub fn map<U, G>(self, transform: G) -> AsyncValue<U>
    where
        U: Send + 'static,
        G: FnOnce(T) -> U + Send + 'static,
    {
        let (mut pipeline, context) = self.into_parts();
        pipeline.push(Step::Transform(Box::new(move |payload| {
            match payload.downcast::<T>() {
                Ok(value) => Ok(Box::new(transform(*value)) as Payload),
                Err(_) => Err(ValueError::transform("pipeline payload type mismatch")),
            }
        })));
        AsyncValue {
            state: State::Unstarted { pipeline, context },
        }
    }

    /// Apply a fallible transformation; a returned `Err` settles the
    /// pipeline with a transform failure
    #[must_use]
    pub fn try_map<U, G, E>(self, transform: G) -> AsyncValue<U>
    where
        U: Send + 'static,
        G: FnOnce(T) -> std::result::Result<U, E> + Send + 'static,
        E: Display,
    {
        let (mut pipeline, context) = self.into_parts();
        pipeline.push(Step::Transform(Box::new(move |payload| {
            match payload.downcast::<T>() {
                Ok(value) => match transform(*value) {
                    Ok(mapped) => Ok(Box::new(mapped) as Payload),
                    Err(err) => Err(ValueError::transform(err.to_string())),
                },
                Err(_) => Err(ValueError::transform("pipeline payload type mismatch")),
            }
        })));
        AsyncValue {
            state: State::Unstarted { pipeline, context },
        }
    }

    /// Observe the value for its side effect when the pipeline succeeds,
    /// leaving value and type untouched; skipped on failure
    #[must_use]
    pub fn on_success<G>(self, observer: G) -> Self
    where
        G: FnOnce(&T) + Send + 'static,
    {
        let (mut pipeline, context) = self.into_parts();
        pipeline.push(Step::Inspect(Box::new(move |payload| {
            if let Some(value) = payload.downcast_ref::<T>() {
                observer(value);
            }
        })));
        Self {
            state: State::Unstarted { pipeline, context },
        }
    }

    /// On failure, switch to the pipeline returned by `handler`; never
    /// invoked on success.
    ///
    /// The interception is logged once at the point of substitution. The
    /// fallback executes on the thread already driving this pipeline; a
    /// failing fallback propagates as a recovery failure.
    #[must_use]
    pub fn on_error_resume<H>(self, handler: H) -> Self
    where
        H: FnOnce(ValueError) -> AsyncValue<T> + Send + 'static,
    {
        let (mut pipeline, context) = self.into_parts();
        pipeline.push(Step::Recover(Box::new(move |error| {
            let (fallback, _context) = handler(error).into_parts();
            fallback
        })));
        Self {
            state: State::Unstarted { pipeline, context },
        }
    }

    /// Discard the value and signal only completion; failures are forwarded.
    ///
    /// Lets independent pipelines be sequenced uniformly.
    #[must_use]
    pub fn then_void(self) -> AsyncValue<()> {
        self.map(|_| ())
    }

    /// Dispatch the computation chain to its execution context.
    ///
    /// Idempotent: each instance dispatches its underlying computation at
    /// most once.
    pub fn start(&mut self) {
        if !matches!(self.state, State::Unstarted { .. }) {
            return;
        }
        match mem::replace(&mut self.state, State::Settled(Err(ValueError::Disconnected))) {
            State::Unstarted { pipeline, context } => {
                let (sender, receiver) = oneshot::channel();
                tracing::debug!(
                    context = context.name(),
                    steps = pipeline.steps.len(),
                    "dispatching pipeline"
                );
                context.dispatch(Box::new(move || {
                    let outcome = pipeline::run(pipeline);
                    let _ = sender.send(outcome);
                }));
                self.state = State::Running { receiver };
            }
            other => self.state = other,
        }
    }

    /// Block the calling thread until the chain settles; `Some` on success,
    /// `None` on failure.
    ///
    /// Starts the pipeline if it has not been started yet. A settled outcome
    /// is cached, so calling this again returns the same result without
    /// re-executing anything. Must not be called from inside an async
    /// runtime; async callers `.await` the value instead.
    pub fn await_optional(&mut self) -> Option<T>
    where
        T: Clone,
    {
        self.start();
        if matches!(self.state, State::Running { .. }) {
            match mem::replace(&mut self.state, State::Settled(Err(ValueError::Disconnected))) {
                State::Running { receiver } => {
                    let outcome = match receiver.blocking_recv() {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ValueError::Disconnected),
                    };
                    self.state = State::Settled(downcast_outcome(outcome));
                }
                other => self.state = other,
            }
        }
        match &self.state {
            State::Settled(Ok(value)) => Some(value.clone()),
            State::Settled(Err(_)) | State::Unstarted { .. } | State::Running { .. } => None,
        }
    }

    fn into_parts(self) -> (RawPipeline, Arc<dyn ExecutionContext>) {
        match self.state {
            State::Unstarted { pipeline, context } => (pipeline, context),
            State::Running { receiver } => (
                RawPipeline::new(Box::new(move || match receiver.blocking_recv() {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ValueError::Disconnected),
                })),
                Arc::new(InlineContext),
            ),
            State::Settled(outcome) => (
                RawPipeline::new(Box::new(move || {
                    outcome.map(|value| Box::new(value) as Payload)
                })),
                Arc::new(InlineContext),
            ),
        }
    }
}

/// Recover the typed value from a settled, type-erased outcome
pub(crate) fn downcast_outcome<T: Send + 'static>(outcome: Outcome) -> Result<T> {
    match outcome {
        Ok(payload) => match payload.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(ValueError::transform("pipeline payload type mismatch")),
        },
        Err(error) => Err(error),
    }
}

impl<T: Send + 'static> IntoFuture for AsyncValue<T> {
    type Output = Result<T>;
    type IntoFuture = ValueFuture<T>;

    /// Start the pipeline and resolve through the same handoff cell the
    /// blocking await uses
    fn into_future(mut self) -> ValueFuture<T> {
        self.start();
        match self.state {
            State::Running { receiver } => ValueFuture::new(receiver),
            State::Settled(outcome) => ValueFuture::ready(outcome),
            // start() leaves no pipeline unstarted
            State::Unstarted { .. } => ValueFuture::ready(Err(ValueError::Disconnected)),
        }
    }
}
