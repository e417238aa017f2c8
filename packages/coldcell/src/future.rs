//! Concrete future type for async pipeline consumption

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{Result, ValueError};
use crate::pipeline::{Outcome, Payload};
use crate::value::downcast_outcome;

/// Concrete future resolving to the settled outcome of an
/// [`AsyncValue`](crate::AsyncValue) pipeline.
///
/// Obtained by `.await`ing an `AsyncValue`; polls the one-shot handoff cell
/// the executing side settles through.
pub struct ValueFuture<T> {
    receiver: oneshot::Receiver<Outcome>,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> ValueFuture<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<Outcome>) -> Self {
        Self {
            receiver,
            _payload: PhantomData,
        }
    }

    /// A future that is already settled
    pub(crate) fn ready(outcome: Result<T>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(outcome.map(|value| Box::new(value) as Payload));
        Self::new(receiver)
    }
}

impl<T: Send + 'static> Future for ValueFuture<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(downcast_outcome(outcome)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ValueError::Disconnected)),
            Poll::Pending => Poll::Pending,
        }
    }
}
