//! Lazily-started single-value async pipelines.
//!
//! An [`AsyncValue`] wraps a deferred computation together with a chain of
//! transformation, observation, and recovery steps, plus a declaration of
//! which [`ExecutionContext`] runs the work. Nothing executes until the value
//! is started or awaited; a failure short-circuits success-path steps until a
//! recovery step intercepts it.
//!
//! ```
//! use coldcell::AsyncValue;
//!
//! let mut answer = AsyncValue::from_computation(|| 6 * 7).map(|n| n.to_string());
//! assert_eq!(answer.await_optional(), Some("42".to_string()));
//! ```

#![forbid(unsafe_code)]

pub mod context;
pub mod error;
mod future;
mod pipeline;
mod value;

pub use context::{ExecutionContext, InlineContext, Job, WorkerPool, WorkerPoolBuilder};
pub use error::{Result, ValueError};
pub use future::ValueFuture;
pub use value::AsyncValue;
