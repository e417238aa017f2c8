//! Demonstration pipelines for `coldcell`: arbitrary-precision fraction
//! arithmetic flowing through lazily-started single-value pipelines.

#![forbid(unsafe_code)]

pub mod fraction;
pub mod pipelines;

pub use fraction::{BigFraction, FractionError};
pub use pipelines::Sink;
