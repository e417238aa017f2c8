//! Demonstration pipelines over fraction payloads.
//!
//! Four pipelines exercise the library end to end: asynchronous reduction,
//! hybrid multiplication with a blocking await, fully asynchronous
//! multiplication, and error recovery after a division by zero. Each pipeline
//! builds one report and hands it to a display sink, then signals bare
//! completion so a runner can sequence them uniformly.

use std::sync::{Arc, Mutex};

use coldcell::{AsyncValue, ExecutionContext};

use crate::fraction::{BigFraction, FractionError};

/// Narrow display sink: receives one formatted report per pipeline run
pub type Sink = Arc<dyn Fn(String) + Send + Sync>;

fn append(report: &Arc<Mutex<String>>, line: &str) {
    if let Ok(mut buffer) = report.lock() {
        buffer.push_str(line);
    }
}

fn flush(report: &Arc<Mutex<String>>, sink: &Sink) {
    if let Ok(mut buffer) = report.lock() {
        let rendered = std::mem::take(&mut *buffer);
        log::debug!("flushing pipeline report ({} bytes)", rendered.len());
        sink(rendered);
    }
}

/// Reduce an unreduced fraction on `context`, render it as a mixed number,
/// and report both forms through `sink`.
pub fn fraction_reduction(context: Arc<dyn ExecutionContext>, sink: Sink) -> AsyncValue<()> {
    let report = Arc::new(Mutex::new(String::from(">> fraction reduction\n")));
    let observed = Arc::clone(&report);
    let rendered = Arc::clone(&report);

    AsyncValue::from_try_computation(|| {
        BigFraction::new_unreduced(
            6_000_000_000_000_000_000_i64,
            8_000_000_000_000_000_000_i64,
        )
        .map(|unreduced| unreduced.reduce())
    })
    .run_on(context)
    .on_success(move |reduced| {
        append(&observed, &format!("     reduced fraction = {reduced}\n"));
    })
    .map(|reduced| reduced.to_mixed_string())
    .on_success(move |mixed| {
        append(&rendered, &format!("     mixed form = {mixed}\n"));
        flush(&rendered, &sink);
    })
    .then_void()
}

/// Multiply two fractions on `context`, then block the calling thread for
/// the product and report it through `sink`.
pub fn fraction_multiplication_blocking(
    context: Arc<dyn ExecutionContext>,
    sink: Sink,
) -> AsyncValue<()> {
    let mut report = String::from(">> fraction multiplication (blocking)\n");

    let mut product = AsyncValue::from_try_computation(|| {
        let lhs = BigFraction::new(1, 2)?;
        let rhs = BigFraction::new(2, 3)?;
        Ok::<_, FractionError>(lhs.multiply(&rhs))
    })
    .run_on(context);

    let line = match product.await_optional() {
        Some(product) => format!("     product = {}\n", product.to_mixed_string()),
        None => String::from("     product = error\n"),
    };
    report.push_str(&line);
    sink(report);

    AsyncValue::just(())
}

/// Multiply two fractions on `context` and report the product from the
/// pipeline itself, without blocking the caller.
pub fn fraction_multiplication(context: Arc<dyn ExecutionContext>, sink: Sink) -> AsyncValue<()> {
    let report = Arc::new(Mutex::new(String::from(">> fraction multiplication\n")));
    let observed = Arc::clone(&report);

    AsyncValue::from_try_computation(|| {
        let lhs = BigFraction::new(1, 2)?;
        let rhs = BigFraction::new(2, 3)?;
        Ok::<_, FractionError>(lhs.multiply(&rhs))
    })
    .run_on(context)
    .on_success(move |product| {
        append(&observed, &format!("     product = {}\n", product.to_mixed_string()));
        flush(&observed, &sink);
    })
    .then_void()
}

/// Divide by a zero fraction on `context`, substitute zero for the failure,
/// and report both the captured error and the substituted value.
pub fn fraction_error_recovery(context: Arc<dyn ExecutionContext>, sink: Sink) -> AsyncValue<()> {
    let report = Arc::new(Mutex::new(String::from(
        ">> fraction division error recovery\n",
    )));
    let captured = Arc::clone(&report);
    let displayed = Arc::clone(&report);

    AsyncValue::from_try_computation(|| {
        let numerator = BigFraction::new(62_675_744_i64, 15_668_936_i64)?;
        let denominator = BigFraction::zero();
        numerator.divide(&denominator)
    })
    .run_on(context)
    .on_error_resume(move |error| {
        append(&captured, &format!("     error = {error}\n"));
        AsyncValue::just(BigFraction::zero())
    })
    .on_success(move |fallback| {
        append(
            &displayed,
            &format!("     substituted value = {}\n", fallback.to_mixed_string()),
        );
        flush(&displayed, &sink);
    })
    .then_void()
}

/// Run every demo pipeline in sequence, awaiting each completion before the
/// next one is built
pub fn run_all(context: Arc<dyn ExecutionContext>, sink: &Sink) {
    let demos: [fn(Arc<dyn ExecutionContext>, Sink) -> AsyncValue<()>; 4] = [
        fraction_reduction,
        fraction_multiplication_blocking,
        fraction_multiplication,
        fraction_error_recovery,
    ];
    for demo in demos {
        let mut pipeline = demo(Arc::clone(&context), Arc::clone(sink));
        if pipeline.await_optional().is_none() {
            log::error!("demo pipeline failed to complete");
        }
    }
}
