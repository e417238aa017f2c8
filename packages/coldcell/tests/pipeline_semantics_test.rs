//! Pipeline semantics: composition, short-circuiting, recovery, caching

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use coldcell::{AsyncValue, InlineContext, ValueError, WorkerPool};
use proptest::prelude::*;

#[test]
fn map_composes_with_the_computation() {
    let mut chained = AsyncValue::from_computation(|| 21)
        .map(|n| n * 2)
        .map(|n| n + 1);
    let mut fused = AsyncValue::from_computation(|| (21 * 2) + 1);

    assert_eq!(chained.await_optional(), fused.await_optional());
    assert_eq!(chained.await_optional(), Some(43));
}

proptest! {
    #[test]
    fn map_composition_matches_a_fused_computation(seed in any::<i32>()) {
        let mut chained = AsyncValue::from_computation(move || seed)
            .map(|n| n.wrapping_mul(3))
            .map(|n| n.wrapping_sub(7));
        let mut fused =
            AsyncValue::from_computation(move || seed.wrapping_mul(3).wrapping_sub(7));

        prop_assert_eq!(chained.await_optional(), fused.await_optional());
    }
}

#[test]
fn failure_short_circuits_success_path_steps() {
    let mapped = Arc::new(AtomicBool::new(false));
    let observed = Arc::new(AtomicBool::new(false));
    let mapped_flag = Arc::clone(&mapped);
    let observed_flag = Arc::clone(&observed);

    let mut value = AsyncValue::<i32>::error(ValueError::computation("boom"))
        .map(move |n| {
            mapped_flag.store(true, Ordering::SeqCst);
            n
        })
        .on_success(move |_| {
            observed_flag.store(true, Ordering::SeqCst);
        });

    assert_eq!(value.await_optional(), None);
    assert!(!mapped.load(Ordering::SeqCst), "map ran on a failed pipeline");
    assert!(
        !observed.load(Ordering::SeqCst),
        "on_success ran on a failed pipeline"
    );
}

#[test]
fn recovery_substitutes_the_handler_pipeline() {
    let seen = Arc::new(Mutex::new(None::<ValueError>));
    let seen_slot = Arc::clone(&seen);

    let mut value =
        AsyncValue::from_try_computation(|| Err::<i32, _>("denominator must not be zero"))
            .on_error_resume(move |error| {
                if let Ok(mut slot) = seen_slot.lock() {
                    *slot = Some(error);
                }
                AsyncValue::just(0)
            });

    assert_eq!(value.await_optional(), Some(0));

    let captured = seen
        .lock()
        .expect("tracker mutex should not be poisoned")
        .clone()
        .expect("recovery handler should have received the error");
    assert!(matches!(captured, ValueError::Computation(_)));
    assert!(captured.to_string().contains("denominator must not be zero"));
}

#[test]
fn recovery_is_skipped_on_success() {
    let invoked = Arc::new(AtomicBool::new(false));
    let invoked_flag = Arc::clone(&invoked);

    let mut value = AsyncValue::from_computation(|| 7).on_error_resume(move |_| {
        invoked_flag.store(true, Ordering::SeqCst);
        AsyncValue::just(0)
    });

    assert_eq!(value.await_optional(), Some(7));
    assert!(
        !invoked.load(Ordering::SeqCst),
        "recovery handler ran on a successful pipeline"
    );
}

#[test]
fn steps_after_recovery_see_the_substituted_value() {
    let rendered = Arc::new(Mutex::new(String::new()));
    let rendered_slot = Arc::clone(&rendered);

    let mut value = AsyncValue::<i32>::error(ValueError::computation("boom"))
        .on_error_resume(|_| AsyncValue::just(0))
        .map(|n| n.to_string())
        .on_success(move |text| {
            if let Ok(mut slot) = rendered_slot.lock() {
                slot.push_str(text);
            }
        });

    assert_eq!(value.await_optional(), Some("0".to_string()));
    assert_eq!(
        rendered
            .lock()
            .expect("tracker mutex should not be poisoned")
            .as_str(),
        "0"
    );
}

#[test]
fn then_void_hides_the_value_and_forwards_failure() {
    let mut completed = AsyncValue::from_computation(|| 41).then_void();
    assert_eq!(completed.await_optional(), Some(()));

    let mut failed = AsyncValue::<i32>::error(ValueError::computation("boom")).then_void();
    assert_eq!(failed.await_optional(), None);
}

#[test]
fn the_computation_executes_at_most_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let mut value = AsyncValue::from_computation(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        5
    });
    value.start();
    value.start();

    assert_eq!(value.await_optional(), Some(5));
    assert_eq!(value.await_optional(), Some(5));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn steps_run_in_attachment_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&order);
    let second = Arc::clone(&order);

    let mut value = AsyncValue::from_computation(|| 1)
        .on_success(move |_| {
            if let Ok(mut seen) = first.lock() {
                seen.push("before map");
            }
        })
        .map(|n| n + 1)
        .on_success(move |_| {
            if let Ok(mut seen) = second.lock() {
                seen.push("after map");
            }
        });

    assert_eq!(value.await_optional(), Some(2));
    assert_eq!(
        *order.lock().expect("tracker mutex should not be poisoned"),
        vec!["before map", "after map"]
    );
}

#[test]
fn worker_pool_runs_the_chain_off_the_calling_thread() {
    let pool = Arc::new(
        WorkerPool::builder()
            .name("semantics-pool")
            .build()
            .expect("spawning the test pool should succeed"),
    );
    let caller = thread::current().id();

    let mut value = AsyncValue::from_computation(|| thread::current().id()).run_on(pool);
    let ran_on = value
        .await_optional()
        .expect("pipeline on the pool should succeed");

    assert_ne!(ran_on, caller);
}

#[test]
fn inline_context_is_deterministic() {
    let mut value = AsyncValue::from_computation(|| 9)
        .run_on(Arc::new(InlineContext))
        .map(|n| n * 9);
    assert_eq!(value.await_optional(), Some(81));
}

#[tokio::test]
async fn async_consumption_resolves_through_the_same_handoff() {
    let pool = WorkerPool::shared();
    let result = AsyncValue::from_computation(|| 6)
        .run_on(pool)
        .map(|n| n * 7)
        .await;
    assert_eq!(result, Ok(42));
}

#[tokio::test]
async fn try_map_failure_surfaces_as_a_transform_error() {
    let result = AsyncValue::from_computation(|| 1)
        .try_map(|_| Err::<i32, _>("bad digit"))
        .await;
    assert!(matches!(result, Err(ValueError::Transform(_))));
}

#[tokio::test]
async fn failing_recovery_surfaces_as_a_recovery_error() {
    let result = AsyncValue::<i32>::error(ValueError::computation("boom"))
        .on_error_resume(|_| AsyncValue::error(ValueError::computation("fallback broke")))
        .await;

    let error = result.err().expect("the fallback should have failed");
    assert!(matches!(error, ValueError::Recovery(_)));
    assert!(error.to_string().contains("fallback broke"));
}

#[test]
fn already_settled_values_can_still_be_awaited() {
    let mut value = AsyncValue::from_computation(|| 13);
    assert_eq!(value.await_optional(), Some(13));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("building the test runtime should succeed");
    assert_eq!(runtime.block_on(async move { value.await }), Ok(13));
}
