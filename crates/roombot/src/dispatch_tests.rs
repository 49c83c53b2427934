//! Dispatch-pass behavior of the handler tree.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;
use tokio::sync::Barrier;

use crate::action::{self, Action};
use crate::events::Event;
use crate::filter::{self, Filter};
use crate::handler::Handler;
use crate::test_support::{chat, context};
use crate::HandlerFailure;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Log, label: &str) -> impl Action {
    let log = Arc::clone(log);
    let label = label.to_string();
    action::from_fn(move |_, _| log.lock().push(label.clone()))
}

/// Filter that records each evaluation before answering.
fn counting_filter(log: &Log, label: &str, pass: bool) -> impl Filter {
    let log = Arc::clone(log);
    let label = label.to_string();
    filter::from_fn(move |_, _| {
        log.lock().push(label.clone());
        pass
    })
}

fn is_chat(text: &'static str) -> impl Filter {
    filter::from_fn(move |event, _| {
        matches!(event, Event::ChatEvent { message, .. } if message == text)
    })
}

#[tokio::test]
async fn only_passing_sibling_runs() {
    let log = log();
    let root = Handler::new();
    root.child(filter::from_fn(|_, _| false))(record(&log, "a"));
    root.child(filter::from_fn(|_, _| true))(record(&log, "b"));

    root.run(&chat("hi"), &context()).await.unwrap();

    assert_eq!(*log.lock(), vec!["b"]);
}

#[tokio::test]
async fn ping_scenario_records_only_matching_chat() {
    let seen = Arc::new(Mutex::new(Vec::<Event>::new()));
    let sink = Arc::clone(&seen);
    let root = Handler::new();
    root.child(is_chat("ping"))(action::from_fn(move |event, _| {
        sink.lock().push(event.clone())
    }));
    let ctx = context();

    root.run(&chat("ping"), &ctx).await.unwrap();
    assert_eq!(seen.lock().len(), 1);

    root.run(&chat("pong"), &ctx).await.unwrap();
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(seen.lock()[0], chat("ping"));
}

#[tokio::test]
async fn rejected_filter_short_circuits_subtree() {
    let log = log();
    let root = Handler::new();
    let gate = root.child(counting_filter(&log, "gate", false))(record(&log, "gate-action"));
    let inner = gate.child(counting_filter(&log, "inner", true))(record(&log, "inner-action"));
    inner.child(counting_filter(&log, "leaf", true))(record(&log, "leaf-action"));

    root.run(&chat("hi"), &context()).await.unwrap();

    assert_eq!(*log.lock(), vec!["gate"]);
}

#[tokio::test]
async fn filter_is_evaluated_once_per_pass() {
    let log = log();
    let root = Handler::new();
    let node = root.child(counting_filter(&log, "f", true))(record(&log, "act"));
    node.add_child(Handler::new()).unwrap();
    node.add_child(Handler::new()).unwrap();

    root.run(&chat("hi"), &context()).await.unwrap();

    assert_eq!(*log.lock(), vec!["f", "act"]);
}

#[tokio::test]
async fn node_without_filter_or_action_still_reaches_children() {
    let log = log();
    let root = Handler::new();
    let bare = Handler::new();
    root.add_child(bare.clone()).unwrap();
    bare.child(filter::kind("ChatEvent"))(record(&log, "leaf"));

    root.run(&chat("hi"), &context()).await.unwrap();

    assert_eq!(*log.lock(), vec!["leaf"]);
}

#[tokio::test]
async fn parent_action_completes_before_children_start() {
    let log = log();
    let root = Handler::new();
    let slow_log = Arc::clone(&log);
    root.set(filter::kind("ChatEvent"))(action::from_async(move |_event, _ctx| {
        let log = Arc::clone(&slow_log);
        async move {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            log.lock().push("parent".to_string());
            Ok::<_, anyhow::Error>(())
        }
    }));
    root.child(filter::kind("ChatEvent"))(record(&log, "child"));

    root.run(&chat("hi"), &context()).await.unwrap();

    assert_eq!(*log.lock(), vec!["parent", "child"]);
}

#[tokio::test]
async fn run_waits_for_every_child() {
    let log = log();
    let root = Handler::new();
    for (ix, yields) in [7usize, 0, 3, 11].into_iter().enumerate() {
        let log = Arc::clone(&log);
        root.child(filter::kind("ChatEvent"))(action::from_async(move |_event, _ctx| {
            let log = Arc::clone(&log);
            async move {
                for _ in 0..yields {
                    tokio::task::yield_now().await;
                }
                log.lock().push(format!("child-{ix}"));
                Ok::<_, anyhow::Error>(())
            }
        }));
    }

    root.run(&chat("hi"), &context()).await.unwrap();

    let mut finished = log.lock().clone();
    assert_eq!(finished.len(), 4);
    // Completion order follows the yield counts, not insertion order.
    assert_eq!(finished[0], "child-1");
    finished.sort();
    assert_eq!(finished, ["child-0", "child-1", "child-2", "child-3"]);
}

#[tokio::test]
async fn siblings_run_concurrently() {
    let barrier = Arc::new(Barrier::new(2));
    let root = Handler::new();
    for _ in 0..2 {
        let barrier = Arc::clone(&barrier);
        root.child(filter::kind("ChatEvent"))(action::from_async(move |_event, _ctx| {
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
                Ok::<_, anyhow::Error>(())
            }
        }));
    }

    // Sequential siblings would never get past the barrier.
    tokio::time::timeout(Duration::from_secs(5), root.run(&chat("hi"), &context()))
        .await
        .expect("siblings did not run concurrently")
        .unwrap();
}

#[tokio::test]
async fn failures_are_collected_without_cancelling_siblings() {
    let log = log();
    let root = Handler::new();

    let broken_action = Handler::named("broken-action");
    broken_action.set_action(action::from_async(|_event, _ctx| async {
        Err::<(), _>(anyhow!("reply failed"))
    }));
    let never = Handler::named("never");
    never.set_action(record(&log, "never"));
    broken_action.add_child(never).unwrap();

    let broken_filter = Handler::named("broken-filter");
    broken_filter.set_filter(filter::from_async(|_event, _ctx| async {
        Err::<bool, _>(anyhow!("lookup failed"))
    }));

    let healthy = Handler::named("healthy");
    healthy.set_action(record(&log, "healthy"));

    root.add_child(broken_action).unwrap();
    root.add_child(broken_filter).unwrap();
    root.add_child(healthy).unwrap();

    let err = root.run(&chat("hi"), &context()).await.unwrap_err();

    assert_eq!(*log.lock(), vec!["healthy"]);
    assert_eq!(err.failures.len(), 2);
    assert_eq!(err.to_string(), "2 handler(s) failed during dispatch");

    let paths: Vec<_> = err.failures.iter().map(HandlerFailure::path).collect();
    assert_eq!(paths, ["root/broken-action", "root/broken-filter"]);
    assert!(matches!(err.failures[0], HandlerFailure::Action { .. }));
    assert!(matches!(err.failures[1], HandlerFailure::Filter { .. }));
}

#[tokio::test]
async fn tree_can_grow_between_passes() {
    let log = log();
    let root = Handler::new();
    let ctx = context();

    root.run(&chat("hi"), &ctx).await.unwrap();
    root.child(filter::kind("ChatEvent"))(record(&log, "late"));
    root.run(&chat("hi"), &ctx).await.unwrap();

    assert_eq!(*log.lock(), vec!["late"]);
}
