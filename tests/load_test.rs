//! Load testing for the instrumentation engine.

use std::time::Duration;

use statter::instrument::{FUNC_CALLED, FUNC_ERROR, FUNC_STUCK, FUNC_TIMING};
use statter::sink::CallKind;
use statter::{tags, Registry};

mod common;

#[tokio::test(start_paused = true)]
async fn test_concurrent_instrumentation_leaves_no_watchdogs() {
    let (registry, sink) = common::recording_registry("datadog", 1_000);

    let concurrency = 50;
    let calls_per_task = 40;

    let mut tasks = Vec::new();
    for worker in 0..concurrency {
        let registry: Registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..calls_per_task {
                let _ = registry
                    .instrument_async("work", &tags! { "worker" => worker }, async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        if i % 10 == 0 {
                            Err("every tenth call fails")
                        } else {
                            Ok(i)
                        }
                    })
                    .await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Watchdogs run on wall-clock time, so wait out the threshold for real.
    std::thread::sleep(Duration::from_millis(1_500));

    let total = concurrency * calls_per_task;
    assert_eq!(sink.named(FUNC_CALLED).len(), total);
    assert_eq!(sink.named(FUNC_TIMING).len(), total);
    assert_eq!(sink.named(FUNC_ERROR).len(), total / 10);
    assert!(sink.named(FUNC_STUCK).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reinit_under_concurrent_reporting() {
    let (registry, sink) = common::recording_registry("datadog", 60_000);
    let datadog = registry.config().unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..500 {
                registry.func_call_and_timing("hot", &tags! {}).stop();
                tokio::task::yield_now().await;
            }
        }));
    }

    for _ in 0..20 {
        registry.disable();
        registry.with_sink(sink.clone(), &datadog);
        tokio::task::yield_now().await;
    }
    for task in tasks {
        task.await.unwrap();
    }
    registry.report_func_call("hot", &tags! {});

    let reported: Vec<_> = sink
        .calls()
        .into_iter()
        .filter(|c| c.kind != CallKind::Close)
        .collect();
    assert!(!reported.is_empty());
    assert!(reported.iter().all(|c| c.tags == vec!["func_name:hot"]));
}
