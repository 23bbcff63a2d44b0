use std::sync::Arc;
use std::time::Duration;

use docfeed_breaker::CircuitBreaker;
use docfeed_core::clock::ManualClock;
use docfeed_dispatch::{DispatchError, Dispatcher, Document, Operation};
use docfeed_throttler::DynamicThrottler;

use super::{dispatcher, id, RecordingFeeder};

#[tokio::test]
async fn failures_are_terminal_but_do_not_stall_the_id() {
    let feeder = RecordingFeeder::new();
    let dispatcher = dispatcher(feeder.clone());
    let common = id("id:ns:type::doc1");

    feeder.fail_after(2);
    for operation in [
        Operation::Put,
        Operation::Put,
        Operation::Update, // fails
        Operation::Remove, // fails
    ] {
        let doc = Document::new(common.clone(), operation, "{}");
        dispatcher.enqueue(doc).await.unwrap();
    }
    dispatcher.close().await;

    let sent = feeder.documents();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent.iter().map(|d| d.operation).collect::<Vec<_>>(),
        vec![Operation::Put, Operation::Put]
    );
    assert_eq!(dispatcher.stats().errors, 2);

    // Dispatching more documents for the same id succeeds after a restart.
    feeder.clear_failures();
    dispatcher.start();
    dispatcher
        .enqueue(Document::put(common.clone(), "{}"))
        .await
        .unwrap();
    dispatcher
        .enqueue(Document::remove(common.clone()))
        .await
        .unwrap();
    dispatcher
        .enqueue(Document::put(id("id:ns:type::doc2"), "{}"))
        .await
        .unwrap();
    dispatcher
        .enqueue(Document::put(id("id:ns:type::doc3"), "{}"))
        .await
        .unwrap();
    dispatcher.close().await;

    assert_eq!(feeder.documents().len(), 6);
    let stats = dispatcher.stats();
    assert_eq!(stats.errors, 2);
    assert_eq!(stats.successes, 6);
    assert_eq!(stats.operations, 8);
}

#[tokio::test]
async fn open_breaker_rejects_new_documents() {
    let feeder = RecordingFeeder::new();
    let clock = ManualClock::new(Duration::ZERO);
    let breaker = Arc::new(
        CircuitBreaker::builder()
            .grace_period(Duration::from_secs(1))
            .doom_period(Duration::from_secs(5))
            .clock(clock.clock())
            .build(),
    );
    let dispatcher = Dispatcher::new(
        feeder.clone(),
        Arc::new(DynamicThrottler::new()),
        Arc::clone(&breaker),
    );

    breaker.failure();
    clock.advance(Duration::from_secs(10));

    let doc = Document::put(id("id:ns:type::doc1"), "{}");
    match dispatcher.enqueue(doc).await {
        Err(DispatchError::CircuitOpen(rejected)) => {
            assert_eq!(rejected, id("id:ns:type::doc1"));
        }
        other => panic!("expected a circuit-open rejection, got {other:?}"),
    }

    // The rejection is folded into the statistics as a synthetic failure
    // and the feeder never sees the document.
    let stats = dispatcher.stats();
    assert_eq!(stats.operations, 1);
    assert_eq!(stats.errors, 1);
    assert!(feeder.documents().is_empty());

    // Close still quiesces cleanly.
    dispatcher.close().await;
    assert_eq!(dispatcher.inflight(), 0);
}

#[tokio::test]
async fn recovered_breaker_admits_documents_again() {
    let feeder = RecordingFeeder::new();
    let clock = ManualClock::new(Duration::ZERO);
    let breaker = Arc::new(
        CircuitBreaker::builder()
            .grace_period(Duration::from_secs(1))
            .doom_period(Duration::from_secs(5))
            .clock(clock.clock())
            .build(),
    );
    let dispatcher = Dispatcher::new(
        feeder.clone(),
        Arc::new(DynamicThrottler::new()),
        Arc::clone(&breaker),
    );

    breaker.failure();
    clock.advance(Duration::from_secs(10));
    let doc = Document::put(id("id:ns:type::doc1"), "{}");
    assert!(dispatcher.enqueue(doc).await.is_err());

    breaker.success();
    dispatcher
        .enqueue(Document::put(id("id:ns:type::doc2"), "{}"))
        .await
        .unwrap();
    dispatcher.close().await;

    assert_eq!(feeder.documents().len(), 1);
    assert_eq!(dispatcher.stats().errors, 1);
    assert_eq!(dispatcher.stats().successes, 1);
}
