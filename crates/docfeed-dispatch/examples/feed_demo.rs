//! Feeds a batch of generated documents through the dispatcher and prints
//! the accumulated statistics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docfeed_breaker::CircuitBreaker;
use docfeed_dispatch::{Dispatcher, Document, FeedResult, Feeder, OperationStatus};
use docfeed_throttler::DynamicThrottler;

/// A toy backend: a little latency, and every 10th operation fails.
struct DemoFeeder;

#[async_trait]
impl Feeder for DemoFeeder {
    async fn send(&self, document: Document) -> FeedResult {
        tokio::time::sleep(Duration::from_millis(2)).await;
        let body_len = document.body.len() as u64;
        if document.id.user_specific().ends_with('9') {
            FeedResult::failure(document.id, OperationStatus::TransientFailure)
        } else {
            FeedResult::success(document.id).with_bytes(body_len, 16)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new(
        Arc::new(DemoFeeder),
        Arc::new(DynamicThrottler::new()),
        Arc::new(CircuitBreaker::new(
            Duration::from_secs(10),
            Duration::from_secs(60),
        )),
    );

    for n in 0..200 {
        let id = format!("id:demo:doc::{n}").parse()?;
        let body = format!(r#"{{"fields":{{"n":{n}}}}}"#);
        dispatcher.enqueue(Document::put(id, body)).await?;
    }
    dispatcher.close().await;

    let stats = dispatcher.stats();
    println!("operations: {}", stats.operations);
    println!("successes:  {}", stats.successes);
    println!("errors:     {}", stats.errors);
    println!("bytes sent: {}", stats.bytes_sent);
    Ok(())
}
