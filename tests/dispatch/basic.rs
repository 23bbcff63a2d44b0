use super::{dispatcher, id, RecordingFeeder};
use docfeed_dispatch::{DispatchError, Document};

#[tokio::test]
async fn every_accepted_document_reaches_the_feeder() {
    let feeder = RecordingFeeder::new();
    let dispatcher = dispatcher(feeder.clone());

    dispatcher
        .enqueue(Document::put(
            id("id:ns:type::doc1"),
            br#"{"fields":{"foo":"123"}}"#.to_vec(),
        ))
        .await
        .unwrap();
    dispatcher
        .enqueue(Document::put(
            id("id:ns:type::doc2"),
            br#"{"fields":{"bar":"456"}}"#.to_vec(),
        ))
        .await
        .unwrap();
    dispatcher.close().await;

    assert_eq!(feeder.documents().len(), 2);
    let stats = dispatcher.stats();
    assert_eq!(stats.operations, 2);
    assert_eq!(stats.successes, 2);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn close_rejects_further_enqueues() {
    let feeder = RecordingFeeder::new();
    let dispatcher = dispatcher(feeder.clone());

    dispatcher
        .enqueue(Document::put(id("id:ns:type::doc1"), "{}"))
        .await
        .unwrap();
    dispatcher.close().await;

    let late = Document::put(id("id:ns:type::doc2"), "{}");
    assert_eq!(dispatcher.enqueue(late).await, Err(DispatchError::Closed));
    assert_eq!(feeder.documents().len(), 1);
}

#[tokio::test]
async fn inflight_returns_to_zero_after_close() {
    let feeder = RecordingFeeder::new();
    let dispatcher = dispatcher(feeder.clone());

    for n in 0..16 {
        let doc = Document::put(id(&format!("id:ns:type::doc{n}")), "{}");
        dispatcher.enqueue(doc).await.unwrap();
    }
    dispatcher.close().await;

    assert_eq!(dispatcher.inflight(), 0);
    assert_eq!(feeder.documents().len(), 16);
}
