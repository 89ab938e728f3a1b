//! Integration tests for graceful shutdown functionality.

mod common;

use common::{document, Recorder};
use doc_throttle::{DocumentClient, ShutdownError, Window};
use std::time::Duration;

fn scheduled(capacity: u32, recorder: &Recorder) -> DocumentClient<Recorder> {
    DocumentClient::builder(recorder.clone())
        .with_window(Window::Custom(Duration::from_millis(100)))
        .with_capacity(capacity)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_no_refills_after_shutdown() {
    let recorder = Recorder::new();
    let client = scheduled(1, &recorder);

    tokio::time::sleep(Duration::from_millis(250)).await;
    let refills_before = client.metrics().refills();
    assert!(refills_before >= 3);

    client.shutdown().await.expect("shutdown failed");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.metrics().refills(), refills_before);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_reports_queued_documents() {
    let recorder = Recorder::new();
    let client = scheduled(1, &recorder);
    tokio::time::sleep(Duration::from_millis(10)).await;

    for i in 0..4 {
        client
            .create_document(document(format!("d{}", i)), "sig")
            .await
            .unwrap();
    }
    assert_eq!(recorder.count(), 1);

    let report = client.shutdown().await.expect("shutdown failed");
    let abandoned: Vec<String> = report
        .into_abandoned()
        .into_iter()
        .map(|s| s.doc_id().to_string())
        .collect();
    assert_eq!(abandoned, vec!["d1", "d2", "d3"]);

    // Abandoned documents are never sent later
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(recorder.count(), 1);
    assert_eq!(client.metrics().abandoned(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_second_shutdown_is_reported_not_fatal() {
    let recorder = Recorder::new();
    let client = scheduled(2, &recorder);

    client.shutdown().await.expect("first shutdown failed");
    let snapshot = client.metrics().snapshot();

    assert_eq!(client.shutdown().await, Err(ShutdownError::AlreadyStopped));
    assert_eq!(client.shutdown().await, Err(ShutdownError::AlreadyStopped));
    assert_eq!(client.metrics().snapshot(), snapshot);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_shutdown_in_application() {
    // Simulate an application owning the client
    struct Application {
        client: Option<DocumentClient<Recorder>>,
        recorder: Recorder,
    }

    impl Application {
        fn new() -> Self {
            let recorder = Recorder::new();
            let client = scheduled(3, &recorder);
            Self {
                client: Some(client),
                recorder,
            }
        }

        async fn submit_batch(&self, count: usize) {
            if let Some(client) = &self.client {
                for i in 0..count {
                    client
                        .create_document(document(format!("app-{}", i)), "sig")
                        .await
                        .unwrap();
                }
            }
        }

        async fn shutdown(mut self) -> usize {
            match self.client.take() {
                Some(client) => client
                    .shutdown()
                    .await
                    .expect("shutdown failed")
                    .abandoned()
                    .len(),
                None => 0,
            }
        }
    }

    let app = Application::new();
    tokio::time::sleep(Duration::from_millis(10)).await;

    app.submit_batch(10).await;

    // Let a few windows pass
    tokio::time::sleep(Duration::from_millis(150)).await;
    let sent = app.recorder.count();
    assert_eq!(sent, 6);

    let abandoned = app.shutdown().await;
    assert_eq!(sent + abandoned, 10);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_shutdown_safety() {
    let mut clients = vec![];

    for _ in 0..5 {
        let recorder = Recorder::new();
        clients.push(scheduled(2, &recorder));
    }

    tokio::time::sleep(Duration::from_millis(250)).await;

    let mut handles = vec![];
    for client in &clients {
        let client = client.clone();
        handles.push(tokio::spawn(async move { client.shutdown().await }));
    }
    for handle in handles {
        handle.await.unwrap().expect("shutdown failed");
    }

    // Every client is closed exactly once
    for client in &clients {
        assert!(client.is_shut_down());
        assert_eq!(client.shutdown().await, Err(ShutdownError::AlreadyStopped));
    }
}

#[tokio::test(start_paused = true)]
async fn test_dropping_client_stops_scheduler() {
    let recorder = Recorder::new();
    let client = scheduled(1, &recorder);
    tokio::time::sleep(Duration::from_millis(10)).await;

    for i in 0..3 {
        client
            .create_document(document(format!("d{}", i)), "sig")
            .await
            .unwrap();
    }
    let metrics = client.metrics().clone();
    drop(client);

    tokio::time::sleep(Duration::from_secs(1)).await;

    // Nothing drained after the drop; the queue was abandoned
    assert_eq!(recorder.count(), 1);
    assert_eq!(metrics.abandoned(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_gate_closed_while_first_shutdown_waits_on_drain() {
    let recorder = Recorder::new();
    recorder.slow("slow", Duration::from_secs(2));
    let client = scheduled(1, &recorder);

    client
        .create_document(document("slow"), "sig")
        .await
        .unwrap();
    client
        .create_document(document("late"), "sig")
        .await
        .unwrap();

    // The startup tick is now busy sending "slow"
    tokio::time::sleep(Duration::from_millis(10)).await;

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.shutdown().await })
    };
    tokio::task::yield_now().await;

    // The first call is still waiting for the drain to finish
    assert!(!first.is_finished());
    assert!(client.is_shut_down());
    assert_eq!(client.shutdown().await, Err(ShutdownError::AlreadyStopped));

    let report = first.await.unwrap().expect("shutdown failed");
    let abandoned: Vec<&str> = report.abandoned().iter().map(|s| s.doc_id()).collect();
    assert_eq!(abandoned, vec!["late"]);
    assert_eq!(recorder.sent(), vec!["slow"]);
}
