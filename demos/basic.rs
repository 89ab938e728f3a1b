//! Basic example demonstrating windowed admission with an overflow queue.
//!
//! Allows 3 documents per second and submits 10 at once. The first 3 are
//! sent immediately, the rest wait for the following windows.
//!
//! Set `DOC_THROTTLE_URL` to post to a real endpoint; otherwise documents
//! are printed instead of sent. Set `RUST_LOG=doc_throttle=debug` to see
//! every admission decision.

use doc_throttle::{
    DispatchError, Dispatcher, Document, DocumentClient, HttpDispatcher, HttpDispatcherConfig,
    Submission, Window,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Prints documents instead of sending them.
struct Console;

impl Dispatcher for Console {
    async fn dispatch(&self, submission: &Submission) -> Result<(), DispatchError> {
        println!(
            "  -> sent {} ({} products)",
            submission.doc_id(),
            submission.document().products.len()
        );
        Ok(())
    }
}

async fn run<D: Dispatcher>(dispatcher: D) -> Result<(), Box<dyn std::error::Error>> {
    let client = DocumentClient::builder(dispatcher)
        .with_window(Window::Second)
        .with_capacity(3)
        .build()?;

    // Give the startup tick a moment to grant the first window
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("Submitting 10 documents:");
    for i in 1..=10 {
        let document = Document::with_id(format!("doc-{}", i));
        match client.create_document(document, "c2lnbmF0dXJl").await {
            Ok(admission) => println!("  doc-{}: {:?}", i, admission),
            Err(e) => println!("  doc-{}: failed: {}", i, e),
        }
    }

    println!("\nWaiting for the queue to drain...");
    while client.queue_depth() > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let report = client.shutdown().await?;
    let snapshot = client.metrics().snapshot();

    println!("\n=== Example Complete ===");
    println!("Sent immediately: {}", snapshot.admitted);
    println!("Sent after queueing: {}", snapshot.drained);
    println!("Failed: {}", snapshot.dispatch_failures);
    println!("Abandoned at shutdown: {}", report.abandoned().len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Document Throttle Example ===\n");
    println!("Limit: 3 documents per second\n");

    match std::env::var("DOC_THROTTLE_URL") {
        Ok(url) => {
            let dispatcher = HttpDispatcher::new(HttpDispatcherConfig::default().with_url(url))?;
            run(dispatcher).await
        }
        Err(_) => run(Console).await,
    }
}
