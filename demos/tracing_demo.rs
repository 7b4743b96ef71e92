//! Demonstrates tracing integration with lazy boxes
//!
//! Run with: cargo run --example tracing_demo --features tracing

use std::time::Duration;

use lazybox::{LazyBox, LazyTracingExt, Value};

#[tokio::main]
async fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    tracing::info!("Starting tracing demo");

    let workflow = fetch_data()
        .map(|data| format!("processed: {}", data.as_str().unwrap_or_default()))
        .instrument(tracing::info_span!("process"))
        .flat_map(|processed| save_result(processed));

    match workflow.settle().await {
        Value::Error(fault) => tracing::error!("Workflow failed: {}", fault),
        id => tracing::info!("Workflow completed successfully: {:?}", id),
    }

    // Bad values short-circuit; the trace shows where
    let missing = LazyBox::of(Value::Null)
        .instrument(tracing::info_span!("missing"))
        .map(|v| v)
        .run();
    tracing::info!("Missing result: {:?}", missing);
}

fn fetch_data() -> LazyBox {
    LazyBox::from_async(|| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        "raw data"
    })
    .instrument(tracing::info_span!("fetch-data"))
}

fn save_result(_data: Value) -> LazyBox {
    LazyBox::of(42).instrument(tracing::info_span!("save", operation = "database"))
}
