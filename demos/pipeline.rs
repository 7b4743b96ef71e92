//! Pipeline Example
//!
//! Demonstrates lazy value pipelines built from small transformations.
//!
//! Patterns covered:
//! - Sequential transformations with map and tap
//! - Bad-value short-circuiting and recovery
//! - Errors with context
//! - Shape-preserving traversal, including async elements
//! - Folding a pipeline into a final answer

use std::time::Duration;

use lazybox::prelude::*;

// ==================== Sequential Transformations ====================

/// Example 1: Simple data transformation pipeline
fn example_sequential_transformations() {
    println!("\n=== Example 1: Sequential Transformations ===");

    let pipeline = LazyBox::of(5)
        .map(|v| v.as_i64().map(|n| n * 2))
        .tap(|v| println!("  After doubling: {:?}", v))
        .map(|v| v.as_i64().map(|n| n + 10))
        .tap(|v| println!("  After adding 10: {:?}", v))
        .map(|v| format!("Result: {}", v.as_i64().unwrap_or_default()));

    println!("  Nothing has run yet");
    println!("Final: {:?}", pipeline.run());
}

// ==================== Short-Circuiting ====================

/// Example 2: Missing data skips the rest of the chain
fn example_short_circuit() {
    println!("\n=== Example 2: Short-Circuiting ===");

    let user = Value::record([("name", Value::from("Ada")), ("email", Value::Null)]);

    let domain = LazyBox::of(user)
        .map(|u| u.get("email").cloned())
        .map(|email| {
            println!("  never printed: email is null");
            email.as_str().and_then(|e| e.split('@').nth(1)).map(str::to_owned)
        })
        .recover(|_| "unknown");

    println!("  Domain: {:?}", domain.run());
}

// ==================== Errors ====================

/// Example 3: Parsing with context and a fallback
fn example_errors() {
    println!("\n=== Example 3: Errors with Context ===");

    let parse = |raw: &'static str| {
        LazyBox::of(raw)
            .map(|v| v.as_str().unwrap_or_default().parse::<i64>())
            .context(format!("parsing {:?}", raw))
    };

    println!("  ok:   {:?}", parse("42").unwrap());
    match parse("forty-two").unwrap() {
        Ok(v) => println!("  unexpected: {:?}", v),
        Err(fault) => println!("  err:  {}", fault),
    }

    let fallback = parse("forty-two").catch(|fault| {
        println!("  caught: {}", fault.message());
        0
    });
    println!("  with fallback: {:?}", fallback.run());
}

// ==================== Traversal ====================

/// Example 4: Traversal keeps the container's shape
async fn example_traverse() {
    println!("\n=== Example 4: Traversal ===");

    let prices = Value::record([("apple", 3), ("pear", 4)]);
    let taxed = LazyBox::of(prices).traverse(|p| p.as_i64().map(|n| n * 110 / 100));
    println!("  Taxed record: {:?}", taxed.run());

    let slow_first = LazyBox::of(vec![30, 10, 20]).traverse(|ms| {
        let ms = ms.as_i64().unwrap_or_default();
        Value::pending(async move {
            tokio::time::sleep(Duration::from_millis(ms.unsigned_abs())).await;
            ms
        })
    });
    println!("  Async, in input order: {:?}", slow_first.settle().await);
}

// ==================== Folding ====================

/// Example 5: Collapse a pipeline into a single answer
fn example_fold() {
    println!("\n=== Example 5: Folding ===");

    for input in [Value::from(7), Value::Null, Value::error("disk full")] {
        let message = LazyBox::of(input).fold_with_finally(
            |fault| format!("failed: {}", fault.message()),
            |bad| format!("nothing to do ({})", bad.kind()),
            |ok| format!("got {:?}", ok),
            || println!("  (cleanup)"),
        );
        println!("  {:?}", message);
    }
}

#[tokio::main]
async fn main() {
    println!("Pipeline Examples");
    println!("=================");

    example_sequential_transformations();
    example_short_circuit();
    example_errors();
    example_traverse().await;
    example_fold();

    println!("\n=== All examples completed successfully! ===");
}
