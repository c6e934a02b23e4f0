//! # Example: Error Fan-out
//!
//! Demonstrates an error-reporting subsystem fanning failures out to several observers.
//!
//! Shows how to:
//! - Share one [`ErrorBroadcaster`] between a producer and several consumers
//! - Use `None` as the "all clear" sentinel
//! - Detach one observer with `remove` while the others keep receiving
//! - Shut every observer down with `reset`
//!
//! ## Flow
//! ```text
//! worker ──► ErrorBroadcaster ──┬──► audit   (prints everything)
//!                               ├──► alerts  (counts failures)
//!                               └──► pager   (removed after the first failure)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=fanout=debug cargo run --example error_fanout
//! ```

use std::sync::Arc;
use std::time::Duration;

use fanout::{ErrorBroadcaster, Receiver, SharedError};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct UpstreamDown(&'static str);

impl std::fmt::Display for UpstreamDown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream {} is unreachable", self.0)
    }
}

impl std::error::Error for UpstreamDown {}

fn spawn_observer(
    name: &'static str,
    mut rx: Receiver<Option<SharedError>>,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut failures = 0;
        while let Some(report) = rx.recv().await {
            match report {
                Some(err) => {
                    failures += 1;
                    println!("[{name}] failure: {err}");
                }
                None => println!("[{name}] all clear"),
            }
        }
        println!("[{name}] closed after {failures} failure(s)");
        failures
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let errors = Arc::new(ErrorBroadcaster::new(4));

    let audit = spawn_observer("audit", errors.listen().await);
    let alerts = spawn_observer("alerts", errors.listen().await);
    let mut pager_rx = errors.listen().await;
    let pager_id = pager_rx.id();

    let worker = {
        let errors = Arc::clone(&errors);
        tokio::spawn(async move {
            let reports: [Option<SharedError>; 4] = [
                Some(Arc::new(UpstreamDown("billing"))),
                None,
                Some(Arc::new(UpstreamDown("search"))),
                None,
            ];
            for report in reports {
                errors.broadcast(report).await;
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
    };

    if let Some(Some(first)) = pager_rx.recv().await {
        println!("[pager] paging on-call: {first}");
    }
    errors.remove(&pager_rx).await;
    println!("[pager] {pager_id} detached");

    worker.await.expect("worker panicked");
    errors.reset().await;

    let audited = audit.await.expect("audit observer panicked");
    let alerted = alerts.await.expect("alerts observer panicked");
    println!("audit saw {audited} failure(s), alerts saw {alerted} failure(s)");
}
