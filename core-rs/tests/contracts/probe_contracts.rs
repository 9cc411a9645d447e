//! Probe Contract Tests
//!
//! Invariants of the port prober and its defaults that callers rely on.

use portserve_core::config::{DEFAULT_PORT, DEFAULT_PROBE_HOST, DEFAULT_PROBE_TIMEOUT_SECS};
use portserve_core::{PortProber, ProbeOutcome, ServeConfig};
use std::time::{Duration, Instant};

/// WHY: With no arguments the tool checks and serves port 8080 on localhost
/// BREAKS: Anyone who documented http://localhost:8080 as the test URL
#[test]
fn defaults_probe_localhost_8080_with_5s_timeout() {
    assert_eq!(DEFAULT_PORT, 8080);
    assert_eq!(DEFAULT_PROBE_HOST, "127.0.0.1");
    assert_eq!(DEFAULT_PROBE_TIMEOUT_SECS, 5);

    let config = ServeConfig::default();
    let prober = PortProber::from_config(&config);
    assert_eq!(prober.address(), "127.0.0.1:8080");
}

/// WHY: A live listener must always read as occupied
/// BREAKS: The server would try to bind a taken port
#[tokio::test]
async fn listener_is_always_occupied() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let prober = PortProber::new("127.0.0.1", port, Duration::from_secs(5));
    assert_eq!(prober.probe().await, ProbeOutcome::Occupied);
    assert!(prober.is_occupied().await);
}

/// WHY: No listener means free, and the answer arrives within the timeout
/// BREAKS: The tool would hang or refuse to start on an idle port
#[tokio::test]
async fn no_listener_is_free_within_timeout() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let timeout = Duration::from_secs(5);
    let prober = PortProber::new("127.0.0.1", port, timeout);
    let started = Instant::now();
    assert_eq!(prober.probe().await, ProbeOutcome::Free);
    assert!(started.elapsed() <= timeout);
}

/// WHY: A probe that could not run is neither free nor occupied
/// BREAKS: Callers could no longer tell "free" from "don't know"
#[tokio::test]
async fn probe_failure_is_not_conflated_with_free() {
    let prober = PortProber::new("127.0.0.1", 0, Duration::from_secs(1));
    let outcome = prober.probe().await;

    assert!(matches!(outcome, ProbeOutcome::ProbeFailed(_)));
    assert_ne!(outcome, ProbeOutcome::Free);
    // The boolean view still reports "not occupied"
    assert!(!prober.is_occupied().await);
}
