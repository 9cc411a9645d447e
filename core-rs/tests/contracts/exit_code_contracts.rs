//! Exit Code Contract Tests
//!
//! Scripts wrap this tool and branch on its exit status; these values are
//! part of its interface.

use portserve_core::runner::{
    error_exit_code, probe_exit_code, RunOutcome, EXIT_FAILURE, EXIT_OK, EXIT_PORT_OCCUPIED,
};
use portserve_core::{ProbeOutcome, ServeError};

/// WHY: "Port already in use" has always exited with status 1
/// BREAKS: Wrapper scripts that check `$? -eq 1`
#[test]
fn occupied_port_exits_1() {
    assert_eq!(EXIT_PORT_OCCUPIED, 1);
    assert_eq!(RunOutcome::PortOccupied.exit_code(), 1);
    assert_eq!(probe_exit_code(&ProbeOutcome::Occupied), 1);
}

/// WHY: Interrupting a running server is the normal way to stop it
#[test]
fn clean_stop_exits_0() {
    assert_eq!(EXIT_OK, 0);
    assert_eq!(RunOutcome::Stopped.exit_code(), 0);
    assert_eq!(probe_exit_code(&ProbeOutcome::Free), 0);
}

/// WHY: A failed bind must end the process instead of leaving it idle
/// BREAKS: The tool would sit there serving nothing
#[test]
fn bind_failure_exits_2() {
    let err = ServeError::Bind {
        addr: "0.0.0.0:8080".parse().unwrap(),
        source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
    };
    assert_eq!(EXIT_FAILURE, 2);
    assert_eq!(error_exit_code(&err), 2);
}

/// WHY: An inconclusive probe has its own status, distinct from free/occupied
#[test]
fn probe_failure_exits_2() {
    let code = probe_exit_code(&ProbeOutcome::ProbeFailed("network unreachable".to_string()));
    assert_eq!(code, 2);
    assert_ne!(code, EXIT_OK);
    assert_ne!(code, EXIT_PORT_OCCUPIED);
}

/// WHY: The three exit codes must stay distinct
#[test]
fn exit_codes_are_distinct() {
    assert_ne!(EXIT_OK, EXIT_PORT_OCCUPIED);
    assert_ne!(EXIT_OK, EXIT_FAILURE);
    assert_ne!(EXIT_PORT_OCCUPIED, EXIT_FAILURE);
}
