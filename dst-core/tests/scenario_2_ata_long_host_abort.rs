//! Scenario 2 — ATA long DST, host abort.
//!
//! A self-test that ends with status nibble 0x1 (aborted by host)
//! classifies as `DstError::Aborted { reason: HostRequested }`, never as
//! a repairable `Failure`, and the DST-and-Clean loop built on top of
//! `poll_dst` must not attempt any repair when that happens.

use dst_core::error::AbortReason;
use dst_core::progress::DstStatus;
use dst_core::{poll_dst, run_dst_and_clean, sim::SimulatedTransport, start_dst, DstError, DstKind, DstMode};

#[test]
fn host_abort_classifies_as_aborted_not_failure() {
    let mut t = SimulatedTransport::new_ata();
    t.queue_dst_outcome(DstStatus::AbortedByHost, None);
    start_dst(&mut t, DstKind::Long, DstMode::Offline, 0).unwrap();
    let err = poll_dst(&mut t, DstKind::Long, false).unwrap_err();
    assert!(matches!(
        err,
        DstError::Aborted {
            reason: AbortReason::HostRequested
        }
    ));
}

#[test]
fn dst_and_clean_attempts_no_repair_on_host_abort() {
    let mut t = SimulatedTransport::new_ata();
    t.queue_dst_outcome(DstStatus::AbortedByHost, None);
    let err = run_dst_and_clean(&mut t, 8).unwrap_err();
    assert!(matches!(
        err,
        DstError::Aborted {
            reason: AbortReason::HostRequested
        }
    ));
}
