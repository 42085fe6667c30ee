//! Scenario 3 — SCSI short DST, read failure at LBA 12,345,678.
//!
//! The self-test log reports a read-failure descriptor carrying that
//! LBA; the orchestrator repairs it, verifies the surrounding
//! neighborhood clean, reruns the short self-test, and this time it
//! passes. The run succeeds with exactly one `ErrorList` entry, marked
//! `Repaired`.

use dst_core::progress::DstStatus;
use dst_core::{run_dst_and_clean, sim::SimulatedTransport, RepairStatus};

#[test]
fn read_failure_is_repaired_and_the_rerun_passes() {
    let mut t = SimulatedTransport::new_scsi();
    t.mark_bad_lba(12_345_678);
    t.queue_dst_outcome(DstStatus::ReadFailure, Some(12_345_678));

    let report = run_dst_and_clean(&mut t, 8).unwrap();

    assert!(report.repaired);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors.entries()[0].address, 12_345_678);
    assert_eq!(report.errors.entries()[0].status, RepairStatus::Repaired);
    assert!(!t.is_bad(12_345_678));
}
