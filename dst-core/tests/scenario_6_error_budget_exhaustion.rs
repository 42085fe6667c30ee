//! Scenario 6 — DST-and-Clean error budget.
//!
//! `error_limit = 3`. Each run discovers one new bad LBA, repairs it, and
//! the neighborhood verifies clean, but the next short DST still finds
//! another one. Once a 4th distinct bad LBA is discovered the budget is
//! exhausted: the orchestrator records it (unrepaired) and returns
//! `Failure`, leaving exactly 4 entries — 3 repaired, 1 not.

use dst_core::progress::DstStatus;
use dst_core::{run_dst_and_clean_with, DstError, ErrorList, RepairStatus};

#[test]
fn fourth_distinct_bad_lba_trips_the_budget() {
    let mut t = dst_core::sim::SimulatedTransport::new_scsi();
    // Spaced well outside the +/-5000-LBA neighborhood-verify window so
    // each is discovered by its own fresh short DST, not swept up by the
    // previous repair's neighborhood check.
    for lba in [100_000u64, 200_000, 300_000, 400_000] {
        t.mark_bad_lba(lba);
    }

    let mut errors = ErrorList::new();
    let mut last_err = None;
    for &lba in &[400_000u64, 300_000, 200_000, 100_000] {
        t.queue_dst_outcome(DstStatus::ReadFailure, Some(lba));
        match run_dst_and_clean_with(&mut t, 3, errors.clone()) {
            Ok(report) => errors = report.errors,
            Err(e) => {
                last_err = Some(e);
                break;
            }
        }
    }

    assert!(matches!(last_err, Some(DstError::Failure { .. })));
    assert_eq!(errors.len(), 4);
    let repaired_count = errors
        .entries()
        .iter()
        .filter(|e| e.status == RepairStatus::Repaired)
        .count();
    assert_eq!(repaired_count, 3);
    let not_repaired_count = errors
        .entries()
        .iter()
        .filter(|e| e.status != RepairStatus::Repaired)
        .count();
    assert_eq!(not_repaired_count, 1);
}
