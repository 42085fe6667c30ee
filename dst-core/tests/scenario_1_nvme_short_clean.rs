//! Scenario 1 — NVMe short DST, clean.
//!
//! The drive reports no test running and a completed newest-entry status
//! before the first poll even happens. Starting a short self-test and
//! polling it to completion should succeed on essentially the first
//! observation, with nothing left to repair.

use dst_core::{poll_dst, sim::SimulatedTransport, start_dst, DstKind, DstMode};

#[test]
fn nvme_short_dst_completes_clean() {
    let mut t = SimulatedTransport::new_nvme();
    start_dst(&mut t, DstKind::Short, DstMode::Offline, 0).unwrap();
    poll_dst(&mut t, DstKind::Short, false).unwrap();
}
