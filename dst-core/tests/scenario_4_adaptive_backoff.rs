//! Scenario 4 — adaptive back-off.
//!
//! A self-test that never reports progress forces the poller through
//! successive doublings of `delay_time`/`time_diff` (5s/30s initial for
//! a short test) and eventually trips the watchdog — but never before
//! `5 * total_dst_seconds` (600s for a 120s-rated short test) of wall
//! time have actually elapsed.

use dst_core::error::AbortReason;
use dst_core::{poll_dst, sim::SimulatedTransport, start_dst, DstError, DstKind, DstMode, TransportOps};

#[test]
fn stalled_short_dst_eventually_trips_the_watchdog() {
    let mut t = SimulatedTransport::new_ata();
    t.freeze_progress(true);

    let start = t.now();
    start_dst(&mut t, DstKind::Short, DstMode::Offline, 0).unwrap();
    let err = poll_dst(&mut t, DstKind::Short, false).unwrap_err();

    assert!(matches!(
        err,
        DstError::Aborted {
            reason: AbortReason::Watchdog
        }
    ));
    let elapsed = t.now().duration_since(start).as_secs();
    assert!(
        elapsed > 600,
        "watchdog fired at {elapsed}s, before the 5 * 120s = 600s bound"
    );
}
