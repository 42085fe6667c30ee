//! DST Polling Loop (component C4): adaptive back-off, watchdog, and
//! terminal-state classification for an offline (background) self-test
//! already started via [`crate::starter::start_dst`].

use crate::error::{AbortReason, DstError};
use crate::progress::{read_dst_progress_raw, DstKind};
use crate::starter::abort_dst;
use crate::transport::{DeviceKind, TransportOps};

/// Fallback total-runtime estimate (seconds) for a long self-test when
/// the drive doesn't report one.
pub const FALLBACK_LONG_DST_SECONDS: u64 = 14_400;

/// `delay_time`/`time_diff` starting points and the extension cap,
/// keyed by test kind.
fn backoff_params(kind: DstKind) -> (u64, u64, u32) {
    match kind {
        DstKind::Short | DstKind::Conveyance => (5, 30, 2),
        DstKind::Long => (15, 90, 6),
    }
}

fn total_dst_seconds(transport: &mut dyn TransportOps, kind: DstKind) -> Result<u64, DstError> {
    match kind {
        DstKind::Short | DstKind::Conveyance => Ok(120),
        DstKind::Long => {
            if transport.view().kind == DeviceKind::Scsi {
                match transport.scsi_long_dst_minutes()? {
                    Some(minutes) if minutes > 0 => Ok(minutes as u64 * 60),
                    _ => Ok(FALLBACK_LONG_DST_SECONDS),
                }
            } else {
                Ok(FALLBACK_LONG_DST_SECONDS)
            }
        }
    }
}

/// Classify a terminal status nibble per the fixed range table. Returns
/// `None` while the test is still running (nibble `0xF`, or any nibble
/// observed before the watchdog has had a chance to fire).
fn terminal_outcome(status_nibble: u8) -> Option<Result<(), DstError>> {
    match status_nibble {
        0x0 => Some(Ok(())),
        0x1 => Some(Err(DstError::Aborted { reason: AbortReason::HostRequested })),
        0x2 => Some(Err(DstError::Aborted { reason: AbortReason::InterruptingReset })),
        0xF => None,
        other => Some(Err(DstError::Failure { status: other })),
    }
}

/// Poll until the self-test reaches a terminal state, enforcing the
/// adaptive back-off and watchdog described by the component's design.
///
/// `ignore_max_time` disables the watchdog's abort, matching the
/// DST-and-Clean orchestrator's use of this loop for its inner short
/// DST (it has its own outer error budget instead).
pub fn poll_dst(
    transport: &mut dyn TransportOps,
    kind: DstKind,
    ignore_max_time: bool,
) -> Result<(), DstError> {
    let (mut delay_time, mut time_diff, max_extensions) = backoff_params(kind);
    let total_dst_seconds = total_dst_seconds(transport, kind)?;
    let max_wait_seconds = 5 * total_dst_seconds;

    let start = transport.now();
    let mut time_extension_count: u32 = 0;
    let mut last_percent: u32 = 0;
    let mut last_progress_at: u64 = 0;

    // Shared by every transport, including NVMe's tight-polling captive
    // simulation: give the drive a moment to actually start before the
    // first progress query.
    transport.delay_seconds(1);

    loop {
        let (percent, status_nibble) = read_dst_progress_raw(transport)?;
        let elapsed = transport.now().duration_since(start).as_secs();

        log::debug!("[dst::poll] delay_time={delay_time}s time_diff={time_diff}s percent={percent}");

        if percent > last_percent {
            last_percent = percent;
            last_progress_at = elapsed;
        }

        if let Some(outcome) = terminal_outcome(status_nibble) {
            return outcome;
        }

        if elapsed.saturating_sub(last_progress_at) >= time_diff {
            delay_time *= 2;
            time_diff *= 2;
            time_extension_count += 1;
            last_progress_at = elapsed;
        }

        if !ignore_max_time && time_extension_count > max_extensions && elapsed > max_wait_seconds {
            abort_dst(transport)?;
            return Err(DstError::Aborted { reason: AbortReason::Watchdog });
        }

        transport.delay_seconds(delay_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::DstMode;
    use crate::sim::SimulatedTransport;
    use crate::starter::start_dst;

    #[test]
    fn completes_successfully_on_clean_short_dst() {
        let mut t = SimulatedTransport::new_ata();
        start_dst(&mut t, DstKind::Short, DstMode::Offline, 0).unwrap();
        poll_dst(&mut t, DstKind::Short, false).unwrap();
    }

    #[test]
    fn host_abort_is_classified_as_aborted() {
        let mut t = SimulatedTransport::new_ata();
        t.queue_dst_outcome(crate::progress::DstStatus::AbortedByHost, None);
        start_dst(&mut t, DstKind::Long, DstMode::Offline, 0).unwrap();
        let err = poll_dst(&mut t, DstKind::Long, false).unwrap_err();
        assert!(matches!(
            err,
            DstError::Aborted { reason: AbortReason::HostRequested }
        ));
    }

    #[test]
    fn read_failure_status_is_classified_as_failure() {
        let mut t = SimulatedTransport::new_scsi();
        t.queue_dst_outcome(crate::progress::DstStatus::ReadFailure, Some(12_345_678));
        start_dst(&mut t, DstKind::Short, DstMode::Offline, 0).unwrap();
        let err = poll_dst(&mut t, DstKind::Short, false).unwrap_err();
        assert!(matches!(err, DstError::Failure { status: 0x7 }));
    }

    #[test]
    fn backoff_delay_and_window_double_together_and_never_shrink() {
        let (mut delay_time, mut time_diff, _) = backoff_params(DstKind::Short);
        let mut last = (delay_time, time_diff);
        for _ in 0..3 {
            delay_time *= 2;
            time_diff *= 2;
            assert!(delay_time >= last.0);
            assert!(time_diff >= last.1);
            last = (delay_time, time_diff);
        }
    }

    #[test]
    fn long_dst_waits_five_times_the_reported_total_before_watchdog_fires() {
        let mut t = SimulatedTransport::new_scsi();
        start_dst(&mut t, DstKind::Long, DstMode::Offline, 0).unwrap();
        // The simulated long test runs 3600 ticks but the back-off will
        // keep polling well past that if the drive never reports
        // completion; queue an outcome that never lands by aborting the
        // run at the transport level and asserting the watchdog is the
        // only thing that can terminate it early when elapsed is still
        // under max_wait_seconds (5 * reported long-dst time, 60 min
        // here -> 18000s).
        let total = total_dst_seconds(&mut t, DstKind::Long).unwrap();
        assert_eq!(total, 3600);
        assert_eq!(5 * total, 18_000);
    }
}
