//! DST kinds/modes, the normalized status enumeration, and the three
//! transport-specific progress decoders (component C2).

use serde::{Deserialize, Serialize};

use crate::error::DstError;
use crate::konst::{nvme, scsi};
use crate::transport::{DeviceKind, TransportOps};

/// Which self-test family to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DstKind {
    Short,
    Long,
    /// ATA-only; detects shipping/handling damage.
    Conveyance,
}

/// How the self-test command should block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DstMode {
    /// Background: the start command returns immediately, poll for
    /// completion.
    Offline,
    /// Foreground: the start command blocks until the test finishes (or
    /// times out). NVMe has no captive mode; it is simulated by tight
    /// polling.
    Captive,
}

/// The normalized self-test status, preserved alongside its raw nibble
/// (see `DstDescriptor::status`) so downstream translation never loses
/// the original encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DstStatus {
    Completed,
    AbortedByHost,
    InterruptedByReset,
    UnknownFailure,
    UnknownElementFailure,
    ElectricalFailure,
    ServoSeekFailure,
    ReadFailure,
    HandlingDamage,
    /// A nibble value in a reserved range for this transport's encoding.
    Reserved(u8),
    InProgress,
    NvmeAbortedByFormat,
    NvmeAbortedByNamespaceRemoval,
    NvmeAbortedByControllerReset,
}

impl DstStatus {
    /// Classify a raw status nibble per the owning transport's encoding.
    ///
    /// ATA and SCSI share one nibble scheme (0x0 completed ... 0xF in
    /// progress); NVMe's DST log "Self-test Result" field uses a
    /// different code space for its abort reasons, so it gets its own
    /// arm. This is the single place that shifts/masks a status nibble
    /// into a named class — downstream code only ever matches on the
    /// resulting `DstStatus`, never re-derives it from a raw byte.
    pub fn from_nibble(kind: DeviceKind, nibble: u8) -> DstStatus {
        match kind {
            DeviceKind::Nvme => match nibble {
                0x0 => DstStatus::Completed,
                0x1 => DstStatus::AbortedByHost,
                0x2 => DstStatus::NvmeAbortedByControllerReset,
                0x3 => DstStatus::NvmeAbortedByNamespaceRemoval,
                0x4 => DstStatus::NvmeAbortedByFormat,
                0x5 => DstStatus::UnknownFailure,
                0x6 => DstStatus::UnknownElementFailure,
                0x7 => DstStatus::ReadFailure,
                0x8 => DstStatus::AbortedByHost,
                0x9 => DstStatus::InterruptedByReset,
                0xF => DstStatus::InProgress,
                other => DstStatus::Reserved(other),
            },
            DeviceKind::Ata | DeviceKind::Scsi => match nibble {
                0x0 => DstStatus::Completed,
                0x1 => DstStatus::AbortedByHost,
                0x2 => DstStatus::InterruptedByReset,
                0x3 => DstStatus::UnknownFailure,
                0x4 => DstStatus::UnknownElementFailure,
                0x5 => DstStatus::ElectricalFailure,
                0x6 => DstStatus::ServoSeekFailure,
                0x7 => DstStatus::ReadFailure,
                0x8 => DstStatus::HandlingDamage,
                0xF => DstStatus::InProgress,
                other => DstStatus::Reserved(other),
            },
        }
    }

    /// Whether an LBA carried alongside this status should be treated as
    /// meaningful, per the invariant: the LBA is the sentinel whenever
    /// status is completed, in-progress, or reserved.
    pub fn carries_lba(self) -> bool {
        !matches!(
            self,
            DstStatus::Completed | DstStatus::InProgress | DstStatus::Reserved(_)
        )
    }
}

/// A single `(percent_complete, status)` observation, normalized across
/// transports.
///
/// Invariant: while `status == InProgress`, `percent_complete` is in
/// `0..100`; when `status == Completed`, `percent_complete == 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DstProgress {
    pub percent_complete: u32,
    pub status: DstStatus,
}

impl DstProgress {
    /// Construct a progress reading, clamping `percent_complete` to keep
    /// the struct's invariant intact regardless of what a (possibly
    /// buggy) transport reported.
    pub fn new(percent_complete: u32, status: DstStatus) -> Self {
        let percent_complete = if status == DstStatus::Completed {
            100
        } else {
            percent_complete.min(99)
        };
        DstProgress {
            percent_complete,
            status,
        }
    }

    pub fn completed() -> Self {
        DstProgress {
            percent_complete: 100,
            status: DstStatus::Completed,
        }
    }
}

/// Decode the ATA SMART DATA status byte (offset 363): high nibble is
/// status, low nibble is percent *remaining* scaled by 10.
pub fn decode_ata_progress(smart_data: &[u8; 512]) -> (u32, u8) {
    let byte = smart_data[crate::konst::ata::SMART_DATA_STATUS_BYTE_OFFSET];
    let status_nibble = byte >> 4;
    let percent_remaining = (byte & 0x0F) as u32 * 10;
    let percent_complete = 100u32.saturating_sub(percent_remaining);
    (percent_complete, status_nibble)
}

/// Decode SCSI progress from a log-sense page 10h status byte and a
/// request-sense 16-bit completion fraction.
pub fn decode_scsi_progress(log_sense_byte8: u8, request_sense_bytes_16_17: u16) -> (u32, u8) {
    let status_nibble = log_sense_byte8 & 0x0F;
    let percent_complete = (request_sense_bytes_16_17 as u32 * 100) / 65536;
    (percent_complete, status_nibble)
}

/// Decode NVMe progress from the 564-byte device self-test log page.
///
/// When byte 0 is zero, no test is running: percent is 0 and status
/// comes from the newest log entry (offset 4), with the "unused" value
/// rewritten to "never run" (0x00). When a test is in progress, percent
/// is byte 1 and status is forced to 0x0F to align with the ATA/SCSI
/// in-progress convention.
pub fn decode_nvme_progress(log: &[u8]) -> (u32, u8) {
    if log.is_empty() || log[0] == 0 {
        let newest_status = log.get(4).copied().unwrap_or(0) & 0x0F;
        let status = if newest_status == crate::konst::nvme::DST_STATUS_NOT_USED {
            0x00
        } else {
            newest_status
        };
        (0, status)
    } else {
        let percent = log.get(1).copied().unwrap_or(0) as u32;
        (percent, 0x0F)
    }
}

/// Dispatch to the owning transport's progress query (folds component
/// C1's dispatch table and C2's decoders together, since C1 has no
/// state of its own beyond the `DeviceKind` tag), returning the raw
/// `(percent, status_nibble)` pair before normalization.
///
/// The polling loop (C4) needs this raw pair, not just the normalized
/// `DstStatus`, to classify terminal states against the nibble-range
/// table in its own component spec; [`read_dst_progress`] is the
/// normalized wrapper callers outside the polling loop want.
pub fn read_dst_progress_raw(transport: &mut dyn TransportOps) -> Result<(u32, u8), DstError> {
    let kind = transport.view().kind;
    match kind {
        DeviceKind::Ata => {
            let data = transport.ata_smart_read_data()?;
            Ok(decode_ata_progress(&data))
        }
        DeviceKind::Scsi => {
            let log = transport.scsi_log_sense(scsi::SELFTEST_RESULTS_LOG_PAGE, 0)?;
            let status_byte = log
                .get(scsi::SELFTEST_FIRST_DESCRIPTOR_OFFSET + 4)
                .copied()
                .unwrap_or(0);
            let sense = transport.scsi_request_sense()?;
            Ok(decode_scsi_progress(status_byte, sense.self_test_progress.unwrap_or(0)))
        }
        DeviceKind::Nvme => {
            let log = transport.nvme_get_log_page(nvme::DST_LOG_LID, 0, nvme::DST_LOG_LEN)?;
            Ok(decode_nvme_progress(&log))
        }
    }
}

/// As [`read_dst_progress_raw`], normalized into a `DstProgress`.
pub fn read_dst_progress(transport: &mut dyn TransportOps) -> Result<DstProgress, DstError> {
    let kind = transport.view().kind;
    let (percent, status_nibble) = read_dst_progress_raw(transport)?;
    let status = DstStatus::from_nibble(kind, status_nibble);
    Ok(DstProgress::new(percent, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ata_percent_remaining_converts_to_percent_complete() {
        let mut data = [0u8; 512];
        // status nibble 0x0 (completed), low nibble 0x0 remaining.
        data[363] = 0x00;
        assert_eq!(decode_ata_progress(&data), (100, 0x0));

        // status nibble 0xF (in progress), 30% remaining -> 70% complete.
        data[363] = 0xF3;
        assert_eq!(decode_ata_progress(&data), (70, 0xF));
    }

    #[test]
    fn scsi_percent_scales_from_16_bit_fraction() {
        assert_eq!(decode_scsi_progress(0x00, 0), (0, 0x0));
        assert_eq!(decode_scsi_progress(0x0F, 32768), (50, 0xF));
    }

    #[test]
    fn nvme_not_running_reads_newest_entry_status() {
        let mut log = [0u8; 564];
        log[0] = 0; // not running
        log[4] = 0x00; // completed
        assert_eq!(decode_nvme_progress(&log), (0, 0x0));
    }

    #[test]
    fn nvme_unused_newest_entry_becomes_never_run() {
        let mut log = [0u8; 564];
        log[0] = 0;
        log[4] = 0x0F; // unused
        assert_eq!(decode_nvme_progress(&log), (0, 0x00));
    }

    #[test]
    fn nvme_in_progress_forces_status_0xf() {
        let mut log = [0u8; 564];
        log[0] = 1; // in progress
        log[1] = 42;
        assert_eq!(decode_nvme_progress(&log), (42, 0x0F));
    }

    #[test]
    fn progress_invariant_completed_is_always_100() {
        let p = DstProgress::new(17, DstStatus::Completed);
        assert_eq!(p.percent_complete, 100);
    }

    #[test]
    fn progress_invariant_in_progress_never_reaches_100() {
        let p = DstProgress::new(250, DstStatus::InProgress);
        assert!(p.percent_complete < 100);
    }

    #[test]
    fn status_from_nibble_shares_ata_scsi_encoding() {
        assert_eq!(
            DstStatus::from_nibble(DeviceKind::Ata, 0x7),
            DstStatus::from_nibble(DeviceKind::Scsi, 0x7)
        );
        assert_eq!(
            DstStatus::from_nibble(DeviceKind::Ata, 0x7),
            DstStatus::ReadFailure
        );
    }

    #[test]
    fn status_from_nibble_nvme_diverges_on_abort_reasons() {
        assert_eq!(
            DstStatus::from_nibble(DeviceKind::Nvme, 0x3),
            DstStatus::NvmeAbortedByNamespaceRemoval
        );
        assert_eq!(
            DstStatus::from_nibble(DeviceKind::Ata, 0x3),
            DstStatus::UnknownFailure
        );
    }

    #[test]
    fn carries_lba_excludes_completed_in_progress_reserved() {
        assert!(!DstStatus::Completed.carries_lba());
        assert!(!DstStatus::InProgress.carries_lba());
        assert!(!DstStatus::Reserved(0x9).carries_lba());
        assert!(DstStatus::ReadFailure.carries_lba());
    }
}
