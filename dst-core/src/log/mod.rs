//! DST Log Parser (component C5): normalizes the three transports'
//! heterogeneous self-test result logs into one canonical [`DstLog`].

pub mod ata;
pub mod nvme;
pub mod scsi;

use serde::{Deserialize, Serialize};

use crate::error::DstError;
use crate::konst::{self, NO_LBA};
use crate::progress::DstStatus;
use crate::transport::{DeviceKind, TransportOps};

/// Which log variant produced a [`DstLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogType {
    Ata,
    Scsi,
    Nvme,
    Unknown,
}

/// Per-transport fields that don't generalize across ATA/SCSI/NVMe. A
/// sum type, not a C-style tagged union with parallel `*_valid` flags:
/// optional fields are `Option<T>` directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TransportDescriptor {
    Ata {
        vendor_specific: [u8; 15],
        synthesized_sense: (u8, u8, u8),
    },
    Scsi {
        sense_key: u8,
        asc: u8,
        ascq: u8,
        vs: u8,
    },
    Nvme {
        sct: Option<u8>,
        sc: Option<u8>,
        vs: u16,
    },
}

/// One canonical self-test log entry, normalized across transports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DstDescriptor {
    pub valid: bool,
    pub kind_field: u8,
    pub status: DstStatus,
    /// The raw high-nibble status value this entry's `status` was
    /// classified from, preserved for round-tripping and display.
    pub raw_status_nibble: u8,
    /// ATA: lifetime in power-on hours at LBA(0:15) of the descriptor.
    /// NVMe: power-on-hours field. SCSI folds the same semantics in.
    pub timestamp: u64,
    pub checkpoint_or_segment: u8,
    /// `NO_LBA` sentinel when the test carries no meaningful LBA.
    pub lba_of_failure: u64,
    pub namespace_id: Option<u32>,
    pub transport_specific: TransportDescriptor,
}

impl DstDescriptor {
    pub fn carries_lba(&self) -> bool {
        self.lba_of_failure != NO_LBA
    }
}

/// The canonical, transport-normalized self-test log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DstLog {
    pub log_type: LogType,
    /// Newest first, per every transport's native log ordering.
    pub entries: Vec<DstDescriptor>,
}

impl DstLog {
    pub fn newest(&self) -> Option<&DstDescriptor> {
        self.entries.first()
    }
}

/// Dispatch to the owning transport's self-test log read and parse it
/// into the canonical [`DstLog`] (folds C1's dispatch table with C5's
/// parsers, same rationale as [`crate::progress::read_dst_progress`]).
///
/// ATA: prefers the GPL extended log, falling back to the legacy SMART
/// log (with a warning) when the extended log is unsupported or reports
/// no entries — the deterministic choice the design calls for where the
/// original source fell through silently.
pub fn read_dst_log(transport: &mut dyn TransportOps) -> Result<DstLog, DstError> {
    match transport.view().kind {
        DeviceKind::Ata => {
            let ext = transport.ata_read_log_ext(konst::ata::EXT_SELFTEST_LOG_ID, 0);
            match ext {
                Ok(raw) if !raw.is_empty() => {
                    let log = ata::parse_ext_log(&raw);
                    if !log.entries.is_empty() {
                        return Ok(log);
                    }
                    log::warn!("[dst::log] extended self-test log reported no entries, falling back to legacy SMART log");
                    let raw = transport.ata_smart_read_log(konst::ata::LEGACY_SELFTEST_LOG_ID)?;
                    Ok(ata::parse_legacy_log(&raw))
                }
                _ => {
                    log::warn!("[dst::log] extended self-test log unavailable, falling back to legacy SMART log");
                    let raw = transport.ata_smart_read_log(konst::ata::LEGACY_SELFTEST_LOG_ID)?;
                    Ok(ata::parse_legacy_log(&raw))
                }
            }
        }
        DeviceKind::Scsi => {
            let raw = transport.scsi_log_sense(konst::scsi::SELFTEST_RESULTS_LOG_PAGE, 0)?;
            Ok(scsi::parse_log(&raw))
        }
        DeviceKind::Nvme => {
            let raw = transport.nvme_get_log_page(
                konst::nvme::DST_LOG_LID,
                konst::nvme::NSID_ALL,
                konst::nvme::DST_LOG_LEN,
            )?;
            Ok(nvme::parse_log(&raw))
        }
    }
}
