//! Sector-Repair Engine (component C6).
//!
//! Given a bad LBA, attempts read-reallocation (preserves data),
//! write-reallocation (discards data), and — SCSI only — an explicit
//! `REASSIGN BLOCKS`, iterating the reassign list against sense data up
//! to five rounds. The engine never retries a read or write on its own;
//! the only internal retries are the reassign list-adjustment loop and
//! the single permission-denied-over-pass-through retry, both made
//! explicit in the state machine below rather than hidden behind
//! recursion.

use serde::{Deserialize, Serialize};

use crate::error::DstError;
use crate::transport::{sense_key, DeviceKind, DeviceView, SupportedOps, TransportOps};

/// Outcome of a single-LBA repair attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairStatus {
    NotRepaired,
    RepairFailed,
    Repaired,
    RepairNotRequired,
    AccessDenied,
}

/// Knobs controlling which repair strategies [`repair_lba`] may attempt.
#[derive(Debug, Clone, Copy)]
pub struct RepairPolicy {
    /// Skip straight to the pass-through zero-write branch (step 2),
    /// bypassing read-realloc, write-realloc, and reassign. Also the
    /// branch the one-shot permission-denied retry lands on.
    pub force_passthrough: bool,
    pub auto_write_realloc: bool,
    pub auto_read_realloc: bool,
}

impl Default for RepairPolicy {
    /// Mirrors `clean::run_dst_and_clean`'s default when a capability
    /// query for automatic reallocation fails: write-realloc enabled,
    /// read-realloc enabled, no forced pass-through.
    fn default() -> Self {
        RepairPolicy {
            force_passthrough: false,
            auto_write_realloc: true,
            auto_read_realloc: true,
        }
    }
}

/// Hard cap on reassign list-adjustment rounds.
const MAX_REASSIGN_ROUNDS: u32 = 5;

/// Attempt to repair `lba`. Aligns to the physical-block boundary first
/// — every I/O below this point operates on the whole physical block,
/// never a sub-physical-block range.
pub fn repair_lba(
    transport: &mut dyn TransportOps,
    lba: u64,
    policy: RepairPolicy,
) -> Result<RepairStatus, DstError> {
    let view = transport.view().clone();
    let lpp = view.logical_per_physical();
    let aligned = (lba / lpp) * lpp;

    if policy.force_passthrough {
        return force_passthrough_repair(transport, aligned, lpp);
    }

    if policy.auto_read_realloc {
        if let Some(status) = try_read_realloc(transport, aligned, lpp)? {
            return Ok(status);
        }
    }

    if policy.auto_write_realloc {
        match try_write_realloc(transport, aligned, lpp) {
            Ok(Some(status)) => return Ok(status),
            // Verify failed after a clean write: nothing left to try but
            // reassign below.
            Ok(None) => {}
            Err(DstError::AccessDenied { lba: denied_lba }) => {
                if retry_via_passthrough_eligible(&view) {
                    log::warn!(
                        "[dst::repair] write denied at LBA {denied_lba}, retrying once via pass-through"
                    );
                    return force_passthrough_repair(transport, aligned, lpp);
                }
                return Ok(RepairStatus::AccessDenied);
            }
            Err(DstError::Io(io_err)) => {
                log::warn!(
                    "[dst::repair] OS pass-through failure writing LBA {aligned}: {io_err}"
                );
                return Ok(RepairStatus::RepairFailed);
            }
            // The drive rejected the write outright (still bad); fall
            // through to an explicit reassign if one is available.
            Err(_) => {}
        }
    }

    if view.kind == DeviceKind::Scsi && view.supports.contains(SupportedOps::REASSIGN_BLOCKS) {
        return try_reassign(transport, aligned, lpp);
    }

    if transport.verify_lba(aligned, lpp as u32)? {
        Ok(RepairStatus::RepairNotRequired)
    } else {
        Ok(RepairStatus::NotRepaired)
    }
}

/// Whether an ATA write's permission-denied failure should trigger the
/// one explicit pass-through retry — only on a non-IDE ATA drive with no
/// sector-size emulation layer in the way, and only when not already
/// forced (the caller above never reaches here with `force_passthrough`
/// set, since that branch returns immediately).
fn retry_via_passthrough_eligible(view: &DeviceView) -> bool {
    view.kind == DeviceKind::Ata && view.non_ide_ata && !view.sector_size_emulation
}

/// Step 2: write a zeroed physical block via the low-level pass-through
/// path, flush, and read-verify. Used both when the caller explicitly
/// requests it (bridged drive emulating a different sector size) and as
/// the target of the access-denied retry.
fn force_passthrough_repair(
    transport: &mut dyn TransportOps,
    aligned: u64,
    lpp: u64,
) -> Result<RepairStatus, DstError> {
    let zeros = vec![0u8; 512 * lpp as usize];
    match transport.write_lba(aligned, &zeros) {
        Ok(()) => {}
        Err(DstError::AccessDenied { .. }) => return Ok(RepairStatus::AccessDenied),
        Err(DstError::Io(io_err)) => {
            log::warn!("[dst::repair] pass-through write failed at LBA {aligned}: {io_err}");
            return Ok(RepairStatus::RepairFailed);
        }
        Err(_) => return Ok(RepairStatus::NotRepaired),
    }
    transport.flush_cache()?;
    if transport.verify_lba(aligned, lpp as u32)? {
        Ok(RepairStatus::Repaired)
    } else {
        Ok(RepairStatus::RepairFailed)
    }
}

/// Step 3: read the physical block, then verify. A successful
/// read-then-verify implies the drive transparently reallocated the
/// sector and preserved its data. Returns `None` (not an error) when the
/// read itself fails — the engine never retries a read, it just moves on
/// to write-realloc.
fn try_read_realloc(
    transport: &mut dyn TransportOps,
    aligned: u64,
    lpp: u64,
) -> Result<Option<RepairStatus>, DstError> {
    match transport.read_lba(aligned, lpp as u32) {
        Ok(_) => {
            if transport.verify_lba(aligned, lpp as u32)? {
                Ok(Some(RepairStatus::Repaired))
            } else {
                Ok(None)
            }
        }
        Err(_) => Ok(None),
    }
}

/// Step 4: write zeros to the block, flush, verify.
fn try_write_realloc(
    transport: &mut dyn TransportOps,
    aligned: u64,
    lpp: u64,
) -> Result<Option<RepairStatus>, DstError> {
    let zeros = vec![0u8; 512 * lpp as usize];
    transport.write_lba(aligned, &zeros)?;
    transport.flush_cache()?;
    if transport.verify_lba(aligned, lpp as u32)? {
        Ok(Some(RepairStatus::Repaired))
    } else {
        Ok(None)
    }
}

/// Step 5: build a `REASSIGN BLOCKS` parameter list covering every
/// logical LBA in the physical block, issue it, and adjust the list
/// against returned sense data up to [`MAX_REASSIGN_ROUNDS`] times.
///
/// - COMMAND-SPECIFIC INFORMATION, when present, names the first LBA the
///   drive refused: every preceding LBA is dropped before reissuing.
/// - INFORMATION, when present, names an additional bad LBA the drive
///   discovered mid-reassign: it is inserted in sorted order.
/// - A hardware-error or illegal-request sense is not retried — the
///   command is not going to succeed on resubmission.
fn try_reassign(
    transport: &mut dyn TransportOps,
    aligned: u64,
    lpp: u64,
) -> Result<RepairStatus, DstError> {
    let mut list: Vec<u64> = (aligned..aligned + lpp).collect();

    for round in 1..=MAX_REASSIGN_ROUNDS {
        let long_lba = list.last().copied().unwrap_or(aligned) > u32::MAX as u64;
        let param = encode_reassign_param(long_lba, &list);
        let outcome = transport.scsi_reassign_blocks(long_lba, &param)?;

        if outcome.ok {
            log::debug!(
                "[dst::repair] reassign succeeded on round {round} for {} LBA(s)",
                list.len()
            );
            return Ok(RepairStatus::Repaired);
        }

        let sense = outcome.sense.unwrap_or_default();
        if sense.sense_key == sense_key::HARDWARE_ERROR || sense.sense_key == sense_key::ILLEGAL_REQUEST {
            return Ok(RepairStatus::RepairFailed);
        }

        if let Some(first_refused) = sense.command_specific_information {
            list.retain(|&l| l >= first_refused);
            if list.is_empty() {
                return Ok(RepairStatus::RepairFailed);
            }
        }
        if let Some(discovered) = sense.information {
            if let Err(pos) = list.binary_search(&discovered) {
                list.insert(pos, discovered);
            }
        }
        log::debug!(
            "[dst::repair] reassign round {round} adjusted list to {} LBA(s), reissuing",
            list.len()
        );
    }

    Ok(RepairStatus::RepairFailed)
}

/// Encode a flat list of LBAs as the reassign parameter payload: 4 bytes
/// per LBA, or 8 when the final (largest) LBA would overflow 32 bits.
fn encode_reassign_param(long_lba: bool, lbas: &[u64]) -> Vec<u8> {
    let stride = if long_lba { 8 } else { 4 };
    let mut out = Vec::with_capacity(lbas.len() * stride);
    for &lba in lbas {
        let bytes = lba.to_be_bytes();
        out.extend_from_slice(&bytes[8 - stride..]);
    }
    out
}
