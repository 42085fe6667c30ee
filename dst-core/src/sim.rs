//! An in-memory `TransportOps` double used by this crate's own test
//! suite and by `dst-cli`'s demo mode. Not a pass-through backend — real
//! callers bring their own implementation of the trait.

use std::cell::Cell;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::DstError;
use crate::konst::{ata, nvme, scsi};
use crate::progress::{DstKind, DstMode, DstStatus};
use crate::transport::{
    sense_key, DeviceGuard, DeviceKind, DeviceView, NvmeIdentifySnapshot, ReassignOutcome,
    SenseData, SupportedOps, TransportOps,
};

/// One completed (or in-progress) self-test, in the normalized shape
/// every transport's log eventually collapses to.
#[derive(Debug, Clone, Copy)]
struct SimLogEntry {
    status_nibble: u8,
    lba: Option<u64>,
    power_on_hours: u16,
}

struct RunningDst {
    kind: DstKind,
    mode: DstMode,
    total_ticks: u32,
    elapsed_ticks: u32,
}

/// A scripted `REASSIGN BLOCKS` outcome, for exercising the repair
/// engine's sense-driven list-adjustment loop (design §4.6 step 5).
#[derive(Debug, Clone, Copy)]
pub struct ReassignScript {
    pub ok: bool,
    pub sense_key: u8,
    /// Sense COMMAND-SPECIFIC INFORMATION: the first LBA the drive
    /// refused, if any — the caller should drop every preceding LBA from
    /// its list before reissuing.
    pub first_refused_lba: Option<u64>,
    /// Sense INFORMATION: an additional bad LBA the drive discovered
    /// during the reassign, if any — the caller should insert it in
    /// sorted order before reissuing.
    pub discovered_lba: Option<u64>,
}

pub struct SimulatedTransport {
    view: DeviceView,
    locked: Rc<Cell<bool>>,
    base: Instant,
    elapsed: Duration,
    power_on_hours: u16,
    last_timeout_seconds: Option<u32>,
    running: Option<RunningDst>,
    /// Newest first, per every transport's actual log convention.
    history: Vec<SimLogEntry>,
    data: BTreeMap<u64, [u8; 512]>,
    /// LBAs that fail `read_lba`/`verify_lba` until reallocated.
    bad_lbas: HashSet<u64>,
    /// Subset of `bad_lbas` that also resists the implicit
    /// write-triggers-reallocation path and needs an explicit
    /// `scsi_reassign_blocks` (or is simply unrepairable on ATA/NVMe).
    stubborn_lbas: HashSet<u64>,
    reassigned_lbas: HashSet<u64>,
    reassign_call_count: u32,
    /// Scripted responses consumed one per `scsi_reassign_blocks` call, in
    /// order, for exercising the multi-round sense-driven list-adjustment
    /// path. Once exhausted, calls fall back to unconditional success.
    reassign_script: VecDeque<ReassignScript>,
    next_dst_outcome: DstStatus,
    /// LBA to report in the next failed self-test's log entry.
    next_dst_fail_lba: Option<u64>,
    /// When set, a running self-test never reports progress and never
    /// reaches `total_ticks` no matter how much simulated time passes —
    /// a stalled/hung drive, for exercising the poller's adaptive
    /// back-off and watchdog against a test that genuinely never ends.
    frozen: bool,
}

impl SimulatedTransport {
    fn new(kind: DeviceKind) -> Self {
        let supports = match kind {
            DeviceKind::Ata => {
                SupportedOps::CONVEYANCE | SupportedOps::CAPTIVE | SupportedOps::AUTOMATIC_REALLOCATION
            }
            DeviceKind::Scsi => {
                SupportedOps::CAPTIVE | SupportedOps::REASSIGN_BLOCKS
            }
            DeviceKind::Nvme => SupportedOps::empty(),
        };
        SimulatedTransport {
            view: DeviceView {
                kind,
                logical_block_size: 512,
                physical_block_size: 512,
                bridge_child_logical_block_size: None,
                max_lba: 1_000_000,
                supports,
                sector_size_emulation: false,
                non_ide_ata: true,
                nvme_identify: if kind == DeviceKind::Nvme {
                    Some(NvmeIdentifySnapshot { active_namespace_count: 1 })
                } else {
                    None
                },
            },
            locked: Rc::new(Cell::new(false)),
            base: Instant::now(),
            elapsed: Duration::ZERO,
            power_on_hours: 100,
            last_timeout_seconds: None,
            running: None,
            history: Vec::new(),
            data: BTreeMap::new(),
            bad_lbas: HashSet::new(),
            stubborn_lbas: HashSet::new(),
            reassigned_lbas: HashSet::new(),
            reassign_call_count: 0,
            reassign_script: VecDeque::new(),
            next_dst_outcome: DstStatus::Completed,
            next_dst_fail_lba: None,
            frozen: false,
        }
    }

    pub fn new_ata() -> Self {
        Self::new(DeviceKind::Ata)
    }

    pub fn new_scsi() -> Self {
        Self::new(DeviceKind::Scsi)
    }

    pub fn new_nvme() -> Self {
        Self::new(DeviceKind::Nvme)
    }

    pub fn last_timeout_seconds(&self) -> Option<u32> {
        self.last_timeout_seconds
    }

    pub fn reassign_call_count(&self) -> u32 {
        self.reassign_call_count
    }

    pub fn view_mut(&mut self) -> &mut DeviceView {
        &mut self.view
    }

    /// Mark `lba` as failing reads until the drive auto-reallocates it on
    /// a subsequent write.
    pub fn mark_bad_lba(&mut self, lba: u64) {
        self.bad_lbas.insert(lba);
    }

    /// Mark `lba` as failing reads *and* resisting the implicit
    /// write-reallocation path, so only an explicit `REASSIGN BLOCKS`
    /// (or nothing, on ATA/NVMe) clears it.
    pub fn mark_stubborn_lba(&mut self, lba: u64) {
        self.bad_lbas.insert(lba);
        self.stubborn_lbas.insert(lba);
    }

    pub fn is_bad(&self, lba: u64) -> bool {
        self.bad_lbas.contains(&lba)
    }

    /// Arrange for the next self-test to end with `outcome` rather than
    /// `Completed`, reporting `fail_lba` in its log entry.
    pub fn queue_dst_outcome(&mut self, outcome: DstStatus, fail_lba: Option<u64>) {
        self.next_dst_outcome = outcome;
        self.next_dst_fail_lba = fail_lba;
    }

    /// Queue a scripted `REASSIGN BLOCKS` response, consumed in order by
    /// successive calls. Once the queue is drained, calls unconditionally
    /// succeed.
    pub fn queue_reassign_response(&mut self, script: ReassignScript) {
        self.reassign_script.push_back(script);
    }

    /// Freeze (or unfreeze) progress reporting on the currently (or next)
    /// running self-test: while frozen, `delay_seconds` still advances the
    /// clock the poller reads via `now()`, but the test never reports
    /// progress and never completes on its own, regardless of elapsed
    /// time. Used to drive the adaptive back-off loop into its watchdog
    /// bound the way a genuinely hung drive would.
    pub fn freeze_progress(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    fn start_run(&mut self, kind: DstKind, mode: DstMode, timeout_s: u32) {
        self.last_timeout_seconds = Some(timeout_s);
        let total_ticks = match kind {
            DstKind::Short => 90,
            DstKind::Long => 3600,
            DstKind::Conveyance => 300,
        };
        self.running = Some(RunningDst {
            kind,
            mode,
            total_ticks,
            elapsed_ticks: 0,
        });
        if mode == DstMode::Captive {
            self.advance_ticks(total_ticks as u64);
        }
    }

    fn advance_ticks(&mut self, n: u64) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        running.elapsed_ticks = running
            .elapsed_ticks
            .saturating_add(n.min(u32::MAX as u64) as u32);
        if !self.frozen && running.elapsed_ticks >= running.total_ticks {
            let kind = running.kind;
            self.finish_run(kind);
        }
    }

    fn finish_run(&mut self, _kind: DstKind) {
        self.running = None;
        self.power_on_hours = self.power_on_hours.saturating_add(1);
        let status_nibble = match self.next_dst_outcome {
            DstStatus::Completed => 0x0,
            other => status_to_ata_scsi_nibble(other),
        };
        let lba = if self.next_dst_outcome != DstStatus::Completed {
            self.next_dst_fail_lba
        } else {
            None
        };
        self.history.insert(
            0,
            SimLogEntry {
                status_nibble,
                lba,
                power_on_hours: self.power_on_hours,
            },
        );
        self.history.truncate(21);
        self.next_dst_outcome = DstStatus::Completed;
        self.next_dst_fail_lba = None;
    }

    fn current_progress_nibble_and_percent(&self) -> (u8, u32) {
        match &self.running {
            Some(_) if self.frozen => (0xF, 0),
            Some(r) => {
                let percent = ((r.elapsed_ticks as u64 * 100) / r.total_ticks.max(1) as u64) as u32;
                (0xF, percent.min(99))
            }
            None => match self.history.first() {
                Some(e) => (e.status_nibble, 0),
                None => (nvme::DST_STATUS_NOT_USED, 0),
            },
        }
    }

    fn read_one(&self, lba: u64) -> Result<[u8; 512], DstError> {
        if self.bad_lbas.contains(&lba) {
            return Err(DstError::TransportFailure { command: "read" });
        }
        Ok(self.data.get(&lba).copied().unwrap_or([0u8; 512]))
    }
}

fn status_to_ata_scsi_nibble(status: DstStatus) -> u8 {
    match status {
        DstStatus::Completed => 0x0,
        DstStatus::AbortedByHost => 0x1,
        DstStatus::InterruptedByReset => 0x2,
        DstStatus::UnknownFailure => 0x3,
        DstStatus::UnknownElementFailure => 0x4,
        DstStatus::ElectricalFailure => 0x5,
        DstStatus::ServoSeekFailure => 0x6,
        DstStatus::ReadFailure => 0x7,
        DstStatus::HandlingDamage => 0x8,
        DstStatus::Reserved(n) => n,
        _ => 0x3,
    }
}

impl TransportOps for SimulatedTransport {
    fn view(&self) -> &DeviceView {
        &self.view
    }

    fn ata_smart_offline(&mut self, subcommand: u8, timeout_s: u32) -> Result<(), DstError> {
        if self.view.kind != DeviceKind::Ata {
            return Err(DstError::NotSupported { op: "ata_smart_offline", transport: self.view.kind });
        }
        if subcommand == ata::SMART_OFFLINE_ABORT {
            self.running = None;
            return Ok(());
        }
        let (kind, mode) = match subcommand {
            ata::SMART_OFFLINE_SHORT => (DstKind::Short, DstMode::Offline),
            ata::SMART_OFFLINE_LONG => (DstKind::Long, DstMode::Offline),
            ata::SMART_OFFLINE_CONVEYANCE => (DstKind::Conveyance, DstMode::Offline),
            ata::SMART_OFFLINE_SHORT_CAPTIVE => (DstKind::Short, DstMode::Captive),
            ata::SMART_OFFLINE_LONG_CAPTIVE => (DstKind::Long, DstMode::Captive),
            ata::SMART_OFFLINE_CONVEYANCE_CAPTIVE => (DstKind::Conveyance, DstMode::Captive),
            _ => return Err(DstError::BadParameter { reason: "unknown SMART OFFLINE subcommand" }),
        };
        self.start_run(kind, mode, timeout_s);
        Ok(())
    }

    fn ata_smart_read_data(&mut self) -> Result<[u8; 512], DstError> {
        let mut buf = [0u8; 512];
        let (nibble, percent_complete) = self.current_progress_nibble_and_percent();
        let percent_remaining = (100 - percent_complete.min(100)) / 10;
        buf[ata::SMART_DATA_STATUS_BYTE_OFFSET] = (nibble << 4) | (percent_remaining as u8 & 0x0F);
        Ok(buf)
    }

    fn ata_smart_read_log(&mut self, log_id: u8) -> Result<Vec<u8>, DstError> {
        if log_id != ata::LEGACY_SELFTEST_LOG_ID {
            return Err(DstError::NotSupported { op: "ata_smart_read_log", transport: self.view.kind });
        }
        let mut buf = vec![0u8; 512];
        buf[0] = 0x00;
        buf[1] = 0x00;
        for (i, entry) in self.history.iter().take(ata::LEGACY_SELFTEST_SLOTS).enumerate() {
            let off = 2 + i * ata::LEGACY_SELFTEST_DESCRIPTOR_LEN;
            buf[off] = 0x00; // ordinal
            buf[off + 1] = entry.status_nibble << 4;
            let poh = entry.power_on_hours.to_le_bytes();
            buf[off + 2] = poh[0];
            buf[off + 3] = poh[1];
            let lba = entry.lba.unwrap_or(ata::MAX_28_BIT_LBA) & ata::MAX_28_BIT_LBA;
            buf[off + 5] = (lba & 0xFF) as u8;
            buf[off + 6] = ((lba >> 8) & 0xFF) as u8;
            buf[off + 7] = ((lba >> 16) & 0xFF) as u8;
        }
        Ok(buf)
    }

    fn ata_read_log_ext(&mut self, log_id: u8, page: u16) -> Result<Vec<u8>, DstError> {
        if log_id != ata::EXT_SELFTEST_LOG_ID || page != 0 {
            return Err(DstError::NotSupported { op: "ata_read_log_ext", transport: self.view.kind });
        }
        let mut buf = vec![0u8; 512];
        for (i, entry) in self
            .history
            .iter()
            .take(ata::EXT_SELFTEST_DESCRIPTORS_PER_PAGE)
            .enumerate()
        {
            let off = 2 + i * ata::EXT_SELFTEST_DESCRIPTOR_LEN;
            buf[off] = 0x00;
            buf[off + 1] = entry.status_nibble << 4;
            let poh = entry.power_on_hours.to_le_bytes();
            buf[off + 2] = poh[0];
            buf[off + 3] = poh[1];
            let lba = entry.lba.unwrap_or(ata::MAX_48_BIT_LBA) & ata::MAX_48_BIT_LBA;
            for (b, byte) in lba.to_le_bytes().into_iter().take(6).enumerate() {
                buf[off + 5 + b] = byte;
            }
        }
        Ok(buf)
    }

    fn scsi_send_diagnostic(&mut self, self_test_code: u8, timeout_s: u32) -> Result<(), DstError> {
        if self.view.kind != DeviceKind::Scsi {
            return Err(DstError::NotSupported { op: "scsi_send_diagnostic", transport: self.view.kind });
        }
        if self_test_code == scsi::SEND_DIAG_ABORT {
            self.running = None;
            return Ok(());
        }
        let (kind, mode) = match self_test_code {
            scsi::SEND_DIAG_SHORT_BACKGROUND => (DstKind::Short, DstMode::Offline),
            scsi::SEND_DIAG_LONG_BACKGROUND => (DstKind::Long, DstMode::Offline),
            scsi::SEND_DIAG_SHORT_FOREGROUND => (DstKind::Short, DstMode::Captive),
            scsi::SEND_DIAG_LONG_FOREGROUND => (DstKind::Long, DstMode::Captive),
            _ => return Err(DstError::BadParameter { reason: "unknown SEND DIAGNOSTIC self-test code" }),
        };
        self.start_run(kind, mode, timeout_s);
        Ok(())
    }

    fn scsi_log_sense(&mut self, page: u8, _subpage: u8) -> Result<Vec<u8>, DstError> {
        if page != scsi::SELFTEST_RESULTS_LOG_PAGE {
            return Err(DstError::NotSupported { op: "scsi_log_sense", transport: self.view.kind });
        }
        let mut buf = vec![0u8; 4 + scsi::SELFTEST_MAX_ENTRIES * scsi::SELFTEST_DESCRIPTOR_LEN];
        let entry_count = self.history.len().min(scsi::SELFTEST_MAX_ENTRIES);
        let page_len = (entry_count * scsi::SELFTEST_DESCRIPTOR_LEN) as u16;
        buf[2..4].copy_from_slice(&page_len.to_be_bytes());
        for (i, entry) in self.history.iter().take(scsi::SELFTEST_MAX_ENTRIES).enumerate() {
            let off = scsi::SELFTEST_FIRST_DESCRIPTOR_OFFSET + i * scsi::SELFTEST_DESCRIPTOR_LEN;
            buf[off + 4] = entry.status_nibble & 0x0F;
            let poh = entry.power_on_hours.to_be_bytes();
            buf[off + 6] = poh[0];
            buf[off + 7] = poh[1];
            let lba = entry.lba.unwrap_or(u64::MAX);
            buf[off + 8..off + 16].copy_from_slice(&lba.to_be_bytes());
            buf[off + 16] = sense_key::MEDIUM_ERROR;
            buf[off + 17] = 0x40;
            buf[off + 18] = 0x80 | (entry.status_nibble & 0x0F);
        }
        Ok(buf)
    }

    fn scsi_request_sense(&mut self) -> Result<SenseData, DstError> {
        let progress = self.running.as_ref().map(|r| {
            (((r.elapsed_ticks as u64 * 65536) / r.total_ticks.max(1) as u64).min(65535)) as u16
        });
        Ok(SenseData {
            self_test_progress: progress,
            ..SenseData::default()
        })
    }

    fn scsi_reassign_blocks(
        &mut self,
        long_lba: bool,
        param: &[u8],
    ) -> Result<ReassignOutcome, DstError> {
        self.reassign_call_count += 1;
        let requested = parse_reassign_param(long_lba, param);
        if let Some(script) = self.reassign_script.pop_front() {
            if script.ok {
                for &lba in &requested {
                    self.reallocate(lba);
                }
                return Ok(ReassignOutcome { ok: true, sense: None });
            }
            let sense = SenseData {
                sense_key: script.sense_key,
                asc: 0x5D,
                ascq: 0x00,
                information: script.discovered_lba,
                command_specific_information: script.first_refused_lba,
                self_test_progress: None,
            };
            return Ok(ReassignOutcome { ok: false, sense: Some(sense) });
        }
        for &lba in &requested {
            self.reallocate(lba);
        }
        Ok(ReassignOutcome { ok: true, sense: None })
    }

    fn scsi_long_dst_minutes(&mut self) -> Result<Option<u32>, DstError> {
        Ok(Some(60))
    }

    fn nvme_device_self_test(&mut self, _nsid: u32, stc: u8) -> Result<(), DstError> {
        if self.view.kind != DeviceKind::Nvme {
            return Err(DstError::NotSupported { op: "nvme_device_self_test", transport: self.view.kind });
        }
        if stc == nvme::STC_ABORT {
            self.running = None;
            return Ok(());
        }
        let kind = match stc {
            nvme::STC_SHORT => DstKind::Short,
            nvme::STC_LONG => DstKind::Long,
            _ => return Err(DstError::BadParameter { reason: "unknown NVMe STC field" }),
        };
        // NVMe has no captive mode; the core simulates it by tight polling,
        // so the command itself is always background.
        self.start_run(kind, DstMode::Offline, 0);
        Ok(())
    }

    fn nvme_get_log_page(&mut self, lid: u8, _nsid: u32, _len: usize) -> Result<Vec<u8>, DstError> {
        if lid != nvme::DST_LOG_LID {
            return Err(DstError::NotSupported { op: "nvme_get_log_page", transport: self.view.kind });
        }
        let mut buf = vec![0u8; nvme::DST_LOG_LEN];
        let (_, percent) = self.current_progress_nibble_and_percent();
        if self.running.is_some() {
            buf[0] = 1;
            buf[1] = percent as u8;
        } else {
            buf[0] = 0;
        }
        for (i, entry) in self.history.iter().take(nvme::DST_MAX_ENTRIES).enumerate() {
            let off = nvme::DST_FIRST_DESCRIPTOR_OFFSET + i * nvme::DST_DESCRIPTOR_LEN;
            buf[off] = entry.status_nibble & 0x0F;
            buf[off + 2] = 0b0000_0011; // nsid valid (bit0) + lba valid (bit1)
            let poh = (entry.power_on_hours as u64).to_le_bytes();
            buf[off + 4..off + 12].copy_from_slice(&poh);
            buf[off + 12..off + 16].copy_from_slice(&1u32.to_le_bytes()); // nsid
            let lba = entry.lba.unwrap_or(u64::MAX);
            buf[off + 16..off + 24].copy_from_slice(&lba.to_le_bytes());
        }
        Ok(buf)
    }

    fn read_lba(&mut self, lba: u64, count: u32) -> Result<Vec<u8>, DstError> {
        let mut out = Vec::with_capacity(512 * count as usize);
        for i in 0..count as u64 {
            out.extend_from_slice(&self.read_one(lba + i)?);
        }
        Ok(out)
    }

    fn write_lba(&mut self, lba: u64, data: &[u8]) -> Result<(), DstError> {
        if self.stubborn_lbas.contains(&lba) {
            return Err(DstError::TransportFailure { command: "write" });
        }
        for (i, chunk) in data.chunks(512).enumerate() {
            let mut block = [0u8; 512];
            block[..chunk.len()].copy_from_slice(chunk);
            self.data.insert(lba + i as u64, block);
            // A successful write to a previously-bad sector simulates the
            // drive's automatic reallocation-on-write; every block in the
            // write, not just the starting LBA, gets the same treatment.
            self.reallocate(lba + i as u64);
        }
        Ok(())
    }

    fn verify_lba(&mut self, lba: u64, count: u32) -> Result<bool, DstError> {
        for i in 0..count as u64 {
            if self.bad_lbas.contains(&(lba + i)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn verify_range(&mut self, start: u64, count: u64) -> Result<bool, DstError> {
        Ok(!self.bad_lbas.iter().any(|&l| l >= start && l < start + count))
    }

    fn flush_cache(&mut self) -> Result<(), DstError> {
        Ok(())
    }

    fn lock_device(&mut self) -> Result<DeviceGuard, DstError> {
        if self.locked.get() {
            return Err(DstError::BadParameter { reason: "device already locked" });
        }
        self.locked.set(true);
        let flag = Rc::clone(&self.locked);
        Ok(DeviceGuard::new(move || flag.set(false)))
    }

    fn now(&self) -> Instant {
        self.base + self.elapsed
    }

    fn delay_seconds(&mut self, n: u64) {
        self.elapsed += Duration::from_secs(n);
        self.advance_ticks(n);
    }
}

impl SimulatedTransport {
    fn reallocate(&mut self, lba: u64) {
        if self.bad_lbas.remove(&lba) {
            self.stubborn_lbas.remove(&lba);
            self.reassigned_lbas.insert(lba);
        }
    }
}

fn parse_reassign_param(long_lba: bool, param: &[u8]) -> Vec<u64> {
    let stride = if long_lba { 8 } else { 4 };
    param
        .chunks_exact(stride)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf[8 - stride..].copy_from_slice(chunk);
            u64::from_be_bytes(buf)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_device_rejects_reentrant_lock() {
        let mut t = SimulatedTransport::new_ata();
        let guard = t.lock_device().unwrap();
        assert!(t.lock_device().is_err());
        drop(guard);
        assert!(t.lock_device().is_ok());
    }

    #[test]
    fn captive_test_completes_synchronously() {
        let mut t = SimulatedTransport::new_ata();
        t.ata_smart_offline(ata::SMART_OFFLINE_SHORT_CAPTIVE, 120).unwrap();
        let data = t.ata_smart_read_data().unwrap();
        assert_eq!(data[ata::SMART_DATA_STATUS_BYTE_OFFSET] >> 4, 0x0);
    }

    #[test]
    fn offline_test_progresses_with_delay_seconds() {
        let mut t = SimulatedTransport::new_ata();
        t.ata_smart_offline(ata::SMART_OFFLINE_SHORT, 120).unwrap();
        t.delay_seconds(45);
        let data = t.ata_smart_read_data().unwrap();
        assert_eq!(data[ata::SMART_DATA_STATUS_BYTE_OFFSET] >> 4, 0xF);
        t.delay_seconds(90);
        let data = t.ata_smart_read_data().unwrap();
        assert_eq!(data[ata::SMART_DATA_STATUS_BYTE_OFFSET] >> 4, 0x0);
    }

    #[test]
    fn bad_lba_read_fails_until_write_reallocates() {
        let mut t = SimulatedTransport::new_scsi();
        t.mark_bad_lba(42);
        assert!(t.read_lba(42, 1).is_err());
        t.write_lba(42, &[0u8; 512]).unwrap();
        assert!(t.read_lba(42, 1).is_ok());
    }

    #[test]
    fn stubborn_lba_resists_write_and_needs_explicit_reassign() {
        let mut t = SimulatedTransport::new_scsi();
        t.mark_stubborn_lba(7);
        assert!(t.write_lba(7, &[0u8; 512]).is_err());
        let outcome = t.scsi_reassign_blocks(false, &7u32.to_be_bytes()).unwrap();
        assert!(outcome.ok);
        assert!(t.write_lba(7, &[0u8; 512]).is_ok());
    }
}
