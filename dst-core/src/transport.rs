//! The external transport boundary.
//!
//! `TransportOps` is the trait this crate consumes from its host
//! application; a real implementation sits on top of an ATA pass-through
//! ioctl, a SCSI CDB issuer, or NVMe admin/IO submission queues. None of
//! that wire plumbing lives here — per the design, the raw transport
//! command layer is an external collaborator. This module only names the
//! shape of that collaborator and the read-only device capabilities
//! (`DeviceView`) the core needs to make decisions.

use std::time::Instant;

use crate::error::DstError;

/// Which physical transport a device handle speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Ata,
    Scsi,
    Nvme,
}

bitflags::bitflags! {
    /// Capability bits reported by the device, consulted before issuing
    /// an operation the transport (or this particular drive) might not
    /// support.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SupportedOps: u32 {
        /// ATA conveyance self-test.
        const CONVEYANCE       = 1 << 0;
        /// Captive/foreground self-test mode.
        const CAPTIVE          = 1 << 1;
        /// SCSI REASSIGN BLOCKS.
        const REASSIGN_BLOCKS  = 1 << 2;
        /// Drive performs read/write reallocation automatically.
        const AUTOMATIC_REALLOCATION = 1 << 3;
    }
}

/// A minimal NVMe identify snapshot, enough for the pieces of this crate
/// that branch on namespace count. Full identify decoding belongs to the
/// identify-data provider this crate consumes, not to this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NvmeIdentifySnapshot {
    pub active_namespace_count: u32,
}

/// Read-only capability description of the device under test.
#[derive(Debug, Clone)]
pub struct DeviceView {
    pub kind: DeviceKind,
    pub logical_block_size: u32,
    pub physical_block_size: u32,
    /// Logical block size the physical bridge device reports, when the
    /// host device lies about its true geometry (a USB/SATA bridge
    /// emulating 512-byte sectors over a 4Kn drive, for instance).
    pub bridge_child_logical_block_size: Option<u32>,
    pub max_lba: u64,
    pub supports: SupportedOps,
    /// `true` when a sector-size emulation layer sits between us and the
    /// physical media (see `repair::repair_lba`'s force-pass-through
    /// branch).
    pub sector_size_emulation: bool,
    /// `true` for an ATA device that is not behind IDE-style emulation —
    /// used to gate the access-denied pass-through retry in §7.
    pub non_ide_ata: bool,
    pub nvme_identify: Option<NvmeIdentifySnapshot>,
}

impl DeviceView {
    /// Logical blocks per physical block, rounded down to at least 1.
    pub fn logical_per_physical(&self) -> u64 {
        (self.physical_block_size / self.logical_block_size.max(1)).max(1) as u64
    }
}

/// SCSI sense data (also used to carry an ATA-synthesized sense triple).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SenseData {
    pub sense_key: u8,
    pub asc: u8,
    pub ascq: u8,
    /// The INFORMATION field, when the command populated it.
    pub information: Option<u64>,
    /// The COMMAND-SPECIFIC INFORMATION field, when the command
    /// populated it.
    pub command_specific_information: Option<u64>,
    /// The sense-key-specific "self-test progress" fraction (bytes
    /// 16-17 of REQUEST SENSE), present while a background self-test is
    /// running.
    pub self_test_progress: Option<u16>,
}

/// Well-known SCSI sense keys this crate branches on.
pub mod sense_key {
    pub const NO_SENSE: u8 = 0x0;
    pub const RECOVERED_ERROR: u8 = 0x1;
    pub const NOT_READY: u8 = 0x2;
    pub const MEDIUM_ERROR: u8 = 0x3;
    pub const HARDWARE_ERROR: u8 = 0x4;
    pub const ILLEGAL_REQUEST: u8 = 0x5;
    pub const UNIT_ATTENTION: u8 = 0x6;
    pub const ABORTED_COMMAND: u8 = 0xB;
}

/// Outcome of a SCSI REASSIGN BLOCKS attempt.
#[derive(Debug, Clone, Copy)]
pub struct ReassignOutcome {
    pub ok: bool,
    pub sense: Option<SenseData>,
}

/// A scoped, RAII device-exclusivity guard. Released on drop, regardless
/// of which return path drops it — the Rust idiom for the design's
/// "opaque scoped resource released on every return path".
///
/// Deliberately `'static`/unborrowed: a guard that instead held a
/// reference into the issuing `TransportOps` would make it impossible to
/// call any other `&mut self` transport method while the guard is live,
/// which is exactly what `starter::start_dst` needs to do. Implementers
/// back `release` with their own shared interior-mutable lock flag.
pub struct DeviceGuard {
    release: Box<dyn FnMut()>,
}

impl DeviceGuard {
    pub fn new(release: impl FnMut() + 'static) -> Self {
        Self {
            release: Box::new(release),
        }
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        (self.release)();
    }
}

/// The raw transport primitives this crate consumes. A production
/// implementation backs this with real pass-through ioctls; this crate
/// ships only a `SimulatedTransport` test/demo double (see `sim.rs`).
///
/// Methods for a transport a given device doesn't speak (e.g. calling an
/// `ata_*` method against a SCSI device) should return
/// `DstError::NotSupported`. An implementation backed by real syscalls
/// should turn OS errors into the right variant via
/// [`crate::error::classify_io`] rather than matching `ErrorKind` itself.
pub trait TransportOps {
    fn view(&self) -> &DeviceView;

    // ---- ATA ----------------------------------------------------------
    fn ata_smart_offline(&mut self, subcommand: u8, timeout_s: u32) -> Result<(), DstError>;
    fn ata_smart_read_data(&mut self) -> Result<[u8; 512], DstError>;
    fn ata_smart_read_log(&mut self, log_id: u8) -> Result<Vec<u8>, DstError>;
    fn ata_read_log_ext(&mut self, log_id: u8, page: u16) -> Result<Vec<u8>, DstError>;

    // ---- SCSI -----------------------------------------------------------
    fn scsi_send_diagnostic(&mut self, self_test_code: u8, timeout_s: u32) -> Result<(), DstError>;
    fn scsi_log_sense(&mut self, page: u8, subpage: u8) -> Result<Vec<u8>, DstError>;
    fn scsi_request_sense(&mut self) -> Result<SenseData, DstError>;
    fn scsi_reassign_blocks(
        &mut self,
        long_lba: bool,
        param: &[u8],
    ) -> Result<ReassignOutcome, DstError>;
    /// Inquiry/mode-sense derived long-DST time, in whole minutes.
    fn scsi_long_dst_minutes(&mut self) -> Result<Option<u32>, DstError>;

    // ---- NVMe -----------------------------------------------------------
    fn nvme_device_self_test(&mut self, nsid: u32, stc: u8) -> Result<(), DstError>;
    fn nvme_get_log_page(&mut self, lid: u8, nsid: u32, len: usize) -> Result<Vec<u8>, DstError>;

    // ---- generic ----------------------------------------------------------
    fn read_lba(&mut self, lba: u64, count: u32) -> Result<Vec<u8>, DstError>;
    fn write_lba(&mut self, lba: u64, data: &[u8]) -> Result<(), DstError>;
    fn verify_lba(&mut self, lba: u64, count: u32) -> Result<bool, DstError>;
    fn verify_range(&mut self, start: u64, count: u64) -> Result<bool, DstError>;
    fn flush_cache(&mut self) -> Result<(), DstError>;

    /// Acquire the device's exclusive-access guard. Only the DST starter
    /// takes this lock.
    fn lock_device(&mut self) -> Result<DeviceGuard, DstError>;

    /// Monotonic clock read, so tests can run a simulated clock instead
    /// of wall time.
    fn now(&self) -> Instant;
    /// Advance time (or actually sleep, on a real transport) by `n`
    /// seconds.
    fn delay_seconds(&mut self, n: u64);
}
