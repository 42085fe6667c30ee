//! Named wire constants from the external interface contract. Every
//! magic number called out by the design's bit-level wire-constants
//! table gets a name here; call sites never spell out the literal.

pub mod ata {
    /// SMART OFFLINE subcommand: short self-test, offline.
    pub const SMART_OFFLINE_SHORT: u8 = 0x01;
    /// SMART OFFLINE subcommand: long (extended) self-test, offline.
    pub const SMART_OFFLINE_LONG: u8 = 0x02;
    /// SMART OFFLINE subcommand: conveyance self-test, offline.
    pub const SMART_OFFLINE_CONVEYANCE: u8 = 0x03;
    /// SMART OFFLINE subcommand: short self-test, captive.
    pub const SMART_OFFLINE_SHORT_CAPTIVE: u8 = 0x81;
    /// SMART OFFLINE subcommand: long self-test, captive.
    pub const SMART_OFFLINE_LONG_CAPTIVE: u8 = 0x82;
    /// SMART OFFLINE subcommand: conveyance self-test, captive.
    pub const SMART_OFFLINE_CONVEYANCE_CAPTIVE: u8 = 0x83;
    /// SMART OFFLINE subcommand: abort any in-progress self-test.
    pub const SMART_OFFLINE_ABORT: u8 = 0x7F;

    /// Byte offset of the self-test status/percent nibble in the 512-byte
    /// SMART DATA structure.
    pub const SMART_DATA_STATUS_BYTE_OFFSET: usize = 363;

    /// GPL extended self-test log (48-bit LBA addressable).
    pub const EXT_SELFTEST_LOG_ID: u8 = 0x07;
    /// Descriptor length within the extended self-test log.
    pub const EXT_SELFTEST_DESCRIPTOR_LEN: usize = 26;
    /// Max descriptors a page of the extended log holds before trailing
    /// reserved bytes.
    pub const EXT_SELFTEST_DESCRIPTORS_PER_PAGE: usize = 19;
    /// Offset to wrap to when stepping backward across a page boundary.
    pub const EXT_SELFTEST_WRAP_OFFSET: usize = 472;
    /// Hard cap on entries walked, even short of a full wraparound.
    pub const EXT_SELFTEST_MAX_ENTRIES: usize = 21;

    /// SMART (legacy, 28-bit LBA) self-test log.
    pub const LEGACY_SELFTEST_LOG_ID: u8 = 0x06;
    /// Descriptor length within the legacy self-test log.
    pub const LEGACY_SELFTEST_DESCRIPTOR_LEN: usize = 24;
    /// Slot count in the single-page legacy log.
    pub const LEGACY_SELFTEST_SLOTS: usize = 21;
    /// Offset to wrap to when stepping backward past the first slot.
    pub const LEGACY_SELFTEST_WRAP_OFFSET: usize = 482;

    /// 28-bit all-F's sentinel for "no LBA" in the legacy log.
    pub const MAX_28_BIT_LBA: u64 = 0x0FFF_FFFF;
    /// 48-bit all-F's sentinel for "no LBA" in the extended log.
    pub const MAX_48_BIT_LBA: u64 = 0x0000_FFFF_FFFF_FFFF;
}

pub mod scsi {
    /// SEND DIAGNOSTIC self-test code: short, background (offline).
    pub const SEND_DIAG_SHORT_BACKGROUND: u8 = 0x01;
    /// SEND DIAGNOSTIC self-test code: long (extended), background.
    pub const SEND_DIAG_LONG_BACKGROUND: u8 = 0x02;
    /// SEND DIAGNOSTIC self-test code: short, foreground (captive).
    pub const SEND_DIAG_SHORT_FOREGROUND: u8 = 0x05;
    /// SEND DIAGNOSTIC self-test code: long, foreground.
    pub const SEND_DIAG_LONG_FOREGROUND: u8 = 0x06;
    /// SEND DIAGNOSTIC self-test code: abort.
    pub const SEND_DIAG_ABORT: u8 = 0x04;

    /// Self-test results log page.
    pub const SELFTEST_RESULTS_LOG_PAGE: u8 = 0x10;
    /// Descriptor length within the self-test results log page.
    pub const SELFTEST_DESCRIPTOR_LEN: usize = 20;
    /// Byte offset of the first descriptor within the log page.
    pub const SELFTEST_FIRST_DESCRIPTOR_OFFSET: usize = 4;
    /// Max descriptors the page can hold.
    pub const SELFTEST_MAX_ENTRIES: usize = 20;
}

pub mod nvme {
    /// Device Self-Test command STC field: short.
    pub const STC_SHORT: u8 = 1;
    /// Device Self-Test command STC field: extended (long).
    pub const STC_LONG: u8 = 2;
    /// Device Self-Test command STC field: abort.
    pub const STC_ABORT: u8 = 0x0F;
    /// Namespace id meaning "all namespaces" for an abort request.
    pub const NSID_ALL: u32 = 0xFFFF_FFFF;

    /// Device self-test log page identifier.
    pub const DST_LOG_LID: u8 = 0x06;
    /// Fixed length of the device self-test log page.
    pub const DST_LOG_LEN: usize = 564;
    /// Descriptor length within the device self-test log.
    pub const DST_DESCRIPTOR_LEN: usize = 28;
    /// Byte offset of the first descriptor within the log page.
    pub const DST_FIRST_DESCRIPTOR_OFFSET: usize = 4;
    /// Max descriptors the page can hold.
    pub const DST_MAX_ENTRIES: usize = 20;
    /// Status-nibble value meaning "entry not used".
    pub const DST_STATUS_NOT_USED: u8 = 0x0F;
}

/// The `UINT64_MAX` sentinel meaning "no LBA reported". Load-bearing:
/// every log-parsing variant normalizes its transport-specific all-F's
/// value to this one sentinel, and every consumer tests only against
/// this sentinel, never the transport-native all-F's pattern.
pub const NO_LBA: u64 = u64::MAX;
