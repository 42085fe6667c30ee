//! Error taxonomy shared by every component in this crate.
//!
//! Variants map 1:1 onto the kinds described in the design's "error
//! handling" section; they are *kinds*, not wrappers around specific
//! transport error codes, so callers can match on them without caring
//! which transport produced the failure.

use crate::transport::DeviceKind;

/// Errors raised by any DST or repair operation.
#[derive(thiserror::Error, Debug)]
pub enum DstError {
    /// The transport tag has no implementation for the requested operation
    /// (e.g. conveyance self-test on an NVMe device).
    #[error("{op} is not supported on {transport:?}")]
    NotSupported {
        op: &'static str,
        transport: DeviceKind,
    },

    /// The caller supplied a nonsensical input.
    #[error("bad parameter: {reason}")]
    BadParameter { reason: &'static str },

    /// The underlying transport command failed and is unrecoverable at
    /// this layer.
    #[error("transport command failed: {command}")]
    TransportFailure { command: &'static str },

    /// The OS blocked the I/O (pass-through access, or a specific LBA
    /// write).
    #[error("access denied at LBA {lba}")]
    AccessDenied { lba: u64 },

    /// Buffer allocation for a log or data transfer failed.
    #[error("memory allocation failed for {context}")]
    MemoryFailure { context: &'static str },

    /// A progress query observed the test still running.
    #[error("self-test in progress ({percent_complete}% complete)")]
    InProgress { percent_complete: u32 },

    /// The test was aborted — by the host, by an interrupting reset, or
    /// by the watchdog.
    #[error("self-test aborted: {reason}")]
    Aborted { reason: AbortReason },

    /// The test completed with a non-success status.
    #[error("self-test failed with status 0x{status:02X}")]
    Failure { status: u8 },

    /// An I/O error surfaced by a `TransportOps` implementation that
    /// doesn't fit any of the above (propagated transparently).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a self-test run ended in `DstError::Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The caller explicitly requested `abort_dst`.
    HostRequested,
    /// An interrupting reset (power cycle, bus reset) ended the test.
    InterruptingReset,
    /// The watchdog issued the abort after back-off maxed out and total
    /// wait exceeded `5 * total_dst_seconds`.
    Watchdog,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AbortReason::HostRequested => "host requested",
            AbortReason::InterruptingReset => "interrupting reset",
            AbortReason::Watchdog => "watchdog timeout",
        };
        f.write_str(s)
    }
}

/// Classify a raw OS-level I/O result from a pass-through syscall or
/// ioctl into the taxonomy above, so a real `TransportOps` backend has
/// one place to do this instead of matching `ErrorKind` at every method.
/// `command` and `lba` only matter for the variants that carry context;
/// anything not recognized falls through to the transparent `Io` variant.
pub fn classify_io<T>(result: std::io::Result<T>, command: &'static str, lba: u64) -> Result<T, DstError> {
    result.map_err(|err| match err.kind() {
        std::io::ErrorKind::PermissionDenied => DstError::AccessDenied { lba },
        std::io::ErrorKind::OutOfMemory => DstError::MemoryFailure { context: command },
        _ => DstError::Io(err),
    })
}

impl DstError {
    /// Whether a caller should treat this failure as recoverable — i.e.
    /// retryable at a higher level (the DST-and-Clean loop records it on
    /// the `ErrorList` and continues) rather than fatal to the whole run.
    ///
    /// Only `Failure` (a completed-but-unsuccessful test, or a single LBA
    /// repair attempt that simply didn't work) is recoverable; everything
    /// else propagates immediately per the propagation policy.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DstError::Failure { .. })
    }
}
