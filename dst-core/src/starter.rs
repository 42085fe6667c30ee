//! DST Starter (component C3): issues the self-test start command in the
//! requested kind/mode, behind the device's exclusivity guard.

use crate::error::DstError;
use crate::konst::{ata, nvme, scsi};
use crate::progress::{DstKind, DstMode};
use crate::transport::{DeviceKind, TransportOps};

/// Sentinel timeout (seconds) used when the caller passes `timeout_ms ==
/// 0` and wants "wait indefinitely" rather than any particular bound.
pub const INFINITE_TIMEOUT_SECONDS: u32 = u32::MAX;

/// Issue the self-test start command.
///
/// Acquires the device's exclusive-access guard for the duration of the
/// call and releases it on every return path (the guard's `Drop` makes
/// this automatic). `timeout_ms == 0` means "no particular bound" and is
/// translated to [`INFINITE_TIMEOUT_SECONDS`].
pub fn start_dst(
    transport: &mut dyn TransportOps,
    kind: DstKind,
    mode: DstMode,
    timeout_ms: u32,
) -> Result<(), DstError> {
    let device_kind = transport.view().kind;

    if kind == DstKind::Conveyance && device_kind != DeviceKind::Ata {
        return Err(DstError::NotSupported {
            op: "conveyance self-test",
            transport: device_kind,
        });
    }
    if mode == DstMode::Captive && device_kind == DeviceKind::Nvme {
        return Err(DstError::NotSupported {
            op: "captive self-test",
            transport: device_kind,
        });
    }

    let timeout_s = if timeout_ms == 0 {
        INFINITE_TIMEOUT_SECONDS
    } else {
        timeout_ms.div_ceil(1000)
    };

    let _guard = transport.lock_device()?;

    match device_kind {
        DeviceKind::Ata => {
            let subcommand = match (kind, mode) {
                (DstKind::Short, DstMode::Offline) => ata::SMART_OFFLINE_SHORT,
                (DstKind::Long, DstMode::Offline) => ata::SMART_OFFLINE_LONG,
                (DstKind::Conveyance, DstMode::Offline) => ata::SMART_OFFLINE_CONVEYANCE,
                (DstKind::Short, DstMode::Captive) => ata::SMART_OFFLINE_SHORT_CAPTIVE,
                (DstKind::Long, DstMode::Captive) => ata::SMART_OFFLINE_LONG_CAPTIVE,
                (DstKind::Conveyance, DstMode::Captive) => ata::SMART_OFFLINE_CONVEYANCE_CAPTIVE,
            };
            log::debug!("[dst::start] ata smart_offline subcommand=0x{subcommand:02X} timeout={timeout_s}s");
            transport.ata_smart_offline(subcommand, timeout_s)
        }
        DeviceKind::Scsi => {
            if kind == DstKind::Conveyance {
                return Err(DstError::NotSupported {
                    op: "conveyance self-test",
                    transport: device_kind,
                });
            }
            let code = match (kind, mode) {
                (DstKind::Short, DstMode::Offline) => scsi::SEND_DIAG_SHORT_BACKGROUND,
                (DstKind::Long, DstMode::Offline) => scsi::SEND_DIAG_LONG_BACKGROUND,
                (DstKind::Short, DstMode::Captive) => scsi::SEND_DIAG_SHORT_FOREGROUND,
                (DstKind::Long, DstMode::Captive) => scsi::SEND_DIAG_LONG_FOREGROUND,
                (DstKind::Conveyance, _) => unreachable!("rejected above"),
            };
            log::debug!("[dst::start] scsi send_diagnostic code=0x{code:02X} timeout={timeout_s}s");
            transport.scsi_send_diagnostic(code, timeout_s)
        }
        DeviceKind::Nvme => {
            if kind == DstKind::Conveyance {
                return Err(DstError::NotSupported {
                    op: "conveyance self-test",
                    transport: device_kind,
                });
            }
            let stc = match kind {
                DstKind::Short => nvme::STC_SHORT,
                DstKind::Long => nvme::STC_LONG,
                DstKind::Conveyance => unreachable!("rejected above"),
            };
            log::debug!("[dst::start] nvme device_self_test stc={stc}");
            transport.nvme_device_self_test(nvme::NSID_ALL, stc)
        }
    }
}

/// Issue `abort_dst`. NVMe requires a namespace id; the core passes "all
/// namespaces".
pub fn abort_dst(transport: &mut dyn TransportOps) -> Result<(), DstError> {
    match transport.view().kind {
        DeviceKind::Ata => transport.ata_smart_offline(ata::SMART_OFFLINE_ABORT, 0),
        DeviceKind::Scsi => transport.scsi_send_diagnostic(scsi::SEND_DIAG_ABORT, 0),
        DeviceKind::Nvme => transport.nvme_device_self_test(nvme::NSID_ALL, nvme::STC_ABORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedTransport;

    #[test]
    fn conveyance_rejected_on_non_ata() {
        let mut t = SimulatedTransport::new_scsi();
        let err = start_dst(&mut t, DstKind::Conveyance, DstMode::Offline, 0).unwrap_err();
        assert!(matches!(err, DstError::NotSupported { .. }));
    }

    #[test]
    fn captive_rejected_on_nvme() {
        let mut t = SimulatedTransport::new_nvme();
        let err = start_dst(&mut t, DstKind::Short, DstMode::Captive, 0).unwrap_err();
        assert!(matches!(err, DstError::NotSupported { .. }));
    }

    #[test]
    fn zero_timeout_becomes_infinite_sentinel() {
        let mut t = SimulatedTransport::new_ata();
        start_dst(&mut t, DstKind::Short, DstMode::Offline, 0).unwrap();
        assert_eq!(t.last_timeout_seconds(), Some(INFINITE_TIMEOUT_SECONDS));
    }
}
