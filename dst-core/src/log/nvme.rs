//! NVMe device self-test log (LID 0x06) parsing.

use crate::konst::{nvme, NO_LBA};
use crate::progress::DstStatus;
use crate::transport::DeviceKind;

use super::{DstDescriptor, DstLog, LogType, TransportDescriptor};

const NSID_VALID: u8 = 1 << 0;
const LBA_VALID: u8 = 1 << 1;
const SCT_VALID: u8 = 1 << 2;
const SC_VALID: u8 = 1 << 3;

/// Parse the 564-byte device self-test log: 28-byte descriptors at
/// offsets 4, 32, 60, …, up to 20 of them. A status low-nibble of
/// `0x0F` means the slot has never been written and is skipped.
pub fn parse_log(raw: &[u8]) -> DstLog {
    let mut entries = Vec::new();
    for i in 0..nvme::DST_MAX_ENTRIES {
        let off = nvme::DST_FIRST_DESCRIPTOR_OFFSET + i * nvme::DST_DESCRIPTOR_LEN;
        if off + nvme::DST_DESCRIPTOR_LEN > raw.len() {
            break;
        }
        let desc = &raw[off..off + nvme::DST_DESCRIPTOR_LEN];
        let raw_status_nibble = desc[0] & 0x0F;
        if raw_status_nibble == nvme::DST_STATUS_NOT_USED {
            continue;
        }
        entries.push(decode_descriptor(desc, raw_status_nibble));
    }
    DstLog { log_type: LogType::Nvme, entries }
}

fn decode_descriptor(desc: &[u8], raw_status_nibble: u8) -> DstDescriptor {
    let kind_field = desc[0] >> 4;
    let valid_bits = desc[2];
    let timestamp = u64::from_le_bytes(desc[4..12].try_into().unwrap());

    let namespace_id = (valid_bits & NSID_VALID != 0)
        .then(|| u32::from_le_bytes(desc[12..16].try_into().unwrap()));

    let status = DstStatus::from_nibble(DeviceKind::Nvme, raw_status_nibble);
    let lba = (valid_bits & LBA_VALID != 0)
        .then(|| u64::from_le_bytes(desc[16..24].try_into().unwrap()))
        .filter(|&l| l != u64::MAX);
    let lba_of_failure = if status.carries_lba() {
        lba.unwrap_or(NO_LBA)
    } else {
        NO_LBA
    };

    let sct = (valid_bits & SCT_VALID != 0).then(|| desc[24]);
    let sc = (valid_bits & SC_VALID != 0).then(|| desc[25]);
    let vs = u16::from_le_bytes([desc[26], desc[27]]);

    DstDescriptor {
        valid: true,
        kind_field,
        status,
        raw_status_nibble,
        timestamp,
        checkpoint_or_segment: desc[1],
        lba_of_failure,
        namespace_id,
        transport_specific: TransportDescriptor::Nvme { sct, sc, vs },
    }
}
