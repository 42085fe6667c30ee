//! SCSI self-test results log page (0x10) parsing.

use crate::konst::{scsi, NO_LBA};
use crate::progress::DstStatus;
use crate::transport::DeviceKind;

use super::{DstDescriptor, DstLog, LogType, TransportDescriptor};

/// Parse log page 0x10: descriptors are 20 bytes at offsets 4, 24,
/// 44, … up to the page length recorded at bytes 2-3.
pub fn parse_log(raw: &[u8]) -> DstLog {
    let mut entries = Vec::new();
    if raw.len() < 4 {
        return DstLog { log_type: LogType::Scsi, entries };
    }
    let page_length = u16::from_be_bytes([raw[2], raw[3]]) as usize;
    let end = (scsi::SELFTEST_FIRST_DESCRIPTOR_OFFSET + page_length).min(raw.len());

    let mut offset = scsi::SELFTEST_FIRST_DESCRIPTOR_OFFSET;
    while offset + scsi::SELFTEST_DESCRIPTOR_LEN <= end
        && entries.len() < scsi::SELFTEST_MAX_ENTRIES
    {
        let desc = &raw[offset..offset + scsi::SELFTEST_DESCRIPTOR_LEN];
        if desc.iter().any(|&b| b != 0) {
            entries.push(decode_descriptor(desc));
        }
        offset += scsi::SELFTEST_DESCRIPTOR_LEN;
    }

    DstLog { log_type: LogType::Scsi, entries }
}

fn decode_descriptor(desc: &[u8]) -> DstDescriptor {
    let kind_field = desc[4] >> 4;
    let raw_status_nibble = desc[4] & 0x0F;
    let timestamp = u16::from_be_bytes([desc[6], desc[7]]) as u64;
    let lba = u64::from_be_bytes(desc[8..16].try_into().unwrap());
    let sense_key = desc[16] & 0x0F;
    let asc = desc[17];
    let ascq = desc[18];

    let status = DstStatus::from_nibble(DeviceKind::Scsi, raw_status_nibble);
    let lba_of_failure = if status.carries_lba() && lba != u64::MAX {
        lba
    } else {
        NO_LBA
    };

    DstDescriptor {
        valid: true,
        kind_field,
        status,
        raw_status_nibble,
        timestamp,
        checkpoint_or_segment: desc[5],
        lba_of_failure,
        namespace_id: None,
        transport_specific: TransportDescriptor::Scsi {
            sense_key,
            asc,
            ascq,
            vs: desc[19],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_entry_page(status_nibble: u8, lba: u64, sense_key: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 4 + 20];
        buf[2..4].copy_from_slice(&20u16.to_be_bytes());
        buf[4] = status_nibble;
        buf[8..16].copy_from_slice(&lba.to_be_bytes());
        buf[16] = sense_key;
        buf
    }

    #[test]
    fn read_failure_preserves_lba_and_sense_key() {
        let raw = single_entry_page(0x7, 12_345_678, 0x3);
        let log = parse_log(&raw);
        let newest = log.newest().unwrap();
        assert_eq!(newest.lba_of_failure, 12_345_678);
        match newest.transport_specific {
            TransportDescriptor::Scsi { sense_key, .. } => assert_eq!(sense_key, 0x3),
            _ => panic!("expected Scsi variant"),
        }
    }

    #[test]
    fn completed_entry_hides_lba() {
        let raw = single_entry_page(0x0, 42, 0x0);
        let log = parse_log(&raw);
        assert_eq!(log.newest().unwrap().lba_of_failure, NO_LBA);
    }

    #[test]
    fn page_length_bounds_how_many_descriptors_are_read() {
        let mut buf = vec![0u8; 4 + 40];
        buf[2..4].copy_from_slice(&20u16.to_be_bytes()); // only one descriptor's worth
        buf[4] = 0x7;
        buf[8..16].copy_from_slice(&1u64.to_be_bytes());
        buf[24] = 0x3; // second descriptor, outside the declared page length
        let log = parse_log(&buf);
        assert_eq!(log.entries.len(), 1);
    }
}
