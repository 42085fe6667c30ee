//! Scenario 5 — SCSI reassign with additional LBA discovery.
//!
//! Initial reassign list `{9000..=9007}` (physical block spans 8 logical
//! blocks). The drive's first response refuses everything before 9002
//! (command-specific information) and additionally discovers 9004
//! (information field) as bad. The engine drops the refused prefix,
//! inserts the discovered LBA in sorted order, and reissues; the second
//! response succeeds. The whole repair takes exactly two reassign
//! rounds.

use dst_core::repair::repair_lba;
use dst_core::sim::{ReassignScript, SimulatedTransport};
use dst_core::transport::sense_key;
use dst_core::{RepairPolicy, RepairStatus};

#[test]
fn reassign_adjusts_list_from_sense_data_and_succeeds_on_round_two() {
    let mut t = SimulatedTransport::new_scsi();
    t.view_mut().physical_block_size = 512 * 8;
    for lba in 9000..9008 {
        t.mark_stubborn_lba(lba);
    }
    t.queue_reassign_response(ReassignScript {
        ok: false,
        sense_key: sense_key::MEDIUM_ERROR,
        first_refused_lba: Some(9002),
        discovered_lba: Some(9004),
    });

    let status = repair_lba(&mut t, 9000, RepairPolicy::default()).unwrap();

    assert_eq!(status, RepairStatus::Repaired);
    assert_eq!(t.reassign_call_count(), 2);
    for lba in 9002..=9007 {
        assert!(!t.is_bad(lba), "LBA {lba} should have been reassigned");
    }
}
