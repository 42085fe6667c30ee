//! The growing list of LBAs a DST-and-Clean run has flagged (component
//! C8). Kept sorted and deduplicated so repeated runs over the same
//! drive don't re-report the same sector; rendered as a human-readable
//! table for CLI consumers.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::repair::RepairStatus;

/// One LBA this run flagged, with its most recent repair outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLBA {
    pub address: u64,
    pub status: RepairStatus,
}

/// Ordered collection of [`ErrorLBA`]. Lifecycle: created by
/// `clean::run_dst_and_clean` (or supplied by the caller), mutated as
/// each repair completes, sorted/deduplicated on demand, and dropped
/// when the caller is done with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorList {
    entries: Vec<ErrorLBA>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: u64, status: RepairStatus) {
        self.entries.push(ErrorLBA { address, status });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ErrorLBA] {
        &self.entries
    }

    /// Linear two-pointer scan from both ends, per the design's
    /// description of `contains`.
    pub fn contains(&self, lba: u64) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let (mut lo, mut hi) = (0usize, self.entries.len() - 1);
        loop {
            if self.entries[lo].address == lba || self.entries[hi].address == lba {
                return true;
            }
            if lo == hi {
                return false;
            }
            lo += 1;
            if lo > hi {
                return false;
            }
            hi -= 1;
        }
    }

    pub fn find(&self, lba: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.address == lba)
    }

    /// Update the status of an existing entry for `lba`, or append a new
    /// one if it isn't already present.
    pub fn set_status(&mut self, lba: u64, status: RepairStatus) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.address == lba) {
            entry.status = status;
        } else {
            self.push(lba, status);
        }
    }

    /// Sort by address ascending and drop duplicates. A single linear
    /// pass after sorting is the simpler equivalent the design calls out
    /// to the source's rewrite-to-sentinel-then-resort `safe_qsort`
    /// dedup pass; the externally observable ordering is the same.
    /// Idempotent: a second call on an already-deduplicated list is a
    /// no-op.
    pub fn sort_and_dedup(&mut self) {
        self.entries.sort_by_key(|e| e.address);
        let mut write = 0;
        for read in 0..self.entries.len() {
            if write == 0 || self.entries[write - 1].address != self.entries[read].address {
                self.entries[write] = self.entries[read];
                write += 1;
            }
        }
        self.entries.truncate(write);
    }

    /// Tabular human-readable listing, with a footnote when any entry
    /// was denied by the OS.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:>14}  {:<20}", "LBA", "Status");
        let mut any_denied = false;
        for entry in &self.entries {
            if entry.status == RepairStatus::AccessDenied {
                any_denied = true;
            }
            let _ = writeln!(out, "{:>14}  {:?}", entry.address, entry.status);
        }
        if any_denied {
            let _ = writeln!(
                out,
                "* one or more repairs were denied by the OS; retry with elevated access"
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_and_dedup_orders_and_drops_repeats() {
        let mut list = ErrorList::new();
        for lba in [100, 5, 100, 42, 5] {
            list.push(lba, RepairStatus::Repaired);
        }
        list.sort_and_dedup();
        let addresses: Vec<u64> = list.entries().iter().map(|e| e.address).collect();
        assert_eq!(addresses, vec![5, 42, 100]);
    }

    #[test]
    fn sort_and_dedup_is_idempotent() {
        let mut list = ErrorList::new();
        for lba in [9, 1, 9, 3] {
            list.push(lba, RepairStatus::NotRepaired);
        }
        list.sort_and_dedup();
        let first: Vec<ErrorLBA> = list.entries().to_vec();
        list.sort_and_dedup();
        assert_eq!(list.entries(), first.as_slice());
    }

    #[test]
    fn contains_and_find_locate_entries() {
        let mut list = ErrorList::new();
        list.push(10, RepairStatus::Repaired);
        list.push(20, RepairStatus::NotRepaired);
        list.push(30, RepairStatus::AccessDenied);
        list.sort_and_dedup();
        assert!(list.contains(20));
        assert_eq!(list.find(20), Some(1));
        assert!(!list.contains(25));
        assert_eq!(list.find(25), None);
    }

    #[test]
    fn set_status_updates_existing_entry_in_place() {
        let mut list = ErrorList::new();
        list.push(5, RepairStatus::NotRepaired);
        list.set_status(5, RepairStatus::Repaired);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.find(5).map(|i| list.entries()[i].status),
            Some(RepairStatus::Repaired)
        );
    }

    #[test]
    fn render_includes_footnote_only_when_access_denied_present() {
        let mut clean = ErrorList::new();
        clean.push(1, RepairStatus::Repaired);
        assert!(!clean.render().contains("denied"));

        let mut denied = ErrorList::new();
        denied.push(2, RepairStatus::AccessDenied);
        assert!(denied.render().contains("denied"));
    }
}
