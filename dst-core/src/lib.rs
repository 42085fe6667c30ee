//! Device Self-Test (DST) orchestration and bad-sector remediation
//! across ATA, SCSI, and NVMe.
//!
//! This crate is the transport-agnostic *core* of a storage diagnostic
//! utility: it issues vendor-standardized self-tests, polls them with
//! adaptive back-off and a watchdog, parses the transport-specific
//! self-test result log into one canonical record, and repairs a
//! reported bad LBA using read-reallocation, write-reallocation, or an
//! explicit SCSI `REASSIGN BLOCKS`. The [`clean`] module composes all of
//! this into a single "run DST, find the bad sector, fix it, verify the
//! neighborhood" loop.
//!
//! The raw transport command layer — ATA pass-through, SCSI CDB issue,
//! NVMe admin/IO submission — is out of scope. This crate consumes it
//! through the [`transport::TransportOps`] trait; a real consumer
//! supplies its own implementation. The `sim` feature (on by default)
//! ships [`sim::SimulatedTransport`], an in-memory double used by this
//! crate's own tests and by the `dst-cli` demonstration binary. It is
//! not part of the external contract.
//!
//! # Module map
//!
//! | Module | Component | Responsibility |
//! |--------|-----------|----------------|
//! | [`transport`] | C1 | `TransportOps` trait, `DeviceView`, dispatch boundary |
//! | [`progress`]  | C2 | Progress decoders, `DstStatus`/`DstKind`/`DstMode` |
//! | [`starter`]   | C3 | Issuing the self-test start command |
//! | [`poll`]      | C4 | Adaptive back-off, watchdog, terminal classification |
//! | [`log`]       | C5 | ATA/SCSI/NVMe self-test log parsing |
//! | [`repair`]    | C6 | Per-LBA repair state machine |
//! | [`clean`]     | C7 | The DST-and-Clean orchestration loop |
//! | [`error_list`]| C8 | The `ErrorList`/`ErrorLBA` collection |
//! | [`error`]     | — | The shared `DstError` taxonomy |
//! | [`konst`]     | — | Named wire constants from the external contract |

#![forbid(unsafe_code)]

pub mod clean;
pub mod error;
pub mod error_list;
pub mod konst;
pub mod log;
pub mod poll;
pub mod progress;
pub mod repair;
#[cfg(feature = "sim")]
pub mod sim;
pub mod starter;
pub mod transport;

pub use clean::{
    run_dst_and_clean, run_dst_and_clean_with, run_dst_and_clean_with_policy, CleanReport,
};
pub use error::{classify_io, DstError};
pub use error_list::{ErrorLBA, ErrorList};
pub use log::{read_dst_log, DstDescriptor, DstLog, LogType, TransportDescriptor};
pub use poll::poll_dst;
pub use progress::{read_dst_progress, DstKind, DstMode, DstProgress, DstStatus};
pub use repair::{repair_lba, RepairPolicy, RepairStatus};
pub use starter::{abort_dst, start_dst};
pub use transport::{DeviceGuard, DeviceKind, DeviceView, TransportOps};
