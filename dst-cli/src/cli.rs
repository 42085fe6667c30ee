//! Command-line surface for the `dst-core` demonstration binary.
//!
//! Every subcommand operates against a freshly constructed
//! [`dst_core::sim::SimulatedTransport`] — there is no real pass-through
//! backend wired in here, by design (see the crate-level docs in
//! `main.rs`). The `--inject-*` flags exist only to seed that simulated
//! device into an interesting starting state for a demo run.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Demonstration CLI for `dst-core`'s Device Self-Test orchestration and
/// sector-repair engine, running against an in-memory simulated device.
#[derive(Parser, Debug)]
#[command(name = "dst-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Which simulated transport to stand up for this invocation.
    #[arg(long, value_enum, global = true, default_value = "ata")]
    pub device: DeviceArg,

    /// Output format for all subcommands.
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Seed the simulated device with an LBA that fails reads until an
    /// implicit write-reallocation (or explicit reassign) clears it. May
    /// be repeated.
    #[arg(long = "inject-bad-lba", global = true)]
    pub inject_bad_lba: Vec<u64>,

    /// Seed the simulated device with an LBA that additionally resists
    /// write-reallocation, so only an explicit SCSI reassign (or
    /// nothing, on ATA/NVMe) clears it. May be repeated.
    #[arg(long = "inject-stubborn-lba", global = true)]
    pub inject_stubborn_lba: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Ata,
    Scsi,
    Nvme,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Short,
    Long,
    Conveyance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Offline,
    Captive,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a self-test and, for offline mode, poll it to completion.
    RunDst(RunDstArgs),

    /// Read the current `(percent_complete, status)` progress pair.
    Progress,

    /// Read and render the transport's self-test result log.
    Log,

    /// Attempt to repair a single bad LBA.
    Repair(RepairArgs),

    /// Run the full DST-and-Clean loop: repeat self-test, repair,
    /// neighborhood-verify until the test passes or the error budget is
    /// exhausted.
    Clean(CleanArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunDstArgs {
    #[arg(long, value_enum, default_value = "short")]
    pub kind: KindArg,

    #[arg(long, value_enum, default_value = "offline")]
    pub mode: ModeArg,

    /// Command timeout in milliseconds; 0 means "no particular bound".
    #[arg(long, default_value_t = 0)]
    pub timeout_ms: u32,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RepairArgs {
    /// The logical block address to repair.
    #[arg(long)]
    pub lba: u64,

    /// Load repair knobs from a TOML file instead of the flags below.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip straight to the pass-through zero-write branch.
    #[arg(long)]
    pub force_passthrough: bool,

    /// Disable the write-reallocation attempt.
    #[arg(long)]
    pub no_write_realloc: bool,

    /// Disable the read-reallocation attempt.
    #[arg(long)]
    pub no_read_realloc: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CleanArgs {
    /// Maximum number of distinct bad LBAs to record before giving up.
    #[arg(long, default_value_t = 8)]
    pub error_limit: usize,

    /// Load repair knobs from a TOML file instead of the flags below.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub force_passthrough: bool,

    #[arg(long)]
    pub no_write_realloc: bool,

    #[arg(long)]
    pub no_read_realloc: bool,
}
