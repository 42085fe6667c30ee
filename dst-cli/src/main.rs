//! `dst-cli` — a thin demonstration binary for `dst-core`.
//!
//! This is **not** a production storage-repair tool. It wires an
//! in-memory [`dst_core::sim::SimulatedTransport`] to the core's
//! orchestration entry points so the workspace is a runnable, testable
//! whole; a real deployment replaces the simulated transport with a
//! `TransportOps` implementation backed by ATA pass-through, SCSI CDB
//! issue, or NVMe admin/IO submission — none of which this crate, or
//! `dst-core`, implements.

mod cli;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use dst_core::sim::SimulatedTransport;
use dst_core::{
    poll_dst, read_dst_log, read_dst_progress, repair_lba, run_dst_and_clean_with_policy,
    start_dst, DstError, DstKind, DstMode, ErrorList, RepairPolicy,
};

use crate::cli::{Cli, Command, DeviceArg, KindArg, ModeArg};
use crate::config::RepairPolicyFile;
use crate::error::CliError;
use crate::output::OutputFormat;

fn build_transport(cli: &Cli) -> SimulatedTransport {
    let mut t = match cli.device {
        DeviceArg::Ata => SimulatedTransport::new_ata(),
        DeviceArg::Scsi => SimulatedTransport::new_scsi(),
        DeviceArg::Nvme => SimulatedTransport::new_nvme(),
    };
    for &lba in &cli.inject_bad_lba {
        t.mark_bad_lba(lba);
    }
    for &lba in &cli.inject_stubborn_lba {
        t.mark_stubborn_lba(lba);
    }
    t
}

fn to_dst_kind(kind: KindArg) -> DstKind {
    match kind {
        KindArg::Short => DstKind::Short,
        KindArg::Long => DstKind::Long,
        KindArg::Conveyance => DstKind::Conveyance,
    }
}

fn to_dst_mode(mode: ModeArg) -> DstMode {
    match mode {
        ModeArg::Offline => DstMode::Offline,
        ModeArg::Captive => DstMode::Captive,
    }
}

/// Resolve a `RepairPolicy` from `--config` (if given), layered over the
/// individual `--force-passthrough`/`--no-*-realloc` flags.
fn resolve_policy(
    config: Option<&std::path::Path>,
    force_passthrough: bool,
    no_write_realloc: bool,
    no_read_realloc: bool,
) -> Result<RepairPolicy, CliError> {
    let flags = RepairPolicy {
        force_passthrough,
        auto_write_realloc: !no_write_realloc,
        auto_read_realloc: !no_read_realloc,
    };
    match config {
        Some(path) => Ok(RepairPolicyFile::load(path)?.merge_over(flags)),
        None => Ok(flags),
    }
}

#[derive(Serialize, Debug)]
struct RunDstOutput {
    kind: &'static str,
    mode: &'static str,
    result: &'static str,
}

fn run_dst(cli: &Cli, args: cli::RunDstArgs) -> Result<RunDstOutput, CliError> {
    let mut transport = build_transport(cli);
    let kind = to_dst_kind(args.kind);
    let mode = to_dst_mode(args.mode);

    start_dst(&mut transport, kind, mode, args.timeout_ms)?;

    let result = match mode {
        DstMode::Offline => match poll_dst(&mut transport, kind, false) {
            Ok(()) => "success",
            Err(DstError::Aborted { .. }) => "aborted",
            Err(DstError::Failure { .. }) => "failure",
            Err(other) => return Err(other.into()),
        },
        DstMode::Captive => {
            // Captive mode blocks the start command itself in a real
            // transport; the simulated transport models that by
            // advancing its clock synchronously inside start_dst, so the
            // result is already available from the log.
            let log = read_dst_log(&mut transport)?;
            match log.newest().map(|e| e.raw_status_nibble) {
                Some(0x0) | None => "success",
                Some(0x1) | Some(0x2) => "aborted",
                Some(_) => "failure",
            }
        }
    };

    Ok(RunDstOutput {
        kind: match kind {
            DstKind::Short => "short",
            DstKind::Long => "long",
            DstKind::Conveyance => "conveyance",
        },
        mode: match mode {
            DstMode::Offline => "offline",
            DstMode::Captive => "captive",
        },
        result,
    })
}

fn progress(cli: &Cli) -> Result<dst_core::DstProgress, CliError> {
    let mut transport = build_transport(cli);
    Ok(read_dst_progress(&mut transport)?)
}

fn log(cli: &Cli) -> Result<dst_core::DstLog, CliError> {
    let mut transport = build_transport(cli);
    Ok(read_dst_log(&mut transport)?)
}

#[derive(Serialize, Debug)]
struct RepairOutput {
    lba: u64,
    status: dst_core::RepairStatus,
}

fn repair(cli: &Cli, args: cli::RepairArgs) -> Result<RepairOutput, CliError> {
    let mut transport = build_transport(cli);
    let policy = resolve_policy(
        args.config.as_deref(),
        args.force_passthrough,
        args.no_write_realloc,
        args.no_read_realloc,
    )?;
    let status = repair_lba(&mut transport, args.lba, policy)?;
    Ok(RepairOutput { lba: args.lba, status })
}

#[derive(Serialize, Debug)]
struct CleanOutput {
    repaired: bool,
    errors: Vec<dst_core::ErrorLBA>,
    error_render: String,
}

fn clean(cli: &Cli, args: cli::CleanArgs) -> Result<CleanOutput, CliError> {
    let mut transport = build_transport(cli);
    // Only override the capability-derived default (see clean.rs) when
    // the caller actually asked for non-default repair behavior via a
    // config file or a flag; otherwise defer to run_dst_and_clean's own
    // per-device default.
    let explicit = args.config.is_some()
        || args.force_passthrough
        || args.no_write_realloc
        || args.no_read_realloc;
    let policy_override = explicit
        .then(|| {
            resolve_policy(
                args.config.as_deref(),
                args.force_passthrough,
                args.no_write_realloc,
                args.no_read_realloc,
            )
        })
        .transpose()?;

    let report = run_dst_and_clean_with_policy(
        &mut transport,
        args.error_limit,
        ErrorList::new(),
        policy_override,
    )?;
    let mut errors = report.errors.clone();
    errors.sort_and_dedup();
    Ok(CleanOutput {
        repaired: report.repaired,
        error_render: errors.render(),
        errors: errors.entries().to_vec(),
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match &cli.command {
        Command::RunDst(args) => run_dst(&cli, args.clone()).map(|o| to_json(&o)),
        Command::Progress => progress(&cli).map(|o| to_json(&o)),
        Command::Log => log(&cli).map(|o| to_json(&o)),
        Command::Repair(args) => repair(&cli, args.clone()).map(|o| to_json(&o)),
        Command::Clean(args) => clean(&cli, args.clone()).map(|o| to_json(&o)),
    };

    match outcome {
        Ok((value, human)) => {
            output::emit(cli.output, &value, &human);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let code = e.exit_code();
            output::emit_error(cli.output, exit_code_to_u8(&code), &e.to_string());
            code
        }
    }
}

fn to_json<T: Serialize + std::fmt::Debug>(value: &T) -> (serde_json::Value, String) {
    let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
    let human = format!("{value:#?}");
    (json, human)
}

fn exit_code_to_u8(code: &ExitCode) -> u8 {
    if *code == ExitCode::from(2) {
        2
    } else if *code == ExitCode::from(1) {
        1
    } else {
        0
    }
}
