//! `qb` — per-target borg backups driven by small TOML files.
//!
//! # Overview
//!
//! Each backup target is a file `<config dir>/<target>.toml` naming a borg
//! repository, the paths to back up, a retention policy and, optionally, a
//! host that must be reachable first and a monitoring check to ping.  `qb`
//! turns that into `borg create`, `borg prune` and `borg check` calls and
//! maps the outcome onto a small set of exit codes.
//!
//! # Usage
//!
//! ```text
//! qb edit   <target>   # create or edit the target file
//! qb run    <target>   # create + prune + check, with monitoring
//! qb create <target>   # single stages
//! qb prune  <target>
//! qb check  <target>
//! qb shell  <target>   # $SHELL with BORG_REPO / BORG_PASSPHRASE set
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | success                                          |
//! | 1    | unknown command / usage                          |
//! | 2    | `run`: at least one stage failed                 |
//! | 10   | no (valid) target name                           |
//! | 11   | target file not found                            |
//! | 12   | required field missing / invalid target file     |
//! | 20   | no paths to back up                              |
//! | 30   | `ping_host` unreachable                          |
//! | *    | borg's own status for `create`/`prune`/`check`   |
//!
//! # Module layout
//!
//! | Module                | Responsibility                                 |
//! |-----------------------|------------------------------------------------|
//! | [`cli`]               | Argument types parsed by clap                  |
//! | [`config`]            | Target files, defaults, validation             |
//! | [`network`]           | Reachability precondition with retries         |
//! | [`runner`]            | borg argument construction and execution       |
//! | [`monitor`]           | Start / success / failure pings                |
//! | [`ui`]                | Stage banners, summary, spinner                |
//! | [`commands`]          | Subcommand handlers                            |
//!
//! Logging goes to stderr through `tracing`; set `QB_LOG=debug` to see the
//! engine invocations (credentials are never logged).

mod cli;
mod commands;
mod config;
mod error;
mod monitor;
mod network;
mod runner;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Subcommand};
use commands::ops::Operation;
use error::{EXIT_USAGE, QbError};
use monitor::Reporter;
use network::Ping;
use runner::Borg;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = cli::parse_error_exit_code(&e);
            // Printing help can only fail on a closed stdout.
            let _ = e.print();
            return exit_code(code);
        },
    };

    match dispatch(&cli.command) {
        Ok(code) => exit_code(code),
        Err(e) => {
            ui::print_error(&e);
            exit_code(e.exit_code())
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(EXIT_USAGE as u8))
}

fn dispatch(command: &Subcommand) -> Result<i32, QbError> {
    let target = command.target();

    let op = match command {
        // ── qb edit ───────────────────────────────────────────────────────────
        Subcommand::Edit(_) => return commands::edit::run(target),

        // ── qb shell ──────────────────────────────────────────────────────────
        Subcommand::Shell(_) => {
            let cfg = config::load(target)?;
            return Ok(commands::shell::run(&cfg)?);
        },

        // ── qb run ────────────────────────────────────────────────────────────
        Subcommand::Run(_) => {
            let cfg = config::load(target)?;
            let result = commands::run::run(
                &cfg,
                &Borg::for_target(&cfg),
                &Ping,
                &Reporter::new(&cfg.monitoring),
            )?;
            return Ok(result.exit_code());
        },

        // ── qb create | prune | check ─────────────────────────────────────────
        Subcommand::Create(_) => Operation::Create,
        Subcommand::Prune(_) => Operation::Prune,
        Subcommand::Check(_) => Operation::Check,
    };

    let cfg = config::load(target)?;
    commands::ops::run_single(op, &cfg, &Borg::for_target(&cfg), &Ping)
}
