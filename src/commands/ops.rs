//! The three engine stages, `qb create`, `qb prune` and `qb check`.
//!
//! Each stage prints a start banner, runs the engine, prints the numeric
//! result and hands it back.  Stages never exit the process; the caller
//! decides what a status means.

use thiserror::Error;

use crate::{
    config::TargetConfig,
    error::QbError,
    network::{self, Reachability},
    runner::{Engine, Invocation, build_check_args, build_create_args, build_prune_args},
    ui,
};

pub const EXIT_NO_PATHS: i32 = 20;

/// `create` was asked to back up nothing.
#[derive(Debug, Error)]
#[error("no paths specified for target '{0}'; add [backup].paths to its config")]
pub struct NoPathsSpecified(pub String);

impl NoPathsSpecified {
    pub const fn exit_code(&self) -> i32 {
        EXIT_NO_PATHS
    }
}

/// Selects one stage for the single-stage subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Prune,
    Check,
}

fn execute(cfg: &TargetConfig, engine: &impl Engine, invocation: &Invocation) -> i32 {
    ui::stage_started(invocation.label);
    let code = engine.execute(&cfg.credentials, invocation);
    ui::stage_finished(invocation.label, code);
    code
}

/// Snapshot `[backup].paths` into a new archive.
///
/// Fails without touching the engine when there is nothing to back up.
pub fn create(cfg: &TargetConfig, engine: &impl Engine) -> Result<i32, NoPathsSpecified> {
    if cfg.backup.paths.is_empty() {
        return Err(NoPathsSpecified(cfg.name.clone()));
    }
    let invocation = Invocation {
        label: "Create",
        args: build_create_args(cfg),
    };
    Ok(execute(cfg, engine, &invocation))
}

/// Apply the retention policy to this target's archives.
pub fn prune(cfg: &TargetConfig, engine: &impl Engine) -> i32 {
    let invocation = Invocation {
        label: "Prune",
        args: build_prune_args(cfg),
    };
    execute(cfg, engine, &invocation)
}

/// Verify this target's archives.
pub fn check(cfg: &TargetConfig, engine: &impl Engine) -> i32 {
    let invocation = Invocation {
        label: "Check",
        args: build_check_args(cfg),
    };
    execute(cfg, engine, &invocation)
}

/// Entry point for `qb create|prune|check <target>`.
///
/// Returns the engine's own exit status.
pub fn run_single(
    op: Operation,
    cfg: &TargetConfig,
    engine: &impl Engine,
    net: &impl Reachability,
) -> Result<i32, QbError> {
    println!();
    network::ensure_online(&cfg.network, net)?;
    let code = match op {
        Operation::Create => create(cfg, engine)?,
        Operation::Prune => prune(cfg, engine),
        Operation::Check => check(cfg, engine),
    };
    Ok(code)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
