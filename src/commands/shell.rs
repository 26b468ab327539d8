//! `qb shell <target>` — an interactive shell bound to a target's repository.
//!
//! The shell gets `BORG_REPO` and `BORG_PASSPHRASE` in its environment so
//! plain `borg list`, `borg mount` etc. work against the target by hand.

use std::process::Command;

use anyhow::{Context, Result};

use crate::{config::TargetConfig, runner, ui};

fn shell_program(shell: Option<String>) -> String {
    shell
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "/bin/sh".into())
}

pub fn run(cfg: &TargetConfig) -> Result<i32> {
    let shell = shell_program(std::env::var("SHELL").ok());
    ui::info(&format!(
        "starting {shell} for target '{}'; exit the shell to return",
        cfg.name
    ));

    let status = Command::new(&shell)
        .envs(cfg.credentials.env())
        .env("QB_TARGET", &cfg.name)
        .status()
        .with_context(|| format!("failed to launch shell '{shell}'"))?;

    Ok(runner::exit_code(status))
}
