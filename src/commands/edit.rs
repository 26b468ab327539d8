//! `qb edit <target>` — open a target file in the user's editor.
//!
//! A missing file is first created from [`template`] so a new target starts
//! from a commented skeleton instead of an empty buffer.

use std::{path::Path, process::Command};

use anyhow::{Context, Result};

use crate::{
    config::{self, ConfigError},
    error::QbError,
    runner, ui,
};

/// Skeleton written for a target that does not exist yet.
///
/// It deliberately leaves `uri` and `passphrase` empty so that running the
/// target before filling them in fails with a missing-field error.
pub fn template(name: &str) -> String {
    format!(
        r#"# qb target '{name}'

[repo]
uri        = ""       # e.g. "ssh://backup@nas.lan/./{name}"
passphrase = ""
# engine   = "borg"

[backup]
paths = []
# archive_prefix = "{{user}}@{{hostname}}_"
# compression    = "zstd,7"
# excludes       = ["/home/*/.cache", "*.pyc"]

[retention]
# keep_last    = 0
# keep_daily   = 7
# keep_weekly  = 4
# keep_monthly = 6
# keep_yearly  = 0

[network]
# ping_host     = "nas.lan"
# ping_interval = 5
# ping_retries  = 5

[monitoring]
# id  = "your-check-uuid"
# url = "https://hc-ping.com"
"#
    )
}

/// Editor command from `$VISUAL`, then `$EDITOR`, else `vi`.
fn editor_from(visual: Option<String>, editor: Option<String>) -> Vec<String> {
    let raw = visual
        .filter(|v| !v.trim().is_empty())
        .or_else(|| editor.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "vi".into());
    raw.split_whitespace().map(String::from).collect()
}

fn write_template(path: &Path, name: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(path, template(name)).with_context(|| format!("writing {}", path.display()))
}

pub fn run(name: Option<&str>) -> Result<i32, QbError> {
    let name = name.ok_or(ConfigError::MissingTargetName)?;
    let path = config::target_path(&config::config_dir()?, name)?;

    if !path.exists() {
        write_template(&path, name)?;
        ui::info(&format!("created {}", path.display()));
    }

    let editor = editor_from(std::env::var("VISUAL").ok(), std::env::var("EDITOR").ok());
    let (program, args) = editor
        .split_first()
        .context("editor command is empty")?;

    let status = Command::new(program)
        .args(args)
        .arg(&path)
        .status()
        .with_context(|| format!("failed to launch editor '{program}'"))?;

    Ok(runner::exit_code(status))
}
