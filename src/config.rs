//! Target configuration types and loading logic.
//!
//! Every backup target lives in its own TOML file, `<config dir>/<name>.toml`.
//! The file is parsed into a fixed schema (nothing in it is ever executed),
//! then [`PartialTarget::resolve`] validates the required repository fields
//! and fills every optional field with its default.  No operation ever sees
//! an unset optional value.
//!
//! # File format
//!
//! ```toml
//! [repo]
//! uri        = "ssh://backup@nas.lan/./laptop"
//! passphrase = "correct horse battery staple"
//! engine     = "borg"               # optional
//!
//! [backup]
//! paths          = ["/home/alice", "/etc"]
//! archive_prefix = "{user}@{hostname}_"
//! compression    = "zstd,7"
//! excludes       = ["/home/alice/.cache", "*.pyc"]
//!
//! [retention]
//! keep_last    = 0
//! keep_daily   = 7
//! keep_weekly  = 4
//! keep_monthly = 6
//! keep_yearly  = 0
//!
//! [network]
//! ping_host     = "nas.lan"
//! ping_interval = 5                 # seconds between attempts
//! ping_retries  = 5
//!
//! [monitoring]
//! id  = "5f0c1c1a-…"
//! url = "https://hc-ping.com"
//! ```
//!
//! # Config directory
//!
//! Resolved by [`config_dir`]: `$QB_CONFIG_DIR` if set, `/etc/qb` when
//! running as root, otherwise `$XDG_CONFIG_HOME/qb` or `~/.config/qb`.

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

/// Exit code for a missing or malformed target name.
pub const EXIT_NO_TARGET: i32 = 10;
/// Exit code for a target whose file does not exist.
pub const EXIT_TARGET_NOT_FOUND: i32 = 11;
/// Exit code for any problem with the contents of a target file.
pub const EXIT_INVALID_CONFIG: i32 = 12;

const SYSTEM_CONFIG_DIR: &str = "/etc/qb";
const APP_DIR: &str = "qb";

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Everything that can go wrong between a target name and a usable
/// [`TargetConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no target specified\nUsage: qb <command> <target>")]
    MissingTargetName,

    #[error(
        "invalid target name '{0}': it must not be empty, start with '.', or contain path separators"
    )]
    InvalidTargetName(String),

    #[error("target '{name}' not found at {}\nRun 'qb edit {name}' to create it.", .path.display())]
    TargetFileNotFound { name: String, path: PathBuf },

    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Only the position and message of the TOML error are kept: its full
    // rendering quotes the offending line, which may hold the passphrase.
    #[error("parsing {}{}: {message}", .path.display(), describe_position(.position))]
    Parse {
        path: PathBuf,
        position: Option<(usize, usize)>,
        message: String,
    },

    #[error("required field '{0}' is missing")]
    MissingRequiredField(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },

    #[error("cannot determine the config directory; set QB_CONFIG_DIR or XDG_CONFIG_HOME")]
    NoConfigDir,
}

fn describe_position(position: &Option<(usize, usize)>) -> String {
    position.map_or_else(String::new, |(line, column)| {
        format!(" at line {line}, column {column}")
    })
}

/// 1-based line and column of byte `offset` in `text`.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

impl ConfigError {
    fn parse(path: &Path, text: &str, err: &toml::de::Error) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            position: err.span().map(|span| line_column(text, span.start)),
            message: err.message().trim().replace('\n', "; "),
        }
    }

    /// Process exit code reported for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingTargetName | Self::InvalidTargetName(_) => EXIT_NO_TARGET,
            Self::TargetFileNotFound { .. } | Self::NoConfigDir => EXIT_TARGET_NOT_FOUND,
            Self::Read { .. }
            | Self::Parse { .. }
            | Self::MissingRequiredField(_)
            | Self::InvalidValue { .. } => EXIT_INVALID_CONFIG,
        }
    }
}

// ─── Resolved configuration ───────────────────────────────────────────────────

/// Repository locator and passphrase handed to the engine.
///
/// These only ever reach the engine through the environment of the child
/// process (see [`Credentials::env`]).  `Debug` redacts the passphrase.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub repo: String,
    pub passphrase: String,
}

impl Credentials {
    /// Environment overlay for an engine subprocess.
    pub fn env(&self) -> [(&'static str, &str); 2] {
        [
            ("BORG_REPO", self.repo.as_str()),
            ("BORG_PASSPHRASE", self.passphrase.as_str()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("repo", &self.repo)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// A fully-resolved backup target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Target name; also the file stem of its config file.
    pub name: String,
    pub credentials: Credentials,
    /// Program invoked as the backup engine.
    pub engine: String,
    pub backup: BackupConfig,
    pub retention: RetentionConfig,
    pub network: NetworkConfig,
    pub monitoring: MonitoringConfig,
}

/// What to back up and how archives are labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    /// Paths to include, in order.  Empty is fatal for `create`.
    pub paths: Vec<String>,
    /// Label prefix scoping this target's archives inside a shared repository.
    pub archive_prefix: String,
    /// Passed verbatim to `--compression`.
    pub compression: String,
    /// Exclusion patterns, deduplicated, first occurrence wins.
    pub excludes: Vec<String>,
}

/// Keep-counts passed to `prune`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    pub last: u32,
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
}

/// Reachability precondition.  `ping_host = None` disables it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub ping_host: Option<String>,
    /// Seconds to wait between failed probes.
    pub ping_interval: u64,
    /// Total number of probes before giving up.
    pub ping_retries: u32,
}

/// Monitoring endpoint.  `id = None` disables reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    pub id: Option<String>,
    pub url: String,
}

// ─── On-disk schema ───────────────────────────────────────────────────────────

// Every field is optional here so that a missing required value can be
// reported by name instead of as an opaque serde error.

/// Raw contents of a target file before defaults and validation.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialTarget {
    #[serde(default)]
    pub repo: PartialRepo,
    #[serde(default)]
    pub backup: PartialBackup,
    #[serde(default)]
    pub retention: PartialRetention,
    #[serde(default)]
    pub network: PartialNetwork,
    #[serde(default)]
    pub monitoring: PartialMonitoring,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialRepo {
    pub uri: Option<String>,
    pub passphrase: Option<String>,
    pub engine: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialBackup {
    pub paths: Option<Vec<String>>,
    pub archive_prefix: Option<String>,
    pub compression: Option<String>,
    pub excludes: Option<Vec<String>>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialRetention {
    pub keep_last: Option<u32>,
    pub keep_daily: Option<u32>,
    pub keep_weekly: Option<u32>,
    pub keep_monthly: Option<u32>,
    pub keep_yearly: Option<u32>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialNetwork {
    pub ping_host: Option<String>,
    pub ping_interval: Option<u64>,
    pub ping_retries: Option<u32>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialMonitoring {
    pub id: Option<String>,
    pub url: Option<String>,
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_ENGINE: &str = "borg";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "{user}@{hostname}_";
pub const DEFAULT_COMPRESSION: &str = "zstd,7";
pub const DEFAULT_MONITORING_URL: &str = "https://hc-ping.com";
pub const DEFAULT_PING_INTERVAL: u64 = 5;
pub const DEFAULT_PING_RETRIES: u32 = 5;

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            last: 0,
            daily: 7,
            weekly: 4,
            monthly: 6,
            yearly: 0,
        }
    }
}

/// Treats `""` the same as an absent key.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl PartialTarget {
    /// Validate required fields and apply defaults.
    pub fn resolve(self, name: &str) -> Result<TargetConfig, ConfigError> {
        let repo = non_empty(self.repo.uri).ok_or(ConfigError::MissingRequiredField("repo.uri"))?;
        let passphrase = non_empty(self.repo.passphrase)
            .ok_or(ConfigError::MissingRequiredField("repo.passphrase"))?;

        let ping_interval = self.network.ping_interval.unwrap_or(DEFAULT_PING_INTERVAL);
        if ping_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.ping_interval",
                reason: "must be a positive number of seconds",
            });
        }
        let ping_retries = self.network.ping_retries.unwrap_or(DEFAULT_PING_RETRIES);
        if ping_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.ping_retries",
                reason: "must be at least 1",
            });
        }

        let archive_prefix = self
            .backup
            .archive_prefix
            .unwrap_or_else(|| DEFAULT_ARCHIVE_PREFIX.into());
        if archive_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "backup.archive_prefix",
                reason: "must not be empty, it keeps prune and check away from other targets",
            });
        }

        let keep = RetentionConfig::default();
        Ok(TargetConfig {
            name: name.to_string(),
            credentials: Credentials { repo, passphrase },
            engine: non_empty(self.repo.engine).unwrap_or_else(|| DEFAULT_ENGINE.into()),
            backup: BackupConfig {
                paths: self.backup.paths.unwrap_or_default(),
                archive_prefix,
                compression: non_empty(self.backup.compression)
                    .unwrap_or_else(|| DEFAULT_COMPRESSION.into()),
                excludes: dedup_in_order(self.backup.excludes.unwrap_or_default()),
            },
            retention: RetentionConfig {
                last: self.retention.keep_last.unwrap_or(keep.last),
                daily: self.retention.keep_daily.unwrap_or(keep.daily),
                weekly: self.retention.keep_weekly.unwrap_or(keep.weekly),
                monthly: self.retention.keep_monthly.unwrap_or(keep.monthly),
                yearly: self.retention.keep_yearly.unwrap_or(keep.yearly),
            },
            network: NetworkConfig {
                ping_host: non_empty(self.network.ping_host),
                ping_interval,
                ping_retries,
            },
            monitoring: MonitoringConfig {
                id: non_empty(self.monitoring.id),
                url: non_empty(self.monitoring.url)
                    .unwrap_or_else(|| DEFAULT_MONITORING_URL.into()),
            },
        })
    }
}

// ─── Directory resolution ─────────────────────────────────────────────────────

/// Whether the process runs with an effective UID of 0.
#[cfg(unix)]
pub fn is_privileged() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_privileged() -> bool {
    false
}

/// Directory holding the target files for this process.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    resolve_config_dir(
        std::env::var_os("QB_CONFIG_DIR"),
        is_privileged(),
        std::env::var_os("XDG_CONFIG_HOME"),
        dirs::home_dir(),
    )
}

/// Pure form of [`config_dir`] so the precedence can be tested.
pub fn resolve_config_dir(
    override_dir: Option<OsString>,
    privileged: bool,
    xdg_config_home: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if privileged {
        return Ok(PathBuf::from(SYSTEM_CONFIG_DIR));
    }
    if let Some(xdg) = xdg_config_home.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }
    home.map(|h| h.join(".config").join(APP_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

/// Reject names that could escape the config directory.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(ConfigError::InvalidTargetName(name.to_string()));
    }
    Ok(())
}

/// Path of the file backing target `name` inside `dir`.
pub fn target_path(dir: &Path, name: &str) -> Result<PathBuf, ConfigError> {
    validate_name(name)?;
    Ok(dir.join(format!("{name}.toml")))
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Resolve `name` against the process config directory and load it.
pub fn load(name: Option<&str>) -> Result<TargetConfig, ConfigError> {
    let name = name.ok_or(ConfigError::MissingTargetName)?;
    validate_name(name)?;
    load_from(&config_dir()?, name)
}

/// Load target `name` from `dir`.
pub fn load_from(dir: &Path, name: &str) -> Result<TargetConfig, ConfigError> {
    let path = target_path(dir, name)?;
    if !path.is_file() {
        return Err(ConfigError::TargetFileNotFound {
            name: name.to_string(),
            path,
        });
    }

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let partial: PartialTarget =
        toml::from_str(&text).map_err(|e| ConfigError::parse(&path, &text, &e))?;

    let cfg = partial.resolve(name)?;
    tracing::debug!(target_name = %cfg.name, path = %path.display(), "loaded target");
    Ok(cfg)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
