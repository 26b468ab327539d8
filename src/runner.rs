//! Engine invocation: argument construction and subprocess execution.
//!
//! The `build_*_args` functions are pure and only turn a [`TargetConfig`]
//! into the argument vector for one borg subcommand.  Execution sits behind
//! the [`Engine`] trait so the orchestration in [`crate::commands`] can be
//! driven by a fake in tests.
//!
//! # Credentials
//!
//! The repository locator and passphrase are never put on the command line.
//! [`Borg`] passes them as `BORG_REPO` / `BORG_PASSPHRASE` in the environment
//! of the child process only; the `qb` process environment is left alone.
//!
//! # Archive scoping
//!
//! Several targets may share one repository.  `prune` and `check` are always
//! restricted with `--glob-archives '<archive_prefix>*'` so they can never
//! touch another target's archives.

use std::process::{Command, ExitStatus};

use crate::config::{Credentials, TargetConfig};

/// Status reported when the engine program cannot be spawned at all, matching
/// the shell's "command not found".
pub const EXIT_SPAWN_FAILED: i32 = 127;

// ─── Invocation ───────────────────────────────────────────────────────────────

/// One engine call: a stage label plus the arguments after the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub label: &'static str,
    pub args: Vec<String>,
}

/// Anything that can run an [`Invocation`] and report an exit status.
pub trait Engine {
    fn execute(&self, credentials: &Credentials, invocation: &Invocation) -> i32;
}

// ─── borg ─────────────────────────────────────────────────────────────────────

/// Runs invocations against the real engine binary with inherited stdio, so
/// borg's own progress output reaches the terminal.
#[derive(Debug, Clone)]
pub struct Borg {
    program: String,
}

impl Borg {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The engine configured for `cfg`.
    pub fn for_target(cfg: &TargetConfig) -> Self {
        Self::new(cfg.engine.clone())
    }
}

impl Engine for Borg {
    fn execute(&self, credentials: &Credentials, invocation: &Invocation) -> i32 {
        tracing::debug!(
            program = %self.program,
            args = ?invocation.args,
            "spawning engine"
        );

        match Command::new(&self.program)
            .args(&invocation.args)
            .envs(credentials.env())
            .status()
        {
            Ok(status) => exit_code(status),
            Err(e) => {
                tracing::error!(program = %self.program, error = %e, "failed to spawn engine");
                EXIT_SPAWN_FAILED
            },
        }
    }
}

/// Numeric exit status of a finished child, `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

// ─── Argument builders ────────────────────────────────────────────────────────

/// Glob matching every archive that belongs to `cfg`.
pub fn archive_glob(cfg: &TargetConfig) -> String {
    format!("{}*", cfg.backup.archive_prefix)
}

/// Arguments for `borg create …`.
///
/// The archive name is `::<archive_prefix>{now}`; borg expands `{now}`,
/// `{user}` and `{hostname}` itself.
pub fn build_create_args(cfg: &TargetConfig) -> Vec<String> {
    let b = &cfg.backup;
    let mut args: Vec<String> = vec![
        "create".into(),
        "--verbose".into(),
        "--filter".into(),
        "AME".into(),
        "--list".into(),
        "--stats".into(),
        "--show-rc".into(),
        "--progress".into(),
        "--compression".into(),
        b.compression.clone(),
        "--exclude-caches".into(),
    ];
    for pattern in &b.excludes {
        args.push("--exclude".into());
        args.push(pattern.clone());
    }
    args.push(format!("::{}{{now}}", b.archive_prefix));
    args.extend(b.paths.iter().cloned());
    args
}

/// Arguments for `borg prune …`, scoped to this target's archives.
pub fn build_prune_args(cfg: &TargetConfig) -> Vec<String> {
    let r = &cfg.retention;
    vec![
        "prune".into(),
        "--list".into(),
        "--show-rc".into(),
        "--glob-archives".into(),
        archive_glob(cfg),
        "--keep-last".into(),
        r.last.to_string(),
        "--keep-daily".into(),
        r.daily.to_string(),
        "--keep-weekly".into(),
        r.weekly.to_string(),
        "--keep-monthly".into(),
        r.monthly.to_string(),
        "--keep-yearly".into(),
        r.yearly.to_string(),
    ]
}

/// Arguments for `borg check …`, scoped to this target's archives.
pub fn build_check_args(cfg: &TargetConfig) -> Vec<String> {
    vec![
        "check".into(),
        "--show-rc".into(),
        "--glob-archives".into(),
        archive_glob(cfg),
    ]
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BackupConfig,
        MonitoringConfig,
        NetworkConfig,
        RetentionConfig,
    };

    fn make_cfg() -> TargetConfig {
        TargetConfig {
            name: "laptop".into(),
            credentials: Credentials {
                repo: "/srv/borg".into(),
                passphrase: "s3cr3t".into(),
            },
            engine: "borg".into(),
            backup: BackupConfig {
                paths: vec!["/home/alice".into(), "/etc".into()],
                archive_prefix: "laptop_".into(),
                compression: "zstd,7".into(),
                excludes: vec!["/home/alice/.cache".into(), "*.pyc".into()],
            },
            retention: RetentionConfig::default(),
            network: NetworkConfig {
                ping_host: None,
                ping_interval: 5,
                ping_retries: 5,
            },
            monitoring: MonitoringConfig {
                id: None,
                url: "https://hc-ping.com".into(),
            },
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let idx = args.iter().position(|a| a == flag).unwrap();
        &args[idx + 1]
    }

    // ── create ────────────────────────────────────────────────────────────────

    #[test]
    fn create_args_pass_compression() {
        let args = build_create_args(&make_cfg());
        assert_eq!(value_after(&args, "--compression"), "zstd,7");
        assert!(args.contains(&"--exclude-caches".to_string()));
    }

    #[test]
    fn create_args_have_one_exclude_flag_per_pattern() {
        let args = build_create_args(&make_cfg());
        let flags = args.iter().filter(|a| *a == "--exclude").count();
        assert_eq!(flags, 2);
        assert_eq!(value_after(&args, "--exclude"), "/home/alice/.cache");
    }

    #[test]
    fn create_archive_label_uses_prefix_and_now() {
        let args = build_create_args(&make_cfg());
        assert!(args.contains(&"::laptop_{now}".to_string()));
    }

    #[test]
    fn create_args_end_with_paths_in_order() {
        let args = build_create_args(&make_cfg());
        assert_eq!(&args[args.len() - 2..], ["/home/alice", "/etc"]);
    }

    #[test]
    fn no_args_carry_credentials() {
        let cfg = make_cfg();
        for args in [
            build_create_args(&cfg),
            build_prune_args(&cfg),
            build_check_args(&cfg),
        ] {
            assert!(!args.iter().any(|a| a.contains("s3cr3t")));
            assert!(!args.iter().any(|a| a.contains("/srv/borg")));
        }
    }

    // ── prune / check scoping ─────────────────────────────────────────────────

    #[test]
    fn prune_is_scoped_to_archive_prefix() {
        let args = build_prune_args(&make_cfg());
        assert_eq!(value_after(&args, "--glob-archives"), "laptop_*");
    }

    #[test]
    fn prune_passes_every_keep_count_verbatim() {
        let mut cfg = make_cfg();
        cfg.retention = RetentionConfig {
            last: 1,
            daily: 2,
            weekly: 3,
            monthly: 4,
            yearly: 0,
        };
        let args = build_prune_args(&cfg);
        assert_eq!(value_after(&args, "--keep-last"), "1");
        assert_eq!(value_after(&args, "--keep-daily"), "2");
        assert_eq!(value_after(&args, "--keep-weekly"), "3");
        assert_eq!(value_after(&args, "--keep-monthly"), "4");
        assert_eq!(value_after(&args, "--keep-yearly"), "0");
    }

    #[test]
    fn check_is_scoped_to_archive_prefix() {
        let args = build_check_args(&make_cfg());
        assert_eq!(args[0], "check");
        assert_eq!(value_after(&args, "--glob-archives"), "laptop_*");
    }

    #[test]
    fn scoping_follows_a_changed_prefix() {
        let mut cfg = make_cfg();
        cfg.backup.archive_prefix = "{user}@{hostname}_".into();
        assert_eq!(
            value_after(&build_check_args(&cfg), "--glob-archives"),
            "{user}@{hostname}_*"
        );
        assert_eq!(
            value_after(&build_prune_args(&cfg), "--glob-archives"),
            "{user}@{hostname}_*"
        );
    }

    // ── Borg::execute ─────────────────────────────────────────────────────────

    fn shell(script: &str) -> Invocation {
        Invocation {
            label: "Test",
            args: vec!["-c".into(), script.into()],
        }
    }

    #[test]
    fn execute_returns_the_exit_status() {
        let creds = make_cfg().credentials;
        assert_eq!(Borg::new("sh").execute(&creds, &shell("exit 0")), 0);
        assert_eq!(Borg::new("sh").execute(&creds, &shell("exit 3")), 3);
    }

    #[test]
    fn execute_hands_credentials_through_the_environment() {
        let creds = make_cfg().credentials;
        let inv = shell(r#"test "$BORG_REPO" = /srv/borg && test "$BORG_PASSPHRASE" = s3cr3t"#);
        assert_eq!(Borg::new("sh").execute(&creds, &inv), 0);
        assert!(std::env::var_os("BORG_PASSPHRASE").is_none_or(|v| v != "s3cr3t"));
    }

    #[test]
    fn execute_reports_127_when_engine_is_missing() {
        let creds = make_cfg().credentials;
        let code = Borg::new("/nonexistent/qb-test-engine").execute(&creds, &shell("true"));
        assert_eq!(code, EXIT_SPAWN_FAILED);
    }

    #[cfg(unix)]
    #[test]
    fn execute_maps_signals_above_128() {
        let creds = make_cfg().credentials;
        let code = Borg::new("sh").execute(&creds, &shell("kill -TERM $$"));
        assert_eq!(code, 128 + 15);
    }

    // ── insta snapshots ───────────────────────────────────────────────────────

    #[test]
    fn snapshot_create_args() {
        insta::assert_debug_snapshot!(build_create_args(&make_cfg()));
    }

    #[test]
    fn snapshot_prune_args() {
        insta::assert_debug_snapshot!(build_prune_args(&make_cfg()));
    }

    #[test]
    fn snapshot_check_args() {
        insta::assert_debug_snapshot!(build_check_args(&make_cfg()));
    }
}
