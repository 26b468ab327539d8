//! Reachability precondition run before any engine call.
//!
//! With `[network].ping_host` unset this is a no-op.  Otherwise the host gets
//! up to `ping_retries` single ICMP echo probes, separated by a blocking wait
//! of `ping_interval` seconds.  Running out of attempts is fatal: the caller
//! exits with [`EXIT_OFFLINE`] before any backup stage starts.

use std::{
    process::{Command, Stdio},
    time::Duration,
};

use thiserror::Error;

use crate::{config::NetworkConfig, ui};

pub const EXIT_OFFLINE: i32 = 30;

/// Timeout of one echo probe, in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("host '{host}' is unreachable after {attempts} attempt(s)")]
    Unreachable { host: String, attempts: u32 },
}

impl NetworkError {
    pub const fn exit_code(&self) -> i32 {
        EXIT_OFFLINE
    }
}

/// Probing and waiting, split out so the retry loop can run without a network.
pub trait Reachability {
    /// One probe; `true` if the host answered.
    fn probe(&self, host: &str) -> bool;

    /// Block for `interval` before the next probe.
    fn pause(&self, interval: Duration);
}

/// Probes with the system `ping` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ping;

impl Ping {
    fn args(host: &str) -> Vec<String> {
        // -W is seconds on Linux, -t is the overall timeout on the BSDs.
        let timeout_flag = if cfg!(any(target_os = "macos", target_os = "freebsd")) {
            "-t"
        } else {
            "-W"
        };
        vec![
            "-c".into(),
            "1".into(),
            timeout_flag.into(),
            PROBE_TIMEOUT_SECS.to_string(),
            host.into(),
        ]
    }
}

impl Reachability for Ping {
    fn probe(&self, host: &str) -> bool {
        match Command::new("ping")
            .args(Self::args(host))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn ping");
                false
            },
        }
    }

    fn pause(&self, interval: Duration) {
        let pb = ui::spinner(&format!("retrying in {}s", interval.as_secs()));
        std::thread::sleep(interval);
        pb.finish_and_clear();
    }
}

/// Gate on `cfg.ping_host` being reachable.
pub fn ensure_online(cfg: &NetworkConfig, net: &impl Reachability) -> Result<(), NetworkError> {
    let Some(host) = cfg.ping_host.as_deref() else {
        tracing::debug!("no ping_host configured, skipping reachability check");
        return Ok(());
    };
    let interval = Duration::from_secs(cfg.ping_interval);

    for attempt in 1..=cfg.ping_retries {
        if net.probe(host) {
            tracing::debug!(host, attempt, "host reachable");
            return Ok(());
        }
        ui::warn(&format!(
            "{host} unreachable (attempt {attempt} of {})",
            cfg.ping_retries
        ));
        if attempt < cfg.ping_retries {
            net.pause(interval);
        }
    }

    Err(NetworkError::Unreachable {
        host: host.to_string(),
        attempts: cfg.ping_retries,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
