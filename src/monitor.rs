//! Best-effort run notifications to a healthchecks-style endpoint.
//!
//! URLs follow `<url>/<id>` for success, `<url>/<id>/start` and
//! `<url>/<id>/fail`.  Nothing here can fail the run: transport errors and
//! non-2xx responses are logged and dropped.

use std::{fmt, time::Duration};

use crate::{config::MonitoringConfig, ui};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Start,
    Success,
    Failure,
}

impl Signal {
    const fn path_suffix(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Success => "",
            Self::Failure => "/fail",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Success => "success",
            Self::Failure => "failure",
        })
    }
}

/// Receives lifecycle signals of a run.  Implementations must not fail.
pub trait Notifier {
    fn notify(&self, signal: Signal);
}

/// HTTP reporter keyed by `[monitoring].id`.
pub struct Reporter {
    id: Option<String>,
    base_url: String,
    agent: ureq::Agent,
}

impl Reporter {
    pub fn new(cfg: &MonitoringConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("qb/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            id: cfg.id.clone(),
            base_url: cfg.url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    /// Endpoint for `signal`, or `None` when monitoring is disabled.
    pub fn url_for(&self, signal: Signal) -> Option<String> {
        self.id
            .as_deref()
            .map(|id| format!("{}/{id}{}", self.base_url, signal.path_suffix()))
    }
}

impl Notifier for Reporter {
    fn notify(&self, signal: Signal) {
        let Some(url) = self.url_for(signal) else {
            ui::info(&format!(
                "monitoring id not configured, not sending {signal} signal"
            ));
            return;
        };

        match self.agent.get(&url).call() {
            Ok(resp) => {
                tracing::debug!(%signal, status = resp.status(), "monitoring signal sent");
            },
            Err(ureq::Error::Status(code, _)) => {
                tracing::warn!(%signal, status = code, "monitoring endpoint rejected signal");
            },
            Err(e) => {
                tracing::warn!(%signal, error = %e, "failed to send monitoring signal");
            },
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
