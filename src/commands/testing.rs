//! Fakes shared by the command tests.

use std::{
    cell::RefCell,
    collections::VecDeque,
    time::Duration,
};

use crate::{
    config::{
        BackupConfig,
        Credentials,
        MonitoringConfig,
        NetworkConfig,
        RetentionConfig,
        TargetConfig,
    },
    monitor::{Notifier, Signal},
    network::Reachability,
    runner::{Engine, Invocation},
};

pub fn sample_target() -> TargetConfig {
    TargetConfig {
        name: "laptop".into(),
        credentials: Credentials {
            repo: "/srv/borg/laptop".into(),
            passphrase: "pw".into(),
        },
        engine: "borg".into(),
        backup: BackupConfig {
            paths: vec!["/home/alice".into()],
            archive_prefix: "laptop_".into(),
            compression: "zstd,7".into(),
            excludes: vec![],
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

/// Returns queued statuses in order (0 once exhausted) and records every call.
pub struct FakeEngine {
    statuses: RefCell<VecDeque<i32>>,
    calls: RefCell<Vec<Invocation>>,
    repos: RefCell<Vec<String>>,
}

impl FakeEngine {
    pub fn new(statuses: impl IntoIterator<Item = i32>) -> Self {
        Self {
            statuses: RefCell::new(statuses.into_iter().collect()),
            calls: RefCell::new(Vec::new()),
            repos: RefCell::new(Vec::new()),
        }
    }

    /// Engine subcommand of every call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|inv| inv.args[0].clone())
            .collect()
    }

    pub fn repos(&self) -> Vec<String> {
        self.repos.borrow().clone()
    }
}

impl Engine for FakeEngine {
    fn execute(&self, credentials: &Credentials, invocation: &Invocation) -> i32 {
        self.calls.borrow_mut().push(invocation.clone());
        self.repos.borrow_mut().push(credentials.repo.clone());
        self.statuses.borrow_mut().pop_front().unwrap_or(0)
    }
}

pub struct Online;

impl Reachability for Online {
    fn probe(&self, _host: &str) -> bool {
        true
    }

    fn pause(&self, _interval: Duration) {}
}

pub struct Offline;

impl Reachability for Offline {
    fn probe(&self, _host: &str) -> bool {
        false
    }

    fn pause(&self, _interval: Duration) {}
}

#[derive(Default)]
pub struct RecordingNotifier {
    signals: RefCell<Vec<Signal>>,
}

impl RecordingNotifier {
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, signal: Signal) {
        self.signals.borrow_mut().push(signal);
    }
}
