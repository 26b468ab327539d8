//! `qb run <target>` — the full lifecycle of one target.
//!
//! # Sequence
//!
//! | # | Step     | On failure                                |
//! |---|----------|-------------------------------------------|
//! | 1 | Network  | abort, exit 30, nothing else runs         |
//! | 2 | Start    | monitoring `start` signal, best-effort    |
//! | 3 | Create   | recorded, prune still runs                |
//! | 4 | Prune    | recorded, check still runs                |
//! | 5 | Check    | recorded                                  |
//! | 6 | Report   | `success` or `fail` signal, summary       |
//!
//! Prune and check run even after a failed create so that retention and
//! verification stay current.  If borg left the repository locked, that
//! shows up as their own non-zero statuses.
//!
//! The exit code is 0 when all three stages returned 0 and [`EXIT_RUN_FAILED`]
//! otherwise; the summary lists each stage's own code.
//!
//! Nothing here guards against two concurrent runs on the same repository;
//! that is left to borg's repository lock.

use crate::{
    commands::ops,
    config::TargetConfig,
    monitor::{Notifier, Signal},
    network::{self, NetworkError, Reachability},
    runner::Engine,
    ui,
};

pub const EXIT_RUN_FAILED: i32 = 2;

/// Per-stage exit statuses of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub create: i32,
    pub prune: i32,
    pub check: i32,
}

impl RunResult {
    pub const fn success(&self) -> bool {
        self.create == 0 && self.prune == 0 && self.check == 0
    }

    pub const fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { EXIT_RUN_FAILED }
    }

    pub const fn stages(&self) -> [(&'static str, i32); 3] {
        [
            ("Create", self.create),
            ("Prune", self.prune),
            ("Check", self.check),
        ]
    }
}

/// Execute the full pipeline for `cfg`.
///
/// Only the network precondition can cut the run short.
pub fn run(
    cfg: &TargetConfig,
    engine: &impl Engine,
    net: &impl Reachability,
    notifier: &impl Notifier,
) -> Result<RunResult, NetworkError> {
    println!();
    network::ensure_online(&cfg.network, net)?;

    notifier.notify(Signal::Start);

    let create = ops::create(cfg, engine).unwrap_or_else(|e| {
        ui::stage_aborted("Create", &e);
        e.exit_code()
    });
    let prune = ops::prune(cfg, engine);
    let check = ops::check(cfg, engine);

    let result = RunResult {
        create,
        prune,
        check,
    };
    tracing::info!(target_name = %cfg.name, ?result, "run finished");

    notifier.notify(if result.success() {
        Signal::Success
    } else {
        Signal::Failure
    });
    ui::print_summary(&result.stages());

    Ok(result)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeEngine, Offline, Online, RecordingNotifier, sample_target};

    fn run_with(statuses: [i32; 3]) -> (RunResult, FakeEngine, RecordingNotifier) {
        let engine = FakeEngine::new(statuses);
        let notifier = RecordingNotifier::default();
        let result = run(&sample_target(), &engine, &Online, &notifier).unwrap();
        (result, engine, notifier)
    }

    #[test]
    fn all_zero_statuses_exit_zero_with_success_signal() {
        let (result, engine, notifier) = run_with([0, 0, 0]);
        assert!(result.success());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(engine.calls(), vec!["create", "prune", "check"]);
        assert_eq!(notifier.signals(), vec![Signal::Start, Signal::Success]);
    }

    #[test]
    fn any_failing_stage_still_runs_all_three_and_exits_2() {
        for statuses in [[1, 0, 0], [0, 1, 0], [0, 0, 1]] {
            let (result, engine, notifier) = run_with(statuses);
            assert_eq!(
                engine.calls(),
                vec!["create", "prune", "check"],
                "statuses {statuses:?}"
            );
            assert_eq!(result.exit_code(), 2, "statuses {statuses:?}");
            assert_eq!(
                notifier.signals(),
                vec![Signal::Start, Signal::Failure],
                "statuses {statuses:?}"
            );
        }
    }

    #[test]
    fn result_keeps_each_stage_status() {
        let (result, _, _) = run_with([3, 0, 127]);
        assert_eq!(result, RunResult {
            create: 3,
            prune: 0,
            check: 127,
        });
        assert_eq!(result.stages(), [("Create", 3), ("Prune", 0), ("Check", 127)]);
    }

    #[test]
    fn missing_paths_records_20_and_continues() {
        let mut cfg = sample_target();
        cfg.backup.paths.clear();
        let engine = FakeEngine::new([0, 0]);
        let notifier = RecordingNotifier::default();

        let result = run(&cfg, &engine, &Online, &notifier).unwrap();
        assert_eq!(result.create, 20);
        assert_eq!(engine.calls(), vec!["prune", "check"]);
        assert_eq!(result.exit_code(), 2);
        assert_eq!(notifier.signals(), vec![Signal::Start, Signal::Failure]);
    }

    #[test]
    fn offline_host_aborts_before_any_signal_or_stage() {
        let mut cfg = sample_target();
        cfg.network.ping_host = Some("nas.lan".into());
        cfg.network.ping_retries = 3;
        let engine = FakeEngine::new([0, 0, 0]);
        let notifier = RecordingNotifier::default();

        let err = run(&cfg, &engine, &Offline, &notifier).unwrap_err();
        assert_eq!(err.exit_code(), 30);
        assert!(engine.calls().is_empty());
        assert!(notifier.signals().is_empty());
    }
}
