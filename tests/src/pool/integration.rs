use std::collections::HashSet;
use std::time::{Duration, Instant};

use sounder_common::config::{PingConfig, PoolConfig};
use sounder_common::error::PoolError;
use sounder_common::network::target::Target;
use sounder_common::outcome::{Outcome, ProbeRecord};
use sounder_core::probe::PingCommand;
use sounder_core::{CancelToken, PingProbe, Pool};

use crate::utils::TableProbe;

fn record(target: &str, outcome: Outcome) -> ProbeRecord {
    ProbeRecord::new(Target::from(target), outcome)
}

/// A backend error on one target maps to Unreachable and leaves the rest alone,
/// whatever the pool width.
#[test]
fn mixed_batch_with_backend_error() {
    let probe = TableProbe::new(&[
        ("10.0.0.1", Outcome::Reachable),
        ("10.0.0.2", Outcome::Unreachable),
    ]);
    let expected: HashSet<ProbeRecord> = [
        record("10.0.0.1", Outcome::Reachable),
        record("10.0.0.2", Outcome::Unreachable),
        record("bad-target", Outcome::Unreachable),
    ]
    .into_iter()
    .collect();

    for workers in 1..=4 {
        let records = sounder_core::run(["10.0.0.1", "10.0.0.2", "bad-target"], workers, &probe)
            .expect("batch should complete");

        assert_eq!(records.len(), 3, "workers = {workers}");
        let got: HashSet<ProbeRecord> = records.into_iter().collect();
        assert_eq!(got, expected, "workers = {workers}");
    }
}

#[test]
fn one_outcome_per_target_at_every_width() {
    let targets: Vec<String> = (1..=40).map(|i| format!("192.168.7.{i}")).collect();
    let entries: Vec<(&'static str, Outcome)> = Vec::new();
    let probe = TableProbe::new(&entries);

    let mut sets: Vec<HashSet<ProbeRecord>> = Vec::new();
    for workers in [1, 3, 8, 40, 200] {
        let records = sounder_core::run(targets.clone(), workers, &probe).unwrap();
        assert_eq!(records.len(), targets.len(), "workers = {workers}");
        sets.push(records.into_iter().collect());
    }

    assert!(sets.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn zero_workers_is_a_configuration_error() {
    let probe = TableProbe::new(&[("10.0.0.1", Outcome::Reachable)]);
    let result = sounder_core::run(["10.0.0.1"], 0, &probe);
    assert!(matches!(result, Err(PoolError::Config(_))));
}

#[tokio::test]
async fn cancellation_joins_workers_and_reports_leftovers() {
    let targets: Vec<String> = (0..200).map(|i| format!("10.1.{}.{}", i / 256, i % 256)).collect();
    let cancel = CancelToken::new();
    let pool = Pool::new(PoolConfig::new(2)).with_cancel_token(cancel.clone());

    let batch = tokio::task::spawn_blocking(move || {
        let probe = TableProbe::new(&[]).with_delay(Duration::from_millis(20));
        pool.run(targets, &probe)
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    match batch.await.expect("batch thread panicked") {
        Err(PoolError::Cancelled { completed, skipped }) => {
            assert!(skipped > 0);
            assert_eq!(completed.len() + skipped, 200);
            assert!(completed.iter().all(|r| r.outcome == Outcome::Unreachable));
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
}

/// Children that never exit are killed at the deadline, so the batch finishes
/// in roughly one deadline per pool round.
#[cfg(unix)]
#[test]
fn hung_backends_are_bounded_by_the_deadline() {
    let command = PingCommand::custom("sh", ["-c", "sleep 10", "sh"]);
    let config = PingConfig {
        deadline: Duration::from_millis(250),
    };
    let probe = PingProbe::with_command(command, config).unwrap();

    let started = Instant::now();
    let records = sounder_core::run(["10.9.0.1", "10.9.0.2", "10.9.0.3", "10.9.0.4"], 4, &probe).unwrap();

    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.outcome == Outcome::Unreachable));
    assert!(started.elapsed() < Duration::from_secs(3));
}
