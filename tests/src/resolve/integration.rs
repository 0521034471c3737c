use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::time::{Duration, Instant};

use sounder_common::config::{RESOLVE_WORKERS, ResolverConfig};
use sounder_common::network::target::Target;
use sounder_common::outcome::{Outcome, ProbeRecord, UnresolvedReason};
use sounder_common::utils::ip::reverse_address_to_ptr;
use sounder_core::PtrProbe;

use crate::utils::{Reply, Responder};

fn reverse(ip: &str) -> String {
    let ip: IpAddr = ip.parse().expect("test address");
    reverse_address_to_ptr(&ip)
}

fn fast_config(responders: &[&Responder]) -> ResolverConfig {
    ResolverConfig {
        nameservers: responders.iter().map(|r| r.addr()).collect(),
        timeout: Duration::from_millis(300),
        lifetime: Duration::from_millis(600),
    }
}

#[test]
fn no_nameservers_is_an_outcome_not_a_crash() {
    let probe = PtrProbe::new(ResolverConfig::default()).unwrap();
    let records = sounder_core::run(["8.8.8.8"], RESOLVE_WORKERS, &probe).unwrap();

    assert_eq!(
        records,
        vec![ProbeRecord::new(
            Target::from("8.8.8.8"),
            Outcome::Unresolved(UnresolvedReason::NoNameserver)
        )]
    );
}

#[test]
fn answers_are_classified_per_target() -> anyhow::Result<()> {
    let table: HashMap<String, Reply> = [
        (reverse("8.8.8.8"), Reply::Ptr("dns.google.")),
        (reverse("10.0.0.1"), Reply::NxDomain),
        (reverse("10.0.0.2"), Reply::Empty),
        (reverse("2001:4860:4860::8888"), Reply::Ptr("dns.google")),
    ]
    .into_iter()
    .collect();
    let responder = Responder::start(table, Reply::NxDomain)?;
    let probe = PtrProbe::new(fast_config(&[&responder]))?;

    let records = sounder_core::run(
        ["8.8.8.8", "10.0.0.1", "10.0.0.2", "2001:4860:4860::8888", "not-an-address"],
        RESOLVE_WORKERS,
        &probe,
    )?;

    let got: HashSet<(String, Outcome)> = records
        .into_iter()
        .map(|r| (r.target.to_string(), r.outcome))
        .collect();
    let expected: HashSet<(String, Outcome)> = [
        ("8.8.8.8", Outcome::Resolved("dns.google".into())),
        ("10.0.0.1", Outcome::Unresolved(UnresolvedReason::NotFound)),
        ("10.0.0.2", Outcome::Unresolved(UnresolvedReason::NoAnswer)),
        ("2001:4860:4860::8888", Outcome::Resolved("dns.google".into())),
        ("not-an-address", Outcome::Unresolved(UnresolvedReason::NotFound)),
    ]
    .into_iter()
    .map(|(t, o)| (t.to_string(), o))
    .collect();

    assert_eq!(got, expected);
    Ok(())
}

#[test]
fn failing_resolver_falls_through_to_the_next() -> anyhow::Result<()> {
    let broken = Responder::start(HashMap::new(), Reply::ServFail)?;
    let table: HashMap<String, Reply> = [(reverse("9.9.9.9"), Reply::Ptr("dns9.quad9.net."))]
        .into_iter()
        .collect();
    let healthy = Responder::start(table, Reply::NxDomain)?;
    let probe = PtrProbe::new(fast_config(&[&broken, &healthy]))?;

    let records = sounder_core::run(["9.9.9.9"], 1, &probe)?;
    assert_eq!(records[0].outcome, Outcome::Resolved("dns9.quad9.net".into()));
    Ok(())
}

#[test]
fn all_resolvers_failing_is_no_nameserver() -> anyhow::Result<()> {
    let first = Responder::start(HashMap::new(), Reply::ServFail)?;
    let second = Responder::start(HashMap::new(), Reply::ServFail)?;
    let probe = PtrProbe::new(fast_config(&[&first, &second]))?;

    let records = sounder_core::run(["192.0.2.10", "192.0.2.11"], 2, &probe)?;
    assert!(records
        .iter()
        .all(|r| r.outcome == Outcome::Unresolved(UnresolvedReason::NoNameserver)));
    Ok(())
}

#[test]
fn silent_resolver_is_bounded_by_lifetime() -> anyhow::Result<()> {
    let silent = Responder::start(HashMap::new(), Reply::Silent)?;
    let probe = PtrProbe::new(fast_config(&[&silent]))?;

    let targets: Vec<String> = (1..=8).map(|i| format!("198.51.100.{i}")).collect();
    let started = Instant::now();
    let records = sounder_core::run(targets, RESOLVE_WORKERS, &probe)?;

    assert_eq!(records.len(), 8);
    assert!(records
        .iter()
        .all(|r| r.outcome == Outcome::Unresolved(UnresolvedReason::Timeout)));
    assert!(started.elapsed() < Duration::from_secs(3));
    Ok(())
}
