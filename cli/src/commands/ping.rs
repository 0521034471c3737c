use std::time::Duration;

use anyhow::Context;
use tracing::debug;

use sounder_common::config::{PingConfig, PoolConfig};
use sounder_common::network::target::{self, Target};
use sounder_core::PingProbe;

use super::{PingArgs, sweep};
use crate::terminal::print;

pub async fn ping(args: PingArgs, quiet: u8) -> anyhow::Result<()> {
    let targets: Vec<Target> = target::expand(args.targets);
    if targets.is_empty() {
        print::no_results();
        return Ok(());
    }

    let config = PingConfig {
        deadline: Duration::from_millis(args.deadline_ms),
    };
    let probe = PingProbe::new(config).context("cannot set up ping")?;
    debug!(
        "Using `{} {}` with a {:?} deadline",
        probe.command().program(),
        probe.command().args().join(" "),
        config.deadline
    );

    let mut report = sweep::run(targets, PoolConfig::new(args.workers), probe).await?;
    sweep::render(&mut report, "Reachability", "active", quiet);
    Ok(())
}
