use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use sounder_common::config::{PoolConfig, ResolverConfig};
use sounder_common::network::target::{self, Target};
use sounder_core::PtrProbe;

use super::{ResolveArgs, sweep};
use crate::terminal::print;

pub async fn resolve(args: ResolveArgs, quiet: u8) -> anyhow::Result<()> {
    let targets: Vec<Target> = target::expand(args.targets);
    if targets.is_empty() {
        print::no_results();
        return Ok(());
    }

    let mut config = if args.nameservers.is_empty() {
        ResolverConfig::from_system()
    } else {
        ResolverConfig::with_nameservers(args.nameservers)
    };
    config.timeout = Duration::from_millis(args.timeout_ms);
    config.lifetime = Duration::from_millis(args.lifetime_ms);

    if config.nameservers.is_empty() {
        warn!("No nameservers configured, every lookup will come back unresolved");
    } else {
        let servers: Vec<String> = config.nameservers.iter().map(ToString::to_string).collect();
        info!("Asking {}", servers.join(", "));
    }

    let probe = PtrProbe::new(config).context("cannot set up reverse lookups")?;

    let mut report = sweep::run(targets, PoolConfig::new(args.workers), probe).await?;
    sweep::render(&mut report, "Reverse DNS", "resolved", quiet);
    Ok(())
}
