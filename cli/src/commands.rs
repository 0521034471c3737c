pub mod ping;
pub mod resolve;
pub mod sweep;

use std::net::SocketAddr;

use clap::{ArgAction, Args, Parser, Subcommand};
use sounder_common::config::{PING_WORKERS, RESOLVE_WORKERS, parse_nameserver};
use sounder_common::network::target::TargetSpec;

#[derive(Parser)]
#[command(name = "sounder")]
#[command(about = "Sweep a list of hosts for reachability or reverse DNS names.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Less output; repeat to hide per-target lines
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Skip the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one echo request to every target
    #[command(alias = "p")]
    Ping(PingArgs),
    /// Look up the PTR name of every target
    #[command(alias = "r")]
    Resolve(ResolveArgs),
}

#[derive(Args)]
pub struct PingArgs {
    /// Addresses, hostnames, ranges (10.0.0.1-20), CIDR blocks or comma-separated lists
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<TargetSpec>,

    /// Concurrent ping processes
    #[arg(short, long, default_value_t = PING_WORKERS)]
    pub workers: usize,

    /// Kill a ping that has not exited after this many milliseconds
    #[arg(long, default_value_t = 3000)]
    pub deadline_ms: u64,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// IP addresses, ranges (10.0.0.1-20), CIDR blocks or comma-separated lists
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<TargetSpec>,

    /// Concurrent lookups
    #[arg(short, long, default_value_t = RESOLVE_WORKERS)]
    pub workers: usize,

    /// Resolver to query, IP[:PORT]; repeatable. Defaults to /etc/resolv.conf
    #[arg(short = 'n', long = "nameserver", value_parser = parse_nameserver)]
    pub nameservers: Vec<SocketAddr>,

    /// Wait per resolver in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Budget for one whole lookup in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub lifetime_ms: u64,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
