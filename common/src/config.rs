//! Per-call configuration for the pool and the probe strategies.
//!
//! Nothing here is global: each `run` gets its own copies.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

/// Default pool width for reachability probing.
pub const PING_WORKERS: usize = 32;
/// Default pool width for reverse lookups.
pub const RESOLVE_WORKERS: usize = 8;

pub const DNS_PORT: u16 = 53;
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads draining the queue.
    pub workers: usize,
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingConfig {
    /// Hard limit on one `ping` child. The child is killed when it runs longer.
    pub deadline: Duration,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(3),
        }
    }
}

impl PingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "ping deadline" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Resolvers asked in order until one gives a usable answer.
    pub nameservers: Vec<SocketAddr>,
    /// Wait per resolver attempt.
    pub timeout: Duration,
    /// Budget for the whole lookup across all resolvers.
    pub lifetime: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            timeout: Duration::from_secs(3),
            lifetime: Duration::from_secs(3),
        }
    }
}

impl ResolverConfig {
    pub fn with_nameservers(nameservers: Vec<SocketAddr>) -> Self {
        Self {
            nameservers,
            ..Self::default()
        }
    }

    /// Uses the resolvers listed in `/etc/resolv.conf`.
    ///
    /// An unreadable file leaves the list empty; lookups then report
    /// `NoNameserver` instead of failing the batch.
    pub fn from_system() -> Self {
        Self::with_nameservers(read_resolv_conf(Path::new(RESOLV_CONF_PATH)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "resolver timeout" });
        }
        if self.lifetime.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "resolver lifetime" });
        }
        Ok(())
    }
}

/// Parses `1.1.1.1`, `1.1.1.1:5353`, `::1` or `[::1]:53`. Port defaults to 53.
pub fn parse_nameserver(s: &str) -> Result<SocketAddr, ConfigError> {
    let s = s.trim();
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DNS_PORT));
    }
    s.parse::<SocketAddr>()
        .map_err(|_| ConfigError::InvalidNameserver(s.to_string()))
}

fn read_resolv_conf(path: &Path) -> Vec<SocketAddr> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_resolv_conf(&contents),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Extracts `nameserver` entries, skipping comments and malformed lines.
pub fn parse_resolv_conf(contents: &str) -> Vec<SocketAddr> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => {
                    // Scoped IPv6 entries ("fe80::1%eth0") cannot be expressed as a SocketAddr here.
                    addr.parse::<IpAddr>()
                        .ok()
                        .map(|ip| SocketAddr::new(ip, DNS_PORT))
                }
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn zero_workers_is_rejected() {
        assert_eq!(
            PoolConfig::new(0).validate(),
            Err(ConfigError::InvalidWorkerCount(0))
        );
        assert!(PoolConfig::new(PING_WORKERS).validate().is_ok());
    }

    #[test]
    fn zero_durations_are_rejected() {
        let ping = PingConfig {
            deadline: Duration::ZERO,
        };
        assert!(ping.validate().is_err());

        let resolver = ResolverConfig {
            lifetime: Duration::ZERO,
            ..ResolverConfig::default()
        };
        assert_eq!(
            resolver.validate(),
            Err(ConfigError::ZeroDuration { name: "resolver lifetime" })
        );
    }

    #[test]
    fn nameserver_forms() {
        assert_eq!(
            parse_nameserver("9.9.9.9").unwrap(),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9)), 53)
        );
        assert_eq!(parse_nameserver("127.0.0.1:5353").unwrap().port(), 5353);
        assert_eq!(parse_nameserver("[::1]:53").unwrap().port(), 53);
        assert_eq!(parse_nameserver("::1").unwrap().port(), 53);
        assert!(parse_nameserver("resolver.local").is_err());
    }

    #[test]
    fn resolv_conf_parsing() {
        let contents = "\
# generated by NetworkManager
search lan
nameserver 192.168.0.1
nameserver   2606:4700:4700::1111
; nameserver 10.9.9.9
nameserver fe80::1%eth0
options edns0
";
        let servers = parse_resolv_conf(contents);
        assert_eq!(servers.len(), 2);
        assert_eq!(
            servers[0],
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)), DNS_PORT)
        );
    }

    #[test]
    fn missing_resolv_conf_yields_no_servers() {
        assert!(read_resolv_conf(Path::new("/nonexistent/resolv.conf")).is_empty());
    }
}
