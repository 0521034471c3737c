//! # Probe Target Model
//!
//! A [`Target`] is one endpoint handed to a probe strategy. Operators rarely
//! type targets one by one, so this module also parses [`TargetSpec`]s:
//! * A single IP address or hostname.
//! * An IPv4 Range (e.g., `192.168.1.1-100`).
//! * A CIDR block (e.g., `192.168.1.0/24`).
//! * A comma-separated list of any of the above.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::network::range::{self, Ipv4Range};

/// Upper bound on how many addresses a single range or CIDR may expand to.
pub const MAX_EXPANSION: u64 = 65_536;

/// One network endpoint to probe. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(String);

impl Target {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The target as an IP literal, if it is one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse::<IpAddr>().ok()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target(value)
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target(value.to_string())
    }
}

impl From<IpAddr> for Target {
    fn from(value: IpAddr) -> Self {
        Target(value.to_string())
    }
}

/// A parsed command-line target expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP literal.
    Addr { target_addr: IpAddr },
    /// A hostname, passed through untouched.
    Hostname { name: String },
    /// A range of IPv4 addresses.
    Range { ipv4_range: Ipv4Range },
    /// Holds a list of different specs
    Multi { specs: Vec<TargetSpec> },
}

impl FromStr for TargetSpec {
    type Err = String;

    /// Parses a string into a `TargetSpec`.
    ///
    /// Supported formats:
    /// * **Host**: Single IPv4/IPv6 address (e.g., "192.168.1.5").
    /// * **Range**: "Start-End" (e.g., "192.168.1.1-50", "192.168.1.1-192.168.1.50").
    /// * **CIDR**: "Network/Prefix" (e.g., "192.168.1.0/24").
    /// * **Hostname**: RFC 1123 style name (e.g., "gw-01.example.net").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Some(spec) = parse_addr(s) {
            return Ok(spec);
        }

        if let Some(spec) = parse_cidr_range(s)? {
            return Ok(spec);
        }

        if let Some(spec) = parse_ip_range(s)? {
            return Ok(spec);
        }

        if let Some(spec) = parse_hostname(s) {
            return Ok(spec);
        }

        Err(format!("invalid target: {s}"))
    }
}

impl TargetSpec {
    /// Flattens the spec into the targets it names, in input order.
    pub fn into_targets(self) -> Vec<Target> {
        let mut targets = Vec::new();
        self.collect_into(&mut targets);
        targets
    }

    fn collect_into(self, targets: &mut Vec<Target>) {
        match self {
            TargetSpec::Addr { target_addr } => targets.push(Target::from(target_addr)),
            TargetSpec::Hostname { name } => targets.push(Target::from(name)),
            TargetSpec::Range { ipv4_range } => targets.extend(ipv4_range.to_iter().map(Target::from)),
            TargetSpec::Multi { specs } => {
                for spec in specs {
                    spec.collect_into(targets);
                }
            }
        }
    }
}

/// Expands several specs into one flat target list.
pub fn expand<I>(specs: I) -> Vec<Target>
where
    I: IntoIterator<Item = TargetSpec>,
{
    specs.into_iter().flat_map(TargetSpec::into_targets).collect()
}

/// Parses a comma-separated list of targets (e.g., "192.168.1.5, 10.0.0.1-50, gw.local").
fn parse_commas(s: &str) -> Result<TargetSpec, String> {
    let mut specs = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let spec = TargetSpec::from_str(part)
            .map_err(|e| format!("Failed to parse target '{part}': {e}"))?;

        specs.push(spec);
    }

    Ok(TargetSpec::Multi { specs })
}

/// Parses a single IP address.
fn parse_addr(s: &str) -> Option<TargetSpec> {
    s.parse::<IpAddr>()
        .ok()
        .map(|target_addr| TargetSpec::Addr { target_addr })
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
///
/// Returns `Ok(None)` when the left side is not an IPv4 address, so hyphenated
/// hostnames fall through to [`parse_hostname`].
fn parse_ip_range(s: &str) -> Result<Option<TargetSpec>, String> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let Ok(start_addr) = start_str.parse::<Ipv4Addr>() else {
        return Ok(None);
    };

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;

    let ipv4_range = Ipv4Range::new(start_addr, end_addr);
    if ipv4_range.is_empty() {
        return Err(format!("Range ends before it starts: {s}"));
    }
    check_expansion(&ipv4_range, s)?;

    Ok(Some(TargetSpec::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(format!("End range cannot be empty: {original_s}"));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("Invalid end range '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("End range has too many octets: {end_str}"));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr_range(s: &str) -> Result<Option<TargetSpec>, String> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("Invalid IP in CIDR '{ip_str}': {e}"))?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| format!("Invalid prefix in CIDR '{prefix_str}': {e}"))?;

    let ipv4_range = range::cidr_range(ipv4_addr, prefix)?;
    check_expansion(&ipv4_range, s)?;

    Ok(Some(TargetSpec::Range { ipv4_range }))
}

fn check_expansion(ipv4_range: &Ipv4Range, original_s: &str) -> Result<(), String> {
    if ipv4_range.len() > MAX_EXPANSION {
        return Err(format!(
            "{original_s} expands to {} addresses, the limit is {MAX_EXPANSION}",
            ipv4_range.len()
        ));
    }
    Ok(())
}

/// Accepts RFC 1123 hostnames. A numeric last label is rejected so that
/// mistyped addresses such as "10.0.0.256" are not taken for names.
fn parse_hostname(s: &str) -> Option<TargetSpec> {
    let name = s.strip_suffix('.').unwrap_or(s);
    if name.is_empty() || name.len() > 253 {
        return None;
    }

    let labels: Vec<&str> = name.split('.').collect();
    let valid_labels = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let numeric_tail = labels
        .last()
        .is_some_and(|last| last.chars().all(|c| c.is_ascii_digit()));

    if !valid_labels || numeric_tail {
        return None;
    }

    Some(TargetSpec::Hostname {
        name: name.to_string(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
