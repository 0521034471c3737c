use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use tracing::debug;

use sounder_common::config::ResolverConfig;
use sounder_common::error::ConfigError;
use sounder_common::network::target::Target;
use sounder_common::outcome::{Outcome, UnresolvedReason};
use sounder_protocols::dns::{self, PtrReply};

use super::{Probe, ProbeError};

const RECV_BUFFER_SIZE: usize = 4096;

/// Reverse name resolution over UDP.
///
/// Resolvers are tried in order. Each attempt waits at most `timeout`; the
/// whole lookup never exceeds `lifetime`. NXDOMAIN and empty answers are
/// authoritative and end the lookup; server failures and dead sockets move
/// on to the next resolver.
#[derive(Debug, Clone)]
pub struct PtrProbe {
    config: ResolverConfig,
}

impl PtrProbe {
    pub fn new(config: ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn lookup(&self, ip: IpAddr) -> Outcome {
        let started = Instant::now();
        let mut timed_out = false;

        for server in &self.config.nameservers {
            let remaining = self.config.lifetime.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                timed_out = true;
                break;
            }

            match query(ip, *server, remaining.min(self.config.timeout)) {
                Ok(PtrReply::Name(name)) => return Outcome::Resolved(name),
                Ok(PtrReply::NxDomain) => return Outcome::Unresolved(UnresolvedReason::NotFound),
                Ok(PtrReply::NoRecord) => return Outcome::Unresolved(UnresolvedReason::NoAnswer),
                Ok(PtrReply::ServerFailure { rcode }) => {
                    debug!("{server} answered rcode {rcode} for {ip}");
                }
                Err(ProbeError::Timeout(wait)) => {
                    debug!("{server} gave no answer for {ip} within {wait:?}");
                    timed_out = true;
                }
                Err(e) => debug!("{server} unusable for {ip}: {e}"),
            }
        }

        let reason = if timed_out {
            UnresolvedReason::Timeout
        } else {
            UnresolvedReason::NoNameserver
        };
        Outcome::Unresolved(reason)
    }
}

impl Probe for PtrProbe {
    fn name(&self) -> &'static str {
        "ptr"
    }

    fn probe(&self, target: &Target) -> Result<Outcome, ProbeError> {
        let Some(ip) = target.ip() else {
            debug!("{target} is not an address, skipping reverse lookup");
            return Ok(Outcome::Unresolved(UnresolvedReason::NotFound));
        };
        if self.config.nameservers.is_empty() {
            return Ok(Outcome::Unresolved(UnresolvedReason::NoNameserver));
        }
        Ok(self.lookup(ip))
    }

    fn fault_outcome(&self) -> Outcome {
        Outcome::Unresolved(UnresolvedReason::NoNameserver)
    }
}

/// Sends one PTR query to `server` and waits up to `wait` for the matching reply.
///
/// Replies with a foreign transaction id or that fail to decode are ignored.
fn query(ip: IpAddr, server: SocketAddr, wait: Duration) -> Result<PtrReply, ProbeError> {
    let bind_addr: SocketAddr = match server {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    };
    let socket = UdpSocket::bind(bind_addr)?;
    socket.connect(server)?;

    let id: u16 = dns::new_transaction_id();
    let packet: Vec<u8> = dns::create_ptr_packet(&ip, id)?;
    socket.send(&packet)?;

    let started = Instant::now();
    let mut buffer = [0u8; RECV_BUFFER_SIZE];
    loop {
        let remaining = wait.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(ProbeError::Timeout(wait));
        }
        socket.set_read_timeout(Some(remaining))?;

        let len = match socket.recv(&mut buffer) {
            Ok(len) => len,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(ProbeError::Timeout(wait));
            }
            Err(e) => return Err(e.into()),
        };

        match dns::parse_ptr_reply(&buffer[..len]) {
            Ok((reply_id, reply)) if reply_id == id => return Ok(reply),
            Ok((reply_id, _)) => debug!("Dropping reply with stale id {reply_id} from {server}"),
            Err(e) => debug!("Dropping undecodable reply from {server}: {e}"),
        }
    }
}
