use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sounder_core::{Probe, ProbeError};
use sounder_common::network::target::Target;
use sounder_common::outcome::Outcome;
use sounder_protocols::dns::{self, DNS_HDR_LEN};

/// How the loopback responder treats a query for one reverse name.
#[derive(Debug, Clone)]
pub enum Reply {
    Ptr(&'static str),
    NxDomain,
    Empty,
    ServFail,
    Silent,
}

/// A DNS server on 127.0.0.1 that answers PTR queries from a fixed table.
///
/// Names missing from the table get `default`. The thread stops on drop.
pub struct Responder {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Responder {
    pub fn start(table: HashMap<String, Reply>, default: Reply) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        socket.set_read_timeout(Some(Duration::from_millis(50)))?;
        let addr = socket.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 512];
            while !stop_flag.load(Ordering::Relaxed) {
                let Ok((len, peer)) = socket.recv_from(&mut buffer) else {
                    continue;
                };
                let query = &buffer[..len];
                let Some(qname) = question_name(query) else {
                    continue;
                };
                let reply = table.get(&qname).unwrap_or(&default);
                let bytes = match reply {
                    Reply::Ptr(name) => dns::create_ptr_reply(query, 0, Some(*name)),
                    Reply::NxDomain => dns::create_ptr_reply(query, 3, None),
                    Reply::Empty => dns::create_ptr_reply(query, 0, None),
                    Reply::ServFail => dns::create_ptr_reply(query, 2, None),
                    Reply::Silent => continue,
                };
                if let Ok(bytes) = bytes {
                    let _ = socket.send_to(&bytes, peer);
                }
            }
        });

        Ok(Self {
            addr,
            stop,
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Reads the (uncompressed) question name of a query.
fn question_name(query: &[u8]) -> Option<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut cursor: usize = DNS_HDR_LEN;
    loop {
        let len: usize = *query.get(cursor)? as usize;
        cursor += 1;
        if len == 0 {
            break;
        }
        let label = query.get(cursor..cursor + len)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        cursor += len;
    }
    Some(labels.join("."))
}

/// Reachability stub driven by a lookup table; unknown targets are backend faults.
pub struct TableProbe {
    pub table: HashMap<&'static str, Outcome>,
    pub delay: Duration,
}

impl TableProbe {
    pub fn new(entries: &[(&'static str, Outcome)]) -> Self {
        Self {
            table: entries.iter().cloned().collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Probe for TableProbe {
    fn name(&self) -> &'static str {
        "table"
    }

    fn probe(&self, target: &Target) -> Result<Outcome, ProbeError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.table
            .get(target.as_str())
            .cloned()
            .ok_or_else(|| ProbeError::Backend(format!("no backend for {target}")))
    }

    fn fault_outcome(&self) -> Outcome {
        Outcome::Unreachable
    }
}
