//! PTR query encoding and reply classification.
//!
//! Queries are written with `pnet`'s DNS packet builder. Replies are decoded
//! with `dns-parser`, which follows compression pointers inside answer data.

use std::net::IpAddr;

use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsQuery, DnsTypes, MutableDnsPacket, Opcode, Retcode};
use thiserror::Error;

use sounder_common::utils::ip;

pub const DNS_HDR_LEN: usize = 12;

const FLAG_RESPONSE: u8 = 0x80;
const FLAG_RECURSION_DESIRED: u8 = 0x01;
const FLAG_RECURSION_AVAILABLE: u8 = 0x80;
const RCODE_MASK: u8 = 0x0F;
const PTR_TTL: u32 = 300;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("buffer too small for a DNS header")]
    Header,

    #[error("packet is a query, expected a reply")]
    NotAReply,

    #[error("truncated question section")]
    Question,

    #[error("malformed DNS reply: {0}")]
    Malformed(#[from] dns_parser::Error),
}

/// What a resolver said about one PTR question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtrReply {
    /// First PTR record in the answer section, without the trailing dot.
    Name(String),
    /// NXDOMAIN.
    NxDomain,
    /// NOERROR with no PTR record in the answer section.
    NoRecord,
    /// Any other response code (SERVFAIL, REFUSED, ...).
    ServerFailure { rcode: u8 },
}

/// Picks a random transaction id for a new query.
pub fn new_transaction_id() -> u16 {
    rand::random::<u16>()
}

pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> Result<Vec<u8>, DnsError> {
    let query: DnsQuery = create_ptr_query(ip_addr);
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let total: usize = DNS_HDR_LEN + qlen;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).ok_or(DnsError::Header)?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    // The question goes in by hand; pnet's builder only covers the header here.
    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&query.qtype.0.to_be_bytes());
    cursor += 2;

    buffer[cursor..cursor + 2].copy_from_slice(&query.qclass.0.to_be_bytes());

    Ok(buffer)
}

/// Decodes a reply into its transaction id and PTR classification.
pub fn parse_ptr_reply(payload: &[u8]) -> Result<(u16, PtrReply), DnsError> {
    let packet = Packet::parse(payload)?;
    if packet.header.query {
        return Err(DnsError::NotAReply);
    }

    let reply = match packet.header.response_code {
        ResponseCode::NoError => packet
            .answers
            .iter()
            .find_map(|answer| match &answer.data {
                RData::PTR(record) => Some(record.0.to_string()),
                _ => None,
            })
            .map(|name| PtrReply::Name(name.trim_end_matches('.').to_string()))
            .unwrap_or(PtrReply::NoRecord),
        ResponseCode::NameError => PtrReply::NxDomain,
        _ => PtrReply::ServerFailure {
            rcode: payload[3] & RCODE_MASK,
        },
    };

    Ok((packet.header.id, reply))
}

/// Builds a reply to `query` carrying `rcode` and, when given, one PTR answer.
///
/// Loopback responders in the test suite answer with this.
pub fn create_ptr_reply(query: &[u8], rcode: u8, name: Option<&str>) -> Result<Vec<u8>, DnsError> {
    if query.len() < DNS_HDR_LEN {
        return Err(DnsError::Header);
    }
    let question_len = question_len(&query[DNS_HDR_LEN..]).ok_or(DnsError::Question)?;

    let mut reply: Vec<u8> = Vec::with_capacity(query.len() + 64);
    reply.extend_from_slice(&query[0..2]);
    reply.push(FLAG_RESPONSE | (query[2] & FLAG_RECURSION_DESIRED));
    reply.push(FLAG_RECURSION_AVAILABLE | (rcode & RCODE_MASK));
    reply.extend_from_slice(&1u16.to_be_bytes());
    reply.extend_from_slice(&u16::from(name.is_some()).to_be_bytes());
    reply.extend_from_slice(&0u16.to_be_bytes());
    reply.extend_from_slice(&0u16.to_be_bytes());
    reply.extend_from_slice(&query[DNS_HDR_LEN..DNS_HDR_LEN + question_len]);

    if let Some(name) = name {
        let rdata: Vec<u8> = encode_dns_name(name);
        // Owner name points back at the question (offset 12).
        reply.extend_from_slice(&[0xC0, DNS_HDR_LEN as u8]);
        reply.extend_from_slice(&DnsTypes::PTR.0.to_be_bytes());
        reply.extend_from_slice(&1u16.to_be_bytes());
        reply.extend_from_slice(&PTR_TTL.to_be_bytes());
        reply.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        reply.extend_from_slice(&rdata);
    }

    Ok(reply)
}

fn create_ptr_query(ip_addr: &IpAddr) -> DnsQuery {
    let ptr_string: String = ip::reverse_address_to_ptr(ip_addr);
    DnsQuery {
        qname: encode_dns_name(&ptr_string),
        qtype: DnsTypes::PTR,
        qclass: DnsClass(1),
        payload: Vec::new(),
    }
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

/// Length of an uncompressed question (name, type, class).
fn question_len(section: &[u8]) -> Option<usize> {
    let mut cursor: usize = 0;
    loop {
        let len: usize = *section.get(cursor)? as usize;
        cursor += 1;
        if len == 0 {
            break;
        }
        cursor += len;
    }
    let end = cursor + 4;
    (end <= section.len()).then_some(end)
}
