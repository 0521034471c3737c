use std::fmt::Write;
use std::net::IpAddr;

/// Builds the reverse-lookup owner name for an address.
///
/// `192.0.2.1` becomes `1.2.0.192.in-addr.arpa`; IPv6 addresses are expanded
/// into reversed nibbles under `ip6.arpa`.
pub fn reverse_address_to_ptr(ip_addr: &IpAddr) -> String {
    match ip_addr {
        IpAddr::V4(ipv4_addr) => {
            let [a, b, c, d] = ipv4_addr.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(ipv6_addr) => {
            let mut name = String::with_capacity(72);
            for byte in ipv6_addr.octets().iter().rev() {
                let _ = write!(name, "{:x}.{:x}.", byte & 0x0F, byte >> 4);
            }
            name.push_str("ip6.arpa");
            name
        }
    }
}
