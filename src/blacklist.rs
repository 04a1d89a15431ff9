use ipnet::Ipv4Net;
use std::net::IpAddr;
use std::sync::OnceLock;

/// Reserved and private IPv4 ranges that must never be treated as scannable
/// public space.
const RESERVED_RANGES: &[&str] = &[
    "0.0.0.0/32",         // current network, only valid as source
    "240.0.0.0/4",        // reserved for future use
    "203.0.113.0/24",     // TEST-NET-3
    "198.51.100.0/24",    // TEST-NET-2
    "198.18.0.0/15",      // inter-network benchmark testing
    "192.0.2.0/24",       // TEST-NET-1
    "100.64.0.0/10",      // carrier-grade NAT shared space
    "255.255.255.255/32", // limited broadcast
    "192.0.0.0/24",       // IETF protocol assignments
    "192.88.99.0/24",     // former 6to4 relay
    "192.168.0.0/16",     // RFC1918
    "172.16.0.0/12",      // RFC1918
    "10.0.0.0/8",         // RFC1918
    "127.0.0.0/8",        // loopback
    "169.254.0.0/16",     // link-local
    "224.0.0.0/4",        // multicast
];

fn blacklist() -> &'static Vec<Ipv4Net> {
    static BLACKLIST: OnceLock<Vec<Ipv4Net>> = OnceLock::new();
    BLACKLIST.get_or_init(|| {
        RESERVED_RANGES
            .iter()
            .map(|cidr| cidr.parse().expect("reserved range table is well formed"))
            .collect()
    })
}

/// Whether `ip` falls inside a reserved/private range.
///
/// Anything that does not parse as an IPv4 address (including IPv6) is
/// reported as not internal.
pub fn is_internal(ip: &str) -> bool {
    let addr = match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4,
        _ => return false,
    };
    blacklist().iter().any(|net| net.contains(&addr))
}
