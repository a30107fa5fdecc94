use std::net::IpAddr;

const LOOPBACK: [&str; 2] = ["127.0.0.1", "::1"];

/// Whether `host` already denotes an endpoint, so SRV discovery is pointless.
///
/// The shape checks are coarse on purpose: `999.1.1.1` counts as a literal and
/// fails later at connect time instead of producing a stray DNS query.
pub fn is_literal_or_local(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || LOOPBACK.contains(&host)
        || is_dotted_quad(host)
        || is_full_ipv6(host)
        || host.parse::<IpAddr>().is_ok()
}

fn is_dotted_quad(host: &str) -> bool {
    let groups: Vec<&str> = host.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()))
}

fn is_full_ipv6(host: &str) -> bool {
    let groups: Vec<&str> = host.split(':').collect();
    groups.len() == 8
        && groups
            .iter()
            .all(|g| (1..=4).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_hexdigit()))
}
