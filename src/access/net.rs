use ipnet::IpNet;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid CIDR network '{input}'")]
pub struct NetworkParseError {
    pub input: String,
}

/// Parse a single address token. `None` marks an unparseable token, which
/// never matches any network.
///
/// IPv4-mapped IPv6 addresses are folded to plain IPv4 so `::ffff:10.0.0.1`
/// is tested against IPv4 ranges. An IPv6 zone (`fe80::1%eth0`) is dropped.
pub fn parse_address(token: &str) -> Option<IpAddr> {
    let addr = match token.split_once('%') {
        Some((addr, _zone)) if addr.contains(':') => addr,
        _ => token,
    };
    addr.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

/// Parse CIDR text into a network with host bits cleared.
pub fn parse_network(text: &str) -> Result<IpNet, NetworkParseError> {
    text.parse::<IpNet>()
        .map(|net| net.trunc())
        .map_err(|_| NetworkParseError { input: text.to_string() })
}

/// Host portion of a `host:port` peer endpoint.
///
/// Only the trailing `:port` is removed: `[::1]:8080` gives `::1`, and a bare
/// IPv6 literal such as `fe80::1` is returned untouched.
pub fn strip_port(endpoint: &str) -> &str {
    if let Some(rest) = endpoint.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, _)) => host,
            None => endpoint,
        };
    }

    match endpoint.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => endpoint,
    }
}

/// Candidate tokens of a forwarded-for value. Both the space-separated form
/// and the usual comma-separated proxy chain are accepted.
pub fn forwarded_tokens(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}
