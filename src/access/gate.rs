use std::iter;
use std::net::IpAddr;
use std::sync::Arc;

use super::acl::Allowlist;
use super::net::{forwarded_tokens, parse_address, strip_port};

/// Decides whether a request may trigger a migration, based on where it
/// claims to come from and where it actually came from.
#[derive(Debug, Clone)]
pub struct AccessGate {
    allowlist: Arc<Allowlist>,
}

impl AccessGate {
    pub fn new(allowlist: Arc<Allowlist>) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// Every forwarded-for token followed by the peer host. Unparseable
    /// entries are kept as `None`.
    pub fn candidates(forwarded_for: &str, peer_endpoint: &str) -> Vec<Option<IpAddr>> {
        forwarded_tokens(forwarded_for)
            .map(parse_address)
            .chain(iter::once(parse_address(strip_port(peer_endpoint))))
            .collect()
    }

    /// Allowed as soon as any candidate falls inside the allowlist.
    pub fn is_request_allowed(&self, forwarded_for: &str, peer_endpoint: &str) -> bool {
        let candidates = Self::candidates(forwarded_for, peer_endpoint);
        let allowed = candidates.iter().any(|ip| self.allowlist.is_allowed(*ip));

        if allowed {
            tracing::debug!(?candidates, "Access granted");
        } else {
            tracing::warn!(
                x_forwarded_for = forwarded_for,
                remote_addr = peer_endpoint,
                "Access forbidden"
            );
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(networks: &str) -> AccessGate {
        AccessGate::new(Arc::new(Allowlist::build(networks).unwrap()))
    }

    #[test]
    fn test_peer_alone_is_enough() {
        assert!(gate("127.0.0.0/8").is_request_allowed("", "127.0.0.1:54321"));
    }

    #[test]
    fn test_second_forwarded_token_matches() {
        assert!(gate("127.0.0.0/8").is_request_allowed("8.8.8.8 127.0.0.1", "9.9.9.9:1"));
    }

    #[test]
    fn test_comma_separated_chain_matches() {
        assert!(gate("10.0.0.0/8").is_request_allowed("203.0.113.9, 10.1.1.1", "9.9.9.9:1"));
    }

    #[test]
    fn test_no_candidate_matches() {
        assert!(!gate("127.0.0.0/8").is_request_allowed("8.8.8.8", "9.9.9.9:1"));
    }

    #[test]
    fn test_empty_allowlist_denies_everything() {
        let gate = gate("");
        assert!(!gate.is_request_allowed("", "127.0.0.1:1"));
        assert!(!gate.is_request_allowed("127.0.0.1 10.0.0.1", "[::1]:80"));
    }

    #[test]
    fn test_malformed_candidates_degrade_to_deny() {
        let gate = gate("127.0.0.0/8");
        assert!(!gate.is_request_allowed("garbage ::zz", "not-an-endpoint"));
        assert!(!gate.is_request_allowed("", ""));
    }

    #[test]
    fn test_malformed_tokens_do_not_hide_a_match() {
        assert!(gate("127.0.0.0/8").is_request_allowed("garbage 127.0.0.9", "nonsense"));
    }

    #[test]
    fn test_ipv6_peer_with_port() {
        let gate = gate("::1/128");
        assert!(gate.is_request_allowed("", "[::1]:40000"));
        assert!(!gate.is_request_allowed("", "[::2]:40000"));
    }

    #[test]
    fn test_scoped_ipv6_peer_and_token() {
        let gate = gate("fe80::/10");
        assert!(gate.is_request_allowed("", "[fe80::1%2]:4000"));
        assert!(gate.is_request_allowed("fe80::1%eth0", "9.9.9.9:1"));
        assert!(!gate.is_request_allowed("", "[fec0::1%2]:4000"));
    }

    #[test]
    fn test_decision_ignores_candidate_order() {
        let gate = gate("127.0.0.0/8");
        assert_eq!(
            gate.is_request_allowed("8.8.8.8 127.0.0.1", "9.9.9.9:1"),
            gate.is_request_allowed("127.0.0.1 8.8.8.8", "9.9.9.9:1"),
        );
        assert_eq!(
            gate.is_request_allowed("127.0.0.1", "9.9.9.9:1"),
            gate.is_request_allowed("9.9.9.9", "127.0.0.1:1"),
        );
    }

    #[test]
    fn test_candidates_include_peer_last() {
        let candidates = AccessGate::candidates("8.8.8.8 bogus", "127.0.0.1:80");
        let expected: Vec<Option<IpAddr>> = vec![
            Some("8.8.8.8".parse().unwrap()),
            None,
            Some("127.0.0.1".parse().unwrap()),
        ];
        assert_eq!(candidates, expected);
    }
}
