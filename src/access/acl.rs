use ipnet::IpNet;
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

use super::net::{parse_network, NetworkParseError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowlistError {
    #[error("allowed network #{index} is malformed: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: NetworkParseError,
    },
}

/// Networks permitted to trigger migrations. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    networks: Vec<IpNet>,
}

impl Allowlist {
    /// Build from comma-separated CIDR text. Segments are not trimmed.
    ///
    /// An empty string gives an empty allowlist (nothing is allowed). Any
    /// malformed segment rejects the whole list.
    pub fn build(config_text: &str) -> Result<Self, AllowlistError> {
        if config_text.is_empty() {
            return Ok(Self::default());
        }

        let networks = config_text
            .split(',')
            .enumerate()
            .map(|(index, segment)| {
                parse_network(segment)
                    .map_err(|source| AllowlistError::InvalidEntry { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { networks })
    }

    /// `true` iff `ip` lies inside at least one network. Unparseable
    /// candidates and family mismatches never match.
    pub fn is_allowed(&self, ip: Option<IpAddr>) -> bool {
        let Some(ip) = ip else {
            return false;
        };
        self.networks.iter().any(|net| net.contains(&ip))
    }

    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl fmt::Display for Allowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, net) in self.networks.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", net)?;
        }
        Ok(())
    }
}
