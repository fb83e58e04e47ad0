//! Bolt connection targets
//!
//! Accepts the URI forms understood by Bolt drivers:
//! - `bolt://host:port` direct connection
//! - `neo4j://host:port` routing connection
//! - `+s` / `+ssc` suffixes for TLS (verified / self-signed)
//!
//! A bare `host[:port]` is treated as `bolt://`.

use crate::error::{ClientError, ClientResult};
use std::fmt;
use std::str::FromStr;

/// Default port for the Bolt protocol
pub const DEFAULT_BOLT_PORT: u16 = 7687;

/// URI scheme of a Bolt connection target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bolt,
    BoltSecure,
    BoltSelfSigned,
    Neo4j,
    Neo4jSecure,
    Neo4jSelfSigned,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Bolt => "bolt",
            Scheme::BoltSecure => "bolt+s",
            Scheme::BoltSelfSigned => "bolt+ssc",
            Scheme::Neo4j => "neo4j",
            Scheme::Neo4jSecure => "neo4j+s",
            Scheme::Neo4jSelfSigned => "neo4j+ssc",
        }
    }

    /// Whether the connection is wrapped in TLS
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Scheme::Bolt | Scheme::Neo4j)
    }

    /// Whether the driver should use cluster routing
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            Scheme::Neo4j | Scheme::Neo4jSecure | Scheme::Neo4jSelfSigned
        )
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bolt" => Ok(Scheme::Bolt),
            "bolt+s" => Ok(Scheme::BoltSecure),
            "bolt+ssc" => Ok(Scheme::BoltSelfSigned),
            "neo4j" => Ok(Scheme::Neo4j),
            "neo4j+s" => Ok(Scheme::Neo4jSecure),
            "neo4j+ssc" => Ok(Scheme::Neo4jSelfSigned),
            other => Err(format!("unsupported scheme '{}'", other)),
        }
    }
}

/// Parsed `scheme://host:port` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltAddress {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl BoltAddress {
    pub fn parse(input: &str) -> ClientResult<Self> {
        input.parse()
    }

    /// `host:port`, with IPv6 hosts bracketed
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for BoltAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.authority())
    }
}

impl FromStr for BoltAddress {
    type Err = ClientError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ClientError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("address is empty"));
        }

        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme.parse::<Scheme>().map_err(|e| invalid(&e))?, rest),
            None => (Scheme::Bolt, trimmed),
        };

        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.contains(['/', '?', '#']) {
            return Err(invalid("unexpected path or query component"));
        }
        if rest.contains(['<', '>']) {
            return Err(invalid("address still contains a template placeholder"));
        }
        if rest.contains('@') {
            return Err(invalid("credentials must not be embedded in the address"));
        }

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unterminated IPv6 literal"))?;
            let port = match after {
                "" => None,
                p => Some(
                    p.strip_prefix(':')
                        .ok_or_else(|| invalid("expected ':' after IPv6 literal"))?,
                ),
            };
            (host, port)
        } else {
            match rest.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(invalid("host contains whitespace"));
        }

        let port = match port {
            None => DEFAULT_BOLT_PORT,
            Some(p) => match p.parse::<u16>() {
                Ok(0) => return Err(invalid("port must be non-zero")),
                Ok(port) => port,
                Err(_) => return Err(invalid("port is not a number between 1 and 65535")),
            },
        };

        Ok(BoltAddress {
            scheme,
            host: host.to_string(),
            port,
        })
    }
}
