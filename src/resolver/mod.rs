//! Turns a typed server address into a connection target.
//!
//! Parsing is pure. Only a bare domain name (no port, not an IP literal) reaches
//! DNS, where the SRV patterns are tried in order before falling back to
//! [`DEFAULT_PORT`].

pub mod address;
pub mod literal;
pub mod srv;

use std::fmt;

use tracing::debug;

pub use address::{AddressError, DEFAULT_PORT, HostPort, ParsedAddress};
pub use literal::is_literal_or_local;
pub use srv::{DnsSrvLookup, ServicePattern, SrvDiscovery, SrvLookup};

/// How a [`HostPort`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVia {
    Explicit,
    Literal,
    Srv(ServicePattern),
    Default,
}

impl ResolvedVia {
    pub fn label(&self) -> &'static str {
        match self {
            ResolvedVia::Explicit => "explicit",
            ResolvedVia::Literal => "literal",
            ResolvedVia::Srv(_) => "srv",
            ResolvedVia::Default => "default",
        }
    }
}

impl fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedVia::Srv(pattern) => write!(f, "srv ({})", pattern),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub target: HostPort,
    pub via: ResolvedVia,
}

/// Stateless orchestrator; safe to share between tasks.
pub struct Resolver<L> {
    discovery: SrvDiscovery<L>,
}

impl<L: SrvLookup> Resolver<L> {
    pub fn new(lookup: L, patterns: Vec<ServicePattern>) -> Self {
        Self {
            discovery: SrvDiscovery::new(lookup, patterns),
        }
    }

    pub async fn resolve(&self, raw: &str) -> Result<HostPort, AddressError> {
        self.resolve_detailed(raw).await.map(|r| r.target)
    }

    pub async fn resolve_detailed(&self, raw: &str) -> Result<Resolved, AddressError> {
        let host = match address::parse(raw)? {
            ParsedAddress::Explicit(target) => {
                return Ok(Resolved {
                    target,
                    via: ResolvedVia::Explicit,
                });
            }
            ParsedAddress::Bare(host) => host,
        };

        if is_literal_or_local(&host) {
            debug!("{} is a literal or local address, skipping srv", host);
            return Ok(Resolved {
                target: HostPort::new(host, DEFAULT_PORT),
                via: ResolvedVia::Literal,
            });
        }

        if let Some((target, pattern)) = self.discovery.discover(&host).await {
            debug!("{} resolved through {} to {}", host, pattern, target);
            return Ok(Resolved {
                target,
                via: ResolvedVia::Srv(pattern.clone()),
            });
        }

        debug!("no srv record for {}, using default port", host);
        Ok(Resolved {
            target: HostPort::new(host, DEFAULT_PORT),
            via: ResolvedVia::Default,
        })
    }
}
