use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::proto::rr::rdata::SRV;

use super::address::HostPort;

/// One record from an SRV response, target exactly as the wire named it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvAnswer {
    pub target: String,
    pub port: u16,
}

/// DNS backend for SRV queries. Records are returned in response order.
pub trait SrvLookup {
    fn lookup_srv(&self, name: &str) -> impl Future<Output = Result<Vec<SrvAnswer>>> + Send;
}

/// SRV lookups through trust-dns, bypassing any local answer cache.
pub struct DnsSrvLookup {
    resolver: TokioAsyncResolver,
}

impl DnsSrvLookup {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut opts = ResolverOpts::default();
        opts.cache_size = 0;
        if let Some(timeout) = timeout {
            opts.timeout = timeout;
        }
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

impl SrvLookup for DnsSrvLookup {
    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvAnswer>> {
        let lookup = self.resolver.srv_lookup(name).await?;
        Ok(lookup.iter().map(SrvAnswer::from_record).collect())
    }
}

impl SrvAnswer {
    /// Keeps the target in ASCII (punycode) form, which is what gets connected to.
    fn from_record(srv: &SRV) -> Self {
        Self {
            target: srv.target().to_ascii(),
            port: srv.port(),
        }
    }
}

/// A `_service._proto` label pair prepended to the domain being discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServicePattern(String);

impl ServicePattern {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn query_name(&self, domain: &str) -> String {
        format!("{}.{}", self.0, domain)
    }

    pub fn defaults() -> Vec<ServicePattern> {
        ["_minecraft._tcp", "_mc._tcp", "_game._tcp"]
            .into_iter()
            .map(ServicePattern::new)
            .collect()
    }
}

impl fmt::Display for ServicePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered SRV discovery: the first pattern with a usable answer wins.
pub struct SrvDiscovery<L> {
    lookup: L,
    patterns: Vec<ServicePattern>,
}

impl<L: SrvLookup> SrvDiscovery<L> {
    pub fn new(lookup: L, patterns: Vec<ServicePattern>) -> Self {
        Self { lookup, patterns }
    }

    #[cfg(test)]
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Best effort: lookup failures only move on to the next pattern.
    pub async fn discover(&self, domain: &str) -> Option<(HostPort, &ServicePattern)> {
        for pattern in &self.patterns {
            let name = pattern.query_name(domain);
            let records = match self.lookup.lookup_srv(&name).await {
                Ok(records) => records,
                Err(e) => {
                    debug!("srv lookup {} failed: {}", name, e);
                    continue;
                }
            };
            // Priority and weight are ignored, the first record is taken as-is.
            let Some(first) = records.into_iter().next() else {
                debug!("srv lookup {} returned no records", name);
                continue;
            };
            let target = first.target.strip_suffix('.').unwrap_or(&first.target);
            if target.is_empty() || first.port == 0 {
                debug!("srv lookup {} returned unusable target {:?}:{}", name, first.target, first.port);
                continue;
            }
            return Some((HostPort::new(target, first.port), pattern));
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockSrv;
    use super::*;

    fn discovery(mock: MockSrv) -> SrvDiscovery<MockSrv> {
        SrvDiscovery::new(mock, ServicePattern::defaults())
    }

    #[tokio::test]
    async fn first_pattern_wins_and_stops() {
        let d = discovery(
            MockSrv::default()
                .answer("_minecraft._tcp.example.com", "mc.example.com.", 25570)
                .answer("_mc._tcp.example.com", "other.example.com.", 1),
        );
        let (hp, pattern) = d.discover("example.com").await.unwrap();
        assert_eq!(hp, HostPort::new("mc.example.com", 25570));
        assert_eq!(pattern.to_string(), "_minecraft._tcp");
        assert_eq!(d.lookup.queried(), vec!["_minecraft._tcp.example.com"]);
    }

    #[tokio::test]
    async fn second_pattern_answers_third_never_queried() {
        let d = discovery(MockSrv::default().answer("_mc._tcp.example.com", "node1.example.net.", 30001));
        let (hp, _) = d.discover("example.com").await.unwrap();
        assert_eq!(hp, HostPort::new("node1.example.net", 30001));
        assert_eq!(
            d.lookup.queried(),
            vec!["_minecraft._tcp.example.com", "_mc._tcp.example.com"]
        );
    }

    #[tokio::test]
    async fn errors_are_swallowed() {
        let d = discovery(
            MockSrv::default()
                .fail("_minecraft._tcp.example.com")
                .fail("_mc._tcp.example.com")
                .answer("_game._tcp.example.com", "game.example.com", 4000),
        );
        let (hp, _) = d.discover("example.com").await.unwrap();
        assert_eq!(hp, HostPort::new("game.example.com", 4000));
    }

    #[tokio::test]
    async fn nothing_answers() {
        let d = discovery(MockSrv::default().fail("_mc._tcp.example.com"));
        assert!(d.discover("example.com").await.is_none());
        assert_eq!(d.lookup.queried().len(), 3);
    }

    #[tokio::test]
    async fn only_first_record_is_used() {
        let d = discovery(
            MockSrv::default()
                .answer("_minecraft._tcp.example.com", "a.example.com.", 1000)
                .answer("_minecraft._tcp.example.com", "b.example.com.", 2000),
        );
        let (hp, _) = d.discover("example.com").await.unwrap();
        assert_eq!(hp, HostPort::new("a.example.com", 1000));
    }

    #[tokio::test]
    async fn root_target_is_not_usable() {
        let d = discovery(
            MockSrv::default()
                .answer("_minecraft._tcp.example.com", ".", 25565)
                .answer("_mc._tcp.example.com", "mc.example.com.", 25566),
        );
        let (hp, _) = d.discover("example.com").await.unwrap();
        assert_eq!(hp, HostPort::new("mc.example.com", 25566));
    }

    #[test]
    fn idn_targets_stay_punycode() {
        use trust_dns_resolver::proto::rr::Name;

        let srv = SRV::new(10, 5, 25565, Name::from_utf8("bücher.example.").unwrap());
        let answer = SrvAnswer::from_record(&srv);
        assert_eq!(answer.target, "xn--bcher-kva.example.");
        assert_eq!(answer.port, 25565);
    }

    #[test]
    fn patterns_deserialize_from_strings() {
        let patterns: Vec<ServicePattern> = serde_json::from_str(r#"["_minecraft._tcp"]"#).unwrap();
        assert_eq!(patterns[0].query_name("example.com"), "_minecraft._tcp.example.com");
    }
}
