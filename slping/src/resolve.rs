//! Turns a logical server address into a connectable endpoint.
//!
//! Resolution walks an ordered chain of [`Strategy`] values, each backed by a
//! single DNS-over-HTTPS lookup, and the first one that yields an endpoint
//! wins. There is no caching and no retry; a lookup that fails is treated the
//! same as a lookup with no answer.

use std::{fmt, future::Future};

use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;

use crate::Error;

/// The port Java servers listen on unless told otherwise.
pub const DEFAULT_PORT: u16 = 25565;

/// Cloudflare's DNS-over-HTTPS JSON endpoint.
pub const CLOUDFLARE_DOH: &str = "https://cloudflare-dns.com/dns-query";

const DNS_JSON: &str = "application/dns-json";

/// A concrete connection target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// The DNS record types the resolver asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Cname,
    Srv,
}

impl RecordType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cname => "CNAME",
            Self::Srv => "SRV",
        }
    }

    /// The numeric RR type, as it appears in the `type` field of an answer.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Cname => 5,
            Self::Srv => 33,
        }
    }
}

/// A source of DNS answers.
pub trait DnsLookup {
    /// Returns the `data` of the first answer of type `record` for `name`, if any.
    fn first_answer(
        &self,
        name: &str,
        record: RecordType,
    ) -> impl Future<Output = Result<Option<String>, Error>> + Send;
}

/// A DNS-over-HTTPS client speaking the JSON API
/// (`GET <url>?name=<name>&type=<type>` with `Accept: application/dns-json`).
#[derive(Debug, Clone)]
pub struct DohClient {
    http: Client,
    url: String,
}

impl DohClient {
    #[must_use]
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn cloudflare(http: Client) -> Self {
        Self::new(http, CLOUDFLARE_DOH)
    }
}

impl DnsLookup for DohClient {
    async fn first_answer(&self, name: &str, record: RecordType) -> Result<Option<String>, Error> {
        let response: DohResponse = self
            .http
            .get(&self.url)
            .query(&[("name", name), ("type", record.as_str())])
            .header(ACCEPT, DNS_JSON)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        trace!(name, record = record.as_str(), status = response.status, "DoH response");
        Ok(response.first_answer(record))
    }
}

/// The body of a DNS-over-HTTPS JSON response. Only the fields the resolver
/// reads are kept.
#[derive(Debug, Deserialize)]
pub struct DohResponse {
    #[serde(rename = "Status")]
    pub status: u32,
    #[serde(rename = "Answer", default)]
    pub answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
pub struct DohAnswer {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: u16,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    pub data: String,
}

impl DohResponse {
    /// The first answer of the requested type; a CNAME chased inside an SRV
    /// answer set is skipped.
    #[must_use]
    pub fn first_answer(self, record: RecordType) -> Option<String> {
        self.answer
            .into_iter()
            .find(|answer| answer.record_type == record.code())
            .map(|answer| answer.data)
    }
}

/// One step of the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Follow a CNAME alias, keeping the caller's port.
    Cname,
    /// Use `_minecraft._tcp.<host>`, taking both target and port from the record.
    Srv,
}

impl Strategy {
    /// CNAME before SRV.
    pub const CHAIN: [Self; 2] = [Self::Cname, Self::Srv];

    const fn record_type(self) -> RecordType {
        match self {
            Self::Cname => RecordType::Cname,
            Self::Srv => RecordType::Srv,
        }
    }

    fn query_name(self, hostname: &str) -> String {
        match self {
            Self::Cname => hostname.to_string(),
            Self::Srv => format!("_minecraft._tcp.{hostname}"),
        }
    }

    /// Builds an endpoint from the answer data of this strategy's record.
    #[must_use]
    pub fn endpoint(self, data: &str, port: Option<u16>) -> Option<Endpoint> {
        match self {
            Self::Cname => {
                let hostname = strip_root(data);
                if hostname.is_empty() {
                    return None;
                }
                Some(Endpoint {
                    hostname: hostname.to_string(),
                    port: port.unwrap_or(DEFAULT_PORT),
                })
            }
            Self::Srv => parse_srv(data),
        }
    }

    async fn attempt<L: DnsLookup + Sync>(
        self,
        lookup: &L,
        hostname: &str,
        port: Option<u16>,
    ) -> Option<Endpoint> {
        let name = self.query_name(hostname);
        let record = self.record_type();
        match lookup.first_answer(&name, record).await {
            Ok(Some(data)) => {
                let endpoint = self.endpoint(&data, port);
                debug!(%name, record = record.as_str(), %data, ?endpoint, "DNS answer");
                endpoint
            }
            Ok(None) => {
                debug!(%name, record = record.as_str(), "no DNS answer");
                None
            }
            Err(error) => {
                debug!(%name, record = record.as_str(), %error, "DNS lookup failed");
                None
            }
        }
    }
}

/// `priority weight port target`, e.g. `0 5 25566 mc.example.net.`
fn parse_srv(data: &str) -> Option<Endpoint> {
    let fields: Vec<&str> = data.split_whitespace().collect();
    let [_priority, _weight, port, target] = fields.as_slice() else {
        return None;
    };
    let hostname = strip_root(target);
    // a target of "." means the service is decidedly not available
    if hostname.is_empty() {
        return None;
    }
    Some(Endpoint {
        hostname: hostname.to_string(),
        port: port.parse().ok()?,
    })
}

fn strip_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// A resolved endpoint and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub endpoint: Endpoint,
    pub strategy: Strategy,
}

impl Resolution {
    /// The hostname to announce in the handshake.
    ///
    /// An SRV record only redirects the transport, so the requested name is
    /// announced; a CNAME alias replaces the name and is announced itself.
    #[must_use]
    pub fn server_address<'a>(&'a self, requested: &'a str) -> &'a str {
        match self.strategy {
            Strategy::Cname => &self.endpoint.hostname,
            Strategy::Srv => requested,
        }
    }
}

/// Resolves hostnames by trying each strategy of its chain in order.
#[derive(Debug, Clone)]
pub struct Resolver<L> {
    lookup: L,
    chain: Vec<Strategy>,
}

impl<L: DnsLookup + Sync> Resolver<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_chain(lookup, Strategy::CHAIN.to_vec())
    }

    pub const fn with_chain(lookup: L, chain: Vec<Strategy>) -> Self {
        Self { lookup, chain }
    }

    /// Returns the first endpoint any strategy produces, or `None` if the
    /// whole chain comes up empty.
    pub async fn resolve(&self, hostname: &str, port: Option<u16>) -> Option<Resolution> {
        for &strategy in &self.chain {
            if let Some(endpoint) = strategy.attempt(&self.lookup, hostname, port).await {
                return Some(Resolution { endpoint, strategy });
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    /// In-memory answers keyed by `(name, record type)`.
    #[derive(Default)]
    pub struct StaticLookup {
        answers: HashMap<(String, RecordType), String>,
        failing: Vec<RecordType>,
        pub calls: AtomicUsize,
    }

    impl StaticLookup {
        pub fn with(mut self, name: &str, record: RecordType, data: &str) -> Self {
            self.answers
                .insert((name.to_string(), record), data.to_string());
            self
        }

        pub fn failing(mut self, record: RecordType) -> Self {
            self.failing.push(record);
            self
        }
    }

    impl DnsLookup for StaticLookup {
        async fn first_answer(
            &self,
            name: &str,
            record: RecordType,
        ) -> Result<Option<String>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&record) {
                return Err(Error::IoError(std::io::Error::other("lookup failed")));
            }
            Ok(self.answers.get(&(name.to_string(), record)).cloned())
        }
    }

    #[tokio::test]
    async fn cname_wins_over_srv() {
        let lookup = StaticLookup::default()
            .with("play.example.com", RecordType::Cname, "edge.example.net.")
            .with(
                "_minecraft._tcp.play.example.com",
                RecordType::Srv,
                "0 0 25566 mc.example.net.",
            );
        let resolution = Resolver::new(lookup)
            .resolve("play.example.com", Some(25570))
            .await
            .unwrap();
        assert_eq!(resolution.strategy, Strategy::Cname);
        assert_eq!(
            resolution.endpoint,
            Endpoint {
                hostname: "edge.example.net".to_string(),
                port: 25570,
            }
        );
        assert_eq!(
            resolution.server_address("play.example.com"),
            "edge.example.net"
        );
    }

    #[tokio::test]
    async fn cname_without_port_uses_default() {
        let lookup =
            StaticLookup::default().with("play.example.com", RecordType::Cname, "edge.example.net");
        let resolution = Resolver::new(lookup)
            .resolve("play.example.com", None)
            .await
            .unwrap();
        assert_eq!(resolution.endpoint.port, DEFAULT_PORT);
        assert_eq!(resolution.endpoint.hostname, "edge.example.net");
    }

    #[tokio::test]
    async fn srv_overrides_explicit_port() {
        let lookup = StaticLookup::default().with(
            "_minecraft._tcp.play.example.com",
            RecordType::Srv,
            "0 0 25566 mc.example.net.",
        );
        let resolution = Resolver::new(lookup)
            .resolve("play.example.com", Some(1234))
            .await
            .unwrap();
        assert_eq!(resolution.strategy, Strategy::Srv);
        assert_eq!(
            resolution.endpoint,
            Endpoint {
                hostname: "mc.example.net".to_string(),
                port: 25566,
            }
        );
        assert_eq!(
            resolution.server_address("play.example.com"),
            "play.example.com"
        );
    }

    #[tokio::test]
    async fn failed_lookup_falls_through() {
        let lookup = StaticLookup::default()
            .failing(RecordType::Cname)
            .with(
                "_minecraft._tcp.play.example.com",
                RecordType::Srv,
                "5 10 25566 mc.example.net.",
            );
        let resolution = Resolver::new(lookup)
            .resolve("play.example.com", None)
            .await
            .unwrap();
        assert_eq!(resolution.endpoint.port, 25566);
    }

    #[tokio::test]
    async fn nothing_found() {
        let resolver = Resolver::new(StaticLookup::default());
        assert!(resolver.resolve("play.example.com", None).await.is_none());
        assert_eq!(resolver.lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn chain_order_is_respected() {
        let lookup = StaticLookup::default()
            .with("play.example.com", RecordType::Cname, "edge.example.net.")
            .with(
                "_minecraft._tcp.play.example.com",
                RecordType::Srv,
                "0 0 25566 mc.example.net.",
            );
        let resolver = Resolver::with_chain(lookup, vec![Strategy::Srv, Strategy::Cname]);
        let resolution = resolver.resolve("play.example.com", None).await.unwrap();
        assert_eq!(resolution.strategy, Strategy::Srv);
        assert_eq!(resolver.lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn srv_parsing() {
        assert_eq!(
            parse_srv("0 0 25566 mc.example.net."),
            Some(Endpoint {
                hostname: "mc.example.net".to_string(),
                port: 25566,
            })
        );
        assert_eq!(parse_srv("0 0 25566 ."), None);
        assert_eq!(parse_srv("0 0 notaport mc.example.net."), None);
        assert_eq!(parse_srv("0 25566 mc.example.net."), None);
    }

    #[test]
    fn doh_answer_selection() {
        let body = r#"{
            "Status": 0, "TC": false, "RD": true, "RA": true, "AD": false, "CD": false,
            "Question": [{"name": "_minecraft._tcp.play.example.com", "type": 33}],
            "Answer": [
                {"name": "_minecraft._tcp.play.example.com", "type": 5, "TTL": 300, "data": "srv.example.net."},
                {"name": "srv.example.net", "type": 33, "TTL": 300, "data": "0 0 25566 mc.example.net."}
            ]
        }"#;
        let response: DohResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.first_answer(RecordType::Srv).as_deref(),
            Some("0 0 25566 mc.example.net.")
        );
    }

    #[test]
    fn doh_without_answers() {
        let body = r#"{"Status": 3, "TC": false, "RD": true, "RA": true, "AD": false, "CD": false,
            "Question": [{"name": "nope.example.com", "type": 5}]}"#;
        let response: DohResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_answer(RecordType::Cname), None);
    }
}
