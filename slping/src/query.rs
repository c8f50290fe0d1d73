//! Resolve, connect, exchange, close: one status query from start to finish.

use serde::Serialize;
use serde_json::Value;

use crate::{DnsLookup, Error, Resolver, Session, Timeouts, resolve::DEFAULT_PORT, version};

/// Parameters of one status query.
///
/// # Examples
///
/// ```
/// use slping::StatusQuery;
///
/// let query = StatusQuery {
///     hostname: Some("mc.hypixel.net".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(query.protocol_version, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusQuery {
    /// The logical server address, without a port.
    pub hostname: Option<String>,
    /// Port to use when the address resolves through a CNAME. SRV records
    /// always supply their own.
    pub port: Option<u16>,
    /// Protocol number announced in the handshake; [`version::LATEST`] if unset.
    pub protocol_version: Option<u32>,
    pub timeouts: Timeouts,
}

/// The terminal result of a query. Every query produces exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl QueryOutcome {
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// A successful outcome, named after the address and port the caller asked for.
    #[must_use]
    pub fn connected(hostname: &str, port: u16, data: Value) -> Self {
        Self {
            success: true,
            message: format!("{hostname}:{port} connected"),
            data: Some(data),
        }
    }
}

impl From<Error> for QueryOutcome {
    fn from(error: Error) -> Self {
        Self::failure(error.to_string())
    }
}

/// Queries a server's status.
///
/// Every failure, from a missing hostname to a malformed response, is folded
/// into an unsuccessful [`QueryOutcome`] whose message names the failing stage.
///
/// # Examples
///
/// ```no_run
/// # async {
/// use slping::{DohClient, Resolver, StatusQuery};
///
/// let resolver = Resolver::new(DohClient::cloudflare(reqwest::Client::new()));
/// let outcome = slping::get_status(&resolver, StatusQuery {
///     hostname: Some("mc.hypixel.net".into()),
///     ..Default::default()
/// }).await;
/// println!("{}", outcome.message);
/// # };
/// ```
pub async fn get_status<L: DnsLookup + Sync>(
    resolver: &Resolver<L>,
    query: StatusQuery,
) -> QueryOutcome {
    let requested = query.hostname.clone().unwrap_or_default();
    let port = query.port.unwrap_or(DEFAULT_PORT);
    match run(resolver, query).await {
        Ok(data) => QueryOutcome::connected(&requested, port, data),
        Err(error) => {
            debug!(%error, kind = ?error.kind(), "status query failed");
            error.into()
        }
    }
}

async fn run<L: DnsLookup + Sync>(
    resolver: &Resolver<L>,
    query: StatusQuery,
) -> Result<Value, Error> {
    let hostname = query
        .hostname
        .filter(|hostname| !hostname.is_empty())
        .ok_or(Error::MissingParameter)?;
    let resolution = resolver
        .resolve(&hostname, query.port)
        .await
        .ok_or(Error::DnsLookupFailed)?;
    let endpoint = &resolution.endpoint;
    let timeouts = query.timeouts;

    let mut session = Session::connect(endpoint, timeouts.connect).await?;
    let result = exchange(
        &mut session,
        query.protocol_version.unwrap_or(version::LATEST),
        resolution.server_address(&hostname),
        endpoint.port,
        timeouts,
    )
    .await;
    session.close().await;

    result
}

async fn exchange(
    session: &mut Session,
    protocol_version: u32,
    server_address: &str,
    server_port: u16,
    timeouts: Timeouts,
) -> Result<Value, Error> {
    session
        .handshake(
            protocol_version,
            server_address,
            server_port,
            timeouts.write_pause,
        )
        .await?;
    session.read_status(timeouts.response).await
}
