use serde::Deserialize;
use slping::{version, StatusQuery, Timeouts};

/// Query string of a status request: `?address=<host>&port=<port>&version=<token>`.
///
/// Everything is taken as text so that malformed values produce a failed
/// outcome rather than a rejected request.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StatusParams {
    pub address: Option<String>,
    pub port: Option<String>,
    pub version: Option<String>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid port")]
    InvalidPort,
    #[error("unknown protocol version")]
    UnknownVersion,
}

impl StatusParams {
    pub fn into_query(self, timeouts: Timeouts) -> Result<StatusQuery, ParamError> {
        let port = match self.port.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(port) => Some(port.parse().map_err(|_| ParamError::InvalidPort)?),
        };
        let protocol_version = match self.version.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => Some(version::protocol_number(token).ok_or(ParamError::UnknownVersion)?),
        };
        Ok(StatusQuery {
            hostname: self.address.map(|address| address.trim().to_owned()),
            port,
            protocol_version,
            timeouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(address: Option<&str>, port: Option<&str>, version: Option<&str>) -> StatusParams {
        StatusParams {
            address: address.map(str::to_owned),
            port: port.map(str::to_owned),
            version: version.map(str::to_owned),
        }
    }

    #[test]
    fn defaults_are_left_to_the_library() {
        let query = params(Some("mc.example.com"), None, None)
            .into_query(Timeouts::default())
            .unwrap();
        assert_eq!(query.hostname.as_deref(), Some("mc.example.com"));
        assert_eq!(query.port, None);
        assert_eq!(query.protocol_version, None);
    }

    #[test]
    fn port_and_version_are_parsed() {
        let query = params(Some("mc.example.com"), Some("25570"), Some("1.8.9"))
            .into_query(Timeouts::default())
            .unwrap();
        assert_eq!(query.port, Some(25570));
        assert_eq!(query.protocol_version, Some(47));
    }

    #[test]
    fn invalid_port() {
        for port in ["abc", "70000", "-1"] {
            assert_eq!(
                params(Some("mc.example.com"), Some(port), None).into_query(Timeouts::default()),
                Err(ParamError::InvalidPort)
            );
        }
    }

    #[test]
    fn unknown_version() {
        assert_eq!(
            params(Some("mc.example.com"), None, Some("beta")).into_query(Timeouts::default()),
            Err(ParamError::UnknownVersion)
        );
    }
}
