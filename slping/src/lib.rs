#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `slping` is a client for the Minecraft "Server List Ping" status protocol.
//! It resolves a logical server address through DNS-over-HTTPS (CNAME, then
//! SRV), performs the handshake/status/ping exchange over TCP and returns the
//! server's JSON status document.
//!
//! The main API surface is [`get_status`], which never fails: every problem is
//! reported through the returned [`QueryOutcome`].

#[macro_use]
extern crate tracing;

pub mod packet;
pub mod resolve;
pub mod session;
pub mod varint;
pub mod version;

mod query;

pub use packet::Packet;
pub use query::{QueryOutcome, StatusQuery, get_status};
pub use resolve::{DnsLookup, DohClient, Endpoint, RecordType, Resolution, Resolver, Strategy};
pub use session::{Session, Timeouts};

/// Errors that can occur while querying a server.
///
/// The `Display` text of each variant doubles as the user-visible failure
/// message of a [`QueryOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("address params not found")]
    MissingParameter,
    #[error("DNS resolve failed")]
    DnsLookupFailed,
    #[error("connection timed out")]
    ConnectTimeout,
    #[error("server response timed out")]
    ResponseTimeout,
    #[error("connection closed before a complete frame was received")]
    Truncated,
    #[error("invalid VarInt in server response")]
    InvalidVarInt,
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),
    #[error("unexpected packet id {0:#04x} in server response")]
    UnexpectedPacket(u32),
    #[error("server response is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("server response is not valid JSON: {0}")]
    JsonErr(#[from] serde_json::Error),
    #[error("an I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
    #[error("DNS-over-HTTPS request failed: {0}")]
    Doh(#[from] reqwest::Error),
}

/// The stage-level classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingParameter,
    DnsResolutionFailed,
    ConnectTimeout,
    ResponseTimeout,
    FramingError,
    ProtocolError,
    TransportError,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter => ErrorKind::MissingParameter,
            Self::DnsLookupFailed | Self::Doh(_) => ErrorKind::DnsResolutionFailed,
            Self::ConnectTimeout => ErrorKind::ConnectTimeout,
            Self::ResponseTimeout => ErrorKind::ResponseTimeout,
            Self::Truncated => ErrorKind::FramingError,
            Self::InvalidVarInt
            | Self::MalformedFrame(_)
            | Self::UnexpectedPacket(_)
            | Self::InvalidUtf8(_)
            | Self::JsonErr(_) => ErrorKind::ProtocolError,
            Self::IoError(_) => ErrorKind::TransportError,
        }
    }

    /// Maps an I/O error from a frame read, treating EOF as a truncated frame.
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::IoError(err)
        }
    }
}
