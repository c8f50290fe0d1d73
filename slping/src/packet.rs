//! Length-prefixed framing and the Server List Ping packets.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Error, varint};

/// Largest body a three-byte length prefix can describe.
pub const MAX_FRAME_LEN: usize = 2_097_151;

/// The `next_state` value that asks the server for its status.
pub const STATE_STATUS: u32 = 1;

/// Wraps a packet ID and payload into `length ++ packet_id ++ payload`.
#[must_use]
pub fn build_frame(packet_id: u32, payload: &[u8]) -> Vec<u8> {
    let body_len = varint::encoded_len(packet_id) + payload.len();
    #[allow(clippy::cast_possible_truncation)]
    let length = body_len as u32;
    let mut frame = Vec::with_capacity(varint::encoded_len(length) + body_len);
    varint::encode(length, &mut frame);
    varint::encode(packet_id, &mut frame);
    frame.extend_from_slice(payload);
    frame
}

/// Reads one complete frame, returning `(packet_id, payload)`.
///
/// Waits until the whole declared body has arrived; a short frame is never
/// returned.
///
/// # Errors
/// [`Error::Truncated`] if the stream closes before the frame is complete and
/// [`Error::MalformedFrame`] for empty or oversized frames.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(u32, Vec<u8>), Error> {
    let (length, _) = varint::read(reader).await?;
    let length = length as usize;
    if length == 0 {
        return Err(Error::MalformedFrame("empty frame"));
    }
    if length > MAX_FRAME_LEN {
        return Err(Error::MalformedFrame("frame exceeds maximum length"));
    }

    let mut body = vec![0; length];
    reader.read_exact(&mut body).await.map_err(Error::from_read)?;

    let (packet_id, id_len) = varint::decode(&body).map_err(|e| match e {
        Error::Truncated => Error::MalformedFrame("packet id runs past the frame"),
        other => other,
    })?;
    body.drain(..id_len);
    Ok((packet_id, body))
}

/// A Server List Ping packet, in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Handshake {
        version: u32,
        host: String,
        port: u16,
        next_state: u32,
    },
    Request,
    Ping {
        payload: i64,
    },
    Response {
        response: String,
    },
    Pong {
        payload: i64,
    },
}

impl Packet {
    #[must_use]
    pub const fn id(&self) -> u32 {
        match self {
            Self::Handshake { .. } | Self::Request | Self::Response { .. } => 0x00,
            Self::Ping { .. } | Self::Pong { .. } => 0x01,
        }
    }

    /// The packet body after the packet ID.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Handshake {
                version,
                host,
                port,
                next_state,
            } => {
                #[allow(clippy::cast_possible_truncation)]
                let host_len = host.len() as u32;
                varint::encode(*version, &mut buf);
                varint::encode(host_len, &mut buf);
                buf.extend_from_slice(host.as_bytes());
                buf.extend_from_slice(&port.to_be_bytes());
                varint::encode(*next_state, &mut buf);
            }
            Self::Request => {}
            Self::Ping { payload } | Self::Pong { payload } => {
                buf.extend_from_slice(&payload.to_be_bytes());
            }
            Self::Response { response } => {
                #[allow(clippy::cast_possible_truncation)]
                let response_len = response.len() as u32;
                varint::encode(response_len, &mut buf);
                buf.extend_from_slice(response.as_bytes());
            }
        }
        buf
    }

    /// The complete length-prefixed frame for this packet.
    #[must_use]
    pub fn to_frame(&self) -> Vec<u8> {
        build_frame(self.id(), &self.payload())
    }

    /// Interprets a frame received from a server in the status state.
    ///
    /// # Errors
    /// [`Error::UnexpectedPacket`] for IDs other than response and pong, and a
    /// protocol error if the payload does not match the packet layout.
    pub fn decode_clientbound(packet_id: u32, payload: &[u8]) -> Result<Self, Error> {
        match packet_id {
            0x00 => {
                let mut rest = payload;
                let json_len = varint::take(&mut rest).map_err(|e| match e {
                    Error::Truncated => Error::MalformedFrame("missing response length"),
                    other => other,
                })? as usize;
                if json_len > rest.len() {
                    return Err(Error::MalformedFrame("response length exceeds frame"));
                }
                let response = String::from_utf8(rest[..json_len].to_vec())?;
                Ok(Self::Response { response })
            }
            0x01 => {
                let bytes: [u8; 8] = payload
                    .get(..8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(Error::MalformedFrame("pong payload is not a long"))?;
                Ok(Self::Pong {
                    payload: i64::from_be_bytes(bytes),
                })
            }
            other => Err(Error::UnexpectedPacket(other)),
        }
    }
}
