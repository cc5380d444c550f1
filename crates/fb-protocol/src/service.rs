//! Service manager buffers.
//!
//! The service manager takes a service parameter buffer (SPB) on attach and
//! reports progress through info responses. A response is a list of items,
//! each a one-byte tag followed (for data items) by a two-byte
//! little-endian length and the data.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{clumplet_len, read_vax_bytes, write_clumplet};
use crate::consts::{
    ISC_INFO_DATA_NOT_READY, ISC_INFO_END, ISC_INFO_SVC_LINE, ISC_INFO_SVC_TIMEOUT,
    ISC_INFO_SVC_TO_EOF, ISC_INFO_TRUNCATED, ISC_SPB_CURRENT_VERSION, ISC_SPB_PASSWORD,
    ISC_SPB_USER_NAME, ISC_SPB_VERSION,
};
use crate::error::ProtocolError;

/// Service attach parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Spb {
    /// User name.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl Spb {
    /// Create an SPB carrying only the version header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user name.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Exact number of bytes [`encode`](Self::encode) will produce.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        2 + [&self.user, &self.password]
            .iter()
            .filter_map(|v| v.as_deref())
            .map(|v| clumplet_len(v.as_bytes()))
            .sum::<usize>()
    }

    /// Encode the SPB.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(ISC_SPB_VERSION);
        buf.put_u8(ISC_SPB_CURRENT_VERSION);
        if let Some(user) = &self.user {
            write_clumplet(&mut buf, ISC_SPB_USER_NAME, user.as_bytes())?;
        }
        if let Some(password) = &self.password {
            write_clumplet(&mut buf, ISC_SPB_PASSWORD, password.as_bytes())?;
        }
        Ok(buf.freeze())
    }
}

/// Request items sent with every output query.
pub const OUTPUT_REQUEST: [u8; 1] = [ISC_INFO_SVC_TO_EOF];

/// Parsed service query response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResponse {
    /// Output bytes from every data item, in order.
    pub output: Vec<u8>,
    /// The response did not fit the buffer.
    pub truncated: bool,
    /// The service had no output ready.
    pub data_not_ready: bool,
    /// The service reported a query timeout.
    pub timed_out: bool,
}

impl QueryResponse {
    /// Parse a response buffer.
    ///
    /// Parsing stops at `isc_info_end` or at zero padding.
    pub fn parse(mut src: &[u8]) -> Result<Self, ProtocolError> {
        let mut response = Self::default();

        while src.has_remaining() {
            match src.get_u8() {
                0 | ISC_INFO_END => break,
                ISC_INFO_SVC_TO_EOF | ISC_INFO_SVC_LINE => {
                    let chunk = read_vax_bytes(&mut src)?;
                    response.output.extend_from_slice(&chunk);
                }
                ISC_INFO_TRUNCATED => response.truncated = true,
                ISC_INFO_DATA_NOT_READY => response.data_not_ready = true,
                ISC_INFO_SVC_TIMEOUT => response.timed_out = true,
                other => return Err(ProtocolError::UnknownItem(other)),
            }
        }

        Ok(response)
    }

    /// Whether the caller should sleep and query again.
    #[must_use]
    pub fn needs_retry(&self) -> bool {
        self.truncated || self.data_not_ready
    }

    /// Output decoded as text, lossy on invalid UTF-8.
    #[must_use]
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}
