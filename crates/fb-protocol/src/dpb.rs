//! Database parameter buffer (DPB) encoding.
//!
//! The DPB is the option block handed to `isc_attach_database`. It starts
//! with the version byte [`ISC_DPB_VERSION1`] and is followed by one
//! clumplet per option that was actually supplied. Absent options add no
//! bytes.
//!
//! Encoding is two-pass: [`Dpb::encoded_len`] computes the exact size,
//! [`Dpb::encode`] allocates once and writes. Both passes must agree.
//!
//! ## Layout
//!
//! ```text
//! version(1)
//! user          28 len bytes
//! password      29 len bytes
//! damaged       17 flag            (no length byte)
//! force_write   24 policy          (no length byte)
//! lc_ctype      48 len bytes
//! lc_messages   47 len bytes
//! num_buffers    5 count           (no length byte)
//! sys_user_name 19 len bytes
//! sql_role_name 60 len bytes
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{clumplet_len, write_clumplet, write_tagged_byte};
use crate::consts::{
    ISC_DPB_DAMAGED, ISC_DPB_FORCE_WRITE, ISC_DPB_LC_CTYPE, ISC_DPB_LC_MESSAGES,
    ISC_DPB_NUM_BUFFERS, ISC_DPB_PASSWORD, ISC_DPB_SQL_ROLE_NAME, ISC_DPB_SYS_USER_NAME,
    ISC_DPB_USER_NAME, ISC_DPB_VERSION1,
};
use crate::error::ProtocolError;

/// Forced-write policy for a database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WritePolicy {
    /// Writes are buffered by the operating system.
    Async = 0,
    /// Writes are forced to disk before the server continues.
    Sync = 1,
}

impl WritePolicy {
    /// Wire value of the policy.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a policy from a wire value.
    #[must_use]
    pub const fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Async),
            1 => Some(Self::Sync),
            _ => None,
        }
    }
}

/// Attach options, encodable as a DPB.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Dpb {
    /// User name.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Mark the database as damaged.
    pub damaged: Option<bool>,
    /// Forced-write policy.
    pub write_policy: Option<WritePolicy>,
    /// Connection character set.
    pub charset: Option<String>,
    /// Message file locale.
    pub message_file: Option<String>,
    /// Number of cache buffers.
    pub num_buffers: Option<u8>,
    /// DBA / system user name.
    pub dba_user: Option<String>,
    /// SQL role to assume.
    pub role: Option<String>,
}

impl Dpb {
    /// Create an empty DPB (encodes to the version byte only).
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

    /// Set the damaged flag.
    #[must_use]
    pub fn with_damaged(mut self, damaged: bool) -> Self {
        self.damaged = Some(damaged);
        self
    }

    /// Set the forced-write policy.
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = Some(policy);
        self
    }

    /// Set the connection character set.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Set the message file locale.
    #[must_use]
    pub fn with_message_file(mut self, message_file: impl Into<String>) -> Self {
        self.message_file = Some(message_file.into());
        self
    }

    /// Set the number of cache buffers.
    #[must_use]
    pub fn with_num_buffers(mut self, buffers: u8) -> Self {
        self.num_buffers = Some(buffers);
        self
    }

    /// Set the DBA / system user name.
    #[must_use]
    pub fn with_dba_user(mut self, user: impl Into<String>) -> Self {
        self.dba_user = Some(user.into());
        self
    }

    /// Set the SQL role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Exact number of bytes [`encode`](Self::encode) will produce.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let strings = [
            &self.user,
            &self.password,
            &self.charset,
            &self.message_file,
            &self.dba_user,
            &self.role,
        ];
        let string_len: usize = strings
            .iter()
            .filter_map(|value| value.as_deref())
            .map(|value| clumplet_len(value.as_bytes()))
            .sum();

        let flags = [
            self.damaged.is_some(),
            self.write_policy.is_some(),
            self.num_buffers.is_some(),
        ];
        let flag_len = flags.iter().filter(|present| **present).count() * 2;

        1 + string_len + flag_len
    }

    /// Encode the DPB.
    ///
    /// Fails when a string option is longer than 255 bytes.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let len = self.encoded_len();
        let mut buf = BytesMut::with_capacity(len);

        buf.put_u8(ISC_DPB_VERSION1);

        if let Some(user) = &self.user {
            write_clumplet(&mut buf, ISC_DPB_USER_NAME, user.as_bytes())?;
        }
        if let Some(password) = &self.password {
            write_clumplet(&mut buf, ISC_DPB_PASSWORD, password.as_bytes())?;
        }
        if let Some(damaged) = self.damaged {
            write_tagged_byte(&mut buf, ISC_DPB_DAMAGED, u8::from(damaged));
        }
        if let Some(policy) = self.write_policy {
            write_tagged_byte(&mut buf, ISC_DPB_FORCE_WRITE, policy.as_byte());
        }
        if let Some(charset) = &self.charset {
            write_clumplet(&mut buf, ISC_DPB_LC_CTYPE, charset.as_bytes())?;
        }
        if let Some(message_file) = &self.message_file {
            write_clumplet(&mut buf, ISC_DPB_LC_MESSAGES, message_file.as_bytes())?;
        }
        if let Some(buffers) = self.num_buffers {
            write_tagged_byte(&mut buf, ISC_DPB_NUM_BUFFERS, buffers);
        }
        if let Some(dba_user) = &self.dba_user {
            write_clumplet(&mut buf, ISC_DPB_SYS_USER_NAME, dba_user.as_bytes())?;
        }
        if let Some(role) = &self.role {
            write_clumplet(&mut buf, ISC_DPB_SQL_ROLE_NAME, role.as_bytes())?;
        }

        debug_assert_eq!(buf.len(), len, "DPB length pass disagrees with writer");
        Ok(buf.freeze())
    }

    /// Decode a DPB produced by [`encode`](Self::encode).
    ///
    /// Tags outside the set this type writes are rejected with
    /// [`ProtocolError::UnknownItem`]. A repeated tag overwrites the earlier
    /// value, as the server does.
    pub fn decode(mut src: &[u8]) -> Result<Self, ProtocolError> {
        if !src.has_remaining() {
            return Err(ProtocolError::UnexpectedEof);
        }
        let version = src.get_u8();
        if version != ISC_DPB_VERSION1 {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let mut dpb = Self::new();
        while src.has_remaining() {
            let tag = src.get_u8();
            match tag {
                ISC_DPB_DAMAGED => dpb.damaged = Some(read_byte(&mut src)? != 0),
                ISC_DPB_FORCE_WRITE => {
                    let value = read_byte(&mut src)?;
                    dpb.write_policy = Some(
                        WritePolicy::from_byte(value).ok_or(ProtocolError::UnknownItem(value))?,
                    );
                }
                ISC_DPB_NUM_BUFFERS => dpb.num_buffers = Some(read_byte(&mut src)?),
                ISC_DPB_USER_NAME => dpb.user = Some(read_text(&mut src, tag)?),
                ISC_DPB_PASSWORD => dpb.password = Some(read_text(&mut src, tag)?),
                ISC_DPB_LC_CTYPE => dpb.charset = Some(read_text(&mut src, tag)?),
                ISC_DPB_LC_MESSAGES => dpb.message_file = Some(read_text(&mut src, tag)?),
                ISC_DPB_SYS_USER_NAME => dpb.dba_user = Some(read_text(&mut src, tag)?),
                ISC_DPB_SQL_ROLE_NAME => dpb.role = Some(read_text(&mut src, tag)?),
                other => return Err(ProtocolError::UnknownItem(other)),
            }
        }
        Ok(dpb)
    }
}

fn read_byte(src: &mut &[u8]) -> Result<u8, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok(src.get_u8())
}

fn read_text(src: &mut &[u8], tag: u8) -> Result<String, ProtocolError> {
    let len = usize::from(read_byte(src)?);
    if src.remaining() < len {
        return Err(ProtocolError::UnexpectedEof);
    }
    let (value, rest) = src.split_at(len);
    *src = rest;
    String::from_utf8(value.to_vec()).map_err(|_| ProtocolError::InvalidText(tag))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_dpb() {
        let dpb = Dpb::new();
        assert_eq!(dpb.encoded_len(), 1);
        assert_eq!(&dpb.encode().unwrap()[..], &[ISC_DPB_VERSION1]);
    }

    #[test]
    fn test_user_and_password() {
        let dpb = Dpb::new().with_user("SYSDBA").with_password("masterkey");
        let bytes = dpb.encode().unwrap();

        let mut expected = vec![1, 28, 6];
        expected.extend_from_slice(b"SYSDBA");
        expected.extend_from_slice(&[29, 9]);
        expected.extend_from_slice(b"masterkey");

        assert_eq!(&bytes[..], &expected[..]);
        assert_eq!(dpb.encoded_len(), expected.len());
    }

    #[test]
    fn test_password_only() {
        let bytes = Dpb::new().with_password("pw").encode().unwrap();
        assert_eq!(&bytes[..], &[1, 29, 2, b'p', b'w']);
    }

    #[test]
    fn test_flag_options_have_no_length_byte() {
        let bytes = Dpb::new()
            .with_damaged(true)
            .with_write_policy(WritePolicy::Async)
            .with_num_buffers(75)
            .encode()
            .unwrap();
        assert_eq!(&bytes[..], &[1, 17, 1, 24, 0, 5, 75]);
    }

    #[test]
    fn test_damaged_false_is_written() {
        let bytes = Dpb::new().with_damaged(false).encode().unwrap();
        assert_eq!(&bytes[..], &[1, 17, 0]);
    }

    #[test]
    fn test_full_layout_order() {
        let dpb = Dpb::new()
            .with_role("ADMIN")
            .with_dba_user("SYS")
            .with_num_buffers(10)
            .with_message_file("en")
            .with_charset("UTF8")
            .with_write_policy(WritePolicy::Sync)
            .with_damaged(false)
            .with_password("p")
            .with_user("u");

        let bytes = dpb.encode().unwrap();
        let expected: Vec<u8> = [
            &[1][..],
            &[28, 1, b'u'],
            &[29, 1, b'p'],
            &[17, 0],
            &[24, 1],
            &[48, 4, b'U', b'T', b'F', b'8'],
            &[47, 2, b'e', b'n'],
            &[5, 10],
            &[19, 3, b'S', b'Y', b'S'],
            &[60, 5, b'A', b'D', b'M', b'I', b'N'],
        ]
        .concat();

        assert_eq!(&bytes[..], &expected[..]);
        assert_eq!(dpb.encoded_len(), expected.len());
    }

    #[test]
    fn test_value_too_long() {
        let err = Dpb::new().with_role("r".repeat(256)).encode().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ValueTooLong {
                tag: ISC_DPB_SQL_ROLE_NAME,
                len: 256
            }
        );
    }

    #[test]
    fn test_decode_reads_back_every_option() {
        let dpb = Dpb::new()
            .with_user("SYSDBA")
            .with_charset("UTF8")
            .with_damaged(true)
            .with_num_buffers(0)
            .with_role("R");
        let bytes = dpb.encode().unwrap();
        assert_eq!(Dpb::decode(&bytes).unwrap(), dpb);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(Dpb::decode(&[]), Err(ProtocolError::UnexpectedEof));
        assert_eq!(Dpb::decode(&[2]), Err(ProtocolError::UnsupportedVersion(2)));
        assert_eq!(Dpb::decode(&[1, 28, 5, b'a']), Err(ProtocolError::UnexpectedEof));
        assert_eq!(Dpb::decode(&[1, 99, 0]), Err(ProtocolError::UnknownItem(99)));
        assert_eq!(Dpb::decode(&[1, 24, 7]), Err(ProtocolError::UnknownItem(7)));
    }

    #[test]
    fn test_write_policy_bytes() {
        assert_eq!(WritePolicy::Async.as_byte(), 0);
        assert_eq!(WritePolicy::Sync.as_byte(), 1);
        assert_eq!(WritePolicy::from_byte(1), Some(WritePolicy::Sync));
        assert_eq!(WritePolicy::from_byte(2), None);
    }

    fn short_string() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z0-9_]{0,40}")
    }

    proptest! {
        #[test]
        fn encoded_len_matches_bytes_written(
            user in short_string(),
            password in short_string(),
            charset in short_string(),
            message_file in short_string(),
            dba_user in short_string(),
            role in short_string(),
            damaged in proptest::option::of(any::<bool>()),
            sync in proptest::option::of(any::<bool>()),
            num_buffers in proptest::option::of(any::<u8>()),
        ) {
            let dpb = Dpb {
                user,
                password,
                damaged,
                write_policy: sync.map(|s| if s { WritePolicy::Sync } else { WritePolicy::Async }),
                charset,
                message_file,
                num_buffers,
                dba_user,
                role,
            };
            let bytes = dpb.encode().unwrap();
            prop_assert_eq!(bytes.len(), dpb.encoded_len());
            prop_assert_eq!(bytes[0], ISC_DPB_VERSION1);
        }
    }
}
