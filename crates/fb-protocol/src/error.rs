//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while building or reading wire-boundary buffers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// A length-prefixed value does not fit its one-byte length field.
    #[error("value for parameter tag {tag} is {len} bytes (limit is 255)")]
    ValueTooLong {
        /// Parameter tag being written.
        tag: u8,
        /// Byte length of the rejected value.
        len: usize,
    },

    /// The buffer ended in the middle of an item.
    #[error("unexpected end of buffer")]
    UnexpectedEof,

    /// A parameter buffer starts with a version byte this crate does not
    /// write.
    #[error("unsupported parameter buffer version {0}")]
    UnsupportedVersion(u8),

    /// A parameter buffer value is not valid UTF-8.
    #[error("parameter tag {0} holds invalid UTF-8")]
    InvalidText(u8),

    /// An info item this crate does not understand.
    #[error("unknown info item {0}")]
    UnknownItem(u8),
}
