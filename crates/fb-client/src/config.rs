//! Client configuration.
//!
//! [`Settings`] holds library-wide behaviour switches and is handed down
//! from a [`Database`](crate::Database) to everything created from it.
//! [`ConnectionOptions`] holds the attach options that end up in the
//! database parameter buffer.

use std::time::Duration;

use fb_protocol::consts::{
    ISC_DPB_DAMAGED, ISC_DPB_FORCE_WRITE, ISC_DPB_LC_CTYPE, ISC_DPB_LC_MESSAGES,
    ISC_DPB_NUM_BUFFERS, ISC_DPB_SQL_ROLE_NAME, ISC_DPB_SYS_USER_NAME,
};
use fb_protocol::{Dpb, WritePolicy};

use crate::error::Error;

/// Library-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Settings {
    /// Look up row values by column alias (`true`) or by column name.
    pub alias_keys: bool,
    /// Return DATE columns as dates (`true`) or widen them to timestamps.
    pub date_as_date: bool,
    /// SQL dialect used to prepare statements.
    pub dialect: u16,
    /// Pause between service manager polls.
    pub service_poll_interval: Duration,
    /// Initial service query buffer size in bytes.
    pub service_buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alias_keys: true,
            date_as_date: true,
            dialect: 3,
            service_poll_interval: Duration::from_secs(1),
            service_buffer_size: 1024,
        }
    }
}

impl Settings {
    /// Create default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set alias-based row keys.
    #[must_use]
    pub fn alias_keys(mut self, enabled: bool) -> Self {
        self.alias_keys = enabled;
        self
    }

    /// Set whether DATE columns stay dates.
    #[must_use]
    pub fn date_as_date(mut self, enabled: bool) -> Self {
        self.date_as_date = enabled;
        self
    }

    /// Set the SQL dialect.
    #[must_use]
    pub fn dialect(mut self, dialect: u16) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the service manager poll interval.
    #[must_use]
    pub fn service_poll_interval(mut self, interval: Duration) -> Self {
        self.service_poll_interval = interval;
        self
    }

    /// Set the initial service query buffer size.
    #[must_use]
    pub fn service_buffer_size(mut self, size: usize) -> Self {
        self.service_buffer_size = size.max(16);
        self
    }
}

/// A loosely typed option value, as supplied by a caller that sets options
/// by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// Text.
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl OptionValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn as_write_policy(&self) -> Option<WritePolicy> {
        match self {
            Self::Bool(b) => Some(if *b { WritePolicy::Sync } else { WritePolicy::Async }),
            Self::Int(i) => u8::try_from(*i).ok().and_then(WritePolicy::from_byte),
            Self::Text(s) => parse_write_policy(s),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") || value == "0"
    {
        Some(false)
    } else {
        None
    }
}

fn parse_write_policy(value: &str) -> Option<WritePolicy> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("sync") || value.eq_ignore_ascii_case("synchronous") {
        Some(WritePolicy::Sync)
    } else if value.eq_ignore_ascii_case("async") || value.eq_ignore_ascii_case("asynchronous") {
        Some(WritePolicy::Async)
    } else {
        parse_bool(value).map(|b| if b { WritePolicy::Sync } else { WritePolicy::Async })
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

/// Options applied when attaching to a database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConnectionOptions {
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
    /// SQL role.
    pub role: Option<String>,
}

impl ConnectionOptions {
    /// No options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the damaged flag.
    #[must_use]
    pub fn damaged(mut self, damaged: bool) -> Self {
        self.damaged = Some(damaged);
        self
    }

    /// Set the forced-write policy.
    #[must_use]
    pub fn write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = Some(policy);
        self
    }

    /// Set the character set.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Set the message file locale.
    #[must_use]
    pub fn message_file(mut self, message_file: impl Into<String>) -> Self {
        self.message_file = Some(message_file.into());
        self
    }

    /// Set the number of cache buffers.
    #[must_use]
    pub fn num_buffers(mut self, buffers: u8) -> Self {
        self.num_buffers = Some(buffers);
        self
    }

    /// Set the DBA user name.
    #[must_use]
    pub fn dba_user(mut self, user: impl Into<String>) -> Self {
        self.dba_user = Some(user.into());
        self
    }

    /// Set the SQL role.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set an option by its DPB tag (see the constants on
    /// [`Connection`](crate::Connection)).
    ///
    /// Values of the wrong type are skipped: the damaged flag only takes a
    /// real boolean, the cache buffer count takes an integer in `0..=255`,
    /// the write policy takes `0`/`1`, a boolean or `sync`/`async`. Unknown
    /// tags are ignored.
    #[must_use]
    pub fn with_option(mut self, tag: u8, value: impl Into<OptionValue>) -> Self {
        let value = value.into();
        let applied = match tag {
            ISC_DPB_DAMAGED => set(&mut self.damaged, value.as_bool()),
            ISC_DPB_FORCE_WRITE => set(&mut self.write_policy, value.as_write_policy()),
            ISC_DPB_LC_CTYPE => set(&mut self.charset, value.as_text().map(str::to_owned)),
            ISC_DPB_LC_MESSAGES => set(&mut self.message_file, value.as_text().map(str::to_owned)),
            ISC_DPB_NUM_BUFFERS => set(
                &mut self.num_buffers,
                value.as_int().and_then(|n| u8::try_from(n).ok()),
            ),
            ISC_DPB_SYS_USER_NAME => set(&mut self.dba_user, value.as_text().map(str::to_owned)),
            ISC_DPB_SQL_ROLE_NAME => set(&mut self.role, value.as_text().map(str::to_owned)),
            _ => {
                tracing::debug!(tag, "ignoring unknown connection option");
                return self;
            }
        };
        if !applied {
            tracing::debug!(tag, ?value, "skipping connection option with unusable value");
        }
        self
    }

    /// Parse options from a `key=value;key=value` string.
    ///
    /// Keys are case-insensitive. Unknown keys are ignored and values that
    /// do not fit their option are skipped.
    ///
    /// Recognized keys: `damaged`, `write policy`/`forced writes`,
    /// `charset`/`character set`/`lc_ctype`, `message file`/`lc_messages`,
    /// `buffers`/`num buffers`, `dba user`/`sys_user_name`,
    /// `role`/`sql_role_name`.
    pub fn from_connection_string(conn_str: &str) -> Result<Self, Error> {
        let mut options = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase().replace(['_', '-'], " ");
            let value = value.trim();

            let tag = match key.as_str() {
                "damaged" | "mark database damaged" => {
                    match parse_bool(value) {
                        Some(b) => options.damaged = Some(b),
                        None => tracing::debug!(value, "skipping non-boolean damaged flag"),
                    }
                    continue;
                }
                "write policy" | "forced writes" | "force write" => ISC_DPB_FORCE_WRITE,
                "charset" | "character set" | "lc ctype" => ISC_DPB_LC_CTYPE,
                "message file" | "lc messages" => ISC_DPB_LC_MESSAGES,
                "buffers" | "num buffers" | "number of cache buffers" => ISC_DPB_NUM_BUFFERS,
                "dba user" | "dba user name" | "sys user name" => ISC_DPB_SYS_USER_NAME,
                "role" | "sql role name" => ISC_DPB_SQL_ROLE_NAME,
                _ => {
                    tracing::debug!(key = key.as_str(), "ignoring unknown connection string key");
                    continue;
                }
            };
            options = options.with_option(tag, value);
        }

        Ok(options)
    }

    /// Build the DPB for an attach with these options.
    #[must_use]
    pub fn to_dpb(&self, user: Option<&str>, password: Option<&str>) -> Dpb {
        let mut dpb = Dpb::new();
        dpb.user = user.map(str::to_owned);
        dpb.password = password.map(str::to_owned);
        dpb.damaged = self.damaged;
        dpb.write_policy = self.write_policy;
        dpb.charset = self.charset.clone();
        dpb.message_file = self.message_file.clone();
        dpb.num_buffers = self.num_buffers;
        dpb.dba_user = self.dba_user.clone();
        dpb.role = self.role.clone();
        dpb
    }
}
