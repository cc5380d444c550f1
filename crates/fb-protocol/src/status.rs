//! Status vector model.
//!
//! Every call into the vendor library reports its outcome through a status
//! vector: a sequence of typed arguments grouped into clusters. A cluster
//! starts with an error (or warning) code and is followed by the string and
//! numeric arguments that fill the placeholders of that code's message.
//!
//! This module owns the Rust-side representation of that vector and a
//! builtin interpreter that turns clusters into message lines and maps the
//! vector onto an SQL code. The interpreter covers the codes this client
//! raises or inspects itself. Unknown codes still produce a line.

use std::fmt;

use crate::consts::{
    ISC_BAD_DB_HANDLE, ISC_BAD_TRANS_HANDLE, ISC_DEADLOCK, ISC_DSQL_ERROR, ISC_DSQL_FIELD_ERR,
    ISC_DSQL_RELATION_ERR, ISC_DSQL_TOKEN_UNK_ERR, ISC_FOREIGN_KEY, ISC_IO_ERROR,
    ISC_LOCK_CONFLICT, ISC_LOGIN, ISC_NETWORK_ERROR, ISC_NO_DUP, ISC_NO_META_UPDATE, ISC_NO_PRIV,
    ISC_NOT_VALID, ISC_OBJ_IN_USE, ISC_OPEN_TRANS, ISC_RANDOM, ISC_SQLERR,
    ISC_UNIQUE_KEY_VIOLATION, ISC_WISH_LIST, SQLCODE_UNKNOWN,
};

/// One argument of a status vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusArg {
    /// Error code, starts a new cluster.
    Code(i64),
    /// Warning code, starts a new cluster.
    Warning(i64),
    /// String parameter of the current cluster.
    String(String),
    /// Numeric parameter of the current cluster.
    Number(i64),
    /// Pre-formatted message line.
    Interpreted(String),
    /// Five character SQLSTATE.
    SqlState(String),
}

impl StatusArg {
    fn starts_cluster(&self) -> bool {
        matches!(
            self,
            Self::Code(_) | Self::Warning(_) | Self::Interpreted(_)
        )
    }
}

/// A status vector returned by the vendor library.
///
/// An empty vector means success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusVector {
    args: Vec<StatusArg>,
}

impl StatusVector {
    /// Create an empty (successful) status vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a status vector from a list of arguments.
    #[must_use]
    pub fn from_args(args: Vec<StatusArg>) -> Self {
        Self { args }
    }

    /// Create a status vector holding a single error code.
    #[must_use]
    pub fn error(code: i64) -> Self {
        Self::new().with_code(code)
    }

    /// Append an error code.
    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.args.push(StatusArg::Code(code));
        self
    }

    /// Append a warning code.
    #[must_use]
    pub fn with_warning(mut self, code: i64) -> Self {
        self.args.push(StatusArg::Warning(code));
        self
    }

    /// Append a string parameter.
    #[must_use]
    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.args.push(StatusArg::String(value.into()));
        self
    }

    /// Append a numeric parameter.
    #[must_use]
    pub fn with_number(mut self, value: i64) -> Self {
        self.args.push(StatusArg::Number(value));
        self
    }

    /// Append a pre-formatted message line.
    #[must_use]
    pub fn with_interpreted(mut self, text: impl Into<String>) -> Self {
        self.args.push(StatusArg::Interpreted(text.into()));
        self
    }

    /// Append an SQLSTATE.
    #[must_use]
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.args.push(StatusArg::SqlState(state.into()));
        self
    }

    /// Arguments in vector order.
    #[must_use]
    pub fn args(&self) -> &[StatusArg] {
        &self.args
    }

    /// Whether the vector holds no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Whether the vector carries an error code.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.args.iter().any(|a| matches!(a, StatusArg::Code(_)))
    }

    /// First error code of the vector, or 0 when there is none.
    #[must_use]
    pub fn primary_code(&self) -> i64 {
        self.args
            .iter()
            .find_map(|a| match a {
                StatusArg::Code(c) => Some(*c),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// First SQLSTATE carried by the vector.
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        self.args.iter().find_map(|a| match a {
            StatusArg::SqlState(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// SQL code the vector maps onto.
    ///
    /// An `isc_sqlerr` cluster carries the code explicitly. Otherwise the
    /// first error code with a known mapping wins, and a vector with error
    /// codes but no mapping yields [`SQLCODE_UNKNOWN`]. A vector without
    /// error codes maps to 0.
    #[must_use]
    pub fn sql_code(&self) -> i32 {
        if !self.is_error() {
            return 0;
        }

        for (index, arg) in self.args.iter().enumerate() {
            if let StatusArg::Code(ISC_SQLERR) = arg {
                if let Some(StatusArg::Number(n)) = self.args.get(index + 1) {
                    return i32::try_from(*n).unwrap_or(SQLCODE_UNKNOWN);
                }
            }
        }

        self.args
            .iter()
            .find_map(|a| match a {
                StatusArg::Code(c) => sql_code_for(*c),
                _ => None,
            })
            .unwrap_or(SQLCODE_UNKNOWN)
    }

    /// Interpret the cluster at `cursor` and advance past it.
    ///
    /// Returns `None` once the vector is exhausted.
    pub fn interpret_next(&self, cursor: &mut usize) -> Option<String> {
        while *cursor < self.args.len() && !self.args[*cursor].starts_cluster() {
            *cursor += 1;
        }
        let head = self.args.get(*cursor)?;
        *cursor += 1;

        let (code, warning) = match head {
            StatusArg::Interpreted(text) => return Some(text.clone()),
            StatusArg::Code(c) => (*c, false),
            StatusArg::Warning(c) => (*c, true),
            _ => return None,
        };

        let mut params = Vec::new();
        while let Some(arg) = self.args.get(*cursor) {
            match arg {
                StatusArg::String(s) => params.push(s.clone()),
                StatusArg::Number(n) => params.push(n.to_string()),
                StatusArg::SqlState(_) => {}
                _ => break,
            }
            *cursor += 1;
        }

        let line = match message_template(code) {
            Some(template) => substitute(template, &params),
            None => format!("unknown ISC error {code}"),
        };
        Some(if warning {
            format!("warning: {line}")
        } else {
            line
        })
    }

    /// Iterate over every interpreted message line.
    pub fn messages(&self) -> impl Iterator<Item = String> + '_ {
        let mut cursor = 0;
        std::iter::from_fn(move || self.interpret_next(&mut cursor))
    }
}

impl fmt::Display for StatusVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.messages().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}

impl FromIterator<StatusArg> for StatusVector {
    fn from_iter<I: IntoIterator<Item = StatusArg>>(iter: I) -> Self {
        Self::from_args(iter.into_iter().collect())
    }
}

/// Message text for an SQL code, empty when there is none.
#[must_use]
pub fn sql_message(sql_code: i32) -> &'static str {
    match sql_code {
        -104 => "Invalid token",
        -204 => "Undefined name",
        -206 => "Column does not belong to referenced table",
        -530 => "violation of FOREIGN KEY constraint",
        -551 => "no permission for the requested operation",
        -607 => "unsuccessful metadata update",
        -625 => "validation error",
        -803 => "attempt to store duplicate value (visible to active transactions) in unique index",
        -901 => {
            "Unsuccessful execution caused by system error that does not preclude successful execution of subsequent statements"
        }
        -902 => {
            "Unsuccessful execution caused by a system error that precludes successful execution of subsequent statements"
        }
        -904 => "Unsuccessful execution caused by an unavailable resource.",
        -913 => "deadlock",
        _ => "",
    }
}

fn sql_code_for(code: i64) -> Option<i32> {
    let sql_code = match code {
        ISC_DSQL_ERROR | ISC_DSQL_TOKEN_UNK_ERR => -104,
        ISC_DSQL_RELATION_ERR => -204,
        ISC_DSQL_FIELD_ERR => -206,
        ISC_FOREIGN_KEY => -530,
        ISC_NO_PRIV => -551,
        ISC_NO_META_UPDATE | ISC_OBJ_IN_USE => -607,
        ISC_NOT_VALID => -625,
        ISC_NO_DUP | ISC_UNIQUE_KEY_VIOLATION => -803,
        ISC_LOCK_CONFLICT | ISC_OPEN_TRANS | ISC_BAD_TRANS_HANDLE => -901,
        ISC_IO_ERROR | ISC_WISH_LIST | ISC_LOGIN | ISC_NETWORK_ERROR => -902,
        ISC_BAD_DB_HANDLE => -904,
        ISC_DEADLOCK => -913,
        _ => return None,
    };
    Some(sql_code)
}

fn message_template(code: i64) -> Option<&'static str> {
    let template = match code {
        ISC_BAD_DB_HANDLE => "invalid database handle (no active connection)",
        ISC_BAD_TRANS_HANDLE => "invalid transaction handle (expecting explicit transaction start)",
        ISC_DEADLOCK => "deadlock",
        ISC_IO_ERROR => "I/O error during \"@1\" operation for file \"@2\"",
        ISC_LOCK_CONFLICT => "lock conflict on no wait transaction",
        ISC_NOT_VALID => "validation error for column @1, value \"@2\"",
        ISC_NO_DUP => "attempt to store duplicate value (visible to active transactions) in unique index \"@1\"",
        ISC_NO_META_UPDATE => "unsuccessful metadata update",
        ISC_NO_PRIV => "no permission for @1 access to @2 @3",
        ISC_OPEN_TRANS => "cannot disconnect database with open transactions (@1 active)",
        ISC_WISH_LIST => "feature is not supported",
        ISC_RANDOM => "@1",
        ISC_SQLERR => "SQL error code = @1",
        ISC_OBJ_IN_USE => "object @1 is in use",
        ISC_FOREIGN_KEY => "violation of FOREIGN KEY constraint \"@1\" on table \"@2\"",
        ISC_LOGIN => "Your user name and password are not defined. Ask your database administrator to set up a Firebird login.",
        ISC_DSQL_ERROR => "Dynamic SQL Error",
        ISC_DSQL_FIELD_ERR => "Column unknown",
        ISC_DSQL_RELATION_ERR => "Table unknown",
        ISC_DSQL_TOKEN_UNK_ERR => "Token unknown - line @1, column @2",
        ISC_UNIQUE_KEY_VIOLATION => "violation of PRIMARY or UNIQUE KEY constraint \"@1\" on table \"@2\"",
        ISC_NETWORK_ERROR => "Unable to complete network request to host \"@1\".",
        _ => return None,
    };
    Some(template)
}

/// Replace `@1`..`@9` with the matching parameter. Placeholders with no
/// parameter are left as-is.
fn substitute(template: &str, params: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '@' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                if digit >= 1 {
                    if let Some(param) = params.get(digit as usize - 1) {
                        chars.next();
                        out.push_str(param);
                        continue;
                    }
                }
            }
        }
        out.push(c);
    }
    out
}
