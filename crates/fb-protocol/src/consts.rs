//! Vendor-defined constants.
//!
//! Values match the `ibase.h` header shipped with the Firebird and
//! InterBase client libraries.

// Database parameter buffer.

/// DPB version tag (first byte of every DPB).
pub const ISC_DPB_VERSION1: u8 = 1;
/// Number of cache buffers.
pub const ISC_DPB_NUM_BUFFERS: u8 = 5;
/// Mark the database as damaged.
pub const ISC_DPB_DAMAGED: u8 = 17;
/// DBA / system user name.
pub const ISC_DPB_SYS_USER_NAME: u8 = 19;
/// Forced-write policy.
pub const ISC_DPB_FORCE_WRITE: u8 = 24;
/// User name.
pub const ISC_DPB_USER_NAME: u8 = 28;
/// Password.
pub const ISC_DPB_PASSWORD: u8 = 29;
/// Message file locale.
pub const ISC_DPB_LC_MESSAGES: u8 = 47;
/// Connection character set.
pub const ISC_DPB_LC_CTYPE: u8 = 48;
/// SQL role name.
pub const ISC_DPB_SQL_ROLE_NAME: u8 = 60;

// Service parameter buffer.

/// SPB version 2 marker.
pub const ISC_SPB_VERSION: u8 = 2;
/// Current SPB version.
pub const ISC_SPB_CURRENT_VERSION: u8 = 2;
/// Service user name (shares the DPB tag value).
pub const ISC_SPB_USER_NAME: u8 = ISC_DPB_USER_NAME;
/// Service password (shares the DPB tag value).
pub const ISC_SPB_PASSWORD: u8 = ISC_DPB_PASSWORD;

// Info items.

/// End of an info buffer.
pub const ISC_INFO_END: u8 = 1;
/// The response did not fit the supplied buffer.
pub const ISC_INFO_TRUNCATED: u8 = 2;
/// The service has no output ready yet.
pub const ISC_INFO_DATA_NOT_READY: u8 = 4;
/// One line of service output.
pub const ISC_INFO_SVC_LINE: u8 = 62;
/// All pending service output.
pub const ISC_INFO_SVC_TO_EOF: u8 = 63;
/// Service query timed out.
pub const ISC_INFO_SVC_TIMEOUT: u8 = 64;

// Status vector argument kinds.

/// End of the status vector.
pub const ISC_ARG_END: i64 = 0;
/// Error code cluster.
pub const ISC_ARG_GDS: i64 = 1;
/// String argument.
pub const ISC_ARG_STRING: i64 = 2;
/// Numeric argument.
pub const ISC_ARG_NUMBER: i64 = 4;
/// Pre-formatted message text.
pub const ISC_ARG_INTERPRETED: i64 = 5;
/// Warning code cluster.
pub const ISC_ARG_WARNING: i64 = 18;
/// SQLSTATE argument.
pub const ISC_ARG_SQL_STATE: i64 = 19;

// Error codes used by the builtin interpreter and by the client itself.

/// Invalid database handle.
pub const ISC_BAD_DB_HANDLE: i64 = 335_544_324;
/// Invalid transaction handle.
pub const ISC_BAD_TRANS_HANDLE: i64 = 335_544_332;
/// Deadlock.
pub const ISC_DEADLOCK: i64 = 335_544_336;
/// I/O error on a database file.
pub const ISC_IO_ERROR: i64 = 335_544_344;
/// Lock conflict on a no-wait transaction.
pub const ISC_LOCK_CONFLICT: i64 = 335_544_345;
/// Column validation failure.
pub const ISC_NOT_VALID: i64 = 335_544_347;
/// Duplicate value in a unique index.
pub const ISC_NO_DUP: i64 = 335_544_349;
/// Unsuccessful metadata update.
pub const ISC_NO_META_UPDATE: i64 = 335_544_351;
/// Missing privilege.
pub const ISC_NO_PRIV: i64 = 335_544_352;
/// Detach refused because transactions are still open.
pub const ISC_OPEN_TRANS: i64 = 335_544_357;
/// Feature not supported.
pub const ISC_WISH_LIST: i64 = 335_544_378;
/// Free-form message carried in the first argument.
pub const ISC_RANDOM: i64 = 335_544_382;
/// SQL error code carrier.
pub const ISC_SQLERR: i64 = 335_544_436;
/// Object in use.
pub const ISC_OBJ_IN_USE: i64 = 335_544_453;
/// Foreign key violation.
pub const ISC_FOREIGN_KEY: i64 = 335_544_466;
/// Login rejected.
pub const ISC_LOGIN: i64 = 335_544_472;
/// Dynamic SQL error.
pub const ISC_DSQL_ERROR: i64 = 335_544_569;
/// Unknown column.
pub const ISC_DSQL_FIELD_ERR: i64 = 335_544_578;
/// Unknown table.
pub const ISC_DSQL_RELATION_ERR: i64 = 335_544_580;
/// Unknown token.
pub const ISC_DSQL_TOKEN_UNK_ERR: i64 = 335_544_634;
/// Primary or unique key violation.
pub const ISC_UNIQUE_KEY_VIOLATION: i64 = 335_544_665;
/// Network failure reaching the server.
pub const ISC_NETWORK_ERROR: i64 = 335_544_721;

/// SQL code reported when a status vector maps to no known code.
pub const SQLCODE_UNKNOWN: i32 = -999;

// Transaction parameter buffer.

/// TPB version tag.
pub const ISC_TPB_VERSION3: u8 = 3;
/// Serializable, table-locking isolation.
pub const ISC_TPB_CONSISTENCY: u8 = 1;
/// Snapshot isolation.
pub const ISC_TPB_CONCURRENCY: u8 = 2;
/// Wait on lock conflicts.
pub const ISC_TPB_WAIT: u8 = 6;
/// Fail immediately on lock conflicts.
pub const ISC_TPB_NOWAIT: u8 = 7;
/// Read-only access.
pub const ISC_TPB_READ: u8 = 8;
/// Read-write access.
pub const ISC_TPB_WRITE: u8 = 9;
/// Read committed isolation.
pub const ISC_TPB_READ_COMMITTED: u8 = 15;
/// Read committed, see the latest committed version.
pub const ISC_TPB_REC_VERSION: u8 = 17;
/// Read committed, wait for uncommitted versions.
pub const ISC_TPB_NO_REC_VERSION: u8 = 18;
