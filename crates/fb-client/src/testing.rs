//! Minimal in-crate fake of the client library for unit tests.
//!
//! The full scripted mock lives in the `fb-testing` crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use fb_protocol::StatusVector;
use fb_protocol::consts::{ISC_BAD_TRANS_HANDLE, ISC_LOCK_CONFLICT, ISC_OPEN_TRANS};
use fb_types::{ColumnDesc, SqlValue, column::SQL_LONG};
use parking_lot::Mutex;

use crate::library::{ClientLibrary, DbHandle, StatementInfo, StatementKind, StmtHandle, TrHandle};

#[derive(Debug, Default)]
pub(crate) struct FakeLibrary {
    next: AtomicU32,
    detaches: AtomicU32,
    fail_detach: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    commits: Mutex<Vec<TrHandle>>,
    rollbacks: Mutex<Vec<TrHandle>>,
    cursors: Mutex<HashMap<StmtHandle, u32>>,
    queries: Mutex<HashMap<StmtHandle, bool>>,
}

impl FakeLibrary {
    fn next_handle(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn detaches(&self) -> u32 {
        self.detaches.load(Ordering::Relaxed)
    }

    pub(crate) fn commits(&self) -> Vec<TrHandle> {
        self.commits.lock().clone()
    }

    pub(crate) fn rollbacks(&self) -> Vec<TrHandle> {
        self.rollbacks.lock().clone()
    }

    pub(crate) fn fail_detach(&self, fail: bool) {
        self.fail_detach.store(fail, Ordering::Relaxed);
    }

    pub(crate) fn fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::Relaxed);
    }

    pub(crate) fn fail_rollback(&self, fail: bool) {
        self.fail_rollback.store(fail, Ordering::Relaxed);
    }
}

impl ClientLibrary for FakeLibrary {
    fn attach_database(&self, _file: &str, _dpb: &[u8]) -> Result<DbHandle, StatusVector> {
        Ok(DbHandle(self.next_handle()))
    }

    fn detach_database(&self, _db: DbHandle) -> Result<(), StatusVector> {
        if self.fail_detach.load(Ordering::Relaxed) {
            return Err(StatusVector::error(ISC_OPEN_TRANS).with_number(1));
        }
        self.detaches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn start_transaction(&self, _dbs: &[DbHandle], _tpb: &[u8]) -> Result<TrHandle, StatusVector> {
        Ok(TrHandle(self.next_handle()))
    }

    fn commit_transaction(&self, tr: TrHandle) -> Result<(), StatusVector> {
        if self.fail_commit.load(Ordering::Relaxed) {
            return Err(StatusVector::error(ISC_LOCK_CONFLICT));
        }
        self.commits.lock().push(tr);
        Ok(())
    }

    fn rollback_transaction(&self, tr: TrHandle) -> Result<(), StatusVector> {
        if self.fail_rollback.load(Ordering::Relaxed) {
            return Err(StatusVector::error(ISC_BAD_TRANS_HANDLE));
        }
        self.rollbacks.lock().push(tr);
        Ok(())
    }

    fn allocate_statement(&self, _db: DbHandle) -> Result<StmtHandle, StatusVector> {
        Ok(StmtHandle(self.next_handle()))
    }

    fn prepare_statement(
        &self,
        stmt: StmtHandle,
        _tr: TrHandle,
        sql: &str,
        _dialect: u16,
    ) -> Result<StatementInfo, StatusVector> {
        let query = sql.trim_start().to_ascii_uppercase().starts_with("SELECT");
        self.queries.lock().insert(stmt, query);
        Ok(if query {
            StatementInfo::query(vec![ColumnDesc::new("N", SQL_LONG)])
        } else {
            StatementInfo::new(StatementKind::Insert)
        })
    }

    fn execute_statement(&self, stmt: StmtHandle, _tr: TrHandle) -> Result<u64, StatusVector> {
        if self.queries.lock().get(&stmt).copied().unwrap_or(false) {
            self.cursors.lock().insert(stmt, 0);
            Ok(0)
        } else {
            Ok(1)
        }
    }

    fn fetch_row(&self, stmt: StmtHandle) -> Result<Option<Vec<SqlValue>>, StatusVector> {
        let mut cursors = self.cursors.lock();
        let position = cursors.entry(stmt).or_insert(0);
        *position += 1;
        Ok((*position <= 2).then(|| vec![SqlValue::Integer(*position as i32)]))
    }

    fn close_cursor(&self, stmt: StmtHandle) -> Result<(), StatusVector> {
        self.cursors.lock().remove(&stmt);
        Ok(())
    }

    fn free_statement(&self, stmt: StmtHandle) -> Result<(), StatusVector> {
        self.queries.lock().remove(&stmt);
        Ok(())
    }
}
