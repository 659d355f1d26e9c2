// GeoQuery
// Copyright 2026 The GeoQuery Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Common utilities to interact with an SQLite database.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use async_trait::async_trait;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::Transaction;

/// Primary result code of `SQLITE_BUSY`.
const SQLITE_BUSY: i32 = 5;

/// Primary result code of `SQLITE_LOCKED`.
const SQLITE_LOCKED: i32 = 6;

/// Returns true if the SQLite result `code` (possibly an extended one) denotes a lock conflict
/// that may go away on its own.
fn is_lock_conflict(code: &str) -> bool {
    match code.parse::<i32>() {
        Ok(code) => matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED),
        Err(_) => false,
    }
}

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) if e.code().is_some_and(|code| is_lock_conflict(&code)) => {
            DbError::Unavailable
        }
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("FOREIGN KEY constraint failed") => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e if e.to_string().contains("database is locked") => DbError::Unavailable,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Creates a new connection pool against the database described by `conn_str`.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    let pool = SqlitePool::connect(conn_str).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// A generic database executor implementation for SQLite.
#[derive(Debug)]
pub enum SqliteExecutor {
    /// An executor backed by a pool.  Operations issued via this executor aren't guaranteed to
    /// happen on the same connection.
    PoolExec(PoolConnection<Sqlite>),

    /// An executor backed by a transaction.
    TxExec(Transaction<'static, Sqlite>),
}

impl SqliteExecutor {
    /// Returns the raw connection to issue `sqlx` queries against.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            SqliteExecutor::PoolExec(conn) => &mut **conn,
            SqliteExecutor::TxExec(tx) => &mut **tx,
        }
    }

    /// Commits the transaction if this executor is backed by one.
    ///
    /// Calling this on a non-transaction-based executor results in a panic.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            SqliteExecutor::PoolExec(_) => unreachable!("Do not call commit on direct executors"),
            SqliteExecutor::TxExec(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// A database instance backed by an SQLite database, usually an in-memory one.
pub struct SqliteDb {
    /// Shared SQLite connection pool.  This is a cloneable type that all concurrent
    /// transactions can use concurrently.
    pool: SqlitePool,
}

impl SqliteDb {
    /// Returns an executor of the specific type used by this database.
    pub async fn typed_ex(&self) -> DbResult<SqliteExecutor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(SqliteExecutor::PoolExec(conn))
    }
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        let ex = self.typed_ex().await?;
        Ok(Executor::Sqlite(ex))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(SqliteExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Helper function to initialize the database with a schema.
pub async fn run_schema(e: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(e.conn()).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test utilities for the SQLite connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Initializes the test database.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::db::tests::{generate_db_ro_concurrent_tests, generate_db_rw_tests};
    use std::sync::Arc;

    generate_db_ro_concurrent_tests!(Arc::new(setup().await));

    generate_db_rw_tests!(Arc::new(setup().await));

    #[test]
    fn test_is_lock_conflict() {
        assert!(is_lock_conflict("5"));
        assert!(is_lock_conflict("6"));
        assert!(is_lock_conflict("517")); // SQLITE_BUSY_SNAPSHOT.
        assert!(is_lock_conflict("262")); // SQLITE_LOCKED_SHAREDCACHE.
        assert!(!is_lock_conflict("19")); // SQLITE_CONSTRAINT.
        assert!(!is_lock_conflict("2067")); // SQLITE_CONSTRAINT_UNIQUE.
        assert!(!is_lock_conflict("garbage"));
    }

    #[test]
    fn test_map_sqlx_error_classification() {
        assert_eq!(DbError::NotFound, map_sqlx_error(sqlx::Error::RowNotFound));
        assert_eq!(DbError::Unavailable, map_sqlx_error(sqlx::Error::PoolTimedOut));
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_transient());
        match map_sqlx_error(sqlx::Error::Protocol("bad".to_owned())) {
            DbError::BackendError(msg) => assert!(msg.contains("bad")),
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_constraint_violations_are_classified() {
        let db = setup().await;
        let mut ex = db.typed_ex().await.unwrap();
        run_schema(
            &mut ex,
            "CREATE TABLE parents (id INTEGER PRIMARY KEY);
            CREATE TABLE children (
                id INTEGER PRIMARY KEY,
                parent_id INTEGER REFERENCES parents (id)
            );
            INSERT INTO parents (id) VALUES (1);",
        )
        .await
        .unwrap();

        let err = sqlx::query("INSERT INTO parents (id) VALUES (1)")
            .execute(ex.conn())
            .await
            .map_err(map_sqlx_error)
            .unwrap_err();
        assert_eq!(DbError::AlreadyExists, err);

        let err = sqlx::query("INSERT INTO children (id, parent_id) VALUES (1, 2)")
            .execute(ex.conn())
            .await
            .map_err(map_sqlx_error)
            .unwrap_err();
        assert_eq!(DbError::NotFound, err);

        drop(ex);
        db.close().await;
    }

    #[tokio::test]
    async fn test_run_schema_error() {
        let db = setup().await;
        let mut ex = db.typed_ex().await.unwrap();
        match run_schema(&mut ex, "CREATE TABLE foo (; INSERT").await {
            Err(DbError::BackendError(_)) => (),
            e => panic!("Must have failed with a BackendError but got: {:?}", e),
        }
        drop(ex);
        db.close().await;
    }
}
