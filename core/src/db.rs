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

//! Database access shared by all services.
//!
//! Services talk to PostgreSQL in production and to SQLite in tests.  Both backends sit behind
//! the `Db` trait, and queries are issued against an `Executor` that services destructure to
//! reach the `sqlx` connection of the backend in use.  Every backend classifies its errors into
//! `DbError`, and `DbError::is_transient` tells the `retry` module which ones are worth retrying.

use crate::model::ModelError;
use async_trait::async_trait;

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod retry;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Database errors.  Errors the backends know how to classify get their own variant and anything
/// else becomes a `BackendError`.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that an insertion collided with an existing entry.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates that data read from the database does not satisfy our invariants.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is temporarily not available (too many active connections,
    /// a server restart, a lock conflict...) and that the operation may succeed if retried.
    #[error("Unavailable")]
    Unavailable,
}

impl DbError {
    /// Returns true if the operation that caused this error may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Unavailable)
    }
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Handle to issue queries against whichever backend is configured.
///
/// Each variant wraps either a pooled connection or an open transaction.  Query code matches on
/// the variant and calls `conn()` on the inner value to get the `sqlx` connection, so that the
/// SQL dialect and the error mapping of each backend stay explicit at the call site.
pub enum Executor {
    /// Executor for the PostgreSQL backend.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// Executor for the SQLite backend.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An `Executor` that is backed by an open transaction.
///
/// Dropping this without calling `commit` rolls the transaction back.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor to run queries within the transaction.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(e) => e.commit().await,

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over a database connection pool.
#[async_trait]
pub trait Db {
    /// Obtains an executor backed by a connection from the pool.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.  The caller must `commit` it for its changes to persist.
    ///
    /// Implementations do not retry transient errors here.  Callers rerun the whole transaction
    /// instead.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes all connections to the database.  Must be called before dropping the database.
    async fn close(&self);
}

/// Macros to run a shared test suite against every database backend.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Instantiates the `module::name` test for the database configured by `setup`.
    ///
    /// The `extra` metadata parameter can be used to tag the generated tests.
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Instantiates one test per `name` in `module` against the database returned by `setup`.
    ///
    /// `setup` must yield a database that already has the schema the tests need.  The `extra`
    /// metadata parameter can be used to tag the generated tests, such as with `#[ignore]`.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}

#[cfg(all(test, any(feature = "postgres", feature = "sqlite")))]
mod tests {
    use super::*;
    use sqlx::Row;
    use std::sync::Arc;

    /// Runs `query`, which must be valid in all backends, discarding its results.
    async fn exec(ex: &mut Executor, query: &str) -> DbResult<()> {
        match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => sqlx::query(query)
                .execute(ex.conn())
                .await
                .map(|_| ())
                .map_err(postgres::map_sqlx_error),

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => sqlx::query(query)
                .execute(ex.conn())
                .await
                .map(|_| ())
                .map_err(sqlite::map_sqlx_error),
        }
    }

    /// Returns the number of rows in the `places` table.
    async fn count_places(ex: &mut Executor) -> i64 {
        let query = "SELECT COUNT(*) AS total FROM places";
        match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                sqlx::query(query).fetch_one(ex.conn()).await.unwrap().try_get("total").unwrap()
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                sqlx::query(query).fetch_one(ex.conn()).await.unwrap().try_get("total").unwrap()
            }
        }
    }

    /// Creates the `places` table used by the tests in this module.
    async fn create_places(db: &Arc<dyn Db + Send + Sync>) {
        let mut ex = db.ex().await.unwrap();
        exec(&mut ex, "CREATE TABLE places (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .await
            .unwrap();
    }

    #[test]
    fn test_is_transient() {
        assert!(DbError::Unavailable.is_transient());
        for e in [
            DbError::AlreadyExists,
            DbError::BackendError("x".to_owned()),
            DbError::DataIntegrityError("x".to_owned()),
            DbError::NotFound,
        ] {
            assert!(!e.is_transient(), "{:?} must not be transient", e);
        }
    }

    pub(super) async fn test_direct_execution(db: Arc<dyn Db + Send + Sync>) {
        create_places(&db).await;
        let mut ex = db.ex().await.unwrap();
        exec(&mut ex, "INSERT INTO places (id, name) VALUES (1, 'Harbour')").await.unwrap();
        exec(&mut ex, "INSERT INTO places (id, name) VALUES (2, 'Old Town')").await.unwrap();
        assert_eq!(2, count_places(&mut ex).await);
        drop(ex);
        db.close().await;
    }

    pub(super) async fn test_duplicate_is_not_transient(db: Arc<dyn Db + Send + Sync>) {
        create_places(&db).await;
        let mut ex = db.ex().await.unwrap();
        exec(&mut ex, "INSERT INTO places (id, name) VALUES (1, 'Harbour')").await.unwrap();
        let err = exec(&mut ex, "INSERT INTO places (id, name) VALUES (1, 'Pier')").await;
        assert_eq!(Err(DbError::AlreadyExists), err);
        drop(ex);
        db.close().await;
    }

    pub(super) async fn test_tx_commit(db: Arc<dyn Db + Send + Sync>) {
        create_places(&db).await;

        let mut tx = db.begin().await.unwrap();
        exec(tx.ex(), "INSERT INTO places (id, name) VALUES (1, 'Harbour')").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(1, count_places(&mut db.ex().await.unwrap()).await);
        db.close().await;
    }

    pub(super) async fn test_tx_rollback_on_drop(db: Arc<dyn Db + Send + Sync>) {
        create_places(&db).await;

        {
            let mut tx = db.begin().await.unwrap();
            exec(tx.ex(), "INSERT INTO places (id, name) VALUES (1, 'Harbour')").await.unwrap();
        }

        assert_eq!(0, count_places(&mut db.ex().await.unwrap()).await);
        db.close().await;
    }

    pub(super) async fn test_multiple_txs(db: Arc<dyn Db + Send + Sync>) {
        let tx1 = db.begin().await.unwrap();
        let tx2 = db.begin().await.unwrap();
        tx1.commit().await.unwrap();
        tx2.commit().await.unwrap();
        db.close().await;
    }

    /// Instantiates tests that need concurrent access to the database.  These tests cannot write
    /// to the database.
    macro_rules! generate_db_ro_concurrent_tests [
        ( $setup:expr $(, #[$extra:meta])? ) => {
            $crate::db::testutils::generate_tests!(
                $( #[$extra], )?
                $setup,
                $crate::db::tests,
                test_multiple_txs
            );
        }
    ];

    pub(super) use generate_db_ro_concurrent_tests;

    /// Instantiates tests that need write access to the test database.
    macro_rules! generate_db_rw_tests [
        ( $setup:expr $(, #[$extra:meta])? ) => {
            $crate::db::testutils::generate_tests!(
                $( #[$extra], )?
                $setup,
                $crate::db::tests,
                test_direct_execution,
                test_duplicate_is_not_transient,
                test_tx_commit,
                test_tx_rollback_on_drop
            );
        }
    ];

    pub(super) use generate_db_rw_tests;
}
