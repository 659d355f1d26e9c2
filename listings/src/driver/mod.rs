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

//! Business logic for the listings service.

use crate::model::Neighbourhood;
use futures::lock::Mutex;
use geoquery_core::clocks::Clock;
use geoquery_core::db::retry::{RetryPolicy, retry};
use geoquery_core::db::{Db, DbResult, TxExecutor};
use geoquery_core::env::get_optional_var;
use lru_time_cache::LruCache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod listing;
mod nearby;
mod neighbourhood;
mod neighbourhoods;
mod search;
#[cfg(test)]
pub(crate) mod testutils;

/// Default amount of time to keep the list of neighbourhoods cached in memory.
const DEFAULT_NEIGHBOURHOODS_CACHE_TTL_SECONDS: u64 = 5 * 60;

/// Configuration options for the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverOptions {
    /// The amount of time to keep the list of neighbourhoods cached in memory.  Zero disables
    /// caching.
    pub neighbourhoods_cache_ttl: Duration,

    /// How to retry operations that fail due to transient database errors.
    pub retry_policy: RetryPolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            neighbourhoods_cache_ttl: Duration::from_secs(DEFAULT_NEIGHBOURHOODS_CACHE_TTL_SECONDS),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl DriverOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with
    /// `prefix`.
    ///
    /// This uses `<prefix>_NEIGHBOURHOODS_CACHE_TTL` plus the variables consumed by
    /// `RetryPolicy::from_env`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            neighbourhoods_cache_ttl: get_optional_var::<Duration>(
                prefix,
                "NEIGHBOURHOODS_CACHE_TTL",
            )?
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_NEIGHBOURHOODS_CACHE_TTL_SECONDS)),
            retry_policy: RetryPolicy::from_env(prefix)?,
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used to wait between retries.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Options for the driver.
    opts: DriverOptions,

    /// Cache of the full list of neighbourhoods, which rarely changes, along with the time at
    /// which the entry goes stale according to `clock`.  The key is meaningless.
    neighbourhoods_cache: Arc<Mutex<LruCache<(), (OffsetDateTime, Arc<Vec<Neighbourhood>>)>>>,
}

impl Driver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        opts: DriverOptions,
    ) -> Self {
        let neighbourhoods_cache = Arc::from(Mutex::from(LruCache::with_capacity(1)));
        Self { db, clock, opts, neighbourhoods_cache }
    }

    /// Runs `op` in a new transaction and commits it, rerunning the whole transaction for as long
    /// as it fails with a transient error and the retry policy allows it.
    async fn in_tx<T, Op, OpFut>(&self, op: Op) -> DbResult<T>
    where
        Op: Fn(TxExecutor) -> OpFut,
        OpFut: Future<Output = DbResult<(TxExecutor, T)>>,
    {
        let db = self.db.as_ref();
        let op = &op;
        retry(self.clock.as_ref(), &self.opts.retry_policy, || async move {
            let tx = db.begin().await?;
            let (tx, result) = op(tx).await?;
            tx.commit().await?;
            Ok(result)
        })
        .await
    }
}
