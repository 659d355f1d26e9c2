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

//! Test utilities for the business logic.

use crate::db;
use crate::driver::{Driver, DriverOptions};
use crate::model::*;
use async_trait::async_trait;
use geo::{MultiPolygon, Point, Rect};
use geoquery_core::clocks::Clock;
use geoquery_core::clocks::testutils::SettableClock;
use geoquery_core::db::{Db, DbError, DbResult, Executor, TxExecutor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use time::macros::datetime;
use uuid::Uuid;

/// A database that fails to start a number of transactions with a transient error before
/// delegating to a real database.
pub(crate) struct FlakyDb {
    /// The database to delegate to.
    inner: Arc<dyn Db + Send + Sync>,

    /// Number of calls to `begin` that still have to fail.
    failures: AtomicUsize,

    /// Number of calls to `begin`, successful or not.
    begins: AtomicUsize,

    /// Whether `close` has been called.
    closed: AtomicBool,
}

impl FlakyDb {
    /// Wraps `inner` so that the next `failures` calls to `begin` fail.
    pub(crate) fn new(inner: Arc<dyn Db + Send + Sync>, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
            begins: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns how many transactions have been started so far.
    pub(crate) fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Db for FlakyDb {
    async fn ex(&self) -> DbResult<Executor> {
        self.inner.ex().await
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        let pending = self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            n.checked_sub(1)
        });
        if pending.is_ok() {
            return Err(DbError::Unavailable);
        }
        self.inner.begin().await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver, bypassing any fault injection.
    db: Arc<dyn Db + Send + Sync>,

    /// The fault-injecting wrapper the driver talks to.
    flaky: Arc<FlakyDb>,

    /// The clock used by the driver to wait between retries.
    clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a fake clock.
    pub(crate) async fn setup(opts: DriverOptions) -> Self {
        Self::setup_flaky(opts, 0).await
    }

    /// Initializes the driver using an in-memory database whose next `failures` transactions
    /// fail with a transient error, and a fake clock.
    pub(crate) async fn setup_flaky(opts: DriverOptions, failures: usize) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(geoquery_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::new(SettableClock::new(datetime!(2026-03-01 12:00:00 UTC)));
        let flaky = Arc::new(FlakyDb::new(db.clone(), failures));
        let driver = Driver::new(flaky.clone(), clock.clone(), opts);
        Self { db, flaky, clock, driver }
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Gets the fake clock used by the driver.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Gets the number of transactions the driver has tried to start.
    pub(crate) fn begins(&self) -> usize {
        self.flaky.begins()
    }

    /// Gets the database handed to the driver, for callers that need to build their own.
    pub(crate) fn flaky_db(&self) -> Arc<dyn Db + Send + Sync> {
        self.flaky.clone()
    }

    /// Gets the fake clock as a shareable handle.
    pub(crate) fn clock_arc(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    /// Returns true if the database handed to the driver has been closed.
    pub(crate) fn is_closed(&self) -> bool {
        self.flaky.closed.load(Ordering::SeqCst)
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Syntactic sugar to create a listing located at the given coordinates.  The URL and the
    /// unique identifier of the listing derive from `id`.
    pub(crate) async fn put_listing(&self, id: i64, name: &str, latitude: f64, longitude: f64) {
        let listing = Listing {
            id: ListingId::new(id).unwrap(),
            listing_uid: listing_uid(id),
            name: name.to_owned(),
            listing_url: format!("https://example.com/listings/{}", id),
            location: Point::new(longitude, latitude),
        };
        db::put_listing(&mut self.ex().await, &listing).await.unwrap();
    }

    /// Syntactic sugar to create a neighbourhood covering the given latitude and longitude
    /// ranges.  The unique identifier of the neighbourhood derives from `id`.
    pub(crate) async fn put_neighbourhood(
        &self,
        id: i64,
        name: &str,
        (min_lat, min_lon): (f64, f64),
        (max_lat, max_lon): (f64, f64),
    ) -> Neighbourhood {
        let neighbourhood = Neighbourhood {
            id: NeighbourhoodId::new(id).unwrap(),
            neighbourhood_uid: neighbourhood_uid(id),
            name: name.to_owned(),
            neighbourhood_url: Some(format!("https://example.com/neighbourhoods/{}", id)),
        };
        let rect = Rect::new((min_lon, min_lat), (max_lon, max_lat));
        let boundary = MultiPolygon::new(vec![rect.to_polygon()]);
        db::put_neighbourhood(&mut self.ex().await, &neighbourhood, &boundary).await.unwrap();
        neighbourhood
    }
}

/// Computes the unique identifier that `TestContext::put_listing` assigns to listing `id`.
pub(crate) fn listing_uid(id: i64) -> Uuid {
    Uuid::from_u128(0x1000 + id as u128)
}

/// Computes the unique identifier that `TestContext::put_neighbourhood` assigns to
/// neighbourhood `id`.
pub(crate) fn neighbourhood_uid(id: i64) -> Uuid {
    Uuid::from_u128(0x2000 + id as u128)
}
