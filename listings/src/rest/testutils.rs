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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::driver::DriverOptions;
use crate::driver::testutils::listing_uid;
use crate::model::Neighbourhood;
use crate::rest::app;
use axum::Router;
use geoquery_core::db::retry::RetryPolicy;
use uuid::Uuid;

/// State of a running test.
pub(crate) struct TestContext {
    /// Context of the driver backing the app.
    context: DriverTestContext,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes the app with an in-memory database.
    pub(crate) async fn setup() -> Self {
        let context = DriverTestContext::setup(DriverOptions::default()).await;
        let app = app(context.driver());
        Self { context, app }
    }

    /// Initializes the app with an in-memory database whose next `failures` transactions fail
    /// with a transient error.  Retries are disabled.
    pub(crate) async fn setup_flaky(failures: usize) -> Self {
        let opts = DriverOptions { retry_policy: RetryPolicy::none(), ..Default::default() };
        let context = DriverTestContext::setup_flaky(opts, failures).await;
        let app = app(context.driver());
        Self { context, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Creates a listing and returns its unique identifier.
    pub(crate) async fn put_listing(
        &self,
        id: i64,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Uuid {
        self.context.put_listing(id, name, latitude, longitude).await;
        listing_uid(id)
    }

    /// Creates a neighbourhood covering the given latitude and longitude ranges.
    pub(crate) async fn put_neighbourhood(
        &self,
        id: i64,
        name: &str,
        min: (f64, f64),
        max: (f64, f64),
    ) -> Neighbourhood {
        self.context.put_neighbourhood(id, name, min, max).await
    }
}
