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

//! REST service to search listings and to answer spatial queries about them.
//!
//! The service exposes two groups of read-only APIs: `/listings/*` to search listings by
//! name and to fetch their details, and `/spatial/*` to find listings near a location and to
//! look up the neighbourhoods that partition the covered area.  All data lives in a database
//! with spatial support, which is PostGIS in production and SQLite during tests.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use geoquery_core::clocks::Clock;
use geoquery_core::db::Db;
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod db;
pub mod driver;
use driver::{Driver, DriverOptions};
pub(crate) mod model;
mod rest;
use rest::app;

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// `db` is closed before returning, whether the server stopped cleanly or not.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    opts: DriverOptions,
) -> Result<(), Box<dyn Error>> {
    let result = run_server(bind_addr.into(), db.clone(), clock, opts).await;
    db.close().await;
    result
}

/// Serves the application on `bind_addr` until the server stops.
async fn run_server(
    bind_addr: SocketAddr,
    db: Arc<dyn Db + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    opts: DriverOptions,
) -> Result<(), Box<dyn Error>> {
    let driver = Driver::new(db, clock, opts);
    let app = app(driver);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
