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

//! Entry point to the listings service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use geoquery_core::clocks::SystemClock;
use geoquery_core::db::{Db, DbResult};
use geoquery_core::db::postgres::{PostgresDb, PostgresOptions};
use geoquery_listings::db::init_schema;
use geoquery_listings::driver::DriverOptions;
use geoquery_listings::serve;
use std::env;
use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// Creates the database schema if it does not exist yet.
async fn init_db(db: &PostgresDb) -> DbResult<()> {
    init_schema(&mut db.ex().await?).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let port: u16 = match env::var("PORT") {
        Ok(val) => val.parse().map_err(|e| format!("PORT has to be a number: {}", e))?,
        Err(_) => 3000,
    };
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let driver_opts = DriverOptions::from_env("LISTINGS")?;

    let db = Arc::new(PostgresDb::connect(db_opts)?);
    if let Err(e) = init_db(&db).await {
        db.close().await;
        return Err(e.into());
    }

    serve(addr, db, Arc::new(SystemClock::default()), driver_opts).await
}
