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

//! Extends the driver with the `get_listing` method.

use crate::db;
use crate::driver::Driver;
use crate::model::{ListingDetails, ListingId};
use geoquery_core::db::DbError;
use geoquery_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Gets the details of the listing identified by `id`.
    pub(crate) async fn get_listing(self, id: ListingId) -> DriverResult<ListingDetails> {
        let result = self
            .in_tx(|mut tx| async move {
                let details = db::get_listing(tx.ex(), id).await?;
                Ok((tx, details))
            })
            .await;
        match result {
            Ok(details) => Ok(details),
            Err(DbError::NotFound) => {
                Err(DriverError::NotFound(format!("Listing {} not found", id.as_i64())))
            }
            Err(e) => Err(e.into()),
        }
    }
}
