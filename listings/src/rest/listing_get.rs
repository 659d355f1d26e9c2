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

//! API to get the details of a listing.

use crate::driver::Driver;
use crate::model::{ListingDetails, ListingId};
use axum::Json;
use axum::extract::{Path, State};
use geoquery_core::rest::{EmptyBody, RestError};

/// API handler.
///
/// Identifiers that cannot name a listing, such as zero or negative numbers, are reported as
/// missing listings.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<i64>,
    _: EmptyBody,
) -> Result<Json<ListingDetails>, RestError> {
    let id = ListingId::new(id)
        .map_err(|_| RestError::NotFound(format!("Listing {} not found", id)))?;
    let details = driver.get_listing(id).await?;
    Ok(Json(details))
}
