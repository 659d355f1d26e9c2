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

//! API to find the listings near a location.

use crate::driver::Driver;
use crate::model::{Location, LocationFormat, Origin, Radius};
use axum::Json;
use axum::extract::{Query, State};
use geoquery_core::rest::{EmptyBody, RestError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct NearbyQuery {
    /// Latitude of the point to search around, in decimal degrees.
    latitude: f64,

    /// Longitude of the point to search around, in decimal degrees.
    longitude: f64,

    /// Search radius in metres.
    distance: f64,

    /// How to render the location of the listings.
    #[serde(default)]
    format: LocationFormat,
}

/// A listing near the requested location.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct NearbyListingResponse {
    /// Globally unique identifier of the listing.
    listing_uid: Uuid,

    /// Display name of the listing.
    name: String,

    /// Link to the listing's page.
    listing_url: String,

    /// Geodesic distance to the requested location, in metres.
    distance: f64,

    /// Location of the listing in the requested format.
    location: Location,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<NearbyQuery>,
    _: EmptyBody,
) -> Result<Json<Vec<NearbyListingResponse>>, RestError> {
    let origin = Origin::new(query.latitude, query.longitude)?;
    let radius = Radius::new(query.distance)?;

    let listings = driver.nearby_listings(origin, radius).await?;

    let mut response = Vec::with_capacity(listings.len());
    for listing in listings {
        response.push(NearbyListingResponse {
            listing_uid: listing.listing_uid,
            name: listing.name,
            listing_url: listing.listing_url,
            distance: listing.distance,
            location: query.format.render(listing.location)?,
        });
    }
    Ok(Json(response))
}
