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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::Router;
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

mod listing_get;
mod listings_count;
mod listings_search;
mod nearby_get;
mod neighbourhood_get;
mod neighbourhoods_get;
#[cfg(test)]
mod testutils;

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;

    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]);

    Router::new()
        .route("/listings/search", get(listings_search::handler))
        .route("/listings/count", get(listings_count::handler))
        .route("/listings/:id", get(listing_get::handler))
        .route("/spatial/nearby", get(nearby_get::handler))
        .route("/spatial/neighbourhoods", get(neighbourhoods_get::handler))
        .route("/spatial/neighbourhood", get(neighbourhood_get::handler))
        .layer(cors)
        .with_state(driver)
}
