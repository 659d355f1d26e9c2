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

//! API to search listings by name.

use crate::driver::Driver;
use crate::model::{ListingSummary, Page, PageNumber, PageSize, SearchText};
use axum::Json;
use axum::extract::{Query, State};
use geoquery_core::rest::{EmptyBody, RestError};
use serde::Deserialize;

/// Query parameters for this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct SearchQuery {
    /// Text to look for in the listing names.
    q: String,

    /// One-based number of the page to return.
    page_number: u16,

    /// Number of listings per page.
    page_size: u16,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<SearchQuery>,
    _: EmptyBody,
) -> Result<Json<Vec<ListingSummary>>, RestError> {
    let text = SearchText::new(query.q)?;
    let page = Page::new(PageNumber::new(query.page_number)?, PageSize::new(query.page_size)?);

    let listings = driver.search_listings(text, page).await?;
    Ok(Json(listings))
}
