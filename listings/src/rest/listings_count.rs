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

//! API to count the listings that match a search.

use crate::driver::Driver;
use crate::model::SearchText;
use axum::Json;
use axum::extract::{Query, State};
use geoquery_core::rest::{EmptyBody, RestError};
use serde::Deserialize;

/// Query parameters for this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct CountQuery {
    /// Text to look for in the listing names.
    q: String,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<CountQuery>,
    _: EmptyBody,
) -> Result<Json<u64>, RestError> {
    let text = SearchText::new(query.q)?;
    let total = driver.count_listings(text).await?;
    Ok(Json(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use geoquery_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/listings/count".to_owned())
    }

    fn query(q: &str) -> CountQuery {
        CountQuery { q: q.to_owned() }
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        context.put_listing(1, "Beach bungalow", 0.0, 0.0).await;
        context.put_listing(2, "Bungalow near the park", 0.0, 0.0).await;
        context.put_listing(3, "Penthouse", 0.0, 0.0).await;

        let total = OneShotBuilder::new(context.app(), route())
            .with_query(query("bungalow"))
            .send_empty()
            .await
            .expect_json::<u64>()
            .await;
        assert_eq!(2, total);

        let total = OneShotBuilder::new(context.into_app(), route())
            .with_query(query("  house "))
            .send_empty()
            .await
            .expect_json::<u64>()
            .await;
        assert_eq!(1, total);
    }

    #[tokio::test]
    async fn test_none() {
        let context = TestContext::setup().await;

        let total = OneShotBuilder::new(context.into_app(), route())
            .with_query(query("bungalow"))
            .send_empty()
            .await
            .expect_json::<u64>()
            .await;
        assert_eq!(0, total);
    }

    #[tokio::test]
    async fn test_bad_search_text() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_query(query("this text is far too long"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Search text must be between 3 and 20 characters")
            .await;
    }

    test_payload_must_be_empty!(
        TestContext::setup().await.into_app(),
        route(),
        query("irrelevant")
    );
}
