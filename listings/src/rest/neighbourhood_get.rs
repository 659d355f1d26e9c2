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

//! API to find the neighbourhood that contains a location.

use crate::driver::Driver;
use crate::model::{Neighbourhood, Origin};
use axum::Json;
use axum::extract::{Query, State};
use geoquery_core::rest::{EmptyBody, RestError};
use serde::Deserialize;

/// Query parameters for this API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct NeighbourhoodQuery {
    /// Latitude of the location, in decimal degrees.
    latitude: f64,

    /// Longitude of the location, in decimal degrees.
    longitude: f64,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<NeighbourhoodQuery>,
    _: EmptyBody,
) -> Result<Json<Neighbourhood>, RestError> {
    let origin = Origin::new(query.latitude, query.longitude)?;
    let neighbourhood = driver.get_neighbourhood(origin).await?;
    Ok(Json(neighbourhood))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use geoquery_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/spatial/neighbourhood".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let soma = context.put_neighbourhood(1, "SoMa", (37.77, -122.41), (37.79, -122.39)).await;
        context.put_neighbourhood(2, "Mission", (37.74, -122.43), (37.77, -122.40)).await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .with_query(NeighbourhoodQuery { latitude: 37.78, longitude: -122.40 })
            .send_empty()
            .await
            .expect_json::<Neighbourhood>()
            .await;
        assert_eq!(soma, response);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        context.put_neighbourhood(1, "SoMa", (37.77, -122.41), (37.79, -122.39)).await;

        OneShotBuilder::new(context.into_app(), route())
            .with_query(NeighbourhoodQuery { latitude: 40.0, longitude: -100.0 })
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("No neighbourhood contains latitude 40 and longitude -100")
            .await;
    }

    #[tokio::test]
    async fn test_bad_longitude() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_query(NeighbourhoodQuery { latitude: 0.0, longitude: 200.0 })
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("longitude 200 is out of the \\[-180, 180\\] range")
            .await;
    }

    #[tokio::test]
    async fn test_missing_longitude() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_query([("latitude", "10")])
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_text("missing field `longitude`")
            .await;
    }

    test_payload_must_be_empty!(
        TestContext::setup().await.into_app(),
        route(),
        NeighbourhoodQuery { latitude: 0.0, longitude: 0.0 }
    );
}
