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

//! Extends the driver with the `get_neighbourhood` method.

use crate::db;
use crate::driver::Driver;
use crate::model::{Neighbourhood, Origin};
use geoquery_core::db::DbError;
use geoquery_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Gets the neighbourhood that contains `origin`.
    pub(crate) async fn get_neighbourhood(self, origin: Origin) -> DriverResult<Neighbourhood> {
        let result = self
            .in_tx(|mut tx| async move {
                let neighbourhood = db::get_neighbourhood_containing(tx.ex(), origin).await?;
                Ok((tx, neighbourhood))
            })
            .await;
        match result {
            Ok(neighbourhood) => Ok(neighbourhood),
            Err(DbError::NotFound) => Err(DriverError::NotFound(format!(
                "No neighbourhood contains latitude {} and longitude {}",
                origin.latitude(),
                origin.longitude()
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup(DriverOptions::default()).await;

        context.put_neighbourhood(1, "Capitol Hill", (47.61, -122.33), (47.64, -122.30)).await;
        let downtown =
            context.put_neighbourhood(2, "Downtown", (47.60, -122.35), (47.61, -122.33)).await;

        let origin = Origin::new(47.605, -122.34).unwrap();
        let neighbourhood = context.driver().get_neighbourhood(origin).await.unwrap();
        assert_eq!(downtown, neighbourhood);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup(DriverOptions::default()).await;

        context.put_neighbourhood(1, "Capitol Hill", (47.61, -122.33), (47.64, -122.30)).await;

        let origin = Origin::new(-36.85, 174.76).unwrap();
        let err = context.driver().get_neighbourhood(origin).await.unwrap_err();
        assert_eq!(
            DriverError::NotFound(
                "No neighbourhood contains latitude -36.85 and longitude 174.76".to_owned()
            ),
            err
        );
    }
}
