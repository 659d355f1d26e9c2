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

//! Extends the driver with the `nearby_listings` method.

use crate::db;
use crate::driver::Driver;
use crate::model::{NearbyListing, Origin, Radius};
use geoquery_core::driver::DriverResult;

impl Driver {
    /// Gets all listings within `radius` of `origin`, closest first.
    pub(crate) async fn nearby_listings(
        self,
        origin: Origin,
        radius: Radius,
    ) -> DriverResult<Vec<NearbyListing>> {
        let listings = self
            .in_tx(|mut tx| async move {
                let listings = db::nearby_listings(tx.ex(), origin, radius).await?;
                Ok((tx, listings))
            })
            .await?;
        Ok(listings)
    }
}
