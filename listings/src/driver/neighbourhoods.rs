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

//! Extends the driver with the `get_neighbourhoods` method.

use crate::db;
use crate::driver::Driver;
use crate::model::Neighbourhood;
use geoquery_core::driver::DriverResult;
use log::debug;
use std::sync::Arc;

impl Driver {
    /// Gets all neighbourhoods sorted by name.
    ///
    /// The list is served from an in-memory cache while it is fresher than the configured TTL,
    /// as measured by the driver's clock.  Only successful lookups are cached, and a zero TTL
    /// bypasses the cache altogether.
    pub(crate) async fn get_neighbourhoods(self) -> DriverResult<Arc<Vec<Neighbourhood>>> {
        let ttl = self.opts.neighbourhoods_cache_ttl;
        if ttl.is_zero() {
            return Ok(Arc::new(self.fetch_neighbourhoods().await?));
        }

        {
            let cache = self.neighbourhoods_cache.lock().await;
            if let Some((expires, neighbourhoods)) = cache.peek(&()) {
                if self.clock.now_utc() < *expires {
                    return Ok(neighbourhoods.clone());
                }
            }
        }

        let neighbourhoods = Arc::new(self.fetch_neighbourhoods().await?);
        debug!("Caching {} neighbourhoods", neighbourhoods.len());

        let expires = self.clock.now_utc() + ttl;
        let mut cache = self.neighbourhoods_cache.lock().await;
        cache.insert((), (expires, Arc::clone(&neighbourhoods)));
        Ok(neighbourhoods)
    }

    /// Reads all neighbourhoods from the database, bypassing the cache.
    async fn fetch_neighbourhoods(&self) -> DriverResult<Vec<Neighbourhood>> {
        let neighbourhoods = self
            .in_tx(|mut tx| async move {
                let neighbourhoods = db::get_neighbourhoods(tx.ex()).await?;
                Ok((tx, neighbourhoods))
            })
            .await?;
        Ok(neighbourhoods)
    }
}
