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

//! Extends the driver with the operations to search listings by name.

use crate::db;
use crate::driver::Driver;
use crate::model::{ListingSummary, Page, SearchText};
use geoquery_core::driver::DriverResult;

impl Driver {
    /// Gets the `page` of listings whose name contains `text`, sorted by name.
    pub(crate) async fn search_listings(
        self,
        text: SearchText,
        page: Page,
    ) -> DriverResult<Vec<ListingSummary>> {
        let text = &text;
        let listings = self
            .in_tx(|mut tx| async move {
                let listings = db::search_listings(tx.ex(), text, page).await?;
                Ok((tx, listings))
            })
            .await?;
        Ok(listings)
    }

    /// Counts all listings whose name contains `text`.
    pub(crate) async fn count_listings(self, text: SearchText) -> DriverResult<u64> {
        let text = &text;
        let total = self
            .in_tx(|mut tx| async move {
                let total = db::count_listings(tx.ex(), text).await?;
                Ok((tx, total))
            })
            .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::testutils::*;
    use crate::model::{ListingId, PageNumber, PageSize};
    use geoquery_core::db::retry::RetryPolicy;
    use geoquery_core::driver::DriverError;

    /// Syntactic sugar to build a page descriptor.
    fn page(number: u16, size: u16) -> Page {
        Page::new(PageNumber::new(number).unwrap(), PageSize::new(size).unwrap())
    }

    #[tokio::test]
    async fn test_search_listings_ok() {
        let context = TestContext::setup(DriverOptions::default()).await;

        context.put_listing(1, "Quiet studio", 0.0, 0.0).await;
        context.put_listing(2, "Studio apartment", 0.0, 0.0).await;
        context.put_listing(3, "Houseboat", 0.0, 0.0).await;

        let listings = context
            .driver()
            .search_listings(SearchText::new("studio").unwrap(), page(1, 5))
            .await
            .unwrap();
        assert_eq!(
            vec![
                ListingSummary {
                    id: ListingId::new(1).unwrap(),
                    name: "Quiet studio".to_owned(),
                    listing_url: "https://example.com/listings/1".to_owned(),
                },
                ListingSummary {
                    id: ListingId::new(2).unwrap(),
                    name: "Studio apartment".to_owned(),
                    listing_url: "https://example.com/listings/2".to_owned(),
                },
            ],
            listings
        );
        assert!(context.clock().sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_search_listings_second_page() {
        let context = TestContext::setup(DriverOptions::default()).await;

        for i in 1..=7 {
            context.put_listing(i, &format!("Flat #{}", i), 0.0, 0.0).await;
        }

        let listings = context
            .driver()
            .search_listings(SearchText::new("flat").unwrap(), page(2, 5))
            .await
            .unwrap();
        let names = listings.into_iter().map(|l| l.name).collect::<Vec<String>>();
        assert_eq!(vec!["Flat #6", "Flat #7"], names);
    }

    #[tokio::test]
    async fn test_count_listings_ok() {
        let context = TestContext::setup(DriverOptions::default()).await;

        context.put_listing(1, "Quiet studio", 0.0, 0.0).await;
        context.put_listing(2, "Studio apartment", 0.0, 0.0).await;
        context.put_listing(3, "Houseboat", 0.0, 0.0).await;

        let driver = context.driver();
        let total = driver.clone().count_listings(SearchText::new("STUDIO").unwrap()).await;
        assert_eq!(Ok(2), total);
        let total = driver.count_listings(SearchText::new("castle").unwrap()).await;
        assert_eq!(Ok(0), total);
    }

    #[tokio::test]
    async fn test_count_listings_retries_transient_errors() {
        let context = TestContext::setup_flaky(DriverOptions::default(), 2).await;

        context.put_listing(1, "Houseboat", 0.0, 0.0).await;

        let total =
            context.driver().count_listings(SearchText::new("boat").unwrap()).await.unwrap();
        assert_eq!(1, total);
        assert_eq!(2, context.clock().sleeps().len());
    }

    #[tokio::test]
    async fn test_search_listings_unavailable() {
        let opts = DriverOptions {
            retry_policy: RetryPolicy { max_retries: 1, ..Default::default() },
            ..Default::default()
        };
        let context = TestContext::setup_flaky(opts, 5).await;

        let err = context
            .driver()
            .search_listings(SearchText::new("boat").unwrap(), page(1, 5))
            .await
            .unwrap_err();
        assert_eq!(
            DriverError::Unavailable("Database unavailable; try again later".to_owned()),
            err
        );
        assert_eq!(1, context.clock().sleeps().len());
        assert_eq!(2, context.begins());
    }

    #[tokio::test]
    async fn test_transaction_attempts_bounded_by_policy() {
        let opts = DriverOptions {
            retry_policy: RetryPolicy { max_retries: 3, ..Default::default() },
            ..Default::default()
        };
        let context = TestContext::setup_flaky(opts, 100).await;

        let err = context.driver().count_listings(SearchText::new("boat").unwrap()).await;
        assert!(matches!(err, Err(DriverError::Unavailable(_))), "Unexpected result {:?}", err);
        assert_eq!(4, context.begins());
        assert_eq!(3, context.clock().sleeps().len());
    }
}
