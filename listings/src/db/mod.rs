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

//! Database abstraction in terms of the operations needed by the server.
//!
//! PostgreSQL relies on PostGIS to store geographies and to evaluate all spatial predicates.
//! SQLite, which is only used in tests, stores geometries as WKB blobs and evaluates the same
//! predicates in-process.

use crate::model::*;
use futures::TryStreamExt;
use geo::{Geometry, MultiPolygon};
#[cfg(any(feature = "sqlite", test))]
use geo::{Distance, Haversine, Intersects};
#[cfg(feature = "postgres")]
use geoquery_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use geoquery_core::db::sqlite;
use geoquery_core::db::{DbError, DbResult, Executor};
use geoquery_spatial::wkb::{self, ByteOrder};
use sqlx::Row;
use uuid::Uuid;


/// Encodes `geometry` as WKB for storage or for use as a query parameter.
fn encode_wkb(geometry: &Geometry<f64>) -> DbResult<Vec<u8>> {
    wkb::write(geometry, ByteOrder::LittleEndian)
        .map_err(|e| DbError::BackendError(format!("Cannot encode geometry: {}", e)))
}

/// Validates that an `INSERT` statement only touched one row.
fn ensure_one_insert(affected: u64) -> DbResult<()> {
    match affected {
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Insertion affected {} rows instead of 1", n))),
    }
}

/// Converts a row count returned by the database into our representation.
fn count_as_u64(total: i64) -> DbResult<u64> {
    u64::try_from(total)
        .map_err(|_| DbError::DataIntegrityError(format!("Invalid row count {}", total)))
}

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Stores a new `listing`.
pub(crate) async fn put_listing(ex: &mut Executor, listing: &Listing) -> DbResult<()> {
    let location = encode_wkb(&listing.location.into())?;

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO listings (id, listing_uid, name, listing_url, location)
                VALUES ($1, $2, $3, $4, ST_GeogFromWKB($5))
            ";
            sqlx::query(query_str)
                .bind(listing.id.as_i64())
                .bind(listing.listing_uid)
                .bind(&listing.name)
                .bind(&listing.listing_url)
                .bind(location)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO listings (id, listing_uid, name, name_folded, listing_url, location)
                VALUES (?, ?, ?, ?, ?, ?)
            ";
            sqlx::query(query_str)
                .bind(listing.id.as_i64())
                .bind(listing.listing_uid)
                .bind(&listing.name)
                .bind(listing.name.to_lowercase())
                .bind(&listing.listing_url)
                .bind(location)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_insert(rows_affected)
}

/// Stores a new `neighbourhood` delimited by `boundary`.
pub(crate) async fn put_neighbourhood(
    ex: &mut Executor,
    neighbourhood: &Neighbourhood,
    boundary: &MultiPolygon<f64>,
) -> DbResult<()> {
    let boundary = encode_wkb(&boundary.clone().into())?;

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO neighbourhoods
                    (id, neighbourhood_uid, name, neighbourhood_url, boundary)
                VALUES ($1, $2, $3, $4, ST_GeogFromWKB($5))
            ";
            sqlx::query(query_str)
                .bind(neighbourhood.id.as_i64())
                .bind(neighbourhood.neighbourhood_uid)
                .bind(&neighbourhood.name)
                .bind(&neighbourhood.neighbourhood_url)
                .bind(boundary)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO neighbourhoods
                    (id, neighbourhood_uid, name, neighbourhood_url, boundary)
                VALUES (?, ?, ?, ?, ?)
            ";
            sqlx::query(query_str)
                .bind(neighbourhood.id.as_i64())
                .bind(neighbourhood.neighbourhood_uid)
                .bind(&neighbourhood.name)
                .bind(&neighbourhood.neighbourhood_url)
                .bind(boundary)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_insert(rows_affected)
}

/// Gets the `page` of listings whose name contains `text`, ignoring case, sorted by name.
pub(crate) async fn search_listings(
    ex: &mut Executor,
    text: &SearchText,
    page: Page,
) -> DbResult<Vec<ListingSummary>> {
    let mut listings = vec![];
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, name, listing_url
                FROM listings
                WHERE name ILIKE $1 ESCAPE '\\'
                ORDER BY name, id
                OFFSET $2 LIMIT $3
            ";
            let mut rows = sqlx::query(query_str)
                .bind(text.like_pattern())
                .bind(page.offset())
                .bind(page.limit())
                .fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
                let listing_url: String =
                    row.try_get("listing_url").map_err(postgres::map_sqlx_error)?;

                listings.push(ListingSummary { id: ListingId::new(id)?, name, listing_url });
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, name, listing_url
                FROM listings
                WHERE name_folded LIKE ? ESCAPE '\\'
                ORDER BY name, id
                LIMIT ? OFFSET ?
            ";
            let mut rows = sqlx::query(query_str)
                .bind(text.like_pattern().to_lowercase())
                .bind(page.limit())
                .bind(page.offset())
                .fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
                let listing_url: String =
                    row.try_get("listing_url").map_err(sqlite::map_sqlx_error)?;

                listings.push(ListingSummary { id: ListingId::new(id)?, name, listing_url });
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(listings)
}

/// Counts the listings whose name contains `text`, ignoring case.
pub(crate) async fn count_listings(ex: &mut Executor, text: &SearchText) -> DbResult<u64> {
    let total: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT COUNT(*) AS total FROM listings WHERE name ILIKE $1 ESCAPE '\\'";
            let row = sqlx::query(query_str)
                .bind(text.like_pattern())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("total").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT COUNT(*) AS total FROM listings WHERE name_folded LIKE ? ESCAPE '\\'";
            let row = sqlx::query(query_str)
                .bind(text.like_pattern().to_lowercase())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("total").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    count_as_u64(total)
}

/// Gets the details of the listing identified by `id`.
pub(crate) async fn get_listing(ex: &mut Executor, id: ListingId) -> DbResult<ListingDetails> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT name, listing_url FROM listings WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .ok_or(DbError::NotFound)?;
            let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
            let listing_url: String =
                row.try_get("listing_url").map_err(postgres::map_sqlx_error)?;
            Ok(ListingDetails { id, name, listing_url })
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT name, listing_url FROM listings WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .ok_or(DbError::NotFound)?;
            let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
            let listing_url: String = row.try_get("listing_url").map_err(sqlite::map_sqlx_error)?;
            Ok(ListingDetails { id, name, listing_url })
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Decodes the WKB `location` of the listing `listing_uid` as returned by the database.
fn decode_location(listing_uid: Uuid, location: &[u8]) -> DbResult<geo::Point<f64>> {
    wkb::read_point(location).map_err(|e| {
        DbError::DataIntegrityError(format!("Invalid location for listing {}: {}", listing_uid, e))
    })
}

/// Gets all listings located within `radius` of `origin`, closest first.
///
/// Distances are geodesic and expressed in metres.  Listings at the same distance are sorted by
/// their unique identifier.
pub(crate) async fn nearby_listings(
    ex: &mut Executor,
    origin: Origin,
    radius: Radius,
) -> DbResult<Vec<NearbyListing>> {
    let mut listings = vec![];
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT
                    listing_uid, name, listing_url,
                    ST_Distance(location, origin) AS distance,
                    ST_AsBinary(location) AS location_wkb
                FROM listings, ST_GeogFromWKB($1) AS origin
                WHERE ST_DWithin(location, origin, $2)
                ORDER BY distance, listing_uid
            ";
            let mut rows = sqlx::query(query_str)
                .bind(encode_wkb(&origin.point().into())?)
                .bind(radius.metres())
                .fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let listing_uid: Uuid =
                    row.try_get("listing_uid").map_err(postgres::map_sqlx_error)?;
                let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
                let listing_url: String =
                    row.try_get("listing_url").map_err(postgres::map_sqlx_error)?;
                let distance: f64 = row.try_get("distance").map_err(postgres::map_sqlx_error)?;
                let location: Vec<u8> =
                    row.try_get("location_wkb").map_err(postgres::map_sqlx_error)?;

                let location = decode_location(listing_uid, &location)?;
                listings.push(NearbyListing { listing_uid, name, listing_url, distance, location });
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let origin = origin.point();

            let query_str = "SELECT listing_uid, name, listing_url, location FROM listings";
            let mut rows = sqlx::query(query_str).fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let listing_uid: Uuid = row.try_get("listing_uid").map_err(sqlite::map_sqlx_error)?;
                let location: Vec<u8> = row.try_get("location").map_err(sqlite::map_sqlx_error)?;

                let location = decode_location(listing_uid, &location)?;
                let distance = Haversine.distance(origin, location);
                if distance > radius.metres() {
                    continue;
                }

                let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
                let listing_url: String =
                    row.try_get("listing_url").map_err(sqlite::map_sqlx_error)?;
                listings.push(NearbyListing { listing_uid, name, listing_url, distance, location });
            }
            listings.sort_by(|a, b| {
                a.distance.total_cmp(&b.distance).then_with(|| a.listing_uid.cmp(&b.listing_uid))
            });
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(listings)
}

/// Gets all neighbourhoods sorted by name.
pub(crate) async fn get_neighbourhoods(ex: &mut Executor) -> DbResult<Vec<Neighbourhood>> {
    let mut neighbourhoods = vec![];
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, neighbourhood_uid, name, neighbourhood_url
                FROM neighbourhoods
                ORDER BY name, id
            ";
            let mut rows = sqlx::query(query_str).fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                let neighbourhood_uid: Uuid =
                    row.try_get("neighbourhood_uid").map_err(postgres::map_sqlx_error)?;
                let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
                let neighbourhood_url: Option<String> =
                    row.try_get("neighbourhood_url").map_err(postgres::map_sqlx_error)?;

                neighbourhoods.push(Neighbourhood {
                    id: NeighbourhoodId::new(id)?,
                    neighbourhood_uid,
                    name,
                    neighbourhood_url,
                });
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, neighbourhood_uid, name, neighbourhood_url
                FROM neighbourhoods
                ORDER BY name, id
            ";
            let mut rows = sqlx::query(query_str).fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                let neighbourhood_uid: Uuid =
                    row.try_get("neighbourhood_uid").map_err(sqlite::map_sqlx_error)?;
                let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
                let neighbourhood_url: Option<String> =
                    row.try_get("neighbourhood_url").map_err(sqlite::map_sqlx_error)?;

                neighbourhoods.push(Neighbourhood {
                    id: NeighbourhoodId::new(id)?,
                    neighbourhood_uid,
                    name,
                    neighbourhood_url,
                });
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(neighbourhoods)
}

/// Gets the neighbourhood whose boundary covers `origin`, which includes points lying on the
/// boundary itself.  If more than one neighbourhood matches, returns the first one by name.
pub(crate) async fn get_neighbourhood_containing(
    ex: &mut Executor,
    origin: Origin,
) -> DbResult<Neighbourhood> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, neighbourhood_uid, name, neighbourhood_url
                FROM neighbourhoods
                WHERE ST_Covers(boundary, ST_GeogFromWKB($1))
                ORDER BY name, id
                LIMIT 1
            ";
            let row = sqlx::query(query_str)
                .bind(encode_wkb(&origin.point().into())?)
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .ok_or(DbError::NotFound)?;
            let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
            let neighbourhood_uid: Uuid =
                row.try_get("neighbourhood_uid").map_err(postgres::map_sqlx_error)?;
            let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
            let neighbourhood_url: Option<String> =
                row.try_get("neighbourhood_url").map_err(postgres::map_sqlx_error)?;

            Ok(Neighbourhood {
                id: NeighbourhoodId::new(id)?,
                neighbourhood_uid,
                name,
                neighbourhood_url,
            })
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let origin = origin.point();

            let query_str = "
                SELECT id, neighbourhood_uid, name, neighbourhood_url, boundary
                FROM neighbourhoods
                ORDER BY name, id
            ";
            let mut rows = sqlx::query(query_str).fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                let boundary: Vec<u8> = row.try_get("boundary").map_err(sqlite::map_sqlx_error)?;

                let boundary = wkb::read(&boundary).map_err(|e| {
                    DbError::DataIntegrityError(format!(
                        "Invalid boundary for neighbourhood {}: {}",
                        id, e
                    ))
                })?;
                if !boundary.intersects(&origin) {
                    continue;
                }

                let neighbourhood_uid: Uuid =
                    row.try_get("neighbourhood_uid").map_err(sqlite::map_sqlx_error)?;
                let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
                let neighbourhood_url: Option<String> =
                    row.try_get("neighbourhood_url").map_err(sqlite::map_sqlx_error)?;
                return Ok(Neighbourhood {
                    id: NeighbourhoodId::new(id)?,
                    neighbourhood_uid,
                    name,
                    neighbourhood_url,
                });
            }
            Err(DbError::NotFound)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}
