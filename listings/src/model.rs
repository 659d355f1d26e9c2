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

//! High-level data types for listings and neighbourhoods.

use base64::Engine;
use base64::engine::general_purpose;
use geo::Point;
use geoquery_core::model::{ModelError, ModelResult};
use geoquery_spatial::wkb::ByteOrder;
use geoquery_spatial::{Latitude, Longitude, Srid, coords, sqlgeo, wkb, wkt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum number of characters in a search query.
pub(crate) const SEARCH_TEXT_MIN_LENGTH: usize = 3;

/// Maximum number of characters in a search query.
pub(crate) const SEARCH_TEXT_MAX_LENGTH: usize = 20;

/// Lowest page number that can be requested.
pub(crate) const PAGE_NUMBER_MIN: u16 = 1;

/// Highest page number that can be requested.
pub(crate) const PAGE_NUMBER_MAX: u16 = 100;

/// Smallest number of results per page.
pub(crate) const PAGE_SIZE_MIN: u16 = 5;

/// Largest number of results per page.
pub(crate) const PAGE_SIZE_MAX: u16 = 50;

/// Largest search radius for nearby lookups, in metres.
pub(crate) const RADIUS_MAX_METRES: f64 = 100_000.0;

/// Generates a positive integer identifier type backed by an `i64`.
macro_rules! positive_id [
    ( $name:ident, $what:literal ) => {
        #[doc = concat!("Identifier of a ", $what, ".")]
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            #[doc = concat!("Creates a new ", $what, " identifier, making sure it is valid.")]
            pub fn new(id: i64) -> ModelResult<Self> {
                if id <= 0 {
                    return Err(ModelError(format!(
                        "{} ids must be positive but got {}",
                        $what, id
                    )));
                }
                Ok(Self(id))
            }

            /// Returns the raw value of the identifier.
            pub fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ModelError;

            fn try_from(id: i64) -> ModelResult<Self> {
                Self::new(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    }
];

positive_id!(ListingId, "Listing");
positive_id!(NeighbourhoodId, "Neighbourhood");

/// Text to look for in listing names.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchText(String);

impl SearchText {
    /// Creates a new search text from untrusted input, trimming surrounding whitespace.
    pub fn new<S: AsRef<str>>(text: S) -> ModelResult<Self> {
        let text = text.as_ref().trim();
        let length = text.chars().count();
        if !(SEARCH_TEXT_MIN_LENGTH..=SEARCH_TEXT_MAX_LENGTH).contains(&length) {
            return Err(ModelError(format!(
                "Search text must be between {} and {} characters long",
                SEARCH_TEXT_MIN_LENGTH, SEARCH_TEXT_MAX_LENGTH
            )));
        }
        Ok(Self(text.to_owned()))
    }

    /// Returns the search text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a `LIKE` pattern that matches any string containing this text.
    ///
    /// The `%`, `_` and `\` characters are escaped with `\`, so queries must use `ESCAPE '\'`.
    pub(crate) fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 2);
        pattern.push('%');
        for ch in self.0.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }
}

/// One-based number of a page of search results.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageNumber(u16);

impl PageNumber {
    /// Creates a new page number, making sure it is in range.
    pub fn new(number: u16) -> ModelResult<Self> {
        if !(PAGE_NUMBER_MIN..=PAGE_NUMBER_MAX).contains(&number) {
            return Err(ModelError(format!(
                "Page number must be between {} and {}",
                PAGE_NUMBER_MIN, PAGE_NUMBER_MAX
            )));
        }
        Ok(Self(number))
    }
}

/// Number of results in a page of search results.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize(u16);

impl PageSize {
    /// Creates a new page size, making sure it is in range.
    pub fn new(size: u16) -> ModelResult<Self> {
        if !(PAGE_SIZE_MIN..=PAGE_SIZE_MAX).contains(&size) {
            return Err(ModelError(format!(
                "Page size must be between {} and {}",
                PAGE_SIZE_MIN, PAGE_SIZE_MAX
            )));
        }
        Ok(Self(size))
    }
}

/// A window into the results of a search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Page {
    /// The one-based number of the page.
    number: PageNumber,

    /// The number of results per page.
    size: PageSize,
}

impl Page {
    /// Creates a new page descriptor.
    pub fn new(number: PageNumber, size: PageSize) -> Self {
        Self { number, size }
    }

    /// Returns how many results to skip to reach the first one in this page.
    pub fn offset(self) -> i64 {
        i64::from(self.size.0) * (i64::from(self.number.0) - 1)
    }

    /// Returns the maximum number of results in this page.
    pub fn limit(self) -> i64 {
        i64::from(self.size.0)
    }
}

/// Search radius around a point, in metres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Radius(f64);

impl Radius {
    /// Creates a new radius from an untrusted value in metres.
    pub fn new(metres: f64) -> ModelResult<Self> {
        if !metres.is_finite() || metres <= 0.0 || metres > RADIUS_MAX_METRES {
            return Err(ModelError(format!(
                "Distance must be a positive number of metres up to {}",
                RADIUS_MAX_METRES
            )));
        }
        Ok(Self(metres))
    }

    /// Returns the radius in metres.
    pub fn metres(self) -> f64 {
        self.0
    }
}

/// A validated position on Earth from which to run spatial queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Origin {
    /// Latitude of the position.
    latitude: Latitude,

    /// Longitude of the position.
    longitude: Longitude,
}

impl Origin {
    /// Creates a new origin from untrusted coordinates in decimal degrees.
    pub fn new(latitude: f64, longitude: f64) -> ModelResult<Self> {
        let latitude = Latitude::new(latitude).map_err(|e| ModelError(e.to_string()))?;
        let longitude = Longitude::new(longitude).map_err(|e| ModelError(e.to_string()))?;
        Ok(Self { latitude, longitude })
    }

    /// Returns the latitude of the origin.
    pub fn latitude(self) -> Latitude {
        self.latitude
    }

    /// Returns the longitude of the origin.
    pub fn longitude(self) -> Longitude {
        self.longitude
    }

    /// Returns the origin as a point with the longitude as `x`.
    pub fn point(self) -> Point<f64> {
        coords::point(self.latitude, self.longitude)
    }
}

/// A listing as stored in the database.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    /// Numeric identifier of the listing.
    pub id: ListingId,

    /// Globally unique identifier of the listing.
    pub listing_uid: Uuid,

    /// Display name of the listing.
    pub name: String,

    /// Link to the listing's page.
    pub listing_url: String,

    /// Location of the listing.
    pub location: Point<f64>,
}

/// A listing as returned by text searches.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ListingSummary {
    /// Numeric identifier of the listing.
    pub id: ListingId,

    /// Display name of the listing.
    pub name: String,

    /// Link to the listing's page.
    pub listing_url: String,
}

/// A listing as returned by lookups by identifier.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ListingDetails {
    /// Numeric identifier of the listing.
    pub id: ListingId,

    /// Display name of the listing.
    pub name: String,

    /// Link to the listing's page.
    pub listing_url: String,
}

/// A listing found near a point, along with its distance to it.
#[derive(Clone, Debug, PartialEq)]
pub struct NearbyListing {
    /// Globally unique identifier of the listing.
    pub listing_uid: Uuid,

    /// Display name of the listing.
    pub name: String,

    /// Link to the listing's page.
    pub listing_url: String,

    /// Geodesic distance to the origin of the query, in metres.
    pub distance: f64,

    /// Location of the listing.
    pub location: Point<f64>,
}

/// A neighbourhood, without its boundary.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Neighbourhood {
    /// Numeric identifier of the neighbourhood.
    pub id: NeighbourhoodId,

    /// Globally unique identifier of the neighbourhood.
    pub neighbourhood_uid: Uuid,

    /// Display name of the neighbourhood.
    pub name: String,

    /// Link to the neighbourhood's page, if any.
    pub neighbourhood_url: Option<String>,
}

/// Representation to use when returning locations to clients.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationFormat {
    /// Separate latitude and longitude fields.
    #[default]
    LatLon,

    /// Well-Known Text.
    Wkt,

    /// Base64-encoded little-endian Well-Known Binary.
    Wkb,

    /// Base64-encoded SQL Server geography serialization.
    Geography,
}

impl LocationFormat {
    /// Renders `point` in this format.
    pub fn render(self, point: Point<f64>) -> ModelResult<Location> {
        let encoded = match self {
            LocationFormat::LatLon => {
                let (latitude, longitude) =
                    coords::coordinates(point).map_err(|e| ModelError(e.to_string()))?;
                return Ok(Location::Coordinates { latitude, longitude });
            }
            LocationFormat::Wkt => wkt::write(&point.into()),
            LocationFormat::Wkb => {
                let bytes = wkb::write(&point.into(), ByteOrder::LittleEndian)
                    .map_err(|e| ModelError(e.to_string()))?;
                general_purpose::STANDARD.encode(bytes)
            }
            LocationFormat::Geography => {
                let bytes = sqlgeo::write(&point.into(), Srid::WGS84)
                    .map_err(|e| ModelError(e.to_string()))?;
                general_purpose::STANDARD.encode(bytes)
            }
        };
        Ok(Location::Encoded(encoded))
    }
}

/// A location rendered for clients according to a `LocationFormat`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Location {
    /// Explicit coordinates.
    Coordinates {
        /// Latitude of the location.
        latitude: Latitude,

        /// Longitude of the location.
        longitude: Longitude,
    },

    /// Textual or base64-encoded binary representation.
    Encoded(String),
}
