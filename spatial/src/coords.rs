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

//! Validated geographic coordinates and spatial reference identifiers.

use crate::{SpatialError, SpatialResult};
use geo::Point;
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates a validated newtype over an `f64` that only accepts finite values in the
/// `[-$limit, $limit]` range, along with its serde support.
macro_rules! bounded_degrees [
    ( $name:ident, $visitor:ident, $what:literal, $limit:expr ) => {
        #[doc = concat!("A ", $what, " in decimal degrees, guaranteed to be finite and in range.")]
        #[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(f64);

        impl $name {
            #[doc = concat!("Creates a new ", $what, " from an untrusted value, making sure it is valid.")]
            pub fn new(degrees: f64) -> SpatialResult<Self> {
                if !degrees.is_finite() {
                    return Err(SpatialError::InvalidCoordinate(format!(
                        "{} must be a finite number",
                        $what
                    )));
                }
                if !(-$limit..=$limit).contains(&degrees) {
                    return Err(SpatialError::InvalidCoordinate(format!(
                        "{} {} is out of the [-{}, {}] range",
                        $what, degrees, $limit, $limit
                    )));
                }
                Ok(Self(degrees))
            }

            /// Returns the value in decimal degrees.
            pub fn degrees(self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        #[doc = concat!("A deserialization visitor for a `", stringify!($name), "`.")]
        struct $visitor;

        impl Visitor<'_> for $visitor {
            type Value = $name;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(concat!("a ", $what, " in decimal degrees"))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                $name::new(v).map_err(|e| E::custom(e.to_string()))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_f64(v as f64)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_f64(v as f64)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_f64($visitor)
            }
        }
    }
];

bounded_degrees!(Latitude, LatitudeVisitor, "latitude", 90.0);
bounded_degrees!(Longitude, LongitudeVisitor, "longitude", 180.0);

/// Creates a `geo::Point` for the given coordinates, with the longitude as `x`.
pub fn point(latitude: Latitude, longitude: Longitude) -> Point<f64> {
    Point::new(longitude.0, latitude.0)
}

/// Extracts the validated coordinates of `point`, which holds the longitude as `x`.
pub fn coordinates(point: Point<f64>) -> SpatialResult<(Latitude, Longitude)> {
    Ok((Latitude::new(point.y())?, Longitude::new(point.x())?))
}

/// A spatial reference system identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Srid(i32);

impl Srid {
    /// The WGS 84 geographic coordinate system used by GPS and by all data in this service.
    pub const WGS84: Srid = Srid(4326);

    /// Creates a new SRID from its numeric code.
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the numeric code of the SRID.
    pub fn code(self) -> i32 {
        self.0
    }
}

impl Default for Srid {
    fn default() -> Self {
        Srid::WGS84
    }
}

impl fmt::Display for Srid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
