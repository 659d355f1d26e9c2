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

//! Spatial value types and the codecs to move them in and out of databases.
//!
//! Geometries are represented in memory with the types of the `geo` crate, always with the `x`
//! coordinate holding the longitude and the `y` coordinate holding the latitude.  This crate
//! provides the conversions between those values and the external encodings that spatial
//! databases speak:
//!
//! * `wkb`: OGC/ISO Well-Known Binary, plus the SRID extension used by PostGIS.
//! * `wkt`: OGC Well-Known Text, plus the `SRID=n;` prefix used by PostGIS.
//! * `sqlgeo`: the native binary serialization of SQL Server's `geography` type.
//!
//! The `coords` module offers validated latitude and longitude types to build points from
//! untrusted input.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod coords;
pub use coords::{Latitude, Longitude, Srid};
mod error;
pub use error::{SpatialError, SpatialResult};
pub mod sqlgeo;
pub mod wkb;
pub mod wkt;

/// Returns true if `point` is empty.  Empty points are represented in memory with NaN
/// coordinates, and a point with a single NaN coordinate is also considered empty.
pub(crate) fn is_empty_point(point: &geo::Point<f64>) -> bool {
    point.x().is_nan() || point.y().is_nan()
}

/// Returns the canonical representation of an empty point.
pub(crate) fn empty_point() -> geo::Point<f64> {
    geo::Point::new(f64::NAN, f64::NAN)
}

/// Extracts a non-empty point out of a decoded `geometry`.
pub(crate) fn require_point(geometry: geo::Geometry<f64>) -> SpatialResult<geo::Point<f64>> {
    match geometry {
        geo::Geometry::Point(p) if is_empty_point(&p) => Err(SpatialError::EmptyPoint),
        geo::Geometry::Point(p) => Ok(p),
        other => {
            Err(SpatialError::UnexpectedGeometry { expected: "Point", actual: geometry_name(&other) })
        }
    }
}

/// Returns the name of the kind of `geometry` for use in diagnostics.
pub(crate) fn geometry_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}
