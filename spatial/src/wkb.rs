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

//! Codec for the OGC/ISO Well-Known Binary (WKB) representation of 2D geometries.
//!
//! Every geometry starts with a byte order marker (`0` for big endian, `1` for little endian)
//! followed by a 32-bit type code and the type-specific payload.  Nested geometries carry their
//! own byte order marker, so a single value can mix byte orders.
//!
//! The reader also accepts the PostGIS "extended" flavor (EWKB) in which the type code may carry
//! an SRID flag followed by the SRID itself.  Geometries with Z or M coordinates are rejected.

use crate::coords::Srid;
use crate::{
    SpatialError, SpatialResult, empty_point, geometry_name, is_empty_point, require_point,
};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};

/// EWKB flag indicating that the geometry has Z coordinates.
const EWKB_Z_FLAG: u32 = 0x8000_0000;

/// EWKB flag indicating that the geometry has M coordinates.
const EWKB_M_FLAG: u32 = 0x4000_0000;

/// EWKB flag indicating that the type code is followed by an SRID.
const EWKB_SRID_FLAG: u32 = 0x2000_0000;

/// Maximum nesting of geometry collections accepted by the reader.
const MAX_DEPTH: usize = 32;

/// Type code of a point.
const POINT: u32 = 1;

/// Type code of a line string.
const LINE_STRING: u32 = 2;

/// Type code of a polygon.
const POLYGON: u32 = 3;

/// Type code of a multi-point.
const MULTI_POINT: u32 = 4;

/// Type code of a multi-line string.
const MULTI_LINE_STRING: u32 = 5;

/// Type code of a multi-polygon.
const MULTI_POLYGON: u32 = 6;

/// Type code of a geometry collection.
const GEOMETRY_COLLECTION: u32 = 7;

/// Byte order of the numbers in a WKB value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ByteOrder {
    /// Most significant byte first, also known as XDR.
    BigEndian,

    /// Least significant byte first, also known as NDR.  This is what most databases emit.
    #[default]
    LittleEndian,
}

impl ByteOrder {
    /// Returns the marker byte that identifies this byte order in a WKB value.
    fn marker(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }
}

/// Converts a collection length to the 32-bit count used in the encoding.
fn count(len: usize) -> SpatialResult<u32> {
    u32::try_from(len)
        .map_err(|_| SpatialError::Unsupported(format!("{} elements do not fit in WKB", len)))
}

/// Incremental serializer of geometries into WKB.
struct Writer {
    /// Bytes written so far.
    buf: Vec<u8>,

    /// Byte order to use for all numbers.
    order: ByteOrder,
}

impl Writer {
    /// Appends a 32-bit unsigned integer.
    fn u32(&mut self, v: u32) {
        match self.order {
            ByteOrder::BigEndian => self.buf.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::LittleEndian => self.buf.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// Appends a 64-bit float.
    fn f64(&mut self, v: f64) {
        match self.order {
            ByteOrder::BigEndian => self.buf.extend_from_slice(&v.to_be_bytes()),
            ByteOrder::LittleEndian => self.buf.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// Appends the byte order marker and the type code that start every geometry.
    fn header(&mut self, type_code: u32) {
        self.buf.push(self.order.marker());
        self.u32(type_code);
    }

    /// Appends the coordinates of a single position.
    fn coord(&mut self, c: Coord<f64>) {
        self.f64(c.x);
        self.f64(c.y);
    }

    /// Appends a counted sequence of positions.
    fn coords(&mut self, ls: &LineString<f64>) -> SpatialResult<()> {
        self.u32(count(ls.0.len())?);
        for c in &ls.0 {
            self.coord(*c);
        }
        Ok(())
    }

    /// Appends the rings of a polygon.  An empty exterior ring denotes an empty polygon.
    fn rings(&mut self, polygon: &Polygon<f64>) -> SpatialResult<()> {
        if polygon.exterior().0.is_empty() && polygon.interiors().is_empty() {
            self.u32(0);
            return Ok(());
        }
        self.u32(count(1 + polygon.interiors().len())?);
        self.coords(polygon.exterior())?;
        for ring in polygon.interiors() {
            self.coords(ring)?;
        }
        Ok(())
    }

    /// Appends a point geometry.  Empty points are written with NaN coordinates.
    fn point(&mut self, p: &Point<f64>) {
        self.header(POINT);
        if is_empty_point(p) {
            self.coord(empty_point().0);
        } else {
            self.coord(p.0);
        }
    }

    /// Appends a line string geometry.
    fn line_string(&mut self, ls: &LineString<f64>) -> SpatialResult<()> {
        self.header(LINE_STRING);
        self.coords(ls)
    }

    /// Appends a polygon geometry.
    fn polygon(&mut self, polygon: &Polygon<f64>) -> SpatialResult<()> {
        self.header(POLYGON);
        self.rings(polygon)
    }

    /// Appends any geometry.
    fn geometry(&mut self, geometry: &Geometry<f64>) -> SpatialResult<()> {
        match geometry {
            Geometry::Point(p) => self.point(p),
            Geometry::Line(line) => {
                self.line_string(&LineString::new(vec![line.start, line.end]))?
            }
            Geometry::LineString(ls) => self.line_string(ls)?,
            Geometry::Polygon(polygon) => self.polygon(polygon)?,
            Geometry::MultiPoint(mp) => {
                self.header(MULTI_POINT);
                self.u32(count(mp.0.len())?);
                for p in &mp.0 {
                    self.point(p);
                }
            }
            Geometry::MultiLineString(mls) => {
                self.header(MULTI_LINE_STRING);
                self.u32(count(mls.0.len())?);
                for ls in &mls.0 {
                    self.line_string(ls)?;
                }
            }
            Geometry::MultiPolygon(mp) => {
                self.header(MULTI_POLYGON);
                self.u32(count(mp.0.len())?);
                for polygon in &mp.0 {
                    self.polygon(polygon)?;
                }
            }
            Geometry::GeometryCollection(gc) => {
                self.header(GEOMETRY_COLLECTION);
                self.u32(count(gc.0.len())?);
                for g in &gc.0 {
                    self.geometry(g)?;
                }
            }
            Geometry::Rect(rect) => self.polygon(&rect.to_polygon())?,
            Geometry::Triangle(triangle) => self.polygon(&triangle.to_polygon())?,
        }
        Ok(())
    }
}

/// Serializes `geometry` as WKB using the given byte `order`.
///
/// `Line`, `Rect` and `Triangle` values, which have no WKB counterpart, are written as the
/// equivalent line string or polygon.
pub fn write(geometry: &Geometry<f64>, order: ByteOrder) -> SpatialResult<Vec<u8>> {
    let mut writer = Writer { buf: Vec::with_capacity(21), order };
    writer.geometry(geometry)?;
    Ok(writer.buf)
}

/// Incremental deserializer of geometries from WKB.
struct Reader<'a> {
    /// Input being decoded.
    data: &'a [u8],

    /// Offset of the next byte to read.
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Consumes `n` bytes from the input.
    fn take(&mut self, n: usize) -> SpatialResult<&'a [u8]> {
        let end = self.offset.checked_add(n).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let bytes = &self.data[self.offset..end];
                self.offset = end;
                Ok(bytes)
            }
            None => Err(SpatialError::Truncated { offset: self.offset, needed: n }),
        }
    }

    /// Consumes a fixed-size array of bytes from the input.
    fn array<const N: usize>(&mut self) -> SpatialResult<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Consumes a byte order marker.
    fn byte_order(&mut self) -> SpatialResult<ByteOrder> {
        let offset = self.offset;
        match self.array::<1>()?[0] {
            0 => Ok(ByteOrder::BigEndian),
            1 => Ok(ByteOrder::LittleEndian),
            marker => Err(SpatialError::Syntax {
                position: offset,
                message: format!("Invalid byte order marker {}", marker),
            }),
        }
    }

    /// Consumes a 32-bit unsigned integer.
    fn u32(&mut self, order: ByteOrder) -> SpatialResult<u32> {
        let bytes = self.array::<4>()?;
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        })
    }

    /// Consumes a 64-bit float.
    fn f64(&mut self, order: ByteOrder) -> SpatialResult<f64> {
        let bytes = self.array::<8>()?;
        Ok(match order {
            ByteOrder::BigEndian => f64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
        })
    }

    /// Consumes a single position.
    fn coord(&mut self, order: ByteOrder) -> SpatialResult<Coord<f64>> {
        let x = self.f64(order)?;
        let y = self.f64(order)?;
        Ok(Coord { x, y })
    }

    /// Consumes a counted sequence of positions.
    fn coords(&mut self, order: ByteOrder) -> SpatialResult<LineString<f64>> {
        let n = self.u32(order)?;
        let mut coords = vec![];
        for _ in 0..n {
            coords.push(self.coord(order)?);
        }
        Ok(LineString::new(coords))
    }

    /// Consumes the rings of a polygon.
    fn rings(&mut self, order: ByteOrder) -> SpatialResult<Polygon<f64>> {
        let n = self.u32(order)?;
        if n == 0 {
            return Ok(Polygon::new(LineString::new(vec![]), vec![]));
        }
        let exterior = self.coords(order)?;
        let mut interiors = vec![];
        for _ in 1..n {
            interiors.push(self.coords(order)?);
        }
        Ok(Polygon::new(exterior, interiors))
    }

    /// Consumes the byte order and type code of a geometry and returns them along with the
    /// SRID, if present.
    fn header(&mut self) -> SpatialResult<(ByteOrder, u32, Option<Srid>)> {
        let order = self.byte_order()?;
        let raw = self.u32(order)?;

        if raw & (EWKB_Z_FLAG | EWKB_M_FLAG) != 0 {
            return Err(SpatialError::Unsupported("Geometries with Z or M values".to_owned()));
        }
        let srid = if raw & EWKB_SRID_FLAG != 0 {
            Some(Srid::new(self.u32(order)? as i32))
        } else {
            None
        };

        let code = raw & !EWKB_SRID_FLAG;
        match (code / 1000, code % 1000) {
            (0, base) if (POINT..=GEOMETRY_COLLECTION).contains(&base) => Ok((order, base, srid)),
            (1..=3, base) if (POINT..=GEOMETRY_COLLECTION).contains(&base) => {
                Err(SpatialError::Unsupported("Geometries with Z or M values".to_owned()))
            }
            _ => Err(SpatialError::UnknownGeometryType(raw)),
        }
    }

    /// Consumes a geometry whose type must be `expected`.
    fn nested(&mut self, expected: u32, depth: usize) -> SpatialResult<Geometry<f64>> {
        let geometry = self.geometry(depth)?.1;
        let actual = geometry_code(&geometry);
        if actual != expected {
            return Err(SpatialError::UnexpectedGeometry {
                expected: code_name(expected),
                actual: geometry_name(&geometry),
            });
        }
        Ok(geometry)
    }

    /// Consumes a whole geometry.
    fn geometry(&mut self, depth: usize) -> SpatialResult<(Option<Srid>, Geometry<f64>)> {
        if depth > MAX_DEPTH {
            return Err(SpatialError::Unsupported(format!(
                "Geometries nested more than {} levels deep",
                MAX_DEPTH
            )));
        }

        let (order, code, srid) = self.header()?;
        let geometry = match code {
            POINT => {
                let p = Point(self.coord(order)?);
                match is_empty_point(&p) {
                    true => Geometry::Point(empty_point()),
                    false => Geometry::Point(p),
                }
            }
            LINE_STRING => Geometry::LineString(self.coords(order)?),
            POLYGON => Geometry::Polygon(self.rings(order)?),
            MULTI_POINT => {
                let n = self.u32(order)?;
                let mut points = vec![];
                for _ in 0..n {
                    if let Geometry::Point(p) = self.nested(POINT, depth + 1)? {
                        points.push(p);
                    }
                }
                Geometry::MultiPoint(MultiPoint::new(points))
            }
            MULTI_LINE_STRING => {
                let n = self.u32(order)?;
                let mut lines = vec![];
                for _ in 0..n {
                    if let Geometry::LineString(ls) = self.nested(LINE_STRING, depth + 1)? {
                        lines.push(ls);
                    }
                }
                Geometry::MultiLineString(MultiLineString::new(lines))
            }
            MULTI_POLYGON => {
                let n = self.u32(order)?;
                let mut polygons = vec![];
                for _ in 0..n {
                    if let Geometry::Polygon(polygon) = self.nested(POLYGON, depth + 1)? {
                        polygons.push(polygon);
                    }
                }
                Geometry::MultiPolygon(MultiPolygon::new(polygons))
            }
            GEOMETRY_COLLECTION => {
                let n = self.u32(order)?;
                let mut geometries = vec![];
                for _ in 0..n {
                    geometries.push(self.geometry(depth + 1)?.1);
                }
                Geometry::GeometryCollection(GeometryCollection::new_from(geometries))
            }
            _ => unreachable!("Type codes validated by header()"),
        };
        Ok((srid, geometry))
    }
}

/// Returns the WKB type code that `geometry` is decoded as.
fn geometry_code(geometry: &Geometry<f64>) -> u32 {
    match geometry {
        Geometry::Point(_) => POINT,
        Geometry::Line(_) | Geometry::LineString(_) => LINE_STRING,
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => POLYGON,
        Geometry::MultiPoint(_) => MULTI_POINT,
        Geometry::MultiLineString(_) => MULTI_LINE_STRING,
        Geometry::MultiPolygon(_) => MULTI_POLYGON,
        Geometry::GeometryCollection(_) => GEOMETRY_COLLECTION,
    }
}

/// Returns the name of a WKB type `code` for use in diagnostics.
fn code_name(code: u32) -> &'static str {
    match code {
        POINT => "Point",
        LINE_STRING => "LineString",
        POLYGON => "Polygon",
        MULTI_POINT => "MultiPoint",
        MULTI_LINE_STRING => "MultiLineString",
        MULTI_POLYGON => "MultiPolygon",
        _ => "GeometryCollection",
    }
}

/// Deserializes a geometry from WKB or EWKB, returning the SRID if the input carried one.
pub fn read_with_srid(data: &[u8]) -> SpatialResult<(Option<Srid>, Geometry<f64>)> {
    let mut reader = Reader { data, offset: 0 };
    let result = reader.geometry(0)?;
    if reader.offset != data.len() {
        return Err(SpatialError::TrailingData(reader.offset));
    }
    Ok(result)
}

/// Deserializes a geometry from WKB or EWKB.
pub fn read(data: &[u8]) -> SpatialResult<Geometry<f64>> {
    Ok(read_with_srid(data)?.1)
}

/// Deserializes a point from WKB or EWKB, failing if the input holds any other geometry or if
/// the point is empty.
pub fn read_point(data: &[u8]) -> SpatialResult<Point<f64>> {
    require_point(read(data)?)
}
