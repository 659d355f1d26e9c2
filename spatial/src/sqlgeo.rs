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

//! Codec for the native binary serialization of SQL Server's `geography` type.
//!
//! A serialized value holds a little-endian header (SRID, version and flags) followed by three
//! flat arrays: the points, the figures (runs of points forming a ring or a stroke) and the
//! shapes (typed nodes of a tree whose leaves own a run of figures).  Two compact forms exist for
//! a single point and for a single line segment, which omit the figure and shape arrays.
//!
//! Geography points are stored as latitude followed by longitude, which is the reverse of the
//! `x = longitude` convention used in memory.

use crate::coords::Srid;
use crate::{SpatialError, SpatialResult, empty_point, is_empty_point, require_point};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use std::ops::Range;

/// Flag indicating that the value carries Z coordinates.
const FLAG_Z: u8 = 0x01;

/// Flag indicating that the value carries M coordinates.
const FLAG_M: u8 = 0x02;

/// Flag indicating that the value is known to be valid.
const FLAG_VALID: u8 = 0x04;

/// Flag indicating the compact single point form.
const FLAG_SINGLE_POINT: u8 = 0x08;

/// Flag indicating the compact single line segment form.
const FLAG_SINGLE_LINE_SEGMENT: u8 = 0x10;

/// Figure attribute of an interior polygon ring in version 1.
const V1_INTERIOR_RING: u8 = 0;

/// Figure attribute of a point or line in version 1.
const V1_STROKE: u8 = 1;

/// Figure attribute of an exterior polygon ring in version 1.
const V1_EXTERIOR_RING: u8 = 2;

/// Shape type of a point.
const POINT: u8 = 1;

/// Shape type of a line string.
const LINE_STRING: u8 = 2;

/// Shape type of a polygon.
const POLYGON: u8 = 3;

/// Shape type of a multi-point.
const MULTI_POINT: u8 = 4;

/// Shape type of a multi-line string.
const MULTI_LINE_STRING: u8 = 5;

/// Shape type of a multi-polygon.
const MULTI_POLYGON: u8 = 6;

/// Shape type of a geometry collection.
const GEOMETRY_COLLECTION: u8 = 7;

/// Maximum nesting of shapes accepted by the reader.
const MAX_DEPTH: usize = 32;

/// A run of points in the serialized form.
#[derive(Debug)]
struct Figure {
    /// Type of the run.  The meaning depends on the serialization version.
    attribute: u8,

    /// Index of the first point of the run.
    point_offset: i32,

    /// Byte offset of the figure in the serialized input, for diagnostics.
    position: usize,
}

/// A node of the shape tree in the serialized form.
#[derive(Debug)]
struct Shape {
    /// Index of the parent shape, or -1 for the root.
    parent: i32,

    /// Index of the first figure owned by this shape, or -1 if it owns none.
    figure_offset: i32,

    /// OpenGIS type of the shape.
    kind: u8,

    /// Byte offset of the shape in the serialized input, for diagnostics.
    position: usize,
}

/// Converts a collection length to the 32-bit offsets and counts used in the encoding.
fn offset(len: usize) -> SpatialResult<i32> {
    i32::try_from(len).map_err(|_| {
        SpatialError::Unsupported(format!("{} elements do not fit in a geography", len))
    })
}

/// Flattened representation of a geometry being serialized.
#[derive(Default)]
struct Layout {
    /// All points, in order.
    points: Vec<Coord<f64>>,

    /// All figures, in order.
    figures: Vec<Figure>,

    /// All shapes, in depth-first order.
    shapes: Vec<Shape>,
}

impl Layout {
    /// Appends a figure made of `coords`.
    fn figure(&mut self, attribute: u8, coords: &[Coord<f64>]) -> SpatialResult<()> {
        let point_offset = offset(self.points.len())?;
        self.figures.push(Figure { attribute, point_offset, position: 0 });
        self.points.extend_from_slice(coords);
        Ok(())
    }

    /// Appends the figures of a polygon, if any.
    fn rings(&mut self, polygon: &Polygon<f64>) -> SpatialResult<()> {
        if polygon.exterior().0.is_empty() && polygon.interiors().is_empty() {
            return Ok(());
        }
        self.figure(V1_EXTERIOR_RING, &polygon.exterior().0)?;
        for ring in polygon.interiors() {
            self.figure(V1_INTERIOR_RING, &ring.0)?;
        }
        Ok(())
    }

    /// Appends the shape for `geometry`, and all of its descendants, as a child of `parent`.
    fn shape(&mut self, parent: i32, geometry: &Geometry<f64>) -> SpatialResult<()> {
        let index = self.shapes.len();
        let first_figure = self.figures.len();
        let kind = match geometry {
            Geometry::Point(_) => POINT,
            Geometry::Line(_) | Geometry::LineString(_) => LINE_STRING,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => POLYGON,
            Geometry::MultiPoint(_) => MULTI_POINT,
            Geometry::MultiLineString(_) => MULTI_LINE_STRING,
            Geometry::MultiPolygon(_) => MULTI_POLYGON,
            Geometry::GeometryCollection(_) => GEOMETRY_COLLECTION,
        };
        self.shapes.push(Shape { parent, figure_offset: offset(first_figure)?, kind, position: 0 });

        let me = offset(index)?;
        match geometry {
            Geometry::Point(p) => {
                if !is_empty_point(p) {
                    self.figure(V1_STROKE, &[p.0])?;
                }
            }
            Geometry::Line(line) => self.figure(V1_STROKE, &[line.start, line.end])?,
            Geometry::LineString(ls) => {
                if !ls.0.is_empty() {
                    self.figure(V1_STROKE, &ls.0)?;
                }
            }
            Geometry::Polygon(polygon) => self.rings(polygon)?,
            Geometry::Rect(rect) => self.rings(&rect.to_polygon())?,
            Geometry::Triangle(triangle) => self.rings(&triangle.to_polygon())?,
            Geometry::MultiPoint(mp) => {
                for p in &mp.0 {
                    self.shape(me, &Geometry::Point(*p))?;
                }
            }
            Geometry::MultiLineString(mls) => {
                for ls in &mls.0 {
                    self.shape(me, &Geometry::LineString(ls.clone()))?;
                }
            }
            Geometry::MultiPolygon(mp) => {
                for polygon in &mp.0 {
                    self.shape(me, &Geometry::Polygon(polygon.clone()))?;
                }
            }
            Geometry::GeometryCollection(gc) => {
                for g in &gc.0 {
                    self.shape(me, g)?;
                }
            }
        }

        if self.figures.len() == first_figure {
            self.shapes[index].figure_offset = -1;
        }
        Ok(())
    }
}

/// Appends the coordinates of a point in geography order.
fn put_coord(buf: &mut Vec<u8>, c: Coord<f64>) {
    buf.extend_from_slice(&c.y.to_le_bytes());
    buf.extend_from_slice(&c.x.to_le_bytes());
}

/// Serializes `geometry` as a version 1 SQL Server geography with the given `srid`.
///
/// Non-empty points and two-point line strings use the compact forms.  `Line`, `Rect` and
/// `Triangle` values are written as the equivalent line string or polygon.
pub fn write(geometry: &Geometry<f64>, srid: Srid) -> SpatialResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(22);
    buf.extend_from_slice(&srid.code().to_le_bytes());
    buf.push(1);

    let segment = match geometry {
        Geometry::Line(line) => Some((line.start, line.end)),
        Geometry::LineString(ls) if ls.0.len() == 2 => Some((ls.0[0], ls.0[1])),
        _ => None,
    };
    match (geometry, segment) {
        (Geometry::Point(p), _) if !is_empty_point(p) => {
            buf.push(FLAG_VALID | FLAG_SINGLE_POINT);
            put_coord(&mut buf, p.0);
        }
        (_, Some((start, end))) => {
            buf.push(FLAG_VALID | FLAG_SINGLE_LINE_SEGMENT);
            put_coord(&mut buf, start);
            put_coord(&mut buf, end);
        }
        (geometry, None) => {
            let mut layout = Layout::default();
            layout.shape(-1, geometry)?;

            buf.push(FLAG_VALID);
            buf.extend_from_slice(&offset(layout.points.len())?.to_le_bytes());
            for c in &layout.points {
                put_coord(&mut buf, *c);
            }
            buf.extend_from_slice(&offset(layout.figures.len())?.to_le_bytes());
            for figure in &layout.figures {
                buf.push(figure.attribute);
                buf.extend_from_slice(&figure.point_offset.to_le_bytes());
            }
            buf.extend_from_slice(&offset(layout.shapes.len())?.to_le_bytes());
            for shape in &layout.shapes {
                buf.extend_from_slice(&shape.parent.to_le_bytes());
                buf.extend_from_slice(&shape.figure_offset.to_le_bytes());
                buf.push(shape.kind);
            }
        }
    }
    Ok(buf)
}

/// Cursor over a serialized geography.
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

    /// Consumes a single byte.
    fn u8(&mut self) -> SpatialResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Consumes a little-endian 32-bit signed integer.
    fn i32(&mut self) -> SpatialResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// Consumes a non-negative element count.
    fn count(&mut self) -> SpatialResult<usize> {
        let position = self.offset;
        let n = self.i32()?;
        usize::try_from(n).map_err(|_| SpatialError::Syntax {
            position,
            message: format!("Invalid element count {}", n),
        })
    }

    /// Consumes a point stored in geography order.
    fn coord(&mut self) -> SpatialResult<Coord<f64>> {
        let lat = f64::from_le_bytes(self.array()?);
        let lon = f64::from_le_bytes(self.array()?);
        Ok(Coord { x: lon, y: lat })
    }

    /// Consumes `n` values of 8 bytes each without interpreting them.
    fn skip_values(&mut self, n: usize) -> SpatialResult<()> {
        let bytes = n.checked_mul(8).ok_or(SpatialError::Truncated {
            offset: self.offset,
            needed: usize::MAX,
        })?;
        self.take(bytes)?;
        Ok(())
    }
}

/// Fully decoded arrays of a serialized geography, ready to be assembled into a geometry.
struct Decoded {
    /// Serialization version.
    version: u8,

    /// All points.
    points: Vec<Coord<f64>>,

    /// All figures.
    figures: Vec<Figure>,

    /// All shapes.
    shapes: Vec<Shape>,

    /// Indexes of the children of each shape.
    children: Vec<Vec<usize>>,
}

impl Decoded {
    /// Returns the indexes of the figures owned directly by the leaf shape at `index`.
    fn figures_of(&self, index: usize) -> Range<usize> {
        let Ok(start) = usize::try_from(self.shapes[index].figure_offset) else {
            return 0..0;
        };
        let end = self.shapes[index + 1..]
            .iter()
            .find_map(|s| usize::try_from(s.figure_offset).ok())
            .unwrap_or(self.figures.len());
        start..end
    }

    /// Returns the points of the figure at `index`.
    fn points_of(&self, index: usize) -> SpatialResult<LineString<f64>> {
        let figure = &self.figures[index];
        match (self.version, figure.attribute) {
            (1, V1_INTERIOR_RING | V1_STROKE | V1_EXTERIOR_RING) | (2, 0 | 1) => (),
            (2, 2 | 3) => {
                return Err(SpatialError::Unsupported("Geographies with circular arcs".to_owned()));
            }
            (_, attribute) => {
                return Err(SpatialError::Syntax {
                    position: figure.position,
                    message: format!("Invalid figure attribute {}", attribute),
                });
            }
        }

        // Offsets were validated to be in range and non-decreasing when decoding.
        let start = figure.point_offset as usize;
        let end = self
            .figures
            .get(index + 1)
            .map(|f| f.point_offset as usize)
            .unwrap_or(self.points.len());
        Ok(LineString::new(self.points[start..end].to_vec()))
    }

    /// Builds the polygon owned by the leaf shape at `index`.
    fn polygon(&self, index: usize) -> SpatialResult<Polygon<f64>> {
        let mut rings = vec![];
        for figure in self.figures_of(index) {
            rings.push(self.points_of(figure)?);
        }
        let mut rings = rings.into_iter();
        match rings.next() {
            Some(exterior) => Ok(Polygon::new(exterior, rings.collect())),
            None => Ok(Polygon::new(LineString::new(vec![]), vec![])),
        }
    }

    /// Builds the line string owned by the leaf shape at `index`.
    fn line_string(&self, index: usize) -> SpatialResult<LineString<f64>> {
        let figures = self.figures_of(index);
        match figures.len() {
            0 => Ok(LineString::new(vec![])),
            1 => self.points_of(figures.start),
            n => Err(SpatialError::Syntax {
                position: self.shapes[index].position,
                message: format!("Line string shape with {} figures", n),
            }),
        }
    }

    /// Builds the point owned by the leaf shape at `index`.
    fn point(&self, index: usize) -> SpatialResult<Point<f64>> {
        let figures = self.figures_of(index);
        if figures.is_empty() {
            return Ok(empty_point());
        }
        let coords = if figures.len() == 1 { self.points_of(figures.start)?.0 } else { vec![] };
        match coords.as_slice() {
            [c] => Ok(Point(*c)),
            _ => Err(SpatialError::Syntax {
                position: self.shapes[index].position,
                message: "Point shapes must have exactly one point".to_owned(),
            }),
        }
    }

    /// Builds the geometry rooted at the shape at `index`.
    fn geometry(&self, index: usize, depth: usize) -> SpatialResult<Geometry<f64>> {
        if depth > MAX_DEPTH {
            return Err(SpatialError::Unsupported(format!(
                "Geographies nested more than {} levels deep",
                MAX_DEPTH
            )));
        }

        let children = &self.children[index];
        Ok(match self.shapes[index].kind {
            POINT => Geometry::Point(self.point(index)?),
            LINE_STRING => Geometry::LineString(self.line_string(index)?),
            POLYGON => Geometry::Polygon(self.polygon(index)?),
            MULTI_POINT => {
                let mut points = vec![];
                for child in children {
                    self.expect_kind(*child, POINT, "Point")?;
                    points.push(self.point(*child)?);
                }
                Geometry::MultiPoint(MultiPoint::new(points))
            }
            MULTI_LINE_STRING => {
                let mut lines = vec![];
                for child in children {
                    self.expect_kind(*child, LINE_STRING, "LineString")?;
                    lines.push(self.line_string(*child)?);
                }
                Geometry::MultiLineString(MultiLineString::new(lines))
            }
            MULTI_POLYGON => {
                let mut polygons = vec![];
                for child in children {
                    self.expect_kind(*child, POLYGON, "Polygon")?;
                    polygons.push(self.polygon(*child)?);
                }
                Geometry::MultiPolygon(MultiPolygon::new(polygons))
            }
            GEOMETRY_COLLECTION => {
                let mut geometries = vec![];
                for child in children {
                    geometries.push(self.geometry(*child, depth + 1)?);
                }
                Geometry::GeometryCollection(GeometryCollection::new_from(geometries))
            }
            kind @ 8..=11 => {
                return Err(SpatialError::Unsupported(format!(
                    "Geographies with curves (shape type {})",
                    kind
                )));
            }
            kind => return Err(SpatialError::UnknownGeometryType(u32::from(kind))),
        })
    }

    /// Checks that the member shape at `index` of a homogeneous collection has type `kind`.
    fn expect_kind(&self, index: usize, kind: u8, name: &'static str) -> SpatialResult<()> {
        let actual = self.shapes[index].kind;
        if actual == kind {
            return Ok(());
        }
        let actual = match actual {
            POINT => "Point",
            LINE_STRING => "LineString",
            POLYGON => "Polygon",
            MULTI_POINT => "MultiPoint",
            MULTI_LINE_STRING => "MultiLineString",
            MULTI_POLYGON => "MultiPolygon",
            GEOMETRY_COLLECTION => "GeometryCollection",
            other => return Err(SpatialError::UnknownGeometryType(u32::from(other))),
        };
        Err(SpatialError::UnexpectedGeometry { expected: name, actual })
    }
}

/// Checks that the `(position, offset)` pairs in `offsets` are non-decreasing and within
/// `[0, limit]`, allowing -1 when `allow_missing` is set.
fn validate_offsets<I>(offsets: I, limit: usize, allow_missing: bool) -> SpatialResult<()>
where
    I: Iterator<Item = (usize, i32)>,
{
    let mut previous = 0;
    for (position, offset) in offsets {
        if offset == -1 && allow_missing {
            continue;
        }
        match usize::try_from(offset) {
            Ok(offset) if offset >= previous && offset <= limit => previous = offset,
            _ => {
                return Err(SpatialError::Syntax {
                    position,
                    message: format!("Invalid offset {}", offset),
                });
            }
        }
    }
    Ok(())
}

/// Deserializes a SQL Server geography, returning its SRID and its geometry.
///
/// Both serialization versions are accepted as long as the value only contains straight line
/// segments.  Z and M values are skipped.
pub fn read(data: &[u8]) -> SpatialResult<(Srid, Geometry<f64>)> {
    let mut reader = Reader { data, offset: 0 };

    let srid = Srid::new(reader.i32()?);
    let version = reader.u8()?;
    if version != 1 && version != 2 {
        return Err(SpatialError::Unsupported(format!("Serialization version {}", version)));
    }
    let flags = reader.u8()?;

    let num_points = if flags & FLAG_SINGLE_POINT != 0 {
        1
    } else if flags & FLAG_SINGLE_LINE_SEGMENT != 0 {
        2
    } else {
        reader.count()?
    };
    let mut points = vec![];
    for _ in 0..num_points {
        points.push(reader.coord()?);
    }
    if flags & FLAG_Z != 0 {
        reader.skip_values(num_points)?;
    }
    if flags & FLAG_M != 0 {
        reader.skip_values(num_points)?;
    }

    let geometry = if flags & FLAG_SINGLE_POINT != 0 {
        Geometry::Point(Point(points[0]))
    } else if flags & FLAG_SINGLE_LINE_SEGMENT != 0 {
        Geometry::LineString(LineString::new(points))
    } else {
        let num_figures = reader.count()?;
        let mut figures = vec![];
        for _ in 0..num_figures {
            let position = reader.offset;
            let attribute = reader.u8()?;
            let point_offset = reader.i32()?;
            figures.push(Figure { attribute, point_offset, position });
        }

        let num_shapes = reader.count()?;
        let mut shapes = vec![];
        for _ in 0..num_shapes {
            let position = reader.offset;
            let parent = reader.i32()?;
            let figure_offset = reader.i32()?;
            let kind = reader.u8()?;
            shapes.push(Shape { parent, figure_offset, kind, position });
        }

        if version == 2 && reader.offset < data.len() {
            let num_segments = reader.count()?;
            reader.take(num_segments)?;
        }

        validate_offsets(figures.iter().map(|f| (f.position, f.point_offset)), points.len(), false)?;
        validate_offsets(shapes.iter().map(|s| (s.position, s.figure_offset)), figures.len(), true)?;

        let mut children = vec![vec![]; shapes.len()];
        for (i, shape) in shapes.iter().enumerate() {
            let valid_parent = match usize::try_from(shape.parent) {
                Ok(parent) if parent < i => {
                    children[parent].push(i);
                    true
                }
                Ok(_) => false,
                Err(_) => i == 0 && shape.parent == -1,
            };
            if !valid_parent {
                return Err(SpatialError::Syntax {
                    position: shape.position,
                    message: format!("Invalid parent {}", shape.parent),
                });
            }
        }
        if shapes.is_empty() {
            return Err(SpatialError::Syntax {
                position: reader.offset,
                message: "Geography has no shapes".to_owned(),
            });
        }

        let decoded = Decoded { version, points, figures, shapes, children };
        decoded.geometry(0, 0)?
    };

    if reader.offset != data.len() {
        return Err(SpatialError::TrailingData(reader.offset));
    }
    Ok((srid, geometry))
}

/// Deserializes a SQL Server geography that must hold a non-empty point.
pub fn read_point(data: &[u8]) -> SpatialResult<(Srid, Point<f64>)> {
    let (srid, geometry) = read(data)?;
    Ok((srid, require_point(geometry)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};

    /// Decodes a hexadecimal string as printed by SQL Server into bytes.
    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
    }

    /// Appends a little-endian `i32` to `bytes`.
    fn put_i32(bytes: &mut Vec<u8>, v: i32) {
        bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends geography-ordered points for the given `(lon, lat)` pairs to `bytes`.
    fn put_points(bytes: &mut Vec<u8>, coords: &[(f64, f64)]) {
        for (lon, lat) in coords {
            bytes.extend_from_slice(&lat.to_le_bytes());
            bytes.extend_from_slice(&lon.to_le_bytes());
        }
    }

    #[test]
    fn test_write_single_point() {
        let bytes = write(&point!(x: -122.349, y: 47.651).into(), Srid::WGS84).unwrap();
        assert_eq!(unhex("E6100000010C17D9CEF753D347407593180456965EC0"), bytes);
    }

    #[test]
    fn test_read_single_point() {
        let (srid, p) = read_point(&unhex("E6100000010C17D9CEF753D347407593180456965EC0")).unwrap();
        assert_eq!(Srid::WGS84, srid);
        assert_eq!(point!(x: -122.349, y: 47.651), p);
    }

    #[test]
    fn test_single_line_segment() {
        let exp = unhex(
            "E610000001148716D9CEF7D34740D7A3703D0A975EC08716D9CEF7D34740CBA145B6F3955EC0",
        );
        let ls = line_string![(x: -122.360, y: 47.656), (x: -122.343, y: 47.656)];
        assert_eq!(exp, write(&ls.clone().into(), Srid::WGS84).unwrap());
        assert_eq!((Srid::WGS84, Geometry::LineString(ls)), read(&exp).unwrap());
    }

    #[test]
    fn test_write_polygon_layout() {
        let polygon = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)];

        let mut exp = vec![];
        put_i32(&mut exp, 4326);
        exp.extend_from_slice(&[1, FLAG_VALID]);
        put_i32(&mut exp, 4);
        put_points(&mut exp, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        put_i32(&mut exp, 1);
        exp.push(V1_EXTERIOR_RING);
        put_i32(&mut exp, 0);
        put_i32(&mut exp, 1);
        put_i32(&mut exp, -1);
        put_i32(&mut exp, 0);
        exp.push(POLYGON);

        assert_eq!(exp, write(&polygon.clone().into(), Srid::WGS84).unwrap());
        assert_eq!((Srid::WGS84, Geometry::Polygon(polygon)), read(&exp).unwrap());
    }

    #[test]
    fn test_multipolygon_with_holes_and_empty_members() {
        let geometry = Geometry::MultiPolygon(MultiPolygon::new(vec![
            polygon!(
                exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)],
                interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)]],
            ),
            Polygon::new(LineString::new(vec![]), vec![]),
            polygon![(x: 20.0, y: 20.0), (x: 21.0, y: 20.0), (x: 21.0, y: 21.0), (x: 20.0, y: 20.0)],
        ]));
        let bytes = write(&geometry, Srid::new(4269)).unwrap();
        assert_eq!((Srid::new(4269), geometry), read(&bytes).unwrap());
    }

    #[test]
    fn test_collection_round_trip() {
        let geometry = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            point!(x: 1.0, y: 2.0).into(),
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 0.0)].into(),
            LineString::<f64>::new(vec![]).into(),
            MultiPoint::new(vec![point!(x: 3.0, y: 4.0), point!(x: 5.0, y: 6.0)]).into(),
            Geometry::GeometryCollection(GeometryCollection::<f64>::new_from(vec![
                MultiLineString::new(vec![line_string![(x: 7.0, y: 8.0), (x: 9.0, y: 10.0)]])
                    .into(),
            ])),
        ]));
        let bytes = write(&geometry, Srid::WGS84).unwrap();
        assert_eq!((Srid::WGS84, geometry), read(&bytes).unwrap());
    }

    #[test]
    fn test_empty_point() {
        for p in [point!(x: f64::NAN, y: f64::NAN), point!(x: 5.0, y: f64::NAN)] {
            let bytes = write(&p.into(), Srid::WGS84).unwrap();
            match read(&bytes).unwrap() {
                (Srid::WGS84, Geometry::Point(p)) => assert!(is_empty_point(&p)),
                other => panic!("Unexpected geography {:?}", other),
            }
            assert_eq!(Err(SpatialError::EmptyPoint), read_point(&bytes));
        }
    }

    #[test]
    fn test_empty_point_members_round_trip() {
        let gc = GeometryCollection::new_from(vec![
            MultiPoint::new(vec![point!(x: 1.0, y: 2.0), empty_point()]).into(),
            empty_point().into(),
        ]);
        let bytes = write(&Geometry::GeometryCollection(gc), Srid::WGS84).unwrap();
        let (_, Geometry::GeometryCollection(gc)) = read(&bytes).unwrap() else {
            panic!("Expected a geometry collection");
        };
        assert_eq!(2, gc.0.len());
        match &gc.0[0] {
            Geometry::MultiPoint(mp) => {
                assert_eq!(point!(x: 1.0, y: 2.0), mp.0[0]);
                assert!(is_empty_point(&mp.0[1]));
            }
            other => panic!("Unexpected geometry {:?}", other),
        }
        assert!(matches!(&gc.0[1], Geometry::Point(p) if is_empty_point(p)));
    }

    #[test]
    fn test_read_skips_z_and_m() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[1, FLAG_VALID | FLAG_SINGLE_POINT | FLAG_Z | FLAG_M]);
        put_points(&mut bytes, &[(3.0, 4.0)]);
        bytes.extend_from_slice(&100.0f64.to_le_bytes());
        bytes.extend_from_slice(&7.0f64.to_le_bytes());
        assert_eq!((Srid::WGS84, point!(x: 3.0, y: 4.0)), read_point(&bytes).unwrap());
    }

    #[test]
    fn test_read_version_2_with_segments() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[2, FLAG_VALID]);
        put_i32(&mut bytes, 3);
        put_points(&mut bytes, &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        put_i32(&mut bytes, 1);
        bytes.push(1);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 1);
        put_i32(&mut bytes, -1);
        put_i32(&mut bytes, 0);
        bytes.push(LINE_STRING);
        put_i32(&mut bytes, 2);
        bytes.extend_from_slice(&[1, 1]);

        assert_eq!(
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 0.0)]),
            read(&bytes).unwrap().1
        );
    }

    #[test]
    fn test_read_version_2_arcs_unsupported() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[2, FLAG_VALID]);
        put_i32(&mut bytes, 3);
        put_points(&mut bytes, &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        put_i32(&mut bytes, 1);
        bytes.push(2);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 1);
        put_i32(&mut bytes, -1);
        put_i32(&mut bytes, 0);
        bytes.push(LINE_STRING);

        match read(&bytes) {
            Err(SpatialError::Unsupported(msg)) => assert!(msg.contains("arcs")),
            e => panic!("Unexpected result {:?}", e),
        }
    }

    #[test]
    fn test_read_curve_shape_unsupported() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[2, FLAG_VALID]);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 1);
        put_i32(&mut bytes, -1);
        put_i32(&mut bytes, -1);
        bytes.push(8);

        match read(&bytes) {
            Err(SpatialError::Unsupported(msg)) => assert!(msg.contains("curves")),
            e => panic!("Unexpected result {:?}", e),
        }
    }

    #[test]
    fn test_read_unknown_shape_type() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[1, FLAG_VALID]);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 1);
        put_i32(&mut bytes, -1);
        put_i32(&mut bytes, -1);
        bytes.push(42);
        assert_eq!(Err(SpatialError::UnknownGeometryType(42)), read(&bytes));
    }

    #[test]
    fn test_read_bad_version() {
        let bytes = unhex("E6100000030C17D9CEF753D347407593180456965EC0");
        assert_eq!(
            Err(SpatialError::Unsupported("Serialization version 3".to_owned())),
            read(&bytes)
        );
    }

    #[test]
    fn test_read_truncated_and_trailing() {
        let bytes = unhex("E6100000010C17D9CEF753D347407593180456965EC0");
        assert_eq!(
            Err(SpatialError::Truncated { offset: 14, needed: 8 }),
            read(&bytes[0..bytes.len() - 2])
        );

        let mut bytes = bytes;
        bytes.push(0);
        assert_eq!(Err(SpatialError::TrailingData(22)), read(&bytes));
    }

    #[test]
    fn test_read_invalid_offsets() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[1, FLAG_VALID]);
        put_i32(&mut bytes, 1);
        put_points(&mut bytes, &[(0.0, 0.0)]);
        put_i32(&mut bytes, 1);
        bytes.push(V1_STROKE);
        put_i32(&mut bytes, 5);
        put_i32(&mut bytes, 1);
        put_i32(&mut bytes, -1);
        put_i32(&mut bytes, 0);
        bytes.push(POINT);

        assert_eq!(
            Err(SpatialError::Syntax { position: 30, message: "Invalid offset 5".to_owned() }),
            read(&bytes)
        );
    }

    #[test]
    fn test_read_invalid_parent() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[1, FLAG_VALID]);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 0);
        put_i32(&mut bytes, 2);
        put_i32(&mut bytes, -1);
        put_i32(&mut bytes, -1);
        bytes.push(GEOMETRY_COLLECTION);
        put_i32(&mut bytes, 1);
        put_i32(&mut bytes, -1);
        bytes.push(GEOMETRY_COLLECTION);

        assert_eq!(
            Err(SpatialError::Syntax { position: 27, message: "Invalid parent 1".to_owned() }),
            read(&bytes)
        );
    }

    #[test]
    fn test_read_negative_count() {
        let mut bytes = vec![];
        put_i32(&mut bytes, 4326);
        bytes.extend_from_slice(&[1, FLAG_VALID]);
        put_i32(&mut bytes, -3);
        assert_eq!(
            Err(SpatialError::Syntax {
                position: 6,
                message: "Invalid element count -3".to_owned()
            }),
            read(&bytes)
        );
    }
}
