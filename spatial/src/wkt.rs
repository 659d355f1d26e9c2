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

//! Codec for the OGC Well-Known Text (WKT) representation of 2D geometries.
//!
//! The writer produces the compact form emitted by PostGIS (no spaces after commas or before
//! opening parenthesis, shortest round-tripping numbers) so that values can be compared verbatim
//! with what the database returns.  The reader is lenient about whitespace and case, and accepts
//! the `SRID=n;` prefix of the extended PostGIS flavor (EWKT).

use crate::coords::Srid;
use crate::{SpatialError, SpatialResult, empty_point, is_empty_point, require_point};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use std::fmt::Write;

/// Maximum nesting of geometry collections accepted by the reader.
const MAX_DEPTH: usize = 32;

/// Appends a single position as `x y`.
fn write_coord(out: &mut String, c: Coord<f64>) {
    // Writing into a String never fails.
    let _ = write!(out, "{} {}", c.x, c.y);
}

/// Appends a parenthesized sequence of positions, or `EMPTY`.
fn write_coords(out: &mut String, ls: &LineString<f64>) {
    if ls.0.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    out.push('(');
    for (i, c) in ls.0.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_coord(out, *c);
    }
    out.push(')');
}

/// Appends the parenthesized rings of a polygon, or `EMPTY`.
fn write_rings(out: &mut String, polygon: &Polygon<f64>) {
    if polygon.exterior().0.is_empty() && polygon.interiors().is_empty() {
        out.push_str("EMPTY");
        return;
    }
    out.push('(');
    write_coords(out, polygon.exterior());
    for ring in polygon.interiors() {
        out.push(',');
        write_coords(out, ring);
    }
    out.push(')');
}

/// Appends a parenthesized list of members formatted by `each`, or `EMPTY` if there are none.
fn write_members<T, F>(out: &mut String, members: &[T], each: F)
where
    F: Fn(&mut String, &T),
{
    if members.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    out.push('(');
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        each(out, member);
    }
    out.push(')');
}

/// Appends a point in the parenthesized form used inside multi-points.
fn write_point_body(out: &mut String, p: &Point<f64>) {
    if is_empty_point(p) {
        out.push_str("EMPTY");
    } else {
        out.push('(');
        write_coord(out, p.0);
        out.push(')');
    }
}

/// Appends any geometry, tagged with its type.
fn write_geometry(out: &mut String, geometry: &Geometry<f64>) {
    match geometry {
        Geometry::Point(p) => {
            out.push_str("POINT");
            if is_empty_point(p) {
                out.push(' ');
            }
            write_point_body(out, p);
        }
        Geometry::Line(line) => {
            out.push_str("LINESTRING");
            write_coords(out, &LineString::new(vec![line.start, line.end]));
        }
        Geometry::LineString(ls) => {
            out.push_str("LINESTRING");
            if ls.0.is_empty() {
                out.push(' ');
            }
            write_coords(out, ls);
        }
        Geometry::Polygon(polygon) => write_polygon(out, polygon),
        Geometry::Rect(rect) => write_polygon(out, &rect.to_polygon()),
        Geometry::Triangle(triangle) => write_polygon(out, &triangle.to_polygon()),
        Geometry::MultiPoint(mp) => {
            out.push_str("MULTIPOINT");
            if mp.0.is_empty() {
                out.push(' ');
            }
            write_members(out, &mp.0, write_point_body);
        }
        Geometry::MultiLineString(mls) => {
            out.push_str("MULTILINESTRING");
            if mls.0.is_empty() {
                out.push(' ');
            }
            write_members(out, &mls.0, write_coords);
        }
        Geometry::MultiPolygon(mp) => {
            out.push_str("MULTIPOLYGON");
            if mp.0.is_empty() {
                out.push(' ');
            }
            write_members(out, &mp.0, write_rings);
        }
        Geometry::GeometryCollection(gc) => {
            out.push_str("GEOMETRYCOLLECTION");
            if gc.0.is_empty() {
                out.push(' ');
            }
            write_members(out, &gc.0, write_geometry);
        }
    }
}

/// Appends a polygon geometry.
fn write_polygon(out: &mut String, polygon: &Polygon<f64>) {
    out.push_str("POLYGON");
    if polygon.exterior().0.is_empty() && polygon.interiors().is_empty() {
        out.push(' ');
    }
    write_rings(out, polygon);
}

/// Formats `geometry` as WKT.
///
/// `Line`, `Rect` and `Triangle` values, which have no WKT counterpart, are written as the
/// equivalent line string or polygon.  Points with any NaN coordinate are written as `EMPTY`.
pub fn write(geometry: &Geometry<f64>) -> String {
    let mut out = String::new();
    write_geometry(&mut out, geometry);
    out
}

/// Formats `geometry` as EWKT, prefixing it with the given `srid`.
pub fn write_with_srid(geometry: &Geometry<f64>, srid: Srid) -> String {
    let mut out = format!("SRID={};", srid);
    write_geometry(&mut out, geometry);
    out
}

/// Recursive-descent parser over a WKT string.
struct Parser<'a> {
    /// Input being parsed.
    input: &'a str,

    /// Byte offset of the next character to consume.
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Constructs a syntax error at the current position.
    fn error<T, S: Into<String>>(&self, message: S) -> SpatialResult<T> {
        Err(SpatialError::Syntax { position: self.pos, message: message.into() })
    }

    /// Describes the next token for use in error messages.
    fn describe_next(&self) -> String {
        match self.input[self.pos..].chars().next() {
            Some(ch) => format!("'{}'", ch),
            None => "end of input".to_owned(),
        }
    }

    /// Skips whitespace and returns the next byte without consuming it.
    fn peek(&mut self) -> Option<u8> {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Consumes `ch` if it is the next non-whitespace character.
    fn accept(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `ch`, which must be the next non-whitespace character.
    fn expect(&mut self, ch: u8) -> SpatialResult<()> {
        if self.accept(ch) {
            Ok(())
        } else {
            let found = self.describe_next();
            self.error(format!("Expected '{}' but found {}", ch as char, found))
        }
    }

    /// Consumes a run of bytes matching `pred` after skipping whitespace.
    fn token<P: Fn(u8) -> bool>(&mut self, pred: P) -> &'a str {
        self.peek();
        let start = self.pos;
        let len = self.input.as_bytes()[start..].iter().take_while(|b| pred(**b)).count();
        self.pos += len;
        &self.input[start..start + len]
    }

    /// Consumes an alphabetic keyword and returns it in uppercase.
    fn keyword(&mut self) -> SpatialResult<String> {
        let word = self.token(|b| b.is_ascii_alphabetic());
        if word.is_empty() {
            let found = self.describe_next();
            return self.error(format!("Expected a keyword but found {}", found));
        }
        Ok(word.to_ascii_uppercase())
    }

    /// Consumes a finite floating point number.
    fn number(&mut self) -> SpatialResult<f64> {
        self.peek();
        let start = self.pos;
        let text = self.token(|b| b.is_ascii_digit() || b"+-.eE".contains(&b));
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => {
                self.pos = start;
                self.error(format!("Number {} is out of range", text))
            }
            Err(_) => {
                self.pos = start;
                let found = self.describe_next();
                self.error(format!("Expected a number but found {}", found))
            }
        }
    }

    /// Consumes the optional `SRID=n;` prefix.
    fn srid(&mut self) -> SpatialResult<Option<Srid>> {
        self.peek();
        let rest = &self.input.as_bytes()[self.pos..];
        if rest.len() < 4 || !rest[0..4].eq_ignore_ascii_case(b"SRID") {
            return Ok(None);
        }
        self.pos += 4;
        self.expect(b'=')?;
        self.peek();
        let start = self.pos;
        let text = self.token(|b| b.is_ascii_digit() || b == b'-');
        let code = match text.parse::<i32>() {
            Ok(code) => code,
            Err(_) => {
                self.pos = start;
                return self.error(format!("Invalid SRID '{}'", text));
            }
        };
        self.expect(b';')?;
        Ok(Some(Srid::new(code)))
    }

    /// Consumes the `EMPTY` keyword if it comes next.
    fn accept_empty(&mut self) -> bool {
        let rest = &self.input.as_bytes()[self.pos..];
        let word_len = rest.iter().take_while(|b| b.is_ascii_alphabetic()).count();
        if rest[0..word_len].eq_ignore_ascii_case(b"EMPTY") {
            self.pos += word_len;
            true
        } else {
            false
        }
    }

    /// Fails if the next token is a dimension qualifier like `Z`, `M` or `ZM`.
    fn reject_dimensions(&mut self) -> SpatialResult<()> {
        self.peek();
        let rest = &self.input.as_bytes()[self.pos..];
        let word_len = rest.iter().take_while(|b| b.is_ascii_alphabetic()).count();
        let word = &rest[0..word_len];
        if [&b"Z"[..], b"M", b"ZM"].iter().any(|d| word.eq_ignore_ascii_case(d)) {
            return Err(SpatialError::Unsupported("Geometries with Z or M values".to_owned()));
        }
        Ok(())
    }

    /// Consumes a position of exactly two numbers.
    fn coord(&mut self) -> SpatialResult<Coord<f64>> {
        let x = self.number()?;
        let y = self.number()?;
        if matches!(self.peek(), Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.')
        {
            return Err(SpatialError::Unsupported("Geometries with Z or M values".to_owned()));
        }
        Ok(Coord { x, y })
    }

    /// Consumes a parenthesized list of items parsed by `each`, or `EMPTY`.
    fn list<T, F>(&mut self, mut each: F) -> SpatialResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> SpatialResult<T>,
    {
        self.peek();
        if self.accept_empty() {
            return Ok(vec![]);
        }
        self.expect(b'(')?;
        let mut items = vec![each(self)?];
        while self.accept(b',') {
            items.push(each(self)?);
        }
        self.expect(b')')?;
        Ok(items)
    }

    /// Consumes the body of a line string or ring.
    fn coords(&mut self) -> SpatialResult<LineString<f64>> {
        Ok(LineString::new(self.list(Self::coord)?))
    }

    /// Consumes the body of a polygon.
    fn rings(&mut self) -> SpatialResult<Polygon<f64>> {
        let mut rings = self.list(Self::coords)?.into_iter();
        match rings.next() {
            Some(exterior) => Ok(Polygon::new(exterior, rings.collect())),
            None => Ok(Polygon::new(LineString::new(vec![]), vec![])),
        }
    }

    /// Consumes a member of a multi-point, which may or may not be parenthesized.
    fn multi_point_member(&mut self) -> SpatialResult<Point<f64>> {
        self.peek();
        if self.accept_empty() {
            return Ok(empty_point());
        }
        if self.accept(b'(') {
            let c = self.coord()?;
            self.expect(b')')?;
            Ok(Point(c))
        } else {
            Ok(Point(self.coord()?))
        }
    }

    /// Consumes a whole tagged geometry.
    fn geometry(&mut self, depth: usize) -> SpatialResult<Geometry<f64>> {
        if depth > MAX_DEPTH {
            return self.error(format!("Geometries nested more than {} levels deep", MAX_DEPTH));
        }

        let start = self.pos;
        let keyword = self.keyword()?;
        let base = keyword.trim_end_matches(['Z', 'M']);
        let known = [
            "POINT",
            "LINESTRING",
            "POLYGON",
            "MULTIPOINT",
            "MULTILINESTRING",
            "MULTIPOLYGON",
            "GEOMETRYCOLLECTION",
        ];
        if base != keyword && known.contains(&base) {
            return Err(SpatialError::Unsupported("Geometries with Z or M values".to_owned()));
        }
        self.reject_dimensions()?;

        Ok(match keyword.as_str() {
            "POINT" => {
                let mut coords = self.list(Self::coord)?;
                match coords.len() {
                    0 => Geometry::Point(empty_point()),
                    1 => Geometry::Point(Point(coords.remove(0))),
                    _ => return self.error("Points must have exactly one position"),
                }
            }
            "LINESTRING" => Geometry::LineString(self.coords()?),
            "POLYGON" => Geometry::Polygon(self.rings()?),
            "MULTIPOINT" => {
                Geometry::MultiPoint(MultiPoint::new(self.list(Self::multi_point_member)?))
            }
            "MULTILINESTRING" => {
                Geometry::MultiLineString(MultiLineString::new(self.list(Self::coords)?))
            }
            "MULTIPOLYGON" => Geometry::MultiPolygon(MultiPolygon::new(self.list(Self::rings)?)),
            "GEOMETRYCOLLECTION" => Geometry::GeometryCollection(GeometryCollection::new_from(
                self.list(|p| p.geometry(depth + 1))?,
            )),
            _ => {
                self.pos = start;
                self.peek();
                return self.error(format!("Unknown geometry type '{}'", keyword));
            }
        })
    }
}

/// Parses a geometry from WKT or EWKT, returning the SRID if the input carried one.
pub fn read_with_srid(input: &str) -> SpatialResult<(Option<Srid>, Geometry<f64>)> {
    let mut parser = Parser { input, pos: 0 };
    let srid = parser.srid()?;
    let geometry = parser.geometry(0)?;
    if parser.peek().is_some() {
        let found = parser.describe_next();
        return parser.error(format!("Expected end of input but found {}", found));
    }
    Ok((srid, geometry))
}

/// Parses a geometry from WKT or EWKT.
pub fn read(input: &str) -> SpatialResult<Geometry<f64>> {
    Ok(read_with_srid(input)?.1)
}

/// Parses a point from WKT or EWKT, failing if the input holds any other geometry or if the
/// point is `EMPTY`.
pub fn read_point(input: &str) -> SpatialResult<Point<f64>> {
    require_point(read(input)?)
}
