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

//! Error types for spatial values and codecs.

/// Errors raised while validating spatial values or decoding spatial encodings.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SpatialError {
    /// Indicates that a point had no coordinates where a point was required.
    #[error("Empty points are not supported")]
    EmptyPoint,

    /// Indicates a coordinate that is not a finite number or that is out of range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Indicates a malformed encoding.
    #[error("Syntax error at byte {position}: {message}")]
    Syntax {
        /// Byte offset into the input where the problem was detected.
        position: usize,

        /// Description of the problem.
        message: String,
    },

    /// Indicates that the input ended before the value was fully decoded.
    #[error("Unexpected end of input at byte {offset}; needed {needed} more bytes")]
    Truncated {
        /// Byte offset into the input where the read was attempted.
        offset: usize,

        /// Number of bytes that were required.
        needed: usize,
    },

    /// Indicates that there was data left after decoding a complete value.
    #[error("Unexpected trailing data at byte {0}")]
    TrailingData(usize),

    /// Indicates a valid encoding of a geometry that is not the one the caller asked for.
    #[error("Expected a {expected} but got a {actual}")]
    UnexpectedGeometry {
        /// Name of the requested geometry type.
        expected: &'static str,

        /// Name of the geometry type that was found.
        actual: &'static str,
    },

    /// Indicates an unknown geometry type code in a binary encoding.
    #[error("Unknown geometry type {0}")]
    UnknownGeometryType(u32),

    /// Indicates a valid encoding that uses features we do not handle.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for this crate.
pub type SpatialResult<T> = Result<T, SpatialError>;
