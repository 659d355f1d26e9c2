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

//! Shared building blocks for the HTTP layer of a service.
//!
//! Each service exposes an `app` function that builds its `axum::Router`, with one source file
//! per API named `<entity>_<method>.rs`.  The tests of an API live next to its handler and go
//! through a `route` function that returns the method and path under test, so that every test in
//! the file exercises the same endpoint.
//!
//! Handlers return `RestResult`.  Errors from the lower layers convert into `RestError` via `?`
//! and are rendered as a JSON object with a single `message` field.

use crate::driver::DriverError;
use crate::model::ModelError;
use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde::{Deserialize, Serialize};

/// Number of seconds clients are told to wait before retrying when the service is unavailable.
const RETRY_AFTER_SECS: u32 = 5;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates that the backing store could not be reached, even after retrying.
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl RestError {
    /// Returns the HTTP status code that represents this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::PayloadNotEmpty => StatusCode::PAYLOAD_TOO_LARGE,
            RestError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) | DriverError::InvalidInput(_) => {
                RestError::InvalidRequest(e.to_string())
            }
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::Unavailable(_) => RestError::ServiceUnavailable(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse { message: self.to_string() });

        match self {
            RestError::InternalError(message) => {
                error!("Request failed with internal error: {}", message);
                (status, body).into_response()
            }
            RestError::ServiceUnavailable(message) => {
                warn!("Request failed because the service is unavailable: {}", message);
                (status, [(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS))], body)
                    .into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Body of every error response.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorResponse {
    /// Textual representation of the error message.
    pub(crate) message: String,
}

/// A request body extractor that rejects any content.
///
/// All APIs of a read-only gateway should take this so that clients sending a payload learn
/// early that it is ignored.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> RestResult<Self> {
        match req.into_body().is_end_stream() {
            true => Ok(EmptyBody {}),
            false => Err(RestError::PayloadNotEmpty),
        }
    }
}

/// Common test code for the REST server.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::body::{Body, Bytes};
    use axum::http::{self, HeaderMap, HeaderName};
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    /// Maximum body size for testing purposes.
    const MAX_BODY_SIZE: usize = 64 * 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Method of the request.
        method: http::Method,

        /// Path of the request, without the query.
        path: String,

        /// Already-encoded query string, if any.
        query: Option<String>,

        /// Headers to send with the request.
        headers: HeaderMap,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`path` pair served by an `app` router.
        pub fn new<P: Into<String>>(app: Router, (method, path): (http::Method, P)) -> Self {
            Self { app, method, path: path.into(), query: None, headers: HeaderMap::new() }
        }

        /// Sets the query of the request to the URL encoding of `query`.
        pub fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
            assert!(self.query.is_none(), "Query already set for {}", self.path);
            self.query = Some(serde_urlencoded::to_string(query).unwrap());
            self
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<V: TryInto<HeaderValue>>(mut self, name: HeaderName, value: V) -> Self
        where
            V::Error: std::fmt::Debug,
        {
            self.headers.insert(name, value.try_into().unwrap());
            self
        }

        /// Sends the request with `body` as its payload.
        async fn send(self, body: Body) -> ResponseChecker {
            let uri = match self.query {
                Some(query) => format!("{}?{}", self.path, query),
                None => self.path,
            };
            let mut request = Request::builder().method(self.method).uri(uri).body(body).unwrap();
            request.headers_mut().extend(self.headers);
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            self.send(Body::empty()).await
        }

        /// Finishes building the request and sends it with a text payload.
        pub async fn send_text<T: Into<String>>(mut self, text: T) -> ResponseChecker {
            let content_type = HeaderValue::from_str(mime::TEXT_PLAIN.as_ref()).unwrap();
            self.headers.insert(http::header::CONTENT_TYPE, content_type);
            self.send(Body::from(text.into())).await
        }
    }

    /// Type alias for the complex type returned by the `oneshot` function.
    type HttpResponse = hyper::Response<Body>;

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: HttpResponse,

        /// Expected HTTP status code in the response above.
        exp_status: StatusCode,

        /// Headers that must be present in the response with the given values.
        exp_headers: Vec<(HeaderName, String)>,
    }

    impl From<HttpResponse> for ResponseChecker {
        fn from(response: HttpResponse) -> Self {
            Self { response, exp_status: StatusCode::OK, exp_headers: vec![] }
        }
    }

    impl ResponseChecker {
        /// Sets the expected exit HTTP status to `status`.
        pub fn expect_status(mut self, status: StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Expects the response to carry a header `name` set to `value`.
        pub fn expect_header<V: Into<String>>(mut self, name: HeaderName, value: V) -> Self {
            self.exp_headers.push((name, value.into()));
            self
        }

        /// Validates the status and headers of the response and returns its body.
        async fn verify(self) -> Bytes {
            assert_eq!(self.exp_status, self.response.status());
            for (name, value) in self.exp_headers {
                match self.response.headers().get(&name) {
                    Some(actual) => assert_eq!(value, actual.to_str().unwrap(), "Header {}", name),
                    None => panic!("Header {} not in response", name),
                }
            }
            axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap()
        }

        /// Finishes checking the response and expects its body to be valid UTF-8 text that
        /// matches `exp_re`.  Useful for errors raised by axum's own extractors.
        pub async fn expect_text(self, exp_re: &str) {
            let body = String::from_utf8(self.verify().await.to_vec()).unwrap();
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(re.is_match(&body), "Body content '{}' does not match re '{}'", body, exp_re);
        }

        /// Finishes checking the response and expects its body to be an `ErrorResponse` whose
        /// message matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            let body = self.verify().await;
            let response: ErrorResponse = serde_json::from_slice(&body).unwrap_or_else(|e| {
                panic!(
                    "Invalid error response due to {}; content was {}",
                    e,
                    String::from_utf8_lossy(&body)
                )
            });
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&response.message),
                "Error message '{}' does not match re '{}'",
                response.message,
                exp_re
            );
        }

        /// Finishes checking the response and expects it to contain a valid JSON object of
        /// type `T`.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            serde_json::from_slice::<T>(&self.verify().await).unwrap()
        }
    }

    /// Generates a test to verify that an API that does not expect a payload fails as necessary.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("should not be here")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}
