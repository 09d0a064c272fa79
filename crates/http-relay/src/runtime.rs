//! Runtime for the `make_request` relay tool.
//!
//! One invocation is one outbound request: resolve the outgoing request from the tool
//! parameters, send it, normalize the response, and collapse the outcome into a text result.

use crate::error::{RelayError, Result};
use crate::params::{HttpMethod, MakeRequestParams};
use crate::response::{RelayResponse, render_error};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use rmcp::model::{CallToolResult, Content};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl OutgoingRequest {
    /// Resolve the outbound request for a set of tool parameters.
    ///
    /// - `Content-Type` keeps the caller's value when one is present (any casing), otherwise it
    ///   is `application/json`.
    /// - Other headers pass through as given.
    /// - A body is only attached for verbs that carry one, and only if it is non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or a header name/value is not valid HTTP.
    pub fn from_params(params: MakeRequestParams) -> Result<Self> {
        let url = Url::parse(&params.url).map_err(|source| RelayError::InvalidUrl {
            url: params.url.clone(),
            source,
        })?;

        let headers = build_headers(params.headers.as_ref())?;

        let body = params
            .body
            .filter(|b| params.method.allows_body() && !b.is_empty());

        Ok(Self {
            method: params.method,
            url,
            headers,
            body,
        })
    }
}

fn build_headers(supplied: Option<&BTreeMap<String, String>>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in supplied.into_iter().flatten() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| RelayError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| RelayError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.append(header_name, header_value);
    }

    // `HeaderMap` lookups ignore case, so one lookup covers `Content-Type` and `content-type`.
    // Keys arrive sorted, so a literal `Content-Type` entry is seen first. Empty values do not
    // count as a caller choice.
    let content_type = headers
        .get_all(CONTENT_TYPE)
        .iter()
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(CONTENT_TYPE, content_type);

    Ok(headers)
}

/// Executes relay requests.
///
/// Cheap to clone; clones share the underlying HTTP client. Invocations are independent and
/// keep no state between calls.
#[derive(Debug, Clone, Default)]
pub struct HttpRelay {
    client: Client,
}

impl HttpRelay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Perform one outbound request and normalize its response.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input (URL, headers) and for any transport failure while
    /// sending the request or reading the response body.
    pub async fn execute(&self, params: MakeRequestParams) -> Result<RelayResponse> {
        let outgoing = OutgoingRequest::from_params(params)?;
        self.send(outgoing).await
    }

    /// Send an already resolved request.
    ///
    /// # Errors
    ///
    /// Returns an error for any transport failure while sending the request or reading the
    /// response body.
    pub async fn send(&self, outgoing: OutgoingRequest) -> Result<RelayResponse> {
        debug!(
            method = %outgoing.method,
            url = %outgoing.url,
            has_body = outgoing.body.is_some(),
            "sending request"
        );

        let mut request = self
            .client
            .request(outgoing.method.to_reqwest(), outgoing.url)
            .headers(outgoing.headers);
        if let Some(body) = outgoing.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        debug!(status = response.status().as_u16(), "received response");

        RelayResponse::read(response).await
    }

    /// Run the `make_request` tool.
    ///
    /// Never fails: errors are rendered into the text payload of a successful tool result.
    pub async fn make_request(&self, params: MakeRequestParams) -> CallToolResult {
        CallToolResult::success(vec![Content::text(self.make_request_text(params).await)])
    }

    /// Same as [`HttpRelay::make_request`], returning the rendered text directly.
    pub async fn make_request_text(&self, params: MakeRequestParams) -> String {
        match self.execute(params).await {
            Ok(response) => response.render(),
            Err(e) => {
                warn!(error = %e, "request failed");
                render_error(&e)
            }
        }
    }
}
