//! Response normalization and text rendering.
//!
//! An upstream response is reduced to a status line, a JSON object of its headers, and a body
//! that is either pretty-printed JSON or the raw response text.

use crate::error::{RelayError, Result};
use hyper::ext::ReasonPhrase;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value};
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Body of an upstream response after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Render the body as it appears in the tool output.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Json(v) => pretty_json(v),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Decide how a response body is presented.
///
/// Only a response whose own `content-type` contains `application/json` is parsed. A body that
/// claims JSON but does not parse is kept as raw text.
#[must_use]
pub fn normalize_body(content_type: Option<&str>, text: String) -> ResponseBody {
    if !content_type.is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE)) {
        return ResponseBody::Text(text);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(v) => ResponseBody::Json(v),
        Err(e) => {
            debug!(error = %e, "response declared JSON but did not parse; keeping raw text");
            ResponseBody::Text(text)
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    /// Reason phrase sent by the server, or the canonical one for the status code.
    pub status_text: String,
    /// Response headers in the order the HTTP client returned them.
    pub headers: Map<String, Value>,
    pub body: ResponseBody,
}

impl RelayResponse {
    /// Read and normalize an upstream response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response body cannot be read.
    pub async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let status_text = reason_phrase(&response);
        let headers = collect_headers(response.headers());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let text = response.text().await.map_err(RelayError::from)?;
        let body = normalize_body(content_type.as_deref(), text);

        Ok(Self {
            status,
            status_text,
            headers,
            body,
        })
    }

    /// Render the success block returned to the calling agent.
    #[must_use]
    pub fn render(&self) -> String {
        let headers = Value::Object(self.headers.clone());
        format!(
            "Status: {} {}\n\nHeaders:\n{}\n\nResponse:\n{}",
            self.status.as_u16(),
            self.status_text,
            pretty_json(&headers),
            self.body.render(),
        )
    }
}

/// Render the failure block returned to the calling agent.
#[must_use]
pub fn render_error(error: &RelayError) -> String {
    format!("Error making request: {}", error.message())
}

/// Reason phrase from the status line.
///
/// hyper only records the phrase when it differs from the canonical one; otherwise the canonical
/// phrase is used, and an unknown status code gets an empty phrase.
fn reason_phrase(response: &reqwest::Response) -> String {
    if let Some(phrase) = response.extensions().get::<ReasonPhrase>() {
        return String::from_utf8_lossy(phrase.as_bytes()).into_owned();
    }
    response
        .status()
        .canonical_reason()
        .unwrap_or("")
        .to_string()
}

/// Collect headers into an insertion-ordered JSON object.
///
/// Repeated header names are combined into one comma-separated value, as the Fetch API does.
fn collect_headers(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        if let Some(Value::String(existing)) = out.get_mut(name.as_str()) {
            existing.push_str(", ");
            existing.push_str(&value);
        } else {
            out.insert(name.as_str().to_string(), Value::String(value.into_owned()));
        }
    }
    out
}

fn pretty_json(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}
