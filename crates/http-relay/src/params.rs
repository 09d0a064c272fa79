//! Parameters accepted by the `make_request` tool.

use crate::error::RelayError;
use reqwest::Method;
use rmcp::schemars;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verbs the relay accepts.
///
/// Input is matched case-insensitively; the advertised schema lists the uppercase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, schemars::JsonSchema)]
#[schemars(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Head,
        Self::Options,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether a request body may be transmitted with this verb.
    #[must_use]
    pub fn allows_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }

    #[must_use]
    pub fn to_reqwest(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
            Self::Patch => Method::PATCH,
            Self::Head => Method::HEAD,
            Self::Options => Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| RelayError::UnsupportedMethod(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct MakeRequestParams {
    #[schemars(description = "HTTP method (GET, POST, PUT, DELETE, etc.)")]
    pub method: HttpMethod,
    #[schemars(
        description = "The URL to make the request to",
        extend("format" = "uri")
    )]
    pub url: String,
    #[serde(default)]
    #[schemars(description = "Request headers")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    #[schemars(description = "Request body (for POST, PUT, etc.)")]
    pub body: Option<String>,
}
