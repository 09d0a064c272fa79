//! HTTP relay tool: perform one outbound HTTP request on behalf of a calling agent and return a
//! readable text rendering of the response.
//!
//! This crate is used by the `postman-mcp` server binary, which exposes it over MCP as the
//! `make_request` tool. It contains no transport or session logic.

pub mod error;
pub mod params;
pub mod response;
pub mod runtime;

pub use error::{RelayError, Result};
pub use params::{HttpMethod, MakeRequestParams};
pub use response::{RelayResponse, ResponseBody};
pub use runtime::{HttpRelay, OutgoingRequest};
