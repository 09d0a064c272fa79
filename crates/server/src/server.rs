//! MCP server handler exposing the `make_request` tool.

use postman_mcp_http_relay::{HttpRelay, MakeRequestParams};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData, ServerHandler, tool, tool_handler, tool_router};

pub const SERVER_NAME: &str = "postman-mcp";

#[derive(Debug, Clone)]
pub struct RelayServer {
    relay: HttpRelay,
    tool_router: ToolRouter<RelayServer>,
}

impl RelayServer {
    pub fn new(relay: HttpRelay) -> Self {
        Self {
            relay,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl RelayServer {
    #[tool(description = "Make an HTTP request using specified method, URL, headers, and body")]
    async fn make_request(
        &self,
        Parameters(params): Parameters<MakeRequestParams>,
    ) -> Result<CallToolResult, ErrorData> {
        tracing::info!(method = %params.method, url = %params.url, "make_request");
        Ok(self.relay.make_request(params).await)
    }
}

#[tool_handler]
impl ServerHandler for RelayServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info,
            instructions: None,
            ..Default::default()
        }
    }
}
