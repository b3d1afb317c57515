use crate::bridge::{ArgMap, MethodChannel, MethodOutcome};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars::{self, JsonSchema},
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InvokeInput {
    pub method: String,
    #[serde(default)]
    pub args: ArgMap,
}

#[derive(Clone)]
pub struct BridgeServer {
    channel: Arc<MethodChannel>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BridgeServer {
    pub fn new(channel: MethodChannel) -> Self {
        Self {
            channel: Arc::new(channel),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Invoke a storage method by name with a JSON argument map")]
    pub async fn invoke(&self, input: Parameters<InvokeInput>) -> Result<CallToolResult, McpError> {
        let input = input.0;
        let reply = match self.channel.dispatch(&input.method, &input.args) {
            MethodOutcome::Value(value) => json!({ "result": value }),
            MethodOutcome::NotImplemented => json!({ "notImplemented": true }),
        };
        Ok(CallToolResult::success(vec![Content::json(reply)?]))
    }
}

#[tool_handler]
impl ServerHandler for BridgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_bridge_server(channel: MethodChannel) -> anyhow::Result<()> {
    use rmcp::transport::stdio;

    let server = BridgeServer::new(channel);
    let service = server.serve(stdio()).await?;

    service.waiting().await?;

    Ok(())
}
