//! MCP surface: rmcp's [`ServerHandler`] on top of the core [`Dispatcher`].
//!
//! Tool failures come back as error-flagged tool results. Resource failures are
//! protocol errors carrying the failure kind in `data.kind`.

use rmcp::{
    ErrorData, RoleServer, ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Content, ErrorCode, Implementation, JsonObject,
        ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, PaginatedRequestParams,
        ProtocolVersion, ReadResourceRequestParams, ReadResourceResult, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use weather_core::{
    Dispatcher, ErrorKind, Reply, Request, ResourceContents, ToolName, WeatherError, protocol,
};

pub const SERVER_NAME: &str = "weather-server";

#[derive(Debug)]
pub struct WeatherServer {
    dispatcher: Dispatcher,
}

impl WeatherServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn invoke_tool(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        let tool = ToolName::try_from(name).ok();

        match self.dispatcher.dispatch(&Request::invoke(name, arguments)).await {
            Ok(reply) => CallToolResult::success(vec![Content::text(reply.into_text())]),
            Err(err) => CallToolResult::error(vec![Content::text(err.user_message(tool))]),
        }
    }

    pub async fn read_uri(&self, uri: &str) -> Result<ReadResourceResult, ErrorData> {
        let reply = self.dispatcher.dispatch(&Request::read(uri)).await.map_err(|e| error_data(&e))?;

        let contents = match reply {
            Reply::Resource(contents) => contents,
            Reply::Text(text) => ResourceContents { uri: uri.to_string(), mime_type: "text/plain".into(), text },
        };
        into_model(json!({ "contents": [contents] }))
    }
}

impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "US weather from the National Weather Service. \
                 get_alerts takes a two-letter state code; get_forecast takes latitude and longitude. \
                 Raw alert features are readable at weather://{state}/alerts."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(into_model(protocol::tools())?))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.invoke_tool(&request.name, request.arguments.unwrap_or_default()).await)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult::with_all_items(into_model(protocol::resources())?))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(ListResourceTemplatesResult::with_all_items(into_model(protocol::resource_templates())?))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        self.read_uri(&request.uri).await
    }
}

pub fn error_data(err: &WeatherError) -> ErrorData {
    let code = match err.kind() {
        ErrorKind::UnknownOperation => ErrorCode::METHOD_NOT_FOUND,
        ErrorKind::UnsupportedResource => ErrorCode::INVALID_REQUEST,
        ErrorKind::ValidationFailure => ErrorCode::INVALID_PARAMS,
        ErrorKind::LocationNotSupported | ErrorKind::UpstreamError | ErrorKind::TransportFailure => {
            ErrorCode::INTERNAL_ERROR
        }
    };

    ErrorData::new(code, err.to_string(), Some(json!({ "kind": err.kind().as_str() })))
}

/// The core descriptors already serialize to MCP's wire shape; read them back as rmcp model types.
fn into_model<T: DeserializeOwned>(value: impl Serialize) -> Result<T, ErrorData> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| ErrorData::internal_error(format!("invalid descriptor: {e}"), None))
}
