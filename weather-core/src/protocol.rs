//! Resource payloads and the static tool/resource descriptors, in MCP's camelCase shape.

use serde::Serialize;
use serde_json::{Value, json};

use crate::model::ToolName;

pub const JSON_MIME: &str = "application/json";
pub const ALERTS_URI_TEMPLATE: &str = "weather://{state}/alerts";
pub const EXAMPLE_RESOURCE_URI: &str = "weather://example/current";

/// Result of a resource read: a single JSON text block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub mime_type: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: &'static str,
    pub name: &'static str,
    pub mime_type: &'static str,
    pub description: &'static str,
}

impl ToolName {
    pub fn descriptor(&self) -> ToolDescriptor {
        match self {
            ToolName::GetAlerts => ToolDescriptor {
                name: self.as_str(),
                description: "Get weather alerts for a US state",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "state": {
                            "type": "string",
                            "description": "Two-letter US state code (e.g. CA, NY)",
                        },
                    },
                    "required": ["state"],
                }),
            },
            ToolName::GetForecast => ToolDescriptor {
                name: self.as_str(),
                description: "Get weather forecast for a location",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "latitude": {
                            "type": "number",
                            "description": "Latitude of the location",
                            "minimum": -90,
                            "maximum": 90,
                        },
                        "longitude": {
                            "type": "number",
                            "description": "Longitude of the location",
                            "minimum": -180,
                            "maximum": 180,
                        },
                    },
                    "required": ["latitude", "longitude"],
                }),
            },
        }
    }
}

pub fn tools() -> Vec<ToolDescriptor> {
    ToolName::all().iter().map(ToolName::descriptor).collect()
}

pub fn resources() -> Vec<ResourceDescriptor> {
    vec![ResourceDescriptor {
        uri: EXAMPLE_RESOURCE_URI,
        name: "Current weather example",
        mime_type: JSON_MIME,
        description: "Example resource for demonstration purposes",
    }]
}

pub fn resource_templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: ALERTS_URI_TEMPLATE,
        name: "Weather alerts for a US state",
        mime_type: JSON_MIME,
        description: "Current weather alerts for a specified US state",
    }]
}
