//! MCP endpoint: JSON-RPC 2.0 over HTTP POST.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::tools::AcTools;

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "SwitchBot AC Controller";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// `None` only when the member is absent; `"id": null` is kept as `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub struct McpServer {
    tools: AcTools,
    api_key: Option<String>,
}

impl McpServer {
    pub fn new(tools: AcTools, api_key: Option<String>) -> Self {
        Self {
            tools,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// With no API key configured every request is accepted.
    pub fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.api_key.as_deref() else {
            return true;
        };
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let provided = header("x-api-key").or_else(|| {
            header("authorization").map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
        });
        provided == Some(expected)
    }

    /// `None` for notifications, which get no response body.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "MCP request");
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification acknowledged");
            return None;
        };
        let id = Some(id);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({"tools": AcTools::definitions()})),
            "tools/call" => self.call_tool(id, request.params).await,
            other => JsonRpcResponse::error(id, -32601, format!("Method not found: {other}")),
        };
        Some(response)
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, -32602, "Missing params");
        };
        let Some(name) = params.get("name").and_then(|n| n.as_str()) else {
            return JsonRpcResponse::error(id, -32602, "Missing tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        info!(tool = %name, "calling tool");
        let text = self.tools.call(name, arguments).await;
        let is_error = text.starts_with("Error");
        JsonRpcResponse::success(
            id,
            json!({
                "content": [{"type": "text", "text": text}],
                "isError": is_error
            }),
        )
    }
}

pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/", post(rpc_handler))
        .route("/mcp", post(rpc_handler))
        .route("/health", get(health))
        .with_state(server)
}

async fn health() -> &'static str {
    "OK"
}

async fn rpc_handler(
    State(server): State<Arc<McpServer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !server.authorized(&headers) {
        warn!("rejected request with invalid API key");
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid or missing API key. Provide X-API-Key header.",
        )
            .into_response();
    }
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) if e.is_syntax() || e.is_eof() => {
            debug!("unparseable JSON-RPC body: {e}");
            return Json(JsonRpcResponse::error(None, -32700, format!("Parse error: {e}")))
                .into_response();
        }
        Err(e) => {
            debug!("invalid JSON-RPC request: {e}");
            return Json(JsonRpcResponse::error(None, -32600, format!("Invalid Request: {e}")))
                .into_response();
        }
    };
    match server.handle(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SwitchBotClient;
    use crate::controller::AcController;
    use crate::sign::Credentials;
    use crate::types::Defaults;

    fn server(api_key: Option<&str>) -> McpServer {
        let client = SwitchBotClient::builder(Credentials::new("T", "S"))
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let controller = AcController::new(client, "AC1", Defaults::default());
        McpServer::new(AcTools::new(controller), api_key.map(str::to_string))
    }

    fn request(id: Option<Value>, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn initialize_reports_tools_capability() {
        let resp = server(None)
            .handle(request(Some(json!(1)), "initialize", None))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(resp.id, Some(json!(1)));
    }

    #[tokio::test]
    async fn tools_list_includes_schemas() {
        let resp = server(None)
            .handle(request(Some(json!("a")), "tools/list", None))
            .await
            .unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        let turn_on = tools.iter().find(|t| t["name"] == "turn_ac_on").unwrap();
        assert_eq!(turn_on["inputSchema"]["properties"]["temperature"]["maximum"], 30);
    }

    #[tokio::test]
    async fn tools_call_offline_tool() {
        let resp = server(None)
            .handle(request(
                Some(json!(2)),
                "tools/call",
                Some(json!({"name": "list_common_ac_commands"})),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], false);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("swing"));
    }

    #[tokio::test]
    async fn tools_call_invalid_arguments_is_tool_error() {
        let resp = server(None)
            .handle(request(
                Some(json!(3)),
                "tools/call",
                Some(json!({"name": "set_ac_mode", "arguments": {"mode": "blast"}})),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().starts_with("Error:"));
    }

    #[tokio::test]
    async fn protocol_errors() {
        let s = server(None);
        let resp = s.handle(request(Some(json!(4)), "nope", None)).await.unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);

        let resp = s.handle(request(Some(json!(5)), "tools/call", None)).await.unwrap();
        assert_eq!(resp.error.unwrap().code, -32602);

        assert!(s.handle(request(None, "notifications/initialized", None)).await.is_none());
    }

    #[tokio::test]
    async fn null_id_is_a_request() {
        let request: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "ping"})).unwrap();
        assert_eq!(request.id, Some(Value::Null));
        let resp = server(None).handle(request).await.unwrap();
        assert_eq!(resp.id, Some(Value::Null));
        assert!(resp.result.is_some());

        let request: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert_eq!(request.id, None);
    }

    async fn post_raw(body: &str) -> (StatusCode, Value) {
        use tower::ServiceExt;

        let app = router(Arc::new(server(None)));
        let resp = app
            .oneshot(
                axum::http::Request::post("/mcp")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_rpc_errors() {
        let (status, body) = post_raw("{not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);

        let (_, body) = post_raw(r#"{"jsonrpc": "2.0", "id": 1}"#).await;
        assert_eq!(body["error"]["code"], -32600);

        let (status, body) = post_raw(r#"{"jsonrpc": "2.0", "id": null, "method": "ping"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["result"].is_object());
    }

    #[test]
    fn api_key_gate() {
        let s = server(Some("k3y"));
        let mut headers = HeaderMap::new();
        assert!(!s.authorized(&headers));
        headers.insert("x-api-key", "k3y".parse().unwrap());
        assert!(s.authorized(&headers));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer k3y".parse().unwrap());
        assert!(s.authorized(&headers));
        headers.insert("authorization", "Bearer wrong".parse().unwrap());
        assert!(!s.authorized(&headers));

        assert!(server(None).authorized(&HeaderMap::new()));
        assert!(server(Some("")).authorized(&HeaderMap::new()));
    }
}
