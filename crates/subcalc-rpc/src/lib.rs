//! JSON-RPC 2.0 server for the subnet calculator
//!
//! Exposes the calculator to other processes over JSON-RPC 2.0. This is the
//! boundary layer: it owns request parsing, per-caller rate limiting and
//! logging, and hands plain strings to the pure calculation functions.
//!
//! # Methods
//!
//! - `calculate` - network details for `ip_address` + `network_spec`
//! - `address_info` - classification and representations of one address
//! - `summarize` - minimal CIDR list for the range `first`..=`last`
//! - `ping`
//!
//! # Examples
//!
//! ```
//! use subcalc_rpc::{RpcServer, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = RpcServer::new(ServerConfig::default())?;
//!
//! let request = r#"{
//!     "jsonrpc": "2.0",
//!     "method": "calculate",
//!     "params": {"ip_address": "192.168.1.10", "network_spec": "31"},
//!     "id": 1
//! }"#;
//!
//! let response = server.handle_request(request).await?;
//! println!("Response: {}", response);
//! # Ok(())
//! # }
//! ```

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use subcalc_cidr::report::{calculate, describe_address, summarize_range};
use thiserror::Error;
use tracing::{debug, warn};

mod config;
pub mod transport;

pub use config::{ServerConfig, RATE_LIMIT_DISABLED_ENV, RATE_LIMIT_ENV};

/// Caller key used when a request does not identify itself
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// RPC server errors
#[derive(Error, Debug)]
pub enum RpcError {
    /// JSON-RPC parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid method parameters
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Caller exceeded its request budget
    #[error("Rate limit exceeded for {0}")]
    RateLimited(String),

    /// Bad server configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, RpcError>;

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn new(code: i32, msg: &str) -> Self {
        Self {
            code,
            message: msg.to_string(),
            data: None,
        }
    }
}

impl From<&RpcError> for JsonRpcError {
    fn from(err: &RpcError) -> Self {
        let code = match err {
            RpcError::ParseError(_) => -32700,
            RpcError::InvalidRequest(_) => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
            RpcError::InternalError(_) | RpcError::Config(_) => -32603,
            RpcError::RateLimited(_) => -32000,
        };
        JsonRpcError::new(code, &err.to_string())
    }
}

/// calculate request parameters
#[derive(Debug, Deserialize)]
struct CalculateParams {
    ip_address: String,
    #[serde(default)]
    network_spec: String,
    #[serde(default)]
    pattern: bool,
}

/// address_info request parameters
#[derive(Debug, Deserialize)]
struct AddressInfoParams {
    ip_address: String,
}

/// summarize request parameters
#[derive(Debug, Deserialize)]
struct SummarizeParams {
    first: String,
    last: String,
}

/// JSON-RPC server for calculator requests
pub struct RpcServer {
    limiter: Option<DefaultKeyedRateLimiter<String>>,
}

impl RpcServer {
    /// Create a new server
    pub fn new(config: ServerConfig) -> Result<Self> {
        let limiter = if config.rate_limit_disabled {
            None
        } else {
            let per_minute = NonZeroU32::new(config.rate_limit_per_minute).ok_or_else(|| {
                RpcError::Config("rate limit must be greater than zero".to_string())
            })?;
            Some(RateLimiter::keyed(Quota::per_minute(per_minute)))
        };

        Ok(Self { limiter })
    }

    /// Handle a JSON-RPC 2.0 request
    ///
    /// Protocol-level problems are reported as JSON-RPC error responses;
    /// `Err` is only returned if the response itself cannot be encoded.
    pub async fn handle_request(&self, request_str: &str) -> Result<String> {
        let request: JsonRpcRequest = match serde_json::from_str(request_str) {
            Ok(request) => request,
            Err(e) => {
                let err = RpcError::ParseError(e.to_string());
                return encode(error_response(&err, serde_json::Value::Null));
            }
        };

        if request.jsonrpc != "2.0" {
            let err = RpcError::InvalidRequest("Invalid JSON-RPC version".to_string());
            return encode(error_response(&err, request.id));
        }

        debug!(method = %request.method, "handling request");

        let result = match request.method.as_str() {
            "calculate" => self.handle_calculate(&request.params),
            "address_info" => self.handle_address_info(&request.params),
            "summarize" => self.handle_summarize(&request.params),
            "ping" => Ok(serde_json::json!({"status": "ok"})),
            _ => Err(RpcError::MethodNotFound(request.method.clone())),
        };

        let response = match result {
            Ok(data) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(data),
                error: None,
                id: request.id,
            },
            Err(e) => {
                warn!(method = %request.method, error = %e, "request failed");
                error_response(&e, request.id)
            }
        };

        encode(response)
    }

    /// Handle calculate method
    fn handle_calculate(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        self.check_rate(caller_of(params))?;
        let params: CalculateParams = parse_params(params)?;

        let report = calculate(&params.ip_address, &params.network_spec, params.pattern);
        to_value(&report)
    }

    /// Handle address_info method
    fn handle_address_info(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        self.check_rate(caller_of(params))?;
        let params: AddressInfoParams = parse_params(params)?;

        to_value(&describe_address(&params.ip_address))
    }

    /// Handle summarize method
    fn handle_summarize(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        self.check_rate(caller_of(params))?;
        let params: SummarizeParams = parse_params(params)?;

        to_value(&summarize_range(&params.first, &params.last))
    }

    /// Best-effort per-caller request budget
    fn check_rate(&self, caller: Option<&str>) -> Result<()> {
        let Some(ref limiter) = self.limiter else {
            return Ok(());
        };

        let key = caller.unwrap_or(ANONYMOUS_CALLER).to_string();
        limiter
            .check_key(&key)
            .map_err(|_| RpcError::RateLimited(key))
    }
}

/// Caller key from raw params, read before the params are validated
fn caller_of(params: &serde_json::Value) -> Option<&str> {
    params.get("caller").and_then(|c| c.as_str())
}

fn parse_params<T: serde::de::DeserializeOwned>(params: &serde_json::Value) -> Result<T> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| RpcError::InternalError(e.to_string()))
}

fn error_response(err: &RpcError, id: serde_json::Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(JsonRpcError::from(err)),
        id,
    }
}

fn encode(response: JsonRpcResponse) -> Result<String> {
    serde_json::to_string(&response).map_err(|e| RpcError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> RpcServer {
        RpcServer::new(ServerConfig::unlimited()).unwrap()
    }

    async fn call(server: &RpcServer, request: &str) -> serde_json::Value {
        let response = server.handle_request(request).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn test_parse_request() {
        let request = r#"{
            "jsonrpc": "2.0",
            "method": "ping",
            "params": {},
            "id": 1
        }"#;

        let parsed: JsonRpcRequest = serde_json::from_str(request).unwrap();
        assert_eq!(parsed.jsonrpc, "2.0");
        assert_eq!(parsed.method, "ping");
    }

    #[tokio::test]
    async fn test_ping_method() {
        let response = server()
            .handle_request(r#"{"jsonrpc":"2.0","method":"ping","params":{},"id":1}"#)
            .await
            .unwrap();
        assert!(response.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_calculate_method() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","method":"calculate","params":{"ip_address":"192.168.1.10","network_spec":"31"},"id":7}"#,
        )
        .await;

        assert_eq!(response["id"], 7);
        assert_eq!(response["result"]["Network Address"], "192.168.1.10");
        assert_eq!(response["result"]["Broadcast Address"], "192.168.1.11");
        assert_eq!(response["result"]["Total Hosts"], 2);
    }

    #[tokio::test]
    async fn test_calculate_with_pattern() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","method":"calculate","params":{"ip_address":"172.30.151.224","network_spec":"27","pattern":true},"id":1}"#,
        )
        .await;

        assert_eq!(response["result"]["pattern"], serde_json::json!(["172.30.151.224/27"]));
        assert!(response["result"]["regex"].is_string());
    }

    #[tokio::test]
    async fn test_calculate_error_mapping() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","method":"calculate","params":{"ip_address":"192.168.1.1!","network_spec":"24"},"id":2}"#,
        )
        .await;

        let result = response["result"].as_object().unwrap();
        assert_eq!(result.len(), 1);
        assert!(result["error"].as_str().unwrap().contains("invalid characters"));
    }

    #[tokio::test]
    async fn test_address_info_method() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","method":"address_info","params":{"ip_address":"fd00::1"},"id":3}"#,
        )
        .await;

        assert_eq!(response["result"]["Version"], 6);
        assert_eq!(response["result"]["Type"], "Private");
    }

    #[tokio::test]
    async fn test_summarize_method() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","method":"summarize","params":{"first":"10.0.0.1","last":"10.0.0.6"},"id":4}"#,
        )
        .await;

        assert_eq!(
            response["result"]["Blocks"],
            serde_json::json!(["10.0.0.1/32", "10.0.0.2/31", "10.0.0.4/31", "10.0.0.6/32"])
        );
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let response = server()
            .handle_request(r#"{"jsonrpc":"2.0","method":"unknown_method","params":{},"id":1}"#)
            .await
            .unwrap();
        assert!(response.contains("-32601")); // Method not found error code
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","method":"calculate","params":{"network_spec":"24"},"id":1}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_invalid_jsonrpc_version() {
        let response = server()
            .handle_request(r#"{"jsonrpc":"1.0","method":"ping","params":{},"id":1}"#)
            .await
            .unwrap();
        assert!(response.contains("-32600")); // Invalid request error code
    }

    #[tokio::test]
    async fn test_parse_error_response() {
        let response = call(&server(), "{not json").await;
        assert_eq!(response["error"]["code"], -32700);
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_rate_limit_per_caller() {
        let config = ServerConfig {
            rate_limit_per_minute: 2,
            rate_limit_disabled: false,
        };
        let server = RpcServer::new(config).unwrap();
        let request = |caller: &str| {
            format!(
                r#"{{"jsonrpc":"2.0","method":"address_info","params":{{"ip_address":"8.8.8.8","caller":"{}"}},"id":1}}"#,
                caller
            )
        };

        for _ in 0..2 {
            let response = call(&server, &request("alice")).await;
            assert!(response.get("error").is_none());
        }

        let response = call(&server, &request("alice")).await;
        assert_eq!(response["error"]["code"], -32000);

        // other callers have their own budget
        let response = call(&server, &request("bob")).await;
        assert!(response.get("error").is_none());
    }

    #[tokio::test]
    async fn test_malformed_params_count_against_budget() {
        let config = ServerConfig {
            rate_limit_per_minute: 1,
            rate_limit_disabled: false,
        };
        let server = RpcServer::new(config).unwrap();
        let bad = r#"{"jsonrpc":"2.0","method":"summarize","params":{"first":"10.0.0.1","caller":"mallory"},"id":1}"#;

        let response = call(&server, bad).await;
        assert_eq!(response["error"]["code"], -32602);

        let response = call(&server, bad).await;
        assert_eq!(response["error"]["code"], -32000);
    }

    #[test]
    fn test_caller_of() {
        assert_eq!(caller_of(&serde_json::json!({"caller": "alice"})), Some("alice"));
        assert_eq!(caller_of(&serde_json::json!({"caller": 5})), None);
        assert_eq!(caller_of(&serde_json::json!({})), None);
        assert_eq!(caller_of(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = ServerConfig {
            rate_limit_per_minute: 0,
            rate_limit_disabled: false,
        };
        assert!(matches!(RpcServer::new(config), Err(RpcError::Config(_))));
    }
}
