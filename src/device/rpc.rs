use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
const CLI_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Read-only show commands
    Cli,
    /// Configuration mode commands
    CliConf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcParams {
    pub cmd: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: Method,
    pub params: RpcParams,
    pub id: u32,
}

/// Build one sub-request per command, ids starting at 1
pub fn build_batch(commands: &[String], method: Method) -> Vec<RpcRequest> {
    commands
        .iter()
        .zip(1..)
        .map(|(cmd, id)| RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method,
            params: RpcParams {
                cmd: cmd.clone(),
                version: CLI_VERSION,
            },
            id,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcResult {
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcError {
    /// Device supplied detail, e.g. `data.msg`
    pub fn detail(&self) -> Option<&str> {
        self.data.as_ref()?.get("msg")?.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<RpcResult>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// What a batch reply says about the submitted commands
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Every sub-request succeeded; bodies in submission order
    Completed { bodies: Vec<Option<Value>> },
    /// Sub-request `index` (0-based) was rejected by the device
    Rejected { index: usize, message: String },
}

/// Decode a reply body into one response per sub-request
///
/// The device answers a batch with an array (one element per sub-request),
/// or a single request with a bare object; both come back as a list.
pub fn decode_reply(body: &str) -> Result<Vec<RpcResponse>, serde_json::Error> {
    match serde_json::from_str::<Value>(body)? {
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

/// Stop at the first rejected sub-request
pub fn inspect(responses: Vec<RpcResponse>) -> BatchOutcome {
    let mut bodies = Vec::with_capacity(responses.len());

    for (index, response) in responses.into_iter().enumerate() {
        if let Some(error) = response.error {
            let mut message = format!(
                "Command #{} failed: {}",
                index + 1,
                error.message.as_deref().unwrap_or("Unknown error")
            );
            if let Some(detail) = error.detail() {
                message.push_str(" - ");
                message.push_str(detail);
            }
            return BatchOutcome::Rejected { index, message };
        }
        bodies.push(response.result.and_then(|result| result.body));
    }

    BatchOutcome::Completed { bodies }
}

/// Render a reply body as text; structured bodies become compact JSON
pub fn body_text(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_ids_are_one_based() {
        let commands = vec!["ip access-list A".to_string(), "  10 permit ip any any".to_string()];
        let batch = build_batch(&commands, Method::CliConf);

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            json,
            json!([
                {"jsonrpc": "2.0", "method": "cli_conf", "params": {"cmd": "ip access-list A", "version": 1}, "id": 1},
                {"jsonrpc": "2.0", "method": "cli_conf", "params": {"cmd": "  10 permit ip any any", "version": 1}, "id": 2},
            ])
        );
    }

    #[test]
    fn show_method_serializes_as_cli() {
        let batch = build_batch(&["show version".to_string()], Method::Cli);
        assert_eq!(serde_json::to_value(&batch[0]).unwrap()["method"], "cli");
    }

    #[test]
    fn single_object_reply_is_normalized() {
        let responses = decode_reply(r#"{"jsonrpc":"2.0","result":{"body":"ok"},"id":1}"#).unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(
            inspect(responses),
            BatchOutcome::Completed {
                bodies: vec![Some(json!("ok"))]
            }
        );
    }

    #[test]
    fn array_reply_keeps_order_and_null_results() {
        let responses =
            decode_reply(r#"[{"result":null,"id":1},{"result":{"body":{"a":1}},"id":2}]"#)
                .unwrap();
        assert_eq!(
            inspect(responses),
            BatchOutcome::Completed {
                bodies: vec![None, Some(json!({"a": 1}))]
            }
        );
    }

    #[test]
    fn first_error_is_reported_with_detail() {
        let responses = decode_reply(
            r#"[
                {"result":null,"id":1},
                {"error":{"code":-32602,"message":"Invalid params","data":{"msg":"% Invalid command"}},"id":2},
                {"error":{"message":"later"},"id":3}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            inspect(responses),
            BatchOutcome::Rejected {
                index: 1,
                message: "Command #2 failed: Invalid params - % Invalid command".to_string()
            }
        );
    }

    #[test]
    fn error_without_message_or_detail() {
        let responses = decode_reply(r#"{"error":{"data":"opaque"},"id":1}"#).unwrap();
        assert_eq!(
            inspect(responses),
            BatchOutcome::Rejected {
                index: 0,
                message: "Command #1 failed: Unknown error".to_string()
            }
        );
    }

    #[test]
    fn non_json_reply_is_an_error() {
        assert!(decode_reply("<html>502 Bad Gateway</html>").is_err());
    }

    #[test]
    fn body_text_keeps_strings_verbatim() {
        assert_eq!(body_text(&json!("line1\nline2")), "line1\nline2");
        assert_eq!(body_text(&json!({"k": "v"})), r#"{"k":"v"}"#);
    }
}
