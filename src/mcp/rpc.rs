//! JSON-RPC 2.0 response framing helpers
//!
//! Every response built here carries `"jsonrpc":"2.0"` and exactly one of
//! `result` / `error`.

use serde_json::{json, Value};

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn json_rpc_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_and_error_are_mutually_exclusive() {
        let ok = json_rpc_result(json!(7), json!({}));
        assert_eq!(ok["jsonrpc"], "2.0");
        assert!(ok.get("result").is_some());
        assert!(ok.get("error").is_none());
        assert!(!is_json_rpc_error(&ok));

        let err = json_rpc_error(json!(7), -32601, "Method not found: nope");
        assert_eq!(err["jsonrpc"], "2.0");
        assert!(err.get("result").is_none());
        assert_eq!(err["error"]["code"], -32601);
        assert!(is_json_rpc_error(&err));
    }

    #[test]
    fn null_id_is_preserved() {
        let err = json_rpc_error(Value::Null, -32700, "Parse error: bad json");
        assert!(err["id"].is_null());
    }
}
