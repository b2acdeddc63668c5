//! Stdio transport adapter
//!
//! Newline-delimited JSON-RPC over the process's stdin/stdout, strictly
//! sequential: one message fully resolves before the next line is read, so a
//! slow handler stalls the whole channel. Stdout carries protocol bytes
//! only; all diagnostics go through `tracing` to stderr.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error};

use crate::mcp::server::McpServer;

/// The stdio channel is a single logical connection.
pub const STDIO_SESSION_ID: &str = "stdio-session";

const INTERNAL_ERROR_LINE: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32000,"message":"Internal server error"}}"#;

pub async fn run(server: Arc<McpServer>) -> io::Result<()> {
    serve(server, BufReader::new(io::stdin()), io::stdout()).await
}

async fn serve<R, W>(server: Arc<McpServer>, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            debug!("stdin closed, stdio transport finished");
            return Ok(());
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let dispatch =
            AssertUnwindSafe(server.handle_raw(message.as_bytes(), STDIO_SESSION_ID)).catch_unwind();
        match dispatch.await {
            Ok(Some(response)) => write_line(&mut writer, &response).await?,
            Ok(None) => debug!("notification processed, no response written"),
            Err(_) => {
                // A handler panicked. Keep the channel alive with a generic
                // error line rather than terminating the loop.
                error!("message dispatch panicked");
                write_line(&mut writer, INTERNAL_ERROR_LINE).await?;
            }
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, content: &str) -> io::Result<()> {
    writer.write_all(content.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::errors::AppError;
    use crate::mcp::capability::{CallResult, McpService, ServerInfo, Tool, ToolCall, ToolDescriptor};

    use super::*;

    struct AnswerTool;

    #[async_trait]
    impl ToolCall for AnswerTool {
        async fn call(&self, _arguments: Value) -> Result<CallResult, AppError> {
            Ok(CallResult::text("42"))
        }
    }

    struct PanicsTool;

    #[async_trait]
    impl ToolCall for PanicsTool {
        async fn call(&self, _arguments: Value) -> Result<CallResult, AppError> {
            panic!("handler bug")
        }
    }

    struct StdioFixture;

    impl McpService for StdioFixture {
        fn server_info(&self) -> ServerInfo {
            ServerInfo {
                name: "stdio-fixture".to_string(),
                version: "0.0.0".to_string(),
            }
        }

        fn module(&self) -> &str {
            "fixture"
        }

        fn tools(&self) -> Vec<Tool> {
            let schema = json!({"type": "object"});
            vec![
                Tool {
                    descriptor: ToolDescriptor {
                        name: "answer".to_string(),
                        description: "always 42".to_string(),
                        input_schema: schema.clone(),
                    },
                    handler: Arc::new(AnswerTool),
                },
                Tool {
                    descriptor: ToolDescriptor {
                        name: "panics".to_string(),
                        description: "panics on call".to_string(),
                        input_schema: schema,
                    },
                    handler: Arc::new(PanicsTool),
                },
            ]
        }
    }

    async fn run_lines(input: &str) -> Vec<Value> {
        let server = Arc::new(McpServer::initialize(&StdioFixture));
        let mut output: Vec<u8> = Vec::new();
        serve(server, input.as_bytes(), &mut output)
            .await
            .expect("stdio loop");
        String::from_utf8(output)
            .expect("utf-8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("response line is json"))
            .collect()
    }

    #[tokio::test]
    async fn requests_answer_in_order_and_notifications_stay_silent() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/cancelled\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",",
            "\"params\":{\"name\":\"answer\",\"arguments\":{}}}\n",
        );

        let responses = run_lines(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "42");
    }

    #[tokio::test]
    async fn malformed_line_gets_parse_error_and_loop_continues() {
        let input = concat!(
            "this is not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n",
        );

        let responses = run_lines(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["id"], 7);
    }

    #[tokio::test]
    async fn handler_panic_writes_generic_error_and_loop_continues() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",",
            "\"params\":{\"name\":\"panics\",\"arguments\":{}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        );

        let responses = run_lines(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32000);
        assert_eq!(responses[0]["error"]["message"], "Internal server error");
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1], json!({"jsonrpc": "2.0", "id": 2, "result": {}}));
    }
}
