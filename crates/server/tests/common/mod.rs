use anyhow::Context as _;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Minimal MCP client speaking newline-delimited JSON-RPC to a spawned `postman-mcp` process.
///
/// This intentionally avoids rmcp's client so the tests exercise the wire format as a host sees
/// it.
pub struct StdioSession {
    /// `result` of the `initialize` response.
    pub initialize_result: Value,
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioSession {
    pub async fn connect() -> anyhow::Result<Self> {
        let bin = env!("CARGO_BIN_EXE_postman-mcp");
        let mut child = Command::new(bin)
            .arg("--log-level")
            .arg("debug")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn postman-mcp")?;

        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;

        let mut session = Self {
            initialize_result: Value::Null,
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "postman-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        session.initialize_result = init
            .get("result")
            .cloned()
            .with_context(|| format!("initialize failed: {init}"))?;

        session
            .send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;

        Ok(session)
    }

    pub async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Send a request and wait for the response carrying the same id.
    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(Duration::from_secs(10), self.read_response(id))
            .await
            .context("timeout waiting for response")?
    }

    async fn read_response(&mut self, id: u64) -> anyhow::Result<Value> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .context("server closed stdout")?;
            if line.trim().is_empty() {
                continue;
            }
            let msg: Value = serde_json::from_str(&line).context("parse server message")?;
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
    }

    /// Call `make_request` and return `result.content[0].text`.
    pub async fn make_request(&mut self, id: u64, arguments: Value) -> anyhow::Result<String> {
        let msg = self
            .request(
                id,
                "tools/call",
                json!({"name": "make_request", "arguments": arguments}),
            )
            .await?;
        let result = msg.get("result").context("tools/call missing result")?;
        anyhow::ensure!(
            result.get("isError").and_then(Value::as_bool) != Some(true),
            "tool reported isError: {result}"
        );
        result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("tools/call missing result.content[0].text")
    }
}
