use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{ClasspilotError, Result};

/// A persistent DevTools WebSocket attached to one page target.
///
/// Commands are correlated by id; protocol events interleaved on the
/// socket are skipped. The channel survives in-tab navigations (the page
/// target keeps its id) but dies with the tab; callers re-discover the
/// tab and open a fresh channel when a call fails.
pub struct PageChannel {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl PageChannel {
    pub async fn open(ws_url: &str) -> Result<Self> {
        let (ws, _) = connect_async(ws_url).await.map_err(|e| {
            ClasspilotError::CdpConnectionFailed(format!("WebSocket connection failed: {}", e))
        })?;

        Ok(Self { ws, next_id: 1 })
    }

    /// Send a CDP command and wait for its response.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let cmd = serde_json::json!({
            "id": id,
            "method": method,
            "params": params
        });

        self.ws
            .send(Message::Text(cmd.to_string().into()))
            .await
            .map_err(|e| ClasspilotError::Other(format!("Failed to send command: {}", e)))?;

        while let Some(msg) = self.ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let response: Value = serde_json::from_str(text.as_str())?;
                    if response.get("id").and_then(Value::as_u64) != Some(id) {
                        continue;
                    }
                    if let Some(error) = response.get("error") {
                        return Err(ClasspilotError::Other(format!("CDP error: {}", error)));
                    }
                    return Ok(response
                        .get("result")
                        .cloned()
                        .unwrap_or(Value::Null));
                }
                Ok(_) => continue,
                Err(e) => return Err(ClasspilotError::Other(format!("WebSocket error: {}", e))),
            }
        }

        Err(ClasspilotError::CdpConnectionFailed(
            "Connection closed before response".to_string(),
        ))
    }

    /// Evaluate a JavaScript expression on the page and return its value.
    pub async fn eval(&mut self, expression: &str) -> Result<Value> {
        let result = self
            .call(
                "Runtime.evaluate",
                serde_json::json!({
                    "expression": expression,
                    "returnByValue": true
                }),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let message = exception
                .get("text")
                .or_else(|| exception.get("exception").and_then(|e| e.get("description")))
                .and_then(Value::as_str)
                .unwrap_or("JavaScript exception");
            return Err(ClasspilotError::JavaScriptError(message.to_string()));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Register a script that runs at the start of every future document
    /// in this tab.
    pub async fn install_on_new_document(&mut self, source: &str) -> Result<()> {
        self.call(
            "Page.addScriptToEvaluateOnNewDocument",
            serde_json::json!({ "source": source }),
        )
        .await?;
        Ok(())
    }
}
