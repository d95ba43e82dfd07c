use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::Browser;
use chromiumoxide::handler::Handler;
use serde::{Deserialize, Serialize};

use super::PageChannel;
use crate::course::LessonPath;
use crate::error::{ClasspilotError, Result};

/// Page info from the CDP /json/list endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub web_socket_debugger_url: Option<String>,
}

impl PageInfo {
    /// URL path of the tab, when the URL parses.
    pub fn path(&self) -> Option<String> {
        url::Url::parse(&self.url).ok().map(|u| u.path().to_string())
    }
}

/// Connection state persisted to disk across CLI invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub cdp_port: u16,
    pub cdp_url: String,
}

/// Tracks the connected browser across CLI invocations and hands out
/// page-level channels.
pub struct SessionManager {
    state_dir: PathBuf,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        let state_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".classpilot");

        Self { state_dir }
    }

    fn session_file(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }

    /// Load session state from disk
    pub fn load_state(&self) -> Option<SessionState> {
        let path = self.session_file();
        if path.exists() {
            let content = fs::read_to_string(&path).ok()?;
            serde_json::from_str(&content).ok()
        } else {
            None
        }
    }

    /// Save session state to disk
    pub fn save_state(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.state_dir)?;
        let content = serde_json::to_string_pretty(state)?;
        fs::write(self.session_file(), content)?;
        Ok(())
    }

    /// Persist an externally resolved endpoint (via `connect` or `--cdp`)
    pub fn save_external_session(&self, cdp_port: u16, cdp_url: &str) -> Result<()> {
        self.save_state(&SessionState {
            cdp_port,
            cdp_url: cdp_url.to_string(),
        })
    }

    /// Resolve a CDP endpoint string (port number or ws:// URL) into a
    /// (port, ws_url) pair. A numeric port is resolved through
    /// `http://127.0.0.1:{port}/json/version`.
    pub async fn resolve_endpoint(endpoint: &str) -> Result<(u16, String)> {
        if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            let port = endpoint
                .split("://")
                .nth(1)
                .and_then(|s| s.split('/').next())
                .and_then(|host_port| host_port.rsplit(':').next())
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(9222);
            Ok((port, endpoint.to_string()))
        } else if let Ok(port) = endpoint.parse::<u16>() {
            let version_url = format!("http://127.0.0.1:{}/json/version", port);
            let client = http_client();

            let resp = client.get(&version_url).send().await.map_err(|e| {
                ClasspilotError::CdpConnectionFailed(format!(
                    "Cannot reach CDP at port {}. Is the browser running with --remote-debugging-port={}? Error: {}",
                    port, port, e
                ))
            })?;

            let version_info: serde_json::Value = resp.json().await.map_err(|e| {
                ClasspilotError::CdpConnectionFailed(format!(
                    "Invalid response from CDP endpoint: {}",
                    e
                ))
            })?;

            let ws_url = version_info
                .get("webSocketDebuggerUrl")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("ws://127.0.0.1:{}", port));

            Ok((port, ws_url))
        } else {
            Err(ClasspilotError::CdpConnectionFailed(
                "Invalid endpoint. Use a port number or WebSocket URL (ws://...).".to_string(),
            ))
        }
    }

    /// Check if the persisted session is still reachable
    pub async fn is_alive(&self, state: &SessionState) -> bool {
        let url = format!("http://127.0.0.1:{}/json/version", state.cdp_port);
        http_client().get(&url).send().await.is_ok()
    }

    /// Fetch the current browser WebSocket URL from a CDP port.
    /// Returns `None` if the port is unreachable or the response is malformed.
    async fn fetch_browser_ws_url(&self, cdp_port: u16) -> Option<String> {
        let url = format!("http://127.0.0.1:{}/json/version", cdp_port);
        let resp = http_client().get(&url).send().await.ok()?;
        let info: serde_json::Value = resp.json().await.ok()?;
        info.get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Load the persisted session and verify the browser still answers.
    /// The WebSocket URL is refreshed on the way: a browser restarted on
    /// the same port rotates its session id, which invalidates the cached
    /// URL.
    pub async fn require_session(&self) -> Result<SessionState> {
        let Some(mut state) = self.load_state() else {
            return Err(ClasspilotError::BrowserNotRunning);
        };
        if !self.is_alive(&state).await {
            return Err(ClasspilotError::BrowserNotRunning);
        }
        if let Some(fresh_url) = self.fetch_browser_ws_url(state.cdp_port).await {
            if fresh_url != state.cdp_url {
                tracing::debug!("CDP WebSocket URL changed, updating session");
                state.cdp_url = fresh_url;
                self.save_state(&state)?;
            }
        }
        Ok(state)
    }

    /// Browser-level connection (for opening tabs and shutdown)
    pub async fn connect_browser(&self) -> Result<(Browser, Handler)> {
        let state = self.require_session().await?;
        Browser::connect(&state.cdp_url).await.map_err(|e| {
            ClasspilotError::CdpConnectionFailed(format!("Failed to connect to browser: {}", e))
        })
    }

    /// List open pages, excluding extensions, workers and the like
    pub async fn get_pages(&self) -> Result<Vec<PageInfo>> {
        let state = self.require_session().await?;
        let url = format!("http://127.0.0.1:{}/json/list", state.cdp_port);

        let response = http_client().get(&url).send().await.map_err(|e| {
            ClasspilotError::CdpConnectionFailed(format!("Failed to get pages: {}", e))
        })?;

        let pages: Vec<PageInfo> = response.json().await.map_err(|e| {
            ClasspilotError::CdpConnectionFailed(format!("Failed to parse pages: {}", e))
        })?;

        Ok(pages
            .into_iter()
            .filter(|p| p.page_type == "page")
            .collect())
    }

    /// Pick the course tab: a lesson video page when one is open,
    /// otherwise any tab inside the course area.
    pub async fn find_course_page(&self) -> Result<PageInfo> {
        let pages = self.get_pages().await?;

        if let Some(page) = pages
            .iter()
            .find(|p| p.path().as_deref().is_some_and(LessonPath::is_lesson_path))
        {
            return Ok(page.clone());
        }

        pages
            .into_iter()
            .find(|p| {
                p.path()
                    .map(|path| path.starts_with("/courses/"))
                    .unwrap_or(false)
            })
            .ok_or(ClasspilotError::CourseTabNotFound)
    }

    /// Open a persistent DevTools channel to a page
    pub async fn open_channel(&self, page: &PageInfo) -> Result<PageChannel> {
        let ws_url = page.web_socket_debugger_url.as_deref().ok_or_else(|| {
            ClasspilotError::CdpConnectionFailed("No WebSocket URL for tab".to_string())
        })?;
        PageChannel::open(ws_url).await
    }
}

fn http_client() -> reqwest::Client {
    // Bypass any proxy for localhost CDP traffic
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
