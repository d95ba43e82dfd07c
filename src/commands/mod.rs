pub mod config;
pub mod connect;
pub mod list;
pub mod next;
pub mod open;
pub mod run;
pub mod settings;
pub mod status;

use crate::browser::SessionManager;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

/// Resolve the session every browser-facing command works against.
/// `--cdp` always wins and is persisted; with nothing connected yet the
/// configured default endpoint is tried, so a plain
/// `--remote-debugging-port=9222` browser needs no explicit connect.
pub(crate) async fn prepare_session(cli: &Cli, config: &Config) -> Result<SessionManager> {
    let session = SessionManager::new();

    if let Some(cdp) = cli.cdp.as_deref() {
        let (cdp_port, cdp_url) = SessionManager::resolve_endpoint(cdp).await?;
        session.save_external_session(cdp_port, &cdp_url)?;
        tracing::debug!("CDP override applied: port={}, url={}", cdp_port, cdp_url);
    } else if session.load_state().is_none() {
        let (cdp_port, cdp_url) =
            SessionManager::resolve_endpoint(&config.cdp.endpoint).await?;
        session.save_external_session(cdp_port, &cdp_url)?;
        tracing::debug!("Using configured CDP endpoint: {}", config.cdp.endpoint);
    }

    Ok(session)
}
