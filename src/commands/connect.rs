use colored::Colorize;

use crate::browser::SessionManager;
use crate::cli::Cli;
use crate::error::Result;

pub async fn run(cli: &Cli, endpoint: &str) -> Result<()> {
    let session = SessionManager::new();
    let (cdp_port, cdp_url) = SessionManager::resolve_endpoint(endpoint).await?;
    session.save_external_session(cdp_port, &cdp_url)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "cdpPort": cdp_port,
                "cdpUrl": cdp_url
            })
        );
    } else {
        println!("{} Connected to browser on port {}", "✓".green(), cdp_port);
        println!("  {}", cdp_url.dimmed());
    }

    Ok(())
}
