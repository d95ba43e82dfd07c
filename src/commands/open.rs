use std::time::Duration;

use colored::Colorize;
use futures::StreamExt;
use tokio::time::timeout;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{ClasspilotError, Result};

pub async fn run(cli: &Cli, url: &str) -> Result<()> {
    let normalized_url = normalize_navigation_url(url)?;

    let config = Config::load()?;
    let session = super::prepare_session(cli, &config).await?;
    let (browser, mut handler) = session.connect_browser().await?;

    // Spawn handler in background to drive the CDP connection
    tokio::spawn(async move { while handler.next().await.is_some() {} });

    let page = match timeout(Duration::from_secs(30), browser.new_page(&normalized_url)).await {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => {
            return Err(ClasspilotError::Other(format!("Failed to open page: {}", e)));
        }
        Err(_) => {
            return Err(ClasspilotError::Timeout(format!(
                "Page load timed out after 30 seconds: {}",
                normalized_url
            )));
        }
    };

    let _ = timeout(Duration::from_secs(30), page.wait_for_navigation()).await;

    let title = match timeout(Duration::from_secs(5), page.get_title()).await {
        Ok(Ok(Some(t))) => t,
        _ => String::new(),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "url": normalized_url,
                "title": title
            })
        );
    } else {
        println!("{} {}", "✓".green(), title.bold());
        println!("  {}", normalized_url.dimmed());
    }

    Ok(())
}

fn normalize_navigation_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ClasspilotError::Other(
            "Invalid URL: empty input".to_string(),
        ));
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return Ok(format!("https://{}", rest));
    }

    if trimmed.contains("://") {
        return Ok(trimmed.to_string());
    }

    // host:port would otherwise look like a scheme
    if is_host_port_with_optional_path(trimmed) {
        return Ok(format!("https://{}", trimmed));
    }

    if has_explicit_scheme(trimmed) {
        return Ok(trimmed.to_string());
    }

    Ok(format!("https://{}", trimmed))
}

fn is_host_port_with_optional_path(input: &str) -> bool {
    let boundary = input.find(['/', '?', '#']).unwrap_or(input.len());
    let authority = &input[..boundary];

    if authority.is_empty() {
        return false;
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn has_explicit_scheme(input: &str) -> bool {
    let mut chars = input.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    for c in chars {
        if c == ':' {
            return true;
        }
        if c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.' {
            continue;
        }
        return false;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(
            normalize_navigation_url("example.com/courses/a").unwrap(),
            "https://example.com/courses/a"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            normalize_navigation_url("http://localhost:3000").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            normalize_navigation_url("about:blank").unwrap(),
            "about:blank"
        );
    }

    #[test]
    fn bare_host_port_gets_https() {
        assert_eq!(
            normalize_navigation_url("localhost:3000/courses").unwrap(),
            "https://localhost:3000/courses"
        );
    }

    #[test]
    fn protocol_relative_becomes_https() {
        assert_eq!(
            normalize_navigation_url("//example.com").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(normalize_navigation_url("   ").is_err());
    }
}
