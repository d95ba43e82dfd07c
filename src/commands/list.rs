use colored::Colorize;

use crate::autopilot::{ListSource, Scraper};
use crate::cli::Cli;
use crate::config::Config;
use crate::course::{find_next_index, ItemKind};
use crate::error::Result;

pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let session = super::prepare_session(cli, &config).await?;

    let page = session.find_course_page().await?;
    let mut channel = session.open_channel(&page).await?;

    let scraper = Scraper::new(config.selectors.clone());
    let scraped = scraper.scrape(&mut channel).await?;
    let items = scraper.classify_all(&scraped);
    let next = find_next_index(&items);

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "source": match scraped.source {
                    ListSource::Required => "required",
                    ListSource::Supplementary => "supplementary",
                    ListSource::None => "none",
                },
                "nextIndex": next,
                "items": items,
            })
        );
        return Ok(());
    }

    if scraped.source == ListSource::None {
        println!("{} Course material list not found", "!".yellow());
        return Ok(());
    }

    let source = match scraped.source {
        ListSource::Supplementary => "supplementary materials",
        _ => "required materials",
    };
    println!("{} {} items ({})\n", "✓".green(), items.len(), source);

    for (i, item) in items.iter().enumerate() {
        let mark = if item.passed {
            "✓".green()
        } else {
            "○".dimmed()
        };
        let pointer = if next == Some(i) { "→" } else { " " };
        let kind = match item.kind {
            ItemKind::Main => String::new(),
            ItemKind::Supplement => format!(" {}", "(supplement)".dimmed()),
        };
        println!(
            "{} {:>2}. {} {}{}",
            pointer.cyan(),
            i + 1,
            mark,
            item.title,
            kind
        );
    }

    if next.is_none() {
        println!("\n{} All mandatory items are passed", "✓".green());
    }

    Ok(())
}
