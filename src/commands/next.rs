use colored::Colorize;

use crate::autopilot::{ListSource, Navigate, Scraper, SyntheticClickNavigator};
use crate::cli::Cli;
use crate::config::Config;
use crate::course::find_next_index;
use crate::error::{ClasspilotError, Result};

/// One advancement step, without the watching automaton: scrape, pick
/// the next unfinished mandatory item, click it.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let session = super::prepare_session(cli, &config).await?;

    let page = session.find_course_page().await?;
    let mut channel = session.open_channel(&page).await?;

    let scraper = Scraper::new(config.selectors.clone());
    let scraped = scraper.scrape(&mut channel).await?;
    if scraped.source == ListSource::None {
        return Err(ClasspilotError::Other(
            "Course material list not found".to_string(),
        ));
    }

    let items = scraper.classify_all(&scraped);
    let Some(index) = find_next_index(&items) else {
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "success": true, "completed": true })
            );
        } else {
            println!("{} All videos have been completed.", "✓".green());
        }
        return Ok(());
    };

    let navigator = SyntheticClickNavigator::new(&config.selectors);
    navigator.advance_to(&mut channel, index + 1).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "position": index + 1,
                "title": items[index].title,
            })
        );
    } else {
        println!(
            "{} Moving to the next video: {}",
            "✓".green(),
            items[index].title.bold()
        );
    }

    Ok(())
}
