use colored::Colorize;

use crate::autopilot::Locator;
use crate::cli::Cli;
use crate::config::Config;
use crate::course::LessonPath;
use crate::error::Result;
use crate::settings::SettingsStore;

pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let store = SettingsStore::open();
    let settings = store.current();
    let session = super::prepare_session(cli, &config).await;

    if cli.json {
        let mut report = serde_json::json!({
            "settings": settings,
            "configPath": Config::config_path().display().to_string(),
            "connected": false,
        });

        if let Ok(session) = session {
            if let Ok(state) = session.require_session().await {
                report["connected"] = serde_json::json!(true);
                report["cdpPort"] = serde_json::json!(state.cdp_port);
                if let Ok(page) = session.find_course_page().await {
                    report["courseTab"] = serde_json::json!({
                        "title": page.title,
                        "url": page.url,
                        "lessonPage": page
                            .path()
                            .as_deref()
                            .is_some_and(LessonPath::is_lesson_path),
                    });
                    if let Ok(mut channel) = session.open_channel(&page).await {
                        let locator = Locator::new(&config.selectors);
                        if let Ok(player) = locator.peek(&mut channel).await {
                            report["playerFound"] = serde_json::json!(player.is_some());
                        }
                    }
                }
            }
        }

        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Settings:".bold());
    print_flag("enabled", settings.enabled);
    print_flag("autoPlayEnabled", settings.auto_play_enabled);
    print_flag("backgroundAutoPlay", settings.background_auto_play);
    print_flag("returnToChapter", settings.return_to_chapter);
    print_flag("hideUI", settings.hide_ui);
    println!();

    println!("{}", "Session:".bold());
    let session = match session {
        Ok(session) => session,
        Err(e) => {
            println!("  {} {}", "○".dimmed(), e);
            return Ok(());
        }
    };
    match session.require_session().await {
        Ok(state) => {
            println!("  {} CDP Port: {}", "✓".green(), state.cdp_port);
            println!("  {} CDP URL: {}", "✓".green(), state.cdp_url.dimmed());
        }
        Err(e) => {
            println!("  {} {}", "○".dimmed(), e);
            return Ok(());
        }
    }
    println!();

    println!("{}", "Course Tab:".bold());
    match session.find_course_page().await {
        Ok(page) => {
            let lesson = page
                .path()
                .as_deref()
                .is_some_and(LessonPath::is_lesson_path);
            println!("  {} {}", "✓".green(), page.title.bold());
            println!("    {}", page.url.dimmed());
            if lesson {
                println!("  {} Lesson video page", "✓".green());
            } else {
                println!("  {} Not a lesson video page", "○".dimmed());
            }

            match session.open_channel(&page).await {
                Ok(mut channel) => {
                    let locator = Locator::new(&config.selectors);
                    match locator.peek(&mut channel).await {
                        Ok(Some(player)) => {
                            let detail = if player.ended {
                                "ended"
                            } else if player.paused {
                                "paused"
                            } else {
                                "playing"
                            };
                            println!("  {} Video player found ({})", "✓".green(), detail);
                        }
                        Ok(None) => {
                            println!("  {} Video player not found", "○".dimmed());
                        }
                        Err(e) => {
                            println!("  {} Player probe failed: {}", "!".yellow(), e);
                        }
                    }
                }
                Err(e) => {
                    println!("  {} Cannot attach to tab: {}", "!".yellow(), e);
                }
            }
        }
        Err(e) => {
            println!("  {} {}", "○".dimmed(), e);
        }
    }

    Ok(())
}

fn print_flag(name: &str, value: bool) {
    if value {
        println!("  {} {}: ON", "✓".green(), name);
    } else {
        println!("  {} {}: OFF", "○".dimmed(), name);
    }
}
