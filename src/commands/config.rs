use colored::Colorize;

use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{ClasspilotError, Result};

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli),
        ConfigCommands::Set { key, value } => set(cli, key, value),
        ConfigCommands::Get { key } => get(cli, key),
        ConfigCommands::Path => path(cli),
    }
}

fn show(cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| ClasspilotError::ConfigError(e.to_string()))?;
        println!("{}", toml_str);
    }

    Ok(())
}

fn set(_cli: &Cli, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    match key {
        "cdp.endpoint" => config.cdp.endpoint = value.to_string(),
        "timing.poll_interval_ms" => config.timing.poll_interval_ms = parse_ms(key, value)?,
        "timing.cooldown_ms" => config.timing.cooldown_ms = parse_ms(key, value)?,
        "timing.redirect_delay_ms" => config.timing.redirect_delay_ms = parse_ms(key, value)?,
        "behavior.require_user_gesture" => {
            config.behavior.require_user_gesture = value.parse().map_err(|_| {
                ClasspilotError::ConfigError(
                    "require_user_gesture must be true or false".to_string(),
                )
            })?
        }
        "selectors.frame_title" => config.selectors.frame_title = value.to_string(),
        "selectors.required_list_label" => {
            config.selectors.required_list_label = value.to_string()
        }
        "selectors.supplementary_list_label" => {
            config.selectors.supplementary_list_label = value.to_string()
        }
        "selectors.item_title" => config.selectors.item_title = value.to_string(),
        "selectors.item_icon" => config.selectors.item_icon = value.to_string(),
        "selectors.done_color" => config.selectors.done_color = value.to_string(),
        "selectors.supplement_icon_type" => {
            config.selectors.supplement_icon_type = value.to_string()
        }
        _ => {
            return Err(ClasspilotError::ConfigError(format!(
                "Unknown config key: {}",
                key
            )))
        }
    }

    config.save()?;
    println!("{} Set {} = {}", "✓".green(), key, value);

    Ok(())
}

fn get(cli: &Cli, key: &str) -> Result<()> {
    let config = Config::load()?;

    let value = match key {
        "cdp.endpoint" => config.cdp.endpoint.clone(),
        "timing.poll_interval_ms" => config.timing.poll_interval_ms.to_string(),
        "timing.cooldown_ms" => config.timing.cooldown_ms.to_string(),
        "timing.redirect_delay_ms" => config.timing.redirect_delay_ms.to_string(),
        "behavior.require_user_gesture" => config.behavior.require_user_gesture.to_string(),
        "selectors.frame_title" => config.selectors.frame_title.clone(),
        "selectors.required_list_label" => config.selectors.required_list_label.clone(),
        "selectors.supplementary_list_label" => config.selectors.supplementary_list_label.clone(),
        "selectors.item_title" => config.selectors.item_title.clone(),
        "selectors.item_icon" => config.selectors.item_icon.clone(),
        "selectors.done_color" => config.selectors.done_color.clone(),
        "selectors.supplement_icon_type" => config.selectors.supplement_icon_type.clone(),
        _ => {
            return Err(ClasspilotError::ConfigError(format!(
                "Unknown config key: {}",
                key
            )))
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "key": key,
                "value": value
            })
        );
    } else {
        println!("{}", value);
    }

    Ok(())
}

fn path(cli: &Cli) -> Result<()> {
    let path = Config::config_path();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string()
            })
        );
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

fn parse_ms(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| ClasspilotError::ConfigError(format!("{} must be a number of ms", key)))
}
