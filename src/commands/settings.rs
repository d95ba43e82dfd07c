use colored::Colorize;

use crate::cli::{Cli, SettingKey, SettingsCommands};
use crate::error::{ClasspilotError, Result};
use crate::settings::SettingsStore;

pub async fn run(cli: &Cli, command: &SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Show => show(cli),
        SettingsCommands::Set { key, value } => set(cli, *key, value),
        SettingsCommands::Path => path(cli),
    }
}

fn show(cli: &Cli) -> Result<()> {
    let store = SettingsStore::open();
    let settings = store.current();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_flag("enabled", settings.enabled);
        print_flag("autoPlayEnabled", settings.auto_play_enabled);
        print_flag("backgroundAutoPlay", settings.background_auto_play);
        print_flag("returnToChapter", settings.return_to_chapter);
        print_flag("hideUI", settings.hide_ui);
    }

    Ok(())
}

fn set(cli: &Cli, key: SettingKey, value: &str) -> Result<()> {
    let flag = parse_flag(value)?;
    let mut store = SettingsStore::open();

    let settings = store.update(|s| match key {
        SettingKey::Enabled => s.enabled = flag,
        SettingKey::Autoplay => s.auto_play_enabled = flag,
        SettingKey::Background => s.background_auto_play = flag,
        SettingKey::ReturnToChapter => s.return_to_chapter = flag,
        SettingKey::HideUi => s.hide_ui = flag,
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!(
            "{} {:?} is now {}",
            "✓".green(),
            key,
            if flag { "ON" } else { "OFF" }
        );
        println!("  A running 'classpilot run' picks this up automatically.");
    }

    Ok(())
}

fn path(cli: &Cli) -> Result<()> {
    let path = SettingsStore::settings_path();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string() })
        );
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

fn print_flag(name: &str, value: bool) {
    if value {
        println!("{} {}: ON", "✓".green(), name);
    } else {
        println!("{} {}: OFF", "○".dimmed(), name);
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(ClasspilotError::ConfigError(format!(
            "Expected on/off, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert!(parse_flag("on").unwrap());
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(!parse_flag("False").unwrap());
        assert!(!parse_flag(" 0 ").unwrap());
    }

    #[test]
    fn parse_flag_rejects_garbage() {
        assert!(parse_flag("maybe").is_err());
    }
}
