use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::Result;

/// User-togglable playback policies, persisted across runs.
///
/// The JSON keys mirror the names the toggles have always been stored
/// under, so an existing settings file keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub auto_play_enabled: bool,
    pub background_auto_play: bool,
    pub return_to_chapter: bool,
    #[serde(rename = "hideUI")]
    pub hide_ui: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_play_enabled: true,
            background_auto_play: false,
            return_to_chapter: true,
            hide_ui: false,
        }
    }
}

impl Settings {
    /// Read flags out of a loosely-shaped JSON value. A missing key or a
    /// value of the wrong type falls back to the documented default and
    /// is never an error.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Settings::default();
        Settings {
            enabled: bool_key(value, "enabled").unwrap_or(defaults.enabled),
            auto_play_enabled: bool_key(value, "autoPlayEnabled")
                .unwrap_or(defaults.auto_play_enabled),
            background_auto_play: bool_key(value, "backgroundAutoPlay")
                .unwrap_or(defaults.background_auto_play),
            return_to_chapter: bool_key(value, "returnToChapter")
                .unwrap_or(defaults.return_to_chapter),
            hide_ui: bool_key(value, "hideUI").unwrap_or(defaults.hide_ui),
        }
    }
}

fn bool_key(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

/// Flag store with a change-notification channel.
///
/// Flags live in a JSON file under the user's home directory so every CLI
/// invocation sees the same state. A running automaton additionally picks
/// up edits made by other processes through `reload_if_changed`.
pub struct SettingsStore {
    path: PathBuf,
    tx: watch::Sender<Settings>,
    last_modified: Option<SystemTime>,
}

impl SettingsStore {
    pub fn open() -> Self {
        Self::at(Self::settings_path())
    }

    pub fn at(path: PathBuf) -> Self {
        let settings = load_from(&path);
        let (tx, _) = watch::channel(settings);
        let last_modified = modified_at(&path);
        Self {
            path,
            tx,
            last_modified,
        }
    }

    pub fn settings_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".classpilot")
            .join("settings.json")
    }

    pub fn current(&self) -> Settings {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    /// Apply a mutation, persist it, and notify subscribers. A no-op
    /// mutation neither writes nor notifies.
    pub fn update(&mut self, apply: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut next = self.current();
        apply(&mut next);
        if next != self.current() {
            self.persist(next)?;
            self.tx.send_replace(next);
        }
        Ok(next)
    }

    /// Pick up edits made by another classpilot process. Returns the new
    /// snapshot when the file changed on disk and its content differs.
    pub fn reload_if_changed(&mut self) -> Option<Settings> {
        let modified = modified_at(&self.path)?;
        if self.last_modified == Some(modified) {
            return None;
        }
        self.last_modified = Some(modified);
        let settings = load_from(&self.path);
        if settings == self.current() {
            return None;
        }
        self.tx.send_replace(settings);
        Some(settings)
    }

    fn persist(&mut self, settings: Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&settings)?;
        fs::write(&self.path, content)?;
        self.last_modified = modified_at(&self.path);
        Ok(())
    }
}

fn load_from(path: &Path) -> Settings {
    let Ok(content) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(value) => Settings::from_value(&value),
        Err(_) => Settings::default(),
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();

        assert!(settings.enabled);
        assert!(settings.auto_play_enabled);
        assert!(!settings.background_auto_play);
        assert!(settings.return_to_chapter);
        assert!(!settings.hide_ui);
    }

    #[test]
    fn missing_keys_load_as_defaults() {
        let value = serde_json::json!({ "backgroundAutoPlay": true });
        let settings = Settings::from_value(&value);

        assert!(settings.enabled);
        assert!(settings.auto_play_enabled);
        assert!(settings.background_auto_play);
        assert!(settings.return_to_chapter);
        assert!(!settings.hide_ui);
    }

    #[test]
    fn wrong_shapes_are_ignored_not_applied() {
        let value = serde_json::json!({
            "enabled": "yes",
            "autoPlayEnabled": 1,
            "backgroundAutoPlay": null,
            "returnToChapter": ["true"],
            "hideUI": { "value": true }
        });
        let settings = Settings::from_value(&value);

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn non_object_snapshot_loads_defaults() {
        let settings = Settings::from_value(&serde_json::json!("garbage"));

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn persisted_keys_keep_their_historic_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();

        for key in [
            "enabled",
            "autoPlayEnabled",
            "backgroundAutoPlay",
            "returnToChapter",
            "hideUI",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn update_persists_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::at(path.clone());
        let mut rx = store.subscribe();

        store.update(|s| s.background_auto_play = true).unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().background_auto_play);

        let reloaded = load_from(&path);
        assert!(reloaded.background_auto_play);
    }

    #[test]
    fn noop_update_does_not_notify() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::at(dir.path().join("settings.json"));
        let rx = store.subscribe();

        store.update(|_| {}).unwrap();

        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn unreadable_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();

        let store = SettingsStore::at(path);
        assert_eq!(store.current(), Settings::default());
    }
}
