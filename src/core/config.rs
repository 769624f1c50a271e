use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

use super::model::{DisplayMode, NotifyPreference};

/// Hardcoded cue used when neither the player's nor the configured sound exists.
pub const FALLBACK_SOUND: &str = "ENTITY_PLAYER_LEVELUP";

/// Engine settings, persisted in settings.json.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub defaults: DefaultSettings,
    #[serde(default)]
    pub notification: NotificationSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub formatting: FormattingSettings,
    #[serde(default)]
    pub combat: CombatSettings,
    /// Cue names accepted by `/mentions sound`
    #[serde(default = "default_sounds")]
    pub sounds: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            defaults: DefaultSettings::default(),
            notification: NotificationSettings::default(),
            limits: LimitSettings::default(),
            formatting: FormattingSettings::default(),
            combat: CombatSettings::default(),
            sounds: default_sounds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Json,
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default)]
    pub kind: StorageKind,
    #[serde(default = "default_storage_dir")]
    pub directory: PathBuf,
    /// Upper bound on how long a command waits for the store
    #[serde(default = "default_storage_timeout")]
    pub timeout_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            kind: StorageKind::Json,
            directory: default_storage_dir(),
            timeout_ms: default_storage_timeout(),
        }
    }
}

/// Values written for a player on first join.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DefaultSettings {
    #[serde(default = "default_display")]
    pub display: DisplayMode,
    #[serde(default = "default_preference")]
    pub preference: NotifyPreference,
    #[serde(default = "default_sound")]
    pub sound: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            display: default_display(),
            preference: default_preference(),
            sound: default_sound(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationSettings {
    #[serde(default = "default_one")]
    pub volume: f32,
    #[serde(default = "default_one")]
    pub pitch: f32,
    #[serde(default = "default_chat_message")]
    pub chat_message: String,
    #[serde(default = "default_status_message")]
    pub status_message: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            chat_message: default_chat_message(),
            status_message: default_status_message(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LimitSettings {
    /// Seconds a mentioner has to wait before notifying anyone again. Below 1 disables it.
    #[serde(default = "default_cooldown")]
    pub mention_cooldown_seconds: i64,
    #[serde(default = "default_max_mentions")]
    pub max_mentions_per_message: usize,
    #[serde(default = "default_true")]
    pub allow_self_mention: bool,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            mention_cooldown_seconds: default_cooldown(),
            max_mentions_per_message: default_max_mentions(),
            allow_self_mention: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FormattingSettings {
    #[serde(default)]
    pub require_prefix: bool,
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Entries of the form `group:<key>;format:<template>`, first match wins
    #[serde(default = "default_permission_formats")]
    pub permission_formats: Vec<String>,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            require_prefix: false,
            prefixes: default_prefixes(),
            default_format: default_format(),
            permission_formats: default_permission_formats(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CombatProvider {
    #[default]
    None,
    Tagging,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CombatSettings {
    #[serde(default)]
    pub provider: CombatProvider,
    #[serde(default = "default_tag_seconds")]
    pub tag_seconds: i64,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            provider: CombatProvider::None,
            tag_seconds: default_tag_seconds(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_storage_timeout() -> u64 {
    2000
}

fn default_display() -> DisplayMode {
    DisplayMode::All
}

fn default_preference() -> NotifyPreference {
    NotifyPreference::Always
}

fn default_sound() -> String {
    FALLBACK_SOUND.to_string()
}

fn default_one() -> f32 {
    1.0
}

fn default_chat_message() -> String {
    "&e%player% &7mentioned you in chat.".to_string()
}

fn default_status_message() -> String {
    "&e%player% &7mentioned you!".to_string()
}

fn default_cooldown() -> i64 {
    3
}

fn default_max_mentions() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_prefixes() -> Vec<String> {
    vec!["@".to_string(), "!".to_string()]
}

fn default_format() -> String {
    "&e@%player%&r".to_string()
}

fn default_permission_formats() -> Vec<String> {
    vec![
        "group:admin;format:&c@%player%&r".to_string(),
        "group:vip;format:&d@%player%&r".to_string(),
    ]
}

fn default_tag_seconds() -> i64 {
    15
}

fn default_sounds() -> Vec<String> {
    [
        "ENTITY_PLAYER_LEVELUP",
        "ENTITY_EXPERIENCE_ORB_PICKUP",
        "BLOCK_NOTE_BLOCK_PLING",
        "BLOCK_NOTE_BLOCK_BELL",
        "BLOCK_NOTE_BLOCK_CHIME",
        "BLOCK_NOTE_BLOCK_HARP",
        "ENTITY_ARROW_HIT_PLAYER",
        "ENTITY_VILLAGER_YES",
        "UI_BUTTON_CLICK",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
        }
    }

    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!(
                        "Ignoring malformed settings file {:?}: {}",
                        self.config_path,
                        e
                    ),
                },
                Err(e) => log::warn!("Could not read settings file {:?}: {}", self.config_path, e),
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().to_path_buf());

        let default = manager.load();
        assert_eq!(default.limits.max_mentions_per_message, 3);
        assert_eq!(default.formatting.prefixes, vec!["@", "!"]);

        let mut new_settings = Settings::default();
        new_settings.limits.mention_cooldown_seconds = 10;
        new_settings.formatting.require_prefix = true;
        new_settings.defaults.display = DisplayMode::ChatAndSound;

        manager.save(&new_settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded.limits.mention_cooldown_seconds, 10);
        assert!(loaded.formatting.require_prefix);
        assert_eq!(loaded.defaults.display, DisplayMode::ChatAndSound);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{ "limits": { "max_mentions_per_message": 1 }, "storage": { "kind": "memory" } }"#,
        )
        .unwrap();

        let loaded = ConfigManager::new(dir.path().to_path_buf()).load();
        assert_eq!(loaded.limits.max_mentions_per_message, 1);
        assert_eq!(loaded.limits.mention_cooldown_seconds, 3);
        assert!(loaded.limits.allow_self_mention);
        assert_eq!(loaded.storage.kind, StorageKind::Memory);
        assert_eq!(loaded.defaults.sound, FALLBACK_SOUND);
        assert!(!loaded.sounds.is_empty());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

        let loaded = ConfigManager::new(dir.path().to_path_buf()).load();
        assert_eq!(loaded.formatting.default_format, "&e@%player%&r");
    }
}
