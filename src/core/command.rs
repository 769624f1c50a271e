//! `/mentions` sub-commands and their tab completion.
//!
//! Parsing is separate from execution so hosts can reuse the validation and
//! completion with their own command frameworks.

use std::fmt;

use super::config::ConfigManager;
use super::error::{PreferenceError, StoreError};
use super::mentions::MentionEngine;
use super::model::{DisplayMode, NotifyPreference, PlayerId, NO_SOUND};
use super::sound::SoundCatalog;

const SUBCOMMANDS: &[&str] = &["help", "show", "sound", "display", "preference", "reset", "reload"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionCommand {
    Help,
    Show,
    Sound(String),
    Display(DisplayMode),
    Preference(NotifyPreference),
    Reset,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Missing argument; carries the usage line
    Usage(&'static str),
    InvalidValue { kind: &'static str, value: String },
    Unknown(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(usage) => write!(f, "Usage: {}", usage),
            Self::InvalidValue { kind, value } => write!(f, "'{}' is not a valid {}", value, kind),
            Self::Unknown(name) => write!(f, "Unknown sub-command '{}', try /mentions help", name),
        }
    }
}

impl std::error::Error for CommandError {}

impl MentionCommand {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        let Some(sub) = args.first() else {
            return Ok(Self::Help);
        };
        let value = args.get(1).copied();

        match sub.to_ascii_lowercase().as_str() {
            "help" | "?" => Ok(Self::Help),
            "show" => Ok(Self::Show),
            "reset" => Ok(Self::Reset),
            "reload" => Ok(Self::Reload),
            "sound" => value
                .map(|v| Self::Sound(v.to_string()))
                .ok_or(CommandError::Usage("/mentions sound <sound|none>")),
            "display" => {
                let value = value.ok_or(CommandError::Usage("/mentions display <mode>"))?;
                value.parse().map(Self::Display).map_err(|_| CommandError::InvalidValue {
                    kind: "display mode",
                    value: value.to_string(),
                })
            }
            "preference" => {
                let value = value.ok_or(CommandError::Usage("/mentions preference <preference>"))?;
                value.parse().map(Self::Preference).map_err(|_| CommandError::InvalidValue {
                    kind: "preference",
                    value: value.to_string(),
                })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Run the command for `player` and return the reply text.
    pub async fn execute(self, engine: &MentionEngine, player: PlayerId, config: &ConfigManager) -> String {
        match self {
            Self::Help => help_text(),
            Self::Show => match engine.preferences(&player) {
                Some(p) => format!(
                    "Sound: {} | Display: {} | Preference: {}",
                    p.sound_key, p.display_mode, p.notify_preference
                ),
                None => "Your mention settings are not loaded yet.".to_string(),
            },
            Self::Sound(key) => match engine.set_sound(player, &key).await {
                Ok(stored) => format!("Mention sound set to {}.", stored),
                Err(PreferenceError::InvalidSound(value)) => {
                    format!("'{}' is not a valid sound", value)
                }
                Err(e) => storage_failed(&e),
            },
            Self::Display(mode) => match engine.set_display(player, mode).await {
                Ok(()) => format!("Mention display set to {}.", mode),
                Err(e) => storage_failed(&e),
            },
            Self::Preference(pref) => match engine.set_preference(player, pref).await {
                Ok(()) => format!("Mention preference set to {}.", pref),
                Err(e) => storage_failed(&e),
            },
            Self::Reset => match engine.reset_preferences(player).await {
                Ok(_) => "Mention settings reset to defaults.".to_string(),
                Err(e) => storage_failed(&e),
            },
            Self::Reload => {
                engine.update_config(config.load());
                "Mention settings reloaded.".to_string()
            }
        }
    }
}

fn storage_failed(error: &PreferenceError) -> String {
    match error {
        // The write may still complete; cache and store are updated together if it does
        PreferenceError::Store(StoreError::Timeout(_)) => {
            "Saving your settings is taking longer than usual, check /mentions show in a moment.".to_string()
        }
        _ => "Your settings could not be saved, try again later.".to_string(),
    }
}

fn help_text() -> String {
    [
        "/mentions show - show your settings",
        "/mentions sound <sound|none> - choose the mention sound",
        "/mentions display <mode> - choose where mentions appear",
        "/mentions preference <preference> - choose when you are notified",
        "/mentions reset - restore the defaults",
        "/mentions reload - reload the configuration",
    ]
    .join("\n")
}

/// Tab completions for the argument being typed (the last element of `args`).
pub fn complete(args: &[&str], catalog: &SoundCatalog) -> Vec<String> {
    let typed = args.last().copied().unwrap_or("");
    let candidates: Vec<String> = match args.len() {
        0 | 1 => SUBCOMMANDS.iter().map(|s| s.to_string()).collect(),
        2 => match args[0].to_ascii_lowercase().as_str() {
            "sound" => std::iter::once(NO_SOUND.to_string())
                .chain(catalog.names().iter().cloned())
                .collect(),
            "display" => DisplayMode::all().iter().map(|m| m.key().to_string()).collect(),
            "preference" => NotifyPreference::all().iter().map(|p| p.key().to_string()).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let typed = typed.to_ascii_lowercase();
    candidates
        .into_iter()
        .filter(|c| c.to_ascii_lowercase().starts_with(&typed))
        .collect()
}
