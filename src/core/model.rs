// Player preference model shared by the cache, the stores and the engine.
//
// NOTE: The serialized enum names match the values accepted by the
// `/mentions display` and `/mentions preference` commands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;

/// Sound key meaning "never play a cue".
pub const NO_SOUND: &str = "none";

/// Which channels a mentioned player is notified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayMode {
    #[serde(rename = "ONLY_CHAT")]
    ChatOnly,
    #[serde(rename = "ONLY_ACTIONBAR")]
    ActionbarOnly,
    #[serde(rename = "ONLY_SOUND")]
    SoundOnly,
    #[serde(rename = "CHAT_AND_ACTIONBAR")]
    ChatAndActionbar,
    #[serde(rename = "CHAT_AND_SOUND")]
    ChatAndSound,
    #[serde(rename = "ACTIONBAR_AND_SOUND")]
    ActionbarAndSound,
    #[serde(rename = "ALL")]
    All,
}

/// The channel subset selected by a [`DisplayMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    pub chat: bool,
    pub status: bool,
    pub sound: bool,
}

impl DisplayMode {
    pub fn all() -> &'static [DisplayMode] {
        &[
            Self::ChatOnly,
            Self::ActionbarOnly,
            Self::SoundOnly,
            Self::ChatAndActionbar,
            Self::ChatAndSound,
            Self::ActionbarAndSound,
            Self::All,
        ]
    }

    /// Name used in storage and in commands
    pub fn key(&self) -> &'static str {
        match self {
            Self::ChatOnly => "ONLY_CHAT",
            Self::ActionbarOnly => "ONLY_ACTIONBAR",
            Self::SoundOnly => "ONLY_SOUND",
            Self::ChatAndActionbar => "CHAT_AND_ACTIONBAR",
            Self::ChatAndSound => "CHAT_AND_SOUND",
            Self::ActionbarAndSound => "ACTIONBAR_AND_SOUND",
            Self::All => "ALL",
        }
    }

    /// Fixed fan-out table for the dispatcher.
    pub fn channels(&self) -> Channels {
        let (chat, status, sound) = match self {
            Self::ChatOnly => (true, false, false),
            Self::ActionbarOnly => (false, true, false),
            Self::SoundOnly => (false, false, true),
            Self::ChatAndActionbar => (true, true, false),
            Self::ChatAndSound => (true, false, true),
            Self::ActionbarAndSound => (false, true, true),
            Self::All => (true, true, true),
        };
        Channels { chat, status, sound }
    }
}

/// Whether (and how) combat gates notifications for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotifyPreference {
    #[serde(rename = "ALWAYS")]
    Always,
    #[serde(rename = "NEVER_IN_COMBAT")]
    NeverInCombat,
    #[serde(rename = "SILENT_IN_COMBAT")]
    SilentInCombat,
    #[serde(rename = "NEVER")]
    Never,
}

impl NotifyPreference {
    pub fn all() -> &'static [NotifyPreference] {
        &[
            Self::Always,
            Self::NeverInCombat,
            Self::SilentInCombat,
            Self::Never,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Always => "ALWAYS",
            Self::NeverInCombat => "NEVER_IN_COMBAT",
            Self::SilentInCombat => "SILENT_IN_COMBAT",
            Self::Never => "NEVER",
        }
    }
}

/// Returned when a display mode or preference name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

// Accepts both the stored name (ONLY_CHAT) and the variant name (ChatOnly).
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

impl FromStr for DisplayMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::all()
            .iter()
            .copied()
            .find(|mode| normalize(mode.key()) == wanted || normalize(&format!("{:?}", mode)) == wanted)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for NotifyPreference {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::all()
            .iter()
            .copied()
            .find(|pref| normalize(pref.key()) == wanted)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for NotifyPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Stored notification settings of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPreference {
    pub player_id: PlayerId,
    pub sound_key: String,
    pub display_mode: DisplayMode,
    pub notify_preference: NotifyPreference,
}

impl PlayerPreference {
    pub fn new(
        player_id: PlayerId,
        sound_key: impl Into<String>,
        display_mode: DisplayMode,
        notify_preference: NotifyPreference,
    ) -> Self {
        Self {
            player_id,
            sound_key: sound_key.into(),
            display_mode,
            notify_preference,
        }
    }
}

/// A currently addressable player as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
}

impl RosterEntry {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_channels_are_distinct() {
        let mut seen = Vec::new();
        for mode in DisplayMode::all() {
            let channels = mode.channels();
            assert!(channels.chat || channels.status || channels.sound);
            assert!(!seen.contains(&channels), "{mode} duplicates a channel set");
            seen.push(channels);
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_parse_accepts_stored_and_variant_names() {
        assert_eq!("ONLY_CHAT".parse::<DisplayMode>(), Ok(DisplayMode::ChatOnly));
        assert_eq!("chatonly".parse::<DisplayMode>(), Ok(DisplayMode::ChatOnly));
        assert_eq!("all".parse::<DisplayMode>(), Ok(DisplayMode::All));
        assert_eq!(
            "silent_in_combat".parse::<NotifyPreference>(),
            Ok(NotifyPreference::SilentInCombat)
        );
        assert!("LOUD".parse::<NotifyPreference>().is_err());
        assert!("CHAT_ONLY_PLEASE".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_preference_json_uses_stored_names() {
        let pref = PlayerPreference::new(
            Uuid::nil(),
            NO_SOUND,
            DisplayMode::ActionbarAndSound,
            NotifyPreference::NeverInCombat,
        );
        let json = serde_json::to_string(&pref).unwrap();
        assert!(json.contains("\"ACTIONBAR_AND_SOUND\""));
        assert!(json.contains("\"NEVER_IN_COMBAT\""));

        let back: PlayerPreference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pref);
    }

    #[test]
    fn test_unknown_stored_variant_fails_to_load() {
        let json = r#"{"player_id":"00000000-0000-0000-0000-000000000000","sound_key":"none","display_mode":"HOLOGRAM","notify_preference":"ALWAYS"}"#;
        assert!(serde_json::from_str::<PlayerPreference>(json).is_err());
    }
}
