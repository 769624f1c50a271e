// Sound key validation and resolution.

use std::collections::HashSet;

use super::config::FALLBACK_SOUND;
use super::model::NO_SOUND;

/// What the dispatcher should do on the audio channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueChoice {
    Silent,
    Play(String),
}

/// The set of cue names the host can play.
#[derive(Debug, Clone, Default)]
pub struct SoundCatalog {
    /// Canonical (upper-case) names
    known: Vec<String>,
}

impl SoundCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let known = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_uppercase())
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(NO_SOUND))
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self { known }
    }

    pub fn names(&self) -> &[String] {
        &self.known
    }

    /// Canonical name for a key, ignoring case.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.known
            .iter()
            .find(|name| name.eq_ignore_ascii_case(key.trim()))
            .map(String::as_str)
    }

    /// Value to store for a key a player typed, `None` if it is not accepted.
    pub fn parse_setting(&self, key: &str) -> Option<String> {
        if key.trim().eq_ignore_ascii_case(NO_SOUND) {
            return Some(NO_SOUND.to_string());
        }
        self.lookup(key).map(str::to_string)
    }

    /// Decide which cue to play for a stored key.
    ///
    /// A stored `none` is silent. Unknown keys fall back to `default_key`,
    /// and if that is unknown too, to the built-in level-up cue.
    pub fn resolve(&self, stored_key: &str, default_key: &str) -> CueChoice {
        if stored_key.trim().eq_ignore_ascii_case(NO_SOUND) {
            return CueChoice::Silent;
        }
        if let Some(name) = self.lookup(stored_key) {
            return CueChoice::Play(name.to_string());
        }

        log::debug!("Unknown sound '{}', using default '{}'", stored_key, default_key);
        if default_key.trim().eq_ignore_ascii_case(NO_SOUND) {
            return CueChoice::Silent;
        }
        match self.lookup(default_key) {
            Some(name) => CueChoice::Play(name.to_string()),
            None => CueChoice::Play(FALLBACK_SOUND.to_string()),
        }
    }
}
