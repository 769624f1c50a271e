// Marker selection for mentioned players.
//
// Formats are gated by capabilities of the *mentioned* player. The first
// gate the player holds wins; otherwise the default template applies.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::config::FormattingSettings;
use crate::core::host::CapabilityCheck;
use crate::core::model::RosterEntry;

/// Placeholder replaced by the mentioned player's name.
pub const PLAYER_PLACEHOLDER: &str = "%player%";

/// Capability prefix for permission-gated formats.
pub const FORMAT_CAPABILITY_PREFIX: &str = "mentions.format.";

lazy_static! {
    // group:<key>;format:<template>
    static ref FORMAT_ENTRY: Regex =
        Regex::new(r"^\s*group:(?P<group>[^;]+?)\s*;\s*format:(?P<format>.+)$").expect("Invalid format entry regex");
}

/// A capability-gated mention template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionFormat {
    pub capability: String,
    pub template: String,
}

impl MentionFormat {
    /// Parse a `group:<key>;format:<template>` config entry.
    pub fn parse(entry: &str) -> Option<Self> {
        let caps = FORMAT_ENTRY.captures(entry)?;
        let group = caps.name("group")?.as_str().trim();
        let template = caps.name("format")?.as_str();
        if group.is_empty() {
            return None;
        }
        Some(Self {
            capability: format!("{}{}", FORMAT_CAPABILITY_PREFIX, group),
            template: template.to_string(),
        })
    }
}

/// Single literal substitution, no recursive expansion.
pub fn fill_template(template: &str, name: &str) -> String {
    template.replace(PLAYER_PLACEHOLDER, name)
}

#[derive(Debug, Clone)]
pub struct FormatResolver {
    formats: Vec<MentionFormat>,
    default_template: String,
}

impl FormatResolver {
    pub fn new(formats: Vec<MentionFormat>, default_template: impl Into<String>) -> Self {
        Self {
            formats,
            default_template: default_template.into(),
        }
    }

    /// Build from settings; malformed entries are logged and skipped.
    pub fn from_settings(settings: &FormattingSettings) -> Self {
        let mut formats = Vec::with_capacity(settings.permission_formats.len());
        for entry in &settings.permission_formats {
            match MentionFormat::parse(entry) {
                Some(format) => formats.push(format),
                None => log::warn!(
                    "Ignoring permission format '{}', expected 'group:<name>;format:<template>'",
                    entry
                ),
            }
        }
        if settings.default_format.trim().is_empty() {
            log::error!("No default mention format configured, mentions will show the bare player name");
        }
        Self::new(formats, settings.default_format.clone())
    }

    pub fn formats(&self) -> &[MentionFormat] {
        &self.formats
    }

    /// Marker text a mention of `player` is rewritten into.
    pub fn resolve_marker(&self, player: &RosterEntry, capabilities: &dyn CapabilityCheck) -> String {
        let template = self
            .formats
            .iter()
            .find(|format| {
                let held = capabilities.has_capability(&player.id, &format.capability);
                if !held {
                    log::debug!("{} lacks {}", player.name, format.capability);
                }
                held
            })
            .map(|format| format.template.as_str())
            .unwrap_or(self.default_template.as_str());

        if template.trim().is_empty() {
            return player.name.clone();
        }
        fill_template(template, &player.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PlayerId;
    use std::collections::HashSet;
    use uuid::Uuid;

    struct Grants(HashSet<(PlayerId, String)>);

    impl CapabilityCheck for Grants {
        fn has_capability(&self, id: &PlayerId, capability: &str) -> bool {
            self.0.contains(&(*id, capability.to_string()))
        }
    }

    fn resolver() -> FormatResolver {
        FormatResolver::from_settings(&FormattingSettings {
            permission_formats: vec![
                "group:admin;format:&c@%player%".to_string(),
                "group:vip;format:&d@%player%".to_string(),
            ],
            default_format: "&e@%player%&r".to_string(),
            ..FormattingSettings::default()
        })
    }

    #[test]
    fn test_parse_format_entry() {
        let format = MentionFormat::parse("group:vip;format:&d@%player%&r").unwrap();
        assert_eq!(format.capability, "mentions.format.vip");
        assert_eq!(format.template, "&d@%player%&r");

        assert!(MentionFormat::parse("vip=&d@%player%").is_none());
        assert!(MentionFormat::parse("group:;format:x").is_none());
        assert!(MentionFormat::parse("group:vip;format:").is_none());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let resolver = FormatResolver::from_settings(&FormattingSettings {
            permission_formats: vec!["garbage".to_string(), "group:mod;format:&b%player%".to_string()],
            ..FormattingSettings::default()
        });
        assert_eq!(resolver.formats().len(), 1);
        assert_eq!(resolver.formats()[0].capability, "mentions.format.mod");
    }

    #[test]
    fn test_first_held_gate_wins() {
        let steve = RosterEntry::new(Uuid::new_v4(), "Steve");
        let grants = Grants(
            [
                (steve.id, "mentions.format.vip".to_string()),
                (steve.id, "mentions.format.admin".to_string()),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(resolver().resolve_marker(&steve, &grants), "&c@Steve");
    }

    #[test]
    fn test_vip_only_gets_vip_template() {
        let alex = RosterEntry::new(Uuid::new_v4(), "Alex");
        let grants = Grants([(alex.id, "mentions.format.vip".to_string())].into_iter().collect());
        assert_eq!(resolver().resolve_marker(&alex, &grants), "&d@Alex");
    }

    #[test]
    fn test_no_gate_uses_default() {
        let alex = RosterEntry::new(Uuid::new_v4(), "Alex");
        let grants = Grants(HashSet::new());
        assert_eq!(resolver().resolve_marker(&alex, &grants), "&e@Alex&r");
    }

    #[test]
    fn test_empty_default_falls_back_to_name() {
        let resolver = FormatResolver::new(Vec::new(), "");
        let alex = RosterEntry::new(Uuid::new_v4(), "Alex");
        assert_eq!(resolver.resolve_marker(&alex, &Grants(HashSet::new())), "Alex");
    }

    #[test]
    fn test_substitution_is_not_recursive() {
        let resolver = FormatResolver::new(Vec::new(), "[%player%]");
        let odd = RosterEntry::new(Uuid::new_v4(), "%player%");
        assert_eq!(resolver.resolve_marker(&odd, &Grants(HashSet::new())), "[%player%]");
    }
}
