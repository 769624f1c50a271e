// Mention scanning and message rewriting.
//
// Names are matched as plain substrings of the raw text, case-sensitive and
// not word-aware: "Ann" is found inside "Anna". Candidates are credited in
// roster order until the per-message cap is reached. The rewrite is a single
// left-to-right pass over the raw text, so a marker inserted for one player
// is never scanned again for another.

use std::collections::HashSet;

use crate::core::config::{FormattingSettings, LimitSettings};
use crate::core::model::{PlayerId, RosterEntry};

/// Which spellings of a name count as a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    prefixes: Vec<String>,
    require_prefix: bool,
}

impl MatchRule {
    pub fn new(prefixes: Vec<String>, require_prefix: bool) -> Self {
        let prefixes = prefixes.into_iter().filter(|p| !p.is_empty()).collect();
        Self {
            prefixes,
            require_prefix,
        }
    }

    pub fn from_settings(settings: &FormattingSettings) -> Self {
        if settings.require_prefix && settings.prefixes.iter().all(|p| p.is_empty()) {
            log::warn!("Prefixes are required but none are configured, nobody can be mentioned");
        }
        Self::new(settings.prefixes.clone(), settings.require_prefix)
    }

    /// Accepted spellings of `name`, in prefix order, bare name last.
    pub fn alternatives(&self, name: &str) -> Vec<String> {
        let mut alternatives: Vec<String> = self
            .prefixes
            .iter()
            .map(|prefix| format!("{}{}", prefix, name))
            .collect();
        if !self.require_prefix {
            alternatives.push(name.to_string());
        }
        alternatives
    }
}

/// Per-message limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub allow_self_mention: bool,
    pub max_mentions: usize,
}

impl From<&LimitSettings> for ScanLimits {
    fn from(settings: &LimitSettings) -> Self {
        Self {
            allow_self_mention: settings.allow_self_mention,
            max_mentions: settings.max_mentions_per_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The message with every accepted spelling replaced by its marker
    pub text: String,
    /// Credited players, in roster order, each at most once
    pub matches: Vec<PlayerId>,
}

struct Credited {
    id: PlayerId,
    alternatives: Vec<String>,
    marker: String,
}

/// Scan `raw` for mentions of `candidates`.
///
/// `marker_for` is only called for credited candidates.
pub fn scan<F>(
    raw: &str,
    candidates: &[RosterEntry],
    sender: &PlayerId,
    rule: &MatchRule,
    limits: ScanLimits,
    mut marker_for: F,
) -> ScanResult
where
    F: FnMut(&RosterEntry) -> String,
{
    let mut credited: Vec<Credited> = Vec::new();
    let mut seen: HashSet<PlayerId> = HashSet::new();

    for candidate in candidates {
        if credited.len() >= limits.max_mentions {
            log::debug!(
                "Mention cap of {} reached, ignoring the remaining players",
                limits.max_mentions
            );
            break;
        }
        if candidate.name.is_empty() || seen.contains(&candidate.id) {
            continue;
        }
        if !limits.allow_self_mention && candidate.id == *sender {
            continue;
        }

        let alternatives = rule.alternatives(&candidate.name);
        if !alternatives.iter().any(|alt| raw.contains(alt.as_str())) {
            continue;
        }

        seen.insert(candidate.id);
        credited.push(Credited {
            id: candidate.id,
            alternatives,
            marker: marker_for(candidate),
        });
    }

    if credited.is_empty() {
        return ScanResult {
            text: raw.to_string(),
            matches: Vec::new(),
        };
    }

    let text = rewrite(raw, &credited);
    ScanResult {
        text,
        matches: credited.into_iter().map(|c| c.id).collect(),
    }
}

fn rewrite(raw: &str, credited: &[Credited]) -> String {
    // Longest spelling first; the stable sort keeps roster order on ties.
    let mut patterns: Vec<(&str, &str)> = credited
        .iter()
        .flat_map(|c| c.alternatives.iter().map(move |alt| (alt.as_str(), c.marker.as_str())))
        .collect();
    patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while !rest.is_empty() {
        if let Some((pattern, marker)) = patterns.iter().find(|(pattern, _)| rest.starts_with(pattern)) {
            out.push_str(marker);
            rest = &rest[pattern.len()..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn roster(names: &[&str]) -> Vec<RosterEntry> {
        names.iter().map(|name| RosterEntry::new(Uuid::new_v4(), *name)).collect()
    }

    fn rule() -> MatchRule {
        MatchRule::new(vec!["@".to_string(), "!".to_string()], false)
    }

    fn limits(max: usize) -> ScanLimits {
        ScanLimits {
            allow_self_mention: false,
            max_mentions: max,
        }
    }

    fn marker(entry: &RosterEntry) -> String {
        format!("<{}>", entry.name)
    }

    #[test]
    fn test_bare_and_prefixed_mentions_are_rewritten() {
        let players = roster(&["Steve", "Alex"]);
        let sender = Uuid::new_v4();

        let result = scan("hey @Steve, Steve and !Steve", &players, &sender, &rule(), limits(3), marker);
        assert_eq!(result.text, "hey <Steve>, <Steve> and <Steve>");
        assert_eq!(result.matches, vec![players[0].id]);
    }

    #[test]
    fn test_no_match_returns_text_unchanged() {
        let players = roster(&["Steve"]);
        let result = scan("hello world", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert_eq!(result.text, "hello world");
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_require_prefix_ignores_bare_names() {
        let players = roster(&["Steve", "Alex"]);
        let strict = MatchRule::new(vec!["@".to_string()], true);

        let result = scan("Steve meet @Alex", &players, &Uuid::new_v4(), &strict, limits(3), marker);
        assert_eq!(result.text, "Steve meet <Alex>");
        assert_eq!(result.matches, vec![players[1].id]);
    }

    #[test]
    fn test_self_mention_rule() {
        let players = roster(&["Steve"]);
        let sender = players[0].id;

        let excluded = scan("I am Steve", &players, &sender, &rule(), limits(3), marker);
        assert!(excluded.matches.is_empty());
        assert_eq!(excluded.text, "I am Steve");

        let allowed = ScanLimits {
            allow_self_mention: true,
            max_mentions: 3,
        };
        let included = scan("I am Steve", &players, &sender, &rule(), allowed, marker);
        assert_eq!(included.matches, vec![sender]);
        assert_eq!(included.text, "I am <Steve>");
    }

    #[test]
    fn test_cap_follows_roster_order() {
        let players = roster(&["Ann", "Bob", "Cid", "Dee"]);
        let result = scan("Dee Cid Bob Ann", &players, &Uuid::new_v4(), &rule(), limits(2), marker);

        assert_eq!(result.matches, vec![players[0].id, players[1].id]);
        assert_eq!(result.text, "Dee Cid <Bob> <Ann>");
    }

    #[test]
    fn test_zero_cap_credits_nobody() {
        let players = roster(&["Ann"]);
        let result = scan("Ann", &players, &Uuid::new_v4(), &rule(), limits(0), marker);
        assert!(result.matches.is_empty());
        assert_eq!(result.text, "Ann");
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let players = roster(&["Ann"]);
        let result = scan("Anna is here", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert_eq!(result.matches, vec![players[0].id]);
        assert_eq!(result.text, "<Ann>a is here");
    }

    #[test]
    fn test_longer_name_wins_overlap() {
        let players = roster(&["Ann", "Anna"]);
        let result = scan("@Anna and Ann", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert_eq!(result.matches, vec![players[0].id, players[1].id]);
        assert_eq!(result.text, "<Anna> and <Ann>");
    }

    #[test]
    fn test_markers_are_not_rescanned() {
        // "e" occurs in the marker of "Steve" and must not be rewritten there
        let players = roster(&["Steve", "e"]);
        let result = scan("Steve", &players, &Uuid::new_v4(), &rule(), limits(3), |p| {
            format!("&e@{}&r", p.name)
        });
        assert_eq!(result.text, "&e@Steve&r");
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let players = roster(&["Steve"]);
        let result = scan("steve STEVE", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_names_with_pattern_characters_are_literal() {
        let players = roster(&["a.b", "x$1"]);
        let result = scan("aXb and @x$1", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert_eq!(result.matches, vec![players[1].id]);
        assert_eq!(result.text, "aXb and <x$1>");
    }

    #[test]
    fn test_multibyte_text_survives() {
        let players = roster(&["Zoë"]);
        let result = scan("héllo @Zoë ✓", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert_eq!(result.text, "héllo <Zoë> ✓");
    }

    #[test]
    fn test_duplicate_roster_entries_credited_once() {
        let steve = RosterEntry::new(Uuid::new_v4(), "Steve");
        let players = vec![steve.clone(), steve.clone()];
        let result = scan("Steve", &players, &Uuid::new_v4(), &rule(), limits(3), marker);
        assert_eq!(result.matches, vec![steve.id]);
    }
}
