// Notification policy: whether a mentioned player is notified, and whether audio is muted.

use crate::core::model::NotifyPreference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Notify { silent: bool },
}

/// Combat is only consulted for the preferences that depend on it.
pub fn decide<F>(preference: NotifyPreference, in_combat: F) -> Decision
where
    F: FnOnce() -> bool,
{
    match preference {
        NotifyPreference::Always => Decision::Notify { silent: false },
        NotifyPreference::SilentInCombat => Decision::Notify { silent: in_combat() },
        NotifyPreference::NeverInCombat => {
            if in_combat() {
                Decision::Skip
            } else {
                Decision::Notify { silent: false }
            }
        }
        NotifyPreference::Never => Decision::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table() {
        let cases = [
            (NotifyPreference::Always, false, Decision::Notify { silent: false }),
            (NotifyPreference::Always, true, Decision::Notify { silent: false }),
            (NotifyPreference::SilentInCombat, true, Decision::Notify { silent: true }),
            (NotifyPreference::SilentInCombat, false, Decision::Notify { silent: false }),
            (NotifyPreference::NeverInCombat, true, Decision::Skip),
            (NotifyPreference::NeverInCombat, false, Decision::Notify { silent: false }),
            (NotifyPreference::Never, true, Decision::Skip),
            (NotifyPreference::Never, false, Decision::Skip),
        ];

        for (preference, combat, expected) in cases {
            assert_eq!(
                decide(preference, || combat),
                expected,
                "{preference} with combat={combat}"
            );
        }
    }

    #[test]
    fn test_combat_not_checked_when_irrelevant() {
        let mut asked = false;
        decide(NotifyPreference::Always, || {
            asked = true;
            true
        });
        assert!(!asked);
    }
}
