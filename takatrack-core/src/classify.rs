//! Mapping of raw source status strings to canonical states and marker colors.

use crate::model::{CanonicalState, ClassifiedEntity, DisplayToken, Entity};

/// Classify a raw status string.
///
/// Matching ignores case and surrounding whitespace. Anything unrecognized,
/// including a missing status, is [`CanonicalState::Unknown`].
#[must_use]
pub fn classify(raw_status: Option<&str>) -> CanonicalState {
    let Some(raw) = raw_status else {
        return CanonicalState::Unknown;
    };

    match raw.trim().to_lowercase().as_str() {
        "full" => CanonicalState::Full,
        "half" | "pending" => CanonicalState::Pending,
        "empty" => CanonicalState::Empty,
        _ => CanonicalState::Unknown,
    }
}

/// Marker color for a canonical state.
///
/// Unknown renders like an empty bin so it never reads as an alarm.
#[must_use]
pub fn display_token(state: CanonicalState) -> DisplayToken {
    match state {
        CanonicalState::Full => DisplayToken::Red,
        CanonicalState::Pending => DisplayToken::Yellow,
        CanonicalState::Empty | CanonicalState::Unknown => DisplayToken::Green,
    }
}

/// Annotate an entity with its state and marker color.
#[must_use]
pub fn classify_entity(entity: Entity) -> ClassifiedEntity {
    let state = classify(entity.raw_status.as_deref());
    ClassifiedEntity {
        entity,
        state,
        token: display_token(state),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn matches_known_statuses() {
        assert_eq!(classify(Some("full")), CanonicalState::Full);
        assert_eq!(classify(Some("Half")), CanonicalState::Pending);
        assert_eq!(classify(Some("PENDING")), CanonicalState::Pending);
        assert_eq!(classify(Some("empty")), CanonicalState::Empty);
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(classify(None), CanonicalState::Unknown);
        assert_eq!(classify(Some("")), CanonicalState::Unknown);
        assert_eq!(classify(Some("overflowing")), CanonicalState::Unknown);
        assert_eq!(classify(Some("ful l")), CanonicalState::Unknown);
    }

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert_eq!(classify(Some("FULL ")), classify(Some("full")));
        assert_eq!(classify(Some("\t empty\n")), CanonicalState::Empty);
    }

    #[test]
    fn token_mapping_is_fixed() {
        assert_eq!(display_token(CanonicalState::Full), DisplayToken::Red);
        assert_eq!(display_token(CanonicalState::Pending), DisplayToken::Yellow);
        assert_eq!(display_token(CanonicalState::Empty), DisplayToken::Green);
        assert_eq!(display_token(CanonicalState::Unknown), DisplayToken::Green);
    }

    proptest! {
        #[test]
        fn every_string_classifies(raw in any::<String>()) {
            let state = classify(Some(&raw));
            prop_assert!(CanonicalState::ALL.contains(&state));
        }

        #[test]
        fn padding_and_case_do_not_matter(
            word in prop::sample::select(vec!["full", "half", "pending", "empty", "other"]),
            upper in any::<bool>(),
            left in "[ \t\n]{0,3}",
            right in "[ \t\n]{0,3}",
        ) {
            let cased = if upper { word.to_uppercase() } else { word.to_owned() };
            let padded = format!("{left}{cased}{right}");
            prop_assert_eq!(classify(Some(&padded)), classify(Some(word)));
        }
    }
}
