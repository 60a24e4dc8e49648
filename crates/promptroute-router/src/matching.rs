// ABOUTME: Required-field gating and additive scoring of a single profile
// ABOUTME: Pure functions over a profile and enhanced prompt metadata

use promptroute_core::{EnhancedMetadata, Profile};

/// Whether `metadata` satisfies every required field of `profile`.
///
/// A profile without requirements matches anything. A requirement holds when
/// at least one of the metadata values for that field is acceptable; unknown
/// or unset fields never satisfy a requirement.
pub fn is_match(profile: &Profile, metadata: &EnhancedMetadata) -> bool {
    profile.required_fields.iter().all(|(field, acceptable)| {
        metadata
            .field_values(field)
            .into_iter()
            .any(|value| acceptable.contains(value))
    })
}

/// `default_score` plus field weights for present metadata values plus
/// keyword weights whose phrase occurs in the prompt (case-insensitive)
pub fn score(profile: &Profile, metadata: &EnhancedMetadata) -> i64 {
    score_with_prompt(profile, metadata, &metadata.prompt.to_lowercase())
}

/// Same as [`score`] with the prompt already lower-cased
pub fn score_with_prompt(profile: &Profile, metadata: &EnhancedMetadata, prompt_lower: &str) -> i64 {
    let field_score: i64 = profile
        .weights
        .fields
        .iter()
        .map(|(field, values)| {
            metadata
                .field_values(field)
                .into_iter()
                .filter_map(|value| values.get(value))
                .sum::<i64>()
        })
        .sum();

    let keyword_score: i64 = profile
        .weights
        .keywords
        .iter()
        .filter(|(phrase, _)| !phrase.is_empty() && prompt_lower.contains(phrase.as_str()))
        .map(|(_, weight)| *weight)
        .sum();

    profile.default_score + field_score + keyword_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptroute_core::{Complexity, ParsedMetadata, Sensitivity};
    use std::collections::BTreeSet;

    fn metadata(prompt: &str) -> EnhancedMetadata {
        ParsedMetadata {
            intent: "brainstorm".to_string(),
            domain: Some("marketing".to_string()),
            topics: BTreeSet::from(["creativity".to_string(), "product".to_string()]),
            sensitivity: Sensitivity::Low,
            complexity: Complexity::Medium,
            prompt_length: prompt.len(),
            word_count: prompt.split_whitespace().count(),
            prompt: prompt.to_string(),
        }
        .into()
    }

    #[test]
    fn test_empty_requirements_match_anything() {
        let profile = Profile::new("open", "x");
        assert!(is_match(&profile, &metadata("anything")));
    }

    #[test]
    fn test_scalar_and_set_requirements() {
        let meta = metadata("ideas");
        let scalar = Profile::new("a", "x").with_required("intent", ["brainstorm", "create"]);
        assert!(is_match(&scalar, &meta));

        let set = Profile::new("b", "x").with_required("topics", ["product", "legal"]);
        assert!(is_match(&set, &meta));

        let miss = Profile::new("c", "x")
            .with_required("intent", ["brainstorm"])
            .with_required("domain", ["legal"]);
        assert!(!is_match(&miss, &meta));
    }

    #[test]
    fn test_unset_or_unknown_field_never_matches() {
        let meta = metadata("ideas");
        let unset = Profile::new("a", "x").with_required("audience", ["developers"]);
        assert!(!is_match(&unset, &meta));
        let unknown = Profile::new("b", "x").with_required("mood", ["happy"]);
        assert!(!is_match(&unknown, &meta));
    }

    #[test]
    fn test_score_sums_fields_and_keywords() {
        let profile = Profile::new("p", "x")
            .with_default_score(1)
            .with_field_weight("intent", "brainstorm", 5)
            .with_field_weight("topics", "creativity", 2)
            .with_field_weight("topics", "product", 3)
            .with_field_weight("domain", "legal", 100)
            .with_keyword("slogan", 4)
            .with_keyword("tagline", 7);
        assert_eq!(score(&profile, &metadata("Write a SLOGAN please")), 1 + 5 + 2 + 3 + 4);
    }
}
