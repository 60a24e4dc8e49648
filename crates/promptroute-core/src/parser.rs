// ABOUTME: Deterministic prompt classifier built on case-insensitive substring matching
// ABOUTME: Produces intent, domain, topics, sensitivity and complexity for routing

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config_manager::ParserConfig;
use crate::keywords::KeywordTables;
use crate::metadata::{Complexity, ParsedMetadata};

/// Intent assigned when no intent phrase matches
pub const DEFAULT_INTENT: &str = "statement";

/// Turns raw prompts into `ParsedMetadata` using a fixed set of keyword tables
#[derive(Debug, Clone)]
pub struct MetadataParser {
    tables: Arc<KeywordTables>,
    config: ParserConfig,
}

impl MetadataParser {
    pub fn new(tables: Arc<KeywordTables>, config: ParserConfig) -> Self {
        Self { tables, config }
    }

    /// Parser over the built-in dictionaries with default thresholds
    pub fn with_builtin_tables() -> Self {
        Self::new(Arc::new(KeywordTables::builtin()), ParserConfig::default())
    }

    pub fn tables(&self) -> &KeywordTables {
        &self.tables
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Classify a prompt. Pure: the same prompt and tables always give the same result.
    #[instrument(skip(self, prompt), fields(tables_version = self.tables.version))]
    pub fn analyze(&self, prompt: &str) -> ParsedMetadata {
        let lower = prompt.to_lowercase();
        let word_count = prompt.split_whitespace().count();

        let intent = self
            .tables
            .intents
            .best_match(&lower)
            .unwrap_or(DEFAULT_INTENT)
            .to_string();
        let domain = self.tables.domains.best_match(&lower).map(str::to_string);
        let topics: BTreeSet<String> = self
            .tables
            .topics
            .all_matches(&lower)
            .into_iter()
            .map(str::to_string)
            .collect();

        let sensitivity_score = self.tables.sensitivity_score(&lower);
        let sensitivity = self.config.sensitivity_bands.level(sensitivity_score);
        let complexity = self.classify_complexity(word_count, &lower);

        debug!(
            "Analyzed prompt: intent={}, domain={:?}, topics={:?}, sensitivity={} (score {}), complexity={}, words={}",
            intent, domain, topics, sensitivity, sensitivity_score, complexity, word_count
        );

        ParsedMetadata {
            intent,
            domain,
            topics,
            sensitivity,
            complexity,
            prompt_length: prompt.chars().count(),
            word_count,
            prompt: prompt.to_string(),
        }
    }

    fn classify_complexity(&self, word_count: usize, lower: &str) -> Complexity {
        let base = if word_count >= self.config.complex_word_threshold {
            Complexity::High
        } else if word_count >= self.config.medium_word_threshold {
            Complexity::Medium
        } else {
            Complexity::Low
        };

        let hits = self.tables.reasoning_hits(lower);
        let boost = if hits == 0 {
            0
        } else if hits >= self.config.reasoning_double_boost_hits {
            2
        } else {
            1
        };

        base.bumped(boost)
    }
}

impl Default for MetadataParser {
    fn default() -> Self {
        Self::with_builtin_tables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Sensitivity;

    #[test]
    fn test_empty_prompt_gets_defaults() {
        let parser = MetadataParser::default();
        let parsed = parser.analyze("");
        assert_eq!(parsed.intent, DEFAULT_INTENT);
        assert!(parsed.domain.is_none());
        assert!(parsed.topics.is_empty());
        assert_eq!(parsed.sensitivity, Sensitivity::Low);
        assert_eq!(parsed.complexity, Complexity::Low);
        assert_eq!(parsed.word_count, 0);
    }

    #[test]
    fn test_intent_and_domain_detection() {
        let parser = MetadataParser::default();
        let parsed = parser.analyze("Help me BRAINSTORM creative ideas for our marketing campaign");
        assert_eq!(parsed.intent, "brainstorm");
        assert_eq!(parsed.domain.as_deref(), Some("marketing"));
        assert!(parsed.topics.contains("creativity"));
    }

    #[test]
    fn test_topics_are_multi_label() {
        let parser = MetadataParser::default();
        let parsed = parser.analyze("improve test coverage and reduce latency of the login flow");
        assert!(parsed.topics.contains("testing"));
        assert!(parsed.topics.contains("performance"));
    }

    #[test]
    fn test_sensitivity_levels() {
        let parser = MetadataParser::default();
        assert_eq!(
            parser.analyze("what is my phone number").sensitivity,
            Sensitivity::Medium
        );
        assert_eq!(
            parser.analyze("store the user password").sensitivity,
            Sensitivity::High
        );
        assert_eq!(
            parser
                .analyze("leaked password, ssn and credit card data")
                .sensitivity,
            Sensitivity::Critical
        );
    }

    #[test]
    fn test_complexity_from_word_count() {
        let parser = MetadataParser::default();
        let long_prompt = vec!["word"; 60].join(" ");
        assert_eq!(parser.analyze(&long_prompt).complexity, Complexity::High);

        let medium_prompt = vec!["word"; 30].join(" ");
        assert_eq!(parser.analyze(&medium_prompt).complexity, Complexity::Medium);

        assert_eq!(parser.analyze("short one").complexity, Complexity::Low);
    }

    #[test]
    fn test_reasoning_phrases_boost_complexity() {
        let parser = MetadataParser::default();
        assert_eq!(
            parser.analyze("walk me through it").complexity,
            Complexity::Medium
        );
        assert_eq!(
            parser
                .analyze("walk me through a step by step, comprehensive plan")
                .complexity,
            Complexity::High
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let config = ParserConfig {
            complex_word_threshold: 3,
            medium_word_threshold: 2,
            ..Default::default()
        };
        let parser = MetadataParser::new(Arc::new(KeywordTables::builtin()), config);
        assert_eq!(parser.analyze("one two three").complexity, Complexity::High);
    }
}
