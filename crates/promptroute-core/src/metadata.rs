// ABOUTME: Structured classification of a prompt plus caller-supplied overrides
// ABOUTME: EnhancedMetadata is the only input the routing engine reads besides profiles

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PromptRouteError;

/// Ordered sensitivity level: low < medium < high < critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Sensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Sensitivity {
    type Err = PromptRouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(PromptRouteError::Parse(format!(
                "unknown sensitivity level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered complexity level: low < medium < high
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Raise by `levels`, saturating at `High`
    pub fn bumped(self, levels: usize) -> Self {
        let rank = match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        };
        match (rank + levels).min(2) {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl FromStr for Complexity {
    type Err = PromptRouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PromptRouteError::Parse(format!(
                "unknown complexity level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of analyzing one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMetadata {
    pub intent: String,
    pub domain: Option<String>,
    pub topics: BTreeSet<String>,
    pub sensitivity: Sensitivity,
    pub complexity: Complexity,
    /// Prompt length in characters
    pub prompt_length: usize,
    pub word_count: usize,
    /// Raw prompt text, used for keyword scoring
    #[serde(skip_serializing)]
    #[serde(default)]
    pub prompt: String,
}

/// Caller-supplied metadata hints. Every set field replaces the parsed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOverrides {
    pub intent: Option<String>,
    pub domain: Option<String>,
    pub topics: Option<Vec<String>>,
    pub sensitivity: Option<Sensitivity>,
    pub complexity: Option<Complexity>,
    pub priority: Option<String>,
    pub audience: Option<String>,
    pub language: Option<String>,
    #[serde(alias = "contextTags", alias = "tags")]
    pub context_tags: Option<Vec<String>>,
}

impl MetadataOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parsed metadata merged with caller overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedMetadata {
    pub intent: String,
    pub domain: Option<String>,
    pub topics: BTreeSet<String>,
    pub sensitivity: Sensitivity,
    pub complexity: Complexity,
    pub prompt_length: usize,
    pub word_count: usize,
    pub priority: Option<String>,
    pub audience: Option<String>,
    pub language: Option<String>,
    pub context_tags: BTreeSet<String>,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub prompt: String,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalize_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| normalize(v))
        .filter(|v| !v.is_empty())
        .collect()
}

impl ParsedMetadata {
    /// Shallow field-by-field merge; unset override fields fall through
    pub fn to_enhanced(&self, overrides: &MetadataOverrides) -> EnhancedMetadata {
        EnhancedMetadata {
            intent: overrides
                .intent
                .as_deref()
                .map(normalize)
                .unwrap_or_else(|| self.intent.clone()),
            domain: overrides
                .domain
                .as_deref()
                .map(normalize)
                .or_else(|| self.domain.clone()),
            topics: overrides
                .topics
                .as_deref()
                .map(normalize_set)
                .unwrap_or_else(|| self.topics.clone()),
            sensitivity: overrides.sensitivity.unwrap_or(self.sensitivity),
            complexity: overrides.complexity.unwrap_or(self.complexity),
            prompt_length: self.prompt_length,
            word_count: self.word_count,
            priority: overrides.priority.as_deref().map(normalize),
            audience: overrides.audience.as_deref().map(normalize),
            language: overrides.language.as_deref().map(normalize),
            context_tags: overrides
                .context_tags
                .as_deref()
                .map(normalize_set)
                .unwrap_or_default(),
            prompt: self.prompt.clone(),
        }
    }
}

impl From<ParsedMetadata> for EnhancedMetadata {
    fn from(parsed: ParsedMetadata) -> Self {
        parsed.to_enhanced(&MetadataOverrides::default())
    }
}

impl EnhancedMetadata {
    /// Values of a named metadata field; unknown or unset fields yield nothing
    pub fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "intent" => vec![self.intent.as_str()],
            "domain" => self.domain.as_deref().into_iter().collect(),
            "topics" | "topic" => self.topics.iter().map(String::as_str).collect(),
            "sensitivity" => vec![self.sensitivity.as_str()],
            "complexity" => vec![self.complexity.as_str()],
            "priority" => self.priority.as_deref().into_iter().collect(),
            "audience" => self.audience.as_deref().into_iter().collect(),
            "language" => self.language.as_deref().into_iter().collect(),
            "context_tags" | "contexttags" | "tags" => {
                self.context_tags.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed() -> ParsedMetadata {
        ParsedMetadata {
            intent: "question".to_string(),
            domain: Some("software".to_string()),
            topics: BTreeSet::from(["testing".to_string()]),
            sensitivity: Sensitivity::Low,
            complexity: Complexity::Medium,
            prompt_length: 42,
            word_count: 8,
            prompt: "How do I write a unit test for this parser?".to_string(),
        }
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(Sensitivity::Low < Sensitivity::Medium);
        assert!(Sensitivity::High < Sensitivity::Critical);
        assert!(Complexity::Low < Complexity::High);
        assert_eq!(Complexity::Low.bumped(1), Complexity::Medium);
        assert_eq!(Complexity::Medium.bumped(5), Complexity::High);
    }

    #[test]
    fn test_to_enhanced_without_overrides_keeps_parsed_values() {
        let enhanced = parsed().to_enhanced(&MetadataOverrides::default());
        assert_eq!(enhanced.intent, "question");
        assert_eq!(enhanced.domain.as_deref(), Some("software"));
        assert!(enhanced.priority.is_none());
        assert!(enhanced.context_tags.is_empty());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = MetadataOverrides {
            intent: Some("Brainstorm".to_string()),
            sensitivity: Some(Sensitivity::High),
            priority: Some("urgent".to_string()),
            context_tags: Some(vec!["Launch".to_string(), " ".to_string()]),
            ..Default::default()
        };
        let enhanced = parsed().to_enhanced(&overrides);
        assert_eq!(enhanced.intent, "brainstorm");
        assert_eq!(enhanced.sensitivity, Sensitivity::High);
        assert_eq!(enhanced.complexity, Complexity::Medium);
        assert_eq!(enhanced.priority.as_deref(), Some("urgent"));
        assert_eq!(enhanced.context_tags, BTreeSet::from(["launch".to_string()]));
    }

    #[test]
    fn test_field_values() {
        let enhanced: EnhancedMetadata = parsed().into();
        assert_eq!(enhanced.field_values("intent"), vec!["question"]);
        assert_eq!(enhanced.field_values("topics"), vec!["testing"]);
        assert_eq!(enhanced.field_values("complexity"), vec!["medium"]);
        assert!(enhanced.field_values("audience").is_empty());
        assert!(enhanced.field_values("nonexistent").is_empty());
    }

    #[test]
    fn test_overrides_deserialize_from_json() {
        let overrides: MetadataOverrides = serde_json::from_str(
            r#"{"intent": "review", "contextTags": ["pr"], "sensitivity": "critical"}"#,
        )
        .unwrap();
        assert_eq!(overrides.intent.as_deref(), Some("review"));
        assert_eq!(overrides.context_tags, Some(vec!["pr".to_string()]));
        assert_eq!(overrides.sensitivity, Some(Sensitivity::Critical));
        assert!(!overrides.is_empty());
    }
}
