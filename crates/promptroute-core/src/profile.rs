// ABOUTME: Immutable instruction profile model with required-field gating and weights
// ABOUTME: Profiles are built by the loader once per reload and shared behind Arc afterwards

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Default naming suffix that marks the complex variant of a base profile
pub const DEFAULT_COMPLEX_SUFFIX: &str = "_complex";

/// Base vs. complex paired variant of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    #[default]
    Base,
    Complex,
}

impl ComplexityTier {
    /// Infer the tier from the naming convention
    pub fn from_name(name: &str, complex_suffix: &str) -> Self {
        if !complex_suffix.is_empty() && name.ends_with(complex_suffix) {
            ComplexityTier::Complex
        } else {
            ComplexityTier::Base
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "base" | "simple" => Some(Self::Base),
            "complex" => Some(Self::Complex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring weights of a profile.
///
/// `fields` maps a metadata field to per-value weights; `keywords` maps a raw
/// prompt phrase to a weight. All keys are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default)]
    pub fields: BTreeMap<String, BTreeMap<String, i64>>,
    #[serde(default)]
    pub keywords: BTreeMap<String, i64>,
}

impl Weights {
    /// Name of the pseudo-field holding prompt keyword weights
    pub const KEYWORDS: &'static str = "keywords";

    /// Split a raw `field -> value -> weight` map into field and keyword weights
    pub fn from_raw(raw: BTreeMap<String, BTreeMap<String, i64>>) -> Self {
        let mut weights = Weights::default();
        for (field, values) in raw {
            let field = field.trim().to_lowercase();
            let values: BTreeMap<String, i64> = values
                .into_iter()
                .map(|(value, w)| (value.trim().to_lowercase(), w))
                .filter(|(value, _)| !value.is_empty())
                .collect();
            if field == Self::KEYWORDS {
                weights.keywords.extend(values);
            } else if !field.is_empty() {
                weights.fields.entry(field).or_default().extend(values);
            }
        }
        weights
    }

    pub fn field(&self, field: &str) -> Option<&BTreeMap<String, i64>> {
        self.fields.get(field)
    }

    pub fn weight(&self, field: &str, value: &str) -> Option<i64> {
        self.fields.get(field).and_then(|values| values.get(value)).copied()
    }

    /// Domains this profile puts weight on
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("domain")
            .into_iter()
            .flat_map(|values| values.keys().map(|k| k.as_str()))
    }
}

/// One routable instruction profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// field -> acceptable values; empty map matches everything
    #[serde(default)]
    pub required_fields: BTreeMap<String, BTreeSet<String>>,
    /// Field weights plus the resolved (inherited + own) keyword weights
    #[serde(default)]
    pub weights: Weights,
    /// Keyword weights declared by this profile's own document
    #[serde(default)]
    pub declared_keywords: BTreeMap<String, i64>,
    #[serde(default)]
    pub default_score: i64,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub complexity_tier: ComplexityTier,
    pub instructions: String,
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub load_order: usize,
}

impl Profile {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        let name = name.into();
        let complexity_tier = ComplexityTier::from_name(&name, DEFAULT_COMPLEX_SUFFIX);
        Self {
            source_file: format!("{}.md", name),
            name,
            description: String::new(),
            required_fields: BTreeMap::new(),
            weights: Weights::default(),
            declared_keywords: BTreeMap::new(),
            default_score: 0,
            is_fallback: false,
            extends: None,
            complexity_tier,
            instructions: instructions.into(),
            checklist: Vec::new(),
            load_order: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self
            .required_fields
            .entry(field.trim().to_lowercase())
            .or_default();
        entry.extend(values.into_iter().map(|v| v.as_ref().trim().to_lowercase()));
        self
    }

    pub fn with_field_weight(mut self, field: &str, value: &str, weight: i64) -> Self {
        self.weights
            .fields
            .entry(field.trim().to_lowercase())
            .or_default()
            .insert(value.trim().to_lowercase(), weight);
        self
    }

    pub fn with_keyword(mut self, phrase: &str, weight: i64) -> Self {
        let phrase = phrase.trim().to_lowercase();
        self.weights.keywords.insert(phrase.clone(), weight);
        self.declared_keywords.insert(phrase, weight);
        self
    }

    pub fn with_default_score(mut self, score: i64) -> Self {
        self.default_score = score;
        self
    }

    pub fn as_fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn with_tier(mut self, tier: ComplexityTier) -> Self {
        self.complexity_tier = tier;
        self
    }

    pub fn with_checklist<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checklist = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_load_order(mut self, order: usize) -> Self {
        self.load_order = order;
        self
    }

    pub fn is_complex(&self) -> bool {
        self.complexity_tier == ComplexityTier::Complex
    }

    /// Name of the complex variant paired with this (base) profile
    pub fn complex_variant_name(&self, complex_suffix: &str) -> String {
        format!("{}{}", self.name, complex_suffix)
    }

    /// Name of the base profile paired with this (complex) profile, if the
    /// naming convention allows deriving one
    pub fn base_variant_name(&self, complex_suffix: &str) -> Option<&str> {
        if complex_suffix.is_empty() {
            return None;
        }
        self.name
            .strip_suffix(complex_suffix)
            .filter(|base| !base.is_empty())
    }

    /// Short description, falling back to the first non-empty instruction line
    pub fn short_description(&self) -> String {
        if !self.description.trim().is_empty() {
            return self.description.trim().to_string();
        }
        self.instructions
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.chars().take(160).collect())
            .unwrap_or_default()
    }
}
