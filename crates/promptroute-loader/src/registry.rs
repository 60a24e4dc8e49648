// ABOUTME: Metadata registry derived from the loaded profile set on every reload
// ABOUTME: Infers capabilities and domains from profile content and persists as pretty JSON

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use promptroute_core::{CategoryTable, ComplexityTier, Profile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Schema version written into every registry file
pub const REGISTRY_SCHEMA_VERSION: &str = "1.0";

static CAPABILITIES: Lazy<CategoryTable> = Lazy::new(|| {
    CategoryTable::from_static(&[
        (
            "brainstorming",
            &["brainstorm", "ideas", "ideation", "divergent"],
        ),
        (
            "creative_writing",
            &["story", "storytelling", "narrative", "poem", "creative writing", "slogan"],
        ),
        (
            "code_review",
            &["code review", "review the code", "pull request", "diff", "readability"],
        ),
        (
            "debugging",
            &["debug", "stack trace", "root cause", "reproduce", "bug"],
        ),
        (
            "testing",
            &["unit test", "test case", "coverage", "regression", "assert"],
        ),
        (
            "summarization",
            &["summarize", "summary", "tl;dr", "key points", "condense"],
        ),
        (
            "planning",
            &["plan", "roadmap", "milestone", "timeline", "prioritize"],
        ),
        (
            "analysis",
            &["analyze", "analysis", "compare", "evaluate", "trade-off", "tradeoff"],
        ),
        (
            "compliance",
            &["compliance", "regulation", "gdpr", "hipaa", "policy", "audit"],
        ),
        (
            "privacy",
            &["privacy", "pii", "personal data", "redact", "anonymize"],
        ),
        (
            "teaching",
            &["explain", "teach", "lesson", "beginner", "step by step"],
        ),
        (
            "research",
            &["research", "sources", "citation", "literature", "evidence"],
        ),
    ])
});

static DOMAINS: Lazy<CategoryTable> = Lazy::new(|| {
    CategoryTable::from_static(&[
        (
            "software",
            &["code", "software", "api", "function", "repository", "programming"],
        ),
        (
            "marketing",
            &["marketing", "campaign", "brand", "audience", "slogan"],
        ),
        (
            "legal",
            &["legal", "contract", "law", "regulation", "liability"],
        ),
        (
            "finance",
            &["finance", "budget", "revenue", "invoice", "investment"],
        ),
        (
            "healthcare",
            &["health", "medical", "patient", "clinical", "hipaa"],
        ),
        (
            "education",
            &["student", "lesson", "curriculum", "teach", "course"],
        ),
        (
            "writing",
            &["essay", "article", "blog", "story", "prose"],
        ),
        (
            "data",
            &["dataset", "sql", "data pipeline", "statistics", "spreadsheet"],
        ),
    ])
});

/// Derived, read-only description of one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRegistryEntry {
    pub name: String,
    pub short_description: String,
    pub capabilities: Vec<String>,
    pub domains: Vec<String>,
    pub complexity_tier: ComplexityTier,
    pub extends: Option<String>,
    pub checklist_count: usize,
    pub instructions_length: usize,
    pub is_fallback: bool,
    pub source_file: String,
}

impl MetadataRegistryEntry {
    pub fn from_profile(profile: &Profile) -> Self {
        let mut corpus = profile.instructions.to_lowercase();
        for item in &profile.checklist {
            corpus.push('\n');
            corpus.push_str(&item.to_lowercase());
        }

        Self {
            name: profile.name.clone(),
            short_description: profile.short_description(),
            capabilities: owned(CAPABILITIES.all_matches(&corpus)),
            domains: owned(DOMAINS.all_matches(&corpus)),
            complexity_tier: profile.complexity_tier,
            extends: profile.extends.clone(),
            checklist_count: profile.checklist.len(),
            instructions_length: profile.instructions.chars().count(),
            is_fallback: profile.is_fallback,
            source_file: profile.source_file.clone(),
        }
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

/// Aggregate statistics over all registry entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub total_profiles: usize,
    pub tiers: BTreeMap<String, usize>,
    pub fallback_profiles: usize,
    pub profiles_with_extends: usize,
    pub capabilities: BTreeSet<String>,
    pub domains: BTreeSet<String>,
    pub total_checklist_items: usize,
}

/// Queryable catalogue of the currently loaded profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRegistry {
    pub version: String,
    pub generation: u64,
    pub generated_at: DateTime<Utc>,
    pub entries: BTreeMap<String, MetadataRegistryEntry>,
    pub summary: RegistrySummary,
}

impl MetadataRegistry {
    /// Registry with no entries, used before the first successful reload
    pub fn empty() -> Self {
        Self {
            version: REGISTRY_SCHEMA_VERSION.to_string(),
            generation: 0,
            generated_at: Utc::now(),
            entries: BTreeMap::new(),
            summary: RegistrySummary::default(),
        }
    }

    /// Build a fresh registry from scratch. Never patched incrementally.
    pub fn rebuild(generation: u64, profiles: &[Arc<Profile>]) -> Self {
        let entries: BTreeMap<String, MetadataRegistryEntry> = profiles
            .iter()
            .map(|p| (p.name.clone(), MetadataRegistryEntry::from_profile(p)))
            .collect();

        let mut summary = RegistrySummary {
            total_profiles: entries.len(),
            ..Default::default()
        };
        for entry in entries.values() {
            *summary
                .tiers
                .entry(entry.complexity_tier.as_str().to_string())
                .or_insert(0) += 1;
            if entry.is_fallback {
                summary.fallback_profiles += 1;
            }
            if entry.extends.is_some() {
                summary.profiles_with_extends += 1;
            }
            summary.capabilities.extend(entry.capabilities.iter().cloned());
            summary.domains.extend(entry.domains.iter().cloned());
            summary.total_checklist_items += entry.checklist_count;
        }

        debug!(
            "Rebuilt registry generation {}: {} entries, {} capabilities, {} domains",
            generation,
            summary.total_profiles,
            summary.capabilities.len(),
            summary.domains.len()
        );

        Self {
            version: REGISTRY_SCHEMA_VERSION.to_string(),
            generation,
            generated_at: Utc::now(),
            entries,
            summary,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetadataRegistryEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries declaring `capability` (case-insensitive), sorted by name
    pub fn find_by_capability(&self, capability: &str) -> Vec<&MetadataRegistryEntry> {
        let wanted = capability.trim().to_lowercase();
        self.entries
            .values()
            .filter(|e| e.capabilities.iter().any(|c| *c == wanted))
            .collect()
    }

    /// Entries associated with `domain` (case-insensitive), sorted by name
    pub fn find_by_domain(&self, domain: &str) -> Vec<&MetadataRegistryEntry> {
        let wanted = domain.trim().to_lowercase();
        self.entries
            .values()
            .filter(|e| e.domains.iter().any(|d| *d == wanted))
            .collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the registry to `path` via a sibling temp file and rename
    pub fn persist(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = self.to_json_pretty().map_err(std::io::Error::other)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "registry.json".to_string());
        let tmp = path.with_file_name(format!(".{}.tmp", file_name));

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
