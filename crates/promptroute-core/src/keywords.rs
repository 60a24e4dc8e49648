// ABOUTME: Versioned keyword dictionaries used to classify prompts and profile content
// ABOUTME: Profile-sourced extensions are rebuilt from the built-in base on every reload

use serde::Serialize;
use tracing::debug;

use crate::profile::Profile;

/// One named category and the phrases that vote for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCategory {
    pub name: String,
    pub phrases: Vec<String>,
}

/// Ordered `category -> phrases` table. Declaration order breaks ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTable {
    categories: Vec<KeywordCategory>,
}

impl CategoryTable {
    pub fn from_static(entries: &[(&str, &[&str])]) -> Self {
        let mut table = Self::default();
        for (name, phrases) in entries {
            for phrase in phrases.iter() {
                table.add_phrase(name, phrase);
            }
        }
        table
    }

    /// Add a phrase under `category`, appending the category if it is new.
    /// Returns false when the phrase was already present.
    pub fn add_phrase(&mut self, category: &str, phrase: &str) -> bool {
        let category = category.trim().to_lowercase();
        let phrase = phrase.trim().to_lowercase();
        if category.is_empty() || phrase.is_empty() {
            return false;
        }

        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => {
                if existing.phrases.contains(&phrase) {
                    false
                } else {
                    existing.phrases.push(phrase);
                    true
                }
            }
            None => {
                self.categories.push(KeywordCategory {
                    name: category,
                    phrases: vec![phrase],
                });
                true
            }
        }
    }

    /// Number of phrases of each category contained in `text_lower`
    pub fn hit_counts<'a>(&'a self, text_lower: &str) -> Vec<(&'a str, usize)> {
        self.categories
            .iter()
            .map(|c| {
                let hits = c
                    .phrases
                    .iter()
                    .filter(|p| text_lower.contains(p.as_str()))
                    .count();
                (c.name.as_str(), hits)
            })
            .collect()
    }

    /// Category with the most hits; first declared wins ties; None without hits
    pub fn best_match(&self, text_lower: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (name, hits) in self.hit_counts(text_lower) {
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, best_hits)) if best_hits >= hits => {}
                _ => best = Some((name, hits)),
            }
        }
        best.map(|(name, _)| name)
    }

    /// Every category with at least one hit, in declaration order
    pub fn all_matches(&self, text_lower: &str) -> Vec<&str> {
        self.hit_counts(text_lower)
            .into_iter()
            .filter(|(_, hits)| *hits > 0)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn categories(&self) -> &[KeywordCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&KeywordCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn phrase_count(&self) -> usize {
        self.categories.iter().map(|c| c.phrases.len()).sum()
    }
}

/// A phrase contributing a fixed amount to the sensitivity score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightedPhrase {
    pub phrase: String,
    pub weight: u32,
}

/// All classification dictionaries used by the metadata parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordTables {
    /// Bumped each time the loader rebuilds the tables
    pub version: u64,
    pub intents: CategoryTable,
    pub domains: CategoryTable,
    pub topics: CategoryTable,
    pub sensitivity: Vec<WeightedPhrase>,
    pub reasoning: Vec<String>,
    /// Phrases added from profile weights on top of the built-in set
    pub injected_phrases: usize,
}

const INTENTS: &[(&str, &[&str])] = &[
    (
        "brainstorm",
        &["brainstorm", "ideas", "ideate", "come up with", "creative", "explore options"],
    ),
    (
        "debug",
        &["debug", "error", "fix", "bug", "stack trace", "not working", "crash", "exception"],
    ),
    (
        "review",
        &["review", "feedback on", "critique", "look over", "audit", "proofread"],
    ),
    (
        "summarize",
        &["summarize", "summarise", "summary", "tl;dr", "recap", "condense"],
    ),
    (
        "analyze",
        &["analyze", "analyse", "compare", "evaluate", "assess", "investigate"],
    ),
    (
        "plan",
        &["plan", "roadmap", "strategy", "steps to", "schedule", "milestone"],
    ),
    (
        "translate",
        &["translate", "translation", "in spanish", "in french", "in german"],
    ),
    (
        "create",
        &["write", "create", "generate", "draft", "build", "implement", "compose"],
    ),
    (
        "question",
        &["what is", "what are", "how do", "how does", "how can", "why ", "explain", "?"],
    ),
];

const DOMAINS: &[(&str, &[&str])] = &[
    (
        "software",
        &[
            "code", "function", "api", "compile", "python", "javascript", "rust ", "database",
            "deploy", "repository", "refactor", "unit test",
        ],
    ),
    (
        "marketing",
        &[
            "marketing", "campaign", "brand", "product launch", "advertis", "seo", "audience",
            "go-to-market",
        ],
    ),
    (
        "legal",
        &[
            "contract", "legal", "compliance", "gdpr", "regulation", "liability", "lawsuit",
            "terms of service",
        ],
    ),
    (
        "finance",
        &["budget", "invoice", "revenue", "finance", "tax", "investment", "accounting"],
    ),
    (
        "healthcare",
        &["patient", "medical", "diagnosis", "clinical", "hipaa", "symptom"],
    ),
    (
        "education",
        &["lesson", "student", "teach", "curriculum", "course", "homework"],
    ),
    (
        "writing",
        &["essay", "story", "blog post", "article", "novel", "poem", "storytelling"],
    ),
    (
        "data",
        &["dataset", "spreadsheet", "csv", "statistics", "analytics", "sql"],
    ),
];

const TOPICS: &[(&str, &[&str])] = &[
    ("testing", &["test", "coverage", "assert", "regression"]),
    (
        "security",
        &["security", "vulnerab", "password", "encrypt", "authentication", "exploit"],
    ),
    (
        "performance",
        &["performance", "latency", "optimi", "slow", "throughput", "memory usage"],
    ),
    ("documentation", &["document", "readme", "docs", "docstring"]),
    (
        "creativity",
        &["creative", "brainstorm", "unconventional", "imagin", "storytelling"],
    ),
    ("product", &["product", "launch", "feature", "customer", "roadmap"]),
    ("privacy", &["personal data", "pii", "privacy", "consent"]),
    ("career", &["resume", "interview", "career", "job offer"]),
    (
        "architecture",
        &["architecture", "design pattern", "microservice", "scalab", "system design"],
    ),
];

const SENSITIVITY: &[(&str, u32)] = &[
    ("password", 3),
    ("social security", 3),
    ("ssn", 3),
    ("credit card", 3),
    ("bank account", 3),
    ("api key", 3),
    ("medical record", 3),
    ("passport", 2),
    ("date of birth", 2),
    ("home address", 2),
    ("diagnosis", 2),
    ("confidential", 2),
    ("personal data", 2),
    ("pii", 2),
    ("gdpr", 2),
    ("hipaa", 2),
    ("phone number", 1),
    ("email address", 1),
    ("salary", 1),
    ("private", 1),
];

const REASONING: &[&str] = &[
    "step by step",
    "step-by-step",
    "multi-step",
    "multiple steps",
    "trade-off",
    "tradeoff",
    "pros and cons",
    "reason through",
    "in detail",
    "comprehensive",
    "across multiple",
    "break down",
    "walk me through",
    "end-to-end",
];

impl KeywordTables {
    /// Built-in dictionaries (version 0, no profile extensions)
    pub fn builtin() -> Self {
        Self {
            version: 0,
            intents: CategoryTable::from_static(INTENTS),
            domains: CategoryTable::from_static(DOMAINS),
            topics: CategoryTable::from_static(TOPICS),
            sensitivity: SENSITIVITY
                .iter()
                .map(|(phrase, weight)| WeightedPhrase {
                    phrase: phrase.to_string(),
                    weight: *weight,
                })
                .collect(),
            reasoning: REASONING.iter().map(|p| p.to_string()).collect(),
            injected_phrases: 0,
        }
    }

    /// Build a fresh table set from `base` plus entries sourced from profile
    /// weights: each weighted domain becomes a domain phrase of its own, and
    /// each keyword phrase votes for every domain the profile weights.
    ///
    /// `base` is never modified, so repeated reloads cannot accumulate entries.
    pub fn with_profile_extensions<'a, I>(base: &KeywordTables, profiles: I, version: u64) -> Self
    where
        I: IntoIterator<Item = &'a Profile>,
    {
        let mut tables = base.clone();
        tables.version = version;

        let mut injected = 0usize;
        for profile in profiles {
            let domains: Vec<&str> = profile.weights.domains().collect();
            for domain in &domains {
                if tables.domains.add_phrase(domain, domain) {
                    injected += 1;
                }
                for phrase in profile.weights.keywords.keys() {
                    if tables.domains.add_phrase(domain, phrase) {
                        injected += 1;
                    }
                }
            }
        }
        tables.injected_phrases = base.injected_phrases + injected;

        debug!(
            "Keyword tables v{} built: {} intent, {} domain, {} topic phrases ({} injected)",
            tables.version,
            tables.intents.phrase_count(),
            tables.domains.phrase_count(),
            tables.topics.phrase_count(),
            tables.injected_phrases
        );

        tables
    }

    /// Sum of sensitivity weights for phrases present in `text_lower`
    pub fn sensitivity_score(&self, text_lower: &str) -> u32 {
        self.sensitivity
            .iter()
            .filter(|p| text_lower.contains(p.phrase.as_str()))
            .map(|p| p.weight)
            .sum()
    }

    /// Number of reasoning/multi-step phrases present in `text_lower`
    pub fn reasoning_hits(&self, text_lower: &str) -> usize {
        self.reasoning
            .iter()
            .filter(|p| text_lower.contains(p.as_str()))
            .count()
    }
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_prefers_most_hits_then_declaration_order() {
        let table = CategoryTable::from_static(&[
            ("alpha", &["one", "two"]),
            ("beta", &["two", "three"]),
        ]);
        // alpha: 2 hits, beta: 1 hit
        assert_eq!(table.best_match("one two"), Some("alpha"));
        // both: 1 hit -> first declared wins
        assert_eq!(table.best_match("two"), Some("alpha"));
        assert_eq!(table.best_match("three"), Some("beta"));
        assert_eq!(table.best_match("nothing"), None);
    }

    #[test]
    fn test_add_phrase_dedups() {
        let mut table = CategoryTable::default();
        assert!(table.add_phrase("Domain", "Phrase"));
        assert!(!table.add_phrase("domain", "phrase"));
        assert!(!table.add_phrase("", "x"));
        assert_eq!(table.phrase_count(), 1);
        assert_eq!(table.category("domain").unwrap().phrases, vec!["phrase"]);
    }

    #[test]
    fn test_extensions_do_not_accumulate() {
        let base = KeywordTables::builtin();
        let profile = Profile::new("quant_research", "Analyze markets.")
            .with_field_weight("domain", "quant", 3)
            .with_keyword("alpha decay", 2);

        let first = KeywordTables::with_profile_extensions(&base, [&profile], 1);
        let second = KeywordTables::with_profile_extensions(&base, [&profile], 2);

        assert_eq!(first.injected_phrases, 2);
        assert_eq!(second.injected_phrases, 2);
        assert_eq!(first.domains.phrase_count(), second.domains.phrase_count());
        assert_eq!(second.version, 2);
        assert_eq!(
            second.domains.category("quant").unwrap().phrases,
            vec!["quant", "alpha decay"]
        );
        // base stays pristine
        assert!(base.domains.category("quant").is_none());
    }

    #[test]
    fn test_sensitivity_score_accumulates() {
        let tables = KeywordTables::builtin();
        assert_eq!(tables.sensitivity_score("hello world"), 0);
        assert_eq!(tables.sensitivity_score("my phone number"), 1);
        assert_eq!(
            tables.sensitivity_score("my password and credit card number"),
            6
        );
    }
}
