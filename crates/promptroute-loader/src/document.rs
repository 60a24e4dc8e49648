// ABOUTME: Parses one markdown profile document (YAML front matter + sections) into a Profile
// ABOUTME: Extracts the verbatim Instructions section and task-list checklist items

use once_cell::sync::Lazy;
use promptroute_core::{ComplexityTier, Profile, Weights};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::DocumentError;

/// Heading text of the mandatory instructions section (case-sensitive)
pub const INSTRUCTIONS_SECTION: &str = "Instructions";

static CHECKLIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*+]\s+\[[ xX]\]\s+(?P<item>.*?)\s*$").expect("checklist regex is valid")
});

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_set(self) -> BTreeSet<String> {
        let values = match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        };
        values
            .into_iter()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// YAML front-matter schema of a profile document
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    name: Option<String>,
    description: Option<String>,
    extends: Option<String>,
    #[serde(alias = "is_fallback")]
    fallback: bool,
    default_score: i64,
    complexity_tier: Option<String>,
    required_fields: BTreeMap<String, OneOrMany>,
    weights: BTreeMap<String, BTreeMap<String, i64>>,
}

/// Split a document into (front matter YAML, markdown body)
pub fn split_front_matter(content: &str) -> Result<(&str, &str), DocumentError> {
    let content = content.trim_start_matches('\u{feff}');

    let mut lines = content.split_inclusive('\n');
    let first = lines.next().ok_or(DocumentError::MissingFrontMatter)?;
    if first.trim_end() != "---" {
        return Err(DocumentError::MissingFrontMatter);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(DocumentError::UnterminatedFrontMatter)
}

/// Parse a markdown heading line into (level, text)
fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim_end()))
}

/// Body of the section whose heading text equals `title`, up to the next
/// heading of the same or a higher level. Headings inside code fences are ignored.
pub fn extract_section(body: &str, title: &str) -> Option<String> {
    let mut in_fence = false;
    let mut capture: Option<(usize, Vec<&str>)> = None;

    for line in body.lines() {
        let fence = line.trim_start().starts_with("```") || line.trim_start().starts_with("~~~");
        if !in_fence && !fence {
            if let Some((level, text)) = heading(line) {
                match capture.as_ref().map(|(section_level, _)| *section_level) {
                    Some(section_level) if level <= section_level => break,
                    None if text == title => {
                        capture = Some((level, Vec::new()));
                        continue;
                    }
                    _ => {}
                }
            }
        }
        if fence {
            in_fence = !in_fence;
        }
        if let Some((_, lines)) = capture.as_mut() {
            lines.push(line);
        }
    }

    capture.map(|(_, lines)| lines.join("\n").trim().to_string())
}

/// Every task-list item (`- [ ]`, `- [x]`, optionally indented) in document order
pub fn extract_checklist(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| CHECKLIST_ITEM.captures(line))
        .filter_map(|caps| caps.name("item").map(|m| m.as_str().to_string()))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse a complete profile document.
///
/// `file_name` names the profile when the front matter has no `name`; the
/// complex suffix drives tier inference when no explicit marker is given.
pub fn parse_document(
    file_name: &str,
    content: &str,
    complex_suffix: &str,
) -> Result<Profile, DocumentError> {
    let (yaml, body) = split_front_matter(content)?;

    let front: FrontMatter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| DocumentError::Yaml(e.to_string()))?
    };

    let name = match front.name {
        Some(name) => name.trim().to_string(),
        None => Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_default(),
    };
    if name.is_empty() {
        return Err(DocumentError::EmptyName);
    }

    let instructions = extract_section(body, INSTRUCTIONS_SECTION)
        .ok_or_else(|| DocumentError::MissingSection(INSTRUCTIONS_SECTION.to_string()))?;
    if instructions.is_empty() {
        return Err(DocumentError::EmptySection(INSTRUCTIONS_SECTION.to_string()));
    }

    let complexity_tier = match front.complexity_tier.as_deref() {
        Some(marker) => ComplexityTier::parse(marker)
            .ok_or_else(|| DocumentError::InvalidTier(marker.to_string()))?,
        None => ComplexityTier::from_name(&name, complex_suffix),
    };

    let required_fields = front
        .required_fields
        .into_iter()
        .map(|(field, values)| (field.trim().to_lowercase(), values.into_set()))
        .filter(|(field, _)| !field.is_empty())
        .collect();

    let weights = Weights::from_raw(front.weights);
    let declared_keywords = weights.keywords.clone();

    Ok(Profile {
        name,
        description: front.description.unwrap_or_default().trim().to_string(),
        required_fields,
        weights,
        declared_keywords,
        default_score: front.default_score,
        is_fallback: front.fallback,
        extends: front
            .extends
            .map(|parent| parent.trim().to_string())
            .filter(|parent| !parent.is_empty()),
        complexity_tier,
        instructions,
        checklist: extract_checklist(body),
        source_file: file_name.to_string(),
        load_order: 0,
    })
}
