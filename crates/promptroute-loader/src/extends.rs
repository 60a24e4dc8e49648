// ABOUTME: Resolves profile `extends` chains as an explicit parent graph
// ABOUTME: Detects cycles, orders parents before children and merges keyword weights

use promptroute_core::Profile;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::error::ExtendsError;

/// Outcome of resolving a parsed profile set
#[derive(Debug, Default)]
pub struct ExtendsResolution {
    /// Successfully resolved profiles, in their original (load) order
    pub profiles: Vec<Profile>,
    /// Failures as (source file, error), in load order
    pub failures: Vec<(String, ExtendsError)>,
}

/// Resolve inheritance for a set of uniquely named profiles.
///
/// A child's resolved keywords are its parent's resolved keywords overlaid
/// with the child's own declared keywords (child wins). Missing parents,
/// self references and cycles fail the affected profile and every profile
/// below it; unrelated profiles are unaffected.
pub fn resolve_extends(profiles: Vec<Profile>) -> ExtendsResolution {
    let index: HashMap<&str, usize> = profiles
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    let parent_of: Vec<Option<usize>> = profiles
        .iter()
        .map(|p| p.extends.as_deref().and_then(|parent| index.get(parent).copied()))
        .collect();

    // Direct failures: self reference, missing parent, cycle membership
    let mut direct: HashMap<usize, ExtendsError> = HashMap::new();
    for (i, profile) in profiles.iter().enumerate() {
        match profile.extends.as_deref() {
            Some(parent) if parent == profile.name => {
                direct.insert(
                    i,
                    ExtendsError::SelfReference {
                        profile: profile.name.clone(),
                    },
                );
            }
            Some(parent) if parent_of[i].is_none() => {
                direct.insert(
                    i,
                    ExtendsError::MissingParent {
                        profile: profile.name.clone(),
                        parent: parent.to_string(),
                    },
                );
            }
            _ => {}
        }
    }
    for cycle in detect_cycles(&parent_of, &direct) {
        let chain: Vec<String> = cycle
            .iter()
            .chain(cycle.first())
            .map(|&i| profiles[i].name.clone())
            .collect();
        for &member in &cycle {
            direct.insert(
                member,
                ExtendsError::Cycle {
                    chain: chain.clone(),
                },
            );
        }
    }

    // Kahn's algorithm over parent -> child edges among healthy profiles
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); profiles.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for i in 0..profiles.len() {
        if direct.contains_key(&i) {
            continue;
        }
        match parent_of[i] {
            Some(parent) => children[parent].push(i),
            None => queue.push_back(i),
        }
    }

    let mut resolved: HashMap<usize, BTreeMap<String, i64>> = HashMap::new();
    while let Some(i) = queue.pop_front() {
        let mut keywords = match parent_of[i] {
            Some(parent) => resolved.get(&parent).cloned().unwrap_or_default(),
            None => BTreeMap::new(),
        };
        keywords.extend(
            profiles[i]
                .declared_keywords
                .iter()
                .map(|(k, w)| (k.clone(), *w)),
        );
        if let Some(parent) = parent_of[i] {
            debug!(
                "Resolved '{}' extends '{}': {} keywords",
                profiles[i].name,
                profiles[parent].name,
                keywords.len()
            );
        }
        resolved.insert(i, keywords);
        for &child in &children[i] {
            if !direct.contains_key(&child) {
                queue.push_back(child);
            }
        }
    }

    let ancestors: HashMap<usize, String> = (0..profiles.len())
        .filter(|i| !resolved.contains_key(i) && !direct.contains_key(i))
        .filter_map(|i| {
            broken_ancestor(i, &parent_of, &direct).map(|a| (i, profiles[a].name.clone()))
        })
        .collect();

    let mut outcome = ExtendsResolution::default();
    for (i, mut profile) in profiles.into_iter().enumerate() {
        if let Some(keywords) = resolved.remove(&i) {
            profile.weights.keywords = keywords;
            outcome.profiles.push(profile);
            continue;
        }

        let error = match direct.remove(&i) {
            Some(error) => error,
            None => ExtendsError::BrokenAncestor {
                ancestor: ancestors
                    .get(&i)
                    .cloned()
                    .or_else(|| profile.extends.clone())
                    .unwrap_or_default(),
                profile: profile.name.clone(),
            },
        };
        warn!("Profile {} rejected: {}", profile.source_file, error);
        outcome.failures.push((profile.source_file, error));
    }

    outcome
}

/// Nodes (by index) lying on a cycle of the parent graph, one Vec per cycle
fn detect_cycles(
    parent_of: &[Option<usize>],
    direct: &HashMap<usize, ExtendsError>,
) -> Vec<Vec<usize>> {
    // 0 = unvisited, 1 = on current walk, 2 = done
    let mut state = vec![0u8; parent_of.len()];
    let mut cycles = Vec::new();

    for start in 0..parent_of.len() {
        if state[start] != 0 {
            continue;
        }
        let mut path: Vec<usize> = Vec::new();
        let mut on_path: HashSet<usize> = HashSet::new();
        let mut node = Some(start);

        while let Some(current) = node {
            if on_path.contains(&current) {
                let pos = path.iter().position(|&n| n == current).unwrap_or(0);
                cycles.push(path[pos..].to_vec());
                break;
            }
            if state[current] != 0 || direct.contains_key(&current) {
                break;
            }
            state[current] = 1;
            on_path.insert(current);
            path.push(current);
            node = parent_of[current];
        }

        for n in path {
            state[n] = 2;
        }
    }

    cycles
}

/// Nearest ancestor of `start` that failed directly
fn broken_ancestor(
    start: usize,
    parent_of: &[Option<usize>],
    direct: &HashMap<usize, ExtendsError>,
) -> Option<usize> {
    let mut current = parent_of[start];
    for _ in 0..parent_of.len() {
        let node = current?;
        if direct.contains_key(&node) {
            return Some(node);
        }
        current = parent_of[node];
    }
    None
}
