// ABOUTME: Immutable profile snapshot published atomically after each reload of a readable directory
// ABOUTME: Readers load an Arc from an ArcSwap without locking; reloads store a new one

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use promptroute_core::{KeywordTables, Profile};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::registry::MetadataRegistry;

/// Everything a reload produces, published as one unit.
///
/// `profiles` keeps load order (file-name sort), which routing relies on for
/// tie-breaking.
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    pub source_dir: PathBuf,
    pub profiles: Vec<Arc<Profile>>,
    by_name: HashMap<String, usize>,
    pub registry: Arc<MetadataRegistry>,
    pub keyword_tables: Arc<KeywordTables>,
}

impl ProfileSnapshot {
    pub fn new(
        generation: u64,
        source_dir: PathBuf,
        profiles: Vec<Arc<Profile>>,
        registry: MetadataRegistry,
        keyword_tables: KeywordTables,
    ) -> Self {
        let by_name = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self {
            generation,
            loaded_at: Utc::now(),
            source_dir,
            profiles,
            by_name,
            registry: Arc::new(registry),
            keyword_tables: Arc::new(keyword_tables),
        }
    }

    /// Snapshot served before any reload: no profiles, built-in tables
    pub fn empty(source_dir: PathBuf) -> Self {
        Self::new(
            0,
            source_dir,
            Vec::new(),
            MetadataRegistry::empty(),
            KeywordTables::builtin(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Profile>> {
        self.by_name.get(name).map(|&i| &self.profiles[i])
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }
}

/// RCU-style holder of the live snapshot
#[derive(Debug)]
pub struct SnapshotStore {
    current: ArcSwap<ProfileSnapshot>,
}

impl SnapshotStore {
    pub fn new(initial: ProfileSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Current snapshot. Lock-free; the returned Arc stays valid across reloads.
    pub fn load(&self) -> Arc<ProfileSnapshot> {
        self.current.load_full()
    }

    /// Replace the live snapshot, returning the previous one
    pub fn publish(&self, snapshot: ProfileSnapshot) -> Arc<ProfileSnapshot> {
        self.current.swap(Arc::new(snapshot))
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_swaps_and_keeps_old_readers_valid() {
        let store = SnapshotStore::new(ProfileSnapshot::empty(PathBuf::from("profiles")));
        let before = store.load();
        assert!(before.is_empty());

        let profiles = vec![Arc::new(Profile::new("alpha", "Do alpha things."))];
        let registry = MetadataRegistry::rebuild(1, &profiles);
        let previous = store.publish(ProfileSnapshot::new(
            1,
            PathBuf::from("profiles"),
            profiles,
            registry,
            KeywordTables::builtin(),
        ));

        assert_eq!(previous.generation, 0);
        assert_eq!(store.generation(), 1);
        assert!(before.is_empty());
        assert_eq!(store.load().get("alpha").unwrap().name, "alpha");
        assert!(store.load().get("beta").is_none());
    }
}
