// ABOUTME: Reload pipeline: list, read, parse, resolve extends, rebuild registry, publish
// ABOUTME: Per-file failures are isolated; an unreadable directory keeps the previous snapshot

use futures::stream::{self, StreamExt};
use promptroute_core::{KeywordTables, LoaderConfig, Profile, PromptRouteConfig};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::document::parse_document;
use crate::error::{DocumentError, LoadIssue, ReloadError};
use crate::extends::resolve_extends;
use crate::registry::MetadataRegistry;
use crate::snapshot::{ProfileSnapshot, SnapshotStore};

type ParsedDocuments = Vec<(String, Result<Profile, DocumentError>)>;

/// Outcome of one reload pass
#[derive(Debug, Clone, Serialize)]
pub struct ReloadResult {
    pub success: bool,
    pub profiles_loaded: usize,
    pub profile_names: Vec<String>,
    pub errors: Vec<LoadIssue>,
    /// Generation now live (unchanged when the directory could not be read)
    pub generation: u64,
    pub duration_ms: u64,
    /// Directory-level failure, if any
    #[serde(skip)]
    pub failure: Option<ReloadError>,
}

impl ReloadResult {
    fn failed(
        error: ReloadError,
        location: &str,
        mut errors: Vec<LoadIssue>,
        generation: u64,
        started: Instant,
    ) -> Self {
        errors.push(LoadIssue::new(location, &error));
        Self {
            success: false,
            profiles_loaded: 0,
            profile_names: Vec::new(),
            errors,
            generation,
            duration_ms: started.elapsed().as_millis() as u64,
            failure: Some(error),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.failure, Some(ReloadError::ReloadInProgress))
    }
}

/// Loads a profile directory into immutable snapshots
pub struct ProfileLoader {
    config: LoaderConfig,
    complex_suffix: String,
    store: Arc<SnapshotStore>,
    base_tables: Arc<KeywordTables>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ProfileLoader {
    pub fn new(config: &PromptRouteConfig) -> Self {
        let store = SnapshotStore::new(ProfileSnapshot::empty(config.loader.profiles_dir.clone()));
        Self {
            config: config.loader.clone(),
            complex_suffix: config.routing.complex_suffix.clone(),
            generation: AtomicU64::new(store.generation()),
            store: Arc::new(store),
            base_tables: Arc::new(KeywordTables::builtin()),
            reload_lock: Mutex::new(()),
        }
    }

    /// Currently published snapshot
    pub fn snapshot(&self) -> Arc<ProfileSnapshot> {
        self.store.load()
    }

    /// Reload the configured profile directory
    pub async fn reload(&self) -> ReloadResult {
        let dir = self.config.profiles_dir.clone();
        self.reload_from(&dir).await
    }

    /// Reload from `dir`. A second reload while one is running is rejected.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn reload_from(&self, dir: &Path) -> ReloadResult {
        let started = Instant::now();
        let location = dir.display().to_string();

        let _guard = match self.reload_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Reload of {} rejected: another reload is running", location);
                return ReloadResult::failed(
                    ReloadError::ReloadInProgress,
                    &location,
                    Vec::new(),
                    self.store.generation(),
                    started,
                );
            }
        };

        let files = match list_profile_files(dir, &self.config.extension).await {
            Ok(files) => files,
            Err(error) => {
                warn!("Reload failed: {}", error);
                return ReloadResult::failed(
                    error,
                    &location,
                    Vec::new(),
                    self.store.generation(),
                    started,
                );
            }
        };
        debug!("Found {} profile documents in {}", files.len(), location);

        let documents = self.read_documents(files).await;
        let parsed = match self.parse_documents(documents).await {
            Ok(parsed) => parsed,
            Err(error) => {
                return ReloadResult::failed(
                    error,
                    &location,
                    Vec::new(),
                    self.store.generation(),
                    started,
                );
            }
        };

        let mut errors = Vec::new();
        let mut unique: Vec<Profile> = Vec::new();
        let mut first_seen: HashMap<String, String> = HashMap::new();
        for (file, outcome) in parsed {
            match outcome {
                Ok(profile) => {
                    if let Some(first_file) = first_seen.get(&profile.name) {
                        errors.push(LoadIssue::new(
                            &file,
                            DocumentError::DuplicateName {
                                name: profile.name.clone(),
                                first_file: first_file.clone(),
                            },
                        ));
                        continue;
                    }
                    first_seen.insert(profile.name.clone(), file);
                    unique.push(profile);
                }
                Err(error) => errors.push(LoadIssue::new(&file, error)),
            }
        }

        let resolution = resolve_extends(unique);
        errors.extend(
            resolution
                .failures
                .into_iter()
                .map(|(file, error)| LoadIssue::new(file, error)),
        );
        errors.sort_by(|a, b| a.file.cmp(&b.file));

        for issue in &errors {
            warn!("Skipped {}: {}", issue.file, issue.message);
        }

        let profiles: Vec<Arc<Profile>> = resolution
            .profiles
            .into_iter()
            .enumerate()
            .map(|(order, profile)| Arc::new(profile.with_load_order(order)))
            .collect();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tables = KeywordTables::with_profile_extensions(
            &self.base_tables,
            profiles.iter().map(|p| p.as_ref()),
            generation,
        );
        let registry = MetadataRegistry::rebuild(generation, &profiles);

        if let Some(path) = &self.config.registry_path {
            if let Err(e) = registry.persist(path) {
                warn!("Failed to persist registry to {}: {}", path.display(), e);
                errors.push(LoadIssue::new(path.display().to_string(), e));
            } else {
                debug!("Registry written to {}", path.display());
            }
        }

        let profile_names: Vec<String> = profiles.iter().map(|p| p.name.clone()).collect();
        self.store.publish(ProfileSnapshot::new(
            generation,
            dir.to_path_buf(),
            profiles,
            registry,
            tables,
        ));

        if profile_names.is_empty() {
            // The directory was read, so its empty state replaces the live set
            warn!(
                "No profiles loaded from {}; published empty generation {}",
                location, generation
            );
            return ReloadResult::failed(
                ReloadError::NoProfilesLoaded(location.clone()),
                &location,
                errors,
                generation,
                started,
            );
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Loaded {} profiles from {} (generation {}, {} errors, {}ms): {}",
            profile_names.len(),
            location,
            generation,
            errors.len(),
            duration_ms,
            profile_names.join(", ")
        );

        ReloadResult {
            success: true,
            profiles_loaded: profile_names.len(),
            profile_names,
            errors,
            generation,
            duration_ms,
            failure: None,
        }
    }

    /// Read every file concurrently with a per-file timeout, keeping input order
    async fn read_documents(
        &self,
        files: Vec<(String, PathBuf)>,
    ) -> Vec<(String, Result<String, DocumentError>)> {
        let timeout_ms = self.config.file_read_timeout_ms;
        let limit = self.config.max_concurrent_reads.max(1);

        stream::iter(files)
            .map(|(file, path)| async move {
                let content = match tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    tokio::fs::read_to_string(&path),
                )
                .await
                {
                    Ok(Ok(content)) => Ok(content),
                    Ok(Err(e)) => Err(DocumentError::Read(e.to_string())),
                    Err(_) => Err(DocumentError::ReadTimeout(timeout_ms)),
                };
                (file, content)
            })
            .buffered(limit)
            .collect()
            .await
    }

    /// Parse documents off the async runtime, on the rayon pool when enabled
    async fn parse_documents(
        &self,
        documents: Vec<(String, Result<String, DocumentError>)>,
    ) -> Result<ParsedDocuments, ReloadError> {
        let suffix = self.complex_suffix.clone();
        let parallel = self.config.parallel_parse;

        tokio::task::spawn_blocking(move || -> ParsedDocuments {
            let parse = |(file, content): (String, Result<String, DocumentError>)| {
                let outcome = content.and_then(|text| parse_document(&file, &text, &suffix));
                (file, outcome)
            };
            if parallel {
                documents.into_par_iter().map(parse).collect()
            } else {
                documents.into_iter().map(parse).collect()
            }
        })
        .await
        .map_err(|e| ReloadError::Internal(e.to_string()))
    }
}

/// Profile documents directly inside `dir`, sorted by file name
async fn list_profile_files(
    dir: &Path,
    extension: &str,
) -> Result<Vec<(String, PathBuf)>, ReloadError> {
    let unreadable = |e: std::io::Error| ReloadError::DirectoryUnreadable {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        let matches_extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => {}
            _ => continue,
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((name, path));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
