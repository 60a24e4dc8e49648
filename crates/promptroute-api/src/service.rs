// ABOUTME: PromptRouteService facade exposing routing, reload and registry queries
// ABOUTME: Every call reads one consistent snapshot; failures come back as data

use promptroute_core::{
    ConfigManager, MetadataOverrides, MetadataParser, ParsedMetadata, ParserConfig, Profile,
    PromptRouteConfig,
};
use promptroute_loader::{MetadataRegistryEntry, ProfileLoader, ProfileSnapshot, RegistrySummary};
use promptroute_router::RoutingEngine;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{Result, ServiceError};
use crate::payloads::{
    ChecklistResponse, ProfileSummary, ReloadResponse, RouteFailure, RouteResponse,
};

/// Boundary of the routing engine. Cheap to share behind an `Arc`.
pub struct PromptRouteService {
    config: PromptRouteConfig,
    parser_config: ParserConfig,
    loader: ProfileLoader,
    engine: RoutingEngine,
}

impl PromptRouteService {
    /// Service over `config`. No profiles are loaded until `reload` runs.
    pub fn new(config: PromptRouteConfig) -> Self {
        let loader = ProfileLoader::new(&config);
        let engine = RoutingEngine::new(config.routing.clone());
        Self {
            parser_config: config.parser.clone(),
            config,
            loader,
            engine,
        }
    }

    /// Service built from the layered configuration (env > file > defaults)
    pub fn from_environment() -> Result<Self> {
        let manager = ConfigManager::load()?;
        Ok(Self::new(manager.into_config()))
    }

    pub fn config(&self) -> &PromptRouteConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<ProfileSnapshot> {
        self.loader.snapshot()
    }

    fn parser_for(&self, snapshot: &ProfileSnapshot) -> MetadataParser {
        MetadataParser::new(
            Arc::clone(&snapshot.keyword_tables),
            self.parser_config.clone(),
        )
    }

    /// Route a prompt to one profile
    #[instrument(skip(self, prompt, overrides), fields(prompt_len = prompt.len()))]
    pub fn route(
        &self,
        prompt: &str,
        overrides: Option<&MetadataOverrides>,
    ) -> std::result::Result<RouteResponse, RouteFailure> {
        let snapshot = self.snapshot();
        let parsed = self.parser_for(&snapshot).analyze(prompt);
        let metadata = match overrides {
            Some(overrides) => parsed.to_enhanced(overrides),
            None => parsed.into(),
        };

        let result = self.engine.route(&metadata, &snapshot.profiles)?;
        info!(
            "Routed prompt to '{}' (score {}, confidence {:.1}%)",
            result.profile.name, result.score, result.confidence_pct
        );
        Ok(RouteResponse::new(result, metadata))
    }

    /// Classify a prompt without routing it
    pub fn analyze(&self, prompt: &str) -> ParsedMetadata {
        let snapshot = self.snapshot();
        self.parser_for(&snapshot).analyze(prompt)
    }

    /// Loaded profiles in load order
    pub fn list_profiles(&self) -> Vec<ProfileSummary> {
        let snapshot = self.snapshot();
        snapshot
            .profiles
            .iter()
            .map(|p| ProfileSummary::new(p, snapshot.registry.get(&p.name)))
            .collect()
    }

    pub async fn reload(&self) -> ReloadResponse {
        self.loader.reload().await.into()
    }

    pub fn get_checklist(&self, name: &str) -> Result<ChecklistResponse> {
        let profile = self.find(name)?;
        Ok(ChecklistResponse {
            profile: profile.name.clone(),
            count: profile.checklist.len(),
            items: profile.checklist.clone(),
        })
    }

    /// Full profile including its instructions
    pub fn get_profile(&self, name: &str) -> Result<Profile> {
        Ok(self.find(name)?.as_ref().clone())
    }

    pub fn get_registry_summary(&self) -> RegistrySummary {
        self.snapshot().registry.summary.clone()
    }

    pub fn find_by_capability(&self, capability: &str) -> Vec<ProfileSummary> {
        let snapshot = self.snapshot();
        summaries(&snapshot, snapshot.registry.find_by_capability(capability))
    }

    pub fn find_by_domain(&self, domain: &str) -> Vec<ProfileSummary> {
        let snapshot = self.snapshot();
        summaries(&snapshot, snapshot.registry.find_by_domain(domain))
    }

    fn find(&self, name: &str) -> Result<Arc<Profile>> {
        self.snapshot()
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::ProfileNotFound(name.to_string()))
    }
}

fn summaries(snapshot: &ProfileSnapshot, entries: Vec<&MetadataRegistryEntry>) -> Vec<ProfileSummary> {
    entries
        .into_iter()
        .filter_map(|entry| {
            snapshot
                .get(&entry.name)
                .map(|profile| ProfileSummary::new(profile, Some(entry)))
        })
        .collect()
}
