// ABOUTME: JSON payloads returned by the service boundary
// ABOUTME: Shapes are stable and independent of internal engine types

use promptroute_core::{ComplexityTier, EnhancedMetadata, Profile};
use promptroute_loader::{LoadIssue, MetadataRegistryEntry, ReloadResult};
use promptroute_router::{RoutingError, RoutingResult};
use serde::Serialize;

/// Successful routing decision
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub profile: String,
    pub score: i64,
    pub confidence_pct: f64,
    pub complexity_adjusted: bool,
    pub original_profile: String,
    pub used_fallback: bool,
    pub candidates_considered: usize,
    pub instructions: String,
    pub metadata: EnhancedMetadata,
}

impl RouteResponse {
    pub fn new(result: RoutingResult, metadata: EnhancedMetadata) -> Self {
        Self {
            profile: result.profile.name.clone(),
            score: result.score,
            confidence_pct: result.confidence_pct,
            complexity_adjusted: result.complexity_adjusted,
            original_profile: result.original_profile_name,
            used_fallback: result.used_fallback,
            candidates_considered: result.candidates_considered,
            instructions: result.profile.instructions.clone(),
            metadata,
        }
    }
}

/// Routing failure as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFailure {
    pub error: String,
    pub message: String,
}

impl From<RoutingError> for RouteFailure {
    fn from(error: RoutingError) -> Self {
        Self {
            error: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Listing view of one loaded profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub description: String,
    pub complexity_tier: ComplexityTier,
    pub is_fallback: bool,
    pub extends: Option<String>,
    pub capabilities: Vec<String>,
    pub domains: Vec<String>,
    pub checklist_count: usize,
    pub source_file: String,
}

impl ProfileSummary {
    pub fn new(profile: &Profile, entry: Option<&MetadataRegistryEntry>) -> Self {
        Self {
            name: profile.name.clone(),
            description: profile.short_description(),
            complexity_tier: profile.complexity_tier,
            is_fallback: profile.is_fallback,
            extends: profile.extends.clone(),
            capabilities: entry.map(|e| e.capabilities.clone()).unwrap_or_default(),
            domains: entry.map(|e| e.domains.clone()).unwrap_or_default(),
            checklist_count: profile.checklist.len(),
            source_file: profile.source_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub profiles_loaded: usize,
    pub profile_names: Vec<String>,
    pub errors: Vec<LoadIssue>,
    pub generation: u64,
    pub duration_ms: u64,
}

impl From<ReloadResult> for ReloadResponse {
    fn from(result: ReloadResult) -> Self {
        Self {
            success: result.success,
            profiles_loaded: result.profiles_loaded,
            profile_names: result.profile_names,
            errors: result.errors,
            generation: result.generation,
            duration_ms: result.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistResponse {
    pub profile: String,
    pub items: Vec<String>,
    pub count: usize,
}
