// ABOUTME: Routing engine selecting one profile per prompt from a loaded profile set
// ABOUTME: Gates, scores, applies base/complex tier switching and reports softmax confidence

use promptroute_core::{Complexity, EnhancedMetadata, Profile, RoutingConfig};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{Result, RoutingError};
use crate::matching::{is_match, score_with_prompt};

/// Outcome of routing one prompt
#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub profile: Arc<Profile>,
    pub score: i64,
    /// Share of the final profile in the candidate softmax, 0..=100
    pub confidence_pct: f64,
    /// True when tier switching replaced the initially selected profile
    pub complexity_adjusted: bool,
    /// Profile picked before any tier switch
    pub original_profile_name: String,
    pub candidates_considered: usize,
    pub used_fallback: bool,
}

/// Per-profile evaluation against one prompt
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub profile: Arc<Profile>,
    pub matched: bool,
    pub score: i64,
}

/// Stateless router; safe to share across threads
#[derive(Debug, Clone, Default)]
pub struct RoutingEngine {
    config: RoutingConfig,
}

impl RoutingEngine {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Match and score every profile, in input order
    pub fn evaluate(&self, metadata: &EnhancedMetadata, profiles: &[Arc<Profile>]) -> Vec<Evaluation> {
        let prompt_lower = metadata.prompt.to_lowercase();
        profiles
            .iter()
            .map(|profile| {
                let evaluation = Evaluation {
                    profile: Arc::clone(profile),
                    matched: is_match(profile, metadata),
                    score: score_with_prompt(profile, metadata, &prompt_lower),
                };
                debug!(
                    "Evaluated '{}': matched={}, score={}",
                    profile.name, evaluation.matched, evaluation.score
                );
                evaluation
            })
            .collect()
    }

    /// Select the profile for `metadata` among `profiles` (given in load order)
    #[instrument(skip_all, fields(profiles = profiles.len(), words = metadata.word_count))]
    pub fn route(
        &self,
        metadata: &EnhancedMetadata,
        profiles: &[Arc<Profile>],
    ) -> Result<RoutingResult> {
        if metadata.prompt.trim().is_empty() {
            return Err(RoutingError::EmptyPrompt);
        }

        let evaluations = self.evaluate(metadata, profiles);

        let matched: Vec<&Evaluation> = evaluations.iter().filter(|e| e.matched).collect();
        let used_fallback = matched.is_empty();
        let pool: Vec<&Evaluation> = if used_fallback {
            evaluations.iter().filter(|e| e.profile.is_fallback).collect()
        } else {
            matched
        };

        let selected = best_of(&pool).ok_or(RoutingError::NoCandidate {
            loaded: profiles.len(),
        })?;
        let original_profile_name = selected.profile.name.clone();

        let final_pick = if self.config.complexity_switching {
            self.switch_tier(selected, &pool, metadata)
        } else {
            None
        };
        let complexity_adjusted = final_pick.is_some();
        let chosen = final_pick.unwrap_or(selected);

        let confidence_pct = softmax_share(
            &pool.iter().map(|e| e.score).collect::<Vec<_>>(),
            chosen.score,
            self.config.confidence_temperature,
        );

        debug!(
            "Routed to '{}' (score {}, confidence {:.1}%, adjusted={}, fallback={}, pool={})",
            chosen.profile.name,
            chosen.score,
            confidence_pct,
            complexity_adjusted,
            used_fallback,
            pool.len()
        );

        Ok(RoutingResult {
            profile: Arc::clone(&chosen.profile),
            score: chosen.score,
            confidence_pct,
            complexity_adjusted,
            original_profile_name,
            candidates_considered: pool.len(),
            used_fallback,
        })
    }

    /// Paired variant to switch to, if any. At most one switch is made.
    fn switch_tier<'a>(
        &self,
        selected: &'a Evaluation,
        pool: &[&'a Evaluation],
        metadata: &EnhancedMetadata,
    ) -> Option<&'a Evaluation> {
        let suffix = self.config.complex_suffix.as_str();
        let threshold = ratio_floor(selected.score, self.config.min_score_ratio);
        let find = |name: &str| pool.iter().copied().find(|e| e.profile.name == name);

        if !selected.profile.is_complex() {
            if metadata.word_count < self.config.complex_preference_threshold {
                return None;
            }
            let variant = find(&selected.profile.complex_variant_name(suffix))?;
            if !variant.profile.is_complex() || (variant.score as f64) < threshold {
                return None;
            }
            debug!(
                "Switching '{}' -> '{}' for {}-word prompt",
                selected.profile.name, variant.profile.name, metadata.word_count
            );
            return Some(variant);
        }

        let simple = metadata.word_count < self.config.simple_preference_threshold
            && metadata.complexity != Complexity::High;
        if !simple {
            return None;
        }
        let base = find(selected.profile.base_variant_name(suffix)?)?;
        if base.profile.is_complex() || (base.score as f64) < threshold {
            return None;
        }
        debug!(
            "Switching '{}' -> '{}' for simple prompt",
            selected.profile.name, base.profile.name
        );
        Some(base)
    }
}

/// Lowest score still within `ratio` of `score`. Equals `score * ratio` for
/// non-negative scores and stays below `score` when it is negative.
fn ratio_floor(score: i64, ratio: f64) -> f64 {
    let score = score as f64;
    score - score.abs() * (1.0 - ratio)
}

/// Highest score; ties go to the lowest load order, then input order
fn best_of<'a>(pool: &[&'a Evaluation]) -> Option<&'a Evaluation> {
    pool.iter().copied().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            let better = candidate.score > current.score
                || (candidate.score == current.score
                    && candidate.profile.load_order < current.profile.load_order);
            Some(if better { candidate } else { current })
        }
    })
}

/// Softmax share of `target` among `scores`, as a percentage in [0, 100]
pub fn softmax_share(scores: &[i64], target: i64, temperature: f64) -> f64 {
    if scores.len() <= 1 {
        return 100.0;
    }
    let temperature = if temperature > 0.0 { temperature } else { 1.0 };
    let max = scores.iter().copied().max().unwrap_or(target) as f64;
    let weight = |s: i64| ((s as f64 - max) / temperature).exp();

    let total: f64 = scores.iter().map(|&s| weight(s)).sum();
    if !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    (weight(target) / total * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptroute_core::{MetadataParser, MetadataOverrides};

    fn meta(prompt: &str) -> EnhancedMetadata {
        MetadataParser::default().analyze(prompt).into()
    }

    fn arcs(profiles: Vec<Profile>) -> Vec<Arc<Profile>> {
        profiles
            .into_iter()
            .enumerate()
            .map(|(i, p)| Arc::new(p.with_load_order(i)))
            .collect()
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let engine = RoutingEngine::default();
        let profiles = arcs(vec![Profile::new("any", "x").as_fallback()]);
        assert_eq!(
            engine.route(&meta("   "), &profiles).unwrap_err(),
            RoutingError::EmptyPrompt
        );
    }

    #[test]
    fn test_no_profiles_is_no_candidate() {
        let engine = RoutingEngine::default();
        assert_eq!(
            engine.route(&meta("hello"), &[]).unwrap_err(),
            RoutingError::NoCandidate { loaded: 0 }
        );
    }

    #[test]
    fn test_highest_score_wins_and_ties_use_load_order() {
        let engine = RoutingEngine::default();
        let profiles = arcs(vec![
            Profile::new("first", "x").with_default_score(2),
            Profile::new("second", "x").with_default_score(2),
            Profile::new("low", "x").with_default_score(1),
        ]);
        let result = engine.route(&meta("hello"), &profiles).unwrap();
        assert_eq!(result.profile.name, "first");
        assert_eq!(result.candidates_considered, 3);
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_fallback_used_only_when_nothing_matches() {
        let engine = RoutingEngine::default();
        let profiles = arcs(vec![
            Profile::new("coder", "x").with_required("domain", ["software"]),
            Profile::new("general", "x")
                .with_required("intent", ["never"])
                .as_fallback(),
        ]);

        let routed = engine.route(&meta("refactor this software module"), &profiles).unwrap();
        assert_eq!(routed.profile.name, "coder");
        assert!(!routed.used_fallback);

        let fallback = engine.route(&meta("tell me about the weather"), &profiles).unwrap();
        assert_eq!(fallback.profile.name, "general");
        assert!(fallback.used_fallback);
        assert_eq!(fallback.confidence_pct, 100.0);
    }

    #[test]
    fn test_overrides_drive_gating() {
        let engine = RoutingEngine::default();
        let profiles = arcs(vec![
            Profile::new("expert", "x").with_required("audience", ["expert"]),
            Profile::new("general", "x").as_fallback().with_required("intent", ["never"]),
        ]);
        let overrides = MetadataOverrides {
            audience: Some("Expert".to_string()),
            ..Default::default()
        };
        let metadata = MetadataParser::default()
            .analyze("explain monads")
            .to_enhanced(&overrides);
        assert_eq!(engine.route(&metadata, &profiles).unwrap().profile.name, "expert");
    }

    #[test]
    fn test_switch_to_complex_variant_for_long_prompt() {
        let engine = RoutingEngine::default();
        let profiles = arcs(vec![
            Profile::new("creative_brainstorm", "x")
                .with_required("intent", ["brainstorm"])
                .with_field_weight("intent", "brainstorm", 5)
                .with_keyword("ideas", 2),
            Profile::new("creative_brainstorm_complex", "x")
                .with_required("intent", ["brainstorm"])
                .with_field_weight("intent", "brainstorm", 4)
                .with_keyword("ideas", 2),
        ]);
        let prompt = format!("brainstorm ideas {}", vec!["detail"; 70].join(" "));
        let result = engine.route(&meta(&prompt), &profiles).unwrap();
        assert_eq!(result.profile.name, "creative_brainstorm_complex");
        assert_eq!(result.original_profile_name, "creative_brainstorm");
        assert!(result.complexity_adjusted);
        assert_eq!(result.score, 6);
    }

    #[test]
    fn test_switch_back_to_base_for_simple_prompt() {
        let engine = RoutingEngine::default();
        let profiles = arcs(vec![
            Profile::new("review", "x").with_default_score(4),
            Profile::new("review_complex", "x").with_default_score(5),
        ]);
        let result = engine.route(&meta("quick look"), &profiles).unwrap();
        assert_eq!(result.profile.name, "review");
        assert_eq!(result.original_profile_name, "review_complex");
        assert!(result.complexity_adjusted);
    }

    #[test]
    fn test_no_switch_when_variant_scores_too_low_or_disabled() {
        let profiles = arcs(vec![
            Profile::new("plan", "x").with_default_score(10),
            Profile::new("plan_complex", "x").with_default_score(7),
        ]);
        let prompt = vec!["word"; 80].join(" ");

        let result = RoutingEngine::default().route(&meta(&prompt), &profiles).unwrap();
        assert_eq!(result.profile.name, "plan");
        assert!(!result.complexity_adjusted);

        let disabled = RoutingEngine::new(RoutingConfig {
            complexity_switching: false,
            ..Default::default()
        });
        let profiles = arcs(vec![
            Profile::new("plan", "x").with_default_score(10),
            Profile::new("plan_complex", "x").with_default_score(9),
        ]);
        let result = disabled.route(&meta(&prompt), &profiles).unwrap();
        assert_eq!(result.profile.name, "plan");
        assert_eq!(result.original_profile_name, "plan");
    }

    #[test]
    fn test_switch_with_negative_scores() {
        let engine = RoutingEngine::default();
        let prompt = vec!["word"; 80].join(" ");

        let profiles = arcs(vec![
            Profile::new("plan", "x").with_default_score(-10),
            Profile::new("plan_complex", "x").with_default_score(-10),
        ]);
        let result = engine.route(&meta(&prompt), &profiles).unwrap();
        assert_eq!(result.profile.name, "plan_complex");
        assert_eq!(result.original_profile_name, "plan");

        let profiles = arcs(vec![
            Profile::new("plan", "x").with_default_score(-10),
            Profile::new("plan_complex", "x").with_default_score(-13),
        ]);
        let result = engine.route(&meta(&prompt), &profiles).unwrap();
        assert_eq!(result.profile.name, "plan");
        assert!(!result.complexity_adjusted);
    }

    #[test]
    fn test_ratio_floor() {
        assert!((ratio_floor(10, 0.8) - 8.0).abs() < 1e-9);
        assert_eq!(ratio_floor(0, 0.8), 0.0);
        assert!((ratio_floor(-10, 0.8) - -12.0).abs() < 1e-9);
    }

    #[test]
    fn test_softmax_share() {
        assert_eq!(softmax_share(&[3], 3, 1.0), 100.0);
        let even = softmax_share(&[2, 2], 2, 1.0);
        assert!((even - 50.0).abs() < 1e-9);
        let dominant = softmax_share(&[10, 0], 10, 1.0);
        assert!(dominant > 99.0 && dominant <= 100.0);
        let flatter = softmax_share(&[10, 0], 10, 10.0);
        assert!(flatter < dominant);
    }
}
