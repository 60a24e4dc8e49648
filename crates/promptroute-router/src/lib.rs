// ABOUTME: Routing engine for PromptRoute: gating, scoring, tier switching and confidence
// ABOUTME: Operates on an immutable profile slice taken from the live snapshot

pub mod engine;
pub mod error;
pub mod matching;

pub use engine::{softmax_share, Evaluation, RoutingEngine, RoutingResult};
pub use error::{Result, RoutingError};
pub use matching::{is_match, score};
