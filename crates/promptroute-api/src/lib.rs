// ABOUTME: Service boundary of PromptRoute: routing, reload, registry queries and hot reload
// ABOUTME: Wraps the loader and router behind serde payloads

pub mod error;
pub mod payloads;
pub mod service;
pub mod watcher;

pub use error::{Result, ServiceError};
pub use payloads::*;
pub use service::PromptRouteService;
pub use watcher::{is_profile_event, ProfileWatcher, WatchHandle};
