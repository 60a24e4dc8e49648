// ABOUTME: Core types for PromptRoute: profiles, prompt metadata, keyword tables and config
// ABOUTME: Shared by the loader, the routing engine and the service facade

pub mod config_manager;
pub mod error;
pub mod keywords;
pub mod metadata;
pub mod parser;
pub mod profile;

pub use config_manager::*;
pub use error::*;
pub use keywords::*;
pub use metadata::*;
pub use parser::*;
pub use profile::*;
