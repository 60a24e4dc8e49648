use promptroute_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
