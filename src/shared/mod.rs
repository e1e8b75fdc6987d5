pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, CacheConfig, MutationConfig, RemoteConfig, ToggleFailurePolicy};
pub use error::{AppError, Result, TransportError};
