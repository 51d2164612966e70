pub mod config;

pub use config::{CorsConfig, ProjectConfig, ServerConfig, ServiceConfig, StorageConfig};
