// Configuration management module
// TOML settings in the data directory plus environment overrides read at startup

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, EmbeddingConfig, IndexBackend, IndexConfig, LlmConfig, RetrievalConfig,
};
