// Configuration management module
// TOML configuration stored in the config directory

pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CONTEXT_PLACEHOLDER, Config, ConfigError, DEFAULT_SYSTEM_TEMPLATE, DocumentsConfig,
    HttpConfig, LlmConfig, LlmProvider, OllamaConfig, PromptConfig, VectorStoreConfig,
};

/// Resolve the configuration directory, preferring an explicit override
#[inline]
pub fn resolve_config_dir(
    override_dir: Option<std::path::PathBuf>,
) -> Result<std::path::PathBuf, ConfigError> {
    override_dir.map_or_else(Config::default_dir, Ok)
}
