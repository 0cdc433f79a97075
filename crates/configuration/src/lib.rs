use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{AnalyticsConfig, ApiConfig, Config, StoreConfig, TelegramConfig};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, layers `CARDSCOPE_`-prefixed environment variables on
/// top (e.g. `CARDSCOPE_API__BASE_URL`), and deserializes the result into
/// our strongly-typed `Config` struct.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(config::File::with_name("config.toml"))
}

fn load_config_from<S>(source: S) -> Result<Config, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(source)
        .add_source(config::Environment::with_prefix("CARDSCOPE").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;
    tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.analytics.default_min_score > 100 {
        return Err(ConfigError::ValidationError(
            "analytics.default_min_score must be within 0-100".to_string(),
        ));
    }
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url must not be empty".to_string(),
        ));
    }
    Ok(())
}
