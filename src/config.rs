use crate::core::MenuVariant;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerSettings,
    #[serde(default)]
    #[validate(nested)]
    pub line: LineSettings,
    #[serde(default)]
    #[validate(nested)]
    pub places: PlacesSettings,
    #[serde(default)]
    #[validate(nested)]
    pub session: SessionSettings,
    #[serde(default)]
    #[validate(nested)]
    pub ranking: RankingConfig,
    #[serde(default)]
    #[validate(nested)]
    pub bot: BotSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[validate(range(min = 1, max = 256))]
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Clone, Deserialize, Validate)]
pub struct LineSettings {
    #[serde(default)]
    pub channel_secret: String,
    #[serde(default)]
    pub channel_access_token: String,
    #[serde(default = "default_line_api_base_url")]
    #[validate(url)]
    pub api_base_url: String,
    /// Reject webhook calls without a valid `X-Line-Signature`
    #[serde(default = "default_true")]
    pub enforce_signature: bool,
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 60))]
    pub timeout_secs: u64,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_access_token: String::new(),
            api_base_url: default_line_api_base_url(),
            enforce_signature: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSettings")
            .field("channel_secret", &redact(&self.channel_secret))
            .field("channel_access_token", &redact(&self.channel_access_token))
            .field("api_base_url", &self.api_base_url)
            .field("enforce_signature", &self.enforce_signature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_line_api_base_url() -> String { "https://api.line.me".to_string() }
fn default_true() -> bool { true }
fn default_timeout_secs() -> u64 { 10 }

#[derive(Clone, Deserialize, Validate)]
pub struct PlacesSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_places_api_base_url")]
    #[validate(url)]
    pub api_base_url: String,
    #[serde(default = "default_radius_m")]
    #[validate(range(min = 1, max = 50000))]
    pub radius_m: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 60))]
    pub timeout_secs: u64,
    #[serde(default = "default_photo_max_width")]
    #[validate(range(min = 1, max = 1600))]
    pub photo_max_width: u32,
    #[serde(default = "default_placeholder_image_url")]
    #[validate(url)]
    pub placeholder_image_url: String,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_places_api_base_url(),
            radius_m: default_radius_m(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            photo_max_width: default_photo_max_width(),
            placeholder_image_url: default_placeholder_image_url(),
        }
    }
}

impl fmt::Debug for PlacesSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacesSettings")
            .field("api_key", &redact(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .field("radius_m", &self.radius_m)
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .field("photo_max_width", &self.photo_max_width)
            .field("placeholder_image_url", &self.placeholder_image_url)
            .finish()
    }
}

fn default_places_api_base_url() -> String { "https://maps.googleapis.com".to_string() }
fn default_radius_m() -> u32 { 1000 }
fn default_language() -> String { "zh-TW".to_string() }
fn default_photo_max_width() -> u32 { 600 }
fn default_placeholder_image_url() -> String {
    "https://via.placeholder.com/600x400?text=No+Image".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl_secs")]
    #[validate(range(min = 60))]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    #[validate(range(min = 1))]
    pub max_entries: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_session_ttl_secs() -> u64 { 1800 }
fn default_max_entries() -> u64 { 100_000 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RankingConfig {
    #[serde(default = "default_min_review_count")]
    pub min_review_count: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 10))]
    pub limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_review_count: default_min_review_count(),
            limit: default_limit(),
        }
    }
}

fn default_min_review_count() -> u32 { 5 }
fn default_limit() -> usize { 5 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BotSettings {
    #[serde(default = "default_menu_keywords")]
    #[validate(length(min = 1))]
    pub menu_keywords: Vec<String>,
    #[serde(default)]
    pub menu_variant: MenuVariant,
    #[serde(default = "default_areas_file")]
    pub areas_file: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            menu_keywords: default_menu_keywords(),
            menu_variant: MenuVariant::default(),
            areas_file: default_areas_file(),
        }
    }
}

fn default_menu_keywords() -> Vec<String> {
    vec!["選單".to_string(), "搜尋餐廳".to_string()]
}
fn default_areas_file() -> String { "config/areas.toml".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Defaults on the structs
    /// 2. `config/default.toml`
    /// 3. `config/local.toml` (development overrides)
    /// 4. Environment variables prefixed with `FOODBOT`, e.g. `FOODBOT__SERVER__PORT`
    /// 5. Platform credentials (`LINE_BOT_CHANNEL_SECRET`, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        Self::finish(builder)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from(path.as_ref()));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let builder = builder.add_source(
            Environment::with_prefix("FOODBOT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = apply_credential_overrides(builder)?.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;
        Ok(settings)
    }
}

/// Credentials may come from the platform's conventional variable names
fn apply_credential_overrides(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    use std::env;

    let overrides = [
        ("LINE_BOT_CHANNEL_SECRET", "line.channel_secret"),
        ("LINE_BOT_CHANNEL_ACCESS_TOKEN", "line.channel_access_token"),
        ("GOOGLE_MAPS_API_KEY", "places.api_key"),
    ];

    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.session.ttl_secs, 1800);
        assert_eq!(settings.ranking.min_review_count, 5);
        assert_eq!(settings.ranking.limit, 5);
        assert_eq!(settings.places.radius_m, 1000);
        assert_eq!(settings.bot.menu_keywords, vec!["選單", "搜尋餐廳"]);
        assert_eq!(settings.bot.menu_variant, MenuVariant::AreaTypePopular);
        assert!(settings.line.enforce_signature);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "[places]\nradius_m = 1500\n[bot]\nmenu_variant = \"price_type_area\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.places.radius_m, 1500);
        assert_eq!(settings.places.language, "zh-TW");
        assert_eq!(settings.bot.menu_variant, MenuVariant::PriceTypeArea);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut settings = Settings::default();
        settings.places.radius_m = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.session.ttl_secs = 10;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.bot.menu_keywords.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = Settings::default();
        settings.line.channel_secret = "super-secret".into();
        settings.places.api_key = "AIza-key".into();

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("AIza-key"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("<unset>"));
    }
}
