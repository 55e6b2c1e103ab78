//! Application settings.
//!
//! Values come from an optional TOML file (`settings.toml` unless overridden
//! with `--config` or `DIVIDI_CONFIG`) and from `DIVIDI__*` environment
//! variables, which take precedence. See `settings.example.toml`.
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "dividi", about = "Telegram bot for shared expenses")]
struct Args {
    /// Settings file, without or with the `.toml` extension.
    #[arg(long, env = "DIVIDI_CONFIG")]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("dividi.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Locale {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub telegram: Telegram,
    #[serde(default)]
    pub locale: Locale,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("DIVIDI").separator("__"))
            .build()?
            .try_deserialize()
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn missing_sections_use_defaults() {
        let settings = parse("[telegram]\ntoken = \"abc\"\n").unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.locale.timezone, "UTC");
        assert_eq!(settings.locale.currency, "EUR");
        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "dividi.db"));
        assert!(settings.telegram.allowed_users.is_empty());
    }

    #[test]
    fn database_can_live_in_memory() {
        let settings = parse("database = \"memory\"\n[telegram]\ntoken = \"abc\"\n").unwrap();
        assert!(matches!(settings.database, Database::Memory));
    }

    #[test]
    fn telegram_section_is_required() {
        assert!(parse("[app]\nlevel = \"debug\"\n").is_err());
    }
}
