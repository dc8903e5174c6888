//! Settings for the `stockbook` binary.
//!
//! Values come from an optional `stockbook.toml` next to the binary and from
//! `STOCKBOOK__*` environment variables (e.g. `STOCKBOOK__APP__LEVEL=debug`).
use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "stockbook";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    #[default]
    Default,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ledger {
    pub bill_counter_seed: i64,
    /// Fixed business day, for replaying a day's paperwork.
    pub today: Option<NaiveDate>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            bill_counter_seed: 1000,
            today: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub ledger: Ledger,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(path, environment())
    }

    fn load(path: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

/// `STOCKBOOK__<SECTION>__<KEY>`; `__` also splits the prefix from the key.
fn environment() -> Environment {
    Environment::with_prefix("STOCKBOOK").separator("__")
}

impl Database {
    /// Connection string, unless the command line decides.
    pub fn url(&self) -> Option<String> {
        match self {
            Database::Memory => Some(String::from("sqlite::memory:")),
            Database::Default => None,
            Database::Sqlite(path) => Some(format!("sqlite:{path}?mode=rwc")),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::Map;

    use super::*;

    #[test]
    fn environment_overrides_use_double_underscores() {
        let vars = Map::from([
            ("STOCKBOOK__APP__LEVEL".to_string(), "debug".to_string()),
            ("STOCKBOOK__DATABASE".to_string(), "memory".to_string()),
            (
                "STOCKBOOK__LEDGER__BILL_COUNTER_SEED".to_string(),
                "5000".to_string(),
            ),
        ]);
        let settings =
            Settings::load(Some("missing-stockbook-settings"), environment().source(Some(vars)))
                .unwrap();

        assert_eq!(settings.app.level, "debug");
        assert!(matches!(settings.database, Database::Memory));
        assert_eq!(settings.ledger.bill_counter_seed, 5000);
        assert_eq!(settings.ledger.today, None);
    }

    #[test]
    fn defaults_without_file_or_environment() {
        let empty: Map<String, String> = Map::new();
        let settings =
            Settings::load(Some("missing-stockbook-settings"), environment().source(Some(empty)))
                .unwrap();

        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.database, Database::Default));
        assert_eq!(settings.ledger.bill_counter_seed, 1000);
    }
}
