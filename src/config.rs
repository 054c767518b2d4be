//! Configuration loader and validator for the rental listing watcher.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub telegram: Telegram,
    #[serde(default)]
    pub olx: Olx,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Telegram {
    /// May be left empty in the file and supplied through `TELEGRAM_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_ids: Vec<ChatTarget>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_max_rate_limit_waits")]
    pub max_rate_limit_waits: u32,
}

/// A notification destination: a numeric chat id or a public `@channel` name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl ChatTarget {
    /// Parse a destination as written in `TELEGRAM_CHAT_IDS`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<i64>() {
            Ok(id) => ChatTarget::Id(id),
            Err(_) => ChatTarget::Username(trimmed.to_string()),
        })
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatTarget::Id(id) => write!(f, "{id}"),
            ChatTarget::Username(name) => f.write_str(name),
        }
    }
}

/// Marketplace endpoints and the search query sent every cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Olx {
    pub graphql_url: String,
    pub api_base: String,
    pub user_agent: String,
    pub search: Vec<SearchParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchParam {
    pub key: String,
    pub value: String,
}

impl SearchParam {
    fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl Default for Olx {
    fn default() -> Self {
        Self {
            graphql_url: "https://www.olx.ua/apigateway/graphql".into(),
            api_base: "https://www.olx.ua/api/v1/".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into(),
            search: vec![
                SearchParam::new("offset", "0"),
                SearchParam::new("limit", "20"),
                SearchParam::new("query", "оренда 2 кімнатна"),
                SearchParam::new("category_id", "1760"),
                SearchParam::new("region_id", "5"),
                SearchParam::new("city_id", "176"),
                SearchParam::new("currency", "UAH"),
                SearchParam::new("sort_by", "created_at:desc"),
                SearchParam::new("filter_enum_number_of_rooms_string[0]", "dvuhkomnatnye"),
                SearchParam::new("filter_float_price:to", "10000"),
            ],
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    1000
}

fn default_max_rate_limit_waits() -> u32 {
    10
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// Default SQLite location inside the data directory.
    pub fn default_database_url(&self) -> String {
        format!(
            "sqlite://{}/listings.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }

    /// Overlay values taken from the environment (or any other lookup).
    ///
    /// `TELEGRAM_BOT_TOKEN` replaces the token, `TELEGRAM_CHAT_IDS` (comma separated)
    /// replaces the destination list.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(raw) = lookup("TELEGRAM_CHAT_IDS") {
            let chats: Vec<ChatTarget> = raw.split(',').filter_map(ChatTarget::parse).collect();
            if !chats.is_empty() {
                self.telegram.chat_ids = chats;
            }
        }
    }
}

/// Load configuration from a YAML file, apply environment overrides and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_overrides(|key| std::env::var(key).ok());
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("app.poll_interval_secs must be > 0"));
    }

    if cfg.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::Invalid("telegram.bot_token must be non-empty"));
    }
    if cfg.telegram.chat_ids.is_empty() {
        return Err(ConfigError::Invalid("telegram.chat_ids must list at least one chat"));
    }
    if cfg
        .telegram
        .chat_ids
        .iter()
        .any(|c| matches!(c, ChatTarget::Username(name) if name.trim().is_empty()))
    {
        return Err(ConfigError::Invalid("telegram.chat_ids must not contain empty names"));
    }
    if cfg.telegram.max_attempts == 0 {
        return Err(ConfigError::Invalid("telegram.max_attempts must be > 0"));
    }

    if cfg.olx.graphql_url.trim().is_empty() {
        return Err(ConfigError::Invalid("olx.graphql_url must be non-empty"));
    }
    if cfg.olx.api_base.trim().is_empty() {
        return Err(ConfigError::Invalid("olx.api_base must be non-empty"));
    }
    if cfg.olx.search.iter().any(|p| p.key.trim().is_empty()) {
        return Err(ConfigError::Invalid("olx.search keys must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the project.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  poll_interval_secs: 300

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  chat_ids:
    - 123456789
    - "@rent_alerts"
  max_attempts: 3
  initial_retry_delay_ms: 1000
  max_rate_limit_waits: 10

olx:
  graphql_url: "https://www.olx.ua/apigateway/graphql"
  api_base: "https://www.olx.ua/api/v1/"
  user_agent: "Mozilla/5.0 (X11; Linux x86_64)"
  search:
    - { key: "offset", value: "0" }
    - { key: "limit", value: "20" }
    - { key: "query", value: "оренда 2 кімнатна" }
    - { key: "category_id", value: "1760" }
    - { key: "region_id", value: "5" }
    - { key: "city_id", value: "176" }
    - { key: "currency", value: "UAH" }
    - { key: "sort_by", value: "created_at:desc" }
    - { key: "filter_enum_number_of_rooms_string[0]", value: "dvuhkomnatnye" }
    - { key: "filter_float_price:to", value: "10000" }
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(
            cfg.telegram.chat_ids,
            vec![
                ChatTarget::Id(123456789),
                ChatTarget::Username("@rent_alerts".into())
            ]
        );
        assert_eq!(cfg.olx.search.len(), 10);
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let yaml = r#"app:
  data_dir: "./data"
telegram:
  bot_token: "t"
  chat_ids: [1]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app.poll_interval_secs, 300);
        assert_eq!(cfg.telegram.max_attempts, 3);
        assert_eq!(cfg.telegram.initial_retry_delay_ms, 1000);
        assert_eq!(cfg.olx, Olx::default());
    }

    #[test]
    fn invalid_bot_token() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.bot_token = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("telegram.bot_token")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_chat_list_and_intervals() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.chat_ids.clear();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("chat_ids")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.poll_interval_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.max_attempts = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.olx.api_base = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_replace_token_and_chats() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_BOT_TOKEN", " from-env "),
            ("TELEGRAM_CHAT_IDS", "-100200, @flats ,,"),
        ]);
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.telegram.bot_token, "from-env");
        assert_eq!(
            cfg.telegram.chat_ids,
            vec![ChatTarget::Id(-100200), ChatTarget::Username("@flats".into())]
        );
    }

    #[test]
    fn empty_env_leaves_file_values() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        let before = cfg.clone();
        cfg.apply_overrides(|k| (k == "TELEGRAM_CHAT_IDS").then(|| " , ".to_string()));
        assert_eq!(cfg, before);
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
        assert!(cfg.default_database_url().ends_with("/data/listings.db"));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert!(!cfg.telegram.chat_ids.is_empty());
    }
}
