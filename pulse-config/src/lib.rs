//! Loader for Community Pulse configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files in the order they
//! were attached, then `PULSE__*` environment variables (`__` separates nested
//! keys, so `PULSE__OUTPUT__TWEETS` sets `output.tweets`). After merging, every
//! string value has `${VAR}` references expanded from the process environment.
//!
//! The API key defaults to `${API_KEY}`; [`PulseConfigLoader::load`] fails fast
//! when it is still unresolved after expansion.
use config::{Config, ConfigError, Environment, File};
use pulse_common::observability::{LogConfig, LogFormat};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PULSE";
pub const API_KEY_ENV: &str = "API_KEY";
pub const MAX_PAGE_SIZE: u32 = 100;
/// Roughly a century; anything longer is a typo.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

#[derive(Deserialize)]
pub struct PulseConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub api_key: String,
    #[serde(
        default = "default_community_id",
        deserialize_with = "string_or_number"
    )]
    pub community_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Length of the trailing acceptance window.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Pause between page requests.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Consecutive all-duplicate pages tolerated before collection stops.
    #[serde(default)]
    pub stale_page_tolerance: u32,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub output: OutputPaths,
    #[serde(default)]
    pub log: LogSettings,
}

// The key never reaches Debug output.
impl fmt::Debug for PulseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulseConfig")
            .field("api_key", &"<redacted>")
            .field("community_id", &self.community_id)
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("window_days", &self.window_days)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("stale_page_tolerance", &self.stale_page_tolerance)
            .field("max_pages", &self.max_pages)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("output", &self.output)
            .field("log", &self.log)
            .finish()
    }
}

impl PulseConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() || key.contains("${") || key.starts_with('$') {
            return Err(ConfigError::Message(format!(
                "missing API key: set the {API_KEY_ENV} environment variable (or {ENV_PREFIX}__API_KEY)"
            )));
        }
        if self.community_id.trim().is_empty() {
            return Err(ConfigError::Message("community_id must not be empty".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Message(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Message(format!(
                "window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                self.window_days
            )));
        }
        Ok(())
    }
}

/// Where the three snapshots are written.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputPaths {
    #[serde(default = "default_tweets_path")]
    pub tweets: PathBuf,
    #[serde(default = "default_leaderboard_path")]
    pub leaderboard: PathBuf,
    #[serde(default = "default_daily_path")]
    pub daily: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            tweets: default_tweets_path(),
            leaderboard: default_leaderboard_path(),
            daily: default_daily_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub stderr: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
            filter: default_log_filter(),
        }
    }
}

impl LogSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_community_id() -> String {
    "1951903018464772103".into()
}
fn default_base_url() -> String {
    "https://api.socialdata.tools".into()
}
fn default_page_size() -> u32 {
    50
}
fn default_window_days() -> u32 {
    60
}
fn default_page_delay_ms() -> u64 {
    3_000
}
fn default_tweets_path() -> PathBuf {
    PathBuf::from("all_tweets.json")
}
fn default_leaderboard_path() -> PathBuf {
    PathBuf::from("leaderboard.json")
}
fn default_daily_path() -> PathBuf {
    PathBuf::from("daily_stats.json")
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

/// Numeric-looking env values arrive as numbers; ids and keys stay strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        UInt(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::UInt(n) => n.to_string(),
    })
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PulseConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for PulseConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseConfigLoader {
    /// Start with defaults only; `PULSE__*` environment overrides are applied last.
    ///
    /// ```
    /// use pulse_config::PulseConfigLoader;
    ///
    /// let config = PulseConfigLoader::new()
    ///     .with_yaml_str("api_key: 'inline-key'\npage_size: 20")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.page_size, 20);
    /// assert_eq!(config.window_days, 60);
    /// assert_eq!(config.community_id, "1951903018464772103");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Override the environment prefix (tests use this to stay isolated).
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when absent, so environment-only runs work.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use pulse_config::PulseConfigLoader;
    ///
    /// let err = PulseConfigLoader::new()
    ///     .with_env_prefix("PULSE_DOCTEST_NONE")
    ///     .with_yaml_str("api_key: ''")
    ///     .load()
    ///     .unwrap_err();
    ///
    /// assert!(err.to_string().contains("missing API key"));
    /// ```
    pub fn load(self) -> Result<PulseConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        if let Value::Object(map) = &mut v {
            map.entry("api_key")
                .or_insert_with(|| Value::String(format!("${{{API_KEY_ENV}}}")));
        }
        expand_env_in_value(&mut v);

        let typed: PulseConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
