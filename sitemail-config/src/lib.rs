//! Loader for sitemail configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added; `SITEMAIL__`-prefixed
//! environment variables are always applied last, with `__` separating
//! nested keys (`SITEMAIL__BROWSER__HEADLESS=false`). String values may
//! reference other environment variables as `${VAR}`.
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use sitemail_common::observability::{LogConfig, LogFormat};
use sitemail_common::{BrowserSettings, ScrapeSettings};
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SitemailConfig {
    pub version: Option<String>,
    pub browser: BrowserSettings,
    pub scrape: ScrapeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub filter: String,
    /// Mirror log events to stderr.
    pub stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: "info".to_string(),
            stderr: false,
        }
    }
}

impl LoggingSettings {
    pub fn log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
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

/// Builder hiding the `config` crate wiring.
pub struct SitemailConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SitemailConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SitemailConfigLoader {
    /// Start with no files; built-in defaults apply to anything left unset.
    ///
    /// ```
    /// use sitemail_config::SitemailConfigLoader;
    ///
    /// let config = SitemailConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.browser.navigation_timeout_secs, 30);
    /// assert_eq!(config.scrape.contact_paths.len(), 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format follows the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use sitemail_common::StealthLevel;
    /// use sitemail_config::SitemailConfigLoader;
    ///
    /// let cfg = SitemailConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// browser:
    ///   headless: false
    ///   stealth: maximum
    /// scrape:
    ///   contact_paths: ["/kontakt"]
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!cfg.browser.headless);
    /// assert_eq!(cfg.browser.stealth, StealthLevel::Maximum);
    /// assert_eq!(cfg.scrape.contact_paths, vec!["/kontakt".to_string()]);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, apply `SITEMAIL__` overrides, expand `${VAR}`
    /// placeholders and deserialize into [`SitemailConfig`].
    pub fn load(self) -> Result<SitemailConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("SITEMAIL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
