use super::{ConfigError, LogFormat, LogLevel};
use crate::app::logging_system::{LogDirective, LoggingError};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Destination webhook URL (https:// is assumed when no scheme is given)
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Payload format: json, jsonl, papertrail, loki, datadog, axiom, betterstack or sentry
    #[arg(long, env = "WEBHOOK_MODE", default_value = "json")]
    pub webhook_mode: String,

    /// Extra request headers as Key:Value pairs separated by commas
    #[arg(long, env = "ADDITIONAL_HEADERS", value_delimiter = ',')]
    pub additional_headers: Vec<String>,

    /// Minimum severity of forwarded deploy logs
    #[arg(long, env = "MIN_SEVERITY", default_value = "debug")]
    pub min_severity: String,

    /// Regular expressions; when non-empty a message must match one of them.
    /// Repeat the flag, or put one pattern per line in the environment variable
    #[arg(long, env = "WHITELIST", value_delimiter = '\n')]
    pub whitelist: Vec<String>,

    /// Regular expressions; a message matching any of them is dropped.
    /// Repeat the flag, or put one pattern per line in the environment variable
    #[arg(long, env = "BLACKLIST", value_delimiter = '\n')]
    pub blacklist: Vec<String>,

    /// Interval between status reports in seconds
    #[arg(long, env = "REPORT_STATUS_EVERY_SECS", default_value = "60")]
    pub report_status_every_secs: u64,

    /// Forward deploy logs
    #[arg(
        long,
        env = "ENABLE_DEPLOY_LOGS",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_deploy_logs: bool,

    /// Forward HTTP logs
    #[arg(
        long,
        env = "ENABLE_HTTP_LOGS",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_http_logs: bool,

    /// Deploy log batches, one JSON array per line ("-" reads stdin)
    #[arg(long, env = "DEPLOY_LOGS_SOURCE", default_value = "-")]
    pub deploy_logs_source: PathBuf,

    /// HTTP log batches, one JSON array per line
    #[arg(long, env = "HTTP_LOGS_SOURCE")]
    pub http_logs_source: Option<PathBuf>,

    /// Log level of the forwarder itself
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Output format of the forwarder's own logs
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Per-target overrides of the log level, e.g. rail_log_forwarder::sender=debug
    #[arg(long, env = "LOG_DIRECTIVES", value_delimiter = ',')]
    pub log_directives: Vec<String>,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_mode: "json".to_string(),
            additional_headers: Vec::new(),
            min_severity: "debug".to_string(),
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            report_status_every_secs: 60,
            enable_deploy_logs: true,
            enable_http_logs: false,
            deploy_logs_source: PathBuf::from("-"),
            http_logs_source: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            log_directives: Vec::new(),
            config_file: None,
        }
    }
}

impl Config {
    /// Parse the process arguments and environment, then merge the config file.
    /// Exits the process on `--help`, `--version` and argument errors.
    pub fn load() -> Result<Self, ConfigError> {
        Config::parse().finish()
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?
            .finish()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parsed_log_directives(&self) -> Result<Vec<LogDirective>, LoggingError> {
        LogDirective::parse_all(&self.log_directives)
    }

    fn finish(self) -> Result<Self, ConfigError> {
        let config = match self.config_file.clone() {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                let base: Config = toml::from_str(&content)?;
                self.overlay(base)
            }
            None => self,
        };
        config.validate()?;
        Ok(config)
    }

    /// Values given on the command line or in the environment win over the
    /// file; anything left at its default falls back to the file's value.
    fn overlay(self, base: Config) -> Config {
        let defaults = Config::default();

        macro_rules! pick {
            ($field:ident) => {
                if self.$field != defaults.$field {
                    self.$field
                } else {
                    base.$field
                }
            };
        }

        Config {
            webhook_url: self.webhook_url.or(base.webhook_url),
            http_logs_source: self.http_logs_source.or(base.http_logs_source),
            webhook_mode: pick!(webhook_mode),
            additional_headers: pick!(additional_headers),
            min_severity: pick!(min_severity),
            whitelist: pick!(whitelist),
            blacklist: pick!(blacklist),
            report_status_every_secs: pick!(report_status_every_secs),
            enable_deploy_logs: pick!(enable_deploy_logs),
            enable_http_logs: pick!(enable_http_logs),
            deploy_logs_source: pick!(deploy_logs_source),
            log_level: pick!(log_level),
            log_format: pick!(log_format),
            log_directives: pick!(log_directives),
            config_file: self.config_file,
        }
    }
}
