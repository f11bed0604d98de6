use super::config::{LogFormat, LogLevel};
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log level '{input}'. Valid levels: error, warn, info, debug, trace")]
    InvalidLogLevel { input: String },

    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },

    #[error("Empty target in directive '{input}'")]
    EmptyTarget { input: String },

    #[error("Logging system initialization failed: {details}")]
    InitFailed {
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn parse_level(input: &str) -> Result<LogLevel, LoggingError> {
    match input.trim().to_lowercase().as_str() {
        "error" => Ok(LogLevel::Error),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "trace" => Ok(LogLevel::Trace),
        _ => Err(LoggingError::InvalidLogLevel {
            input: input.to_string(),
        }),
    }
}

/// Per-target level override such as `rail_log_forwarder::sender=debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(directive: &str) -> Result<Self, LoggingError> {
        let Some((target, level)) = directive.split_once('=') else {
            return Err(LoggingError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        };
        if level.contains('=') {
            return Err(LoggingError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        }

        let target = target.trim();
        if target.is_empty() {
            return Err(LoggingError::EmptyTarget {
                input: directive.to_string(),
            });
        }

        Ok(LogDirective::new(target, parse_level(level)?))
    }

    /// Parse every non-blank entry; the first malformed one fails the lot.
    pub fn parse_all<S: AsRef<str>>(directives: &[S]) -> Result<Vec<Self>, LoggingError> {
        directives
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|directive| !directive.trim().is_empty())
            .map(LogDirective::parse)
            .collect()
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str())
    }
}

/// Collects per-target directives and installs the global subscriber.
#[derive(Debug, Default)]
pub struct LoggingSystem {
    directives: Vec<LogDirective>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP and TLS plumbing stays at warn unless a later directive says otherwise.
    pub fn with_default_directives() -> Self {
        let mut logging_system = Self::new();
        for target in ["hyper", "hyper_util", "reqwest", "h2", "rustls"] {
            logging_system.add_directive(LogDirective::new(target, LogLevel::Warn));
        }
        logging_system
    }

    pub fn add_directive(&mut self, directive: LogDirective) {
        self.directives.push(directive);
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        std::iter::once(default_level.as_str().to_string())
            .chain(self.directives.iter().map(LogDirective::to_filter_string))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn initialize_tracing(
        &self,
        default_level: LogLevel,
        format: LogFormat,
    ) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| LoggingError::InitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Some(Box::new(e)),
            })?;

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = match format {
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(false)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(false)
                        .flatten_event(true),
                )
                .try_init(),
        };

        result.map_err(|e| LoggingError::InitFailed {
            details: "Failed to set global tracing subscriber".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// Install the process-wide subscriber once. Later calls report the outcome
/// of the first one.
pub fn setup_logging(
    level: LogLevel,
    format: LogFormat,
    directives: &[LogDirective],
) -> Result<(), LoggingError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = INIT.get_or_init(|| {
        let mut logging_system = LoggingSystem::with_default_directives();
        for directive in directives {
            logging_system.add_directive(directive.clone());
        }
        logging_system
            .initialize_tracing(level, format)
            .map_err(|e| e.to_string())
    });

    outcome.clone().map_err(|details| LoggingError::InitFailed {
        details,
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parse() {
        let directive = LogDirective::parse("reqwest = warning").unwrap();
        assert_eq!(directive, LogDirective::new("reqwest", LogLevel::Warn));
        assert_eq!(directive.to_filter_string(), "reqwest=warn");

        assert!(matches!(
            LogDirective::parse("reqwest"),
            Err(LoggingError::InvalidDirectiveFormat { .. })
        ));
        assert!(matches!(
            LogDirective::parse("a=b=c"),
            Err(LoggingError::InvalidDirectiveFormat { .. })
        ));
        assert!(matches!(
            LogDirective::parse("=info"),
            Err(LoggingError::EmptyTarget { .. })
        ));
        assert!(matches!(
            LogDirective::parse("hyper=loud"),
            Err(LoggingError::InvalidLogLevel { .. })
        ));
    }

    #[test]
    fn test_parse_all_skips_blank_entries() {
        let directives =
            LogDirective::parse_all(&["", "rail_log_forwarder::sender=debug", "  "]).unwrap();
        assert_eq!(
            directives,
            vec![LogDirective::new("rail_log_forwarder::sender", LogLevel::Debug)]
        );

        assert!(LogDirective::parse_all(&["h2=info", "broken"]).is_err());
    }

    #[test]
    fn test_build_filter_string() {
        assert_eq!(LoggingSystem::new().build_filter_string(LogLevel::Info), "info");

        let mut logging_system = LoggingSystem::with_default_directives();
        logging_system.add_directive(LogDirective::new("reqwest", LogLevel::Debug));
        let filter = logging_system.build_filter_string(LogLevel::Debug);

        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("rustls=warn"));
        // User directives come after the defaults so they take precedence.
        assert!(filter.ends_with("reqwest=debug"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_setup_logging_is_idempotent() {
        let first = setup_logging(LogLevel::Info, LogFormat::Compact, &[]).is_ok();
        let second = setup_logging(
            LogLevel::Debug,
            LogFormat::Json,
            &[LogDirective::new("h2", LogLevel::Trace)],
        )
        .is_ok();
        assert_eq!(first, second);
    }
}
