pub mod config;
pub mod counters;
pub mod dispatcher;
pub mod logging_system;
pub mod service;
pub mod shutdown;
pub mod status;

pub use config::{Config, ConfigError, LogFormat, LogLevel, RuntimeSettings};
pub use counters::{CountersSnapshot, ProcessedCounters};
pub use dispatcher::{
    BatchOutcome, DeployHandler, DispatchSummary, Dispatcher, DispatcherState, HttpHandler,
    StreamHandler,
};
pub use logging_system::{LogDirective, LoggingError, LoggingSystem, setup_logging};
pub use service::{ServiceManager, ServiceReport};
pub use status::StatusReporter;

use crate::domain::ForwarderError;
use anyhow::Context;
use std::process;
use tracing::{error, info};

pub struct App {
    service_manager: ServiceManager,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, ForwarderError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_config(&Config::from_args(args)?)
    }

    pub fn from_config(config: &Config) -> Result<Self, ForwarderError> {
        let settings = config.resolve()?;
        info!("Starting rail-log-forwarder v{}", env!("CARGO_PKG_VERSION"));

        Ok(Self {
            service_manager: ServiceManager::new(settings),
        })
    }

    pub async fn run(self) -> Result<ServiceReport, ForwarderError> {
        self.service_manager.run().await
    }
}

async fn start(config: Result<Config, ConfigError>) -> Result<ServiceReport, ForwarderError> {
    let app = App::from_config(&config?)?;
    app.run().await
}

/// Binary entry point. Configuration and upstream failures exit with 1;
/// signal-driven shutdown and exhausted sources return normally.
pub async fn main() -> anyhow::Result<()> {
    let config = Config::load();

    let (level, format, directives) = match &config {
        Ok(config) => (
            config.log_level,
            config.log_format,
            config.parsed_log_directives()?,
        ),
        Err(_) => (LogLevel::Info, LogFormat::default(), Vec::new()),
    };
    setup_logging(level, format, &directives).context("failed to initialise logging")?;

    match start(config).await {
        Ok(_) => Ok(()),
        Err(ForwarderError::Config(e)) => {
            error!(error = %e, "Configuration error");
            process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Log forwarder failed");
            process::exit(1);
        }
    }
}
