use std::env;
use std::io;
use tracing_subscriber::EnvFilter;

pub const LOG_OUTPUT_ENV: &str = "CHANFLOW_LOG_OUTPUT";
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoggingError {
    #[error("invalid log output {0:?}: expected \"stdout\" or \"stderr\"")]
    InvalidOutput(String),
    #[error("logging already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingOutput {
    Stdout,
    Stderr,
}

impl LoggingOutput {
    fn parse(raw: &str) -> Result<Self, LoggingError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LoggingOutput::Stdout),
            "stderr" => Ok(LoggingOutput::Stderr),
            _ => Err(LoggingError::InvalidOutput(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub filter: String,
    pub output: LoggingOutput,
}

impl LoggingConfig {
    /// `RUST_LOG` picks the filter, [`LOG_OUTPUT_ENV`] the output.
    pub fn from_env() -> Result<Self, LoggingError> {
        let filter = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
        let output = match env::var(LOG_OUTPUT_ENV) {
            Ok(raw) => LoggingOutput::parse(&raw)?,
            Err(_) => LoggingOutput::Stderr,
        };
        Ok(Self { filter, output })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            output: LoggingOutput::Stderr,
        }
    }
}

pub fn init_logging(cfg: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&cfg.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match cfg.output {
        LoggingOutput::Stdout => builder.with_writer(io::stdout).try_init(),
        LoggingOutput::Stderr => builder.with_writer(io::stderr).try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInitialized)
}
