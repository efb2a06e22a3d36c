//! Logging configuration and subscriber setup.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to
//! binaries through [`setup::init_logging`]. Uploaded content (file names,
//! extracted text, cell values) can be large or sensitive, so the processing
//! layer routes it through [`LogConfig`] and [`truncate_field`].

use tracing::Level;

/// Controls how much of the processing pipeline is logged.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for docsight components
    pub base_level: Level,
    /// Log blob fetches, parses and persistence
    pub log_data_operations: bool,
    /// Include previews of extracted text and cell values
    pub log_content_previews: bool,
    /// Maximum length for logged field values
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_data_operations: true,
            log_content_previews: false,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Everything, with long previews.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_data_operations: true,
            log_content_previews: true,
            max_field_length: 1024,
        }
    }

    /// Warnings only and no uploaded content in the logs.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_data_operations: false,
            log_content_previews: false,
            max_field_length: 128,
        }
    }

    /// Truncates `value` to this configuration's field length.
    pub fn field(&self, value: &str) -> String {
        truncate_field(value, self.max_field_length)
    }
}

/// Debug logging gated on the configured base level.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Info logging for data operations, gated on `log_data_operations`.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes on a character boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber installation for binaries and tests.
pub mod setup {
    use tracing::Level;

    use crate::error::{DocsightError, Result};

    /// Configuration for the global subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside docsight
        pub level: Level,
        /// Log level for docsight itself
        pub docsight_level: Level,
        /// Emit JSON lines instead of human-readable output
        pub json_format: bool,
        /// Write to stderr so stdout stays free for command output
        pub stderr: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                docsight_level: Level::INFO,
                json_format: false,
                stderr: true,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON output at info level.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                docsight_level: Level::INFO,
                json_format: true,
                stderr: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                docsight_level: Level::DEBUG,
                json_format: false,
                stderr: true,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_docsight_level(mut self, level: Level) -> Self {
            self.docsight_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},docsight={}",
                    self.level.as_str().to_lowercase(),
                    self.docsight_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured filter. Fails if a
    /// subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use docsight::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = match (config.json_format, config.stderr) {
            (true, true) => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed(),
            (true, false) => tracing_subscriber::fmt::layer().json().boxed(),
            (false, true) => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed(),
            (false, false) => tracing_subscriber::fmt::layer().boxed(),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| DocsightError::Configuration(format!("failed to install subscriber: {e}")))
    }
}
