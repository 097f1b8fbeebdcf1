use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_appender::non_blocking::WorkerGuard;
use crate::config::LoggingSettings;
use crate::errors::{SimulatorError, SimulatorResult};

/// Initializes the logging system for the application
///
/// This function sets up the logging subscriber and layers based on the provided configuration
/// It supports logging to both the console and a daily rolling log file (if a directory is configured)
/// Log files are named `agrisense-sim.log.{date}` and live in the configured directory
/// The logging level is taken from the `RUST_LOG` environment variable, falling back to `settings.level`
/// The `reqwest` and `hyper` libraries are capped at "warn" to reduce noise
///
/// # Arguments
///
/// * `settings`: The logging section of the application settings
///
/// # Returns
///
/// * `Ok(Some(WorkerGuard))`: If logging is initialized with a file appender; keep the guard alive for the process lifetime
/// * `Ok(None)`: If logging is initialized without a file appender (console only)
/// * `Err(SimulatorError)`: If the filter is invalid or a global subscriber is already installed
pub fn init_logger(settings: &LoggingSettings) -> SimulatorResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},reqwest=warn,hyper=warn,hyper_util=warn", settings.level)))
        .map_err(|e| SimulatorError::LoggingError(e.to_string()))?;

    let format = fmt::format()
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    let console_layer = fmt::Layer::default()
        .event_format(format.clone().with_ansi(true))
        .with_writer(std::io::stdout);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(path) = &settings.path {
        std::fs::create_dir_all(path)?;

        let file_appender = RollingFileAppender::new(Rotation::DAILY, path, "agrisense-sim.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::Layer::default()
            .event_format(format.with_ansi(false))
            .with_writer(non_blocking);

        subscriber.with(file_layer)
            .try_init()
            .map_err(|e| SimulatorError::LoggingError(e.to_string()))?;

        tracing::info!("Logging initialized successfully ({})", path.display());
        Ok(Some(guard))
    } else {
        subscriber
            .try_init()
            .map_err(|e| SimulatorError::LoggingError(e.to_string()))?;

        tracing::info!("Logging initialized successfully (console only)");
        Ok(None)
    }
}
