use std::path::PathBuf;

use snafu::{ResultExt, Snafu};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to initialize rolling file appender in {directory:?}"))]
    InitializeFileAppender {
        source: InitError,
        directory: PathBuf,
    },

    #[snafu(display("failed to install the global tracing subscriber"))]
    InstallSubscriber { source: TryInitError },
}

/// Initializes `tracing` logging with the filter from the environment
/// variable `env`, defaulting to INFO.
///
/// Logs go to stderr, as stdout carries the rendered patch. If
/// `{env}_DIRECTORY` is set, they are additionally written as JSON into
/// hourly rotated files in that directory.
pub fn initialize_logging(env: &str, app_name: &str) -> Result<(), Error> {
    let filter = EnvFilter::try_from_env(env)
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let file_appender_directory = std::env::var_os(format!("{env}_DIRECTORY")).map(PathBuf::from);
    let file_layer = file_appender_directory
        .as_deref()
        .map(|directory| {
            RollingFileAppender::builder()
                .rotation(Rotation::HOURLY)
                .filename_suffix(format!("{app_name}.log"))
                .max_log_files(6)
                .build(directory)
                .with_context(|_| InitializeFileAppenderSnafu { directory })
        })
        .transpose()?
        .map(|file_appender| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(file_appender)
        });

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context(InstallSubscriberSnafu)?;

    // need to delay logging until after tracing is initialized
    match file_appender_directory {
        Some(dir) => tracing::info!(directory = %dir.display(), "file logging enabled"),
        None => tracing::debug!("file logging disabled, because no log directory set"),
    }

    Ok(())
}
