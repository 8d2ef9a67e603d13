use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::db::config::{env_bool, env_u64};

const LOG_FILE_PREFIX: &str = "danci-repeat";
const DEFAULT_MAX_LOG_FILES: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    /// Rolling log files go here; `None` logs to stdout only.
    pub file_dir: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Rotated files kept on disk, oldest removed first.
    pub max_files: usize,
}

impl LogConfig {
    pub fn stdout(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            file_dir: None,
            rotation: LogRotation::Daily,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }

    /// File logs default to `<data_dir>/logs`, next to the database.
    pub fn from_env(data_dir: &Path) -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_dir = env_bool("ENABLE_FILE_LOGS", false).then(|| {
            std::env::var("LOG_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("logs"))
        });

        let rotation = std::env::var("LOG_ROTATION")
            .ok()
            .and_then(|v| LogRotation::parse(&v))
            .unwrap_or(LogRotation::Daily);

        Self {
            level,
            file_dir,
            rotation,
            max_files: env_u64("LOG_MAX_FILES", DEFAULT_MAX_LOG_FILES as u64).max(1) as usize,
        }
    }
}

/// Keeps the background file writer alive; dropping it flushes the log.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn init_tracing(config: &LogConfig) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    let appender = config
        .file_dir
        .as_deref()
        .and_then(|dir| match file_appender(config, dir) {
            Ok(appender) => Some(appender),
            Err(err) => {
                eprintln!("file logging disabled for {}: {err}", dir.display());
                None
            }
        });

    let Some(appender) = appender else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
        return None;
    };

    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Some(FileLogGuard { _guard: guard })
}

fn file_appender(config: &LogConfig, dir: &Path) -> Result<RollingFileAppender, String> {
    std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(config.max_files)
        .build(dir)
        .map_err(|e| e.to_string())
}
