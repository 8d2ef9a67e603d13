use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;

use crate::db::config::{env_bool, env_i64, DbConfig};
use crate::logging::LogConfig;
use crate::services::interval::DEFAULT_REVISE_INTERVAL_HOURS;
use crate::services::session::DEFAULT_STALE_AFTER_MINUTES;

const DEFAULT_WORD_LISTS: &[&str] = &["words1.csv", "words2.csv", "words3.csv"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log: LogConfig,
    pub word_lists: Vec<PathBuf>,
    pub revise_interval: Duration,
    pub session_stale_after: Duration,
    pub db: DbConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let data_dir = std::env::var("DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                if env_bool("DOCKER", false) {
                    PathBuf::from("/data")
                } else {
                    PathBuf::from("./data")
                }
            });

        let word_lists = match std::env::var("WORD_LISTS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            Err(_) => DEFAULT_WORD_LISTS
                .iter()
                .map(|name| data_dir.join(name))
                .collect(),
        };

        let revise_hours = env_i64("REVISE_INTERVAL_HOURS", DEFAULT_REVISE_INTERVAL_HOURS).max(1);
        let stale_minutes = env_i64("SESSION_STALE_MINUTES", DEFAULT_STALE_AFTER_MINUTES).max(1);

        let db = DbConfig::from_env(&data_dir);
        let log = LogConfig::from_env(&data_dir);

        Self {
            host,
            port,
            log,
            word_lists,
            revise_interval: Duration::hours(revise_hours),
            session_stale_after: Duration::minutes(stale_minutes),
            db,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
