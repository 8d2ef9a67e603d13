#![allow(dead_code)]

use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use danci_repeat::config::Config;
use danci_repeat::db::config::DbConfig;
use danci_repeat::db::DatabaseProxy;
use danci_repeat::logging::LogConfig;
use danci_repeat::state::AppState;

pub const SAMPLE_WORDS: &[(&str, &str)] = &[
    ("casa", "house"),
    ("perro", "dog"),
    ("gato", "cat"),
    ("libro", "book"),
    ("agua", "water"),
    ("sol", "sun"),
];

pub struct TestEnv {
    pub dir: TempDir,
    pub config: Config,
}

pub fn test_env(words: &[(&str, &str)]) -> TestEnv {
    let dir = TempDir::new().expect("failed to create temp dir");
    let list = dir.path().join("words.csv");
    let mut file = std::fs::File::create(&list).expect("failed to create word list");
    for (text, translation) in words {
        writeln!(file, "{text},{translation}").expect("failed to write word list");
    }

    let config = Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log: LogConfig::stdout("debug"),
        word_lists: vec![list],
        revise_interval: chrono::Duration::hours(24),
        session_stale_after: chrono::Duration::minutes(30),
        db: DbConfig::at(dir.path().join("database.db")),
    };

    TestEnv { dir, config }
}

pub fn db_path(env: &TestEnv) -> PathBuf {
    env.config.db.path.clone()
}

pub async fn open_seeded(env: &TestEnv) -> Arc<DatabaseProxy> {
    danci_repeat::bootstrap_database(&env.config)
        .await
        .expect("bootstrap failed")
}

pub async fn create_test_app(env: &TestEnv) -> (Router, AppState) {
    let proxy = open_seeded(env).await;
    let state = AppState::new(
        proxy,
        env.config.revise_interval,
        env.config.session_stale_after,
    );
    (danci_repeat::build_app(state.clone()), state)
}
