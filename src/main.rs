use std::sync::Arc;

use danci_repeat::config::Config;
use danci_repeat::services::SessionManager;
use danci_repeat::state::AppState;
use danci_repeat::{bootstrap_database, build_app, logging};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log);

    let proxy = match bootstrap_database(&config).await {
        Ok(proxy) => proxy,
        Err(err) => {
            tracing::error!(error = %err, "database bootstrap failed");
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        proxy.clone(),
        config.revise_interval,
        config.session_stale_after,
    );
    let sessions = state.sessions();
    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "danci-repeat listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(sessions));
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    proxy.close().await;
    tracing::info!("database closed, shutdown complete");
}

/// Resolves on SIGINT or SIGTERM. Sessions are in memory only, so the number
/// of chats losing their outstanding card is logged.
async fn shutdown_signal(sessions: Arc<SessionManager>) {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    tracing::info!(
        signal = received,
        active_sessions = sessions.active_sessions(),
        "shutting down, outstanding sessions are dropped"
    );
}
