use std::net::SocketAddr;
use std::sync::Arc;

use lingomia_backend::config::Config;
use lingomia_backend::db::Database;
use lingomia_backend::services::gateway::LlmGateway;
use lingomia_backend::state::AppState;
use lingomia_backend::{build_turn_service, create_app, logging};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let db = match Database::from_env().await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            std::process::exit(1);
        }
    };

    let gateway = LlmGateway::from_env();
    if !gateway.is_configured() {
        tracing::warn!("LLM_API_KEY not set, completion calls will fail");
    }

    let turns = Arc::new(build_turn_service(db.clone(), Arc::new(gateway)));
    let state = AppState::new(Some(db), turns);
    let app = create_app(state);

    let addr = config.bind;
    tracing::info!(%addr, "lingomia-backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
