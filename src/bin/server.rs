use std::{
    fs::{self, OpenOptions},
    net::SocketAddr,
    path::Path,
    process::exit,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack::{AppState, AttachmentStore, Config, build_router, graceful_shutdown};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    setup_logging(&config.log_path);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(error) => {
            eprintln!("Invalid host {:?}: {error}", config.host);
            exit(1);
        }
    };

    if let Err(error) = fs::create_dir_all(&config.upload_dir) {
        eprintln!(
            "Could not create the upload directory {:?}: {error}",
            config.upload_dir
        );
        exit(1);
    }

    let connection = Connection::open(&config.db_path).unwrap_or_else(|error| {
        eprintln!("Could not open the database at {:?}: {error}", config.db_path);
        exit(1);
    });

    let state = match AppState::new(
        connection,
        &config.secret,
        &config.timezone,
        AttachmentStore::new(config.upload_dir.clone()),
    ) {
        Ok(state) => state,
        Err(error) => {
            eprintln!("Could not initialize the database: {error}");
            exit(1);
        }
    };

    let state = if config.insecure_cookies {
        tracing::warn!("Session cookies will be sent over plain HTTP.");
        state.with_insecure_cookies()
    } else {
        state
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state, "static/"));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped unexpectedly: {error}");
        exit(1);
    }
}

fn setup_logging(log_path: &Path) {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("Could not create log file {log_path:?}: {error}");
            exit(1);
        }
    };

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the handlers and the logging middleware.
        .on_failure(());

    router.layer(tracing_layer)
}
