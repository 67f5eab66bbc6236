// Server entry: tracing, state wiring, routes, static dashboard assets.
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use synapse_server::api;
use synapse_server::config::{load_config, Config};
use synapse_server::shutdown::shutdown_signal;
use synapse_server::state::AppState;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config();
    init_tracing(&config);

    let state = Arc::new(AppState::new(config.clone())?);

    let app = api::build_router(state.clone());
    let app = mount_dashboard(app, "web");
    let app = app
        .layer(build_cors(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = bind_address(&config);
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    info!("synapse server listening on http://{addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(err) = server.await {
        warn!("server exited abnormally: {err}");
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let default_level = config.observability.log_level.trim();
    let default_level = if default_level.is_empty() {
        "info".to_string()
    } else {
        default_level.to_lowercase()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn bind_address(config: &Config) -> String {
    // Environment overrides keep containerized deployments simple.
    let host = std::env::var("SYNAPSE_HOST").unwrap_or_else(|_| config.server.host.clone());
    let port = std::env::var("SYNAPSE_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    format!("{host}:{port}")
}

/// Serves the dashboard bundle when a `web/` directory exists next to the
/// binary. The UI is a separate deliverable, so absence is not an error.
fn mount_dashboard<S>(app: Router<S>, dir: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let path = PathBuf::from(dir);
    if path.exists() {
        let service = ServeDir::new(path).append_index_html_on_directories(true);
        app.fallback_service(service)
    } else {
        app
    }
}

fn build_cors(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config
        .cors
        .allow_origins
        .as_ref()
        .map(|value| value.iter().map(|item| item.as_str()).collect::<Vec<_>>())
    {
        Some(origins) if origins.iter().any(|value| *value == "*") => cors.allow_origin(Any),
        Some(origins) => {
            let values = origins
                .iter()
                .filter_map(|value| value.parse().ok())
                .collect::<Vec<_>>();
            if values.is_empty() {
                cors.allow_origin(Any)
            } else {
                cors.allow_origin(AllowOrigin::list(values))
            }
        }
        None => cors.allow_origin(Any),
    }
}
