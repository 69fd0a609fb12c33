use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fincen_common::Config;
use fincen_graph::{DashboardReader, GraphClient};

mod components;
mod pages;
mod rest;
mod templates;

/// Shared handler state. Views keep nothing between requests.
pub struct AppState {
    pub reader: DashboardReader,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/statistics") }))
        .route("/health", get(|| async { "ok" }))
        // Dashboard views (Dioxus SSR)
        .route("/statistics", get(pages::statistics_page))
        .route("/country", get(pages::country_page))
        .route("/query", get(pages::query_page))
        // REST API
        .route("/api/countries", get(rest::api_countries))
        .route("/api/countries/{name}/vectors", get(rest::api_country_vectors))
        .route("/api/countries/{name}/years", get(rest::api_country_years))
        .route("/api/years", get(rest::api_years))
        .route("/api/statistics", get(rest::api_statistics))
        .route("/api/query", post(rest::api_query))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only; console queries travel in the query string.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fincen=info".parse()?))
        .init();

    let config = Config::from_env()?;
    let credentials = config.credentials()?;

    let client = GraphClient::connect(
        &config.neo4j_uri,
        &credentials,
        config.neo4j_max_connections,
    )
    .await?;
    info!(uri = %config.neo4j_uri, "Connected to Neo4j");

    let state = Arc::new(AppState {
        reader: DashboardReader::new(Arc::new(client), config.neighbor_limit),
    });

    let app = build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("FinCEN dashboard starting on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
