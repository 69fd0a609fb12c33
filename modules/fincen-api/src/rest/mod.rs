use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use crate::pages::parse_year;
use crate::AppState;

// --- Query structs ---

#[derive(Deserialize)]
pub struct StatisticsQuery {
    year: Option<String>,
}

#[derive(Deserialize)]
pub struct ConsoleBody {
    query: String,
}

// --- Helpers ---

fn server_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

// --- Handlers ---

pub async fn api_countries(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.reader.eligible_countries().await {
        Ok(countries) => Json(countries).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load countries");
            server_error(e.to_string())
        }
    }
}

pub async fn api_country_vectors(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.reader.country_vector_view(&name).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            warn!(error = %e, country = %name, "Failed to load country vectors");
            server_error(e.to_string())
        }
    }
}

pub async fn api_country_years(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.reader.transaction_counts_by_year(&name).await {
        Ok(counts) => Json(counts).into_response(),
        Err(e) => {
            warn!(error = %e, country = %name, "Failed to load yearly counts");
            server_error(e.to_string())
        }
    }
}

pub async fn api_years(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.reader.filing_years().await {
        Ok(years) => Json(years).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load filing years");
            server_error(e.to_string())
        }
    }
}

pub async fn api_statistics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatisticsQuery>,
) -> impl IntoResponse {
    let year = parse_year(params.year.as_deref());
    match state.reader.country_statistics(year).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load statistics");
            server_error(e.to_string())
        }
    }
}

/// Runs the posted Cypher verbatim. There is no auth or read-only guard here;
/// anyone who can reach the port has the dashboard's database access.
pub async fn api_query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConsoleBody>,
) -> impl IntoResponse {
    match state.reader.run_raw(&body.query).await {
        Ok(table) => Json(table).into_response(),
        Err(e) => {
            warn!(error = %e, "Console query failed");
            server_error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use fincen_common::Record;
    use fincen_graph::reader::queries;
    use fincen_graph::testutil::StubGateway;
    use fincen_graph::DashboardReader;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::build_router;

    fn app(stub: StubGateway) -> (Arc<StubGateway>, axum::Router) {
        let stub = Arc::new(stub);
        let state = Arc::new(AppState {
            reader: DashboardReader::new(stub.clone(), 15),
        });
        (stub, build_router(state))
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_query(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "query": query }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn countries_are_listed() {
        let stub = StubGateway::new().with_rows(
            queries::ELIGIBLE_COUNTRIES,
            vec![Record::new().with("name", "Cyprus"), Record::new().with("name", "Latvia")],
        );
        let (_, app) = app(stub);
        let (status, body) = send(app, get("/api/countries")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["Cyprus", "Latvia"]));
    }

    #[tokio::test]
    async fn ineligible_country_vectors_are_empty() {
        let (_, app) = app(StubGateway::new());
        let (status, body) = send(app, get("/api/countries/Belize/vectors")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["country"], "Belize");
        assert_eq!(body["eligible"], false);
        assert_eq!(body["projections"], json!([]));
    }

    #[tokio::test]
    async fn statistics_accept_year_filter() {
        let stub = StubGateway::new()
            .with_rows(
                queries::FILING_YEARS,
                vec![Record::new().with("year", 2011), Record::new().with("year", 2014)],
            )
            .with_rows(
                queries::FILING_AMOUNTS_IN_YEAR,
                vec![Record::new()
                    .with("country", "Latvia")
                    .with("amount", 120.5)
                    .with("year", 2013)],
            );
        let (_, app) = app(stub);
        let (status, body) = send(app, get("/api/statistics?year=2013")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["year"], 2013);
        assert_eq!(body["years"], json!([2014, 2011]));
        assert_eq!(body["totals"][0]["country"], "Latvia");
        assert_eq!(body["totals"][0]["filing_count"], 1);
    }

    #[tokio::test]
    async fn query_returns_table() {
        let stub = StubGateway::new().with_rows(
            "MATCH (c:Country) RETURN c.name AS name",
            vec![Record::new().with("name", "Latvia")],
        );
        let (_, app) = app(stub);
        let (status, body) = send(app, post_query("MATCH (c:Country) RETURN c.name AS name")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["name"]));
        assert_eq!(body["rows"], json!([["Latvia"]]));
    }

    #[tokio::test]
    async fn blank_query_returns_null_without_calling_store() {
        let (stub, app) = app(StubGateway::new());
        let (status, body) = send(app, post_query("  ")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_reported_as_json() {
        let (_, app) = app(StubGateway::new().with_error("MATCH (", "Invalid input"));
        let (status, body) = send(app, post_query("MATCH (")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Neo4j error: Invalid input");
    }
}
