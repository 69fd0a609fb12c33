use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use fincen_common::View;
use fincen_graph::DEFAULT_CONSOLE_QUERY;

use crate::components::{
    render_country_vector, render_error, render_query_console, render_statistics,
    CountryVectorData, QueryConsoleData,
};
use crate::AppState;

// --- Query structs ---

#[derive(Deserialize)]
pub struct StatisticsParams {
    year: Option<String>,
}

#[derive(Deserialize)]
pub struct CountryParams {
    name: Option<String>,
}

#[derive(Deserialize)]
pub struct ConsoleParams {
    q: Option<String>,
}

/// Blank or "all" means no year filter; anything unparsable is ignored too.
pub fn parse_year(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        .and_then(|s| s.parse().ok())
}

fn failure(view: View, message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error(view, message))).into_response()
}

// --- Views ---

pub async fn statistics_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatisticsParams>,
) -> Response {
    let year = parse_year(params.year.as_deref());
    match state.reader.country_statistics(year).await {
        Ok(view) => Html(render_statistics(view)).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load statistics");
            failure(View::Statistics, e.to_string())
        }
    }
}

pub async fn country_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountryParams>,
) -> Response {
    let countries = match state.reader.eligible_countries().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load country list");
            return failure(View::CountryVector, e.to_string());
        }
    };

    let selected = params
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| countries.first().cloned());

    let Some(country) = selected.clone() else {
        return Html(render_country_vector(CountryVectorData {
            countries,
            selected: None,
            view: None,
            yearly: Vec::new(),
        }))
        .into_response();
    };

    let view = match state.reader.project_country(&country, &countries).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, country = %country, "Failed to project country vectors");
            return failure(View::CountryVector, e.to_string());
        }
    };

    let yearly = match state.reader.transaction_counts_by_year(&country).await {
        Ok(y) => y,
        Err(e) => {
            warn!(error = %e, country = %country, "Failed to load yearly counts");
            return failure(View::CountryVector, e.to_string());
        }
    };

    Html(render_country_vector(CountryVectorData {
        countries,
        selected,
        view: Some(view),
        yearly,
    }))
    .into_response()
}

/// Ad-hoc Cypher console. Whatever the analyst submits is executed as-is,
/// with no restriction beyond the database's own permissions.
pub async fn query_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConsoleParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_else(|| DEFAULT_CONSOLE_QUERY.to_string());
    let (result, error) = match state.reader.run_raw(&query).await {
        Ok(table) => (table, None),
        Err(e) => {
            warn!(error = %e, "Console query failed");
            (None, Some(e.to_string()))
        }
    };
    Html(render_query_console(QueryConsoleData {
        query,
        result,
        error,
    }))
}
