mod server_config;
mod error;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use wealthbook::{
    analysis::{self, DeviationReport},
    backend::{self, JsonStore, LedgerStore},
    engine::{self, MonthComparison, MonthSummary},
    evolution::EvolutionSeries,
    record::Distribution,
    targets::CategoryValues,
    LedgerSnapshot,
};

use error::ServerError;
use server_config::AppConfig;

const SERVER_CONFIG: &str = "resources/server.toml";

#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
}

#[derive(Deserialize)]
struct MonthQuery {
    month: Option<String>,
}

#[derive(Deserialize)]
struct CompareQuery {
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct WindowQuery {
    window: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    summary: MonthSummary,
    annualized_return: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DistributionResponse {
    month: String,
    distribution: Distribution,
    percentages: CategoryValues,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviationsResponse {
    month: String,
    report: DeviationReport,
    recommendations: Vec<String>,
}

/// Reads the ledger from disk on every call so responses always reflect the
/// latest saved state.
fn load(state: &AppState, id: &str) -> Result<LedgerSnapshot, ServerError> {
    let path = state.config.ledger_path(id)
        .ok_or_else(|| ServerError::not_found("ledger", id))?;
    let ledger = JsonStore::new(path).read()?;
    Ok(ledger.into_snapshot())
}

fn month_or_selected(snapshot: &LedgerSnapshot, month: Option<String>) -> String {
    month.unwrap_or_else(|| snapshot.selected_month.clone())
}

async fn index() -> &'static str {
    "wealthbook"
}

async fn list_ledgers(State(state): State<AppState>) -> Json<Vec<String>> {
    let mut ids: Vec<String> = state.config.ledgers.keys().cloned().collect();
    ids.sort();
    Json(ids)
}

async fn get_ledger(State(state): State<AppState>, Path(id): Path<String>)
    -> Result<Json<LedgerSnapshot>, ServerError>
{
    Ok(Json(load(&state, &id)?))
}

async fn summary(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<MonthQuery>)
    -> Result<Json<SummaryResponse>, ServerError>
{
    let snapshot = load(&state, &id)?;
    let month = month_or_selected(&snapshot, query.month);
    Ok(Json(SummaryResponse {
        summary: engine::month_summary(&snapshot, &month),
        annualized_return: engine::annualized_return(&snapshot),
    }))
}

async fn distribution(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<MonthQuery>)
    -> Result<Json<DistributionResponse>, ServerError>
{
    let snapshot = load(&state, &id)?;
    let month = month_or_selected(&snapshot, query.month);
    let distribution = engine::distribution(&snapshot, &month);
    let percentages = distribution.percentages();
    Ok(Json(DistributionResponse { month, distribution, percentages }))
}

async fn deviations(State(state): State<AppState>, Path(id): Path<String>)
    -> Result<Json<DeviationsResponse>, ServerError>
{
    let snapshot = load(&state, &id)?;
    let report = analysis::selected_deviations(&snapshot);
    let recommendations = analysis::recommendations(&report).iter()
        .map(|recommendation| recommendation.to_string())
        .collect();
    Ok(Json(DeviationsResponse { month: snapshot.selected_month, report, recommendations }))
}

async fn compare(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<CompareQuery>)
    -> Result<Json<MonthComparison>, ServerError>
{
    let snapshot = load(&state, &id)?;
    match engine::compare_months(&snapshot, &query.from, &query.to) {
        Some(comparison) => Ok(Json(comparison)),
        None => {
            let missing = if snapshot.find_month(&query.from).is_none() { query.from } else { query.to };
            Err(ServerError::not_found("month", missing))
        },
    }
}

async fn evolution(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<WindowQuery>)
    -> Result<Json<serde_json::Value>, ServerError>
{
    let snapshot = load(&state, &id)?;
    let series = EvolutionSeries::window(&snapshot, query.window);
    let points: Vec<_> = series.iter().collect();
    Ok(Json(serde_json::to_value(points)?))
}

async fn export_csv(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<WindowQuery>)
    -> Result<impl IntoResponse, ServerError>
{
    let snapshot = load(&state, &id)?;
    let body = backend::to_csv_string(&EvolutionSeries::window(&snapshot, query.window))?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ledgers", get(list_ledgers))
        .route("/ledgers/:id", get(get_ledger))
        .route("/ledgers/:id/summary", get(summary))
        .route("/ledgers/:id/distribution", get(distribution))
        .route("/ledgers/:id/deviations", get(deviations))
        .route("/ledgers/:id/compare", get(compare))
        .route("/ledgers/:id/evolution", get(evolution))
        .route("/ledgers/:id/export.csv", get(export_csv))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wealthbook::logging::init("info,tower_http=debug");

    let config_path = std::env::var("WEALTHBOOK_CONFIG").unwrap_or_else(|_| SERVER_CONFIG.to_owned());
    let config = AppConfig::read(&config_path)
        .with_context(|| format!("failed to read app configuration from {}", config_path))?;

    let listener = tokio::net::TcpListener::bind(config.listen).await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    log::info!("serving {} ledgers on {}", config.ledgers.len(), config.listen);

    let app = router(AppState { config: Arc::new(config) });
    axum::serve(listener, app).await?;
    Ok(())
}
