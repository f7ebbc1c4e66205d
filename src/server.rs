//! HTTP surface of `serve`.
//!
//! Every page load runs one render cycle. The analytics cache inside the
//! shared [`Dashboard`] is the only state that outlives a request.

use crate::analytics::connect::ConnectClient;
use crate::dashboard::Dashboard;
use crate::models::ReportSnapshot;
use crate::outputs::html::HtmlSink;
use crate::scrapers::calendar::CalendarScraper;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

pub type LiveDashboard = Dashboard<ConnectClient, CalendarScraper>;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<LiveDashboard>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/report", get(report))
        .with_state(state)
}

/// Authors selected through repeated `author=` query parameters.
pub fn selected_authors(query: Option<&str>) -> Vec<String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, value)| key == "author" && !value.is_empty())
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[instrument(level = "info", skip_all)]
async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, StatusCode> {
    let requested = selected_authors(query.as_deref());
    let config = state.dashboard.config();
    let mut sink = HtmlSink::new(&config.page_title, config.refresh_secs, requested);

    state.dashboard.render(&mut sink, Local::now()).await;
    sink.finish().map(Html).map_err(|e| {
        error!(error = %e, "Failed to render dashboard page");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[instrument(level = "info", skip_all)]
async fn report(State(state): State<AppState>, RawQuery(query): RawQuery) -> Json<ReportSnapshot> {
    let authors = selected_authors(query.as_deref());
    let data = state.dashboard.collect().await;
    Json(data.snapshot(&authors, Local::now()))
}

pub async fn run_server(state: AppState, port: u16) -> Result<(), Box<dyn Error>> {
    let app = router(state);
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await?;

    info!(address = %addr, "Dashboard server started");
    axum::serve(listener, app).await?;
    Ok(())
}
