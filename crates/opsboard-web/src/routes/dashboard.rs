//! Dashboard route handler.
//!
//! Serves the embedded dashboard page, a browser client of `/ws`.

use axum::response::{Html, IntoResponse};

const DASHBOARD_HTML: &str = include_str!("../../../../assets/web/index.html");

/// GET / - Serve the dashboard.
pub async fn index() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}
