use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use minijinja::context;

use crate::{
    AppState,
    content::{Landing, collections::service_by_slug},
    errors::Result,
    pages::{not_found, render},
};

/// The public landing page.
#[tracing::instrument(skip_all)]
pub async fn landing(State(state): State<AppState>) -> Result<Response> {
    let landing = Landing::load(state.store.as_ref()).await;
    render(&state, "landing.html", context! { landing })
}

/// Landing page content as JSON
///
/// Each section carries either `data` or an `error`; a failed section does not fail the page.
#[utoipa::path(
    get,
    path = "/landing",
    tag = "public",
    responses((status = 200, description = "All landing page sections", body = Landing))
)]
#[tracing::instrument(skip_all)]
pub async fn landing_json(State(state): State<AppState>) -> Json<Landing> {
    Json(Landing::load(state.store.as_ref()).await)
}

/// A service detail page, looked up by slug.
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn service_page(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    match service_by_slug(state.store.as_ref(), &slug).await? {
        Some(service) => render(&state, "service.html", context! { service }),
        None => not_found(&state, "We couldn't find that service."),
    }
}
