//! Server-rendered HTML: the public landing site and the admin console screens.
//!
//! - [`site`]: `/` and `/service/{slug}`
//! - [`admin`]: login, invitation acceptance and the role-gated admin screens
//!
//! Editing in the admin screens goes through the JSON API; the screens list the stored content
//! and carry the hooks `static/admin.js` attaches to.

pub mod admin;
pub mod site;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use minijinja::{Value, context};

use crate::{AppState, errors::Result, templates};

/// Context shared by every page.
fn base_context(state: &AppState) -> Value {
    context! { site => &state.config.site }
}

pub(crate) fn render(state: &AppState, name: &str, context: Value) -> Result<Response> {
    let context = context! { ..base_context(state), ..context };
    Ok(templates::render(&state.templates, name, context)?.into_response())
}

pub(crate) fn not_found(state: &AppState, message: &str) -> Result<Response> {
    let page = render(state, "not_found.html", context! { message })?;
    Ok((StatusCode::NOT_FOUND, page).into_response())
}

/// Any path no route claims.
pub async fn fallback(State(state): State<AppState>) -> Result<Response> {
    not_found(&state, "We couldn't find that page.")
}
