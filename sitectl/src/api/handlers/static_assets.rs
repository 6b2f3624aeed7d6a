//! HTTP handlers for static asset serving.

use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::static_assets;

/// Serve a file embedded from the `static/` directory
#[instrument]
pub async fn serve_embedded_asset(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');
    let Some(content) = static_assets::Assets::get(path) else {
        debug!("No embedded asset at {path}");
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        content.data.into_owned(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;

    fn create_test_router() -> Router {
        Router::new().route("/static/{*path}", get(serve_embedded_asset))
    }

    #[tokio::test]
    async fn stylesheet_is_served_with_css_type() {
        let server = TestServer::new(create_test_router()).unwrap();
        let response = server.get("/static/site.css").await;

        response.assert_status_ok();
        let content_type = response.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("text/css"));
        assert!(response.text().contains(".hero"));
    }

    #[tokio::test]
    async fn missing_asset_is_404() {
        let server = TestServer::new(create_test_router()).unwrap();
        server.get("/static/nope.js").await.assert_status(StatusCode::NOT_FOUND);
    }
}
