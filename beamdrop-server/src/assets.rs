//! Frontend assets.
//!
//! The bundled page is compiled into the binary. `server.assets_dir` swaps it
//! for a directory on disk, which is handy while editing the frontend.

use std::path::Path;

use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::services::ServeDir;

/// A file compiled into the binary
#[derive(Debug)]
pub struct Asset {
    pub path: &'static str,
    pub mime: &'static str,
    pub body: &'static [u8],
}

const EMBEDDED: &[Asset] = &[
    Asset {
        path: "index.html",
        mime: "text/html; charset=utf-8",
        body: include_bytes!("../../frontend/dist/index.html"),
    },
    Asset {
        path: "main.js",
        mime: "text/javascript; charset=utf-8",
        body: include_bytes!("../../frontend/dist/main.js"),
    },
    Asset {
        path: "style.css",
        mime: "text/css; charset=utf-8",
        body: include_bytes!("../../frontend/dist/style.css"),
    },
];

/// Find an embedded asset by request path. `/` maps to `index.html`.
pub fn lookup(path: &str) -> Option<&'static Asset> {
    let path = path.trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };
    EMBEDDED.iter().find(|asset| asset.path == path)
}

async fn serve_embedded(uri: Uri) -> Response {
    match lookup(uri.path()) {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, asset.mime),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            asset.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Fallback router serving either the embedded bundle or `dir`.
pub fn router<S>(dir: Option<&Path>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    match dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Serving assets from disk");
            Router::new().fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => Router::new().fallback(serve_embedded),
    }
}
