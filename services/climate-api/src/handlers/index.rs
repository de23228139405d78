//! Front-end entry page.

use std::sync::Arc;

use axum::{extract::Extension, response::Html};
use tracing::warn;

use crate::state::AppState;

const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Temperature Explorer</title></head>
<body>
<h1>Temperature Explorer</h1>
<p>The map front end is not installed. The API is available at
<code>/api/data</code>, <code>/api/download-geotiff</code> and
<code>/api/download-pdf</code>.</p>
</body>
</html>
"#;

/// GET / - serves `index.html` from the template directory.
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    let path = state.config.frontend.template_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "index.html not found, serving fallback page");
            Html(FALLBACK_PAGE.to_string())
        }
    }
}
