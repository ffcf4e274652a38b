//! HTML pages: store tree (`/status`) and JSON viewer (`/view-file`)
//!
//! The status page never fails: any listing error renders a diagnostic page.

use std::path::Path;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use tracing::error;
use vault_common::store::{FileKind, TreeNode};
use vault_common::PathValidator;

use super::download::FilePathQuery;
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

const PAGE_STYLE: &str = r#"
        body { font-family: 'Monaco', 'Menlo', monospace; margin: 20px; background: #f5f5f5; line-height: 1.6; }
        .header { background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .content { background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        pre { background: #f8f8f8; padding: 15px; border-radius: 5px; overflow-x: auto; font-size: 14px; }
        a { text-decoration: none; }
        a:hover { text-decoration: underline; }
        .legend { background: #e9ecef; padding: 10px; border-radius: 5px; margin-bottom: 15px; font-size: 0.9em; }
        .device { font-weight: bold; color: #007bff; }
        .date { font-weight: bold; color: #28a745; }
        .dir { font-weight: bold; }
        .audio { color: #28a745; }
        .json { color: #007bff; }
        .other, .dl { color: #6c757d; }
        .dl { font-size: 0.8em; }
        .error { background: #fff; padding: 20px; border-radius: 8px; border-left: 5px solid #dc3545; }
"#;

/// GET /status
///
/// Renders the whole store as a nested listing with view/download links.
pub async fn status_page(State(state): State<AppState>) -> Html<String> {
    let root = state.store.root().to_path_buf();

    if !root.exists() {
        return Html(format!(
            "<h2>Data folder does not exist: {}</h2>",
            escape_html(&root.display().to_string())
        ));
    }

    let lister = state.tree_lister();
    match tokio::task::spawn_blocking(move || lister.list()).await {
        Ok(Ok(devices)) => Html(render_tree_page(&devices)),
        Ok(Err(e)) => {
            error!("Status listing failed: {}", e);
            Html(render_error_page(&e.to_string(), &root))
        }
        Err(e) => {
            error!("Status listing task failed: {}", e);
            Html(render_error_page(&e.to_string(), &root))
        }
    }
}

/// GET /view-file?file_path=
///
/// Shows a stored JSON document pretty-printed.
pub async fn view_file(
    State(state): State<AppState>,
    Query(query): Query<FilePathQuery>,
) -> ApiResult<Html<String>> {
    PathValidator::check_components(&query.file_path)?;
    state.store.locate(&query.file_path)?;

    if !state.store.exists(&query.file_path).await {
        return Err(ApiError::NotFound("File not found".to_string()));
    }
    if !FileKind::from_name(&query.file_path).is_viewable() {
        return Err(ApiError::BadRequest(
            "Only JSON files can be viewed".to_string(),
        ));
    }

    let bytes = state
        .store
        .get(&query.file_path)
        .await
        .map_err(|e| ApiError::from(e).not_found_as("File not found"))?;

    let content: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::BadRequest("Invalid JSON file".to_string()))?;
    let pretty = serde_json::to_string_pretty(&content)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let file_name = query
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(&query.file_path);

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{name} - WatchMe Vault</title>
    <style>{style}</style>
</head>
<body>
    <div class="header">
        <h2>📄 {name}</h2>
        <p><strong>File path:</strong> {path}</p>
        <a href="/status">← Back to listing</a>
    </div>
    <div class="content">
        <h3>Content:</h3>
        <pre>{content}</pre>
    </div>
</body>
</html>
"#,
        name = escape_html(file_name),
        style = PAGE_STYLE,
        path = escape_html(&query.file_path),
        content = escape_html(&pretty),
    )))
}

fn render_tree_page(devices: &[TreeNode]) -> String {
    let mut lines = Vec::new();

    for device in devices {
        lines.push(format!(
            r#"📱 <span class="device">{}/</span>"#,
            escape_html(&device.name)
        ));
        for date in &device.children {
            lines.push(format!(
                r#"  📅 <span class="date">{}/</span>"#,
                escape_html(&date.name)
            ));
            render_level(&date.children, 2, &mut lines);
            lines.push(String::new());
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>WatchMe Vault - Data listing</title>
    <style>{style}</style>
</head>
<body>
    <div class="header">
        <h2>🗂️ WatchMe Vault - Data listing</h2>
        <div class="legend">
            <strong>Usage:</strong>
            🎵 WAV files (click to download) |
            📄 JSON files (click to view, [DL] to download)
        </div>
    </div>
    <div class="content">
<pre>
{body}
</pre>
    </div>
</body>
</html>
"#,
        style = PAGE_STYLE,
        body = lines.join("\n"),
    )
}

fn render_level(nodes: &[TreeNode], indent: usize, lines: &mut Vec<String>) {
    let pad = "    ".repeat(indent);

    for node in nodes {
        let name = escape_html(&node.name);
        let Some(kind) = node.file_kind() else {
            lines.push(format!(r#"{}📂 <span class="dir">{}/</span>"#, pad, name));
            render_level(&node.children, indent + 1, lines);
            continue;
        };

        let encoded = urlencoding::encode(&node.relative_path);
        let download = format!("/download-file?file_path={}", encoded);
        let link = match kind {
            FileKind::Audio => format!(
                r#"<a href="{}" class="audio" title="Download WAV file">🎵 {}</a>"#,
                download, name
            ),
            FileKind::Json => format!(
                r#"<a href="/view-file?file_path={}" class="json" title="View JSON file">📄 {}</a> <a href="{}" class="dl" title="Download">[DL]</a>"#,
                encoded, name, download
            ),
            FileKind::Other => format!(
                r#"<a href="{}" class="other" title="Download file">📄 {}</a>"#,
                download, name
            ),
        };
        lines.push(format!("{}{}", pad, link));
    }
}

fn render_error_page(message: &str, root: &Path) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>WatchMe Vault - Error</title>
    <style>{style}</style>
</head>
<body>
    <div class="error">
        <h2>🚨 /status error</h2>
        <p><strong>Details:</strong> {message}</p>
        <p><strong>Base directory:</strong> {root}</p>
        <p><strong>Base directory exists:</strong> {exists}</p>
        <hr>
        <p><a href="/status">Retry</a></p>
    </div>
</body>
</html>
"#,
        style = PAGE_STYLE,
        message = escape_html(message),
        root = escape_html(&root.display().to_string()),
        exists = root.exists(),
    )
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build HTML page routes
pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status_page))
        .route("/view-file", get(view_file))
}
