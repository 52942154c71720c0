//! Development server with live reload

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::Site;

/// Port the development server listens on by default
pub const DEFAULT_PORT: u16 = 5500;

/// Script injected into served HTML; reloads the page when the site is rebuilt
const LIVE_RELOAD_SCRIPT: &str = r#"<script>
new WebSocket("ws://" + location.host + "/__livereload").onmessage = function (event) {
  if (event.data === "reload") location.reload();
};
</script>"#;

/// Server state
struct ServerState {
    output_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the development server. The site must already be built.
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        output_dir: site.output_dir.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: watch,
    });

    let app = Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let base_dir = site.base_dir.clone();
        let watched = vec![
            site.content_dir.clone(),
            site.templates_dir.clone(),
            site.config_path(),
        ];

        // The rebuild loop blocks on a std channel, keep it off the async workers
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_rebuild(&base_dir, &watched, reload_tx) {
                tracing::error!("File watcher error: {:#}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch the site sources and rebuild on every change
fn watch_and_rebuild(
    base_dir: &Path,
    watched: &[PathBuf],
    reload_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(300), tx)?;

    for path in watched {
        if !path.exists() {
            continue;
        }
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(path, mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let paths: Vec<PathBuf> = events.into_iter().map(|e| e.path).collect();
                rebuild_on_change(base_dir, &paths, &reload_tx);
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Rebuild the site after a batch of changes. Returns whether clients were
/// told to reload; a failed rebuild is logged and leaves them alone.
fn rebuild_on_change(
    base_dir: &Path,
    changed: &[PathBuf],
    reload_tx: &broadcast::Sender<()>,
) -> bool {
    let relevant: Vec<_> = changed.iter().filter(|p| is_relevant(p)).collect();
    if relevant.is_empty() {
        return false;
    }

    for path in &relevant {
        tracing::info!("File changed: {}", path.display());
    }

    // Reopen the site so config.yml edits are picked up
    match Site::new(base_dir).and_then(|site| site.build()) {
        Ok(()) => {
            tracing::info!("Rebuilt successfully");
            // No connected clients is not an error
            let _ = reload_tx.send(());
            true
        }
        Err(e) => {
            tracing::error!("Rebuild failed: {:#}", e);
            false
        }
    }
}

/// Ignore editor swap files and VCS metadata
fn is_relevant(path: &Path) -> bool {
    let hidden_vcs = path
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    !hidden_vcs && name != ".DS_Store" && !name.ends_with('~') && !name.ends_with(".swp")
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Forward rebuild notifications to one browser until either side hangs up
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            notified = reload_rx.recv() => match notified {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => {
                if matches!(incoming, None | Some(Err(_)) | Some(Ok(Message::Close(_)))) {
                    break;
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serves files, injecting the live reload script into HTML
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let Some(file_path) = resolve_path(&state.output_dir, request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    } else {
        let mut service = ServeDir::new(&state.output_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

/// Map a request path to a file under `root`; `None` for paths escaping it
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let candidate = root.join(relative);
    if candidate.is_dir() {
        Some(candidate.join("index.html"))
    } else {
        Some(candidate)
    }
}

/// Insert the live reload script before the last `</body>`, or append it
fn inject_live_reload(html: &str) -> String {
    let at = html.rfind("</body>").unwrap_or(html.len());
    let mut out = String::with_capacity(html.len() + LIVE_RELOAD_SCRIPT.len());
    out.push_str(&html[..at]);
    out.push_str(LIVE_RELOAD_SCRIPT);
    out.push_str(&html[at..]);
    out
}

/// Hand a URL to the platform's default browser
fn open_browser(url: &str) -> Result<()> {
    let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/c", "start"])
    } else {
        ("xdg-open", &[])
    };
    std::process::Command::new(program)
        .args(args)
        .arg(url)
        .spawn()
        .with_context(|| format!("Failed to run {}", program))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains("__livereload"));
        assert!(html.ends_with("</script></body></html>"));

        let bare = inject_live_reload("<p>x</p>");
        assert!(bare.starts_with("<p>x</p>"));
        assert!(bare.contains("__livereload"));
    }

    #[test]
    fn test_resolve_directory_to_index() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("hello world")).unwrap();

        assert_eq!(
            resolve_path(dir.path(), "/"),
            Some(dir.path().join("index.html"))
        );
        assert_eq!(
            resolve_path(dir.path(), "/hello%20world"),
            Some(dir.path().join("hello world").join("index.html"))
        );
        assert_eq!(
            resolve_path(dir.path(), "/static/style.css"),
            Some(dir.path().join("static/style.css"))
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_path(dir.path(), "/../secret"), None);
        assert_eq!(resolve_path(dir.path(), "/a/%2e%2e/%2e%2e/secret"), None);
    }

    #[test]
    fn test_ignored_events() {
        assert!(is_relevant(Path::new("content/posts/a/index.md")));
        assert!(is_relevant(Path::new("content/posts/using.github-actions/index.md")));
        assert!(is_relevant(Path::new("content/posts/a/notes.gitignore")));
        assert!(!is_relevant(Path::new("content/posts/a/.index.md.swp")));
        assert!(!is_relevant(Path::new("content/.git/HEAD")));
        assert!(!is_relevant(Path::new("content/posts/.DS_Store")));
    }

    #[test]
    fn test_failed_rebuild_keeps_watching() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let index = root.join("content/pages/about/index.md");
        std::fs::create_dir_all(index.parent().unwrap()).unwrap();
        std::fs::write(&index, "title: About\norder: first\n\nBody").unwrap();

        let (reload_tx, mut reload_rx) = broadcast::channel(4);
        let changed = vec![index.clone()];

        assert!(!rebuild_on_change(root, &changed, &reload_tx));
        assert!(reload_rx.try_recv().is_err());
        assert!(!root.join("output").exists());

        std::fs::write(&index, "title: About\norder: 1\n\nBody").unwrap();
        assert!(rebuild_on_change(root, &changed, &reload_tx));
        assert!(reload_rx.try_recv().is_ok());
        assert!(root.join("output/about/index.html").is_file());
    }

    #[test]
    fn test_irrelevant_changes_skip_rebuild() {
        let dir = TempDir::new().unwrap();
        let (reload_tx, mut reload_rx) = broadcast::channel(4);
        let changed = vec![dir.path().join("content/.git/index")];

        assert!(!rebuild_on_change(dir.path(), &changed, &reload_tx));
        assert!(reload_rx.try_recv().is_err());
        assert!(!dir.path().join("output").exists());
    }
}
