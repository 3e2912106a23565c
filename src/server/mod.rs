//! Site server with live reload
//!
//! Serves the compiled content store: a document route, the index, the theme
//! toggle, and (in watch mode) a WebSocket live-reload endpoint. The store is
//! read-only during request handling; watch mode swaps in a freshly compiled
//! store wholesale.

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tower_http::compression::CompressionLayer;

use crate::render::Renderer;
use crate::shell::Shell;
use crate::store::ContentStore;
use crate::theme::{PreferenceStore, ThemeContext, ThemePreference, STORAGE_KEY};
use crate::Site;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state
struct ServerState {
    site: Site,
    store: RwLock<ContentStore>,
    renderer: Renderer,
    shell: Shell,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the site server
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let store = ContentStore::load(&site.store_dir)?;
    tracing::info!("Loaded {} documents into the content store", store.len());

    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        site: site.clone(),
        store: RwLock::new(store),
        renderer: Renderer::new(),
        shell: Shell::new()?,
        reload_tx: reload_tx.clone(),
        live_reload: watch,
    });

    let mut app = Router::new()
        .route("/", get(index_handler))
        .route("/docs/:slug", get(document_handler))
        .route("/theme/toggle", get(toggle_theme_handler))
        .route("/__livereload", get(livereload_handler))
        .with_state(state.clone());

    if site.config.compress {
        app = app.layer(CompressionLayer::new());
    }

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
        let site_clone = site.clone();
        let state_clone = state.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_and_reload(site_clone, state_clone, reload_tx).await {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch source files, recompile on change and swap the store
async fn watch_and_reload(
    site: Site,
    state: Arc<ServerState>,
    reload_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Debounce to avoid multiple rapid recompiles
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if site.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.source_dir);
    }

    let config_path = site.base_dir.join("_config.yml");
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path_str = e.path.to_string_lossy();
                        !path_str.contains(".git")
                            && !path_str.contains(".DS_Store")
                            && !path_str.ends_with('~')
                    })
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                match site.compile() {
                    Ok(_) => match ContentStore::load(&site.store_dir) {
                        Ok(new_store) => {
                            let count = new_store.len();
                            *state.store.write().await = new_store;
                            tracing::info!("Store reloaded with {} documents", count);
                            let _ = reload_tx.send(());
                        }
                        Err(e) => tracing::error!("Store reload failed: {}", e),
                    },
                    Err(e) => tracing::error!("Recompile failed: {}", e),
                }
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

/// Index route: list every document in the store
async fn index_handler(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let theme = current_theme(&headers);
    let store = state.store.read().await;

    match state
        .shell
        .index_page(&state.site.config, theme, store.documents())
    {
        Ok(page) => html_response(&state, page),
        Err(e) => server_error(e),
    }
}

/// Document route: resolve the slug, render the compiled body into the shell.
///
/// The slug from the route parameters is the source of truth; an unresolvable
/// slug yields the full-page not-found response with no partial UI.
async fn document_handler(
    Path(slug): Path<String>,
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Response {
    let theme = current_theme(&headers);
    let store = state.store.read().await;

    let doc = match store.resolve(&slug) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("{}", e);
            return not_found_response(&state, theme, &slug);
        }
    };

    let content = match state.renderer.render(&doc.body) {
        Ok(content) => content,
        Err(e) => return server_error(e.into()),
    };

    match state
        .shell
        .document_page(&state.site.config, theme, doc, &content)
    {
        Ok(page) => html_response(&state, page),
        Err(e) => server_error(e),
    }
}

/// Theme toggle route: flip the preference cookie and go back
async fn toggle_theme_handler(
    State(_state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Response {
    let mut context = ThemeContext::new(CookieStore::from_headers(&headers));
    let next = context.toggle();

    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("/")
        .to_string();

    let mut response = Redirect::to(&back).into_response();
    if let Ok(value) = HeaderValue::from_str(&theme_cookie(next)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Cookie-backed preference store for one request/response cycle
struct CookieStore {
    incoming: Option<ThemePreference>,
    outgoing: Option<ThemePreference>,
}

impl CookieStore {
    fn from_headers(headers: &HeaderMap) -> Self {
        let incoming = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_theme_cookie);
        Self {
            incoming,
            outgoing: None,
        }
    }
}

impl PreferenceStore for CookieStore {
    fn load(&self) -> Option<ThemePreference> {
        self.outgoing.or(self.incoming)
    }

    fn save(&mut self, pref: ThemePreference) {
        self.outgoing = Some(pref);
    }
}

/// Extract the theme preference from a Cookie header value
fn parse_theme_cookie(cookies: &str) -> Option<ThemePreference> {
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == STORAGE_KEY {
            ThemePreference::parse(value)
        } else {
            None
        }
    })
}

/// The theme for this request, falling back to the dark default
fn current_theme(headers: &HeaderMap) -> ThemePreference {
    ThemeContext::new(CookieStore::from_headers(headers)).current()
}

/// Build the Set-Cookie value persisting a preference
fn theme_cookie(pref: ThemePreference) -> String {
    format!(
        "{}={}; Path=/; Max-Age=31536000; SameSite=Lax",
        STORAGE_KEY,
        pref.as_str()
    )
}

fn html_response(state: &ServerState, page: String) -> Response {
    let page = if state.live_reload {
        inject_live_reload(&page)
    } else {
        page
    };
    Html(page).into_response()
}

fn not_found_response(state: &ServerState, theme: ThemePreference, slug: &str) -> Response {
    match state.shell.not_found_page(&state.site.config, theme, slug) {
        Ok(page) => {
            let page = if state.live_reload {
                inject_live_reload(&page)
            } else {
                page
            };
            (StatusCode::NOT_FOUND, Html(page)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to render not-found page: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_fresh_session_defaults_to_dark() {
        let headers = HeaderMap::new();
        assert_eq!(current_theme(&headers), ThemePreference::Dark);
    }

    #[test]
    fn test_theme_read_from_cookie() {
        let headers = headers_with_cookie("other=1; mdxdocs-theme=light");
        assert_eq!(current_theme(&headers), ThemePreference::Light);
    }

    #[test]
    fn test_garbage_cookie_falls_back_to_default() {
        let headers = headers_with_cookie("mdxdocs-theme=neon");
        assert_eq!(current_theme(&headers), ThemePreference::Dark);
    }

    #[test]
    fn test_toggle_persists_flipped_value() {
        let headers = headers_with_cookie("mdxdocs-theme=dark");
        let mut context = ThemeContext::new(CookieStore::from_headers(&headers));

        assert_eq!(context.toggle(), ThemePreference::Light);
        assert_eq!(
            context.into_store().load(),
            Some(ThemePreference::Light)
        );
    }

    #[test]
    fn test_theme_cookie_format() {
        let cookie = theme_cookie(ThemePreference::Light);
        assert!(cookie.starts_with("mdxdocs-theme=light;"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_inject_live_reload() {
        let html = "<html><body>hi</body></html>";
        let injected = inject_live_reload(html);
        assert!(injected.contains("__livereload"));
        assert!(injected.ends_with("</html>"));
    }
}
