//! Preview server with background revalidation
//!
//! Serves the generated tree. Post pages older than `revalidate_secs` are
//! served as they are while a background task renders them again; posts that
//! were never generated are rendered on demand before responding. Listing
//! continuation pages are rendered from live data on every request.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cache::{unix_now, CacheDb};
use crate::cms::ContentSource;
use crate::generator::Generator;
use crate::helpers::{listing_route, post_route, url_for};
use crate::Blog;

/// Server state
pub struct ServerState {
    blog: Blog,
    generator: Generator,
    cache: Mutex<CacheDb>,
    /// Uids with a background render in progress
    regenerating: Mutex<HashSet<String>>,
    revalidate: bool,
}

impl ServerState {
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>, revalidate: bool) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            generator: Generator::new(blog, source)?,
            cache: Mutex::new(CacheDb::load(&blog.base_dir)),
            regenerating: Mutex::new(HashSet::new()),
            blog: blog.clone(),
            revalidate,
        }))
    }
}

/// Start the preview server
pub async fn start(blog: &Blog, ip: &str, port: u16, revalidate: bool) -> Result<()> {
    let state = ServerState::new(blog, blog.source()?, revalidate)?;
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    if revalidate {
        println!(
            "Post pages are revalidated every {}s.",
            blog.config.revalidate_secs
        );
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes over a prepared state
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = &state.blog.public_dir;
    let static_files = ServeDir::new(public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/posts/:uid", get(post_handler))
        .route("/posts/:uid/", get(post_handler))
        .route("/page/:page", get(listing_handler))
        .route("/page/:page/", get(listing_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn post_handler(State(state): State<Arc<ServerState>>, Path(uid): Path<String>) -> Response {
    if matches!(uid.as_str(), "" | "." | "..") {
        return not_found(&state);
    }

    let path = state.generator.post_path(&uid);
    if let Ok(html) = tokio::fs::read_to_string(&path).await {
        if state.revalidate {
            let stale = state.cache.lock().await.is_stale(
                &uid,
                unix_now(),
                state.blog.config.revalidate_secs,
            );
            if stale {
                spawn_regeneration(Arc::clone(&state), uid);
            }
        }
        return Html(html).into_response();
    }

    tracing::info!("Rendering {} on demand", uid);
    match state.generator.generate_post(&uid).await {
        Ok(Some(rendered)) => {
            record(&state, |cache| rendered.record(cache, unix_now())).await;
            match tokio::fs::read_to_string(&path).await {
                Ok(html) => Html(html).into_response(),
                Err(e) => {
                    tracing::error!("Failed to read {:?}: {}", path, e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        Ok(None) => not_found(&state),
        Err(e) => {
            tracing::warn!("Failed to render {}: {:#}", uid, e);
            let retry = url_for(&state.blog.config, &post_route(&uid));
            bad_gateway(&state, Some(&retry))
        }
    }
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    Path(page): Path<usize>,
) -> Response {
    match state.generator.render_listing(page).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => not_found(&state),
        Err(e) => {
            tracing::warn!("Failed to load listing page {}: {:#}", page, e);
            let retry = url_for(&state.blog.config, &listing_route(page));
            bad_gateway(&state, Some(&retry))
        }
    }
}

/// Render `uid` again in the background unless a render is already running
fn spawn_regeneration(state: Arc<ServerState>, uid: String) {
    tokio::spawn(async move {
        if !state.regenerating.lock().await.insert(uid.clone()) {
            return;
        }

        tracing::info!("Revalidating {}", uid);
        match state.generator.generate_post(&uid).await {
            Ok(Some(rendered)) => {
                record(&state, |cache| rendered.record(cache, unix_now())).await;
            }
            Ok(None) => {
                let mut cache = state.cache.lock().await;
                if let Err(e) = state.generator.remove_post(&uid, &mut cache) {
                    tracing::warn!("Failed to remove {}: {:#}", uid, e);
                }
                save(&state, &cache);
            }
            // The stale page keeps being served; the next request tries again
            Err(e) => tracing::warn!("Failed to revalidate {}: {:#}", uid, e),
        }

        state.regenerating.lock().await.remove(&uid);
    });
}

async fn record(state: &ServerState, update: impl FnOnce(&mut CacheDb)) {
    let mut cache = state.cache.lock().await;
    update(&mut cache);
    save(state, &cache);
}

fn save(state: &ServerState, cache: &CacheDb) {
    if let Err(e) = cache.save(&state.blog.base_dir) {
        tracing::warn!("Failed to save cache: {:#}", e);
    }
}

fn not_found(state: &ServerState) -> Response {
    page(StatusCode::NOT_FOUND, state.generator.render_not_found())
}

fn bad_gateway(state: &ServerState, retry_url: Option<&str>) -> Response {
    page(StatusCode::BAD_GATEWAY, state.generator.render_error(retry_url))
}

fn page(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {:#}", e);
            status.into_response()
        }
    }
}
