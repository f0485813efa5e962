use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use launchkit_core::config::StoreBackend;
use launchkit_core::{
    Address, Error, GenerationError, OwnerId, SiteContent, SiteId, SiteRecord, share_link,
};
use launchkit_generator::Generator;
use launchkit_renderer::{
    MountOutcome, MountTicket, PreviewMount, RenderOptions, SandboxPolicy, message_page,
    render_document, shell_page,
};
use launchkit_store::{DocumentStore, Resolver, SiteStore};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::Workspace;
use crate::session;

const RELOAD_ENDPOINT: &str = "/_reload";

/// The preview mount and the record it currently shows
struct Surface {
    mount: PreviewMount,
    site: Option<SiteId>,
}

#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn DocumentStore>,
    resolver: Resolver,
    generator: Option<Generator>,
    owner: Option<OwnerId>,
    surface: Arc<Mutex<Surface>>,
    policy: SandboxPolicy,
    render_options: RenderOptions,
    base_url: String,
    reload_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn DocumentStore>,
        generator: Option<Generator>,
        owner: Option<OwnerId>,
        render_options: RenderOptions,
        base_url: String,
    ) -> Self {
        let (reload_tx, _) = broadcast::channel::<()>(100);
        Self {
            resolver: Resolver::new(backend.clone()),
            backend,
            generator,
            owner,
            surface: Arc::new(Mutex::new(Surface {
                mount: PreviewMount::new(render_options.clone()),
                site: None,
            })),
            policy: SandboxPolicy::default(),
            render_options,
            base_url,
            reload_tx,
        }
    }

    fn owner_store(&self) -> Result<(OwnerId, SiteStore), ApiError> {
        let owner = self.owner.clone().ok_or(ApiError::Unauthenticated)?;
        let store = SiteStore::for_owner(self.backend.clone(), &owner);
        Ok((owner, store))
    }

    async fn reserve(&self) -> MountTicket {
        self.surface.lock().await.mount.reserve()
    }

    /// Mount `content` for `site` and notify viewers on a fresh mount
    async fn mount(
        &self,
        ticket: MountTicket,
        site: &SiteId,
        content: &SiteContent,
    ) -> MountOutcome {
        let mut surface = self.surface.lock().await;
        let outcome = surface.mount.mount(ticket, content);
        match outcome {
            MountOutcome::Stale => {}
            MountOutcome::Unchanged => surface.site = Some(site.clone()),
            MountOutcome::Mounted { .. } => {
                surface.site = Some(site.clone());
                let _ = self.reload_tx.send(());
            }
        }
        outcome
    }

    /// Re-read the previewed record after a store change.
    ///
    /// Takes no ticket, so a request in flight still mounts its result. The
    /// re-read is dropped if anything touched the surface meanwhile.
    async fn refresh_preview(&self) {
        let (site, view) = {
            let surface = self.surface.lock().await;
            match &surface.site {
                Some(site) => (site.clone(), surface.mount.view()),
                None => return,
            }
        };
        let Ok((owner, store)) = self.owner_store() else {
            return;
        };

        let fetched = store.get(&owner, &site).await;
        let mut surface = self.surface.lock().await;
        if surface.mount.view() != view || surface.site.as_ref() != Some(&site) {
            debug!(%site, "preview changed during refresh, skipping");
            return;
        }
        match fetched {
            Ok(record) => {
                let outcome = surface.mount.refresh(view, &record.content);
                if matches!(outcome, MountOutcome::Mounted { .. }) {
                    let _ = self.reload_tx.send(());
                }
            }
            Err(Error::NotFound) => {
                surface.mount.teardown();
                surface.site = None;
                let _ = self.reload_tx.send(());
            }
            Err(e) => warn!(error = %e, %site, "preview refresh failed"),
        }
    }
}

enum ApiError {
    Unauthenticated,
    GenerationUnavailable,
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::Core(Error::Generation(err))
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound => StatusCode::NOT_FOUND,
        Error::NotPublished | Error::Permission(_) => StatusCode::FORBIDDEN,
        Error::InvalidId(_) | Error::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        Error::Generation(GenerationError::EmptyPrompt) => StatusCode::BAD_REQUEST,
        Error::Generation(_) => StatusCode::BAD_GATEWAY,
        Error::ConfigParse(_) | Error::Storage(_) | Error::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Not logged in. Run 'launchkit login <owner>' and restart the server".to_string(),
            ),
            ApiError::GenerationUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Generation is not configured".to_string(),
            ),
            ApiError::Core(err) => (status_for(&err), err.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CreateSite {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct SiteSummary {
    id: String,
    title: String,
    slug: String,
    address: String,
    link: String,
    is_published: bool,
    created_at: String,
}

impl SiteSummary {
    fn new(record: &SiteRecord, base_url: &str) -> Self {
        let address = record.address();
        Self {
            id: record.id.to_string(),
            title: record.content.title.clone(),
            slug: record.content.slug.clone(),
            link: share_link(base_url, &address),
            address: address.encode(),
            is_published: record.is_published,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

fn outcome_label(outcome: MountOutcome) -> &'static str {
    match outcome {
        MountOutcome::Mounted { .. } => "mounted",
        MountOutcome::Unchanged => "unchanged",
        MountOutcome::Stale => "stale",
    }
}

/// Start the preview and public server.
///
/// Public pages resolve through the publish gate. The owner API and the
/// preview surface act for the logged-in account, if any. With the
/// filesystem store, changes under the data directory refresh the preview.
pub async fn run(ws: &Workspace, host: Option<String>, port: Option<u16>) -> Result<()> {
    println!("🚀 Starting launchkit server...");

    let host = host.unwrap_or_else(|| ws.config.server.host.clone());
    let port = port.unwrap_or(ws.config.server.port);
    let base_url = ws
        .config
        .server
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", host, port));

    let owner = session::load(&ws.home)?.map(|s| s.owner_id);
    match &owner {
        Some(owner) => println!("   ✓ Owner: {}", owner),
        None => println!("   ⚠ Not logged in: public pages only"),
    }

    let generator = match ws.generator() {
        Ok(generator) => Some(generator),
        Err(e) => {
            println!("   ⚠ Generation disabled: {}", e);
            None
        }
    };

    let render_options = RenderOptions {
        base_href: Some(format!("{}/", base_url.trim_end_matches('/'))),
        ..ws.render_options()
    };
    let state = AppState::new(ws.backend(), generator, owner, render_options, base_url.clone());

    if ws.config.store.backend == StoreBackend::Fs {
        let data_dir = ws.config.store.data_dir.clone();
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
        println!("   ✓ Store: {}", data_dir.display());

        let watcher_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_store(data_dir, watcher_state).await {
                warn!(error = %e, "store watcher stopped");
            }
        });
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .context("Failed to bind to port")?;

    println!("\n🚀 Ready at: {}", base_url);
    println!("   Preview: {}/preview", base_url.trim_end_matches('/'));
    println!("   Press Ctrl+C to stop\n");
    info!(%host, port, "server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(preview_page))
        .route("/preview", get(preview_page))
        .route("/preview/raw", get(preview_raw))
        .route("/p/{owner}/{site}", get(public_page))
        .route("/p/{owner}/{site}/raw", get(public_raw))
        .route("/api/sites", get(list_sites).post(create_site))
        .route("/api/sites/{id}/publish", post(publish_site))
        .route("/api/sites/{id}/unpublish", post(unpublish_site))
        .route("/api/sites/{id}/preview", post(preview_site))
        .route(RELOAD_ENDPOINT, get(sse_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch the store directory and refresh the preview on changes
async fn watch_store(path: PathBuf, state: AppState) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;
    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // in-flight temp files are hidden
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    debug!(paths = ?event.paths, "store changed");
                    state.refresh_preview().await;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(()) => yield Ok(Event::default().data("reload")),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn error_page(err: &Error) -> Response {
    let (heading, detail) = match err {
        Error::NotFound | Error::InvalidId(_) => {
            ("Site not found", "No site exists at this address.".to_string())
        }
        Error::NotPublished => (
            "Not published",
            "This site is not yet published by the author.".to_string(),
        ),
        other => ("Unavailable", other.to_string()),
    };
    let status = match err {
        Error::InvalidId(_) => StatusCode::NOT_FOUND,
        other => status_for(other),
    };
    (status, Html(message_page(heading, &detail))).into_response()
}

/// Document response carrying the sandbox as a CSP header as well
fn sandboxed_document(policy: &SandboxPolicy, document: String) -> Response {
    (
        [(header::CONTENT_SECURITY_POLICY, policy.csp_header_value())],
        Html(document),
    )
        .into_response()
}

async fn resolve(
    state: &AppState,
    owner: &str,
    site: &str,
) -> Result<(Address, SiteContent), Error> {
    let address = Address::new(OwnerId::new(owner)?, SiteId::new(site)?);
    let content = state.resolver.resolve_address(&address).await?;
    Ok((address, content))
}

async fn public_page(
    State(state): State<AppState>,
    Path((owner, site)): Path<(String, String)>,
) -> Response {
    match resolve(&state, &owner, &site).await {
        Ok((address, content)) => {
            let frame = state
                .policy
                .frame_src(&format!("/{}/raw", address.encode()), &content.title);
            Html(shell_page(&content.title, &frame, None)).into_response()
        }
        Err(e) => error_page(&e),
    }
}

async fn public_raw(
    State(state): State<AppState>,
    Path((owner, site)): Path<(String, String)>,
) -> Response {
    match resolve(&state, &owner, &site).await {
        Ok((_, content)) => sandboxed_document(
            &state.policy,
            render_document(&content, &state.render_options),
        ),
        Err(e) => error_page(&e),
    }
}

async fn preview_page(State(state): State<AppState>) -> Response {
    let surface = state.surface.lock().await;
    let page = match surface.mount.current() {
        Some(mounted) => {
            let frame = state.policy.frame_src(
                &format!("/preview/raw?generation={}", mounted.generation),
                &mounted.title,
            );
            shell_page(
                &format!("{} | Preview", mounted.title),
                &frame,
                Some(RELOAD_ENDPOINT),
            )
        }
        None => shell_page(
            "Preview",
            "<p>Nothing to preview yet. Generate or select a site.</p>",
            Some(RELOAD_ENDPOINT),
        ),
    };
    Html(page).into_response()
}

async fn preview_raw(State(state): State<AppState>) -> Response {
    let surface = state.surface.lock().await;
    match surface.mount.current() {
        Some(mounted) => sandboxed_document(&state.policy, mounted.document.to_string()),
        None => (
            StatusCode::NOT_FOUND,
            Html(message_page("Nothing mounted", "Generate or select a site first.")),
        )
            .into_response(),
    }
}

async fn create_site(
    State(state): State<AppState>,
    Json(body): Json<CreateSite>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (owner, store) = state.owner_store()?;
    let generator = state
        .generator
        .as_ref()
        .ok_or(ApiError::GenerationUnavailable)?;

    let ticket = state.reserve().await;
    let content = generator.generate(&body.prompt).await?;
    let record = store.create(&owner, &body.prompt, content).await?;
    let outcome = state.mount(ticket, &record.id, &record.content).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "site": SiteSummary::new(&record, &state.base_url),
            "preview": outcome_label(outcome),
        })),
    ))
}

async fn list_sites(State(state): State<AppState>) -> Result<Json<Vec<SiteSummary>>, ApiError> {
    let (owner, store) = state.owner_store()?;
    let records = store.list(&owner).await?;
    Ok(Json(
        records
            .iter()
            .map(|r| SiteSummary::new(r, &state.base_url))
            .collect(),
    ))
}

async fn publish_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SiteSummary>, ApiError> {
    let (owner, store) = state.owner_store()?;
    let record = store.publish(&owner, &SiteId::new(id)?).await?;
    Ok(Json(SiteSummary::new(&record, &state.base_url)))
}

async fn unpublish_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SiteSummary>, ApiError> {
    let (owner, store) = state.owner_store()?;
    let record = store.unpublish(&owner, &SiteId::new(id)?).await?;
    Ok(Json(SiteSummary::new(&record, &state.base_url)))
}

async fn preview_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (owner, store) = state.owner_store()?;
    let id = SiteId::new(id)?;

    let ticket = state.reserve().await;
    let record = store.get(&owner, &id).await?;
    let outcome = state.mount(ticket, &id, &record.content).await;
    Ok(Json(json!({ "preview": outcome_label(outcome) })))
}
