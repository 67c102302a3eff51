use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::{ArgAction, Args, Parser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

// config, physics and render also carry generator-only items.
#[path = "../config.rs"]
#[allow(dead_code)]
mod config;
#[path = "../error.rs"]
mod error;
#[path = "../logging.rs"]
mod logging;
#[path = "../page.rs"]
mod page;
#[path = "../physics.rs"]
#[allow(dead_code)]
mod physics;
#[path = "../render.rs"]
#[allow(dead_code)]
mod render;
#[path = "../selector.rs"]
mod selector;

use config::BeamConfig;
use error::RenderError;
use render::render_mode_png;
use selector::{Mode, PageView, Selection};

#[derive(Debug, Clone, Args)]
struct ServeConfig {
    #[arg(long, env = "GAUSS_MODES_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
    /// Directory holding HG/ and LG/ image folders
    #[arg(long, env = "GAUSS_MODES_IMG_DIR", default_value = "img")]
    img_dir: PathBuf,
    /// Render images that are missing from img_dir on first request
    #[arg(
        long,
        env = "GAUSS_MODES_RENDER_MISSING",
        default_value_t = true,
        action = ArgAction::Set
    )]
    render_missing: bool,
}

#[derive(Debug, thiserror::Error)]
enum ServeError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server stopped: {0}")]
    Serve(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Parser)]
#[command(name = "web", version, about = "Serve the Gaussian beam mode gallery")]
struct Cli {
    #[command(flatten)]
    serve: ServeConfig,
    #[command(flatten)]
    beam: BeamConfig,
}

#[derive(Clone)]
struct AppState {
    img_dir: Arc<PathBuf>,
    render_missing: bool,
    beam: Arc<BeamConfig>,
}

/// Images rendered on a miss. Files read from `img_dir` are never cached.
static IMAGE_CACHE: Lazy<RwLock<HashMap<Selection, Bytes>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static IMAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)_([0-9]+)\.png$").expect("image name pattern"));

async fn index(RawQuery(query): RawQuery) -> impl IntoResponse {
    let selection = selector::parse(query.as_deref());
    debug!(%selection, "page");
    Html(page::render_html(&selector::view(selection)))
}

async fn api_view(RawQuery(query): RawQuery) -> Json<PageView> {
    Json(selector::view(selector::parse(query.as_deref())))
}

async fn image(State(state): State<AppState>, Path((mode, file)): Path<(String, String)>) -> Response {
    let Some(selection) = image_selection(&mode, &file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match load_image(&state, selection).await {
        Ok(Some(bytes)) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!(%selection, "image failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `HG` + `3_7.png` -> HG_3_7, with the same bounds as the page query.
fn image_selection(mode: &str, file: &str) -> Option<Selection> {
    let mode = Mode::from_tag(mode)?;
    let caps = IMAGE_NAME.captures(file)?;
    let i = selector::parse_index(caps.get(1)?.as_str())?;
    let j = selector::parse_index(caps.get(2)?.as_str())?;
    Selection::new(mode, i, j)
}

/// Disk first, so a file written after startup replaces a rendered fallback.
async fn load_image(state: &AppState, selection: Selection) -> Result<Option<Bytes>, ServeError> {
    let path = state
        .img_dir
        .join(selection.mode().as_str())
        .join(selection.file_name());
    if let Some(bytes) = tokio::task::spawn_blocking(move || read_image(path)).await?? {
        return Ok(Some(Bytes::from(bytes)));
    }

    if let Some(cached) = IMAGE_CACHE
        .read()
        .ok()
        .and_then(|cache| cache.get(&selection).cloned())
    {
        return Ok(Some(cached));
    }
    if !state.render_missing {
        return Ok(None);
    }

    info!(%selection, "rendering missing image");
    let beam = state.beam.clone();
    let rendered = tokio::task::spawn_blocking(move || {
        render_mode_png(&beam, selection.mode(), selection.i(), selection.j())
    })
    .await??;
    let bytes = Bytes::from(rendered);
    if let Ok(mut cache) = IMAGE_CACHE.write() {
        cache.insert(selection, bytes.clone());
    }
    Ok(Some(bytes))
}

/// `Ok(None)` when the file does not exist.
fn read_image(path: PathBuf) -> Result<Option<Vec<u8>>, RenderError> {
    match std::fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RenderError::Io { path, source }),
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/view", get(api_view))
        .route("/img/:mode/:file", get(image))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();
    cli.beam.validate()?;

    let state = AppState {
        img_dir: Arc::new(cli.serve.img_dir.clone()),
        render_missing: cli.serve.render_missing,
        beam: Arc::new(cli.beam),
    };
    let app = router(state);

    let addr = cli.serve.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!(img_dir = %cli.serve.img_dir.display(), "Serving on http://{addr}");
    axum::serve(listener, app).await.map_err(ServeError::Serve)?;
    Ok(())
}
