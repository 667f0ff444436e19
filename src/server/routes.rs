//! HTTP routes
//!
//! | Method | Path          | Action                                  |
//! |--------|---------------|-----------------------------------------|
//! | GET    | `/`           | redirect to the home location           |
//! | GET    | `/home`       | listener page                           |
//! | GET    | `/controller` | controller page                         |
//! | POST   | `/controller` | run a command, `{"command": "..."}`     |
//! | GET    | `/stream`     | live audio for one listener             |
//! | GET    | anything else | static file from the public directory   |

use std::convert::Infallible;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::StreamExt;
use tokio_util::io::ReaderStream;

use super::config::ServerConfig;
use crate::controller::{CommandRequest, Controller};
use crate::error::Error;
use crate::files;

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    controller: Controller,
    public_dir: PathBuf,
    config: ServerConfig,
}

impl AppState {
    pub fn new(controller: Controller, config: ServerConfig) -> Self {
        let public_dir = controller.engine().config().public_dir.clone();
        Self {
            controller,
            public_dir,
            config,
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(redirect_home))
        .route("/home", get(home_page))
        .route("/controller", get(controller_page).post(command))
        .route("/stream", get(stream))
        .fallback(get(static_file))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyPlaying | Error::NotPlaying => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

async fn redirect_home(State(state): State<AppState>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.config.home_location.clone())],
    )
        .into_response()
}

async fn home_page(State(state): State<AppState>) -> Result<Response, Error> {
    let page = state.config.home_page.clone();
    serve_file(&state, &page).await
}

async fn controller_page(State(state): State<AppState>) -> Result<Response, Error> {
    let page = state.config.controller_page.clone();
    serve_file(&state, &page).await
}

async fn static_file(State(state): State<AppState>, uri: Uri) -> Result<Response, Error> {
    serve_file(&state, uri.path()).await
}

async fn serve_file(state: &AppState, requested: &str) -> Result<Response, Error> {
    let info = files::resolve(&state.public_dir, requested).await?;
    let file = files::open_read_stream(&info.path).await?;

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    if let Some(mime) = files::content_type(&info.extension) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(mime));
    }

    Ok(response)
}

async fn command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Result<Response, Error> {
    let response = state.controller.handle_command(&request.command).await?;
    Ok(Json(response).into_response())
}

async fn stream(State(state): State<AppState>) -> Response {
    let listener = state.controller.create_client_stream().await;
    let body = Body::from_stream(listener.map(Ok::<_, Infallible>));

    (
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::ACCEPT_RANGES, "bytes"),
        ],
        body,
    )
        .into_response()
}
