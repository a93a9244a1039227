use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use super::dispatcher::ServingDispatcher;
use super::protocol::InboundRequest;
use crate::Result;

/// Every method and path goes to the dispatcher
pub fn router(dispatcher: Arc<ServingDispatcher>) -> Router {
    Router::new().fallback(dispatch).with_state(dispatcher)
}

async fn dispatch(
    State(dispatcher): State<Arc<ServingDispatcher>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let response = dispatcher
        .handle(InboundRequest::new(method.as_str(), target, body))
        .await;

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
}

pub struct HttpServer {
    dispatcher: Arc<ServingDispatcher>,
    bind: String,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<ServingDispatcher>, bind: impl Into<String>) -> Self {
        Self {
            dispatcher,
            bind: bind.into(),
        }
    }

    /// Serve until the shutdown channel flips to true
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let listener = TcpListener::bind(&self.bind).await?;
        info!(addr = %listener.local_addr()?, "HTTP server listening");

        axum::serve(listener, router(self.dispatcher))
            .with_graceful_shutdown(async move {
                while shutdown_rx.changed().await.is_ok() {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await?;

        Ok(())
    }
}
