use std::net::SocketAddr;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::domain::event::IssueEvent;
use crate::error::{AppError, AppResult};
use crate::workflow::issue_event;

pub const WEBHOOK_PATH: &str = "/endpoint";
const ACKNOWLEDGEMENT: &str = "OK";

pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn receive_webhook(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let event = IssueEvent::from_slice(&body)?;
    let outcome = issue_event::dispatch(&ctx, &event).await?;
    info!(action = event.action(), ?outcome, "webhook handled");
    Ok(ACKNOWLEDGEMENT)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InvalidPayload(_) => {
                warn!(error = %self, "rejected webhook payload");
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            _ => {
                error!(error = %self, "webhook handling failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

pub async fn start_server(ctx: AppContext, addr: SocketAddr) -> AppResult<()> {
    let app = create_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening for webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
