#![forbid(unsafe_code)]

//! HTTP adapter for the progress service.
//!
//! Thin glue: every handler translates one request into one service
//! operation and wraps the result in the uniform status envelope.

mod envelope;
mod handlers;

use std::sync::Arc;

use services::ProgressService;
use tokio::net::TcpListener;
use tracing::info;

pub use envelope::ApiError;
pub use handlers::router;

/// Bind and serve the API until the process exits.
///
/// # Errors
///
/// Returns the bind or accept-loop error; handler-level failures are
/// already mapped to error envelopes and never bubble up here.
pub async fn serve(service: Arc<ProgressService>, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(service)).await
}
