use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// One structured event per request. Server errors are logged at `warn`
/// so they stand out from ordinary traffic.
pub async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let has_query = req.uri().query().is_some();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::warn!(%method, %path, has_query, status = status.as_u16(), elapsed_ms, "request");
    } else {
        tracing::info!(%method, %path, has_query, status = status.as_u16(), elapsed_ms, "request");
    }

    response
}
