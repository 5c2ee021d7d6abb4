use axum::{extract::Request, middleware::Next, response::Response};

/// Logs method, path, status and elapsed time of every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    #[cfg(feature = "tracing")]
    let (method, path, start) = (
        request.method().clone(),
        request.uri().path().to_owned(),
        std::time::Instant::now(),
    );

    let response = next.run(request).await;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "{method} {path} {} {:?}",
        response.status().as_u16(),
        start.elapsed()
    );

    response
}
