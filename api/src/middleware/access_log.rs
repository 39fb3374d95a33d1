use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use finmock_mcp_runtime::SESSION_HEADER;
use tower::{Layer, Service, ServiceExt};

/// Tower Layer for access logging.
///
/// Emits one structured `tracing` event per request with method, path,
/// status, latency and, when present, the MCP session id.
#[derive(Clone, Default)]
pub struct AccessLogLayer;

impl AccessLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
}

impl<S> Service<Request> for AccessLogService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);

        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().to_string();
            let path = req.uri().path().to_owned();
            let session_id = req
                .headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);

            let response = ready.oneshot(req).await.into_response();

            tracing::info!(
                event = "http_access",
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                session_id = ?session_id,
                "request completed"
            );

            Ok(response)
        })
    }
}
