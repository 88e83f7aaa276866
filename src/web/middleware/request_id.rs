//! Per-request tracing spans with request IDs.
//!
//! Reuses an incoming `X-Request-Id` header when a proxy already assigned
//! one, otherwise generates a ULID. The resolved ID is echoed back in the
//! `X-Request-Id` response header.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::response::Response;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;

use crate::web::routes::X_CACHE;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Longest incoming request ID that is trusted as-is.
const MAX_INCOMING_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

/// The caller's request ID if it is usable, else a fresh ULID.
fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_INCOMING_ID_LEN)
        .map(String::from)
        .unwrap_or_else(|| ulid::Ulid::new().to_string())
}

/// What a finished request is logged with.
struct Completed<'a> {
    method: &'a Method,
    path: &'a str,
    query: &'a str,
    duration_ms: u64,
}

impl Completed<'_> {
    /// Log at a level proportional to the response status: successes at
    /// debug, client errors at info, everything else at warn.
    fn log<B>(&self, response: &Response<B>) {
        let status = response.status().as_u16();
        let cache = response
            .headers()
            .get(&X_CACHE)
            .and_then(|v| v.to_str().ok());
        let Self {
            method,
            path,
            query,
            duration_ms,
        } = *self;

        match status {
            200..=399 => {
                tracing::debug!(%method, path, query, status, cache, duration_ms, "Response")
            }
            400..=499 => {
                tracing::info!(%method, path, query, status, cache, duration_ms, "Response")
            }
            _ => tracing::warn!(%method, path, query, status, cache, duration_ms, "Response"),
        }
    }
}

impl<S, B> Service<Request> for RequestIdService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let req_id = resolve_request_id(req.headers());
        let header_value = HeaderValue::from_str(&req_id).ok();
        let span = tracing::info_span!("request", req_id = %req_id);

        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let query = req.uri().query().unwrap_or_default().to_owned();
        let start = Instant::now();
        let future = self.inner.call(req);

        Box::pin(
            async move {
                let mut result = future.await;
                let completed = Completed {
                    method: &method,
                    path: &path,
                    query: &query,
                    duration_ms: start.elapsed().as_millis() as u64,
                };

                match &mut result {
                    Ok(response) => {
                        completed.log(response);
                        if let Some(value) = header_value {
                            response.headers_mut().insert(REQUEST_ID.clone(), value);
                        }
                    }
                    Err(e) => {
                        tracing::error!(%method, path, error = ?e, duration_ms = completed.duration_ms, "Request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
