//! Request pipeline module
//!
//! Entry point for HTTP request processing: health probes first, then the
//! dev middleware, then the fallback handler for anything it defers.

use crate::build::ReadinessGate;
use crate::config::{AppState, HealthConfig};
use crate::handler::fallback;
use crate::http;
use crate::logger::{self, AccessLogEntry, ServedBy};
use crate::middleware::ResponseDraft;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start = Instant::now();
    // Artifacts are read-only, request bodies are never consumed
    let (parts, _body) = req.into_parts();

    let (response, served_by) = route_request(&parts, &state).await;

    if state.access_log_enabled() {
        let entry = access_entry(&parts, &response, remote_addr, served_by, start);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }
    Ok(response)
}

/// Run the pipeline and report which stage answered
pub async fn route_request(parts: &Parts, state: &AppState) -> (Response<Full<Bytes>>, ServedBy) {
    // 0. Health check endpoints (highest priority, never wait on the build)
    if let Some(resp) = health_response(parts, &state.config.health, &state.gate) {
        return (resp, ServedBy::Health);
    }

    // 1. Dev middleware, 2. fallback for everything it defers
    let deferred = AtomicBool::new(false);
    let public_path = state.config.middleware.public_path.as_str();
    let response = state
        .middleware
        .handle(parts, ResponseDraft::new(), |draft| {
            deferred.store(true, Ordering::Relaxed);
            fallback::handle_fallback(parts, draft, public_path)
        })
        .await;

    let served_by = if deferred.load(Ordering::Relaxed) {
        ServedBy::Fallback
    } else {
        ServedBy::Middleware
    };
    (response, served_by)
}

/// Liveness always answers, readiness reflects the build gate
fn health_response(
    parts: &Parts,
    health: &HealthConfig,
    gate: &ReadinessGate,
) -> Option<Response<Full<Bytes>>> {
    if !health.enabled || !matches!(parts.method, Method::GET | Method::HEAD) {
        return None;
    }
    let is_head = parts.method == Method::HEAD;
    let path = parts.uri.path();

    if path == health.liveness_path {
        return Some(http::build_text_response(StatusCode::OK, "ok", is_head));
    }
    if path == health.readiness_path {
        return Some(if gate.is_ready() {
            http::build_text_response(StatusCode::OK, "ready", is_head)
        } else {
            http::build_text_response(StatusCode::SERVICE_UNAVAILABLE, "building", is_head)
        });
    }
    None
}

fn access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    remote_addr: SocketAddr,
    served_by: ServedBy,
    start: Instant,
) -> AccessLogEntry {
    let header = |name: hyper::header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = http_version_str(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header(hyper::header::REFERER);
    entry.user_agent = header(hyper::header::USER_AGENT);
    entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry.served_by = served_by;
    entry
}

const fn http_version_str(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
