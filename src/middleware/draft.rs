//! Response-in-progress passed along the request pipeline

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use std::fmt;
use std::sync::Arc;

use crate::build::BuildStats;
use crate::fs::FileSystem;
use crate::http::response::log_build_error;

/// Per-request state shared with downstream handlers
#[derive(Clone, Default)]
pub struct Locals {
    /// Stats of the build the request waited for
    pub stats: Option<Arc<BuildStats>>,
    /// Filesystem the build writes into
    pub fs: Option<Arc<dyn FileSystem>>,
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locals")
            .field("stats", &self.stats.as_ref().map(|s| s.generation))
            .field("fs", &self.fs.is_some())
            .finish()
    }
}

/// Status and headers set so far by earlier stages.
///
/// Unset status means 200 once the response is produced.
#[derive(Debug, Default)]
pub struct ResponseDraft {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub locals: Locals,
}

impl ResponseDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the draft with `body`
    pub fn into_response(self, body: Bytes) -> Response<Full<Bytes>> {
        let status = self.status.unwrap_or(StatusCode::OK);
        let mut builder = Response::builder().status(status);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }
        builder.body(Full::new(body)).unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
    }
}
