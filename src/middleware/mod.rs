//! Development middleware
//!
//! Serves build artifacts out of the virtual filesystem. A request either
//! gets the file (full or ranged) or is handed to `next` untouched; nothing
//! on this path turns a missing asset into an error response.

mod draft;
pub mod options;
pub mod path;

pub use draft::{Locals, ResponseDraft};
pub use options::{MiddlewareOptions, OptionsError, DEFAULT_INDEX};
pub use path::{filename_from_request, PublicPath};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
    RANGE,
};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use regex::Regex;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

use crate::build::{ReadinessGate, RebuildTrigger};
use crate::fs::{FileStat, FileSystem};
use crate::http::mime::content_type_for;
use crate::http::{apply_range, Ranged};
use crate::logger;

/// Cache-busted build filenames carry a content hash
static HASH_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9a-f]{10,}").unwrap());

/// Why a request was handed to the next handler
#[derive(Debug, Error)]
pub enum Miss {
    #[error("method not accepted")]
    MethodNotAccepted,
    #[error("outside public path")]
    OutsidePublicPath,
    #[error("cannot stat {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },
    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),
    #[error("directory index disabled")]
    IndexDisabled,
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

pub struct DevMiddleware {
    options: MiddlewareOptions,
    output_path: PathBuf,
    fs: Arc<dyn FileSystem>,
    gate: Arc<ReadinessGate>,
    trigger: Arc<dyn RebuildTrigger>,
}

impl DevMiddleware {
    pub fn new(
        options: MiddlewareOptions,
        output_path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        gate: Arc<ReadinessGate>,
        trigger: Arc<dyn RebuildTrigger>,
    ) -> Self {
        Self {
            options,
            output_path: output_path.into(),
            fs,
            gate,
            trigger,
        }
    }

    /// Serve the artifact `req` points at, or call `next` with the draft.
    pub async fn handle<N, Fut>(
        &self,
        req: &Parts,
        mut draft: ResponseDraft,
        next: N,
    ) -> Response<Full<Bytes>>
    where
        N: FnOnce(ResponseDraft) -> Fut,
        Fut: Future<Output = Response<Full<Bytes>>>,
    {
        match self.serve(req, &mut draft).await {
            Ok(body) => {
                let body = if req.method == Method::HEAD {
                    Bytes::new()
                } else {
                    body
                };
                draft.into_response(body)
            }
            Err(miss) => {
                logger::log_debug(&format!(
                    "[Middleware] {} {} -> next ({miss})",
                    req.method,
                    req.uri.path()
                ));
                self.defer(draft, next).await
            }
        }
    }

    async fn defer<N, Fut>(&self, mut draft: ResponseDraft, next: N) -> Response<Full<Bytes>>
    where
        N: FnOnce(ResponseDraft) -> Fut,
        Fut: Future<Output = Response<Full<Bytes>>>,
    {
        if self.options.server_side_render {
            draft.locals.stats = self.gate.wait_ready().await;
            draft.locals.fs = Some(Arc::clone(&self.fs));
        }
        next(draft).await
    }

    async fn serve(&self, req: &Parts, draft: &mut ResponseDraft) -> Result<Bytes, Miss> {
        if !self.options.accepts(&req.method) {
            return Err(Miss::MethodNotAccepted);
        }

        let mut filename = filename_from_request(
            &self.options.public_path,
            &self.output_path,
            req.uri.path(),
            request_host(req),
        )
        .ok_or(Miss::OutsidePublicPath)?;

        if filename.extension().is_none() {
            filename.push(DEFAULT_INDEX);
        }

        let name = filename.to_string_lossy().into_owned();
        if self.options.triggers_rebuild(&name) {
            self.trigger.rebuild();
        }

        // A hashed artifact that exists cannot change under the same name
        let hashed_and_present =
            HASH_REGEX.is_match(&name) && self.fs.stat(&filename).is_ok_and(|s| s.is_file());
        if !hashed_and_present {
            self.gate.wait_ready().await;
        }

        let filename = self.resolve(filename)?;
        let content = self
            .fs
            .read_file(&filename)
            .map_err(|source| Miss::Read {
                path: filename.clone(),
                source,
            })?;

        let range = req.headers.get(RANGE).and_then(|v| v.to_str().ok());
        let body = match apply_range(content, range) {
            Ranged::Full(body) => body,
            Ranged::Partial {
                body,
                start,
                end,
                total,
            } => {
                draft.status = Some(StatusCode::PARTIAL_CONTENT);
                set_header(&mut draft.headers, CONTENT_RANGE, format!("bytes {start}-{end}/{total}"));
                draft
                    .headers
                    .insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
                body
            }
            Ranged::Unsatisfiable { total } => {
                draft.status = Some(StatusCode::RANGE_NOT_SATISFIABLE);
                set_header(&mut draft.headers, CONTENT_RANGE, format!("bytes */{total}"));
                Bytes::new()
            }
        };

        if !draft.headers.contains_key(CONTENT_TYPE) {
            set_header(&mut draft.headers, CONTENT_TYPE, content_type_for(&filename));
        }
        draft
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        for (name, value) in &self.options.headers {
            draft.headers.insert(name.clone(), value.clone());
        }

        logger::log_debug(&format!(
            "[Middleware] Serving {} ({} bytes)",
            filename.display(),
            body.len()
        ));
        Ok(body)
    }

    /// Stat `filename`, falling back to the index document for directories
    fn resolve(&self, filename: PathBuf) -> Result<PathBuf, Miss> {
        let stat = self.stat(&filename)?;
        if stat.is_file() {
            return Ok(filename);
        }
        if !stat.is_dir() {
            return Err(Miss::NotAFile(filename));
        }

        let index = self.options.index.as_deref().ok_or(Miss::IndexDisabled)?;
        let index_path = filename.join(index);
        if self.stat(&index_path)?.is_file() {
            Ok(index_path)
        } else {
            Err(Miss::NotAFile(index_path))
        }
    }

    fn stat(&self, path: &Path) -> Result<FileStat, Miss> {
        self.fs.stat(path).map_err(|source| Miss::Stat {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Hostname of an absolute-form request target (`GET http://host/x`).
/// Origin-form requests have none, whatever their `Host` header says.
fn request_host(req: &Parts) -> Option<&str> {
    req.uri.host()
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: String) {
    match HeaderValue::try_from(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => logger::log_warning(&format!("Dropping invalid {name} header: {e}")),
    }
}
