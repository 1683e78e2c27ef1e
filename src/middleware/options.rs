//! Middleware options
//!
//! Validated, ready-to-use form of the `[middleware]` config section.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Method;
use regex::Regex;
use thiserror::Error;

use super::path::PublicPath;
use crate::config::{IndexSetting, MiddlewareConfig};

pub const DEFAULT_INDEX: &str = "index.html";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid HTTP method '{0}'")]
    Method(String),
    #[error("invalid header name '{0}'")]
    HeaderName(String),
    #[error("invalid value for header '{0}'")]
    HeaderValue(String),
    #[error("invalid filename pattern: {0}")]
    Filename(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub struct MiddlewareOptions {
    pub methods: Vec<Method>,
    pub public_path: PublicPath,
    /// Index document for directories, `None` disables index resolution
    pub index: Option<String>,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub lazy: bool,
    /// Restricts which filenames trigger a lazy rebuild
    pub filename: Option<Regex>,
    pub server_side_render: bool,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            methods: vec![Method::GET, Method::HEAD],
            public_path: PublicPath::parse("/"),
            index: Some(DEFAULT_INDEX.to_string()),
            headers: Vec::new(),
            lazy: false,
            filename: None,
            server_side_render: false,
        }
    }
}

impl MiddlewareOptions {
    pub fn from_config(config: &MiddlewareConfig) -> Result<Self, OptionsError> {
        let methods = if config.methods.is_empty() {
            Self::default().methods
        } else {
            config
                .methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                        .map_err(|_| OptionsError::Method(m.clone()))
                })
                .collect::<Result<_, _>>()?
        };

        let index = match &config.index {
            None | Some(IndexSetting::Flag(true)) => Some(DEFAULT_INDEX.to_string()),
            Some(IndexSetting::Flag(false)) => None,
            Some(IndexSetting::Name(name)) if name.is_empty() => None,
            Some(IndexSetting::Name(name)) => Some(name.clone()),
        };

        let mut headers = Vec::with_capacity(config.headers.len());
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| OptionsError::HeaderName(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| OptionsError::HeaderValue(name.clone()))?;
            headers.push((header_name, header_value));
        }

        let filename = config
            .filename
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()?;

        Ok(Self {
            methods,
            public_path: PublicPath::parse(&config.public_path),
            index,
            headers,
            lazy: config.lazy,
            filename,
            server_side_render: config.server_side_render,
        })
    }

    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Whether a request for `filename` should kick off a lazy rebuild
    pub fn triggers_rebuild(&self, filename: &str) -> bool {
        self.lazy && self.filename.as_ref().map_or(true, |re| re.is_match(filename))
    }
}
