//! Access log formats
//!
//! `combined` and `common` follow the usual CLF layouts, `json` emits one
//! object per line, and anything else is a pattern of `$variables`.
//! Every entry also records which pipeline stage produced the response.

use chrono::{DateTime, Local};
use serde::Serialize;

/// CLF timestamp layout
const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
    pub served_by: ServedBy,
}

/// Pipeline stage that produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedBy {
    Health,
    Middleware,
    Fallback,
}

impl ServedBy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Middleware => "middleware",
            Self::Fallback => "fallback",
        }
    }
}

impl AccessLogEntry {
    /// Entry stamped with the current time, defaults for everything else
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
            served_by: ServedBy::Middleware,
        }
    }

    /// Render the entry as `combined`, `common`, `json` or a custom pattern
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.clf(),
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.clf(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "json" => serde_json::to_string(self).unwrap_or_default(),
            pattern => self.expand(pattern),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn clf(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Value of a `$variable`, `None` when the name is unknown
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => self.request_line(),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "http_referer" => self.referer.clone().unwrap_or_else(|| "-".to_string()),
            "http_user_agent" => self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let secs = self.request_time_us as f64 / 1_000_000.0;
                format!("{secs:.3}")
            }
            "served_by" => self.served_by.as_str().to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Replace each `$name` (ASCII letters, digits, `_`) in one pass.
    /// Unknown names are left as written.
    fn expand(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..len];

            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/assets/app.js".to_string(),
        );
        entry.query = Some("v=3".to_string());
        entry.body_bytes = 1234;
        entry.referer = Some("https://example.com".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 1750;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = entry().format("combined");
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"GET /assets/app.js?v=3 HTTP/1.1\" 200 1234"));
        assert!(log.ends_with("\"https://example.com\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_format_common_omits_headers() {
        let log = entry().format("common");
        assert!(log.ends_with("\"GET /assets/app.js?v=3 HTTP/1.1\" 200 1234"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_json() {
        let log = entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "192.168.1.1");
        assert_eq!(value["status"], 200);
        assert_eq!(value["body_bytes"], 1234);
        assert_eq!(value["query"], "v=3");
        assert_eq!(value["served_by"], "middleware");
        assert!(value["time"].is_string());
    }

    #[test]
    fn test_format_custom() {
        let mut e = entry();
        e.served_by = ServedBy::Fallback;
        let log = e.format("$remote_addr $request_method $request_uri $status $request_time [$served_by]");
        assert_eq!(log, "192.168.1.1 GET /assets/app.js?v=3 200 0.002 [fallback]");
    }

    #[test]
    fn test_custom_keeps_unknown_and_literal_dollars() {
        let log = entry().format("$status $nope $ $request_method$");
        assert_eq!(log, "200 $nope $ GET$");
    }

    #[test]
    fn test_request_prefix_variables_do_not_collide() {
        let log = entry().format("$request|$request_time");
        assert_eq!(log, "GET /assets/app.js?v=3 HTTP/1.1|0.002");
    }
}
