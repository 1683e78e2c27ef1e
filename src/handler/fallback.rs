//! Fallback handler
//!
//! Runs when the middleware defers. With server-side rendering on, the
//! middleware has already waited for the build and attached its stats, so
//! an HTML shell referencing the emitted scripts and stylesheets can be
//! rendered here. Everything else is a 404.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Method, Response};
use std::fmt::Write;

use crate::build::BuildStats;
use crate::http;
use crate::middleware::ResponseDraft;

/// Answer a request the middleware did not serve
pub async fn handle_fallback(
    req: &Parts,
    draft: ResponseDraft,
    public_path: &str,
) -> Response<Full<Bytes>> {
    let is_head = req.method == Method::HEAD;
    let renderable = matches!(req.method, Method::GET | Method::HEAD);

    match draft.locals.stats {
        Some(stats) if renderable => {
            http::build_html_response(render_shell(&stats, public_path), is_head)
        }
        _ => http::build_404_response(is_head),
    }
}

/// HTML page loading every emitted `.css` and `.js` asset
pub fn render_shell(stats: &BuildStats, public_path: &str) -> String {
    let base = public_path.trim_end_matches('/');
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>devserve</title>\n",
    );

    for css in stats.assets_with_extension("css") {
        let _ = writeln!(
            html,
            "<link rel=\"stylesheet\" href=\"{base}/{}\">",
            escape_html(css)
        );
    }
    html.push_str("</head>\n<body>\n");

    if stats.has_errors() {
        let _ = writeln!(
            html,
            "<pre class=\"build-errors\">Build {} failed:\n{}</pre>",
            stats.generation,
            escape_html(&stats.errors.join("\n"))
        );
    }

    html.push_str("<div id=\"root\"></div>\n");
    for js in stats.assets_with_extension("js") {
        let _ = writeln!(html, "<script src=\"{base}/{}\"></script>", escape_html(js));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
