//! Development server.
//!
//! A small static file server over the output root, built on `tiny_http`:
//!
//! - Exact file match, then `index.html` for directories
//! - Directory URLs without a trailing slash redirect to the slashed form
//! - A plain listing for directories without `index.html`
//! - Query strings are ignored, paths are percent-decoded, `..` is refused
//! - Change watcher started alongside (see `crate::watch`)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │   Main Thread   │   │  Request Workers │   │  Watcher Thread  │
//! │ (wait for exit) │   │   (read-only)    │   │  (sole writer)   │
//! └─────────────────┘   └────────┬─────────┘   └────────┬─────────┘
//!                                │                      │
//!                                ▼                      ▼
//!                          Serve files            Rebuild site
//!                                └──────────┬───────────┘
//!                                           ▼
//!                                  config.build.output
//! ```

use crate::{build::SiteBuilder, log, watch::spawn_watcher};
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Instant,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Threads answering requests
const WORKERS: usize = 4;

/// Request log timestamp, e.g. `02/Jan/2006:15:04:05 -0700`
const LOG_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve the output root until Ctrl+C.
///
/// Binds the configured host and port (failure is fatal), starts the change
/// watcher, then answers requests on a small worker pool.
pub fn serve_site(builder: Arc<SiteBuilder>) -> Result<()> {
    let config = builder.config();
    let (host, port) = (config.serve.host.as_str(), config.serve.port);

    let server = Server::http((host, port))
        .map_err(|e| anyhow!("Failed to bind {}: {e}", display_addr(host, port)))?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        // Each call wakes one blocked worker
        for _ in 0..WORKERS {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", display_addr(host, port));
    log!("serve"; "serving {}", config.build.output.display());
    log!("serve"; "press Ctrl+C to quit");

    spawn_watcher(Arc::clone(&builder))?;

    let workers = (0..WORKERS)
        .map(|i| {
            let server = Arc::clone(&server);
            let root = config.build.output.clone();
            thread::Builder::new()
                .name(format!("http-{i}"))
                .spawn(move || {
                    for request in server.incoming_requests() {
                        if let Err(e) = handle_request(request, &root) {
                            log!("serve"; "request error: {e:#}");
                        }
                    }
                })
                .context("Failed to spawn request worker")
        })
        .collect::<Result<Vec<_>>>()?;

    for worker in workers {
        if worker.join().is_err() {
            log!("error"; "request worker panicked");
        }
    }

    Ok(())
}

/// `host:port`, with IPv6 hosts bracketed
fn display_addr(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request and log it.
///
/// Request resolution order:
/// 1. Path escaping the root → 404
/// 2. Exact file match → serve file
/// 3. Directory URL without trailing slash → 301 to the slashed URL
/// 4. Directory with index.html → serve index.html
/// 5. Directory without index.html → generate listing
/// 6. Nothing found → 404
fn handle_request(request: Request, root: &Path) -> Result<()> {
    let start = Instant::now();
    let remote = request
        .remote_addr()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    let method = request.method().to_string();
    let raw_path = request_path(request.url()).to_owned();
    let url_path = urlencoding::decode(&raw_path).map_or_else(|_| raw_path.clone(), Cow::into_owned);

    let result = respond(request, root, &raw_path, &url_path);

    log!(
        "serve";
        "{remote} [{}] {url_path} {method} {:.2?}",
        Local::now().format(LOG_TIME_FORMAT),
        start.elapsed()
    );
    result
}

fn respond(request: Request, root: &Path, raw_path: &str, url_path: &str) -> Result<()> {
    let Some(local_path) = resolve(root, url_path) else {
        return serve_not_found(request);
    };

    if local_path.is_file() {
        return serve_file(request, &local_path);
    }

    if local_path.is_dir() {
        if !raw_path.ends_with('/') {
            return serve_redirect(request, &format!("{raw_path}/"));
        }

        let index_path = local_path.join("index.html");
        if index_path.is_file() {
            return serve_file(request, &index_path);
        }

        if let Ok(listing) = generate_directory_listing(&local_path, url_path) {
            return serve_html(request, listing);
        }
    }

    serve_not_found(request)
}

/// Path part of a request URL, without query string or fragment.
fn request_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Map a decoded URL path to a file under `root`.
///
/// Returns `None` for any path that would leave the root.
fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) || Path::new(s).has_root() => return None,
            s => path.push(s),
        }
    }
    Some(path)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow!("invalid header {name}: {value}"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content)
        .with_header(header("Content-Type", guess_content_type(path))?);

    request.respond(response)?;
    Ok(())
}

/// Serve HTML content.
fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(header("Content-Type", "text/html; charset=utf-8")?);
    request.respond(response)?;
    Ok(())
}

/// Serve 301 Moved Permanently.
fn serve_redirect(request: Request, location: &str) -> Result<()> {
    let response = Response::empty(StatusCode(301)).with_header(header("Location", location)?);
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::from_string("404 Not Found")
        .with_status_code(StatusCode(404))
        .with_header(header("Content-Type", "text/plain; charset=utf-8")?);
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("wasm") => "application/wasm",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Directory Listing
// ============================================================================

/// Generate an HTML listing of a directory without `index.html`.
///
/// Hidden entries are left out, directories come first.
fn generate_directory_listing(dir: &Path, url_path: &str) -> std::io::Result<String> {
    let mut entries: Vec<(bool, String)> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| {
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            (is_dir, entry.file_name().to_string_lossy().into_owned())
        })
        .collect();
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let title = tera::escape_html(url_path);
    let mut items = Vec::with_capacity(entries.len() + 1);
    if url_path.trim_matches('/') != "" {
        items.push(r#"<li><a href="../">../</a></li>"#.to_string());
    }
    for (is_dir, name) in &entries {
        let slash = if *is_dir { "/" } else { "" };
        items.push(format!(
            r#"<li><a href="{}{slash}">{}{slash}</a></li>"#,
            urlencoding::encode(name),
            tera::escape_html(name)
        ));
    }

    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Index of {title}</title></head>\n\
         <body>\n<h1>Index of {title}</h1>\n<ul>\n{}\n</ul>\n</body>\n</html>\n",
        items.join("\n")
    ))
}
