//! Static file request handler
//!
//! GET/HEAD only. Directories redirect to their slash-terminated form, then
//! serve `index.html`/`index.htm` if present, otherwise an HTML listing.

use chrono::{DateTime, SubsecRound, Utc};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::http::{self, Body, Method, Request, Response, Status};
use super::listing;

/// Files served in place of a directory listing, in order of preference
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Split a request target into path and query, dropping any fragment
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    let without_fragment = match target.split_once('#') {
        Some((before, _)) => before,
        None => target,
    };

    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    }
}

/// Collapse leading `//` so redirects can never point at another host
fn collapse_leading_slashes(path: &str) -> String {
    if path.starts_with("//") {
        format!("/{}", path.trim_start_matches('/'))
    } else {
        path.to_string()
    }
}

/// Map a URL path onto the filesystem under `root`
///
/// The path is percent-decoded, then `.` and empty segments are dropped and
/// `..` pops a segment without ever leaving `root`.
pub fn translate_path(root: &Path, url_path: &str) -> PathBuf {
    let decoded = percent_decode_str(url_path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\\') => {}
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path
}

/// Serves files below a root directory
#[derive(Debug, Clone)]
pub struct StaticHandler {
    root: PathBuf,
}

impl StaticHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the response for one request
    pub async fn handle(&self, request: &Request) -> Response {
        if let Method::Other(name) = &request.method {
            return Response::error(Status::NotImplemented, &format!("Unsupported method ({})", name));
        }

        let (raw_path, query) = split_target(&request.target);
        let raw_path = collapse_leading_slashes(raw_path);
        let fs_path = translate_path(&self.root, &raw_path);

        let metadata = match tokio::fs::metadata(&fs_path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("{} not found: {}", fs_path.display(), e);
                return Response::error(Status::NotFound, "File not found");
            }
        };

        if metadata.is_dir() {
            if !raw_path.ends_with('/') {
                let location = match query {
                    Some(query) => format!("{}/?{}", raw_path, query),
                    None => format!("{}/", raw_path),
                };
                return Response::new(Status::MovedPermanently).with_header("Location", location);
            }

            for index in INDEX_FILES {
                let candidate = fs_path.join(index);
                let is_file = tokio::fs::metadata(&candidate)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if is_file {
                    return self.serve_file(&candidate, request).await;
                }
            }

            return self.list_directory(&fs_path, &raw_path).await;
        }

        if raw_path.ends_with('/') {
            return Response::error(Status::NotFound, "File not found");
        }

        self.serve_file(&fs_path, request).await
    }

    async fn serve_file(&self, path: &Path, request: &Request) -> Response {
        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Cannot open {}: {}", path.display(), e);
                return Response::error(Status::NotFound, "File not found");
            }
        };

        let metadata = match file.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                return Response::error(Status::InternalServerError, &e.to_string());
            }
        };

        let modified: Option<DateTime<Utc>> = metadata
            .modified()
            .ok()
            .map(|time| DateTime::<Utc>::from(time).trunc_subsecs(0));

        if request.header("If-None-Match").is_none() {
            let since = request.header("If-Modified-Since").and_then(http::parse_http_date);
            if let (Some(since), Some(modified)) = (since, modified) {
                if modified <= since {
                    return Response::new(Status::NotModified);
                }
            }
        }

        let content_type = mime_guess::from_path(path).first_or_octet_stream().to_string();

        let mut response = Response::new(Status::Ok).with_header("Content-Type", content_type);
        if let Some(modified) = modified {
            response = response.with_header("Last-Modified", http::http_date(modified));
        }

        response.with_body(Body::File {
            file,
            len: metadata.len(),
        })
    }

    async fn list_directory(&self, dir: &Path, raw_path: &str) -> Response {
        let entries = match listing::read_entries(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {}: {}", dir.display(), e);
                return Response::error(Status::NotFound, "No permission to list directory");
            }
        };

        let display_path = percent_decode_str(raw_path).decode_utf8_lossy();
        let page = listing::render(&display_path, &entries);

        Response::new(Status::Ok)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(Body::Bytes(page.into_bytes()))
    }
}
