//! Minimal HTTP/1.x request parsing and response writing
//!
//! Only what a one-request-per-connection static handler needs: a request
//! line, headers (no body), and `HTTP/1.0` responses that close the
//! connection.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Longest accepted request or header line, in bytes
pub const MAX_LINE_BYTES: u64 = 65_536;

/// Most header lines accepted per request
pub const MAX_HEADERS: usize = 100;

/// Value of the `Server` header
pub const SERVER_NAME: &str = concat!("portserve/", env!("CARGO_PKG_VERSION"));

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Head => f.write_str("HEAD"),
            Method::Other(name) => f.write_str(name),
        }
    }
}

/// Parsed request head
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Raw request target, still percent-encoded
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Case-insensitive header lookup (first match)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.target, self.version)
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Bad request syntax ({0})")]
    Malformed(String),

    #[error("Bad request version ({0})")]
    BadVersion(String),

    #[error("Invalid HTTP version ({0})")]
    UnsupportedVersion(String),

    #[error("Line too long")]
    LineTooLong,

    #[error("Too many headers")]
    TooManyHeaders,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Status code the client should receive for this error
    pub fn status(&self) -> Status {
        match self {
            RequestError::UnsupportedVersion(_) => Status::HttpVersionNotSupported,
            RequestError::LineTooLong => Status::UriTooLong,
            RequestError::TooManyHeaders => Status::HeaderFieldsTooLarge,
            _ => Status::BadRequest,
        }
    }
}

/// Read one line, rejecting lines longer than [`MAX_LINE_BYTES`]
async fn read_line<R>(reader: &mut R, line: &mut String) -> Result<usize, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let read = (&mut *reader).take(MAX_LINE_BYTES + 1).read_line(line).await?;
    if read as u64 > MAX_LINE_BYTES {
        return Err(RequestError::LineTooLong);
    }
    Ok(read)
}

/// Read a request head from the connection
///
/// Returns `Ok(None)` when the peer closes the connection before sending
/// anything.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    // Tolerate stray blank lines ahead of the request line
    let request_line = loop {
        if read_line(reader, &mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if !trimmed.is_empty() {
            break trimmed.to_string();
        }
    };

    let words: Vec<&str> = request_line.split_whitespace().collect();
    let (method, target, version) = match words.as_slice() {
        [method, target, version] => (*method, *target, *version),
        _ => return Err(RequestError::Malformed(request_line.clone())),
    };

    match version {
        "HTTP/1.0" | "HTTP/1.1" => {}
        v if v.starts_with("HTTP/") => {
            let numbers = &v["HTTP/".len()..];
            let major = numbers
                .split_once('.')
                .and_then(|(major, minor)| {
                    minor.parse::<u32>().ok()?;
                    major.parse::<u32>().ok()
                })
                .ok_or_else(|| RequestError::BadVersion(v.to_string()))?;
            if major >= 2 {
                return Err(RequestError::UnsupportedVersion(v.to_string()));
            }
        }
        v => return Err(RequestError::BadVersion(v.to_string())),
    }

    let mut headers = Vec::new();
    loop {
        if read_line(reader, &mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(RequestError::TooManyHeaders);
        }
        match trimmed.split_once(':') {
            Some((name, value)) => headers.push((name.trim().to_string(), value.trim().to_string())),
            None => return Err(RequestError::Malformed(trimmed.to_string())),
        }
    }

    Ok(Some(Request {
        method: Method::parse(method),
        target: target.to_string(),
        version: version.to_string(),
        headers,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    MovedPermanently,
    NotModified,
    BadRequest,
    NotFound,
    UriTooLong,
    HeaderFieldsTooLarge,
    InternalServerError,
    NotImplemented,
    HttpVersionNotSupported,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::MovedPermanently => 301,
            Status::NotModified => 304,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::UriTooLong => 414,
            Status::HeaderFieldsTooLarge => 431,
            Status::InternalServerError => 500,
            Status::NotImplemented => 501,
            Status::HttpVersionNotSupported => 505,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::MovedPermanently => "Moved Permanently",
            Status::NotModified => "Not Modified",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::UriTooLong => "Request-URI Too Long",
            Status::HeaderFieldsTooLarge => "Request Header Fields Too Large",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
            Status::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }

    /// Statuses that never carry a body
    fn is_bodyless(&self) -> bool {
        matches!(self, Status::NotModified)
    }
}

#[derive(Debug)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    File { file: tokio::fs::File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// HTML error page for a status
    pub fn error(status: Status, message: &str) -> Self {
        let page = format!(
            "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Error response</title>\n</head>\n<body>\n<h1>Error response</h1>\n\
             <p>Error code: {}</p>\n<p>Message: {}.</p>\n</body>\n</html>\n",
            status.code(),
            escape_html(message)
        );

        Response::new(status)
            .with_header("Content-Type", "text/html;charset=utf-8")
            .with_body(Body::Bytes(page.into_bytes()))
    }

    /// Serialize the response head and (unless `head_only`) the body
    pub async fn write_to<W>(self, writer: &mut W, head_only: bool) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut head = format!("HTTP/1.0 {} {}\r\n", self.status.code(), self.status.reason());
        head.push_str(&format!("Server: {}\r\n", SERVER_NAME));
        head.push_str(&format!("Date: {}\r\n", http_date(Utc::now())));
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        if !self.status.is_bodyless() {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        head.push_str("Connection: close\r\n\r\n");

        writer.write_all(head.as_bytes()).await?;

        if !head_only && !self.status.is_bodyless() {
            match self.body {
                Body::Empty => {}
                Body::Bytes(bytes) => writer.write_all(&bytes).await?,
                Body::File { file, len } => {
                    let mut limited = file.take(len);
                    tokio::io::copy(&mut limited, writer).await?;
                }
            }
        }

        writer.flush().await
    }
}

/// Format a timestamp as an RFC 7231 IMF-fixdate
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
