//! Live report server for watch mode.
//!
//! The server holds the most recently published [`RenderedReport`] behind an
//! atomic snapshot. Publishing swaps the snapshot; request handlers only ever
//! load it, so a request never sees a half-written report.
//!
//! Routes:
//! - `/preview?path=<abs>`: raw bytes of a local image
//! - `/favicon.ico`: the project favicon
//! - `/report.json`: the latest JSON document, if JSON emission is enabled
//! - anything else: the latest HTML report, or a placeholder page

use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use arc_swap::ArcSwapOption;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

use crate::builder::RenderedReport;
use crate::config::ServeConfig;
use crate::error::{AuditResult, ImgauditError};
use crate::mime::{image_type_from_path, types};
use crate::report_html::{FAVICON_ENDPOINT, PREVIEW_ENDPOINT};

/// Path of the JSON document endpoint.
pub const JSON_ENDPOINT: &str = "/report.json";

/// Worker threads answering requests.
const REQUEST_THREADS: usize = 4;

/// Served before the first report has been published.
pub const PLACEHOLDER_HTML: &str = "<!doctype html><html><head><meta charset=\"utf-8\">\
<meta http-equiv=\"refresh\" content=\"2\"><title>Image Assets</title></head>\
<body><p>Report not yet generated</p></body></html>";

struct Running {
    server: Arc<Server>,
    addr: SocketAddr,
    accept: JoinHandle<()>,
}

/// HTTP server publishing the latest report.
pub struct LiveServer {
    bind_addr: SocketAddr,
    latest: Arc<ArcSwapOption<RenderedReport>>,
    running: Mutex<Option<Running>>,
}

impl LiveServer {
    pub fn new(config: &ServeConfig) -> Self {
        Self {
            bind_addr: SocketAddr::new(config.interface, config.port),
            latest: Arc::new(ArcSwapOption::empty()),
            running: Mutex::new(None),
        }
    }

    /// Configured listen address. Port 0 picks an ephemeral port.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Start listening. Calling this while already listening is a no-op that
    /// returns the bound address.
    pub fn start(&self) -> AuditResult<SocketAddr> {
        let mut running = self.lock_running();
        if let Some(r) = running.as_ref() {
            return Ok(r.addr);
        }

        let server = Server::http(self.bind_addr).map_err(|e| {
            ImgauditError::serve(format!("cannot listen on {}: {}", self.bind_addr, e))
        })?;
        // Port 0 resolves to the ephemeral port actually bound
        let addr = server.server_addr().to_ip().unwrap_or(self.bind_addr);
        let server = Arc::new(server);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .thread_name(|i| format!("imgaudit-http-{i}"))
            .panic_handler(|_| error!("request handler panicked"))
            .build()
            .map_err(|e| ImgauditError::serve(format!("cannot create request pool: {e}")))?;

        let accept = thread::Builder::new()
            .name("imgaudit-accept".into())
            .spawn({
                let server = Arc::clone(&server);
                let latest = Arc::clone(&self.latest);
                move || {
                    for request in server.incoming_requests() {
                        let latest = Arc::clone(&latest);
                        pool.spawn(move || {
                            if let Err(e) = handle_request(request, &latest) {
                                debug!(error = %format!("{e:#}"), "failed to answer request");
                            }
                        });
                    }
                }
            })
            .map_err(|e| ImgauditError::serve(format!("cannot spawn accept thread: {e}")))?;

        info!(addr = %addr, "live report server listening");
        *running = Some(Running {
            server,
            addr,
            accept,
        });
        Ok(addr)
    }

    pub fn is_listening(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_running().as_ref().map(|r| r.addr)
    }

    /// Replace the report served to subsequent requests.
    pub fn publish(&self, report: Arc<RenderedReport>) {
        self.latest.store(Some(report));
    }

    /// Most recently published report.
    pub fn latest(&self) -> Option<Arc<RenderedReport>> {
        self.latest.load_full()
    }

    /// Stop accepting requests and wait for the accept loop to exit.
    pub fn shutdown(&self) {
        let Some(running) = self.lock_running().take() else {
            return;
        };
        running.server.unblock();
        if running.accept.join().is_err() {
            warn!("accept thread panicked");
        }
        info!(addr = %running.addr, "live report server stopped");
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Response body chosen by [`route`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Body,
}

impl Reply {
    fn bytes(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: Body::Bytes(body.into()),
        }
    }

    fn file(path: PathBuf, content_type: &'static str) -> Self {
        Self {
            status: 200,
            content_type,
            body: Body::File(path),
        }
    }

    fn not_found() -> Self {
        Self::bytes(404, types::PLAIN, "Not Found")
    }

    fn server_error() -> Self {
        Self::bytes(500, types::PLAIN, "Server Error")
    }
}

/// Map a request to a reply. Touches the filesystem only to check that a
/// requested file exists.
pub fn route(method: &Method, url: &str, latest: Option<&RenderedReport>) -> Reply {
    if !matches!(method, Method::Get | Method::Head) {
        return Reply::bytes(405, types::PLAIN, "Method Not Allowed");
    }

    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    match path {
        PREVIEW_ENDPOINT => match preview_target(query) {
            Some(file) => {
                let content_type = image_type_from_path(&file);
                Reply::file(file, content_type)
            }
            None => Reply::not_found(),
        },
        FAVICON_ENDPOINT => latest
            .and_then(|r| r.favicon.clone())
            .filter(|p| p.is_file())
            .map(|p| Reply::file(p, types::ICO))
            .unwrap_or_else(Reply::not_found),
        JSON_ENDPOINT => latest
            .and_then(|r| r.json.as_deref())
            .map(|json| Reply::bytes(200, types::JSON, json))
            .unwrap_or_else(Reply::not_found),
        _ => match latest {
            Some(report) => Reply::bytes(200, types::HTML, report.html.as_str()),
            None => Reply::bytes(200, types::HTML, PLACEHOLDER_HTML),
        },
    }
}

/// Regular file named by the `path` query parameter.
fn preview_target(query: &str) -> Option<PathBuf> {
    let raw = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "path")
        .map(|(_, value)| value.into_owned())?;
    if raw.is_empty() {
        return None;
    }
    let path = Path::new(&raw);
    path.is_file().then(|| path.to_path_buf())
}

fn handle_request(request: Request, latest: &ArcSwapOption<RenderedReport>) -> Result<()> {
    let head = request.method() == &Method::Head;
    let snapshot = latest.load_full();
    let reply = route(request.method(), request.url(), snapshot.as_deref());

    match reply.body {
        Body::Bytes(body) => send_body(request, reply.status, reply.content_type, body, head),
        Body::File(path) => match File::open(&path) {
            Ok(file) => send_file(request, reply.content_type, file, &path, head),
            Err(e) => send_reply(request, open_failure_reply(&path, &e), head),
        },
    }
}

/// Reply for a routed file that could not be opened. A file removed since
/// routing is 404; anything else is 500.
fn open_failure_reply(path: &Path, err: &std::io::Error) -> Reply {
    if err.kind() == std::io::ErrorKind::NotFound {
        debug!(path = %path.display(), "file vanished before it was opened");
        return Reply::not_found();
    }
    warn!(path = %path.display(), error = %err, "cannot open file for request");
    Reply::server_error()
}

fn send_reply(request: Request, reply: Reply, head: bool) -> Result<()> {
    match reply.body {
        Body::Bytes(body) => send_body(request, reply.status, reply.content_type, body, head),
        Body::File(_) => Err(anyhow!("file replies must be opened before sending")),
    }
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    head: bool,
) -> Result<()> {
    let header = content_type_header(content_type)?;
    if head {
        let response = Response::empty(StatusCode(status)).with_header(header);
        return request.respond(response).context("failed to send response");
    }
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response).context("failed to send response")
}

fn send_file(
    request: Request,
    content_type: &'static str,
    file: File,
    path: &Path,
    head: bool,
) -> Result<()> {
    let header = content_type_header(content_type)?;
    if head {
        let response = Response::empty(StatusCode(200)).with_header(header);
        return request.respond(response).context("failed to send response");
    }
    let response = Response::from_file(file).with_header(header);
    request
        .respond(response)
        .with_context(|| format!("failed to send {}", path.display()))
}

fn content_type_header(content_type: &'static str) -> Result<Header> {
    Header::from_bytes("Content-Type", content_type)
        .map_err(|_| anyhow!("invalid content type: {content_type}"))
}
