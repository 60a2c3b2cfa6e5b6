//! HTTP/1.1 serving on `may` coroutines.
//!
//! One coroutine accepts connections and each connection gets its own coroutine running a
//! keep-alive loop: read into a buffer, parse every complete request with `httparse`, answer
//! it through an [`HttpService`], then flush. Request heads are parsed into `N` header slots
//! ([`MAX_REQUEST_HEADERS`] by default) and responses own their header lines, so a long-running
//! server allocates nothing that outlives the request.

use super::request::Request;
use super::response::Response;
use bytes::{Buf, BytesMut};
use may::coroutine::{self, JoinHandle};
use may::go;
use may::net::{TcpListener, TcpStream};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, ToSocketAddrs};
use tracing::{debug, warn};

/// Header slots per request. API gateways and proxies routinely add more than a dozen.
pub const MAX_REQUEST_HEADERS: usize = 32;

/// Largest request head (request line plus headers) accepted before answering 431.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Largest request body accepted before answering 413.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Answers one parsed request. A clone serves each connection.
pub trait HttpService {
    fn call(&mut self, req: Request<'_>, res: &mut Response) -> io::Result<()>;
}

/// HTTP server accepting up to `N` headers per request.
pub struct HttpServerWithHeaders<T, const N: usize>(pub T);

/// Handle to a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Bound address. With port 0 this is the port the OS picked.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Cancel the accept loop and wait for it. Open connections finish their current request.
    pub fn stop(self) {
        // SAFETY: cancel() is unsafe in the may runtime. The accept coroutine only owns the
        // listener and the service prototype, both of which drop cleanly on cancellation.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the accept loop exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T, const N: usize> HttpServerWithHeaders<T, N>
where
    T: HttpService + Clone + Send + 'static,
{
    /// Bind `addr` and start accepting.
    ///
    /// The listener is bound before this returns, so connections made afterwards queue in the
    /// backlog until the accept coroutine picks them up.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let service = self.0;
        let handle = go!(
            coroutine::Builder::new().name("routeshim-accept".to_owned()),
            move || {
                for stream in listener.incoming() {
                    let mut stream = match stream {
                        Ok(stream) => stream,
                        Err(e) => {
                            warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };
                    let service = service.clone();
                    go!(move || {
                        if let Err(e) = serve_connection::<T, N>(&mut stream, service) {
                            debug!(error = %e, "Connection ended with error");
                        }
                        stream.shutdown(Shutdown::Both).ok();
                    });
                }
            }
        )?;
        debug!(addr = %addr, max_headers = N, "Accept loop started");
        Ok(ServerHandle { addr, handle })
    }
}

/// Outcome of looking at the front of a connection buffer.
#[derive(Debug, PartialEq)]
enum Step {
    /// The next request is not complete yet.
    Partial,
    /// A request was answered and `consumed` bytes belong to it.
    Answered { consumed: usize, keep_alive: bool },
    /// The request cannot be served. Answer with this status and close.
    Reject(u16),
}

fn serve_connection<T: HttpService, const N: usize>(
    stream: &mut TcpStream,
    mut service: T,
) -> io::Result<()> {
    let peer = stream.peer_addr().ok();
    let mut req_buf = BytesMut::with_capacity(READ_CHUNK);
    let mut rsp_buf = BytesMut::with_capacity(READ_CHUNK);

    loop {
        let mut open = true;
        while open && !req_buf.is_empty() {
            match next_request::<T, N>(&mut service, peer, &req_buf, &mut rsp_buf) {
                Step::Partial => break,
                Step::Answered {
                    consumed,
                    keep_alive,
                } => {
                    req_buf.advance(consumed);
                    open = keep_alive;
                }
                Step::Reject(status) => {
                    let mut res = Response::rejection(status);
                    res.header("Connection", "close");
                    res.encode(&mut rsp_buf);
                    open = false;
                }
            }
        }

        if !rsp_buf.is_empty() {
            stream.write_all(&rsp_buf)?;
            rsp_buf.clear();
        }
        if !open {
            return Ok(());
        }

        let filled = req_buf.len();
        req_buf.resize(filled + READ_CHUNK, 0);
        let read = stream.read(&mut req_buf[filled..])?;
        req_buf.truncate(filled + read);
        if read == 0 {
            return Ok(());
        }
    }
}

fn next_request<T: HttpService, const N: usize>(
    service: &mut T,
    peer: Option<SocketAddr>,
    buf: &[u8],
    out: &mut BytesMut,
) -> Step {
    let mut headers = [httparse::EMPTY_HEADER; N];
    let mut parsed = httparse::Request::new(&mut headers);
    let head_len = match parsed.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) if buf.len() > MAX_HEAD_BYTES => return Step::Reject(431),
        Ok(httparse::Status::Partial) => return Step::Partial,
        Err(httparse::Error::TooManyHeaders) => {
            warn!(limit = N, "Request exceeds the header limit");
            return Step::Reject(431);
        }
        Err(e) => {
            debug!(error = %e, "Malformed request head");
            return Step::Reject(400);
        }
    };

    let content_length = match body_length(parsed.headers) {
        Ok(len) if len > MAX_BODY_BYTES => return Step::Reject(413),
        Ok(len) => len,
        Err(status) => return Step::Reject(status),
    };
    let consumed = head_len + content_length;
    if buf.len() < consumed {
        return Step::Partial;
    }

    let version = parsed.version.unwrap_or(1);
    let keep_alive = keep_alive(version, parsed.headers);
    let req = Request::new(
        parsed.method.unwrap_or("GET"),
        parsed.path.unwrap_or("/"),
        version,
        parsed.headers,
        &buf[head_len..consumed],
    )
    .with_peer(peer);

    let mut res = Response::default();
    if let Err(e) = service.call(req, &mut res) {
        warn!(error = %e, "Service failed");
        res = Response::rejection(500);
    }
    if !keep_alive {
        res.header("Connection", "close");
    }
    res.encode(out);
    Step::Answered {
        consumed,
        keep_alive,
    }
}

/// `Content-Length` of the request. Chunked bodies are not supported.
fn body_length(headers: &[httparse::Header<'_>]) -> Result<usize, u16> {
    let mut length = 0;
    for h in headers {
        if h.name.eq_ignore_ascii_case("transfer-encoding") {
            return Err(501);
        }
        if h.name.eq_ignore_ascii_case("content-length") {
            length = std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or(400u16)?;
        }
    }
    Ok(length)
}

/// HTTP/1.1 keeps the connection unless told otherwise; HTTP/1.0 closes unless asked not to.
fn keep_alive(version: u8, headers: &[httparse::Header<'_>]) -> bool {
    match headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("connection"))
    {
        Some(h) if h.value.eq_ignore_ascii_case(b"close") => false,
        Some(h) if h.value.eq_ignore_ascii_case(b"keep-alive") => true,
        _ => version >= 1,
    }
}
