//! Just enough HTTP/1.0 to issue a single GET and collect the body.
//!
//! HTTP/1.0 with `Connection: close` means the server delimits the body by closing the
//! connection, so there is no chunked decoding to worry about.

use embedded_io_async::{Error as _, Read, Write};
use thiserror::Error;

/// Opens a TCP stream to `host:port`, resolving the name if needed.
#[allow(async_fn_in_trait)]
pub trait TcpConnector {
    type Error: core::fmt::Debug;
    type Connection<'a>: Read + Write
    where
        Self: 'a;

    async fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection<'_>, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("Connect failed")]
    Connect,
    #[error("Socket I/O failed")]
    Io,
    #[error("Response larger than the receive buffer")]
    Overflow,
    #[error("Malformed response")]
    Malformed,
}

pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, PartialEq, Eq)]
pub struct Response<'b> {
    pub status: u16,
    pub body: &'b [u8],
}

impl Response<'_> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub async fn get<'b, C: TcpConnector>(
    connector: &mut C,
    host: &str,
    port: u16,
    path: &str,
    buf: &'b mut [u8],
) -> HttpResult<Response<'b>> {
    let mut connection = connector.connect(host, port).await.map_err(|err| {
        log::warn!("Connecting to {host}:{port} failed: {err:?}");
        HttpError::Connect
    })?;

    for part in [
        "GET ",
        path,
        " HTTP/1.0\r\nHost: ",
        host,
        "\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
    ] {
        connection.write_all(part.as_bytes()).await.map_err(|err| {
            log::warn!("HTTP write failed: {:?}", err.kind());
            HttpError::Io
        })?;
    }
    connection.flush().await.map_err(|err| {
        log::warn!("HTTP flush failed: {:?}", err.kind());
        HttpError::Io
    })?;

    let mut len = 0;
    loop {
        if len == buf.len() {
            return Err(HttpError::Overflow);
        }
        match connection.read(&mut buf[len..]).await {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(err) => {
                log::warn!("HTTP read failed: {:?}", err.kind());
                return Err(HttpError::Io);
            }
        }
    }
    log::debug!("HTTP response: {len} bytes");

    parse_response(&buf[..len])
}

/// Splits a complete response into status and body.
pub fn parse_response(raw: &[u8]) -> HttpResult<Response<'_>> {
    let header_end = raw
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or(HttpError::Malformed)?;
    let head = core::str::from_utf8(&raw[..header_end]).map_err(|_| HttpError::Malformed)?;
    let mut body = &raw[header_end + 4..];

    let mut lines = head.split("\r\n");
    let mut status_line = lines.next().unwrap_or("").split_whitespace();
    let status = match (status_line.next(), status_line.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => {
            code.parse::<u16>().map_err(|_| HttpError::Malformed)?
        }
        _ => return Err(HttpError::Malformed),
    };

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| HttpError::Malformed)?;
            body = body.get(..length).ok_or(HttpError::Malformed)?;
        }
    }

    Ok(Response { status, body })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::vec::Vec;

    use embassy_futures::block_on;
    use embedded_io_async::{ErrorKind, ErrorType};

    use super::*;

    /// A scripted peer: hands out `response` in `chunk`-sized reads and records the request.
    pub(crate) struct ScriptedSocket {
        pub response: &'static [u8],
        pub chunk: usize,
        pub position: usize,
        pub request: Vec<u8>,
    }

    impl ScriptedSocket {
        pub fn new(response: &'static [u8]) -> Self {
            Self {
                response,
                chunk: 7,
                position: 0,
                request: Vec::new(),
            }
        }
    }

    impl ErrorType for ScriptedSocket {
        type Error = ErrorKind;
    }

    impl Read for ScriptedSocket {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
            let rest = &self.response[self.position..];
            let n = rest.len().min(buf.len()).min(self.chunk);
            buf[..n].copy_from_slice(&rest[..n]);
            self.position += n;
            Ok(n)
        }
    }

    impl Write for ScriptedSocket {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
            self.request.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), ErrorKind> {
            Ok(())
        }
    }

    /// Serves one scripted socket per connect, in order; refuses once they run out.
    pub(crate) struct ScriptedConnector {
        pub sockets: Vec<ScriptedSocket>,
        pub next: usize,
        pub hosts: Vec<(std::string::String, u16)>,
    }

    impl ScriptedConnector {
        pub fn new(responses: &[&'static [u8]]) -> Self {
            Self {
                sockets: responses.iter().copied().map(ScriptedSocket::new).collect(),
                next: 0,
                hosts: Vec::new(),
            }
        }
    }

    impl TcpConnector for ScriptedConnector {
        type Error = &'static str;
        type Connection<'a> = &'a mut ScriptedSocket;

        async fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection<'_>, Self::Error> {
            self.hosts.push((host.into(), port));
            let socket = self.sockets.get_mut(self.next).ok_or("connection refused")?;
            self.next += 1;
            Ok(socket)
        }
    }

    #[test]
    fn sends_http10_get() {
        let mut connector = ScriptedConnector::new(&[b"HTTP/1.1 200 OK\r\n\r\n{}"]);
        let mut buf = [0u8; 128];
        let response = block_on(get(&mut connector, "example.org", 8080, "/api/x", &mut buf)).unwrap();
        assert_eq!(response, Response { status: 200, body: b"{}" });
        assert_eq!(connector.hosts, vec![(std::string::String::from("example.org"), 8080)]);
        assert_eq!(
            connector.sockets[0].request,
            b"GET /api/x HTTP/1.0\r\nHost: example.org\r\nAccept: application/json\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn content_length_trims_body() {
        let raw = b"HTTP/1.0 200 OK\r\nContent-Type: application/json\r\ncontent-length: 2\r\n\r\n{}garbage";
        assert_eq!(parse_response(raw).unwrap().body, b"{}");
    }

    #[test]
    fn content_length_past_end_is_malformed() {
        let raw = b"HTTP/1.0 200 OK\r\nContent-Length: 20\r\n\r\n{}";
        assert_eq!(parse_response(raw), Err(HttpError::Malformed));
    }

    #[test]
    fn status_is_reported() {
        let response = parse_response(b"HTTP/1.1 404 Not Found\r\n\r\nnope").unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(parse_response(b"hello"), Err(HttpError::Malformed));
        assert_eq!(parse_response(b"SMTP 220\r\n\r\n"), Err(HttpError::Malformed));
        assert_eq!(parse_response(b"HTTP/1.1 abc\r\n\r\n"), Err(HttpError::Malformed));
    }

    #[test]
    fn refused_connection() {
        let mut connector = ScriptedConnector::new(&[]);
        let mut buf = [0u8; 16];
        assert_eq!(
            block_on(get(&mut connector, "example.org", 80, "/", &mut buf)),
            Err(HttpError::Connect)
        );
    }

    #[test]
    fn response_must_fit_buffer() {
        let mut connector = ScriptedConnector::new(&[b"HTTP/1.1 200 OK\r\n\r\n0123456789"]);
        let mut buf = [0u8; 16];
        assert_eq!(
            block_on(get(&mut connector, "example.org", 80, "/", &mut buf)),
            Err(HttpError::Overflow)
        );
    }
}
