#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::{create_dir, set_permissions, Permissions};
use std::io;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::thread::{spawn, JoinHandle};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

use gethttpd::{Config, ShutdownFlag};

/// A gethttpd server running on a background thread, serving a temporary directory.
pub struct Server {
    port: u16,
    root: TempDir,
    shutdown: Arc<ShutdownFlag>,
    thread: Option<JoinHandle<anyhow::Result<()>>>,
}
impl Server {
    pub fn new() -> Self {
        Self::with_idle_timeout(Duration::from_secs(10))
    }
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        let root = tempdir().expect("failed to create tempdir");
        let config = Config {
            // Let the system choose a free port.
            port: 0,
            idle_timeout,
            poll_interval: Duration::from_millis(20),
            ..Config::default()
        }
        .with_wwwroot(root.path().to_str().expect("path is not valid UTF-8"));

        let server = gethttpd::Server::bind(config).expect("failed to bind server");
        let port = server.local_addr().expect("no local address").port();

        let shutdown = Arc::new(ShutdownFlag::new());
        let flag = Arc::clone(&shutdown);
        let thread = spawn(move || server.run(&flag));

        Self {
            port,
            root,
            shutdown,
            thread: Some(thread),
        }
    }
    pub fn root(&self) -> &Path {
        self.root.path()
    }
    pub fn create_dir(&self, name: &str) {
        create_dir(self.root().join(name)).expect("failed to create directory");
    }
    pub fn create_file(&self, name: &str, contents: &[u8]) {
        self.create_file_with_mode(name, contents, 0o644);
    }
    pub fn create_file_with_mode(&self, name: &str, contents: &[u8], mode: u32) {
        let path = self.root().join(name);
        std::fs::write(&path, contents).expect("failed to create file");
        set_permissions(&path, Permissions::from_mode(mode)).expect("failed to set mode");
    }
    pub fn stream(&self) -> TcpStream {
        let stream =
            TcpStream::connect(("127.0.0.1", self.port)).expect("failed to connect to gethttpd");
        // Set timeouts to prevent tests from hanging
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
            .set_write_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
    }
    pub fn try_stream(&self) -> io::Result<TcpStream> {
        TcpStream::connect(("127.0.0.1", self.port))
    }
    /// Send `request` as-is on a new connection and read one response.
    pub fn request(&self, request: &str) -> Response {
        let mut stream = self.stream();
        send(&mut stream, request);
        Response::from_reader(&mut stream).expect("failed to read response")
    }
    pub fn get(&self, path: &str) -> Response {
        self.request(&get_request(path, "HTTP/1.1"))
    }
    /// Stop accepting and wait for the accept loop to return.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        self.shutdown.request();
        match self.thread.take() {
            Some(thread) => thread.join().expect("server thread panicked"),
            None => Ok(()),
        }
    }
}
impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown.request();
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

pub fn get_request(path: &str, version: &str) -> String {
    format!("GET {} {}\r\nHost: localhost\r\n\r\n", path, version)
}

/// Write the whole request with one call, since the server reads a request with a single read.
pub fn send(stream: &mut TcpStream, request: &str) {
    stream
        .write_all(request.as_bytes())
        .expect("failed to send request");
}

/// Read until the server closes the connection.
pub fn read_rest(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest)?;
    Ok(rest)
}

/// HTTP Response from gethttpd.
pub struct Response {
    response_line: String,
    headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}
impl Response {
    pub fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let response_line = Self::read_header(reader)?;
        let headers = Self::read_headers(reader)?;
        let body = headers
            .get("Content-Length")
            .map(|length| length.parse::<usize>().expect("invalid content length"))
            .map(|length| Self::read_body(reader, length))
            .transpose()?;
        Ok(Self {
            response_line,
            headers,
            body,
        })
    }
    fn read_headers<R: Read>(reader: &mut R) -> io::Result<HashMap<String, String>> {
        let mut headers = HashMap::new();
        loop {
            let header_line = Self::read_header(reader)?;
            if header_line.is_empty() {
                break;
            }
            let mut header = header_line.splitn(2, ": ");
            let key = header.next().expect("invalid header").to_string();
            let value = header.next().expect("invalid header").to_string();
            headers.insert(key, value);
        }
        Ok(headers)
    }
    fn read_header<R: Read>(reader: &mut R) -> io::Result<String> {
        read_until_slice(reader, b"\r\n")
            .map(|vec| String::from_utf8(vec).expect("response header is not valid UTF-8"))
    }
    fn read_body<R: Read>(reader: &mut R, content_length: usize) -> io::Result<Vec<u8>> {
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body)?;
        Ok(body)
    }
    pub fn protocol(&self) -> &str {
        self.response_line
            .split(' ')
            .next()
            .expect("invalid response line")
    }
    pub fn status(&self) -> &str {
        self.response_line
            .splitn(2, ' ')
            .nth(1)
            .expect("invalid response line")
    }
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|name| name.as_str())
    }
    pub fn num_headers(&self) -> usize {
        self.headers.len()
    }
    pub fn text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .map(|body| std::str::from_utf8(body).expect("body is not valid UTF-8"))
    }
}

fn read_until_slice<R: Read>(reader: &mut R, separator: &[u8]) -> io::Result<Vec<u8>> {
    let mut byte = [0; 1];
    let mut buf = Vec::new();
    loop {
        reader.read_exact(&mut byte)?;
        buf.push(byte[0]);
        if buf.as_slice().ends_with(separator) {
            buf.truncate(buf.len() - separator.len());
            return Ok(buf);
        }
    }
}
