#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sessmux_core::{DirectoryError, Session, SessionDirectory};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
};

/// What a fake exporter answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with a `Content-Length` body.
    Body(String),
    /// 200 with a chunked body, one chunk per element.
    Chunked(Vec<String>),
    /// Bare status line without body.
    Status(u16),
    /// 200 that promises more bytes than it sends, then closes.
    Truncated(String),
    /// Accepts the connection and never answers.
    Hang,
}

/// Exporter listening on a unix socket, one response per connection.
pub struct Exporter {
    pub socket: PathBuf,
    hosts: Arc<Mutex<Vec<String>>>,
}

impl Exporter {
    pub fn spawn(socket: impl Into<PathBuf>, reply: Reply) -> Self {
        let socket = socket.into();
        let listener = UnixListener::bind(&socket).expect("bind exporter socket");
        let hosts = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&hosts);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, reply.clone(), Arc::clone(&seen)));
            }
        });

        Self { socket, hosts }
    }

    /// `Host` headers received so far.
    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }
}

async fn serve(mut stream: UnixStream, reply: Reply, seen: Arc<Mutex<Vec<String>>>) {
    let head = read_head(&mut stream).await;
    if let Some(host) = header(&head, "host") {
        seen.lock().unwrap().push(host);
    }

    let out = match reply {
        Reply::Body(body) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
        Reply::Chunked(chunks) => {
            let mut out = String::from(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
            );
            for chunk in chunks {
                out.push_str(&format!("{:x}\r\n{chunk}\r\n", chunk.len()));
            }
            out.push_str("0\r\n\r\n");
            out
        }
        Reply::Status(code) => {
            format!("HTTP/1.1 {code} Whatever\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        }
        Reply::Truncated(body) => format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len() + 64
        ),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return;
        }
    };

    let _ = stream.write_all(out.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_head(stream: &mut UnixStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

/// In-memory session directory.
#[derive(Default)]
pub struct FakeDirectory {
    sessions: Vec<(String, Option<PathBuf>)>,
    unavailable: bool,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Adds a session; `None` makes its runtime path unresolvable.
    pub fn with_session(mut self, identity: &str, runtime: Option<&Path>) -> Self {
        self.sessions
            .push((identity.to_string(), runtime.map(Path::to_path_buf)));
        self
    }
}

#[async_trait]
impl SessionDirectory for FakeDirectory {
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError> {
        if self.unavailable {
            return Err(DirectoryError::Unavailable("bus down".into()));
        }
        Ok(self
            .sessions
            .iter()
            .enumerate()
            .map(|(i, (identity, _))| Session::new(identity, format!("/user/{i}")))
            .collect())
    }

    async fn runtime_path(&self, session: &Session) -> Result<PathBuf, DirectoryError> {
        self.sessions
            .iter()
            .find(|(identity, _)| *identity == session.identity)
            .and_then(|(_, runtime)| runtime.clone())
            .ok_or_else(|| DirectoryError::Resolve {
                identity: session.identity.clone(),
                reason: "no RuntimePath".into(),
            })
    }
}

/// Creates `<root>/<name>` and returns it.
pub fn runtime_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("create runtime dir");
    dir
}

/// Number of lines of `text` equal to `line`.
pub fn count(text: &str, line: &str) -> usize {
    text.lines().filter(|l| *l == line).count()
}
