use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use rand::rngs::StdRng;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{error, info, warn};

use crate::{
    error::{TrailreelError, TrailreelResult},
    generate::Generator,
};

/// Default bind address of the web front end.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

const MAX_HEAD_LEN: usize = 16 * 1024;

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>🚴‍♂️ Riding Roney Video Generator</title>
</head>
<body>
<h1>🚴‍♂️ Riding Roney</h1>
<p>One click creates a fresh riding video from a random story.</p>
<form method="post" action="/create">
<button type="submit">CREATE</button>
</form>
</body>
</html>
"#;

const HEALTH_MESSAGE: &str = "🚴‍♂️ Riding Roney Video Generator is running!";

/// Generator plus its random source, locked together so concurrent requests
/// serialize on one pick-then-render unit.
struct Shared {
    generator: Generator,
    rng: StdRng,
}

type SharedState = Arc<Mutex<Shared>>;

#[derive(Debug, PartialEq, Eq)]
struct Request {
    method: String,
    target: String,
}

fn parse_request(head: &str) -> TrailreelResult<Request> {
    let mut lines = head.lines();
    let request_line = lines
        .next()
        .ok_or_else(|| TrailreelError::validation("empty request"))?;

    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| TrailreelError::validation("missing request method"))?;
    let target = parts
        .next()
        .ok_or_else(|| TrailreelError::validation("missing request target"))?;
    let version = parts
        .next()
        .ok_or_else(|| TrailreelError::validation("missing http version"))?;
    if !version.starts_with("HTTP/") {
        return Err(TrailreelError::validation(format!(
            "unsupported protocol '{version}'"
        )));
    }

    Ok(Request {
        method: method.to_string(),
        target: target.to_string(),
    })
}

struct Response {
    status: u16,
    reason: &'static str,
    content_type: &'static str,
    extra_headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    fn html(body: &str) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: "text/html; charset=utf-8",
            extra_headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn text(body: &str) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: "text/plain; charset=utf-8",
            extra_headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn attachment(file_name: &str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: "application/octet-stream",
            extra_headers: vec![(
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{file_name}\""),
            )],
            body,
        }
    }

    fn error_page(status: u16, reason: &'static str, message: &str) -> Self {
        Self {
            status,
            reason,
            content_type: "text/plain; charset=utf-8",
            extra_headers: Vec::new(),
            body: message.as_bytes().to_vec(),
        }
    }

    fn bad_request() -> Self {
        Self::error_page(400, "Bad Request", "bad request\n")
    }

    fn not_found() -> Self {
        Self::error_page(404, "Not Found", "not found\n")
    }

    fn internal_error() -> Self {
        Self::error_page(500, "Internal Server Error", "video generation failed\n")
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            self.reason,
            self.content_type,
            self.body.len()
        );
        for (name, value) in &self.extra_headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Render a clip under the shared lock and stream it back as a download.
async fn create_video(state: &SharedState) -> Response {
    let state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut shared = state
            .lock()
            .map_err(|_| TrailreelError::render("generator lock poisoned"))?;
        let Shared { generator, rng } = &mut *shared;
        let artifact = generator.generate(rng)?;
        let bytes = std::fs::read(&artifact.path)?;
        Ok::<_, TrailreelError>((artifact, bytes))
    })
    .await;

    match outcome {
        Ok(Ok((artifact, bytes))) => {
            info!(file = %artifact.file_name, bytes = bytes.len(), "video created");
            Response::attachment(&artifact.file_name, bytes)
        }
        Ok(Err(e)) => {
            error!(error = %e, "video generation failed");
            Response::internal_error()
        }
        Err(e) => {
            error!(error = %e, "generation task aborted");
            Response::internal_error()
        }
    }
}

async fn route(state: &SharedState, req: &Request) -> Response {
    match (req.method.as_str(), req.target.as_str()) {
        ("GET", "/") => Response::html(LANDING_PAGE),
        ("GET", "/health") => Response::text(HEALTH_MESSAGE),
        ("POST", "/create") => create_video(state).await,
        _ => Response::not_found(),
    }
}

async fn read_head(stream: &mut TcpStream) -> TrailreelResult<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let scan_from = buf.len().saturating_sub(n + 3);
        if buf[scan_from..].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > MAX_HEAD_LEN {
            return Err(TrailreelError::validation("request head too large"));
        }
    }
    String::from_utf8(buf).map_err(|_| TrailreelError::validation("request head is not utf-8"))
}

async fn handle_connection(mut stream: TcpStream, state: SharedState) -> TrailreelResult<()> {
    let head = read_head(&mut stream).await?;
    let response = match parse_request(&head) {
        Ok(req) => {
            info!(method = %req.method, target = %req.target, "request");
            route(&state, &req).await
        }
        Err(e) => {
            warn!(error = %e, "malformed request");
            Response::bad_request()
        }
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Accept loop of the one-button front end. Runs until the task is dropped.
pub async fn serve(addr: SocketAddr, generator: Generator, rng: StdRng) -> TrailreelResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    let state: SharedState = Arc::new(Mutex::new(Shared { generator, rng }));
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                error!(peer = %peer, error = %e, "connection failed");
            }
        });
    }
}
