//! Minimal HTTP/1.1 server for the processing-API integration tests.
//!
//! Serves `POST /upload/start` and `GET /upload/status/<id>` with
//! configurable behavior: start failures, non-JSON bodies, a number of
//! `processing` polls before the final state, and token checking.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

pub const TOKEN: &str = "test-token";
pub const JOB_ID: &str = "j1";
pub const RESULT_URL: &str = "https://results.example.com/j1";

#[derive(Debug, Clone, Copy)]
pub enum FinalStatus {
    DoneWithUrl,
    DoneWithoutUrl,
    Error(Option<&'static str>),
}

#[derive(Debug, Clone, Copy)]
pub struct ApiServerOptions {
    /// HTTP status for the start endpoint.
    pub start_status: u16,
    /// If false, the start endpoint returns an HTML body instead of JSON.
    pub start_json: bool,
    /// If false, the start response omits `statusUrl` so the client derives it.
    pub include_status_url: bool,
    /// Number of `processing` responses before the final state.
    pub processing_polls: u32,
    pub final_status: FinalStatus,
}

impl Default for ApiServerOptions {
    fn default() -> Self {
        Self {
            start_status: 200,
            start_json: true,
            include_status_url: true,
            processing_polls: 0,
            final_status: FinalStatus::DoneWithUrl,
        }
    }
}

/// Starts the server on an ephemeral port. Returns the base URL (with a
/// trailing slash) and the status-poll counter. Runs until the process exits.
pub fn start(opts: ApiServerOptions) -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}/", port);
    let polls = Arc::new(AtomicU32::new(0));

    let server_base = base.clone();
    let server_polls = Arc::clone(&polls);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let base = server_base.clone();
            let polls = Arc::clone(&server_polls);
            thread::spawn(move || handle(stream, opts, &base, &polls));
        }
    });

    (base, polls)
}

fn handle(
    mut stream: std::net::TcpStream,
    opts: ApiServerOptions,
    base: &str,
    polls: &AtomicU32,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, token) = parse_request(request);

    if token.as_deref() != Some(TOKEN) {
        respond(&mut stream, 401, r#"{"error":"bad token"}"#);
        return;
    }

    if method.eq_ignore_ascii_case("POST") && path == "/upload/start" {
        if !opts.start_json {
            respond(&mut stream, opts.start_status, "<html>service busy</html>");
            return;
        }
        let body = if opts.include_status_url {
            format!(
                r#"{{"jobId":"{}","statusUrl":"{}upload/status/{}"}}"#,
                JOB_ID, base, JOB_ID
            )
        } else {
            format!(r#"{{"jobId":"{}"}}"#, JOB_ID)
        };
        respond(&mut stream, opts.start_status, &body);
        return;
    }

    if method.eq_ignore_ascii_case("GET") && path.starts_with("/upload/status/") {
        let attempt = polls.fetch_add(1, Ordering::SeqCst) + 1;
        let body = if attempt <= opts.processing_polls {
            r#"{"state":"processing"}"#.to_string()
        } else {
            match opts.final_status {
                FinalStatus::DoneWithUrl => {
                    format!(r#"{{"state":"done","url":"{}"}}"#, RESULT_URL)
                }
                FinalStatus::DoneWithoutUrl => r#"{"state":"done"}"#.to_string(),
                FinalStatus::Error(Some(message)) => {
                    format!(r#"{{"state":"error","message":"{}"}}"#, message)
                }
                FinalStatus::Error(None) => r#"{"state":"error"}"#.to_string(),
            }
        };
        respond(&mut stream, 200, &body);
        return;
    }

    respond(&mut stream, 404, r#"{"error":"not found"}"#);
}

fn respond(stream: &mut std::net::TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Returns (method, path, X-Upload-Token value).
fn parse_request(request: &str) -> (&str, &str, Option<String>) {
    let mut method = "";
    let mut path = "";
    let mut token = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("x-upload-token") {
                token = Some(value.trim().to_string());
            }
        }
    }
    (method, path, token)
}
