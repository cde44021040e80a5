//! Minimal loopback HTTP responder backing the fetch tests, so the suite
//! runs without touching the live services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub(crate) struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: String,
}

impl Reply {
    pub(crate) fn csv(body: &str) -> Reply {
        Reply {
            status: "200 OK",
            content_type: "text/plain",
            body: body.to_string(),
        }
    }

    pub(crate) fn json(body: &str) -> Reply {
        Reply {
            status: "200 OK",
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub(crate) fn status(status: &'static str) -> Reply {
        Reply {
            status,
            content_type: "text/plain",
            body: String::new(),
        }
    }
}

/// Binds an ephemeral loopback port and answers up to `max_requests`
/// requests with the same reply. Returns the URL to request and a counter
/// of requests actually served.
pub(crate) async fn serve(reply: Reply, max_requests: usize) -> (String, Arc<AtomicUsize>) {
    serve_script((0..max_requests).map(|_| reply.clone()).collect()).await
}

/// Like [`serve`], but answers consecutive requests with consecutive
/// replies, then stops accepting.
pub(crate) async fn serve_script(replies: Vec<Reply>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        for reply in replies {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            drain_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                reply.status,
                reply.content_type,
                reply.body.len(),
                reply.body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}"), hits)
}

/// Reads the request until the headers and any content-length body arrived,
/// so the client never sees the response before it finished sending.
async fn drain_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(header_end) = find_subslice(&buf, b"\r\n\r\n") {
            let body_received = buf.len() - (header_end + 4);
            if body_received >= content_length(&buf[..header_end]) {
                return;
            }
        }
    }
}

fn content_length(headers: &[u8]) -> usize {
    String::from_utf8_lossy(headers)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
