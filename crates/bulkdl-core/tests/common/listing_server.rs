//! Minimal HTTP/1.1 server that mimics a shared-folder service for integration tests.
//!
//! `GET /sh/<folder>/listing?dl=0` returns an HTML page linking every file as
//! `/sh/<folder>/<key>/<name>?dl=0`. `GET` on a file path returns its body;
//! names containing "missing" answer 404. Tracks how many requests are being
//! served at once.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const FOLDER: &str = "sh/folder01";
pub const KEY: &str = "AADkey";

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// File names listed on the page (each linked twice to exercise dedup).
    pub files: Vec<String>,
    /// Extra raw `href` values to put on the page (noise, other types).
    pub extra_links: Vec<String>,
    /// Time spent "producing" each file body.
    pub file_delay: Duration,
    /// If false, the listing page answers 500.
    pub listing_ok: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            extra_links: Vec::new(),
            file_delay: Duration::from_millis(0),
            listing_ok: true,
        }
    }
}

pub struct ListingServer {
    pub base_url: String,
    max_in_flight: Arc<AtomicUsize>,
}

impl ListingServer {
    pub fn listing_url(&self) -> String {
        format!("{}/{}/listing?dl=0", self.base_url, FOLDER)
    }

    /// Highest number of file requests served concurrently so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Deterministic body for a file name.
pub fn body_for(name: &str) -> Vec<u8> {
    name.bytes().cycle().take(4096 + name.len()).collect()
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(opts: ServerOptions) -> ListingServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}", port);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let page = Arc::new(render_listing(&base_url, &opts));
    let opts = Arc::new(opts);
    let (inf, maxf) = (in_flight, Arc::clone(&max_in_flight));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let page = Arc::clone(&page);
            let opts = Arc::clone(&opts);
            let (inf, maxf) = (Arc::clone(&inf), Arc::clone(&maxf));
            thread::spawn(move || handle(stream, &page, &opts, &inf, &maxf));
        }
    });

    ListingServer {
        base_url,
        max_in_flight,
    }
}

fn render_listing(base_url: &str, opts: &ServerOptions) -> String {
    let mut html = String::from(
        "<html><head><link href=\"/static/site.css\" rel=stylesheet></head><body>\n",
    );
    for name in &opts.files {
        let href = format!("{}/{}/{}/{}?dl=0", base_url, FOLDER, KEY, name);
        html.push_str(&format!("<a href=\"{href}\"><img src=\"thumb\"></a>\n"));
        html.push_str(&format!("<a href='{href}'>{name}</a>\n"));
    }
    for extra in &opts.extra_links {
        html.push_str(&format!("<a href={extra}>x</a>\n"));
    }
    html.push_str("</body></html>\n");
    html
}

fn handle(
    mut stream: std::net::TcpStream,
    page: &str,
    opts: &ServerOptions,
    in_flight: &AtomicUsize,
    max_in_flight: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let target = request
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/");

    if path == format!("/{}/listing", FOLDER) {
        if opts.listing_ok {
            respond(&mut stream, "200 OK", "text/html", page.as_bytes());
        } else {
            respond(&mut stream, "500 Internal Server Error", "text/plain", b"");
        }
        return;
    }

    let prefix = format!("/{}/{}/", FOLDER, KEY);
    let Some(name) = path.strip_prefix(&prefix) else {
        respond(&mut stream, "404 Not Found", "text/plain", b"");
        return;
    };

    // Counted only while the body is being produced, i.e. strictly inside the
    // client's request/response window.
    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    max_in_flight.fetch_max(now, Ordering::SeqCst);
    thread::sleep(opts.file_delay);
    let found = opts.files.iter().any(|f| f == name) && !name.contains("missing");
    in_flight.fetch_sub(1, Ordering::SeqCst);

    if found {
        respond(&mut stream, "200 OK", "image/jpeg", &body_for(name));
    } else {
        respond(&mut stream, "404 Not Found", "text/plain", b"");
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
