use crate::config::Config;
use crate::context::WorkerContext;
use clap::Parser;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use task_store::TaskStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned-response HTTP server bound to an ephemeral localhost port, for
/// exercising the worker's outbound calls over a real socket. Every request
/// gets the same status and body; hit counts and request bodies are recorded.
pub struct TestServer {
	addr: SocketAddr,
	hits: Arc<AtomicUsize>,
	bodies: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
	pub async fn start(status: u16, body: &'static str) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let hits = Arc::new(AtomicUsize::new(0));
		let bodies = Arc::new(Mutex::new(Vec::new()));

		let accept_hits = Arc::clone(&hits);
		let accept_bodies = Arc::clone(&bodies);
		tokio::spawn(async move {
			while let Ok((socket, _)) = listener.accept().await {
				let hits = Arc::clone(&accept_hits);
				let bodies = Arc::clone(&accept_bodies);
				tokio::spawn(async move {
					respond(socket, status, body, &hits, &bodies).await;
				});
			}
		});

		Self { addr, hits, bodies }
	}

	pub fn url(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn hits(&self) -> usize {
		self.hits.load(Ordering::SeqCst)
	}

	pub fn last_body(&self) -> Option<String> {
		self.bodies.lock().unwrap().last().cloned()
	}
}

async fn respond(mut socket: TcpStream, status: u16, body: &str, hits: &AtomicUsize, bodies: &Mutex<Vec<String>>) {
	let mut buf = Vec::new();
	let mut tmp = [0_u8; 4096];
	loop {
		let Ok(n) = socket.read(&mut tmp).await else { return };
		if n == 0 {
			break;
		}
		buf.extend_from_slice(&tmp[..n]);
		if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
			let expected = content_length(&buf[..header_end]);
			if buf.len() >= header_end + 4 + expected {
				bodies.lock().unwrap().push(String::from_utf8_lossy(&buf[header_end + 4..]).into_owned());
				break;
			}
		}
	}
	hits.fetch_add(1, Ordering::SeqCst);

	let reason = if status < 400 { "OK" } else { "ERROR" };
	let response = format!(
		"HTTP/1.1 {status} {reason}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
		body.len()
	);
	let _ = socket.write_all(response.as_bytes()).await;
	let _ = socket.shutdown().await;
}

fn content_length(headers: &[u8]) -> usize {
	String::from_utf8_lossy(headers)
		.lines()
		.find_map(|line| {
			let (name, value) = line.split_once(':')?;
			if name.trim().eq_ignore_ascii_case("content-length") {
				value.trim().parse().ok()
			} else {
				None
			}
		})
		.unwrap_or(0)
}

pub fn test_config(extra: &[&str]) -> Config {
	let mut args = vec!["transcription-worker", "--openai-api-key", "sk-test"];
	args.extend_from_slice(extra);
	Config::try_parse_from(args).unwrap()
}

/// Worker context over a fresh in-memory store. The pool handle is returned
/// so tests can seed task rows directly.
pub async fn worker_context(config: Config) -> (Arc<WorkerContext>, SqlitePool) {
	let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
	let store = TaskStore::new(pool.clone());
	store.init_schema().await.unwrap();
	(WorkerContext::new(config, store).unwrap(), pool)
}
