#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request seen by [`StubServer`].
#[derive(Debug, Clone)]
pub struct Recorded {
	pub method: String,
	pub path: String,
	pub headers: Vec<(String, String)>,
	pub body: String,
}

impl Recorded {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

type Responder = dyn Fn(&Recorded) -> (u16, String, Vec<(String, String)>) + Send + Sync;

/// One-response-per-connection HTTP/1.1 server for exercising the API client.
pub struct StubServer {
	pub addr: SocketAddr,
	requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
	pub async fn start(respond: impl Fn(&Recorded) -> (u16, String, Vec<(String, String)>) + Send + Sync + 'static) -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let requests = Arc::new(Mutex::new(Vec::new()));
		let respond: Arc<Responder> = Arc::new(respond);

		let seen = Arc::clone(&requests);
		tokio::spawn(async move {
			while let Ok((stream, _)) = listener.accept().await {
				let respond = Arc::clone(&respond);
				let seen = Arc::clone(&seen);
				tokio::spawn(async move {
					let _ = handle(stream, respond, seen).await;
				});
			}
		});

		Self { addr, requests }
	}

	pub fn api_url(&self) -> String {
		format!("http://{}/api", self.addr)
	}

	pub fn requests(&self) -> Vec<Recorded> {
		self.requests.lock().clone()
	}
}

async fn handle(mut stream: TcpStream, respond: Arc<Responder>, seen: Arc<Mutex<Vec<Recorded>>>) -> std::io::Result<()> {
	let mut buffer = Vec::new();
	let mut chunk = [0u8; 4096];
	let header_end = loop {
		let read = stream.read(&mut chunk).await?;
		if read == 0 {
			return Ok(());
		}
		buffer.extend_from_slice(&chunk[..read]);
		if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
			break position + 4;
		}
	};

	let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
	let mut lines = head.lines();
	let mut request_line = lines.next().unwrap_or_default().split_whitespace();
	let method = request_line.next().unwrap_or_default().to_string();
	let path = request_line.next().unwrap_or_default().to_string();
	let headers: Vec<(String, String)> = lines
		.filter_map(|line| line.split_once(':'))
		.map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
		.collect();
	let length = headers
		.iter()
		.find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
		.and_then(|(_, value)| value.parse::<usize>().ok())
		.unwrap_or(0);

	let mut body = buffer[header_end..].to_vec();
	while body.len() < length {
		let read = stream.read(&mut chunk).await?;
		if read == 0 {
			break;
		}
		body.extend_from_slice(&chunk[..read]);
	}

	let recorded = Recorded {
		method,
		path,
		headers,
		body: String::from_utf8_lossy(&body).to_string(),
	};
	let (status, payload, extra_headers) = respond(&recorded);
	seen.lock().push(recorded);

	let mut response = format!(
		"HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
		payload.len()
	);
	for (key, value) in extra_headers {
		response.push_str(&format!("{key}: {value}\r\n"));
	}
	response.push_str("\r\n");
	response.push_str(&payload);
	stream.write_all(response.as_bytes()).await?;
	stream.shutdown().await
}
