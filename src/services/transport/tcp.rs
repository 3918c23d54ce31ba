//! TCP transport implementation.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over plaintext TCP or TLS. A
//! reader task owns the receive side of the stream, correlating responses
//! to in-flight requests by id and fanning server-pushed notifications out
//! to per-topic subscribers.

use std::{
	collections::HashMap,
	pin::Pin,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	time::Duration,
};

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use serde_json::{json, Value};
use tokio::{
	io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf},
	net::TcpStream,
	sync::{mpsc, oneshot, Mutex},
	task::JoinHandle,
	time::timeout,
};
use tokio_rustls::{client::TlsStream, TlsConnector};
use tracing::{debug, warn};

use crate::{
	models::{ClientConfig, Peer, Protocol},
	services::transport::{
		ConnectInfo, Connection, ElectrumTransport, TransportError, TransportFactory,
	},
};

/// Abstraction over TCP and TLS streams for peer connections
pub enum PeerStream {
	/// Plain TCP connection
	Tcp(TcpStream),
	/// TLS-encrypted connection
	Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for PeerStream {
	fn poll_read(
		self: Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
		buf: &mut tokio::io::ReadBuf<'_>,
	) -> std::task::Poll<std::io::Result<()>> {
		match self.get_mut() {
			PeerStream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
			PeerStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
		}
	}
}

impl AsyncWrite for PeerStream {
	fn poll_write(
		self: Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
		buf: &[u8],
	) -> std::task::Poll<std::io::Result<usize>> {
		match self.get_mut() {
			PeerStream::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
			PeerStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
		}
	}

	fn poll_flush(
		self: Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<std::io::Result<()>> {
		match self.get_mut() {
			PeerStream::Tcp(stream) => Pin::new(stream).poll_flush(cx),
			PeerStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
		}
	}

	fn poll_shutdown(
		self: Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<std::io::Result<()>> {
		match self.get_mut() {
			PeerStream::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
			PeerStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
		}
	}
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, TransportError>>>>>;
type Subscribers = Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>>;

/// Factory producing [`TcpTransport`] connections.
///
/// Carries the TLS connector used for `Protocol::Ssl` peers; by default it
/// trusts the bundled web PKI roots, and a custom connector can be injected
/// for servers with their own certificate arrangements.
#[derive(Clone)]
pub struct TcpTransportFactory {
	config: ClientConfig,
	tls: TlsConnector,
}

impl TcpTransportFactory {
	/// Creates a factory with a TLS connector trusting the bundled roots
	pub fn new(config: ClientConfig) -> Self {
		let mut roots = rustls::RootCertStore::empty();
		roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
		let tls_config = rustls::ClientConfig::builder()
			.with_root_certificates(roots)
			.with_no_client_auth();
		Self {
			config,
			tls: TlsConnector::from(Arc::new(tls_config)),
		}
	}

	/// Creates a factory with a caller-provided TLS connector
	pub fn with_tls_connector(config: ClientConfig, tls: TlsConnector) -> Self {
		Self { config, tls }
	}
}

#[async_trait]
impl TransportFactory for TcpTransportFactory {
	type Transport = TcpTransport;

	async fn connect(&self, peer: &Peer) -> Result<Connection<TcpTransport>, TransportError> {
		let connect = TcpStream::connect((peer.host.as_str(), peer.port));
		let tcp = match timeout(self.config.connect_timeout, connect).await {
			Ok(Ok(stream)) => stream,
			Ok(Err(e)) => {
				return Err(TransportError::network(
					format!("Failed to connect to {}", peer),
					Some(Box::new(e)),
					None,
				))
			}
			Err(_) => {
				return Err(TransportError::timeout(
					format!("Connection to {} timed out", peer),
					None,
					None,
				))
			}
		};

		tcp.set_nodelay(true).map_err(|e| {
			TransportError::network(
				format!("Failed to configure socket for {}", peer),
				Some(Box::new(e)),
				None,
			)
		})?;

		let stream = match peer.protocol {
			Protocol::Tcp => PeerStream::Tcp(tcp),
			Protocol::Ssl => {
				let server_name = ServerName::try_from(peer.host.clone()).map_err(|e| {
					TransportError::tls(
						format!("Invalid TLS server name '{}'", peer.host),
						Some(Box::new(e)),
						None,
					)
				})?;
				let handshake = self.tls.connect(server_name, tcp);
				match timeout(self.config.connect_timeout, handshake).await {
					Ok(Ok(tls_stream)) => PeerStream::Tls(Box::new(tls_stream)),
					Ok(Err(e)) => {
						return Err(TransportError::network(
							format!("TLS handshake with {} failed", peer),
							Some(Box::new(e)),
							None,
						))
					}
					Err(_) => {
						return Err(TransportError::timeout(
							format!("TLS handshake with {} timed out", peer),
							None,
							None,
						))
					}
				}
			}
		};

		debug!(peer = %peer, "connected");

		let info = ConnectInfo {
			host: peer.host.clone(),
			port: peer.port,
		};
		let transport = TcpTransport::start(peer.clone(), stream, self.config.request_timeout);
		Ok(Connection { transport, info })
	}
}

/// One live newline-delimited JSON-RPC connection
pub struct TcpTransport {
	peer: Peer,
	writer: Mutex<WriteHalf<PeerStream>>,
	pending: Pending,
	subscribers: Subscribers,
	next_id: AtomicU64,
	reader: JoinHandle<()>,
	request_timeout: Duration,
}

impl TcpTransport {
	fn start(peer: Peer, stream: PeerStream, request_timeout: Duration) -> Self {
		let (read_half, write_half) = tokio::io::split(stream);
		let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
		let subscribers: Subscribers = Arc::new(Mutex::new(HashMap::new()));

		let reader = tokio::spawn(read_loop(
			read_half,
			pending.clone(),
			subscribers.clone(),
			peer.clone(),
		));

		Self {
			peer,
			writer: Mutex::new(write_half),
			pending,
			subscribers,
			next_id: AtomicU64::new(0),
			reader,
			request_timeout,
		}
	}

	pub fn peer(&self) -> &Peer {
		&self.peer
	}
}

#[async_trait]
impl ElectrumTransport for TcpTransport {
	async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let payload = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});
		let mut line = serde_json::to_string(&payload).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;
		line.push('\n');

		let (tx, rx) = oneshot::channel();
		self.pending.lock().await.insert(id, tx);

		{
			let mut writer = self.writer.lock().await;
			if let Err(e) = writer.write_all(line.as_bytes()).await {
				self.pending.lock().await.remove(&id);
				return Err(TransportError::network(
					format!("Failed to send request to {}", self.peer),
					Some(Box::new(e)),
					None,
				));
			}
		}

		match timeout(self.request_timeout, rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(TransportError::closed(
				format!("Connection to {} closed before a response arrived", self.peer),
				None,
				None,
			)),
			Err(_) => {
				self.pending.lock().await.remove(&id);
				Err(TransportError::timeout(
					format!("Request '{}' to {} timed out", method, self.peer),
					None,
					None,
				))
			}
		}
	}

	async fn subscribe(
		&self,
		topic: &str,
	) -> Result<mpsc::UnboundedReceiver<Value>, TransportError> {
		if self.reader.is_finished() {
			return Err(TransportError::closed(
				format!("Connection to {} closed", self.peer),
				None,
				None,
			));
		}

		let (tx, rx) = mpsc::unbounded_channel();
		self.subscribers
			.lock()
			.await
			.entry(topic.to_string())
			.or_default()
			.push(tx);
		Ok(rx)
	}

	async fn close(&self) {
		self.reader.abort();

		{
			let mut writer = self.writer.lock().await;
			let _ = writer.shutdown().await;
		}

		for (_, tx) in self.pending.lock().await.drain() {
			let _ = tx.send(Err(TransportError::closed(
				format!("Connection to {} closed", self.peer),
				None,
				None,
			)));
		}
		self.subscribers.lock().await.clear();

		debug!(peer = %self.peer, "transport closed");
	}
}

impl Drop for TcpTransport {
	fn drop(&mut self) {
		self.reader.abort();
	}
}

/// Receive side of the connection: one line per message.
///
/// Lines with an `id` complete their in-flight request; lines with a
/// `method` are server pushes fanned out to that topic's subscribers.
async fn read_loop(
	read_half: ReadHalf<PeerStream>,
	pending: Pending,
	subscribers: Subscribers,
	peer: Peer,
) {
	let mut lines = BufReader::new(read_half).lines();

	loop {
		match lines.next_line().await {
			Ok(Some(line)) => {
				let message: Value = match serde_json::from_str(&line) {
					Ok(message) => message,
					Err(e) => {
						warn!(peer = %peer, error = %e, "discarding unparseable line");
						continue;
					}
				};
				dispatch_message(message, &pending, &subscribers).await;
			}
			Ok(None) => break,
			Err(e) => {
				warn!(peer = %peer, error = %e, "read failed, closing connection");
				break;
			}
		}
	}

	// The connection is gone: fail everything still waiting and drop the
	// push channels so receivers observe the end of the stream.
	for (_, tx) in pending.lock().await.drain() {
		let _ = tx.send(Err(TransportError::closed(
			format!("Connection to {} closed", peer),
			None,
			None,
		)));
	}
	subscribers.lock().await.clear();
}

async fn dispatch_message(message: Value, pending: &Pending, subscribers: &Subscribers) {
	if let Some(id) = message.get("id").and_then(Value::as_u64) {
		let result = match message.get("error") {
			Some(error) if !error.is_null() => {
				let msg = error
					.get("message")
					.and_then(Value::as_str)
					.map(str::to_string)
					.unwrap_or_else(|| error.to_string());
				let metadata = error
					.get("code")
					.and_then(Value::as_i64)
					.map(|code| HashMap::from([("code".to_string(), code.to_string())]));
				Err(TransportError::rpc(msg, None, metadata))
			}
			_ => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
		};

		if let Some(tx) = pending.lock().await.remove(&id) {
			let _ = tx.send(result);
		}
	} else if let Some(method) = message.get("method").and_then(Value::as_str) {
		let params = message.get("params").cloned().unwrap_or(Value::Null);
		let mut subscribers = subscribers.lock().await;
		if let Some(senders) = subscribers.get_mut(method) {
			senders.retain(|tx| tx.send(params.clone()).is_ok());
		}
	}
}
