use mockall::predicate::eq;
use serde_json::{json, Value};

use electrum_pool::{
	models::{Peer, Protocol},
	services::connection::{Session, SessionState},
};

use crate::integration::mocks::MockRawTransport;

fn peer() -> Peer {
	Peer::new("electrum.example.org", 50002, Protocol::Ssl)
}

#[tokio::test]
async fn test_established_session_exposes_its_peer() {
	let session = Session::established(peer(), MockRawTransport::new());
	assert_eq!(session.peer(), &peer());
	assert_eq!(session.state(), SessionState::Established);
	assert!(session.is_established());
}

#[tokio::test]
async fn test_request_delegates_to_the_transport() {
	let mut transport = MockRawTransport::new();
	transport
		.expect_request()
		.with(eq("server.banner"), eq(Vec::<Value>::new()))
		.times(1)
		.returning(|_, _| Ok(json!("welcome")));

	let session = Session::established(peer(), transport);
	let response = session.request("server.banner", Vec::new()).await.unwrap();
	assert_eq!(response, json!("welcome"));
}

#[tokio::test]
async fn test_ping_goes_over_the_wire_as_server_ping() {
	let mut transport = MockRawTransport::new();
	transport
		.expect_request()
		.with(eq("server.ping"), eq(Vec::<Value>::new()))
		.times(1)
		.returning(|_, _| Ok(Value::Null));

	let session = Session::established(peer(), transport);
	assert!(session.ping().await.unwrap().is_null());
}

#[tokio::test]
async fn test_close_delegates_to_the_transport() {
	let mut transport = MockRawTransport::new();
	transport.expect_close().times(1).returning(|| ());

	let session = Session::established(peer(), transport);
	session.close().await;
}
