use proptest::prelude::*;

use electrum_pool::models::{DatasetPeer, Peer, PeerEntry, Protocol};

pub fn host() -> impl Strategy<Value = String> {
	"[a-z0-9]{1,12}\\.[a-z]{2,6}"
}

pub fn protocol() -> impl Strategy<Value = Protocol> {
	prop_oneof![Just(Protocol::Tcp), Just(Protocol::Ssl)]
}

pub fn explicit_peer() -> impl Strategy<Value = Peer> {
	(host(), 1u16.., protocol()).prop_map(|(host, port, protocol)| Peer::new(host, port, protocol))
}

pub fn explicit_peer_list(max: usize) -> impl Strategy<Value = Vec<PeerEntry>> {
	prop::collection::vec(explicit_peer().prop_map(PeerEntry::Explicit), 1..max)
}

/// Port strings as found in the wild: valid ports, garbage, out-of-range
/// numbers
pub fn port_string() -> impl Strategy<Value = String> {
	prop_oneof![
		(1u32..=65535).prop_map(|port| port.to_string()),
		"[a-z]{1,6}",
		(65536u32..1_000_000).prop_map(|port| port.to_string()),
	]
}

pub fn dataset_peer() -> impl Strategy<Value = DatasetPeer> {
	(
		host(),
		prop::option::of(port_string()),
		prop::option::of(port_string()),
	)
		.prop_map(|(host, tcp, ssl)| DatasetPeer {
			host,
			tcp,
			ssl,
			pruning: None,
			version: None,
		})
}
