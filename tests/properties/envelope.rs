use proptest::prelude::*;
use serde_json::json;

use electrum_pool::models::{Envelope, Network};

proptest! {
	/// The envelope discriminates success and failure solely through the
	/// `error` flag and round-trips through serde unchanged.
	#[test]
	fn prop_envelope_round_trips(
		id in "[a-zA-Z0-9-]{1,36}",
		method in "[a-zA-Z]{1,24}",
		coin in "[a-z]{1,12}",
		payload in "[ -~]{0,64}",
	) {
		let network = Network::new(coin);
		let ok = Envelope::ok(id.clone(), &method, &network, json!(payload));
		prop_assert!(!ok.error);

		let fail = Envelope::fail(id, &method, &network, json!(payload));
		prop_assert!(fail.error);
		prop_assert_eq!(&ok.method, &fail.method);
		prop_assert_eq!(ok.coin.as_str(), network.as_str());

		let serialized = serde_json::to_string(&ok).unwrap();
		let deserialized: Envelope = serde_json::from_str(&serialized).unwrap();
		prop_assert_eq!(ok, deserialized);
	}
}
