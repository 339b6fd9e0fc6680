//! Paginated REST client for the job-board backend with bearer sessions, JSON-LD bodies,
//! normalized errors, and infinite-scroll list controllers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod list;
pub mod obs;
pub mod pagination;
pub mod request;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::ApiClient,
		config::ClientConfig,
		http::ReqwestTransport,
		pagination::Pagination,
		session::{MemoryNavigator, MemorySession, Navigator, SessionStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = ApiClient<ReqwestTransport>;

	/// Handles returned alongside a test client so assertions can inspect side effects.
	#[derive(Clone, Debug)]
	pub struct TestHarness {
		/// Session backing the client.
		pub session: Arc<MemorySession>,
		/// Navigator backing the client.
		pub navigator: Arc<MemoryNavigator>,
		/// Pagination handle shared by every client built from this harness.
		pub pagination: Pagination,
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs an [`ApiClient`] pointed at `base_url`, backed by an in-memory session, a
	/// navigator parked on `location`, and an isolated pagination handle.
	pub fn build_reqwest_test_client(
		base_url: &str,
		location: &str,
	) -> (ReqwestTestClient, TestHarness) {
		let config = ClientConfig::builder(
			Url::parse(base_url).expect("Mock server URL should parse successfully."),
		)
		.build()
		.expect("Test client configuration should be valid.");
		let harness = TestHarness {
			session: Arc::new(MemorySession::default()),
			navigator: Arc::new(MemoryNavigator::at(location)),
			pagination: Pagination::isolated(),
		};
		let session: Arc<dyn SessionStore> = harness.session.clone();
		let navigator: Arc<dyn Navigator> = harness.navigator.clone();
		let client = ApiClient::with_transport(config, session, navigator, test_reqwest_transport())
			.with_pagination(harness.pagination.clone());

		(client, harness)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
