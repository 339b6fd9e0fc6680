//! Walks a mocked job listing with the infinite-scroll controller, then shows how an expired
//! bearer token is handled.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use job_board_client::{
	client::ApiClient,
	config::ClientConfig,
	http::ReqwestTransport,
	list::{CollectionSource, ListController, ListState},
	pagination::{Pagination, SearchFilter},
	reqwest::Client,
	session::{MemoryNavigator, MemorySession, Navigator, SessionStore},
};

#[derive(Clone, Debug, Deserialize)]
struct Job {
	id: u64,
	title: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let pages = [
		"{\"member\":[{\"id\":1,\"title\":\"Rust backend\"},{\"id\":2,\"title\":\"Rust SRE\"}]}",
		"{\"member\":[{\"id\":3,\"title\":\"Rust embedded\"}]}",
	];

	for (idx, body) in pages.into_iter().enumerate() {
		server
			.mock_async(|when, then| {
				when.method(GET)
					.path("/api/jobs")
					.query_param("page", (idx + 1).to_string())
					.query_param("title", "rust");
				then.status(200).header("content-type", "application/ld+json").body(body);
			})
			.await;
	}

	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/me");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"errors\":{\"message\":\"Expired JWT Token\"}}");
		})
		.await;
	let config = ClientConfig::parse(&server.base_url())?;
	let session = Arc::new(MemorySession::with_token("demo-token"));
	let navigator = Arc::new(MemoryNavigator::at("/jobs"));
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let client = ApiClient::<ReqwestTransport>::with_transport(
		config,
		session.clone() as Arc<dyn SessionStore>,
		navigator.clone() as Arc<dyn Navigator>,
		transport,
	)
	.with_pagination(Pagination::isolated());
	let list: ListController<Job, _> =
		ListController::new(CollectionSource::new(client.clone(), "/api/jobs"), 2)
			.with_filter(Some(SearchFilter::default().with("title", "rust")));

	list.load_first_page().await?;

	while list.state() != ListState::Exhausted {
		list.on_sentinel_visible().await?;
	}

	list.with_items(|jobs| {
		for job in jobs {
			println!("#{} {}.", job.id, job.title);
		}
	});

	if let Err(e) = client.get::<serde_json::Value>("/api/me").await {
		println!("{} Signed in: {}.", e.message(), session.is_signed_in());
	}

	println!("Redirected to: {:?}.", navigator.redirects());

	expired.assert_async().await;

	Ok(())
}
