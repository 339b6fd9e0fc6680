//! Request client: auth injection, body handling, pagination queries, and error normalization.
//!
//! [`ApiClient::send`] is the single choke point every backend call goes through. Before each
//! request it re-reads the bearer token from the injected [`SessionStore`], layers caller
//! headers over the configured defaults, and serializes the body. Responses are classified
//! here rather than in the transport:
//!
//! - `204` resolves to `None` whatever the body says;
//! - any other 2xx is decoded into the caller's type;
//! - a `401` whose structured body reports `Expired JWT Token` clears the session, redirects
//!   the [`Navigator`] to the sign-in route, and fails with [`Error::SessionExpired`];
//! - other structured error bodies fail with [`Error::Api`];
//! - everything else fails with the generic message.
//!
//! The expired-token match is exact and case-sensitive. A backend that rewords or localizes
//! that message will fall through to [`Error::Api`] instead of clearing the session.

// crates.io
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::structured_errors,
	http::{HttpTransport, RawResponse},
	obs::{self, Operation, Outcome, RequestSpan},
	pagination::{PageMode, PageQuery, Pagination, SearchFilter},
	request::{MERGE_PATCH_JSON, Method, MultipartForm, RequestOptions},
	session::{BearerToken, Navigator, SessionStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Backend message identifying an expired bearer token.
pub const EXPIRED_TOKEN_MESSAGE: &str = "Expired JWT Token";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// REST client for the job-board backend.
///
/// Clones share the transport, session, navigator, and pagination handle.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Base URL, sign-in route, and default headers.
	pub config: Arc<ClientConfig>,
	/// Storage holding the bearer token.
	pub session: Arc<dyn SessionStore>,
	/// Navigation surface used on session expiry.
	pub navigator: Arc<dyn Navigator>,
	pagination: Pagination,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// The client starts out attached to [`Pagination::global`].
	pub fn with_transport(
		config: ClientConfig,
		session: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			config: Arc::new(config),
			session,
			navigator,
			pagination: Pagination::global(),
		}
	}

	/// Attaches a different pagination handle.
	pub fn with_pagination(mut self, pagination: Pagination) -> Self {
		self.pagination = pagination;

		self
	}

	/// Returns the pagination handle this client reads and writes.
	pub fn pagination(&self) -> &Pagination {
		&self.pagination
	}

	/// Current page of the shared pagination state.
	pub fn page(&self) -> i64 {
		self.pagination.page()
	}

	/// Sets the current page for every client sharing this pagination handle.
	pub fn set_page(&self, page: i64) {
		self.pagination.set_page(page);
	}

	/// Current page size of the shared pagination state.
	pub fn rows_per_page(&self) -> u32 {
		self.pagination.rows_per_page()
	}

	/// Sets the page size for every client sharing this pagination handle.
	pub fn set_rows_per_page(&self, rows_per_page: u32) {
		self.pagination.set_rows_per_page(rows_per_page);
	}

	/// Current search filter of the shared pagination state.
	pub fn search(&self) -> Option<SearchFilter> {
		self.pagination.search()
	}

	/// Sets or clears the search filter for every client sharing this pagination handle.
	pub fn set_search(&self, search: Option<SearchFilter>) {
		self.pagination.set_search(search);
	}

	/// Persists a bearer token obtained from the sign-in endpoint.
	pub fn sign_in(&self, token: impl Into<String>) -> Result<()> {
		self.session.set_token(BearerToken::new(token))?;

		Ok(())
	}

	/// Clears the stored bearer token.
	pub fn sign_out(&self) -> Result<()> {
		self.session.clear_token()?;

		Ok(())
	}

	/// Sends one request to `path` (appended to the base URL).
	///
	/// Returns `Ok(None)` for `204 No Content` and the decoded body for any other 2xx.
	pub async fn send<R>(&self, path: &str, options: RequestOptions) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		const OP: Operation = Operation::Send;

		let span = RequestSpan::new(OP, "send").with_method(options.method);

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span.instrument(self.dispatch(path, options, &span)).await;

		obs::record_result(OP, &result);

		result
	}

	/// Fetches a page of `action` using the shared pagination state as it is at call time.
	///
	/// [`PageMode::RowPerPage`] forces page 1 (used after the page size changes);
	/// [`PageMode::Page`] uses the current page. Another caller writing the shared state
	/// between a `set_page` and this call wins; prefer [`fetch_page`](Self::fetch_page) when
	/// several lists load concurrently.
	pub async fn get_paginate<R>(&self, action: &str, mode: PageMode) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		let query = self.pagination.snapshot(mode);

		self.paginate(action, &query, mode.as_str()).await
	}

	/// Fetches a page of `action` described entirely by `query`.
	///
	/// Shared pagination state is neither read nor written.
	pub async fn fetch_page<R>(&self, action: &str, query: &PageQuery) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		self.paginate(action, query, "explicit").await
	}

	/// `GET`s `path`.
	pub async fn get<R>(&self, path: &str) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		self.send(path, RequestOptions::new(Method::Get)).await
	}

	/// `POST`s `body` as JSON-LD.
	pub async fn post<R>(&self, path: &str, body: &impl Serialize) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		self.send(path, RequestOptions::new(Method::Post).json(body)?).await
	}

	/// `PUT`s `body` as JSON-LD.
	pub async fn put<R>(&self, path: &str, body: &impl Serialize) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		self.send(path, RequestOptions::new(Method::Put).json(body)?).await
	}

	/// `PATCH`es `body` as a merge patch.
	pub async fn patch<R>(&self, path: &str, body: &impl Serialize) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		let options = RequestOptions::new(Method::Patch)
			.header("Content-Type", MERGE_PATCH_JSON)
			.json(body)?;

		self.send(path, options).await
	}

	/// `DELETE`s `path`, discarding any response body.
	pub async fn delete(&self, path: &str) -> Result<()> {
		self.send::<IgnoredAny>(path, RequestOptions::new(Method::Delete)).await?;

		Ok(())
	}

	/// `POST`s a file-bearing form.
	pub async fn upload<R>(&self, path: &str, form: MultipartForm) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		self.send(path, RequestOptions::new(Method::Post).multipart(form)).await
	}

	async fn paginate<R>(
		&self,
		action: &str,
		query: &PageQuery,
		stage: &'static str,
	) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		const OP: Operation = Operation::Paginate;

		let span = RequestSpan::new(OP, stage);

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let path = query.apply(action);

				#[cfg(feature = "tracing")]
				tracing::debug!(%path, "fetching page");

				self.send(&path, RequestOptions::new(Method::Get)).await
			})
			.await;

		obs::record_result(OP, &result);

		result
	}

	async fn dispatch<R>(
		&self,
		path: &str,
		options: RequestOptions,
		span: &RequestSpan,
	) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		let url = Url::parse(&self.config.endpoint(path)).map_err(Error::transport)?;
		let token = self.session.token().map_err(Error::transport)?;
		let request = options.prepare(url, &self.config.default_headers, token.as_ref());

		#[cfg(feature = "tracing")]
		tracing::debug!(method = %request.method, url = %request.url, "sending request");

		let response = self.transport.execute(request).await.map_err(|e| {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %e, "transport failure");

			Error::transport(e)
		})?;

		span.record_status(response.status);

		self.handle_response(response)
	}

	fn handle_response<R>(&self, response: RawResponse) -> Result<Option<R>>
	where
		R: DeserializeOwned,
	{
		match response.status {
			204 => Ok(None),
			status if response.is_success() => decode(status, &response.body).map(Some),
			status => Err(self.normalize_failure(status, &response.body)),
		}
	}

	fn normalize_failure(&self, status: u16, body: &[u8]) -> Error {
		let Some(errors) = structured_errors(body) else {
			#[cfg(feature = "tracing")]
			tracing::warn!(status, "request failed without a structured error body");

			return Error::unexpected(status);
		};

		if status == 401 && errors.iter().any(|entry| entry.message == EXPIRED_TOKEN_MESSAGE) {
			self.expire_session();

			return Error::session_expired();
		}

		#[cfg(feature = "tracing")]
		tracing::warn!(status, count = errors.len(), "backend rejected the request");

		Error::Api { status, errors }
	}

	fn expire_session(&self) {
		if let Err(_e) = self.session.clear_token() {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %_e, "failed to clear the expired session");
		}

		let current = self.navigator.current_path();
		let current_path = current.split(['?', '#']).next().unwrap_or_default();

		if current_path != self.config.sign_in_path {
			self.navigator.redirect(&self.config.sign_in_path);
		}
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(
		config: ClientConfig,
		session: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self::with_transport(config, session, navigator, ReqwestTransport::default())
	}

	/// Creates a client whose base URL comes from [`crate::config::API_URL_ENV`].
	pub fn from_env(
		session: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
	) -> Result<Self> {
		Ok(Self::new(ClientConfig::from_env()?, session, navigator))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			session: self.session.clone(),
			navigator: self.navigator.clone(),
			pagination: self.pagination.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("sign_in_path", &self.config.sign_in_path)
			.field("pagination", &self.pagination)
			.finish()
	}
}

fn decode<R>(status: u16, body: &[u8]) -> Result<R>
where
	R: DeserializeOwned,
{
	// Empty 2xx bodies decode as JSON `null` so `()`/`Option` targets still succeed.
	let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) { b"null" } else { body };
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::undecodable(status, e))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		config::LD_JSON,
		error::{GENERIC_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE, SessionError},
		http::TransportFuture,
		request::{Payload, PreparedRequest},
		session::{MemoryNavigator, MemorySession},
	};

	#[derive(Debug)]
	struct Unreachable;
	impl Display for Unreachable {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("Backend unreachable.")
		}
	}
	impl StdError for Unreachable {}

	/// Replays canned responses and records every request it receives.
	#[derive(Default)]
	struct ScriptedTransport {
		responses: Mutex<Vec<Option<RawResponse>>>,
		seen: Mutex<Vec<PreparedRequest>>,
	}
	impl ScriptedTransport {
		fn replying(responses: impl IntoIterator<Item = Option<RawResponse>>) -> Self {
			let mut responses: Vec<_> = responses.into_iter().collect();

			responses.reverse();

			Self { responses: Mutex::new(responses), seen: Default::default() }
		}

		fn requests(&self) -> Vec<PreparedRequest> {
			self.seen.lock().clone()
		}
	}
	impl HttpTransport for ScriptedTransport {
		type TransportError = Unreachable;

		fn execute(&self, request: PreparedRequest) -> TransportFuture<'_, Self::TransportError> {
			self.seen.lock().push(request);

			let next = self.responses.lock().pop().flatten();

			Box::pin(async move { next.ok_or(Unreachable) })
		}
	}

	struct Fixture {
		client: ApiClient<ScriptedTransport>,
		transport: Arc<ScriptedTransport>,
		session: Arc<MemorySession>,
		navigator: Arc<MemoryNavigator>,
	}

	fn fixture(
		location: &str,
		responses: impl IntoIterator<Item = Option<RawResponse>>,
	) -> Fixture {
		let config = ClientConfig::parse("https://api.example.com").expect("Config should parse.");
		let transport = Arc::new(ScriptedTransport::replying(responses));
		let session = Arc::new(MemorySession::with_token("initial"));
		let navigator = Arc::new(MemoryNavigator::at(location));
		let client = ApiClient::with_transport(
			config,
			session.clone() as Arc<dyn SessionStore>,
			navigator.clone() as Arc<dyn Navigator>,
			transport.clone(),
		)
		.with_pagination(Pagination::isolated());

		Fixture { client, transport, session, navigator }
	}

	#[tokio::test]
	async fn no_content_resolves_to_none_whatever_the_body() {
		let f = fixture("/jobs", [Some(RawResponse::new(204, r#"{"ignored":true}"#))]);
		let value: Option<serde_json::Value> =
			f.client.get("/api/jobs/1").await.expect("204 should not fail.");

		assert!(value.is_none());
	}

	#[tokio::test]
	async fn created_body_is_decoded() {
		let f = fixture("/jobs", [Some(RawResponse::new(201, r#"{"id":7,"title":"Rust"}"#))]);
		let value: serde_json::Value = f
			.client
			.post("/api/jobs", &serde_json::json!({ "title": "Rust" }))
			.await
			.expect("201 should succeed.")
			.expect("201 should carry a body.");

		assert_eq!(value["id"], 7);

		let request = &f.transport.requests()[0];

		assert_eq!(request.method, Method::Post);
		assert_eq!(request.headers.get("content-type"), Some(LD_JSON));
		assert_eq!(request.headers.get("accept"), Some(LD_JSON));
		assert_eq!(request.headers.get("authorization"), Some("Bearer initial"));
		assert!(matches!(request.payload, Payload::Json(_)));
	}

	#[tokio::test]
	async fn token_is_reread_before_every_request() {
		let f = fixture(
			"/jobs",
			[
				Some(RawResponse::new(204, "")),
				Some(RawResponse::new(204, "")),
				Some(RawResponse::new(204, "")),
			],
		);

		f.client.delete("/api/jobs/1").await.expect("First call should succeed.");
		f.client.sign_in("rotated").expect("Memory sessions never fail.");
		f.client.delete("/api/jobs/2").await.expect("Second call should succeed.");
		f.client.sign_out().expect("Memory sessions never fail.");
		f.client.delete("/api/jobs/3").await.expect("Third call should succeed.");

		let auth: Vec<_> = f
			.transport
			.requests()
			.iter()
			.map(|r| r.headers.get("authorization").map(str::to_owned))
			.collect();

		assert_eq!(auth, vec![Some("Bearer initial".into()), Some("Bearer rotated".into()), None]);
	}

	#[tokio::test]
	async fn expired_token_clears_session_and_redirects() {
		let f = fixture(
			"/dashboard",
			[Some(RawResponse::new(401, r#"{"errors":{"message":"Expired JWT Token"}}"#))],
		);
		let err = f
			.client
			.get::<serde_json::Value>("/api/me")
			.await
			.expect_err("Expired sessions should fail.");

		assert!(err.is_session_expired());
		assert_eq!(err.message(), SESSION_EXPIRED_MESSAGE);
		assert!(!f.session.is_signed_in());
		assert_eq!(f.navigator.redirects(), vec!["/sign-in".to_owned()]);
	}

	#[tokio::test]
	async fn expired_token_on_sign_in_page_does_not_redirect() {
		let f = fixture(
			"/sign-in?next=/dashboard",
			[Some(RawResponse::new(401, r#"{"errors":[{"message":"Expired JWT Token"}]}"#))],
		);
		let err = f
			.client
			.get::<serde_json::Value>("/api/me")
			.await
			.expect_err("Expired sessions should fail.");

		assert!(err.is_session_expired());
		assert!(!f.session.is_signed_in());
		assert!(f.navigator.redirects().is_empty());
	}

	#[tokio::test]
	async fn other_unauthorized_messages_keep_the_session() {
		let f = fixture(
			"/dashboard",
			[Some(RawResponse::new(401, r#"{"errors":{"message":"Invalid credentials."}}"#))],
		);
		let err = f
			.client
			.get::<serde_json::Value>("/api/me")
			.await
			.expect_err("Unauthorized requests should fail.");

		assert!(matches!(err, Error::Api { status: 401, .. }));
		assert_eq!(err.message(), "Invalid credentials.");
		assert!(f.session.is_signed_in());
		assert!(f.navigator.redirects().is_empty());
	}

	#[tokio::test]
	async fn every_failure_path_is_normalized() {
		let f = fixture(
			"/jobs",
			[
				None,
				Some(RawResponse::new(500, "<html>Internal error</html>")),
				Some(RawResponse::new(
					422,
					r#"{"errors":[{"message":"Titre requis"},{"message":"Ville requise"}]}"#,
				)),
				Some(RawResponse::new(200, "not json")),
			],
		);
		let mut failures = Vec::new();

		for _ in 0..4 {
			failures.push(
				f.client
					.get::<serde_json::Value>("/api/jobs")
					.await
					.expect_err("Every scripted response should fail."),
			);
		}

		assert!(matches!(failures[0], Error::Transport { .. }));
		assert!(matches!(failures[1], Error::Unexpected { status: 500, .. }));
		assert!(matches!(failures[2], Error::Api { status: 422, .. }));
		assert!(matches!(failures[3], Error::Unexpected { status: 200, .. }));
		assert_eq!(failures[0].message(), GENERIC_ERROR_MESSAGE);
		assert_eq!(failures[1].message(), GENERIC_ERROR_MESSAGE);
		assert_eq!(failures[2].errors().len(), 2);

		for err in &failures {
			assert!(!err.errors().is_empty());
		}
	}

	#[tokio::test]
	async fn patch_uses_merge_patch_media_type() {
		let f = fixture("/jobs", [Some(RawResponse::new(200, r#"{"status":"closed"}"#))]);
		let _: Option<serde_json::Value> = f
			.client
			.patch("/api/jobs/3", &serde_json::json!({ "status": "closed" }))
			.await
			.expect("Patch should succeed.");

		assert_eq!(f.transport.requests()[0].headers.get("content-type"), Some(MERGE_PATCH_JSON));
	}

	#[tokio::test]
	async fn get_paginate_reads_state_at_call_time() {
		let f =
			fixture("/jobs", [Some(RawResponse::new(204, "")), Some(RawResponse::new(204, ""))]);

		f.client.set_rows_per_page(12);
		f.client.set_page(3);
		f.client
			.get_paginate::<IgnoredAny>("/api/jobs", PageMode::Page)
			.await
			.expect("Page load should succeed.");
		f.client
			.get_paginate::<IgnoredAny>("/api/jobs", PageMode::RowPerPage)
			.await
			.expect("Page load should succeed.");

		let urls: Vec<_> = f.transport.requests().iter().map(|r| r.url.to_string()).collect();

		assert_eq!(
			urls,
			vec![
				"https://api.example.com/api/jobs?limit=12&page=3",
				"https://api.example.com/api/jobs?limit=12&page=1",
			]
		);
	}

	#[tokio::test]
	async fn fetch_page_ignores_shared_state() {
		let f = fixture("/jobs", [Some(RawResponse::new(204, ""))]);

		f.client.set_page(9);
		f.client.set_rows_per_page(50);
		f.client
			.fetch_page::<IgnoredAny>("/api/jobs", &PageQuery::new(2, 10))
			.await
			.expect("Page load should succeed.");

		assert_eq!(
			f.transport.requests()[0].url.as_str(),
			"https://api.example.com/api/jobs?limit=10&page=2"
		);
		assert_eq!(f.client.page(), 9);
		assert_eq!(f.client.rows_per_page(), 50);
	}

	#[tokio::test]
	async fn unreadable_session_fails_with_generic_message() {
		struct UnreadableSession;
		impl SessionStore for UnreadableSession {
			fn token(&self) -> Result<Option<BearerToken>, SessionError> {
				Err(SessionError::Backend { message: "Failed to read /tmp/session.json".into() })
			}

			fn set_token(&self, _: BearerToken) -> Result<(), SessionError> {
				Ok(())
			}

			fn clear_token(&self) -> Result<(), SessionError> {
				Ok(())
			}
		}

		let config = ClientConfig::parse("https://api.example.com").expect("Config should parse.");
		let transport = Arc::new(ScriptedTransport::replying([Some(RawResponse::new(200, "{}"))]));
		let client: ApiClient<ScriptedTransport> = ApiClient::with_transport(
			config,
			Arc::new(UnreadableSession),
			Arc::new(MemoryNavigator::at("/jobs")),
			transport.clone(),
		)
		.with_pagination(Pagination::isolated());
		let err = client
			.get::<serde_json::Value>("/api/jobs")
			.await
			.expect_err("Unreadable sessions should fail the request.");

		assert!(matches!(err, Error::Transport { .. }));
		assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
		assert!(transport.requests().is_empty());
	}

	#[test]
	fn empty_success_body_decodes_as_null() {
		decode::<()>(200, b"").expect("Empty bodies should decode as null.");

		let value: Option<u32> = decode(200, b"  ").expect("Blank bodies should decode as null.");

		assert_eq!(value, None);
	}
}
