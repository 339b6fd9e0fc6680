//! Transport primitives for backend calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. It receives a fully
//! [`PreparedRequest`] and returns the raw status, headers, and body; status classification,
//! decoding, and error normalization stay in [`crate::client`] so every transport fails the
//! same way.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	request::{Headers, PreparedRequest},
};
#[cfg(feature = "reqwest")]
use crate::request::{FormPart, Method, MultipartForm, Payload};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<RawResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of sending a [`PreparedRequest`].
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// client clone. A transport only reports failures where no response was received; any
/// status code, including 4xx/5xx, is a successful [`RawResponse`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying stack.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and returns the raw response.
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Raw response captured by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: Headers,
	/// Undecoded body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Creates a response with a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Headers::default(), body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build(&self, request: PreparedRequest) -> Result<reqwest::Request, ReqwestError> {
		let PreparedRequest { method, url, headers, payload } = request;
		let method = match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		};
		let multipart = matches!(payload, Payload::Multipart(_));
		let mut builder = self.0.request(method, url);

		for (name, value) in headers.iter() {
			// reqwest writes the boundary-bearing content type for multipart bodies itself.
			if multipart && name == "content-type" {
				continue;
			}

			builder = builder.header(name, value);
		}

		builder = match payload {
			Payload::Empty => builder,
			Payload::Json(bytes) => builder.body(bytes),
			Payload::Multipart(form) => builder.multipart(to_reqwest_form(form)?),
		};

		builder.build()
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	type TransportError = ReqwestError;

	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let request = self.build(request)?;
			let response = self.0.execute(request).await?;
			let status = response.status().as_u16();
			let mut headers = Headers::default();

			for (name, value) in response.headers() {
				if let Ok(value) = value.to_str() {
					headers.insert(name.as_str(), value);
				}
			}

			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn to_reqwest_form(form: MultipartForm) -> Result<reqwest::multipart::Form, ReqwestError> {
	use reqwest::multipart::{Form, Part};

	let mut out = Form::new();

	for part in form.parts {
		out = match part {
			FormPart::Text { name, value } => out.text(name, value),
			FormPart::File { name, file_name, mime, bytes } => {
				let mut file = Part::bytes(bytes).file_name(file_name);

				if let Some(mime) = mime {
					file = file.mime_str(&mime)?;
				}

				out.part(name, file)
			},
		};
	}

	Ok(out)
}
