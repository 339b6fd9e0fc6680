//! Request descriptors: methods, headers, bodies, and the prepared form handed to transports.

// self
use crate::{_prelude::*, config::LD_JSON, session::BearerToken};

/// Media type used for multipart uploads and body-less requests.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
/// Media type used for partial updates.
pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// HTTP methods issued by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
	#[default]
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Case-insensitive header map; names are stored lower-cased.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);
impl Headers {
	/// Adds or replaces a header.
	pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
		self.0.insert(name.as_ref().to_ascii_lowercase(), value.into());
	}

	/// Returns a header value.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Removes a header, returning its previous value.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.0.remove(&name.to_ascii_lowercase())
	}

	/// Checks whether a header is present.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(&name.to_ascii_lowercase())
	}

	/// Layers `other` over `self`; entries in `other` win.
	pub fn merge(&mut self, other: &Headers) {
		for (name, value) in other.iter() {
			self.0.insert(name.to_owned(), value.to_owned());
		}
	}

	/// Iterates over `(lower-cased name, value)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
	}
}

/// Single field of a [`MultipartForm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormPart {
	/// Plain text field.
	Text {
		/// Field name.
		name: String,
		/// Field value.
		value: String,
	},
	/// File field (logos, résumés, ...).
	File {
		/// Field name.
		name: String,
		/// File name reported to the backend.
		file_name: String,
		/// Optional MIME type.
		mime: Option<String>,
		/// Raw file contents.
		bytes: Vec<u8>,
	},
}

/// File-bearing form sent as `multipart/form-data`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	/// Parts in submission order.
	pub parts: Vec<FormPart>,
}
impl MultipartForm {
	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(FormPart::Text { name: name.into(), value: value.into() });

		self
	}

	/// Appends a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		mime: Option<&str>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		self.parts.push(FormPart::File {
			name: name.into(),
			file_name: file_name.into(),
			mime: mime.map(str::to_owned),
			bytes: bytes.into(),
		});

		self
	}
}

/// Request body supplied by callers.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
	/// Plain object serialized as JSON.
	Json(serde_json::Value),
	/// File-bearing form.
	Multipart(MultipartForm),
}

/// Per-call request options: method, body, and header overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
	/// HTTP method; defaults to `GET`.
	pub method: Method,
	/// Optional body.
	pub body: Option<Body>,
	/// Header overrides applied over the client's defaults.
	pub headers: Headers,
}
impl RequestOptions {
	/// Creates options for the provided method.
	pub fn new(method: Method) -> Self {
		Self { method, ..Default::default() }
	}

	/// Serializes `value` as the JSON body.
	pub fn json(mut self, value: &impl Serialize) -> Result<Self> {
		self.body = Some(Body::Json(serde_json::to_value(value).map_err(Error::transport)?));

		Ok(self)
	}

	/// Attaches a multipart body.
	pub fn multipart(mut self, form: MultipartForm) -> Self {
		self.body = Some(Body::Multipart(form));

		self
	}

	/// Adds a header override.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Resolves these options into the request a transport sends.
	///
	/// `defaults` are the client's default headers; `token` is the bearer token read from the
	/// session immediately before the call.
	pub fn prepare(
		self,
		url: Url,
		defaults: &Headers,
		token: Option<&BearerToken>,
	) -> PreparedRequest {
		let mut headers = defaults.clone();

		headers.merge(&self.headers);

		match token {
			Some(token) => headers.insert("Authorization", format!("Bearer {}", token.expose())),
			None => {
				headers.remove("Authorization");
			},
		}

		let payload = match self.body {
			Some(Body::Json(value)) if !value.is_null() => {
				if !self.headers.contains("Content-Type") {
					headers.insert("Content-Type", LD_JSON);
				}

				Payload::Json(value.to_string().into_bytes())
			},
			Some(Body::Multipart(form)) => {
				headers.insert("Content-Type", MULTIPART_FORM_DATA);

				Payload::Multipart(form)
			},
			_ => {
				headers.insert("Content-Type", MULTIPART_FORM_DATA);

				Payload::Empty
			},
		};

		PreparedRequest { method: self.method, url, headers, payload }
	}
}

/// Payload of a [`PreparedRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
	/// No body.
	Empty,
	/// Serialized JSON bytes.
	Json(Vec<u8>),
	/// Unserialized multipart form; the transport encodes it.
	Multipart(MultipartForm),
}

/// Fully resolved request handed to an [`crate::http::HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Final header set.
	pub headers: Headers,
	/// Body to send.
	pub payload: Payload,
}

/// Appends `?` when `url` has no query string yet, `&` otherwise.
pub fn add_to_url(url: &str) -> String {
	if url.contains('?') { format!("{url}&") } else { format!("{url}?") }
}
