//! Normalized error types shared by the request client, sessions, and list controllers.
//!
//! Every failure path produced by [`crate::client::ApiClient`] ends in an [`Error`] whose
//! [`errors`](Error::errors) list is non-empty, so callers can surface
//! [`message`](Error::message) without inspecting the variant.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message returned when a request fails without a structured error body.
pub const GENERIC_ERROR_MESSAGE: &str = "Une erreur est survenue, veuillez réessayer";
/// Message returned when the backend reports an expired bearer token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expirée, veuillez vous reconnecter";

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem raised while constructing a client.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session storage failure.
	#[error(transparent)]
	Session(#[from] SessionError),

	/// Backend rejected the bearer token as expired; the session was cleared.
	#[error("{}", join_messages(errors))]
	SessionExpired {
		/// Single localized entry.
		errors: Vec<ErrorEntry>,
	},
	/// Backend returned a structured error body.
	#[error("{}", join_messages(errors))]
	Api {
		/// HTTP status code of the failed response.
		status: u16,
		/// Error entries copied verbatim from the response body.
		errors: Vec<ErrorEntry>,
	},
	/// Backend responded, but without a usable body.
	#[error("{}", join_messages(errors))]
	Unexpected {
		/// HTTP status code of the response.
		status: u16,
		/// Single generic entry.
		errors: Vec<ErrorEntry>,
		/// Decoding failure, when the body could not be parsed.
		#[source]
		source: Option<BoxError>,
	},
	/// No response was received (DNS, TCP, TLS, or request construction).
	#[error("{}", join_messages(errors))]
	Transport {
		/// Single generic entry.
		errors: Vec<ErrorEntry>,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Builds the session-expired error carrying the fixed localized message.
	pub fn session_expired() -> Self {
		Self::SessionExpired { errors: vec![ErrorEntry::new(SESSION_EXPIRED_MESSAGE)] }
	}

	/// Wraps a transport failure with the generic message.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { errors: vec![ErrorEntry::generic()], source: Box::new(src) }
	}

	/// Builds a generic failure for a response without a structured error body.
	pub fn unexpected(status: u16) -> Self {
		Self::Unexpected { status, errors: vec![ErrorEntry::generic()], source: None }
	}

	/// Builds a generic failure for a success response whose body could not be decoded.
	pub fn undecodable(
		status: u16,
		src: serde_path_to_error::Error<serde_json::error::Error>,
	) -> Self {
		Self::Unexpected { status, errors: vec![ErrorEntry::generic()], source: Some(Box::new(src)) }
	}

	/// Returns the normalized error list.
	///
	/// Configuration and session failures are not request failures; they expose a single
	/// entry built from their display text.
	pub fn errors(&self) -> Vec<ErrorEntry> {
		match self {
			Self::SessionExpired { errors }
			| Self::Api { errors, .. }
			| Self::Unexpected { errors, .. }
			| Self::Transport { errors, .. } => errors.clone(),
			Self::Config(e) => vec![ErrorEntry::new(e.to_string())],
			Self::Session(e) => vec![ErrorEntry::new(e.to_string())],
		}
	}

	/// Returns the first human-readable message, suitable for a transient notification.
	pub fn message(&self) -> String {
		self.errors()
			.into_iter()
			.next()
			.map(|entry| entry.message)
			.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.into())
	}

	/// Returns the HTTP status code, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::SessionExpired { .. } => Some(401),
			Self::Api { status, .. } | Self::Unexpected { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the backend reported an expired session.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired { .. })
	}
}

/// One entry of a normalized error list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
	/// Human-readable message.
	pub message: String,
	/// Additional fields sent by the backend (codes, property paths, ...).
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl ErrorEntry {
	/// Creates an entry with only a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), extra: BTreeMap::new() }
	}

	/// Creates the generic fallback entry.
	pub fn generic() -> Self {
		Self::new(GENERIC_ERROR_MESSAGE)
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL could not be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// Sign-in route must be an absolute path.
	#[error("Sign-in path must start with `/`: {path}.")]
	InvalidSignInPath {
		/// Offending path.
		path: String,
	},
	/// Header name or value contains characters HTTP does not allow.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Required environment variable is missing.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Error type produced by [`crate::session::SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SessionError {
	/// Session payload could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Extracts the backend's error list from a response body.
///
/// Accepts `{"errors": {...}}`, `{"errors": [...]}`, and a bare `{"message": "..."}` object.
/// Returns `None` when the body is not JSON, matches none of these shapes, or lists no entry.
pub fn structured_errors(body: &[u8]) -> Option<Vec<ErrorEntry>> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany {
		One(ErrorEntry),
		Many(Vec<ErrorEntry>),
	}

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum ErrorBody {
		Envelope { errors: OneOrMany },
		Bare(ErrorEntry),
	}

	let errors = match serde_json::from_slice::<ErrorBody>(body).ok()? {
		ErrorBody::Envelope { errors: OneOrMany::One(entry) } | ErrorBody::Bare(entry) =>
			vec![entry],
		ErrorBody::Envelope { errors: OneOrMany::Many(entries) } => entries,
	};

	if errors.is_empty() { None } else { Some(errors) }
}

fn join_messages(errors: &[ErrorEntry]) -> String {
	errors.iter().map(|entry| entry.message.as_str()).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn every_request_failure_exposes_messages() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let cases = [
			Error::session_expired(),
			Error::transport(io),
			Error::unexpected(502),
			Error::Api { status: 422, errors: vec![ErrorEntry::new("Titre requis")] },
		];

		for err in cases {
			assert!(!err.errors().is_empty(), "{err:?} should expose at least one entry.");
			assert!(!err.message().is_empty());
		}
	}

	#[test]
	fn display_joins_backend_messages() {
		let err = Error::Api {
			status: 400,
			errors: vec![ErrorEntry::new("Titre requis"), ErrorEntry::new("Salaire invalide")],
		};

		assert_eq!(err.to_string(), "Titre requis; Salaire invalide");
		assert_eq!(err.status(), Some(400));
		assert_eq!(err.message(), "Titre requis");
	}

	#[test]
	fn session_expired_uses_fixed_message() {
		let err = Error::session_expired();

		assert!(err.is_session_expired());
		assert_eq!(err.message(), SESSION_EXPIRED_MESSAGE);
		assert_eq!(err.status(), Some(401));
	}

	#[test]
	fn transport_error_keeps_source() {
		let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
		let err = Error::transport(io);
		let source =
			StdError::source(&err).expect("Transport errors should expose the underlying failure.");

		assert_eq!(source.to_string(), "timed out");
		assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
		assert_eq!(err.status(), None);
	}

	#[test]
	fn structured_errors_accept_known_shapes() {
		let one = structured_errors(br#"{"errors":{"message":"Expired JWT Token"}}"#)
			.expect("Object envelopes should parse.");
		let many = structured_errors(br#"{"errors":[{"message":"a"},{"message":"b"}]}"#)
			.expect("Array envelopes should parse.");
		let bare = structured_errors(br#"{"code":401,"message":"Expired JWT Token"}"#)
			.expect("Bare message bodies should parse.");

		assert_eq!(one[0].message, "Expired JWT Token");
		assert_eq!(many.len(), 2);
		assert_eq!(bare[0].extra.get("code"), Some(&serde_json::json!(401)));
	}

	#[test]
	fn structured_errors_reject_other_bodies() {
		assert!(structured_errors(b"<html>Bad gateway</html>").is_none());
		assert!(structured_errors(br#"{"errors":[]}"#).is_none());
		assert!(structured_errors(br#"{"detail":"Not found"}"#).is_none());
		assert!(structured_errors(b"").is_none());
	}

	#[test]
	fn error_entry_keeps_extra_fields() {
		let entry: ErrorEntry = serde_json::from_str(
			r#"{"message":"Valeur invalide","propertyPath":"salary","code":"c1"}"#,
		)
		.expect("Error entry should deserialize from JSON.");

		assert_eq!(entry.message, "Valeur invalide");
		assert_eq!(entry.extra.get("propertyPath"), Some(&serde_json::json!("salary")));
	}
}
