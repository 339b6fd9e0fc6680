//! Client configuration: base URL, sign-in route, and default headers.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError, request::Headers};

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "JOB_BOARD_API_URL";
/// Route the navigator is sent to when the session expires.
pub const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";
/// Media type requested from the backend by default.
pub const LD_JSON: &str = "application/ld+json";

/// Immutable configuration consumed by [`crate::client::ApiClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Sign-in route used on session expiry.
	pub sign_in_path: String,
	/// Headers sent with every request before caller overrides.
	pub default_headers: Headers,
}
impl ClientConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Loads the base URL from [`API_URL_ENV`] and applies defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		let raw = env::var(API_URL_ENV).map_err(|_| ConfigError::MissingEnv { name: API_URL_ENV })?;

		Self::parse(&raw)
	}

	/// Parses `raw` as the base URL and applies defaults.
	pub fn parse(raw: &str) -> Result<Self, ConfigError> {
		let base_url = Url::parse(raw.trim())
			.map_err(|source| ConfigError::InvalidBaseUrl { value: raw.to_owned(), source })?;

		Self::builder(base_url).build()
	}

	/// Joins `path` onto the base URL.
	///
	/// The base URL's trailing `/` is dropped and a leading `/` is inserted into `path` when
	/// missing, so `https://api.test/` + `api/jobs` and `https://api.test` + `/api/jobs` agree.
	pub fn endpoint(&self, path: &str) -> String {
		let base = self.base_url.as_str().trim_end_matches('/');

		if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Sign-in route used on session expiry.
	pub sign_in_path: String,
	/// Extra default headers layered over `Accept: application/ld+json`.
	pub default_headers: Headers,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		let mut default_headers = Headers::default();

		default_headers.insert("Accept", LD_JSON);

		Self { base_url, sign_in_path: DEFAULT_SIGN_IN_PATH.into(), default_headers }
	}

	/// Overrides the sign-in route.
	pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
		self.sign_in_path = path.into();

		self
	}

	/// Adds or replaces a default header.
	pub fn default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.default_headers.insert(name, value);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let config = ClientConfig {
			base_url: self.base_url,
			sign_in_path: self.sign_in_path,
			default_headers: self.default_headers,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if !self.sign_in_path.starts_with('/') {
			return Err(ConfigError::InvalidSignInPath { path: self.sign_in_path.clone() });
		}

		for (name, value) in self.default_headers.iter() {
			validate_header(name, value)?;
		}

		Ok(())
	}
}

pub(crate) fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
	let name_ok = !name.is_empty()
		&& name.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
	let value_ok = !value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0);

	if name_ok && value_ok {
		Ok(())
	} else {
		Err(ConfigError::InvalidHeader { name: name.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn builder_applies_defaults() {
		let config = ClientConfig::builder(url("https://api.example.com"))
			.build()
			.expect("Default configuration should be valid.");

		assert_eq!(config.sign_in_path, DEFAULT_SIGN_IN_PATH);
		assert_eq!(config.default_headers.get("accept"), Some(LD_JSON));
	}

	#[test]
	fn builder_rejects_bad_values() {
		let err = ClientConfig::builder(url("ftp://files.example.com"))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

		let err = ClientConfig::builder(url("https://api.example.com"))
			.sign_in_path("sign-in")
			.build()
			.expect_err("Relative sign-in paths should be rejected.");

		assert!(matches!(err, ConfigError::InvalidSignInPath { .. }));

		let err = ClientConfig::builder(url("https://api.example.com"))
			.default_header("X-Tenant", "acme\r\nInjected: yes")
			.build()
			.expect_err("Header values with line breaks should be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeader { .. }));
	}

	#[test]
	fn parse_reports_invalid_urls() {
		let err = ClientConfig::parse("not a url").expect_err("Garbage should not parse.");

		assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
	}

	#[test]
	fn endpoint_joins_slashes() {
		let with_slash = ClientConfig::parse("https://api.example.com/")
			.expect("Configuration should parse.");
		let nested = ClientConfig::parse("https://api.example.com/v2")
			.expect("Configuration should parse.");

		assert_eq!(with_slash.endpoint("/api/jobs"), "https://api.example.com/api/jobs");
		assert_eq!(with_slash.endpoint("api/jobs"), "https://api.example.com/api/jobs");
		assert_eq!(nested.endpoint("/api/jobs"), "https://api.example.com/v2/api/jobs");
	}
}
