//! Session contracts: where the bearer token lives and how the app is sent to sign-in.
//!
//! The client never touches ambient storage directly. A [`SessionStore`] is injected at
//! construction and read before every request, so token rotation between two calls on the
//! same client is picked up without rebuilding it. A [`Navigator`] receives the redirect
//! issued when the backend reports an expired session.

pub mod file;
pub mod memory;
pub mod token;

pub use file::FileSession;
pub use memory::{MemoryNavigator, MemorySession};
pub use token::BearerToken;

// self
use crate::error::SessionError;

/// Fixed storage key the bearer token is persisted under.
pub const TOKEN_KEY: &str = "token";

/// Session-scoped storage for the bearer token.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the current token, if any.
	fn token(&self) -> Result<Option<BearerToken>, SessionError>;

	/// Persists a new token, replacing any previous one.
	fn set_token(&self, token: BearerToken) -> Result<(), SessionError>;

	/// Removes the stored token.
	fn clear_token(&self) -> Result<(), SessionError>;
}

/// Navigation surface used for the session-expiry redirect.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Returns the current route path (e.g. `/dashboard`).
	fn current_path(&self) -> String;

	/// Sends the application to `path`.
	fn redirect(&self, path: &str);
}
