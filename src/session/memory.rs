//! In-process [`SessionStore`] and [`Navigator`] implementations for headless use and tests.

// self
use crate::{
	_prelude::*,
	error::SessionError,
	session::{BearerToken, Navigator, SessionStore},
};

/// Thread-safe session that keeps the token in process memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySession(Arc<RwLock<Option<BearerToken>>>);
impl MemorySession {
	/// Creates a session already holding `token`.
	pub fn with_token(token: impl Into<String>) -> Self {
		Self(Arc::new(RwLock::new(Some(BearerToken::new(token)))))
	}

	/// Returns `true` when a token is stored.
	pub fn is_signed_in(&self) -> bool {
		self.0.read().is_some()
	}
}
impl SessionStore for MemorySession {
	fn token(&self) -> Result<Option<BearerToken>, SessionError> {
		Ok(self.0.read().clone())
	}

	fn set_token(&self, token: BearerToken) -> Result<(), SessionError> {
		*self.0.write() = Some(token);

		Ok(())
	}

	fn clear_token(&self) -> Result<(), SessionError> {
		self.0.write().take();

		Ok(())
	}
}

/// Navigator that records the current location and every redirect it receives.
#[derive(Clone, Debug, Default)]
pub struct MemoryNavigator {
	location: Arc<RwLock<String>>,
	history: Arc<Mutex<Vec<String>>>,
}
impl MemoryNavigator {
	/// Creates a navigator parked on `path`.
	pub fn at(path: impl Into<String>) -> Self {
		Self { location: Arc::new(RwLock::new(path.into())), history: Default::default() }
	}

	/// Returns every redirect issued so far, oldest first.
	pub fn redirects(&self) -> Vec<String> {
		self.history.lock().clone()
	}
}
impl Navigator for MemoryNavigator {
	fn current_path(&self) -> String {
		self.location.read().clone()
	}

	fn redirect(&self, path: &str) {
		*self.location.write() = path.to_owned();

		self.history.lock().push(path.to_owned());
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn memory_session_round_trips_token() {
		let session = MemorySession::default();

		assert!(session.token().expect("Memory sessions never fail.").is_none());

		session.set_token(BearerToken::new("abc")).expect("Memory sessions never fail.");

		assert!(session.is_signed_in());

		session.clear_token().expect("Memory sessions never fail.");

		assert!(!session.is_signed_in());
	}

	#[test]
	fn memory_navigator_tracks_redirects() {
		let navigator = MemoryNavigator::at("/dashboard");

		navigator.redirect("/sign-in");

		assert_eq!(navigator.current_path(), "/sign-in");
		assert_eq!(navigator.redirects(), vec!["/sign-in".to_owned()]);
	}
}
