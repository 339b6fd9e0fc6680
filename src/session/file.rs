//! File-backed [`SessionStore`] for CLIs and long-lived desktop sessions.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	error::SessionError,
	session::{BearerToken, SessionStore, TOKEN_KEY},
};

/// Persists the session as a JSON object keyed by [`TOKEN_KEY`].
///
/// The file is re-read on every [`SessionStore::token`] call so a token written by another
/// process is picked up by the next request.
#[derive(Clone, Debug)]
pub struct FileSession {
	path: PathBuf,
	lock: Arc<Mutex<()>>,
}
impl FileSession {
	/// Opens a session at `path`, creating the parent directory when needed.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, lock: Default::default() })
	}

	fn load(path: &Path) -> Result<BTreeMap<String, String>, SessionError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| SessionError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| SessionError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), SessionError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| SessionError::Backend {
				message: format!("Failed to create session directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, contents: &BTreeMap<String, String>) -> Result<(), SessionError> {
		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| SessionError::Serialization {
				message: format!("Failed to serialize session: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| SessionError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| SessionError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| SessionError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| SessionError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn update(
		&self,
		apply: impl FnOnce(&mut BTreeMap<String, String>),
	) -> Result<(), SessionError> {
		let _guard = self.lock.lock();
		let mut contents = Self::load(&self.path)?;

		apply(&mut contents);

		self.persist(&contents)
	}
}
impl SessionStore for FileSession {
	fn token(&self) -> Result<Option<BearerToken>, SessionError> {
		let _guard = self.lock.lock();

		Ok(Self::load(&self.path)?.remove(TOKEN_KEY).map(BearerToken::new))
	}

	fn set_token(&self, token: BearerToken) -> Result<(), SessionError> {
		self.update(|contents| {
			contents.insert(TOKEN_KEY.into(), token.expose().to_owned());
		})
	}

	fn clear_token(&self) -> Result<(), SessionError> {
		self.update(|contents| {
			contents.remove(TOKEN_KEY);
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process, time::SystemTime};
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let nanos = SystemTime::now()
			.duration_since(SystemTime::UNIX_EPOCH)
			.expect("System clock should be after the Unix epoch.")
			.as_nanos();

		env::temp_dir().join(format!("job_board_session_{label}_{}_{nanos}.json", process::id()))
	}

	#[test]
	fn token_survives_reopen() {
		let path = temp_path("reopen");
		let session = FileSession::open(&path).expect("Failed to open file session.");

		session.set_token(BearerToken::new("persisted")).expect("Failed to store token.");
		drop(session);

		let reopened = FileSession::open(&path).expect("Failed to reopen file session.");
		let token = reopened
			.token()
			.expect("Failed to read token.")
			.expect("Token should survive a reopen.");

		assert_eq!(token.expose(), "persisted");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}

	#[test]
	fn clear_removes_only_the_token_key() {
		let path = temp_path("clear");

		fs::write(&path, r#"{"token":"abc","theme":"dark"}"#)
			.expect("Failed to seed session file.");

		let session = FileSession::open(&path).expect("Failed to open file session.");

		session.clear_token().expect("Failed to clear token.");

		assert!(session.token().expect("Failed to read token.").is_none());

		let remaining = FileSession::load(&path).expect("Failed to reload session file.");

		assert_eq!(remaining.get("theme").map(String::as_str), Some("dark"));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}

	#[test]
	fn missing_file_means_signed_out() {
		let session = FileSession::open(temp_path("missing")).expect("Failed to open session.");

		assert!(session.token().expect("Missing files should read as empty.").is_none());
	}
}
