//! Sinks for the transient notifications raised when a list load fails.

// self
use crate::_prelude::*;

/// Receives failures the user should be told about (typically shown as a toast).
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Reports `error`.
	fn notify(&self, error: &Error);
}

/// Notifier that logs failures through `tracing` (a no-op without the `tracing` feature).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify(&self, error: &Error) {
		#[cfg(feature = "tracing")]
		tracing::warn!(message = %error.message(), status = ?error.status(), "list load failed");
		#[cfg(not(feature = "tracing"))]
		let _ = error;
	}
}

/// Notifier that keeps every message in memory, oldest first.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier(Arc<Mutex<Vec<String>>>);
impl MemoryNotifier {
	/// Returns the messages received so far.
	pub fn messages(&self) -> Vec<String> {
		self.0.lock().clone()
	}
}
impl Notifier for MemoryNotifier {
	fn notify(&self, error: &Error) {
		self.0.lock().push(error.message());
	}
}
