//! Optional observability helpers for requests and list loads.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `job_board_client.request` with the
//!   `operation` and `stage` (call site) fields. Spans around a single request also carry the
//!   HTTP `method` and, once a response arrives, its `status`.
//! - Enable `metrics` to increment the `job_board_client_request_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;

pub use metrics::*;

// self
use crate::{_prelude::*, request::Method};

/// Future returned by [`RequestSpan::instrument`].
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`RequestSpan::instrument`]; the future itself when tracing is off.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Single request through [`crate::client::ApiClient::send`].
	Send,
	/// Paginated fetch driven by shared state or an explicit page query.
	Paginate,
	/// List controller loading page 1.
	FirstPage,
	/// List controller appending the next page.
	NextPage,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Send => "send",
			Operation::Paginate => "paginate",
			Operation::FirstPage => "first_page",
			Operation::NextPage => "next_page",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// `job_board_client.request` span wrapped around client calls and list loads.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Opens a span for `operation` issued from `stage`.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"job_board_client.request",
					operation = operation.as_str(),
					stage,
					method = tracing::field::Empty,
					status = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Tags the span with the HTTP method of the request it covers.
	pub fn with_method(self, method: Method) -> Self {
		#[cfg(feature = "tracing")]
		self.span.record("method", method.as_str());
		#[cfg(not(feature = "tracing"))]
		let _ = method;

		self
	}

	/// Records the response status once the backend answered.
	pub fn record_status(&self, status: u16) {
		#[cfg(feature = "tracing")]
		self.span.record("status", status);
		#[cfg(not(feature = "tracing"))]
		let _ = status;
	}

	/// Runs `fut` inside the span; no guard is held across `.await`.
	pub fn instrument<F>(&self, fut: F) -> Instrumented<F>
	where
		F: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
