//! Infinite-scroll list controller.
//!
//! A [`ListController`] owns the items a paginated view has loaded so far. Page 1 is fetched
//! on mount and whenever the filter changes; the next page is fetched each time the view
//! reports that its bottom sentinel became visible. State transitions:
//!
//! ```text
//! Idle ──load_first_page/set_filter──▶ LoadingFirstPage ──ok, full page──▶ Idle
//!                                                       ──ok, short page─▶ Exhausted
//!                                                       ──err────────────▶ Idle
//! Idle ──sentinel (has more)─────────▶ LoadingMore ──ok, full page──▶ Idle
//!                                                  ──ok, short page─▶ Exhausted
//!                                                  ──err────────────▶ Idle
//! Exhausted ──set_filter─────────────▶ LoadingFirstPage
//! ```
//!
//! Sentinel triggers that arrive while a load is in flight, after the list is exhausted, or
//! before page 1 of the current filter reported more items are skipped. Failures leave the
//! loaded items untouched, are reported to the [`Notifier`], and are returned to the caller;
//! nothing is retried automatically. After a failed first-page load the list stays visible but
//! only another first-page load can grow it again.
//!
//! Every load captures a generation number, and a result that comes back after a newer
//! first-page load started is dropped.
//!
//! The controller always passes an explicit [`PageQuery`] and never touches shared
//! pagination state.

mod notify;
mod source;

pub use notify::*;
pub use source::*;

// self
use crate::{
	_prelude::*,
	obs::{self, Operation, Outcome, RequestSpan},
	pagination::{PageQuery, SearchFilter},
};

/// Load state of a [`ListController`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListState {
	#[default]
	/// No load in flight.
	Idle,
	/// Page 1 is loading.
	LoadingFirstPage,
	/// The next page is loading.
	LoadingMore,
	/// The last page has been loaded for the current filter.
	Exhausted,
}
impl ListState {
	/// Returns `true` while a fetch is in flight.
	pub const fn is_loading(self) -> bool {
		matches!(self, ListState::LoadingFirstPage | ListState::LoadingMore)
	}
}

/// Result of a load request that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
	/// A page was applied to the list.
	Loaded {
		/// Items the page contributed.
		added: usize,
		/// Whether another page will be requested.
		has_more: bool,
	},
	/// The trigger was ignored (load in flight, exhausted, or nothing more to load).
	Skipped,
	/// A newer first-page load superseded this one; its result was dropped.
	Stale,
}

/// Point-in-time copy of a controller's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListSnapshot<T> {
	/// Items loaded so far.
	pub items: Vec<T>,
	/// Last page applied; `0` before the first successful load.
	pub page: i64,
	/// Current load state.
	pub state: ListState,
	/// Whether the next sentinel trigger will fetch.
	pub has_more: bool,
}

#[derive(Debug)]
struct ListInner<T> {
	state: ListState,
	items: Vec<T>,
	page: i64,
	has_more: bool,
	filter: Option<SearchFilter>,
	generation: u64,
}

/// Page-by-page list loader with an in-flight guard.
pub struct ListController<T, S>
where
	S: PageSource<T>,
{
	source: S,
	page_size: u32,
	notifier: Arc<dyn Notifier>,
	inner: Mutex<ListInner<T>>,
}
impl<T, S> ListController<T, S>
where
	S: PageSource<T>,
{
	/// Creates an empty controller requesting `page_size` items per page.
	pub fn new(source: S, page_size: u32) -> Self {
		Self {
			source,
			page_size,
			notifier: Arc::new(TracingNotifier),
			inner: Mutex::new(ListInner {
				state: ListState::Idle,
				items: Vec::new(),
				page: 0,
				has_more: false,
				filter: None,
				generation: 0,
			}),
		}
	}

	/// Replaces the notifier used for load failures.
	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;

		self
	}

	/// Sets the initial filter without loading.
	pub fn with_filter(self, filter: Option<SearchFilter>) -> Self {
		self.inner.lock().filter = filter;

		self
	}

	/// Configured page size.
	pub fn page_size(&self) -> u32 {
		self.page_size
	}

	/// Current load state.
	pub fn state(&self) -> ListState {
		self.inner.lock().state
	}

	/// Whether the next sentinel trigger will fetch.
	pub fn has_more(&self) -> bool {
		self.inner.lock().has_more
	}

	/// Number of items loaded so far.
	pub fn len(&self) -> usize {
		self.inner.lock().items.len()
	}

	/// Returns `true` when no item is loaded.
	pub fn is_empty(&self) -> bool {
		self.inner.lock().items.is_empty()
	}

	/// Current filter.
	pub fn filter(&self) -> Option<SearchFilter> {
		self.inner.lock().filter.clone()
	}

	/// Runs `f` against the loaded items without cloning them.
	pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
		f(&self.inner.lock().items)
	}

	/// Copies the controller's state.
	pub fn snapshot(&self) -> ListSnapshot<T>
	where
		T: Clone,
	{
		let inner = self.inner.lock();

		ListSnapshot {
			items: inner.items.clone(),
			page: inner.page,
			state: inner.state,
			has_more: inner.has_more,
		}
	}

	/// Replaces the filter and reloads page 1.
	pub async fn set_filter(&self, filter: Option<SearchFilter>) -> Result<LoadOutcome> {
		self.inner.lock().filter = filter;

		self.load_first_page().await
	}

	/// Loads page 1 for the current filter, replacing the list on success.
	///
	/// Always fetches, even while another load is in flight; that load's result becomes stale.
	pub async fn load_first_page(&self) -> Result<LoadOutcome> {
		const OP: Operation = Operation::FirstPage;

		let (generation, query) = {
			let mut inner = self.inner.lock();

			inner.generation += 1;
			inner.state = ListState::LoadingFirstPage;

			(inner.generation, PageQuery::new(1, self.page_size).with_search(inner.filter.clone()))
		};
		let span = RequestSpan::new(OP, "load_first_page");

		obs::record_outcome(OP, Outcome::Attempt);

		let fetched = span.instrument(self.source.fetch(&query)).await;
		let result = {
			let mut inner = self.inner.lock();

			if inner.generation != generation {
				return Ok(LoadOutcome::Stale);
			}

			inner.state = ListState::Idle;

			// The kept items belong to the previous filter; only a page-1 reload may extend them.
			if fetched.is_err() {
				inner.has_more = false;
			}

			fetched.map(|page| {
				let has_more = page.has_more(0, self.page_size);
				let added = page.items.len();

				inner.items = page.items;
				inner.page = 1;
				inner.has_more = has_more;

				if !has_more {
					inner.state = ListState::Exhausted;
				}

				LoadOutcome::Loaded { added, has_more }
			})
		};

		self.finish(OP, result)
	}

	/// Handles the bottom sentinel becoming visible by appending the next page.
	pub async fn on_sentinel_visible(&self) -> Result<LoadOutcome> {
		const OP: Operation = Operation::NextPage;

		let (generation, query) = {
			let mut inner = self.inner.lock();

			if inner.state != ListState::Idle || !inner.has_more {
				return Ok(LoadOutcome::Skipped);
			}

			inner.state = ListState::LoadingMore;

			let query =
				PageQuery::new(inner.page + 1, self.page_size).with_search(inner.filter.clone());

			(inner.generation, query)
		};
		let span = RequestSpan::new(OP, "on_sentinel_visible");

		obs::record_outcome(OP, Outcome::Attempt);

		let fetched = span.instrument(self.source.fetch(&query)).await;
		let result = {
			let mut inner = self.inner.lock();

			if inner.generation != generation {
				return Ok(LoadOutcome::Stale);
			}

			match fetched {
				Ok(page) => {
					let has_more = page.has_more(inner.items.len(), self.page_size);
					let added = page.items.len();

					inner.items.extend(page.items);
					inner.page = query.page;
					inner.has_more = has_more;
					inner.state = if has_more { ListState::Idle } else { ListState::Exhausted };

					Ok(LoadOutcome::Loaded { added, has_more })
				},
				Err(e) => {
					inner.state = ListState::Idle;

					Err(e)
				},
			}
		};

		self.finish(OP, result)
	}

	fn finish(&self, operation: Operation, result: Result<LoadOutcome>) -> Result<LoadOutcome> {
		obs::record_result(operation, &result);

		if let Err(e) = &result {
			self.notifier.notify(e);
		}

		result
	}
}
impl<T, S> Debug for ListController<T, S>
where
	S: PageSource<T>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let inner = self.inner.lock();

		f.debug_struct("ListController")
			.field("page_size", &self.page_size)
			.field("state", &inner.state)
			.field("page", &inner.page)
			.field("len", &inner.items.len())
			.field("has_more", &inner.has_more)
			.finish()
	}
}
