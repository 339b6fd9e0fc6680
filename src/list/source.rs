//! Page sources feeding [`crate::list::ListController`].

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::HttpTransport,
	pagination::PageQuery,
};

/// Boxed future returned by [`PageSource::fetch`].
pub type PageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<Page<T>>> + 'a + Send>>;

/// Anything able to load one page of items for a [`PageQuery`].
pub trait PageSource<T>
where
	Self: Send + Sync,
{
	/// Loads the page described by `query`.
	fn fetch<'a>(&'a self, query: &'a PageQuery) -> PageFuture<'a, T>;
}

/// One page of items plus the backend's total, when it sends one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
	/// Items on this page.
	pub items: Vec<T>,
	/// Authoritative item count across all pages.
	pub total: Option<u64>,
}
impl<T> Page<T> {
	/// Creates a page without a total.
	pub fn new(items: Vec<T>) -> Self {
		Self { items, total: None }
	}

	/// Attaches an authoritative total.
	pub fn with_total(mut self, total: u64) -> Self {
		self.total = Some(total);

		self
	}

	/// Decides whether another page should be requested after this one.
	///
	/// With a total, compares it to `already_loaded` plus this page. Without one, a page
	/// holding at least `page_size` items is assumed to have a successor; a short page is the
	/// last. The heuristic cannot tell a full final page from a full middle one, so a list
	/// whose length is a multiple of `page_size` costs one extra empty request.
	pub fn has_more(&self, already_loaded: usize, page_size: u32) -> bool {
		if self.items.is_empty() {
			return false;
		}

		match self.total {
			Some(total) => ((already_loaded + self.items.len()) as u64) < total,
			None => self.items.len() >= page_size as usize,
		}
	}
}
impl<T> Default for Page<T> {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

/// JSON-LD collection envelope returned by list endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Collection<T> {
	/// Items on the requested page.
	#[serde(alias = "hydra:member")]
	pub member: Vec<T>,
	/// Item count across all pages, when the backend computes it.
	#[serde(rename = "totalItems", alias = "hydra:totalItems", default)]
	pub total_items: Option<u64>,
}
impl<T> From<Collection<T>> for Page<T> {
	fn from(collection: Collection<T>) -> Self {
		Self { items: collection.member, total: collection.total_items }
	}
}

/// [`PageSource`] that loads a collection endpoint through [`ApiClient::fetch_page`].
pub struct CollectionSource<C>
where
	C: ?Sized + HttpTransport,
{
	client: ApiClient<C>,
	action: String,
}
impl<C> CollectionSource<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a source for `action` (e.g. `/api/jobs`).
	pub fn new(client: ApiClient<C>, action: impl Into<String>) -> Self {
		Self { client, action: action.into() }
	}

	/// Endpoint this source loads.
	pub fn action(&self) -> &str {
		&self.action
	}
}
impl<T, C> PageSource<T> for CollectionSource<C>
where
	T: 'static + Send + DeserializeOwned,
	C: ?Sized + HttpTransport,
{
	fn fetch<'a>(&'a self, query: &'a PageQuery) -> PageFuture<'a, T> {
		Box::pin(async move {
			let collection: Option<Collection<T>> =
				self.client.fetch_page(&self.action, query).await?;

			Ok(collection.map(Page::from).unwrap_or_default())
		})
	}
}
impl<C> Debug for CollectionSource<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CollectionSource").field("action", &self.action).finish()
	}
}
