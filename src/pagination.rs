//! Pagination state, search filters, and query-string construction.
//!
//! Two ways of describing a page coexist:
//!
//! - [`Pagination`] is a shared, mutable handle. [`Pagination::global`] returns the one
//!   process-wide instance every client uses by default. Writers are not coordinated: a caller
//!   that sets the page and then calls [`crate::client::ApiClient::get_paginate`] can have its
//!   value overwritten by another caller in between. This hazard is kept for parity with
//!   existing call sites.
//! - [`PageQuery`] is an immutable value passed per call to
//!   [`crate::client::ApiClient::fetch_page`]; it never observes other callers' writes.

// std
use std::sync::OnceLock;
// self
use crate::_prelude::*;

/// Page size used until a caller sets one.
pub const DEFAULT_ROWS_PER_PAGE: u32 = 5;

static GLOBAL: OnceLock<Pagination> = OnceLock::new();

/// Scalar value of a search filter entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchValue {
	/// Boolean flag.
	Bool(bool),
	/// Whole number.
	Integer(i64),
	/// Decimal number.
	Float(f64),
	/// Free text.
	Text(String),
}
impl Display for SearchValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Bool(v) => write!(f, "{v}"),
			Self::Integer(v) => write!(f, "{v}"),
			Self::Float(v) => write!(f, "{v}"),
			Self::Text(v) => f.write_str(v),
		}
	}
}
impl From<&str> for SearchValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for SearchValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<bool> for SearchValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i64> for SearchValue {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}
impl From<i32> for SearchValue {
	fn from(value: i32) -> Self {
		Self::Integer(value.into())
	}
}
impl From<f64> for SearchValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

/// Insertion-ordered map of field name to scalar value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilter(Vec<(String, SearchValue)>);
impl SearchFilter {
	/// Adds a field, replacing the value in place when the field already exists.
	pub fn insert(&mut self, field: impl Into<String>, value: impl Into<SearchValue>) {
		let field = field.into();
		let value = value.into();

		match self.0.iter_mut().find(|(name, _)| *name == field) {
			Some(entry) => entry.1 = value,
			None => self.0.push((field, value)),
		}
	}

	/// Builder-style variant of [`insert`](Self::insert).
	pub fn with(mut self, field: impl Into<String>, value: impl Into<SearchValue>) -> Self {
		self.insert(field, value);

		self
	}

	/// Removes a field.
	pub fn remove(&mut self, field: &str) -> Option<SearchValue> {
		let idx = self.0.iter().position(|(name, _)| name == field)?;

		Some(self.0.remove(idx).1)
	}

	/// Returns a field's value.
	pub fn get(&self, field: &str) -> Option<&SearchValue> {
		self.0.iter().find(|(name, _)| name == field).map(|(_, value)| value)
	}

	/// Returns `true` when no field is set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over fields in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &SearchValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}
}
impl<K, V> FromIterator<(K, V)> for SearchFilter
where
	K: Into<String>,
	V: Into<SearchValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut filter = Self::default();

		for (field, value) in iter {
			filter.insert(field, value);
		}

		filter
	}
}

/// How [`crate::client::ApiClient::get_paginate`] picks the page number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageMode {
	/// Page size changed: restart from page 1.
	RowPerPage,
	/// Use the current page number.
	Page,
}
impl PageMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PageMode::RowPerPage => "row_per_page",
			PageMode::Page => "page",
		}
	}
}
impl Display for PageMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable page description passed per call.
#[derive(Clone, Debug, PartialEq)]
pub struct PageQuery {
	/// 1-based page number; values are forwarded unvalidated.
	pub page: i64,
	/// Requested page size.
	pub rows_per_page: u32,
	/// Optional search filter.
	pub search: Option<SearchFilter>,
}
impl PageQuery {
	/// Creates a query for `page` with `rows_per_page` items and no filter.
	pub fn new(page: i64, rows_per_page: u32) -> Self {
		Self { page, rows_per_page, search: None }
	}

	/// Attaches a search filter.
	pub fn with_search(mut self, search: Option<SearchFilter>) -> Self {
		self.search = search;

		self
	}

	/// Builds `limit=..&page=..[&field=value...&type_search=like]`.
	///
	/// The marker follows any filter that is set, including an empty one.
	pub fn to_query_string(&self) -> String {
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		serializer
			.append_pair("limit", &self.rows_per_page.to_string())
			.append_pair("page", &self.page.to_string());

		if let Some(search) = &self.search {
			for (field, value) in search.iter() {
				serializer.append_pair(field, &value.to_string());
			}

			serializer.append_pair("type_search", "like");
		}

		serializer.finish()
	}

	/// Appends the query string to `action`.
	pub fn apply(&self, action: &str) -> String {
		format!("{}{}", crate::request::add_to_url(action), self.to_query_string())
	}
}

/// Raw pagination state behind a [`Pagination`] handle.
#[derive(Clone, Debug, PartialEq)]
pub struct PaginationState {
	/// Current page; `0` until a caller sets it.
	pub page: i64,
	/// Page size.
	pub rows_per_page: u32,
	/// Optional search filter.
	pub search: Option<SearchFilter>,
}
impl Default for PaginationState {
	fn default() -> Self {
		Self { page: 0, rows_per_page: DEFAULT_ROWS_PER_PAGE, search: None }
	}
}

/// Shared, mutable pagination handle; clones observe each other's writes.
#[derive(Clone, Debug, Default)]
pub struct Pagination(Arc<RwLock<PaginationState>>);
impl Pagination {
	/// Returns the process-wide handle, creating it on first access.
	pub fn global() -> Self {
		GLOBAL.get_or_init(Pagination::default).clone()
	}

	/// Creates a handle that is not shared with the global one.
	pub fn isolated() -> Self {
		Self::default()
	}

	/// Returns `true` when both handles point at the same state.
	pub fn same_as(&self, other: &Pagination) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Current page.
	pub fn page(&self) -> i64 {
		self.0.read().page
	}

	/// Sets the current page.
	pub fn set_page(&self, page: i64) {
		self.0.write().page = page;
	}

	/// Current page size.
	pub fn rows_per_page(&self) -> u32 {
		self.0.read().rows_per_page
	}

	/// Sets the page size.
	pub fn set_rows_per_page(&self, rows_per_page: u32) {
		self.0.write().rows_per_page = rows_per_page;
	}

	/// Current search filter.
	pub fn search(&self) -> Option<SearchFilter> {
		self.0.read().search.clone()
	}

	/// Sets or clears the search filter.
	pub fn set_search(&self, search: Option<SearchFilter>) {
		self.0.write().search = search;
	}

	/// Reads the state as it is right now and turns it into a [`PageQuery`] for `mode`.
	pub fn snapshot(&self, mode: PageMode) -> PageQuery {
		let state = self.0.read();
		let page = match mode {
			PageMode::RowPerPage => 1,
			PageMode::Page => state.page,
		};

		PageQuery { page, rows_per_page: state.rows_per_page, search: state.search.clone() }
	}
}
