//! One page-fetching capability for both server-paginated and fully fetched lists.

use std::sync::{Arc, Mutex};

use crate::error::{AppError, Result};
use crate::pager::{clamp_page, PageInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub search: String,
}

impl PageQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
    pub total_items: usize,
}

pub trait Paginator<T>: Send + Sync {
    /// Fetch one page. Out-of-range page numbers are clamped, never an error.
    fn fetch_page(&self, page: u32, query: &PageQuery) -> Result<Page<T>>;

    /// Drop anything cached so the next fetch hits the source again.
    fn refresh(&self) {}
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

type RemoteFetch<T> = dyn Fn(u32, &PageQuery) -> Result<Page<T>> + Send + Sync;

/// The server paginates; this only forwards the request.
pub struct RemotePaginator<T> {
    fetch: Box<RemoteFetch<T>>,
}

impl<T> RemotePaginator<T> {
    pub fn new(fetch: impl Fn(u32, &PageQuery) -> Result<Page<T>> + Send + Sync + 'static) -> Self {
        Self {
            fetch: Box::new(fetch),
        }
    }
}

impl<T> Paginator<T> for RemotePaginator<T> {
    fn fetch_page(&self, page: u32, query: &PageQuery) -> Result<Page<T>> {
        let page = page.max(1);
        let mut result = (self.fetch)(page, query)?;
        // a server may echo a page past the end when the list shrank
        if result.info.total_pages > 0 && page > result.info.total_pages {
            tracing::debug!(page, total = result.info.total_pages, "refetching last page");
            result = (self.fetch)(result.info.total_pages, query)?;
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

type Loader<T> = dyn Fn() -> Result<Vec<T>> + Send + Sync;
type Matcher<T> = fn(&T, &str) -> bool;

/// Fetches the whole list once, then filters and slices it locally.
pub struct InMemoryPaginator<T> {
    loader: Box<Loader<T>>,
    matches: Matcher<T>,
    per_page: usize,
    cache: Mutex<Option<Arc<Vec<T>>>>,
}

impl<T: Clone + Send + Sync> InMemoryPaginator<T> {
    pub fn new(
        per_page: usize,
        matches: Matcher<T>,
        loader: impl Fn() -> Result<Vec<T>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            matches,
            per_page: per_page.max(1),
            cache: Mutex::new(None),
        }
    }

    /// Paginate an already fetched list.
    #[cfg(test)]
    pub fn from_items(per_page: usize, matches: Matcher<T>, items: Vec<T>) -> Self
    where
        T: 'static,
    {
        let items = Arc::new(items);
        Self::new(per_page, matches, move || Ok(items.as_ref().clone()))
    }

    fn items(&self) -> Result<Arc<Vec<T>>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| AppError::Other("page cache poisoned".into()))?;
        if let Some(items) = cache.as_ref() {
            return Ok(Arc::clone(items));
        }
        let items = Arc::new((self.loader)()?);
        *cache = Some(Arc::clone(&items));
        Ok(items)
    }
}

impl<T: Clone + Send + Sync> Paginator<T> for InMemoryPaginator<T> {
    fn fetch_page(&self, page: u32, query: &PageQuery) -> Result<Page<T>> {
        let all = self.items()?;
        let needle = query.search.trim().to_lowercase();
        let filtered: Vec<&T> = all
            .iter()
            .filter(|item| needle.is_empty() || (self.matches)(item, &needle))
            .collect();

        let info = PageInfo::from_item_count(page, filtered.len(), self.per_page);
        let start = (clamp_page(page, info.total_pages) as usize - 1) * self.per_page;
        let items = filtered
            .iter()
            .skip(start)
            .take(self.per_page)
            .map(|item| (*item).clone())
            .collect();
        Ok(Page {
            items,
            info,
            total_items: filtered.len(),
        })
    }

    fn refresh(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = None;
        }
    }
}

/// Case-insensitive substring match; `needle` is already lowercased.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
