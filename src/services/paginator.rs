use serde::Serialize;

use crate::services::query_builder::{SearchQuery, DEFAULT_PAGE_SIZE};

/// One page of an ordered, filtered collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    /// Wraps an already-sliced page fetched by a store.
    pub fn new(query: &SearchQuery, items: Vec<T>, total_count: i64) -> Self {
        let total_count = total_count.max(0);
        Self {
            items,
            total_count,
            total_pages: total_pages(total_count, query.page_size()),
            page: query.page(),
            page_size: query.page_size(),
        }
    }

    /// Slices `[offset, offset + page_size)` out of a fully ordered collection.
    pub fn slice(query: &SearchQuery, ordered: Vec<T>) -> Self {
        let total_count = i64::try_from(ordered.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.page_size()).unwrap_or(usize::MAX);
        let items = ordered.into_iter().skip(offset).take(take).collect();
        Self::new(query, items, total_count)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count <= 0 {
        return 0;
    }
    let page_size = page_size.max(1);
    total_count / page_size + i64::from(total_count % page_size != 0)
}

/// Coerces a raw query-string number. Anything unparsable falls back to
/// `default`; the result is then clamped by [`SearchQuery::new`].
pub fn coerce_number(raw: Option<&str>, default: i64) -> i64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(default)
}

pub fn query_from_raw(
    keyword: Option<&str>,
    location: Option<&str>,
    page: Option<&str>,
    page_size: Option<&str>,
) -> SearchQuery {
    SearchQuery::new(
        keyword.unwrap_or_default(),
        location.unwrap_or_default(),
        coerce_number(page, 1),
        coerce_number(page_size, DEFAULT_PAGE_SIZE),
    )
}
