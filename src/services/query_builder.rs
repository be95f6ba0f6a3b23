//! Translates a job search into a filter predicate and a stable ordering.
//!
//! The same [`SearchQuery`] drives both the SQL store (through
//! [`SearchQuery::to_sql_filter`]) and in-process evaluation (through
//! [`SearchQuery::matches`] and [`SearchQuery::compare`]), so the two stores
//! agree on which postings match and in what order.

use std::cmp::Ordering;

use crate::models::posting::Posting;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Ordering used by every listing: newest first, id breaks ties.
pub const ORDER_BY: &str = "created_at DESC, id ASC";

const LIKE_ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    location: String,
    page: i64,
    page_size: i64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new("", "", 1, DEFAULT_PAGE_SIZE)
    }
}

impl SearchQuery {
    /// Builds a normalized query. Text is trimmed; `page` and `page_size`
    /// below 1 are clamped to 1 and `page_size` is capped at
    /// [`MAX_PAGE_SIZE`].
    pub fn new(
        keyword: impl Into<String>,
        location: impl Into<String>,
        page: i64,
        page_size: i64,
    ) -> Self {
        Self {
            keyword: keyword.into().trim().to_string(),
            location: location.into().trim().to_string(),
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn matches(&self, posting: &Posting) -> bool {
        if !posting.visible {
            return false;
        }
        if !self.keyword.is_empty() {
            let needle = self.keyword.to_lowercase();
            let hit = [&posting.title, &posting.description, &posting.company]
                .iter()
                .any(|field| contains_ignore_case(field, &needle));
            if !hit {
                return false;
            }
        }
        if !self.location.is_empty() {
            let needle = self.location.to_lowercase();
            if !contains_ignore_case(&posting.location, &needle) {
                return false;
            }
        }
        true
    }

    pub fn compare(a: &Posting, b: &Posting) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Renders the predicate as a `WHERE` clause with positional
    /// placeholders starting at `$1`. User text only ever travels in
    /// `args`, escaped for `ILIKE`.
    pub fn to_sql_filter(&self) -> SqlFilter {
        let mut clauses = vec!["visible = TRUE".to_string()];
        let mut args = Vec::new();

        if !self.keyword.is_empty() {
            args.push(like_pattern(&self.keyword));
            let n = args.len();
            clauses.push(format!(
                r"(title ILIKE ${n} ESCAPE '\' OR description ILIKE ${n} ESCAPE '\' OR company ILIKE ${n} ESCAPE '\')"
            ));
        }
        if !self.location.is_empty() {
            args.push(like_pattern(&self.location));
            let n = args.len();
            clauses.push(format!(r"location ILIKE ${n} ESCAPE '\'"));
        }

        SqlFilter {
            where_clause: format!("WHERE {}", clauses.join(" AND ")),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub where_clause: String,
    pub args: Vec<String>,
}

impl SqlFilter {
    /// Index of the next free positional placeholder.
    pub fn next_placeholder(&self) -> usize {
        self.args.len() + 1
    }
}

/// Escapes `ILIKE` metacharacters so `input` only ever matches itself.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn like_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
