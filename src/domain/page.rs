//! Fixed-size pagination

/// Every listing returns at most this many rows per page
pub const PER_PAGE: usize = 8;

/// Highest page whose offset still fits in a `usize`
const MAX_PAGE: usize = usize::MAX / PER_PAGE;

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

impl PageRequest {
    /// Pages below 1 are clamped to the first page, huge ones to the last addressable
    pub fn new(page: usize) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
        }
    }

    pub fn first() -> Self {
        Self { page: 1 }
    }

    /// Parse a raw `page` parameter, falling back to the first page
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<usize>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        PER_PAGE
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * PER_PAGE
    }

    /// Slice an already ordered row set
    pub fn slice<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        rows.iter().skip(self.offset()).take(self.limit()).cloned().collect()
    }
}

/// One page of rows plus the total row count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        Self {
            items,
            page: request.page(),
            per_page: request.limit(),
            total,
        }
    }

    /// Convert every row, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }
}
