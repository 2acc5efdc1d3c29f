use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error(
    "invalid pagination: page={page}, per_page={per_page} (per_page must be within 1..={max})",
    max = MAX_PER_PAGE
)]
pub struct InvalidPagination {
    page: i64,
    per_page: i64,
}

/// One-based page window over an ordered collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Result<Self, InvalidPagination> {
        if page < 1 || !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(InvalidPagination { page, per_page });
        }

        Ok(Self { page, per_page })
    }

    pub const fn page(&self) -> i64 {
        self.page
    }

    pub const fn limit(&self) -> i64 {
        self.per_page
    }

    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub const fn pages(&self, total: i64) -> i64 {
        (total + self.per_page - 1) / self.per_page
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl TryFrom<PageParams> for Pagination {
    type Error = InvalidPagination;

    fn try_from(p: PageParams) -> Result<Self, Self::Error> {
        Self::new(p.page, p.per_page)
    }
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

pub const LIKE_ESCAPE: char = '\\';

/// Lowercased substring `LIKE` pattern matching `keyword` literally.
/// Compare it against `db::fold` of the column.
pub fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed keyword, `None` when blank.
pub fn keyword(k: Option<&str>) -> Option<&str> {
    k.map(str::trim).filter(|k| !k.is_empty())
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, p: &Pagination) -> Self {
        Self {
            items,
            total,
            page: p.page(),
            pages: p.pages(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            pages: self.pages,
        }
    }
}
