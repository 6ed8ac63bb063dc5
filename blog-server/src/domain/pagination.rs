use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Missing, unparsable or non-positive values fall back to the defaults.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|v| *v > 0)
        };
        Self {
            page: parse(page).unwrap_or(DEFAULT_PAGE),
            limit: parse(limit).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total: u64) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            pages: total.div_ceil(u64::from(pagination.limit)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub posts: Vec<T>,
    pub pagination: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        assert_eq!(Pagination::from_query(None, None), Pagination::default());
        assert_eq!(
            Pagination::from_query(Some("0"), Some("-4")),
            Pagination::default()
        );
        assert_eq!(
            Pagination::from_query(Some("abc"), Some("")),
            Pagination::default()
        );
        assert_eq!(
            Pagination::from_query(Some("3"), Some("25")),
            Pagination { page: 3, limit: 25 }
        );
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(Pagination::from_query(None, Some("5000")).limit, MAX_LIMIT);
    }

    #[test]
    fn page_count_rounds_up() {
        let info = PageInfo::new(Pagination::new(2, 5), 12);
        assert_eq!(info.pages, 3);
        assert_eq!(PageInfo::new(Pagination::default(), 0).pages, 0);
        assert_eq!(Pagination::new(2, 5).offset(), 5);
    }
}
