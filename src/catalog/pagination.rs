//! Catalog pagination.

use serde::Serialize;
use crate::catalog::params::QueryParams;
use crate::domain::value_objects::parse_int_prefix;

pub const PAGE_SIZE: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The requested page. Not clamped to `total_pages`: a page past the end is
    /// simply empty.
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub base_path: String,
    pub query_string_without_page: String,
}

impl Pagination {
    /// 1-based page from `?page=`; missing, unparseable or < 1 becomes 1.
    pub fn requested_page(params: &QueryParams) -> u64 {
        match params.first("page").and_then(parse_int_prefix) {
            Some(n) if n >= 1 => n as u64,
            _ => 1,
        }
    }

    pub fn new(total_count: u64, current_page: u64, base_path: impl Into<String>, params: &QueryParams) -> Self {
        Self {
            current_page,
            total_pages: total_count.div_ceil(PAGE_SIZE).max(1),
            total_count,
            base_path: base_path.into(),
            query_string_without_page: params.query_string_without_page(),
        }
    }

    /// Single page with no results, used when storage is offline.
    pub fn empty(base_path: impl Into<String>) -> Self {
        Self { current_page: 1, total_pages: 1, total_count: 0, base_path: base_path.into(), query_string_without_page: String::new() }
    }

    pub fn skip(page: u64) -> u64 { page.saturating_sub(1).saturating_mul(PAGE_SIZE) }
    pub fn limit() -> u64 { PAGE_SIZE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_page_coercion() {
        assert_eq!(Pagination::requested_page(&QueryParams::parse("")), 1);
        assert_eq!(Pagination::requested_page(&QueryParams::parse("page=0")), 1);
        assert_eq!(Pagination::requested_page(&QueryParams::parse("page=-3")), 1);
        assert_eq!(Pagination::requested_page(&QueryParams::parse("page=abc")), 1);
        assert_eq!(Pagination::requested_page(&QueryParams::parse("page=3")), 3);
    }

    #[test]
    fn test_total_pages() {
        let q = QueryParams::default();
        assert_eq!(Pagination::new(25, 3, "/produkti", &q).total_pages, 3);
        assert_eq!(Pagination::new(20, 1, "/produkti", &q).total_pages, 2);
        assert_eq!(Pagination::new(0, 1, "/produkti", &q).total_pages, 1);
    }

    #[test]
    fn test_page_past_the_end_is_kept() {
        let q = QueryParams::parse("page=99&brand=LG");
        let p = Pagination::new(25, Pagination::requested_page(&q), "/floor", &q);
        assert_eq!(p.current_page, 99);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.query_string_without_page, "brand=LG");
        assert_eq!(Pagination::skip(99), 980);
    }
}
