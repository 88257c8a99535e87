//! Paging and sorting parameters shared by list endpoints.

use desk_http::ApiRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page size used by every list screen.
pub const PAGE_SIZE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// One `sort=field,direction` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field` or `field,asc|desc`. Direction defaults to ascending.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.splitn(2, ',');
        let field = parts.next()?.trim();
        if field.is_empty() {
            return None;
        }
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(_) => return None,
        };
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction)
    }
}

/// Page index, size, and sort order of a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<SortField>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: PAGE_SIZE,
            sort: Vec::new(),
        }
    }
}

impl PageRequest {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn sorted_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// Append `page`, `size` and `sort` query pairs.
    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request.query("page", self.page).query("size", self.size);
        self.apply_sort(request)
    }

    fn apply_sort(&self, request: ApiRequest) -> ApiRequest {
        self.sort
            .iter()
            .fold(request, |request, sort| request.query("sort", sort))
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub content: Vec<T>,
    pub current_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> Paged<T> {
    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_request() {
        let request = PageRequest::default().apply(ApiRequest::get("/api/admin/shops"));
        assert_eq!(request.display_target(), "/api/admin/shops?page=0&size=40");
    }

    #[test]
    fn test_sort_fields_repeat_in_order() {
        let request = PageRequest::page(2)
            .sorted_by(SortField::desc("createdAt"))
            .sorted_by(SortField::asc("shopName"))
            .apply(ApiRequest::get("/api/admin/shops"));
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("size".to_string(), "40".to_string()),
                ("sort".to_string(), "createdAt,desc".to_string()),
                ("sort".to_string(), "shopName,asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!(SortField::parse("login,desc"), Some(SortField::desc("login")));
        assert_eq!(SortField::parse("login"), Some(SortField::asc("login")));
        assert_eq!(SortField::parse("login, ASC"), Some(SortField::asc("login")));
        assert_eq!(SortField::parse("login,sideways"), None);
        assert_eq!(SortField::parse(""), None);
    }

    #[test]
    fn test_paged_parses_backend_shape() {
        let page: Paged<u32> = serde_json::from_str(
            r#"{"content":[1,2],"currentPage":0,"totalItems":42,"totalPages":2}"#,
        )
        .unwrap();
        assert_eq!(page.content, vec![1, 2]);
        assert!(page.has_next());
    }
}
