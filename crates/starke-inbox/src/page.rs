//! Offset pagination for admin listings.

use serde::Serialize;

use crate::error::InboxError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `page_size` to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Parses raw query-string values, defaulting absent ones.
    ///
    /// # Errors
    ///
    /// Returns `InboxError::InvalidPagination` if a value is not an integer.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Result<Self, InboxError> {
        let parse = |raw: Option<&str>, default: i64| -> Result<i64, InboxError> {
            match raw {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| InboxError::InvalidPagination),
            }
        };
        Ok(Self::new(
            parse(page, 1)?,
            parse(page_size, DEFAULT_PAGE_SIZE)?,
        ))
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
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of a listing plus the total row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_values() {
        let req = PageRequest::parse(None, None).expect("defaults should parse");
        assert_eq!(req, PageRequest::new(1, 10));
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let req = PageRequest::parse(Some("0"), Some("500")).expect("should parse");
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 100);

        let req = PageRequest::parse(Some("-3"), Some("0")).expect("should parse");
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 1);

        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert!(matches!(
            PageRequest::parse(Some("two"), None),
            Err(InboxError::InvalidPagination)
        ));
        assert!(matches!(
            PageRequest::parse(None, Some("1.5")),
            Err(InboxError::InvalidPagination)
        ));
    }
}
