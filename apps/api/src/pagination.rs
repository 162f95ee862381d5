use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const DEFAULT_LIMIT: i64 = 10;

/// A validated page window. `page` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub page: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: 0,
        }
    }
}

impl Page {
    pub fn new(limit: i64, page: i64) -> Result<Self, AppError> {
        if limit < 1 {
            return Err(AppError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        if page < 0 {
            return Err(AppError::Validation(
                "page must be a non-negative integer".to_string(),
            ));
        }
        if limit.checked_mul(page).is_none() {
            return Err(AppError::Validation("page is out of range".to_string()));
        }
        Ok(Self { limit, page })
    }

    pub fn offset(&self) -> i64 {
        self.limit * self.page
    }

    /// Slices an already ordered list the way `LIMIT .. OFFSET ..` would.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

/// Ranking direction: `lower` starts from the least qualified, `upper` from the most.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Lower,
    Upper,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Lower => "lower",
            SortOrder::Upper => "upper",
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortOrder::Lower => "ASC",
            SortOrder::Upper => "DESC",
        }
    }
}

/// Raw `?limit=&page=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl PageParams {
    pub fn validate(&self) -> Result<Page, AppError> {
        Page::new(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.page.unwrap_or_default(),
        )
    }
}

/// Raw `?sort=&limit=&page=` query parameters of the selection endpoints.
/// `sorting_from` is accepted as a legacy name for `sort`.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    #[serde(default, alias = "sorting_from")]
    pub sort: SortOrder,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl SelectionParams {
    pub fn page(&self) -> Result<Page, AppError> {
        PageParams {
            limit: self.limit,
            page: self.page,
        }
        .validate()
    }
}

/// Rejects non-positive identifiers before any query runs.
pub fn validate_id(id: i64, what: &str) -> Result<i64, AppError> {
    if id < 1 {
        return Err(AppError::Validation(format!(
            "{what} must be a positive integer number"
        )));
    }
    Ok(id)
}

/// Rejects an empty batch body.
pub fn require_batch<T>(items: &[T], what: &str) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = PageParams::default().validate().unwrap();
        assert_eq!(page, Page { limit: 10, page: 0 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset_is_page_times_limit() {
        let page = Page::new(5, 3).unwrap();
        assert_eq!(page.offset(), 15);
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(Page::new(0, 0), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_negative_page_rejected() {
        assert!(matches!(Page::new(10, -1), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_apply_slices_like_limit_offset() {
        let page = Page::new(1, 1).unwrap();
        assert_eq!(page.apply(vec!["a", "b", "c"]), vec!["b"]);
        let past_end = Page::new(10, 4).unwrap();
        assert!(past_end.apply(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn test_sort_order_parses_lowercase_tokens() {
        let upper: SortOrder = serde_json::from_str("\"upper\"").unwrap();
        assert_eq!(upper, SortOrder::Upper);
        assert_eq!(SortOrder::default(), SortOrder::Lower);
        assert!(serde_json::from_str::<SortOrder>("\"sideways\"").is_err());
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id(3, "job_id").unwrap(), 3);
        assert!(validate_id(0, "job_id").is_err());
        assert!(validate_id(-4, "job_id").is_err());
    }

    #[test]
    fn test_require_batch() {
        assert!(require_batch(&[1], "skills").is_ok());
        assert!(matches!(
            require_batch::<i32>(&[], "skills"),
            Err(AppError::Validation(_))
        ));
    }
}
