/// Pagination parameters and page metadata
///
/// List endpoints accept `page`, `limit`, `sortBy` and `sortOrder` in the
/// query string. Values are clamped so a client can never ask for an
/// unbounded page.
///
/// # Example
///
/// ```
/// use planboard_shared::pagination::ListParams;
///
/// let params = ListParams { page: Some(3), limit: Some(20), ..Default::default() };
/// assert_eq!(params.offset(), 40);
/// assert_eq!(params.limit(), 20);
/// ```

use serde::{Deserialize, Serialize};

/// Default number of items per page
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a client may request
pub const MAX_LIMIT: i64 = 100;

/// Highest page number accepted; larger values are clamped to it
pub const MAX_PAGE: i64 = 1_000_000;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Common list parameters (from query string)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: Option<i64>,

    /// Items per page
    pub limit: Option<i64>,

    /// Column to sort by. Each model whitelists the columns it accepts.
    pub sort_by: Option<String>,

    /// Sort direction
    pub sort_order: Option<SortOrder>,
}

impl ListParams {
    /// Current page, clamped to `1..=MAX_PAGE`
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    /// Page size, clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// SQL offset for the current page
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Sort direction, newest first by default
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }

    /// Resolves `sort_by` against a whitelist of `(query name, column)` pairs
    ///
    /// Falls back to `default_column` when the requested field is absent or
    /// not allowed, so user input never reaches the SQL text.
    pub fn sort_column(&self, allowed: &[(&str, &'static str)], default_column: &'static str) -> &'static str {
        self.sort_by
            .as_deref()
            .and_then(|field| {
                allowed
                    .iter()
                    .find(|(name, _)| *name == field)
                    .map(|(_, column)| *column)
            })
            .unwrap_or(default_column)
    }

    /// Builds page metadata for a result set of `total` rows
    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            page: self.page(),
            limit: self.limit(),
            total,
        }
    }
}

/// Page metadata returned alongside list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// One page of results plus its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, params: &ListParams, total: i64) -> Self {
        Self {
            meta: params.meta(total),
            data,
        }
    }
}
