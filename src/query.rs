//! Read-query construction.
//!
//! A [`Query`] collects filter, sort, search, and paging state through
//! chained mutators that never touch the network, then executes with
//! [`Query::find_one`] or [`Query::each_row`]. Each mutator *replaces*
//! its part of the state; nothing accumulates across calls.
//!
//! The pure state lives in [`ReadParams`], which also knows how to encode
//! itself for the read endpoint:
//!
//! ```text
//! limit=<size>&offset=<(page-1)*size>[&filters=<json>][&sort=<json>]
//! ```
//!
//! - Search terms ride inside the filter payload under `$search`.
//! - One sort spec is sent as a bare object, two as an array. The server
//!   honors at most two; extra specs are kept but not sent.
//!
//! # Example
//!
//! ```rust
//! use factual::query::{ReadParams, SortSpec};
//! use serde_json::json;
//!
//! let mut params = ReadParams::default();
//! params
//!     .page(2, Some(10))
//!     .filter(json!({ "state": "CA" }))
//!     .sort([SortSpec::desc("population")]);
//!
//! let qs = params.to_query_string(None).unwrap();
//! assert!(qs.starts_with("limit=10&offset=10&filters="));
//! ```

use serde_json::{json, Map, Value};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use crate::client::Table;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::wire::query_string;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// The most sort specs the server applies.
pub const MAX_SORTS: usize = 2;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field_ref: String,
    pub direction: Direction,
}

impl SortSpec {
    pub fn asc(field_ref: impl Into<String>) -> Self {
        Self {
            field_ref: field_ref.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field_ref: impl Into<String>) -> Self {
        Self {
            field_ref: field_ref.into(),
            direction: Direction::Descending,
        }
    }

    /// `{"<field_ref>": 1}` or `{"<field_ref>": -1}`
    pub fn to_json(&self) -> Value {
        let order = match self.direction {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        };
        let mut obj = Map::new();
        obj.insert(self.field_ref.clone(), json!(order));
        Value::Object(obj)
    }
}

/// Parses `field`, `field:asc`, or `field:desc`.
impl FromStr for SortSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (field, dir) = match s.rsplit_once(':') {
            Some((field, dir)) => (field, dir),
            None => (s, "asc"),
        };
        if field.is_empty() {
            return Err(Error::argument(format!("empty field in sort spec '{}'", s)));
        }
        match dir.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::asc(field)),
            "desc" => Ok(Self::desc(field)),
            other => Err(Error::argument(format!(
                "unknown sort direction '{}' (expected asc or desc)",
                other
            ))),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        write!(f, "{}:{}", self.field_ref, dir)
    }
}

/// Filter, sort, search, and paging state for one read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadParams {
    filter: Option<Value>,
    sorts: Vec<SortSpec>,
    search: Vec<String>,
    page: u64,
    page_size: i64,
}

impl Default for ReadParams {
    fn default() -> Self {
        Self {
            filter: None,
            sorts: Vec::new(),
            search: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReadParams {
    /// Select a page (1-based) and optionally the page size. A page number
    /// of zero or below leaves the current page unchanged.
    pub fn page(&mut self, page: i64, size: Option<i64>) -> &mut Self {
        if page > 0 {
            self.page = page as u64;
        }
        if let Some(size) = size {
            self.page_size = size;
        }
        self
    }

    /// Replace the free-text search terms. Blank terms are dropped, so an
    /// empty or all-blank list clears search.
    pub fn search<I, S>(&mut self, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search = terms
            .into_iter()
            .map(|t| {
                let t: String = t.into();
                t.trim().to_string()
            })
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// Replace the filter expression. `Value::Null` clears it.
    pub fn filter(&mut self, expression: Value) -> &mut Self {
        self.filter = match expression {
            Value::Null => None,
            expr => Some(expr),
        };
        self
    }

    /// Replace the sort specs.
    pub fn sort<I>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = SortSpec>,
    {
        self.sorts = specs.into_iter().collect();
        self
    }

    pub fn current_page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn filter_expression(&self) -> Option<&Value> {
        self.filter.as_ref()
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.sorts
    }

    pub fn search_terms(&self) -> &[String] {
        &self.search
    }

    /// Effective limit: the page size, or the default when it is not
    /// positive.
    pub fn limit(&self) -> u64 {
        if self.page_size > 0 {
            self.page_size as u64
        } else {
            DEFAULT_PAGE_SIZE as u64
        }
    }

    /// Encode as read-endpoint parameters, in `limit, offset, filters,
    /// sort` order. `limit_override` replaces the page size for this
    /// encoding only.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] when search terms are set but the filter
    /// expression is not a JSON object they can be merged into.
    pub fn to_params(&self, limit_override: Option<u64>) -> Result<Vec<(String, String)>> {
        let limit = limit_override.unwrap_or_else(|| self.limit());
        let offset = (self.page - 1).saturating_mul(limit);

        let mut params = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];

        if let Some(filters) = self.filters_payload()? {
            params.push(("filters".to_string(), filters.to_string()));
        }

        let sort = match self.sorts.as_slice() {
            [] => None,
            [only] => Some(only.to_json()),
            many => Some(Value::Array(
                many.iter().take(MAX_SORTS).map(SortSpec::to_json).collect(),
            )),
        };
        if let Some(sort) = sort {
            params.push(("sort".to_string(), sort.to_string()));
        }

        Ok(params)
    }

    /// [`to_params`](Self::to_params) joined and percent-encoded.
    pub fn to_query_string(&self, limit_override: Option<u64>) -> Result<String> {
        Ok(query_string(&self.to_params(limit_override)?))
    }

    // Search terms are merged into a copy; the stored filter is untouched.
    fn filters_payload(&self) -> Result<Option<Value>> {
        if self.search.is_empty() {
            return Ok(self.filter.clone());
        }
        let mut merged = match &self.filter {
            None => Map::new(),
            Some(Value::Object(obj)) => obj.clone(),
            Some(other) => {
                return Err(Error::argument(format!(
                    "cannot combine search terms with non-object filter {}",
                    other
                )))
            }
        };
        merged.insert("$search".to_string(), json!(self.search));
        Ok(Some(Value::Object(merged)))
    }
}

/// A read query bound to a table.
///
/// Not synchronized: share one across threads only behind the caller's
/// own lock.
pub struct Query<'t> {
    table: &'t Table<'t>,
    params: ReadParams,
    total_rows: Cell<Option<u64>>,
}

impl<'t> Query<'t> {
    pub(crate) fn new(table: &'t Table<'t>) -> Self {
        Self {
            table,
            params: ReadParams::default(),
            total_rows: Cell::new(None),
        }
    }

    /// See [`ReadParams::page`].
    pub fn page(&mut self, page: i64, size: Option<i64>) -> &mut Self {
        self.params.page(page, size);
        self
    }

    /// See [`ReadParams::search`].
    pub fn search<I, S>(&mut self, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.search(terms);
        self
    }

    /// See [`ReadParams::filter`].
    pub fn filter(&mut self, expression: Value) -> &mut Self {
        self.params.filter(expression);
        self
    }

    /// See [`ReadParams::sort`].
    pub fn sort<I>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = SortSpec>,
    {
        self.params.sort(specs);
        self
    }

    pub fn params(&self) -> &ReadParams {
        &self.params
    }

    /// `total_rows` reported by the most recent execution.
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows.get()
    }

    /// Fetch one row, reading with a page size of 1. The current page is
    /// kept, so `page(n, _)` selects the n-th match (offset `n - 1`).
    /// `Ok(None)` when nothing matches.
    pub fn find_one(&self) -> Result<Option<Row>> {
        let page = self.table.read_page(&self.params, Some(1))?;
        self.total_rows.set(page.total_rows);
        Ok(page.rows.into_iter().next())
    }

    /// Fetch the page the current state describes and iterate its rows.
    /// Every call issues a fresh read; later pages are never prefetched.
    pub fn each_row(&self) -> Result<std::vec::IntoIter<Row>> {
        let page = self.table.read_page(&self.params, None)?;
        self.total_rows.set(page.total_rows);
        Ok(page.rows.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_defaults() {
        let params = ReadParams::default().to_params(None).unwrap();
        assert_eq!(
            params,
            vec![
                ("limit".to_string(), "20".to_string()),
                ("offset".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_and_size() {
        let mut p = ReadParams::default();
        p.page(2, Some(10));
        let params = p.to_params(None).unwrap();
        assert_eq!(param(&params, "limit"), Some("10"));
        assert_eq!(param(&params, "offset"), Some("10"));
    }

    #[test]
    fn test_page_zero_keeps_current_page() {
        let mut p = ReadParams::default();
        p.page(3, None);
        p.page(0, None);
        assert_eq!(p.current_page(), 3);
        p.page(-4, None);
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn test_non_positive_size_falls_back() {
        let mut p = ReadParams::default();
        p.page(3, Some(0));
        let params = p.to_params(None).unwrap();
        assert_eq!(param(&params, "limit"), Some("20"));
        assert_eq!(param(&params, "offset"), Some("40"));
    }

    #[test]
    fn test_limit_override() {
        let mut p = ReadParams::default();
        p.page(4, Some(50));
        let params = p.to_params(Some(1)).unwrap();
        assert_eq!(param(&params, "limit"), Some("1"));
        assert_eq!(param(&params, "offset"), Some("3"));
        assert_eq!(p.page_size(), 50);
    }

    #[test]
    fn test_filter_replaces() {
        let mut p = ReadParams::default();
        p.filter(json!({"state": "CA"}));
        p.filter(json!({"abbr": {"$bw": "N"}}));
        assert_eq!(p.filter_expression(), Some(&json!({"abbr": {"$bw": "N"}})));
        p.filter(Value::Null);
        assert!(p.filter_expression().is_none());
    }

    #[test]
    fn test_sort_and_search_replace() {
        let mut p = ReadParams::default();
        p.sort([SortSpec::asc("a"), SortSpec::desc("b")]);
        p.sort([SortSpec::asc("c")]);
        assert_eq!(p.sorts(), &[SortSpec::asc("c")]);

        p.search(["one", "two"]);
        p.search(["three"]);
        assert_eq!(p.search_terms(), &["three".to_string()]);
        p.search(["  ", ""]);
        assert!(p.search_terms().is_empty());
    }

    #[test]
    fn test_single_sort_is_object() {
        let mut p = ReadParams::default();
        p.sort([SortSpec::desc("population")]);
        let params = p.to_params(None).unwrap();
        let sort: Value = serde_json::from_str(param(&params, "sort").unwrap()).unwrap();
        assert_eq!(sort, json!({"population": -1}));
    }

    #[test]
    fn test_two_sorts_are_array() {
        let mut p = ReadParams::default();
        p.sort([SortSpec::asc("a"), SortSpec::desc("b")]);
        let params = p.to_params(None).unwrap();
        let sort: Value = serde_json::from_str(param(&params, "sort").unwrap()).unwrap();
        assert_eq!(sort, json!([{"a": 1}, {"b": -1}]));
    }

    #[test]
    fn test_extra_sorts_not_sent() {
        let mut p = ReadParams::default();
        p.sort([SortSpec::asc("a"), SortSpec::asc("b"), SortSpec::asc("c")]);
        assert_eq!(p.sorts().len(), 3);
        let params = p.to_params(None).unwrap();
        let sort: Value = serde_json::from_str(param(&params, "sort").unwrap()).unwrap();
        assert_eq!(sort.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_no_sort_param_without_sorts() {
        let params = ReadParams::default().to_params(None).unwrap();
        assert!(param(&params, "sort").is_none());
        assert!(param(&params, "filters").is_none());
    }

    #[test]
    fn test_search_merges_into_copy() {
        let mut p = ReadParams::default();
        p.filter(json!({"state": "CA"})).search(["coffee", "tea"]);
        let params = p.to_params(None).unwrap();
        let filters: Value = serde_json::from_str(param(&params, "filters").unwrap()).unwrap();
        assert_eq!(filters, json!({"state": "CA", "$search": ["coffee", "tea"]}));
        assert_eq!(p.filter_expression(), Some(&json!({"state": "CA"})));
    }

    #[test]
    fn test_search_without_filter() {
        let mut p = ReadParams::default();
        p.search(["coffee"]);
        let params = p.to_params(None).unwrap();
        let filters: Value = serde_json::from_str(param(&params, "filters").unwrap()).unwrap();
        assert_eq!(filters, json!({"$search": ["coffee"]}));
    }

    #[test]
    fn test_search_with_scalar_filter_is_rejected() {
        let mut p = ReadParams::default();
        p.filter(json!("oops")).search(["x"]);
        assert!(matches!(p.to_params(None), Err(Error::Argument(_))));
    }

    #[test]
    fn test_query_string_is_encoded() {
        let mut p = ReadParams::default();
        p.filter(json!({"state": "CA"}));
        assert_eq!(
            p.to_query_string(None).unwrap(),
            "limit=20&offset=0&filters=%7B%22state%22%3A%22CA%22%7D"
        );
    }

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!("name".parse::<SortSpec>().unwrap(), SortSpec::asc("name"));
        assert_eq!("name:DESC".parse::<SortSpec>().unwrap(), SortSpec::desc("name"));
        assert!("name:up".parse::<SortSpec>().is_err());
        assert!(":asc".parse::<SortSpec>().is_err());
        assert_eq!(SortSpec::desc("x").to_string(), "x:desc");
    }
}
