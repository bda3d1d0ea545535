//! Query-string parsing: ordered raw parameters, filters, pagination and control keys.

use crate::error::AppError;
use crate::extractors::parse_flag;
use crate::query::OrderDirection;

pub const LIMIT: &str = "limit";
pub const PAGE: &str = "page";
pub const ORDER_BY_FIELD: &str = "order_by_field";
pub const ORDER_BY_DIRECTION: &str = "order_by_direction";
pub const WITHOUT_SCOPES: &str = "without_scopes";

/// Keys consumed by the find endpoint instead of being treated as filters.
pub const RESERVED_KEYS: &[&str] = &[LIMIT, PAGE, ORDER_BY_FIELD, ORDER_BY_DIRECTION, WITHOUT_SCOPES];

pub const MAX_LIMIT: u32 = 1000;

/// Query-string parameters in first-seen key order. Repeated keys and `key[]` forms
/// accumulate under one key; each entry keeps the raw (unsplit) occurrences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawParams {
    entries: Vec<(String, Vec<String>)>,
}

impl RawParams {
    pub fn parse(query: Option<&str>) -> Result<Self, AppError> {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Ok(RawParams::default());
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| AppError::Validation(format!("malformed query string: {}", e)))?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = RawParams::default();
        for (k, v) in pairs {
            params.push(k.into(), v.into());
        }
        params
    }

    fn push(&mut self, key: String, value: String) {
        let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_key(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    /// Last occurrence of a control key; empty strings count as absent.
    pub fn control(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.last())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// All entries as filters, in order, skipping `exclude`.
    pub fn filters_excluding(&self, exclude: &[&str]) -> RequestFilters {
        RequestFilters(
            self.entries
                .iter()
                .filter(|(k, _)| !exclude.contains(&k.as_str()))
                .map(|(k, raw)| (k.clone(), split_values(raw)))
                .collect(),
        )
    }
}

/// `a,b` and repeated occurrences flatten into one sequence; blanks are dropped.
fn split_values(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Column -> literal values, used as IN predicates. Keeps request order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestFilters(Vec<(String, Vec<String>)>);

impl RequestFilters {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first_key(&self) -> Option<&str> {
        self.0.first().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&[String]> {
        self.0.iter().find(|(k, _)| k == column).map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { limit: MAX_LIMIT, page: 1 }
    }
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        u64::from(self.limit) * u64::from(self.page.saturating_sub(1))
    }
}

/// Parsed control parameters plus the remaining filters of a find request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindParams {
    pub filters: RequestFilters,
    pub pagination: Pagination,
    pub order_by_field: Option<String>,
    pub order_by_direction: Option<OrderDirection>,
    pub without_scopes: bool,
}

impl FindParams {
    pub fn parse(raw: &RawParams) -> Result<Self, AppError> {
        let limit = match raw.control(LIMIT) {
            Some(s) => parse_int(LIMIT, s, 0, MAX_LIMIT)?,
            None => MAX_LIMIT,
        };
        let page = match raw.control(PAGE) {
            Some(s) => parse_int(PAGE, s, 1, u32::MAX)?,
            None => 1,
        };
        let order_by_direction = raw
            .control(ORDER_BY_DIRECTION)
            .map(str::parse::<OrderDirection>)
            .transpose()?;
        let without_scopes = match raw.control(WITHOUT_SCOPES) {
            Some(s) => parse_flag(WITHOUT_SCOPES, s)?,
            None => false,
        };
        Ok(FindParams {
            filters: raw.filters_excluding(RESERVED_KEYS),
            pagination: Pagination { limit, page },
            order_by_field: raw.control(ORDER_BY_FIELD).map(str::to_string),
            order_by_direction,
            without_scopes,
        })
    }
}

fn parse_int(name: &str, s: &str, min: u32, max: u32) -> Result<u32, AppError> {
    let n: i64 = s
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be an integer, got '{}'", name, s)))?;
    if n < i64::from(min) || n > i64::from(max) {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, n
        )));
    }
    Ok(n as u32)
}
