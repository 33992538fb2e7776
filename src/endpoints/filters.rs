//! Filter parser
//!
//! Turns raw query-string parameters into a typed [`FilterSet`] according to
//! an endpoint's declared [`FilterSpec`]. Parameters the spec does not
//! declare are ignored so endpoints stay usable behind generic query strings.

use crate::core::definition::{FilterSpec, RangeTarget};
use crate::core::error::RequestError;
use chrono::{DateTime, NaiveDate};
use std::collections::HashMap;

/// Requested values for one property filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilterValue {
    pub property: String,
    /// One value for equality, several for set membership
    pub values: Vec<String>,
}

/// Requested values for one field filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilterValue {
    pub field: String,
    pub column: String,
    pub values: Vec<String>,
}

/// Requested bounds of the start/end filter, as Unix timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilterValue {
    pub target: RangeTarget,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Typed filters supplied by one request
///
/// Only supplied entries are present; nothing is defaulted here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub properties: Vec<PropertyFilterValue>,
    pub fields: Vec<FieldFilterValue>,
    pub path: Option<String>,
    pub start_end: Option<RangeFilterValue>,
    pub range: Option<u32>,
    pub offset: Option<u32>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }
}

/// Parse raw query parameters against a filter spec
///
/// Entries are resolved in declaration order. A parameter bound to both a
/// property and a field resolves to the property.
pub fn parse(spec: &FilterSpec, params: &HashMap<String, String>) -> Result<FilterSet, RequestError> {
    let mut set = FilterSet::default();

    for (param, property) in &spec.properties {
        if let Some(raw) = params.get(param) {
            set.properties.push(PropertyFilterValue {
                property: property.clone(),
                values: split_values(param, raw)?,
            });
        }
    }

    for (param, binding) in &spec.fields {
        if spec.properties.contains_key(param) {
            continue;
        }
        if let Some(raw) = params.get(param) {
            set.fields.push(FieldFilterValue {
                field: binding.field.clone(),
                column: binding.column.clone(),
                values: split_values(param, raw)?,
            });
        }
    }

    if let Some(param) = &spec.path
        && let Some(raw) = params.get(param)
    {
        let alias = raw.trim().trim_matches('/');
        if alias.is_empty() {
            return Err(RequestError::invalid_filter(param, "empty path"));
        }
        set.path = Some(alias.to_string());
    }

    if let Some(start_end) = &spec.start_end {
        let start = params
            .get(&start_end.start)
            .map(|raw| parse_timestamp(&start_end.start, raw))
            .transpose()?;
        let end = params
            .get(&start_end.end)
            .map(|raw| parse_timestamp(&start_end.end, raw))
            .transpose()?;

        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(RequestError::invalid_filter(
                &start_end.start,
                format!("start ({}) is after end ({})", s, e),
            ));
        }

        if start.is_some() || end.is_some() {
            set.start_end = Some(RangeFilterValue {
                target: start_end.target.clone(),
                start,
                end,
            });
        }
    }

    if let Some(param) = &spec.range
        && let Some(raw) = params.get(param)
    {
        set.range = Some(parse_count(param, raw)?);
    }

    if let Some(param) = &spec.offset
        && let Some(raw) = params.get(param)
    {
        set.offset = Some(parse_count(param, raw)?);
    }

    Ok(set)
}

/// Split a comma-separated filter value
fn split_values(param: &str, raw: &str) -> Result<Vec<String>, RequestError> {
    let values: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if values.is_empty() {
        return Err(RequestError::invalid_filter(param, "empty value"));
    }
    Ok(values)
}

fn parse_count(param: &str, raw: &str) -> Result<u32, RequestError> {
    raw.trim().parse::<u32>().map_err(|_| {
        RequestError::invalid_filter(param, format!("expected a non-negative integer, got '{}'", raw))
    })
}

/// Accepts a Unix timestamp, an RFC 3339 datetime or a `YYYY-MM-DD` date
fn parse_timestamp(param: &str, raw: &str) -> Result<i64, RequestError> {
    let raw = raw.trim();

    if let Ok(ts) = raw.parse::<i64>() {
        return Ok(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().timestamp());
    }

    Err(RequestError::invalid_filter(
        param,
        format!("expected a timestamp or date, got '{}'", raw),
    ))
}
