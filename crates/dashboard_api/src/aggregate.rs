use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::dataset::{Dataset, DatasetError};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

/// Order of points on the sales-over-time line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalesOrdering {
    /// Rows exactly as they appear in the file.
    #[default]
    RowOrder,
    /// Stable sort by parsed date; lexical order when any date is unparseable.
    ByDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesPoint {
    pub date: String,
    pub amount: Option<f64>,
}

/// Sums `value_column` per distinct `key_column` value, in order of first
/// appearance. Rows with a missing key are skipped; missing values add 0.
pub fn sum_by_group(
    dataset: &Dataset,
    key_column: &str,
    value_column: &str,
) -> Result<Vec<GroupTotal>, DatasetError> {
    let keys = dataset.text_column(key_column)?;
    let values = dataset.numeric_column(value_column)?;

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupTotal> = Vec::new();
    for (key, value) in keys.into_iter().zip(values) {
        let Some(key) = key else {
            continue;
        };
        let position = *positions.entry(key).or_insert_with(|| {
            groups.push(GroupTotal {
                key: key.to_string(),
                total: 0.0,
            });
            groups.len() - 1
        });
        groups[position].total += value.unwrap_or(0.0);
    }
    Ok(groups)
}

/// The `limit` groups with the largest totals, largest first. Equal totals
/// are ordered by key.
pub fn top_n_by_sum(
    dataset: &Dataset,
    key_column: &str,
    value_column: &str,
    limit: usize,
) -> Result<Vec<GroupTotal>, DatasetError> {
    let mut groups = sum_by_group(dataset, key_column, value_column)?;
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups.truncate(limit);
    Ok(groups)
}

pub fn sales_series(
    dataset: &Dataset,
    date_column: &str,
    amount_column: &str,
    ordering: SalesOrdering,
) -> Result<Vec<SalesPoint>, DatasetError> {
    let dates = dataset.text_column(date_column)?;
    let amounts = dataset.numeric_column(amount_column)?;

    let mut points: Vec<SalesPoint> = dates
        .into_iter()
        .zip(amounts)
        .filter_map(|(date, amount)| {
            date.map(|date| SalesPoint {
                date: date.to_string(),
                amount,
            })
        })
        .collect();

    if ordering == SalesOrdering::ByDate {
        let parsed: Option<Vec<NaiveDateTime>> =
            points.iter().map(|point| parse_date(&point.date)).collect();
        match parsed {
            Some(parsed) => {
                let mut keyed: Vec<(NaiveDateTime, SalesPoint)> =
                    parsed.into_iter().zip(points).collect();
                keyed.sort_by_key(|(when, _)| *when);
                points = keyed.into_iter().map(|(_, point)| point).collect();
            }
            None => points.sort_by(|a, b| a.date.cmp(&b.date)),
        }
    }

    Ok(points)
}

pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
#[path = "tests/aggregate_tests.rs"]
mod tests;
