use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::fetcher::RawSeasonTable;

/// Canonical name of the leading metric column.
pub const METRIC_COLUMN: &str = "Metric";

/// Name of the station column in the final wide table.
pub const STATION_COLUMN: &str = "Station";

/// Canonical station columns, in source order. The source exports carry one
/// column per station after the metric column; headers are reassigned
/// positionally to this list.
pub const STATIONS: [&str; 7] = [
    "Milano Bicocca",
    "Milano Bocconi",
    "Milano Bovisa",
    "Milano Centro",
    "Milano Citta' Studi",
    "Milano San Siro",
    "Milano Sud",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    /// Name of the value column this season contributes to the long form.
    pub fn value_column(self) -> &'static str {
        match self {
            Season::Summer => "Summer_Value",
            Season::Winter => "Winter_Value",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Summer => write!(f, "summer"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReshapeError {
    #[error("Schema mismatch: expected {expected} columns (Metric plus 7 stations), got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },
    #[error("Duplicate (metric, station) pair in {season} data: ('{metric}', '{station}')")]
    DuplicateKey {
        season: Season,
        metric: String,
        station: String,
    },
}

/// One melted cell: a (metric, station) pair and its nullable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub metric: String,
    pub station: String,
    pub value: Option<f64>,
}

/// A seasonal table in long (melted) form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongTable {
    pub season: Season,
    pub records: Vec<LongRecord>,
}

/// Outer-join result: one row per (metric, station) pair present in either
/// season, with independently nullable seasonal values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub metric: String,
    pub station: String,
    pub summer_value: Option<f64>,
    pub winter_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideRow {
    pub station: String,
    pub values: Vec<Option<f64>>,
}

/// Final wide table: `Station` followed by one column per
/// (season value column, metric) combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Look up a cell by station and flattened column name.
    pub fn value(&self, station: &str, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        let row = self.rows.iter().find(|r| r.station == station)?;
        // Column 0 is the station itself.
        row.values.get(idx.checked_sub(1)?).copied().flatten()
    }
}

/// Checked counterpart of the positional header rename: the input must have
/// exactly one metric column plus one column per canonical station. Names
/// are assigned, not inferred, so only the count is validated.
pub fn assign_canonical_headers(table: &RawSeasonTable) -> Result<Vec<String>, ReshapeError> {
    let expected = 1 + STATIONS.len();
    if table.headers.len() != expected {
        return Err(ReshapeError::SchemaMismatch {
            expected,
            actual: table.headers.len(),
        });
    }
    for row in &table.rows {
        if row.values.len() != STATIONS.len() {
            return Err(ReshapeError::SchemaMismatch {
                expected,
                actual: 1 + row.values.len(),
            });
        }
    }

    let mut canonical = vec![METRIC_COLUMN.to_string()];
    canonical.extend(STATIONS.iter().map(|s| s.to_string()));
    Ok(canonical)
}

/// Unpivot a raw seasonal table: one long record per (metric, station) cell.
pub fn melt(table: &RawSeasonTable, season: Season) -> Result<LongTable, ReshapeError> {
    assign_canonical_headers(table)?;

    let mut records = Vec::with_capacity(table.rows.len() * STATIONS.len());
    for row in &table.rows {
        for (i, station) in STATIONS.iter().enumerate() {
            records.push(LongRecord {
                metric: row.metric.clone(),
                station: station.to_string(),
                value: row.values[i],
            });
        }
    }

    debug!(
        "Melted {} {} rows into {} long records",
        table.rows.len(),
        season,
        records.len()
    );
    Ok(LongTable { season, records })
}

/// Outer-join the two long tables on (metric, station). Every pair present
/// in either season appears exactly once; a duplicate pair within one season
/// is a hard error rather than silent aggregation.
pub fn merge(summer: &LongTable, winter: &LongTable) -> Result<Vec<MergedRecord>, ReshapeError> {
    let summer_index = index_season(summer)?;
    let winter_index = index_season(winter)?;

    let keys: BTreeSet<&(String, String)> =
        summer_index.keys().chain(winter_index.keys()).collect();

    let merged = keys
        .into_iter()
        .map(|key| MergedRecord {
            metric: key.0.clone(),
            station: key.1.clone(),
            summer_value: summer_index.get(key).copied().flatten(),
            winter_value: winter_index.get(key).copied().flatten(),
        })
        .collect();
    Ok(merged)
}

fn index_season(
    table: &LongTable,
) -> Result<BTreeMap<(String, String), Option<f64>>, ReshapeError> {
    let mut index = BTreeMap::new();
    for record in &table.records {
        let key = (record.metric.clone(), record.station.clone());
        if index.insert(key, record.value).is_some() {
            return Err(ReshapeError::DuplicateKey {
                season: table.season,
                metric: record.metric.clone(),
                station: record.station.clone(),
            });
        }
    }
    Ok(index)
}

/// Pivot the merged long table back to wide form: one row per station,
/// columns the cross product of the two seasonal value columns and every
/// distinct metric. Flattened names join the value column and the metric
/// with a single space. Stations and metrics are ordered lexicographically,
/// the summer block before the winter block.
pub fn pivot(merged: &[MergedRecord]) -> WideTable {
    let stations: BTreeSet<&str> = merged.iter().map(|r| r.station.as_str()).collect();
    let metrics: BTreeSet<&str> = merged.iter().map(|r| r.metric.as_str()).collect();

    let mut cells: BTreeMap<(&str, &str), (Option<f64>, Option<f64>)> = BTreeMap::new();
    for record in merged {
        cells.insert(
            (record.metric.as_str(), record.station.as_str()),
            (record.summer_value, record.winter_value),
        );
    }

    let mut columns = vec![STATION_COLUMN.to_string()];
    for season in [Season::Summer, Season::Winter] {
        for metric in &metrics {
            columns.push(format!("{} {}", season.value_column(), metric).trim().to_string());
        }
    }

    let rows = stations
        .iter()
        .map(|station| {
            let mut values = Vec::with_capacity(2 * metrics.len());
            for metric in &metrics {
                values.push(cells.get(&(*metric, *station)).and_then(|c| c.0));
            }
            for metric in &metrics {
                values.push(cells.get(&(*metric, *station)).and_then(|c| c.1));
            }
            WideRow {
                station: station.to_string(),
                values,
            }
        })
        .collect();

    WideTable { columns, rows }
}

/// Full reshape: melt both seasonal tables, outer-join them, pivot back to
/// wide form. Pure, so re-running on identical inputs yields an identical
/// table.
#[instrument(skip(summer_raw, winter_raw))]
pub fn transform(
    summer_raw: &RawSeasonTable,
    winter_raw: &RawSeasonTable,
) -> Result<WideTable, ReshapeError> {
    let summer = melt(summer_raw, Season::Summer)?;
    let winter = melt(winter_raw, Season::Winter)?;
    let merged = merge(&summer, &winter)?;
    let wide = pivot(&merged);

    debug!(
        "Transformed into wide table with {} rows and {} columns",
        wide.rows.len(),
        wide.columns.len()
    );
    Ok(wide)
}
