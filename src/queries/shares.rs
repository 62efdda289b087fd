//! Disclosure of shareholding percentages.

use super::QueryId;
use crate::error::Result;
use crate::report::chart::DEFAULT_HISTOGRAM_BINS;
use crate::report::{Chart, CountRow, CountTable, Report};
use crate::statements::columns::{SHARE_EXACT, SHARE_MAXIMUM, SHARE_MINIMUM};
use crate::statements::float_values;
use polars::prelude::*;

pub const SHARE_COLUMNS: [&str; 3] = [SHARE_EXACT, SHARE_MINIMUM, SHARE_MAXIMUM];

/// Derived column: `share_maximum - share_minimum`.
pub const SHARE_RANGE: &str = "max-min share";

const NON_MISSING: &str = "Number non-missing values";
const ENTRIES_AXIS_LABEL: &str = "Number of entries";

const STATISTICS: [&str; 4] = [
    "Most common value",
    "Number of unique values",
    "Minimum share",
    "Maximum share",
];

/// q141: how many interests give each kind of share value.
///
/// A share column the export does not have counts as empty.
///
/// # Errors
///
/// Fails if the table cannot be built.
pub fn share_value_coverage(ooci: &DataFrame) -> Result<Report> {
    let mut table = CountTable::new("", vec![NON_MISSING.to_owned()]);
    for name in SHARE_COLUMNS {
        let present = ooci
            .column(name)
            .map_or(0, |column| column.len() - column.null_count());
        table.rows.push(CountRow {
            label: name.to_owned(),
            counts: vec![present as u64],
        });
    }

    let chart = Chart::bars(QueryId::ShareCoverage.title(), &table, false)
        .with_x_label("Number of non-missing values")
        .with_legend(false);
    Ok(Report::new(
        QueryId::ShareCoverage,
        table.to_dataframe()?,
        vec![chart],
    ))
}

/// Summary of one share column over its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShareSummary {
    /// Most frequent value; the smallest of them on a tie
    pub mode: Option<f64>,
    pub unique: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ShareSummary {
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let mut sorted: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        sorted.sort_by(f64::total_cmp);

        let mut summary = Self {
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            ..Self::default()
        };

        let mut best_run = 0;
        let mut iter = sorted.iter().peekable();
        while let Some(&value) = iter.next() {
            let mut run = 1;
            while iter.next_if(|next| **next == value).is_some() {
                run += 1;
            }
            summary.unique += 1;
            if run > best_run {
                best_run = run;
                summary.mode = Some(value);
            }
        }
        summary
    }

    fn column(&self) -> [Option<f64>; 4] {
        [self.mode, Some(self.unique as f64), self.min, self.max]
    }
}

/// q142: most common value, distinct count, minimum and maximum of each
/// share column and of the share range, plus a histogram for each share
/// column that has values, marked at `threshold`.
///
/// # Errors
///
/// Fails if a share column cannot be read as numbers.
pub fn share_value_statistics(ooci: &DataFrame, threshold: f64) -> Result<Report> {
    let exact = float_values(ooci, SHARE_EXACT)?;
    let minimum = float_values(ooci, SHARE_MINIMUM)?;
    let maximum = float_values(ooci, SHARE_MAXIMUM)?;
    let range: Vec<Option<f64>> = minimum
        .iter()
        .zip(&maximum)
        .map(|(lo, hi)| Some((*hi)? - (*lo)?))
        .collect();

    let shares = [
        (SHARE_EXACT, exact, "Exact share (%)"),
        (SHARE_MINIMUM, minimum, "Minimum share (%)"),
        (SHARE_MAXIMUM, maximum, "Maximum share (%)"),
    ];

    let mut columns = vec![Column::from(Series::new(
        "statistic".into(),
        STATISTICS.to_vec(),
    ))];
    let mut charts = Vec::new();
    for (name, values, axis_label) in &shares {
        let summary = ShareSummary::from_values(values);
        columns.push(Column::from(Series::new(
            (*name).into(),
            summary.column().to_vec(),
        )));

        let finite: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if !finite.is_empty() {
            charts.push(
                Chart::histogram(*axis_label, &finite, DEFAULT_HISTOGRAM_BINS, Some(threshold))
                    .with_x_label(*axis_label)
                    .with_y_label(ENTRIES_AXIS_LABEL),
            );
        } else {
            tracing::debug!("No finite values in {name}, skipping histogram");
        }
    }
    columns.push(Column::from(Series::new(
        SHARE_RANGE.into(),
        ShareSummary::from_values(&range).column().to_vec(),
    )));

    Ok(Report::new(
        QueryId::ShareStatistics,
        DataFrame::new(columns)?,
        charts,
    ))
}
