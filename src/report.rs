//! Report values produced by the queries, and their rendering.

pub mod chart;
pub mod render;
pub mod table;

pub use chart::{BarSeries, Chart, ChartData, HistogramBin};
pub use table::{ALL, CountRow, CountTable, MISSING};

use crate::error::{BodsError, Result};
use crate::queries::QueryId;
use polars::prelude::*;

/// The output of one query: a summary table and the charts drawn from it.
///
/// The first column of `table` holds the row labels.
#[derive(Clone)]
pub struct Report {
    pub query: QueryId,
    pub table: DataFrame,
    pub charts: Vec<Chart>,
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Report")
            .field("query", &self.query)
            .field("shape", &self.table.shape())
            .field("charts", &self.charts.len())
            .finish()
    }
}

impl Report {
    pub fn new(query: QueryId, table: DataFrame, charts: Vec<Chart>) -> Self {
        Self {
            query,
            table,
            charts,
        }
    }

    pub fn title(&self) -> &'static str {
        self.query.title()
    }

    /// Labels of the table rows, in order.
    ///
    /// # Errors
    ///
    /// Fails if the table has no columns.
    pub fn row_labels(&self) -> Result<Vec<String>> {
        let labels = self.label_column()?.cast(&DataType::String)?;
        Ok(labels
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_owned())
            .collect())
    }

    /// Value in row `label`, column `column`; `None` for an unknown row or a null cell.
    ///
    /// # Errors
    ///
    /// Fails if `column` does not exist.
    pub fn value(&self, label: &str, column: &str) -> Result<Option<f64>> {
        let Some(idx) = self.row_labels()?.iter().position(|l| l == label) else {
            return Ok(None);
        };
        let cell = self
            .table
            .column(column)?
            .as_materialized_series()
            .get(idx)?;
        Ok(cell.extract::<f64>())
    }

    /// Like [`Report::value`] for count columns.
    ///
    /// # Errors
    ///
    /// Fails if `column` does not exist.
    pub fn count(&self, label: &str, column: &str) -> Result<Option<u64>> {
        Ok(self.value(label, column)?.map(|v| v as u64))
    }

    fn label_column(&self) -> Result<&Series> {
        self.table
            .get_columns()
            .first()
            .map(Column::as_materialized_series)
            .ok_or_else(|| BodsError::DataProcessing("report table has no columns".to_owned()))
    }
}
