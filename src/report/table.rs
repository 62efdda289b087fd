//! Labelled count tables.
//!
//! Every counting query reduces to a [`CountTable`]: rows keyed by a category
//! label, one or more count columns. The operations here are the handful the
//! queries combine: frequency counts, crosstabs with margins, reindexing onto
//! a codelist, total rows and sorting.

use crate::error::Result;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Label used for null values.
pub const MISSING: &str = "Missing";
/// Label of total rows and columns.
pub const ALL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub label: String,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable {
    /// Name of the label column in the exported frame
    pub index_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<CountRow>,
}

impl CountTable {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Frequency of each value, most frequent first (ties by label).
    ///
    /// With `missing` set, nulls are counted under that label; otherwise they
    /// are dropped.
    pub fn value_counts<I, S>(column: impl Into<String>, values: I, missing: Option<&str>) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for value in values {
            let label = match (&value, missing) {
                (Some(v), _) => v.as_ref().to_owned(),
                (None, Some(m)) => m.to_owned(),
                (None, None) => continue,
            };
            *counts.entry(label).or_insert(0) += 1;
        }

        let mut rows: Vec<CountRow> = counts
            .into_iter()
            .map(|(label, n)| CountRow {
                label,
                counts: vec![n],
            })
            .collect();
        rows.sort_by(|a, b| b.counts.cmp(&a.counts).then_with(|| a.label.cmp(&b.label)));

        let column = column.into();
        Self {
            index_name: String::new(),
            columns: vec![column],
            rows,
        }
    }

    /// Counts of each (row, column) pair. Labels are sorted; with `margins`
    /// an [`ALL`] column of row totals and an [`ALL`] row of column totals are
    /// appended.
    pub fn crosstab<I>(index_name: impl Into<String>, pairs: I, margins: bool) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut cells: HashMap<(String, String), u64> = HashMap::new();
        let mut row_labels = BTreeSet::new();
        let mut column_labels = BTreeSet::new();
        for (row, column) in pairs {
            row_labels.insert(row.clone());
            column_labels.insert(column.clone());
            *cells.entry((row, column)).or_insert(0) += 1;
        }

        let mut columns: Vec<String> = column_labels.into_iter().collect();
        let mut rows: Vec<CountRow> = row_labels
            .into_iter()
            .map(|label| {
                let counts = columns
                    .iter()
                    .map(|c| {
                        cells
                            .get(&(label.clone(), c.clone()))
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect();
                CountRow { label, counts }
            })
            .collect();

        if margins {
            for row in &mut rows {
                let total = row.counts.iter().sum();
                row.counts.push(total);
            }
            columns.push(ALL.to_owned());
        }

        let mut table = Self {
            index_name: index_name.into(),
            columns,
            rows,
        };
        if margins {
            table.push_total(ALL);
        }
        table
    }

    /// Keeps exactly `labels`, in that order; labels never observed get zero
    /// counts and observed rows outside `labels` are dropped.
    #[must_use]
    pub fn reindex<S: AsRef<str>>(self, labels: &[S]) -> Self {
        let width = self.columns.len();
        let mut by_label: HashMap<String, Vec<u64>> = HashMap::new();
        for row in self.rows {
            let entry = by_label.entry(row.label).or_insert_with(|| vec![0; width]);
            for (acc, n) in entry.iter_mut().zip(row.counts) {
                *acc += n;
            }
        }

        let rows = labels
            .iter()
            .map(|label| {
                let label = label.as_ref().to_owned();
                let counts = by_label
                    .get(&label)
                    .cloned()
                    .unwrap_or_else(|| vec![0; width]);
                CountRow { label, counts }
            })
            .collect();

        Self {
            index_name: self.index_name,
            columns: self.columns,
            rows,
        }
    }

    /// Appends a row holding the sum of every column.
    pub fn push_total(&mut self, label: &str) {
        let mut totals = vec![0; self.columns.len()];
        for row in &self.rows {
            for (acc, n) in totals.iter_mut().zip(&row.counts) {
                *acc += n;
            }
        }
        self.rows.push(CountRow {
            label: label.to_owned(),
            counts: totals,
        });
    }

    /// Stable sort on `column`, largest first. Unknown columns leave the order alone.
    pub fn sort_desc(&mut self, column: &str) {
        if let Some(idx) = self.column_index(column) {
            self.rows.sort_by(|a, b| {
                let a = a.counts.get(idx).copied().unwrap_or(0);
                let b = b.counts.get(idx).copied().unwrap_or(0);
                b.cmp(&a)
            });
        }
    }

    #[must_use]
    pub fn without_row(&self, label: &str) -> Self {
        Self {
            index_name: self.index_name.clone(),
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.label != label)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn without_column(&self, column: &str) -> Self {
        let Some(idx) = self.column_index(column) else {
            return self.clone();
        };
        let keep = |i: usize| i != idx;
        Self {
            index_name: self.index_name.clone(),
            columns: self
                .columns
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, c)| c.clone())
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|r| CountRow {
                    label: r.label.clone(),
                    counts: r
                        .counts
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| keep(*i))
                        .map(|(_, n)| *n)
                        .collect(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        Self {
            index_name: self.index_name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn get(&self, label: &str, column: &str) -> Option<u64> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.counts.get(idx).copied())
    }

    /// Values of one column in row order.
    pub fn column_values(&self, column: &str) -> Vec<u64> {
        self.column_index(column)
            .map(|idx| {
                self.rows
                    .iter()
                    .map(|r| r.counts.get(idx).copied().unwrap_or(0))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The table as a frame: a label column followed by one `UInt64` column
    /// per count column.
    ///
    /// # Errors
    ///
    /// Fails if two columns share a name.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let index_name = if self.index_name.is_empty() {
            "category"
        } else {
            self.index_name.as_str()
        };
        let labels: Vec<&str> = self.labels();
        let mut frame_columns = vec![Column::from(Series::new(index_name.into(), labels))];
        for (idx, name) in self.columns.iter().enumerate() {
            let values: Vec<u64> = self
                .rows
                .iter()
                .map(|r| r.counts.get(idx).copied().unwrap_or(0))
                .collect();
            frame_columns.push(Column::from(Series::new(name.as_str().into(), values)));
        }
        Ok(DataFrame::new(frame_columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
            .collect()
    }

    #[test]
    fn test_value_counts_with_missing() {
        let values = vec![Some("b"), Some("a"), None, Some("b"), None, None];
        let table = CountTable::value_counts("flag", values, Some(MISSING));
        assert_eq!(table.labels(), vec![MISSING, "b", "a"]);
        assert_eq!(table.get(MISSING, "flag"), Some(3));
        assert_eq!(table.get("a", "flag"), Some(1));
    }

    #[test]
    fn test_value_counts_drops_nulls_and_breaks_ties_by_label() {
        let values = vec![Some("z"), Some("y"), None];
        let table = CountTable::value_counts("t", values, None);
        assert_eq!(table.labels(), vec!["y", "z"]);
    }

    #[test]
    fn test_crosstab_margins() {
        let table = CountTable::crosstab(
            "type",
            pairs(&[
                ("shareholding", "True"),
                ("shareholding", "False"),
                ("shareholding", "True"),
                ("voting-rights", "True"),
                (MISSING, MISSING),
            ]),
            true,
        );
        assert_eq!(table.columns, vec!["False", MISSING, "True", ALL]);
        assert_eq!(table.labels(), vec![MISSING, "shareholding", "voting-rights", ALL]);
        assert_eq!(table.get("shareholding", "True"), Some(2));
        assert_eq!(table.get("shareholding", ALL), Some(3));
        assert_eq!(table.get(ALL, "True"), Some(3));
        assert_eq!(table.get(ALL, ALL), Some(5));
    }

    #[test]
    fn test_reindex_fills_and_drops() {
        let table = CountTable::value_counts(
            "level",
            vec![Some("direct"), Some("direct"), Some("bogus")],
            None,
        )
        .reindex(&["direct", "indirect", "unknown"]);
        assert_eq!(table.labels(), vec!["direct", "indirect", "unknown"]);
        assert_eq!(table.column_values("level"), vec![2, 0, 0]);
    }

    #[test]
    fn test_reindex_merges_duplicate_labels() {
        let mut table = CountTable::new("owner", vec!["n".to_owned()]);
        table.rows.push(CountRow {
            label: "state".to_owned(),
            counts: vec![2],
        });
        table.rows.push(CountRow {
            label: "state".to_owned(),
            counts: vec![3],
        });
        let table = table.reindex(&["state"]);
        assert_eq!(table.get("state", "n"), Some(5));
    }

    #[test]
    fn test_total_then_sort_puts_total_first() {
        let mut table =
            CountTable::value_counts("n", vec![Some("a"), Some("b"), Some("b")], None)
                .reindex(&["a", "b", "c"]);
        table.push_total(ALL);
        table.sort_desc("n");
        assert_eq!(table.labels(), vec![ALL, "b", "a", "c"]);
        assert_eq!(table.get(ALL, "n"), Some(3));
    }

    #[test]
    fn test_without_row_and_column() {
        let table = CountTable::crosstab("t", pairs(&[("a", "x"), ("b", "y")]), true);
        let trimmed = table.without_row(ALL).without_column(ALL);
        assert_eq!(trimmed.columns, vec!["x", "y"]);
        assert_eq!(trimmed.labels(), vec!["a", "b"]);
        assert_eq!(trimmed.get("b", "y"), Some(1));
        assert_eq!(trimmed.head(1).labels(), vec!["a"]);
    }

    #[test]
    fn test_to_dataframe() -> Result<()> {
        let mut table = CountTable::value_counts("Name", vec![Some("Present")], None);
        table.index_name = "entity".to_owned();
        let df = table.to_dataframe()?;
        assert_eq!(df.get_column_names_str(), vec!["entity", "Name"]);
        assert_eq!(df.height(), 1);
        Ok(())
    }
}
