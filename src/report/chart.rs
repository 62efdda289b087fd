use super::table::CountTable;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Bins used for share histograms when none are given.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// A chart accompanying a report table.
///
/// Bar charts are horizontal: categories run down the vertical axis and
/// `x_label` names the value axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub legend: bool,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Bars {
        categories: Vec<String>,
        series: Vec<BarSeries>,
        stacked: bool,
    },
    Histogram {
        bins: Vec<HistogramBin>,
        /// Vertical reference line, e.g. a disclosure threshold
        reference: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

impl Chart {
    /// One bar per row of `table`, one series per column.
    pub fn bars(title: impl Into<String>, table: &CountTable, stacked: bool) -> Self {
        let series = table
            .columns
            .iter()
            .map(|column| BarSeries {
                name: column.clone(),
                values: table
                    .column_values(column)
                    .into_iter()
                    .map(|n| n as f64)
                    .collect(),
            })
            .collect();
        Self {
            title: title.into(),
            x_label: None,
            y_label: None,
            legend: true,
            data: ChartData::Bars {
                categories: table.rows.iter().map(|r| r.label.clone()).collect(),
                series,
                stacked,
            },
        }
    }

    pub fn histogram(
        title: impl Into<String>,
        values: &[f64],
        bins: usize,
        reference: Option<f64>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: None,
            y_label: None,
            legend: false,
            data: ChartData::Histogram {
                bins: histogram_bins(values, bins),
                reference,
            },
        }
    }

    #[must_use]
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    /// The chart as a Vega-Lite v5 specification.
    pub fn to_vega_lite(&self) -> Value {
        match &self.data {
            ChartData::Bars {
                categories,
                series,
                stacked,
            } => self.bars_spec(categories, series, *stacked),
            ChartData::Histogram { bins, reference } => self.histogram_spec(bins, *reference),
        }
    }

    fn bars_spec(&self, categories: &[String], series: &[BarSeries], stacked: bool) -> Value {
        let mut values = Vec::new();
        for s in series {
            for (category, value) in categories.iter().zip(&s.values) {
                values.push(json!({
                    "category": category,
                    "series": s.name,
                    "value": value,
                }));
            }
        }

        let mut encoding = json!({
            "y": {
                "field": "category",
                "type": "nominal",
                "sort": categories,
                "title": self.y_label,
            },
            "x": {
                "field": "value",
                "type": "quantitative",
                "title": self.x_label,
                "stack": if stacked { json!("zero") } else { Value::Null },
            },
            "color": {
                "field": "series",
                "type": "nominal",
                "legend": if self.legend { json!({}) } else { Value::Null },
            },
        });
        if !stacked && series.len() > 1
            && let Some(map) = encoding.as_object_mut()
        {
            map.insert("yOffset".to_owned(), json!({ "field": "series" }));
        }

        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": self.title,
            "data": { "values": values },
            "mark": "bar",
            "encoding": encoding,
        })
    }

    fn histogram_spec(&self, bins: &[HistogramBin], reference: Option<f64>) -> Value {
        let mut layers = vec![json!({
            "data": { "values": bins },
            "mark": "bar",
            "encoding": {
                "x": {
                    "field": "start",
                    "type": "quantitative",
                    "bin": "binned",
                    "title": self.x_label,
                },
                "x2": { "field": "end" },
                "y": {
                    "field": "count",
                    "type": "quantitative",
                    "title": self.y_label,
                },
            },
        })];
        if let Some(x) = reference {
            layers.push(json!({
                "data": { "values": [{ "reference": x }] },
                "mark": { "type": "rule", "color": "firebrick" },
                "encoding": { "x": { "field": "reference", "type": "quantitative" } },
            }));
        }

        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": self.title,
            "layer": layers,
        })
    }
}

/// Equal-width bins spanning the finite values.
///
/// A constant series is binned over `value - 0.5 ..= value + 0.5`. Every bin
/// is half-open except the last, which also takes the maximum.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(min), Some(max)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };

    let bins = bins.max(1);
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0_u64; bins];
    for v in finite {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        if let Some(c) = counts.get_mut(idx) {
            *c += 1;
        }
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}
