use super::theme;
use crate::report::{BarSeries, Chart, ChartData, HistogramBin};
use eframe::egui;
use egui_plot::{Bar, BarChart, Legend, Plot, VLine};

const BAR_THICKNESS: f64 = 0.7;

pub fn render_chart(ui: &mut egui::Ui, id: &str, chart: &Chart, height: f32) {
    ui.label(egui::RichText::new(&chart.title).strong());
    match &chart.data {
        ChartData::Bars {
            categories,
            series,
            stacked,
        } => render_bars(ui, id, chart, categories, series, *stacked, height),
        ChartData::Histogram { bins, reference } => {
            render_histogram(ui, id, chart, bins, *reference, height);
        }
    }
}

/// Vertical position of category `i`; the first category is drawn on top.
fn category_position(i: usize, count: usize) -> f64 {
    count.saturating_sub(i + 1) as f64
}

fn render_bars(
    ui: &mut egui::Ui,
    id: &str,
    chart: &Chart,
    categories: &[String],
    series: &[BarSeries],
    stacked: bool,
    height: f32,
) {
    if categories.is_empty() {
        ui.label("—");
        return;
    }

    let count = categories.len();
    let slot = if stacked || series.len() <= 1 {
        BAR_THICKNESS
    } else {
        BAR_THICKNESS / series.len() as f64
    };

    let mut charts: Vec<BarChart> = Vec::with_capacity(series.len());
    for (k, s) in series.iter().enumerate() {
        let offset = if stacked || series.len() <= 1 {
            0.0
        } else {
            (k as f64 - (series.len() - 1) as f64 / 2.0) * slot
        };
        let bars = categories
            .iter()
            .zip(&s.values)
            .enumerate()
            .map(|(i, (category, value))| {
                Bar::new(category_position(i, count) - offset, *value)
                    .width(slot)
                    .name(category)
            })
            .collect();

        let mut bar_chart = BarChart::new(s.name.clone(), bars)
            .horizontal()
            .color(theme::series_color(k));
        if stacked {
            let below: Vec<&BarChart> = charts.iter().collect();
            bar_chart = bar_chart.stack_on(&below);
        }
        charts.push(bar_chart);
    }

    let labels = categories.to_vec();
    let mut plot = Plot::new(format!("chart_{id}"))
        .height(height)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .show_grid([true, false])
        .y_axis_formatter(move |mark, _range| {
            let rounded = mark.value.round();
            if (mark.value - rounded).abs() > 1e-6 || rounded < 0.0 {
                return String::new();
            }
            let idx = count.saturating_sub(rounded as usize + 1);
            labels.get(idx).cloned().unwrap_or_default()
        });
    if let Some(label) = &chart.x_label {
        plot = plot.x_axis_label(label.clone());
    }
    if let Some(label) = &chart.y_label {
        plot = plot.y_axis_label(label.clone());
    }
    if chart.legend && series.len() > 1 {
        plot = plot.legend(Legend::default());
    }

    plot.show(ui, |plot_ui| {
        for bar_chart in charts {
            plot_ui.bar_chart(bar_chart);
        }
    });
}

fn render_histogram(
    ui: &mut egui::Ui,
    id: &str,
    chart: &Chart,
    bins: &[HistogramBin],
    reference: Option<f64>,
    height: f32,
) {
    if bins.is_empty() {
        ui.label("—");
        return;
    }

    let bars = bins
        .iter()
        .map(|bin| {
            Bar::new((bin.start + bin.end) / 2.0, bin.count as f64)
                .width(bin.end - bin.start)
                .stroke(egui::Stroke::new(0.5, theme::ACCENT_COLOR))
        })
        .collect();
    let histogram = BarChart::new("Histogram", bars)
        .color(theme::ACCENT_COLOR.linear_multiply(0.5))
        .element_formatter(Box::new(|bar, _| {
            format!("Value: {:.2}\nCount: {}", bar.argument, bar.value)
        }));

    let mut plot = Plot::new(format!("chart_{id}"))
        .height(height)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false);
    if let Some(label) = &chart.x_label {
        plot = plot.x_axis_label(label.clone());
    }
    if let Some(label) = &chart.y_label {
        plot = plot.y_axis_label(label.clone());
    }

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(histogram);
        if let Some(x) = reference {
            plot_ui.vline(
                VLine::new("Threshold", x)
                    .color(theme::REFERENCE_COLOR)
                    .width(1.5),
            );
        }
    });
}
