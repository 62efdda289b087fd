//! Desktop viewer for a battery run.
//!
//! Reports are listed in a side panel; the selected one shows its table and
//! charts. Charts are drawn with `egui_plot` from the same [`Chart`] values
//! that are exported as Vega-Lite.
//!
//! [`Chart`]: crate::report::Chart

pub mod plots;
mod theme;

use crate::queries::BatteryOutcome;
use crate::report::render::fmt_number;
use crate::report::Report;
use eframe::egui;
use polars::prelude::AnyValue;

const CHART_HEIGHT: f32 = 260.0;

pub struct ViewerApp {
    outcome: BatteryOutcome,
    source: String,
    selected: usize,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, outcome: BatteryOutcome, source: String) -> Self {
        theme::apply_theme(&cc.egui_ctx);
        Self {
            outcome,
            source,
            selected: 0,
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Reports");
        ui.label(egui::RichText::new(&self.source).small().weak());
        ui.add_space(theme::SPACING_SMALL);

        for (i, report) in self.outcome.reports.iter().enumerate() {
            let text = format!("{}  {}", report.query.id(), report.title());
            ui.selectable_value(&mut self.selected, i, text);
        }

        if !self.outcome.skipped.is_empty() {
            ui.add_space(theme::SPACING_LARGE);
            ui.label(egui::RichText::new("Skipped").strong());
            for (query, reason) in &self.outcome.skipped {
                ui.label(
                    egui::RichText::new(format!("{}: {reason}", query.id()))
                        .small()
                        .color(egui::Color32::GRAY),
                );
            }
        }
    }

    fn render_report(ui: &mut egui::Ui, report: &Report) {
        ui.heading(format!("{}: {}", report.query.id(), report.title()));
        ui.add_space(theme::SPACING_SMALL);

        theme::card_frame(ui).show(ui, |ui| {
            render_table(ui, report);
        });

        for (n, chart) in report.charts.iter().enumerate() {
            ui.add_space(theme::SPACING_LARGE);
            let id = format!("{}_{n}", report.query.id());
            plots::render_chart(ui, &id, chart, CHART_HEIGHT);
        }
    }
}

fn render_table(ui: &mut egui::Ui, report: &Report) {
    let columns = report.table.get_columns();
    egui::Grid::new(format!("table_{}", report.query.id()))
        .striped(true)
        .num_columns(columns.len())
        .show(ui, |ui| {
            for column in columns {
                ui.label(egui::RichText::new(column.name().as_str()).strong());
            }
            ui.end_row();

            for row in 0..report.table.height() {
                for (i, column) in columns.iter().enumerate() {
                    let text = column
                        .as_materialized_series()
                        .get(row)
                        .map(|v| cell_text(&v))
                        .unwrap_or_default();
                    if i == 0 {
                        ui.label(text);
                    } else {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(text);
                        });
                    }
                }
                ui.end_row();
            }
        });
}

fn cell_text(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => "—".to_owned(),
        AnyValue::String(s) => (*s).to_owned(),
        AnyValue::Float64(x) => fmt_number(*x),
        other => other.to_string(),
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("report_list")
            .frame(theme::sidebar_frame())
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.render_sidebar(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                match self.outcome.reports.get(self.selected) {
                    Some(report) => Self::render_report(ui, report),
                    None => {
                        ui.label("No reports to show.");
                    }
                }
            });
        });
    }
}

/// Opens the viewer and blocks until the window is closed.
///
/// # Errors
///
/// Returns an error if the native window cannot be created.
pub fn run(outcome: BatteryOutcome, source: String) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title("bodsight"),
        ..Default::default()
    };
    eframe::run_native(
        "bodsight",
        options,
        Box::new(|cc| Ok(Box::new(ViewerApp::new(cc, outcome, source)))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {e}"))
}
