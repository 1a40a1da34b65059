use std::collections::BTreeMap;

use eframe::egui::{
    self, pos2, vec2, Align2, Color32, CornerRadius, FontId, Rect, RichText, ScrollArea, Sense, Ui,
};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, LineStyle, Plot, PlotPoints, Points,
};

use crate::analysis::{aggregate, stats};
use crate::color::{contrast_text, diverging_color, generate_palette, sequential_color};
use crate::data::filter::FilteredView;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 240.0;
const TREND_COLOR: Color32 = Color32::from_rgb(255, 87, 51);

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the full chart column. Every view is recomputed from the current
/// `FilteredView` on the spot and dropped after its chart is drawn.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a sales file to start  (File → Open…)");
            });
            return;
        }
    };

    let view = FilteredView::new(dataset, &state.visible_indices);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            kpi_row(ui, &view);

            section(ui, "Sales by Product Category");
            let by_category = aggregate::category_revenue(&view);
            let colors: Vec<Color32> = by_category
                .iter()
                .map(|(label, _)| {
                    state
                        .category_colors
                        .as_ref()
                        .map(|cm| cm.color_for(label))
                        .unwrap_or(Color32::LIGHT_BLUE)
                })
                .collect();
            bar_chart(ui, "category_revenue", &by_category, &colors);

            section(ui, "Ratings by Delivery Status");
            rating_boxes(ui, &view);

            section(ui, "Revenue by Payment Method");
            let by_payment = aggregate::payment_revenue(&view);
            bar_chart(
                ui,
                "payment_revenue",
                &by_payment,
                &generate_palette(by_payment.len()),
            );

            ui.strong("Average Rating by Payment Method");
            let avg_rating = aggregate::payment_avg_rating(&view);
            bar_chart(
                ui,
                "payment_avg_rating",
                &avg_rating,
                &generate_palette(avg_rating.len()),
            );

            section(ui, "Monthly Revenue Trend");
            let monthly = aggregate::monthly_revenue(&view);
            monthly_trend(ui, &monthly);

            ui.strong("Quarterly Revenue");
            let quarterly: Vec<(String, f64)> = aggregate::quarterly_revenue(&view)
                .into_iter()
                .map(|(q, v)| (format!("Q{q}"), v))
                .collect();
            bar_chart(
                ui,
                "quarterly_revenue",
                &quarterly,
                &generate_palette(quarterly.len()),
            );

            section(ui, "Correlation Heatmap");
            correlation_heatmap(ui, &view);

            section(ui, "Scatter Diagnostics");
            scatter_panels(ui, state, &view);

            section(ui, "State × Category Sales");
            pivot_heatmap(ui, &view);

            section(ui, "3-Month Forecast (Moving Average)");
            forecast_chart(ui, &monthly);

            section(ui, "Sales Anomaly Detection");
            anomaly_table(ui, &view);

            ui.add_space(24.0);
        });
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(16.0);
    ui.heading(title);
    ui.separator();
}

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, view: &FilteredView<'_>) {
    let k = aggregate::kpis(view);
    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Revenue (INR)", format_large(k.total_revenue));
        metric(&mut cols[1], "Avg Rating", format_ratio(k.avg_rating));
        metric(
            &mut cols[2],
            "Delivery Success Rate",
            format_percent(k.delivery_rate),
        );
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

/// Compact human formatting for large currency values: 1234567 → "1.23 M".
pub fn format_large(n: f64) -> String {
    let abs = n.abs();
    if abs >= 1e9 {
        format!("{:.2} B", n / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2} M", n / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2} K", n / 1e3)
    } else {
        format!("{n:.0}")
    }
}

fn format_ratio(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "–".to_string()
    }
}

fn format_percent(fraction: f64) -> String {
    if fraction.is_finite() {
        format!("{:.1}%", fraction * 100.0)
    } else {
        "–".to_string()
    }
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// A labelled bar chart; the colour legend is a wrapped strip below the plot
/// since the x axis is categorical.
fn bar_chart(ui: &mut Ui, id: &str, data: &[(String, f64)], colors: &[Color32]) {
    let bars: Vec<Bar> = data
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            Bar::new(i as f64, *value)
                .width(0.6)
                .name(label)
                .fill(colors.get(i).copied().unwrap_or(Color32::LIGHT_BLUE))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (i, (label, value)) in data.iter().enumerate() {
            let color = colors.get(i).copied().unwrap_or(Color32::LIGHT_BLUE);
            ui.colored_label(color, format!("■ {label} ({})", format_large(*value)));
        }
    });
}

// ---------------------------------------------------------------------------
// Ratings by delivery status (box chart)
// ---------------------------------------------------------------------------

fn rating_boxes(ui: &mut Ui, view: &FilteredView<'_>) {
    let groups = aggregate::rating_by_delivery(view);
    let palette = generate_palette(groups.len());

    let boxes: Vec<BoxElem> = groups
        .iter()
        .enumerate()
        .map(|(i, (status, s))| {
            BoxElem::new(i as f64, BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max))
                .name(status)
                .box_width(0.5)
                .fill(palette[i].gamma_multiply(0.4))
        })
        .collect();

    Plot::new("rating_by_delivery")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes));
        });
}

// ---------------------------------------------------------------------------
// Time trends
// ---------------------------------------------------------------------------

fn monthly_trend(ui: &mut Ui, monthly: &[(crate::data::model::Month, f64)]) {
    let points: Vec<[f64; 2]> = monthly
        .iter()
        .map(|(m, v)| [f64::from(m.number()), *v])
        .collect();

    Plot::new("monthly_revenue")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name("Revenue")
                    .color(TREND_COLOR)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(TREND_COLOR)
                    .radius(4.0),
            );
        });

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (m, v) in monthly {
            ui.label(format!("{m}: {}", format_large(*v)));
        }
    });
}

fn forecast_chart(ui: &mut Ui, monthly: &[(crate::data::model::Month, f64)]) {
    let rf = stats::rolling_forecast(monthly);
    if rf.trailing.is_empty() {
        ui.label("Not enough months in the current selection for a 3-month trailing mean.");
        return;
    }

    let trailing: Vec<[f64; 2]> = rf
        .trailing
        .iter()
        .map(|(m, v)| [f64::from(m.number()), *v])
        .collect();
    let last_x = trailing[trailing.len() - 1][0];
    let mut forecast: Vec<[f64; 2]> = vec![trailing[trailing.len() - 1]];
    forecast.extend(
        rf.forecast
            .iter()
            .enumerate()
            .map(|(i, v)| [last_x + (i + 1) as f64, *v]),
    );

    Plot::new("rolling_forecast")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(trailing))
                    .name("3-month trailing mean")
                    .color(TREND_COLOR)
                    .width(2.0),
            );
            plot_ui.line(
                Line::new(PlotPoints::from(forecast.clone()))
                    .name("Forecast (+2% / +4% / +6%)")
                    .color(Color32::LIGHT_GREEN)
                    .width(2.0)
                    .style(LineStyle::Dashed { length: 8.0 }),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(forecast))
                    .color(Color32::LIGHT_GREEN)
                    .radius(4.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Scatter diagnostics
// ---------------------------------------------------------------------------

fn scatter_panels(ui: &mut Ui, state: &AppState, view: &FilteredView<'_>) {
    for (pair_no, (x_col, y_col)) in stats::SCATTER_PAIRS.into_iter().enumerate() {
        ui.strong(format!("{} vs {}", x_col.label(), y_col.label()));

        let groups = stats::scatter_by_category(view, x_col, y_col);
        let mut all_points: Vec<[f64; 2]> = Vec::new();

        Plot::new(format!("scatter_{pair_no}"))
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (category, points) in &groups {
                    all_points.extend_from_slice(points);
                    let color = state
                        .category_colors
                        .as_ref()
                        .map(|cm| cm.color_for(category))
                        .unwrap_or(Color32::LIGHT_BLUE);
                    plot_ui.points(
                        Points::new(PlotPoints::from(points.clone()))
                            .name(category)
                            .color(color)
                            .radius(2.5),
                    );
                }

                if let Some(trend) = stats::ols_trendline(&all_points) {
                    let x_min = all_points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
                    let x_max = all_points
                        .iter()
                        .map(|p| p[0])
                        .fold(f64::NEG_INFINITY, f64::max);
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![
                            [x_min, trend.y_at(x_min)],
                            [x_max, trend.y_at(x_max)],
                        ]))
                        .name("OLS trend")
                        .color(Color32::WHITE)
                        .width(1.5),
                    );
                }
            });
        ui.add_space(8.0);
    }
}

// ---------------------------------------------------------------------------
// Heatmaps (painter-drawn; egui_plot has no image/matrix plot)
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, view: &FilteredView<'_>) {
    let m = stats::correlation_matrix(view);
    let labels: Vec<String> = m.columns.iter().map(|c| c.to_string()).collect();
    let values: Vec<Vec<f64>> = m.values.iter().map(|row| row.to_vec()).collect();
    heatmap(ui, &labels, &labels, &values, diverging_color, |v| {
        format!("{v:.2}")
    });
}

fn pivot_heatmap(ui: &mut Ui, view: &FilteredView<'_>) {
    let pivot = aggregate::state_category_pivot(view);
    if pivot.is_empty() {
        ui.label("No data in the current selection.");
        return;
    }
    let max = pivot.max_value().max(1.0);
    heatmap(
        ui,
        &pivot.states,
        &pivot.categories,
        &pivot.values,
        |v| sequential_color(v / max),
        format_large,
    );
}

/// Draw a labelled matrix of coloured cells. NaN cells are grey with a dash.
fn heatmap(
    ui: &mut Ui,
    row_labels: &[String],
    col_labels: &[String],
    values: &[Vec<f64>],
    cell_color: impl Fn(f64) -> Color32,
    cell_text: impl Fn(f64) -> String,
) {
    let label_w = 130.0_f32;
    let header_h = 22.0_f32;
    let cell_h = 28.0_f32;
    let n_cols = col_labels.len().max(1) as f32;
    let cell_w = ((ui.available_width() - label_w - 8.0) / n_cols).clamp(48.0, 150.0);

    let size = vec2(
        label_w + cell_w * n_cols,
        header_h + cell_h * row_labels.len() as f32,
    );
    let (rect, _response) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(11.0);

    for (j, col) in col_labels.iter().enumerate() {
        painter.text(
            pos2(
                rect.min.x + label_w + (j as f32 + 0.5) * cell_w,
                rect.min.y + header_h * 0.5,
            ),
            Align2::CENTER_CENTER,
            col,
            font.clone(),
            text_color,
        );
    }

    for (i, row) in row_labels.iter().enumerate() {
        let y = rect.min.y + header_h + (i as f32 + 0.5) * cell_h;
        painter.text(
            pos2(rect.min.x + label_w - 6.0, y),
            Align2::RIGHT_CENTER,
            row,
            font.clone(),
            text_color,
        );

        for j in 0..col_labels.len() {
            let v = values[i][j];
            let cell = Rect::from_min_size(
                pos2(
                    rect.min.x + label_w + j as f32 * cell_w + 1.0,
                    rect.min.y + header_h + i as f32 * cell_h + 1.0,
                ),
                vec2(cell_w - 2.0, cell_h - 2.0),
            );

            if v.is_nan() {
                painter.rect_filled(cell, CornerRadius::same(2), Color32::from_gray(60));
                painter.text(
                    cell.center(),
                    Align2::CENTER_CENTER,
                    "–",
                    font.clone(),
                    Color32::LIGHT_GRAY,
                );
            } else {
                let background = cell_color(v);
                painter.rect_filled(cell, CornerRadius::same(2), background);
                painter.text(
                    cell.center(),
                    Align2::CENTER_CENTER,
                    cell_text(v),
                    font.clone(),
                    contrast_text(background),
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Anomaly table
// ---------------------------------------------------------------------------

fn anomaly_table(ui: &mut Ui, view: &FilteredView<'_>) {
    let found = stats::anomalies(view);
    if found.is_empty() {
        ui.label("No anomalies detected (|z| > 2).");
        return;
    }

    let z_by_index: BTreeMap<usize, f64> = found
        .iter()
        .map(|a| (a.dataset_index, a.z_score))
        .collect();

    ui.label(format!("{} outliers with |z| > 2:", found.len()));
    egui::Grid::new("anomaly_grid")
        .striped(true)
        .min_col_width(90.0)
        .show(ui, |ui: &mut Ui| {
            for header in ["Date", "Category", "State", "Payment", "Sales (INR)", "z"] {
                ui.strong(header);
            }
            ui.end_row();

            for (index, r) in view.indexed_records() {
                let Some(z) = z_by_index.get(&index) else {
                    continue;
                };
                ui.label(r.date.to_string());
                ui.label(r.product_category.as_str());
                ui.label(r.state.as_str());
                ui.label(r.payment_method.as_str());
                ui.label(format!("{:.0}", r.total_sales_inr));
                ui.label(format!("{z:+.2}"));
                ui.end_row();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::format_large;

    #[test]
    fn large_numbers_are_abbreviated() {
        assert_eq!(format_large(950.0), "950");
        assert_eq!(format_large(1_500.0), "1.50 K");
        assert_eq!(format_large(2_340_000.0), "2.34 M");
        assert_eq!(format_large(7_100_000_000.0), "7.10 B");
    }
}
