//! Weekly figure assembly: one trace per (week, weekday) pair with data,
//! a dropdown selector per week, and the fixed styling of the feed's chart.

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use plotly::common::{Anchor, DashType, Font, Line, Marker, Mode, Orientation, Title, Visible};
use plotly::layout::update_menu::{Button, ButtonMethod, UpdateMenu, UpdateMenuDirection};
use plotly::layout::{Annotation, Axis, HoverMode, Legend, Shape, ShapeLine, ShapeType};
use plotly::{Layout, Plot, Scatter};
use serde_json::json;

use crate::data::{reference_monday, week_starts, weekday_rank, Sample};

pub const DAY_NAMES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// One color per weekday index.
pub const DAY_COLORS: [&str; 7] = [
    "#4C9BE8", "#E8774C", "#E8D44C", "#A04CE8", "#E84C8B", "#4CE8D4", "#E8A84C",
];

const Y_MAX: f64 = 400.0;
/// Height of the dashed reference line, labelled as 30% of capacity.
const CAPACITY_LINE_Y: f64 = 120.0;
const X_TICK_MS: f64 = 15.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub x: NaiveDateTime,
    pub personas: i64,
    pub porcentaje: i64,
}

/// One chart series: a single weekday inside a single week.
#[derive(Debug, Clone)]
pub struct TraceSpec {
    pub week_idx: usize,
    pub weekday: u32,
    pub points: Vec<Point>,
    pub visible: bool,
}

/// Everything the figure is built from, in final trace order.
#[derive(Debug, Clone)]
pub struct ChartPlan {
    pub weeks: Vec<NaiveDate>,
    pub traces: Vec<TraceSpec>,
}

/// One dropdown entry: a week and the visibility mask it applies.
#[derive(Debug, Clone)]
pub struct SelectorEntry {
    pub week: NaiveDate,
    pub label: String,
    pub visibility: Vec<bool>,
}

pub fn week_title(week: NaiveDate) -> String {
    format!("Aforo Dreamfit Aluche — Semana del {}", week.format("%d/%m/%Y"))
}

/// Lay out the traces: weeks ascending, weekdays in ranking order inside
/// each week, skipping empty (week, weekday) pairs. Only the most recent
/// week starts visible.
pub fn plan(samples: &[Sample]) -> Result<ChartPlan> {
    if samples.is_empty() {
        return Err(anyhow!("csv contained no data rows"));
    }

    let weeks = week_starts(samples);
    let rank = weekday_rank(samples);

    let mut traces = Vec::new();
    for (week_idx, week) in weeks.iter().enumerate() {
        let newest = week_idx == weeks.len() - 1;
        for &weekday in &rank {
            let day = *week + Duration::days(weekday as i64);
            let points: Vec<Point> = samples
                .iter()
                .filter(|s| s.hora.date() == day)
                .map(|s| Point {
                    x: s.normalized_time(),
                    personas: s.personas,
                    porcentaje: s.porcentaje,
                })
                .collect();
            if points.is_empty() {
                continue;
            }
            traces.push(TraceSpec {
                week_idx,
                weekday,
                points,
                visible: newest,
            });
        }
    }

    Ok(ChartPlan { weeks, traces })
}

/// Dropdown entries, most recent week first.
pub fn selector_entries(plan: &ChartPlan) -> Vec<SelectorEntry> {
    plan.weeks
        .iter()
        .enumerate()
        .rev()
        .map(|(week_idx, week)| {
            let visibility: Vec<bool> = plan
                .traces
                .iter()
                .map(|t| t.week_idx == week_idx)
                .collect();
            SelectorEntry {
                week: *week,
                label: format!("Semana {}", week.format("%d/%m/%Y")),
                visibility,
            }
        })
        .collect()
}

pub fn build_plot(plan: &ChartPlan) -> Plot {
    let mut plot = Plot::new();

    for spec in &plan.traces {
        let day = spec.weekday as usize;
        let x: Vec<String> = spec
            .points
            .iter()
            .map(|p| p.x.format("%Y-%m-%d %H:%M:%S").to_string())
            .collect();
        let y: Vec<i64> = spec.points.iter().map(|p| p.personas).collect();
        let pct: Vec<i64> = spec.points.iter().map(|p| p.porcentaje).collect();

        let trace = Scatter::new(x, y)
            .mode(Mode::LinesMarkers)
            .name(DAY_NAMES[day])
            .visible(if spec.visible {
                Visible::True
            } else {
                Visible::False
            })
            .show_legend(spec.visible)
            .line(Line::new().color(DAY_COLORS[day]).width(2.0))
            .marker(Marker::new().size(4))
            .custom_data(pct)
            .hover_template(format!(
                "%{{x|%H:%M}} — %{{y}} personas (%{{customdata}}%)<extra>{}</extra>",
                DAY_NAMES[day]
            ));
        plot.add_trace(trace);
    }

    plot.set_layout(layout(plan));
    plot
}

fn buttons(plan: &ChartPlan) -> Vec<Button> {
    selector_entries(plan)
        .into_iter()
        .map(|entry| {
            Button::new()
                .label(&entry.label)
                .method(ButtonMethod::Update)
                .args(json!([
                    {
                        "visible": entry.visibility,
                        "showlegend": entry.visibility,
                    },
                    {
                        "title": { "text": week_title(entry.week) },
                    }
                ]))
        })
        .collect()
}

fn layout(plan: &ChartPlan) -> Layout {
    let x_lo = axis_mark(5, 30);
    let x_hi = axis_mark(23, 30);

    // weeks is non-empty by construction of the plan.
    let newest = plan.weeks[plan.weeks.len() - 1];

    Layout::new()
        .title(Title::with_text(week_title(newest)).font(Font::new().size(16)))
        .x_axis(
            Axis::new()
                .tick_format("%H:%M")
                .dtick(X_TICK_MS)
                .range(vec![x_lo.clone(), x_hi.clone()])
                .tick_angle(45.0)
                .title(Title::with_text("Hora"))
                .show_grid(true)
                .grid_color("#eeeeee"),
        )
        .y_axis(
            Axis::new()
                .range(vec![0.0, Y_MAX])
                .title(Title::with_text("Personas"))
                .show_grid(true)
                .grid_color("#eeeeee"),
        )
        .legend(
            Legend::new()
                .orientation(Orientation::Horizontal)
                .y_anchor(Anchor::Bottom)
                .y(1.02)
                .x_anchor(Anchor::Left)
                .x(0.0),
        )
        .hover_mode(HoverMode::XUnified)
        .plot_background_color("white")
        .paper_background_color("white")
        .update_menus(vec![UpdateMenu::new()
            .active(0)
            .buttons(buttons(plan))
            .direction(UpdateMenuDirection::Down)
            .x(1.0)
            .x_anchor(Anchor::Right)
            .y(1.15)
            .y_anchor(Anchor::Top)
            .show_active(true)
            .background_color("white")
            .border_color("#cccccc")])
        .shapes(vec![Shape::new()
            .shape_type(ShapeType::Line)
            .x0(x_lo.as_str())
            .x1(x_hi.as_str())
            .y0(CAPACITY_LINE_Y)
            .y1(CAPACITY_LINE_Y)
            .line(ShapeLine::new().color("green").width(1.5).dash(DashType::Dash))])
        .annotations(vec![Annotation::new()
            .x(x_lo.as_str())
            .y(CAPACITY_LINE_Y)
            .text("30%")
            .show_arrow(false)
            .y_shift(10.0)
            .font(Font::new().color("green").size(12))])
}

fn axis_mark(hour: u32, minute: u32) -> String {
    reference_monday()
        .and_hms_opt(hour, minute, 0)
        .expect("fixed axis bound")
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
