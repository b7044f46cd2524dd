//! Bar and line chart widgets for section series.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::dashboard::{ChartKind, Series};
use super::theme::Theme;

const MIN_BAR_WIDTH: u16 = 3;
const MAX_BAR_WIDTH: u16 = 16;
const BAR_GAP: u16 = 1;

/// Chart widget for one section series
pub struct SeriesChart<'a> {
    series: &'a Series,
    color_index: usize,
    theme: &'a Theme,
}

impl<'a> SeriesChart<'a> {
    pub fn new(series: &'a Series, color_index: usize, theme: &'a Theme) -> Self {
        SeriesChart {
            series,
            color_index,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.series.value_column))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.caption_style());

        if self.series.points.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let message = Paragraph::new("No data available")
                .style(Style::default().add_modifier(Modifier::DIM))
                .alignment(Alignment::Center);
            frame.render_widget(message, inner);
            return;
        }

        match self.series.kind {
            ChartKind::Bar => self.render_bars(frame, area, block),
            ChartKind::Line => self.render_line(frame, area, block),
        }
    }

    fn render_bars(&self, frame: &mut Frame, area: Rect, block: Block) {
        let color = self.theme.chart_color(self.color_index);
        let inner_width = block.inner(area).width;
        let bar_width = bar_width(inner_width, self.series.points.len());

        // Bars are unsigned; negative values draw as empty bars
        let bars: Vec<Bar> = self
            .series
            .points
            .iter()
            .map(|(key, value)| {
                Bar::default()
                    .value(value.max(0.0).round() as u64)
                    .text_value(format_compact(*value))
                    .label(Line::from(key.clone()))
            })
            .collect();

        let chart = BarChart::default()
            .block(block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(BAR_GAP)
            .bar_style(Style::default().fg(color))
            .value_style(Style::default().fg(self.theme.fg).bg(color).add_modifier(Modifier::BOLD))
            .label_style(self.theme.normal_style());

        frame.render_widget(chart, area);
    }

    fn render_line(&self, frame: &mut Frame, area: Rect, block: Block) {
        let color = self.theme.chart_color(self.color_index);
        let points: Vec<(f64, f64)> = self
            .series
            .points
            .iter()
            .enumerate()
            .map(|(i, (_, value))| (i as f64, *value))
            .collect();

        let x_max = (points.len().saturating_sub(1)).max(1) as f64;
        let (mut y_min, mut y_max) = points
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
        if y_min >= y_max {
            y_max = y_min + 1.0;
        }

        // Add some padding to y-axis
        let y_range = y_max - y_min;
        y_min -= y_range * 0.05;
        y_max += y_range * 0.05;

        let keys = &self.series.points;
        let x_labels: Vec<Span> = [0, keys.len() / 2, keys.len() - 1]
            .iter()
            .map(|&i| Span::raw(keys[i].0.clone()))
            .collect();
        let y_labels = vec![
            Span::raw(format_value(y_min)),
            Span::raw(format_value((y_min + y_max) / 2.0)),
            Span::raw(format_value(y_max)),
        ];

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }
}

/// Widest bar that still fits every point in `width` columns
fn bar_width(width: u16, bars: usize) -> u16 {
    if bars == 0 {
        return MIN_BAR_WIDTH;
    }
    let per_bar = width / u16::try_from(bars).unwrap_or(u16::MAX);
    per_bar
        .saturating_sub(BAR_GAP)
        .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

/// Short bar annotation, e.g. `1.23M`
fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

/// Format a value for display on axis labels
fn format_value(value: f64) -> String {
    if value.abs() < 0.001 && value != 0.0 {
        format!("{:.2e}", value)
    } else if value.abs() >= 1e6 {
        format!("{:.2e}", value)
    } else if value.abs() >= 1.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.4}", value)
    }
}
