//! UI widgets for the sales dashboard.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table as TableWidget, Wrap},
    Frame,
};

use crate::dashboard::sections::Metric;
use crate::data::{ColumnKind, Table, Value};
use crate::error::DashboardError;
use super::theme::Theme;

/// Five side-by-side metric cards
pub struct MetricCards<'a> {
    title: &'a str,
    metrics: &'a [Metric],
    theme: &'a Theme,
}

impl<'a> MetricCards<'a> {
    pub fn new(title: &'a str, metrics: &'a [Metric], theme: &'a Theme) -> Self {
        MetricCards {
            title,
            metrics,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.metrics.is_empty() {
            return;
        }

        let constraints = vec![Constraint::Ratio(1, self.metrics.len() as u32); self.metrics.len()];
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(inner);

        for (metric, column) in self.metrics.iter().zip(columns.iter()) {
            let card = Paragraph::new(Line::from(Span::styled(
                metric.value.clone(),
                self.theme.metric_style(),
            )))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(format!(" {} ", metric.label))
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.normal_style()),
            );
            frame.render_widget(card, *column);
        }
    }
}

/// Full result table, header row first
pub struct DataTable<'a> {
    table: &'a Table,
    theme: &'a Theme,
}

impl<'a> DataTable<'a> {
    pub fn new(table: &'a Table, theme: &'a Theme) -> Self {
        DataTable { table, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            self.table
                .columns
                .iter()
                .map(|c| Cell::from(c.name.clone())),
        )
        .style(self.theme.header_style());

        let rows: Vec<Row> = self
            .table
            .rows
            .iter()
            .map(|row| {
                Row::new(
                    row.iter()
                        .zip(&self.table.columns)
                        .map(|(value, column)| Cell::from(format_cell(value, column.kind))),
                )
            })
            .collect();

        let widths = vec![Constraint::Fill(1); self.table.columns.len().max(1)];
        let widget = TableWidget::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .style(self.theme.normal_style())
            .block(
                Block::default()
                    .title(format!(" {} rows ", self.table.len()))
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.caption_style()),
            );

        frame.render_widget(widget, area);
    }
}

/// Cell text for table display: floats keep two decimals, nulls stay visible
pub fn format_cell(value: &Value, kind: ColumnKind) -> String {
    match (value, kind) {
        (Value::Float(v), _) => format!("{v:.2}"),
        (Value::Int(v), ColumnKind::Float) => format!("{v}.00"),
        (Value::Null, _) => "None".to_string(),
        (other, _) => other.to_string(),
    }
}

/// Replaces the page when a render pass fails
pub struct ErrorPanel<'a> {
    error: &'a DashboardError,
    theme: &'a Theme,
}

impl<'a> ErrorPanel<'a> {
    pub fn new(error: &'a DashboardError, theme: &'a Theme) -> Self {
        ErrorPanel { error, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", self.error.class()),
                self.theme.error_style(),
            )),
            Line::from(""),
            Line::from(format!("  {}", self.error)),
            Line::from(""),
            Line::from(Span::styled(
                "  Press [r] to run the dashboard again or [q] to quit.",
                self.theme.caption_style(),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Dashboard failed to load ")
                    .borders(Borders::ALL)
                    .border_style(self.theme.error_style())
                    .title_style(self.theme.error_style()),
            );
        frame.render_widget(paragraph, area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    refreshed: Option<&'a str>,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(refreshed: Option<&'a str>, error: Option<&'a str>, theme: &'a Theme) -> Self {
        StatusBar {
            refreshed,
            error,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(e) = self.error {
            Line::from(Span::styled(format!("Error: {e}"), self.theme.error_style()))
        } else {
            let text = match self.refreshed {
                Some(at) => format!("sales-dashboard: refreshed {at} | [r] Refresh [h] Help [q] Quit"),
                None => "sales-dashboard | [r] Refresh [h] Help [q] Quit".to_string(),
            };
            Line::from(text)
        };

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));

        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Value::Float(1234.5), ColumnKind::Float), "1234.50");
        assert_eq!(format_cell(&Value::Int(7), ColumnKind::Float), "7.00");
        assert_eq!(format_cell(&Value::Int(2024), ColumnKind::Integer), "2024");
        assert_eq!(format_cell(&Value::Text("EMEA".into()), ColumnKind::Text), "EMEA");
        assert_eq!(format_cell(&Value::Null, ColumnKind::Float), "None");
    }
}
