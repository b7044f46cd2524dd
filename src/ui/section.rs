//! One dashboard section: a titled block holding its chart and table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders},
    Frame,
};

use crate::dashboard::Section;
use super::chart::SeriesChart;
use super::theme::Theme;
use super::widgets::DataTable;

/// Rows each section occupies on the page
pub const SECTION_HEIGHT: u16 = 20;

/// Smallest slice worth drawing a partially visible section into
pub const MIN_SECTION_HEIGHT: u16 = 8;

pub struct SectionView<'a> {
    section: &'a Section,
    index: usize,
    theme: &'a Theme,
}

impl<'a> SectionView<'a> {
    pub fn new(section: &'a Section, index: usize, theme: &'a Theme) -> Self {
        SectionView {
            section,
            index,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {}. {} ", self.index + 1, self.section.title))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(inner);

        let (chart_area, table_area) = if self.section.table_first {
            (chunks[1], chunks[0])
        } else {
            (chunks[0], chunks[1])
        };

        SeriesChart::new(&self.section.chart, self.index, self.theme).render(frame, chart_area);
        DataTable::new(&self.section.table, self.theme).render(frame, table_area);
    }
}

/// Lay sections out top to bottom starting at `first`, returning
/// `(section index, area)` for each one that fits
pub fn page_layout(area: Rect, sections: usize, first: usize) -> Vec<(usize, Rect)> {
    let mut placed = Vec::new();
    let mut y = area.y;
    let bottom = area.y + area.height;

    for index in first..sections {
        let remaining = bottom.saturating_sub(y);
        if remaining < MIN_SECTION_HEIGHT {
            break;
        }
        let height = remaining.min(SECTION_HEIGHT);
        placed.push((index, Rect::new(area.x, y, area.width, height)));
        y += height;
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_layout_fills_available_height() {
        let area = Rect::new(0, 10, 80, 45);
        let placed = page_layout(area, 5, 1);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0], (1, Rect::new(0, 10, 80, SECTION_HEIGHT)));
        assert_eq!(placed[1], (2, Rect::new(0, 30, 80, SECTION_HEIGHT)));
    }

    #[test]
    fn test_page_layout_partial_last_section() {
        let area = Rect::new(0, 0, 80, 30);
        let placed = page_layout(area, 5, 0);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].1.height, 10);
    }

    #[test]
    fn test_page_layout_past_end() {
        let area = Rect::new(0, 0, 80, 100);
        assert!(page_layout(area, 5, 5).is_empty());
        assert_eq!(page_layout(area, 5, 3).len(), 2);
    }
}
