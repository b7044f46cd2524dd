//! Section scroll state and the navigation bar that shows it.
//!
//! The chart sections form one page that scrolls a whole section at a time.
//! `top` is the section drawn first; number keys jump straight to a section.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::theme::Theme;

/// Which section is at the top of the scrolled page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub top: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, sections: usize) {
        if self.top + 1 < sections {
            self.top += 1;
        }
    }

    pub fn prev(&mut self) {
        self.top = self.top.saturating_sub(1);
    }

    pub fn first(&mut self) {
        self.top = 0;
    }

    pub fn last(&mut self, sections: usize) {
        self.top = sections.saturating_sub(1);
    }

    /// Jump to a section (0-indexed); out-of-range targets are ignored
    pub fn jump(&mut self, index: usize, sections: usize) {
        if index < sections {
            self.top = index;
        }
    }

    /// Keep `top` valid after the number of sections changes
    pub fn clamp(&mut self, sections: usize) {
        if self.top >= sections {
            self.top = sections.saturating_sub(1);
        }
    }
}

/// One-line bar listing the sections, highlighting the one at the top
pub struct SectionNav<'a> {
    titles: &'a [&'a str],
    state: ScrollState,
    theme: &'a Theme,
}

impl<'a> SectionNav<'a> {
    pub fn new(titles: &'a [&'a str], state: ScrollState, theme: &'a Theme) -> Self {
        SectionNav {
            titles,
            state,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let spans: Vec<Span> = self
            .titles
            .iter()
            .enumerate()
            .flat_map(|(i, title)| {
                let style = if i == self.state.top {
                    self.theme.highlight_style()
                } else {
                    self.theme.normal_style()
                };
                vec![
                    Span::styled(format!("[{}] ", i + 1), self.theme.caption_style()),
                    Span::styled(title.to_string(), style),
                    Span::raw("  "),
                ]
            })
            .collect();

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_stops_at_last_section() {
        let mut state = ScrollState::new();
        for _ in 0..10 {
            state.next(5);
        }
        assert_eq!(state.top, 4);
    }

    #[test]
    fn test_prev_stops_at_first_section() {
        let mut state = ScrollState { top: 1 };
        state.prev();
        state.prev();
        assert_eq!(state.top, 0);
    }

    #[test]
    fn test_jump_ignores_out_of_range() {
        let mut state = ScrollState::new();
        state.jump(3, 5);
        assert_eq!(state.top, 3);
        state.jump(7, 5);
        assert_eq!(state.top, 3);
    }

    #[test]
    fn test_first_last_and_clamp() {
        let mut state = ScrollState::new();
        state.last(5);
        assert_eq!(state.top, 4);
        state.clamp(2);
        assert_eq!(state.top, 1);
        state.first();
        assert_eq!(state.top, 0);
        state.clamp(0);
        assert_eq!(state.top, 0);
    }
}
