//! Terminal User Interface components for sales-dashboard.

pub mod chart;
mod help;
pub mod section;
pub mod section_nav;
mod theme;
pub mod widgets;

pub use help::HelpOverlay;
pub use theme::Theme;
