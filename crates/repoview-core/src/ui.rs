use crate::keybinds::InputMode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Render the bottom status bar showing the current mode, the repository
/// identity, and key hints.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    mode: InputMode,
    repo_label: &str,
    info: &str,
) {
    let mode_style = Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED);

    let line = Line::from(vec![
        Span::styled(format!(" {} ", mode.label()), mode_style),
        Span::raw(" "),
        Span::styled(repo_label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(info, Style::default().add_modifier(Modifier::DIM)),
    ]);

    let bar = Paragraph::new(line).style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_widget(bar, area);
}

/// Standard layout: main content + status bar (1 line).
/// Returns (content_area, status_area).
pub fn standard_layout(area: Rect) -> (Rect, Rect) {
    let [content_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    (content_area, status_area)
}

/// Create a standard bordered block for a panel.
pub fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::DIM))
}
