use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use repoview_core::{keybinds::InputMode, tree::FlatRow, ui as core_ui};
use repoview_github::preview::{PreviewContent, PreviewData, format_size};

use crate::app::{App, PreviewState};

/// Fixed sidebar width in characters.
pub const SIDEBAR_WIDTH: u16 = 40;

const GUIDE_STYLE: Style = Style::new().fg(Color::DarkGray);
const SELECTED_BG: Color = Color::Gray;
const ERROR_STYLE: Style = Style::new().fg(Color::Red);

/// Render the entire application.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let (content_area, status_area) = core_ui::standard_layout(area);

    let sidebar_width = SIDEBAR_WIDTH.min(content_area.width.saturating_sub(10));
    let sidebar_area = Rect {
        width: sidebar_width,
        ..content_area
    };
    let preview_area = Rect {
        x: content_area.x + sidebar_width,
        width: content_area.width.saturating_sub(sidebar_width),
        ..content_area
    };

    render_sidebar(frame, sidebar_area, app);
    render_preview(frame, preview_area, app);

    let info = match app.mode {
        InputMode::Search => "Esc: clear  Enter: keep filter",
        InputMode::Normal => "Enter: open  /: search  ?: help  q: quit",
    };
    core_ui::render_status_bar(frame, status_area, app.mode, &app.locator.label(), info);

    // Overlay, rendered last
    app.help.render(frame, area);
}

// ── Sidebar ──────────────────────────────────────────────────────────

fn render_sidebar(frame: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Repository ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let [search_area, tree_area, stats_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    app.tree_viewport_lines = tree_area.height as usize;

    render_search_line(frame, search_area, app);
    render_tree(frame, tree_area, app);
    render_stats_line(frame, stats_area, app);
}

fn render_search_line(frame: &mut Frame, area: Rect, app: &App) {
    let prompt_style = if app.mode == InputMode::Search {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let query_span = if app.search_query.is_empty() && app.mode != InputMode::Search {
        Span::styled("search...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.search_query.clone())
    };

    let line = Line::from(vec![Span::styled("/ ", prompt_style), query_span]);
    frame.render_widget(Paragraph::new(line), area);

    if app.mode == InputMode::Search {
        let cursor_x = area.x + 2 + cursor_column(&app.search_query, app.search_cursor);
        if cursor_x < area.x + area.width {
            frame.set_cursor_position((cursor_x, area.y));
        }
    }
}

/// Terminal column of the cursor within the query. `byte_cursor` is a byte
/// offset on a char boundary; the column is the display width of everything
/// before it, which differs from the byte count for multibyte input.
fn cursor_column(query: &str, byte_cursor: usize) -> u16 {
    query[..byte_cursor.min(query.len())].width() as u16
}

fn render_tree(frame: &mut Frame, area: Rect, app: &App) {
    let Some(tree) = &app.tree else {
        // No tree yet: either still loading or the listing fetch failed.
        if let Some(error) = &app.listing_error {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Error loading repository contents:",
                    ERROR_STYLE.add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(error.clone(), ERROR_STYLE)),
            ];
            frame.render_widget(Paragraph::new(lines), area);
        } else {
            let text = format!("{} Loading repository contents...", app.spinner_char());
            let widget = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
            frame.render_widget(widget, area);
        }
        return;
    };

    if tree.flat_view.is_empty() {
        let message = if tree.filter_active() {
            "  No matches."
        } else {
            "  Empty repository."
        };
        let widget = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(widget, area);
        return;
    }

    let visible_lines = area.height as usize;
    let scroll_offset = if tree.selected >= visible_lines {
        tree.selected - visible_lines + 1
    } else {
        0
    };

    let mut lines: Vec<Line> = Vec::new();
    for (idx, row) in tree
        .flat_view
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_lines)
    {
        lines.push(render_tree_row(row, idx == tree.selected, area.width));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_tree_row(row: &FlatRow, is_selected: bool, area_width: u16) -> Line<'static> {
    let base_style = if is_selected {
        Style::default()
            .bg(SELECTED_BG)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else if row.is_match {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if row.is_folder {
        Style::default().fg(Color::Blue)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans: Vec<Span<'static>> = Vec::new();

    for d in 0..row.depth {
        let has_guide = row.guide_depths.get(d).copied().unwrap_or(false);
        if has_guide {
            let guide_style = if is_selected {
                GUIDE_STYLE.bg(SELECTED_BG)
            } else {
                GUIDE_STYLE
            };
            spans.push(Span::styled("\u{2502} ", guide_style));
        } else {
            spans.push(Span::styled("  ", base_style));
        }
    }

    let icon: &str = if row.is_folder {
        if row.is_expanded {
            "\u{25BC} "
        } else {
            "\u{25B6} "
        }
    } else {
        "\u{25CF} "
    };
    spans.push(Span::styled(icon.to_string(), base_style));

    let name = if row.is_folder {
        format!("{}/", row.name)
    } else {
        row.name.clone()
    };
    spans.push(Span::styled(name, base_style));

    if let Some(breadcrumb) = &row.breadcrumb {
        let crumb_style = if is_selected {
            Style::default()
                .bg(SELECTED_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::DIM)
        } else {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!(" {breadcrumb}"), crumb_style));
    }

    if is_selected {
        let content_width: usize = spans.iter().map(|s| s.content.width()).sum();
        let remaining = (area_width as usize).saturating_sub(content_width);
        if remaining > 0 {
            spans.push(Span::styled(
                " ".repeat(remaining),
                Style::default().bg(SELECTED_BG),
            ));
        }
    }

    Line::from(spans)
}

fn render_stats_line(frame: &mut Frame, area: Rect, app: &App) {
    let text = if app.tree.is_some() {
        format!(
            "Total: {} folders, {} files",
            app.stats.folders, app.stats.files
        )
    } else {
        "Total: -".to_string()
    };
    let widget = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(widget, area);
}

// ── Preview panel ────────────────────────────────────────────────────

fn render_preview(frame: &mut Frame, area: Rect, app: &App) {
    let title = match &app.preview {
        PreviewState::Closed => "Preview",
        PreviewState::Loading { name, .. } => name,
        PreviewState::Ready(data) => &data.name,
        PreviewState::Failed { name, .. } => name,
    };

    let block = core_ui::panel_block(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    match &app.preview {
        PreviewState::Closed => {
            let hint = Paragraph::new("Select a file to preview (Enter on a file in the tree)")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(ratatui::layout::Alignment::Center);
            let centered = Rect {
                y: inner.y + inner.height / 2,
                height: 1,
                ..inner
            };
            frame.render_widget(hint, centered);
        }
        PreviewState::Loading { path, .. } => {
            let lines = vec![
                Line::from(Span::styled(
                    path.clone(),
                    Style::default().fg(Color::Cyan),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} Loading...", app.spinner_char()),
                    Style::default().fg(Color::Yellow),
                )),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
        }
        PreviewState::Failed { message, .. } => {
            let lines = vec![
                Line::from(Span::styled(
                    "Error loading file",
                    ERROR_STYLE.add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(message.clone(), ERROR_STYLE)),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
        }
        PreviewState::Ready(data) => {
            render_preview_data(frame, inner, data, app.preview_scroll);
        }
    }
}

fn render_preview_data(frame: &mut Frame, area: Rect, data: &PreviewData, scroll: usize) {
    let details = detail_lines(data);
    let header_height = (details.len() as u16).min(area.height);
    let [header_area, content_area] =
        Layout::vertical([Constraint::Length(header_height), Constraint::Min(0)]).areas(area);

    frame.render_widget(Paragraph::new(details), header_area);

    if content_area.height == 0 {
        return;
    }

    match &data.content {
        PreviewContent::Text { text, .. } => {
            let lines: Vec<Line> = text
                .lines()
                .skip(scroll)
                .take(content_area.height as usize)
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::White))))
                .collect();
            frame.render_widget(Paragraph::new(lines), content_area);
        }
        PreviewContent::Image {
            width,
            height,
            zoom,
        } => {
            let mut lines = vec![Line::from(Span::styled(
                format!("[image: {} \u{00D7} {} px]", width, height),
                Style::default().fg(Color::Magenta),
            ))];
            if let Some(zoom) = zoom {
                lines.push(Line::from(Span::styled(
                    format!("Zoomed to {}% (Original: {} \u{00D7} {} px)", zoom, width, height),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            frame.render_widget(Paragraph::new(lines), content_area);
        }
    }
}

/// The metadata header: path, raw URL, and the file details grid.
fn detail_lines(data: &PreviewData) -> Vec<Line<'static>> {
    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let value_style = Style::default().fg(Color::White);

    let mut lines = vec![
        Line::from(Span::styled(
            data.path.clone(),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(Span::styled(
            data.raw_url.clone(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Type:          ", label_style),
            Span::styled(data.content.type_label(), value_style),
        ]),
    ];

    if let Some(size) = data.size_bytes {
        lines.push(Line::from(vec![
            Span::styled("Size:          ", label_style),
            Span::styled(format_size(size), value_style),
        ]));
    }

    match &data.content {
        PreviewContent::Text { lines: count, .. } => {
            lines.push(Line::from(vec![
                Span::styled("Lines:         ", label_style),
                Span::styled(count.to_string(), value_style),
            ]));
        }
        PreviewContent::Image { width, height, .. } => {
            lines.push(Line::from(vec![
                Span::styled("Dimensions:    ", label_style),
                Span::styled(format!("{} \u{00D7} {} px", width, height), value_style),
            ]));
        }
    }

    if let Some(modified) = &data.last_modified {
        lines.push(Line::from(vec![
            Span::styled("Last Modified: ", label_style),
            Span::styled(modified.clone(), value_style),
        ]));
    }

    lines.push(Line::from(""));
    lines
}
