use ratatui::{
    layout::{Constraint, Direction, Layout},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI: the tree panel above a one-line status bar.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    // Update scroll offset to keep selected item visible
    let visible_height = chunks[0].height.saturating_sub(2) as usize; // account for border
    app.update_scroll(visible_height);

    let block = Block::default()
        .title(format!(" {} ", app.title))
        .borders(Borders::ALL)
        .border_style(ratatui::style::Style::default().fg(app.theme.border_fg));

    let tree_widget = TreeWidget::new(
        &app.flat_items,
        app.selected_index,
        app.scroll_offset,
        &app.theme,
        app.use_icons,
    )
    .block(block);
    frame.render_widget(tree_widget, chunks[0]);

    // The node error takes precedence over transient messages so a failed
    // row explains itself as soon as it is selected.
    let path = app.selected_path();
    let info = app.selected_info();
    let mut status_bar = StatusBarWidget::new(&path, &info, &app.filter_summary, &app.theme);
    if let Some(error) = app.selected_error() {
        status_bar = status_bar.status_message(error, true);
    } else if let Some((message, is_error, _)) = &app.status_message {
        status_bar = status_bar.status_message(message, *is_error);
    }
    frame.render_widget(status_bar, chunks[1]);
}
