use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// One-line bar showing the selected path, node info, the active filter,
/// and key hints; a transient status message replaces the whole bar.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    file_info: &'a str,
    filter_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(
        path_str: &'a str,
        file_info: &'a str,
        filter_info: &'a str,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            path_str,
            file_info,
            filter_info,
            theme,
            status_message: None,
            is_error: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

/// Keep the tail of `path` within `budget` columns, with a `...` marker when
/// something was cut. Works on characters, not bytes, so non-ASCII path
/// components cannot split a code point.
fn abbreviate_path(path: &str, budget: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= budget {
        return path.to_string();
    }
    if budget <= 3 {
        return String::new();
    }
    let tail: String = chars[chars.len() - (budget - 3)..].iter().collect();
    format!("...{tail}")
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let fg = if self.is_error {
                self.theme.error_fg
            } else {
                self.theme.success_fg
            };
            let style = Style::default().bg(self.theme.status_bg).fg(fg);
            let display: String = if msg.chars().count() >= width {
                msg.chars().take(width).collect()
            } else {
                format!("{msg:<width$}")
            };
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // path ... info [filter] hints
        let key_hints = " enter:expand  h:collapse  r:refresh  q:quit ";
        let filter_display = format!("[{}]", self.filter_info);
        let info_display = if self.file_info.is_empty() {
            String::new()
        } else {
            format!("{}  ", self.file_info)
        };

        let path_budget = width
            .saturating_sub(key_hints.len())
            .saturating_sub(filter_display.len())
            .saturating_sub(info_display.chars().count())
            .saturating_sub(1);
        let path_display = abbreviate_path(self.path_str, path_budget);

        let padding = width
            .saturating_sub(path_display.chars().count())
            .saturating_sub(info_display.chars().count())
            .saturating_sub(filter_display.len())
            .saturating_sub(key_hints.len());

        let base = Style::default()
            .bg(self.theme.status_bg)
            .fg(self.theme.status_fg);
        let line = Line::from(vec![
            Span::styled(path_display, base),
            Span::styled(" ".repeat(padding), base),
            Span::styled(info_display, base.fg(self.theme.dim_fg)),
            Span::styled(filter_display, base.fg(self.theme.info_fg)),
            Span::styled(key_hints, base.fg(self.theme.dim_fg)),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
