use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::FlatItem;
use crate::fs::adapter::EntryKind;
use crate::fs::store::LoadState;
use crate::theme::ThemeColors;

/// Renders the flattened node rows with box-drawing guides and per-row
/// load-state glyphs.
pub struct TreeWidget<'a> {
    items: &'a [FlatItem],
    selected_index: usize,
    scroll_offset: usize,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(
        items: &'a [FlatItem],
        selected_index: usize,
        scroll_offset: usize,
        theme: &'a ThemeColors,
        use_icons: bool,
    ) -> Self {
        Self {
            items,
            selected_index,
            scroll_offset,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn indicator(&self, item: &FlatItem) -> &'static str {
        if self.use_icons {
            match item.kind {
                EntryKind::Directory if item.is_expanded => " ",
                EntryKind::Directory => " ",
                EntryKind::File => file_icon(&item.name),
            }
        } else {
            match item.kind {
                EntryKind::Directory if item.is_expanded => "[-] ",
                EntryKind::Directory => "[+] ",
                EntryKind::File => "[F] ",
            }
        }
    }

    /// Trailing glyph for a row's load state.
    fn state_suffix(item: &FlatItem) -> &'static str {
        match item.state {
            LoadState::Loading => " …",
            LoadState::Failed => " ✗",
            LoadState::Unloaded | LoadState::Loaded => "",
        }
    }
}

/// Builds box-drawing prefixes for rows fed in display (depth-first) order.
///
/// Remembers, per depth, whether the row last seen there was the final
/// sibling; those flags decide where vertical guide lines continue.
struct PrefixBuilder {
    last_at: Vec<bool>,
}

impl PrefixBuilder {
    fn new() -> Self {
        Self { last_at: Vec::new() }
    }

    fn next(&mut self, item: &FlatItem) -> String {
        if self.last_at.len() <= item.depth {
            self.last_at.resize(item.depth + 1, false);
        }
        self.last_at[item.depth] = item.is_last_sibling;

        if item.depth == 0 {
            return String::new();
        }
        let mut prefix = String::new();
        for level in 1..item.depth {
            prefix.push_str(if self.last_at[level] { "   " } else { "│  " });
        }
        prefix.push_str(if item.is_last_sibling { "└──" } else { "├──" });
        prefix
    }
}

/// Nerd Font glyph for a file, picked by extension.
fn file_icon(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "rs" => " ",
        "py" => " ",
        "js" | "jsx" | "ts" | "tsx" => " ",
        "toml" | "yaml" | "yml" | "ini" | "cfg" => " ",
        "md" | "markdown" | "rst" | "txt" => " ",
        "sh" | "bash" | "zsh" | "fish" => " ",
        "png" | "jpg" | "jpeg" | "gif" | "svg" => " ",
        "zip" | "tar" | "gz" | "xz" | "zst" => " ",
        _ => " ",
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let end = (self.scroll_offset + inner.height as usize).min(self.items.len());

        // The builder walks rows from the top even when scrolled, so the
        // guide lines above the window stay consistent with what is drawn.
        let mut prefixes = PrefixBuilder::new();
        for (index, item) in self.items.iter().enumerate().take(end) {
            let prefix = prefixes.next(item);
            if index < self.scroll_offset {
                continue;
            }

            let is_selected = index == self.selected_index;
            let base_fg = match item.kind {
                EntryKind::Directory => self.theme.tree_dir_fg,
                EntryKind::File => self.theme.tree_file_fg,
            };
            let name_style = if is_selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().bg(self.theme.tree_bg).fg(base_fg)
            };
            let suffix_style = match item.state {
                LoadState::Failed => Style::default().fg(self.theme.error_fg),
                _ => Style::default().fg(self.theme.tree_fg),
            };

            let line = Line::from(vec![
                Span::styled(prefix, Style::default().fg(self.theme.dim_fg)),
                Span::styled(
                    format!("{}{}", self.indicator(item), item.name),
                    name_style,
                ),
                Span::styled(Self::state_suffix(item), suffix_style),
            ]);
            let y = inner.y + (index - self.scroll_offset) as u16;
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}
