use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::event::Event;
use crate::fs::adapter::{Adapter, EntryKind};
use crate::fs::engine::{Engine, FetchOutcome};
use crate::fs::filter::EntryFilter;
use crate::fs::store::{LoadState, Node, NodeId, TreeStore};
use crate::theme::ThemeColors;

/// How long transient status messages stay visible.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// One visible row of the flattened tree.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub id: NodeId,
    pub name: String,
    pub depth: usize,
    pub kind: EntryKind,
    pub state: LoadState,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
}

/// Main application state.
///
/// Owns the tree store and the population engine; key handling and fetch
/// completions both funnel through here, so the store is only ever mutated
/// on the interactive loop.
pub struct App {
    pub store: TreeStore,
    engine: Engine,
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub title: String,
    pub filter_summary: String,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub status_message: Option<(String, bool, Instant)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        adapter: Arc<dyn Adapter>,
        filter: EntryFilter,
        title: String,
        theme: ThemeColors,
        use_icons: bool,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let filter_summary = filter.summary();
        let engine = Engine::new(adapter, Arc::new(filter), events);
        let store = TreeStore::new(&title);
        Self {
            store,
            engine,
            flat_items: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            title,
            filter_summary,
            theme,
            use_icons,
            status_message: None,
            should_quit: false,
        }
    }

    /// Kick off the initial root listing through the population engine.
    pub fn open_roots(&mut self) {
        let root = self.store.root_id();
        self.engine.expand(&mut self.store, root);
        self.flatten();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Selection / expansion bridge ─────────────────────────────────────────

    pub fn selected_id(&self) -> Option<NodeId> {
        self.flat_items.get(self.selected_index).map(|item| item.id)
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected_id().and_then(|id| self.store.get(id))
    }

    /// Expand the currently selected directory node.
    ///
    /// The engine decides whether a fetch is needed; a node with cached
    /// children just unfolds.
    pub fn expand_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        let Some(node) = self.store.get_mut(id) else { return };
        if !node.is_dir() {
            return;
        }
        node.is_expanded = true;
        self.engine.expand(&mut self.store, id);
        self.flatten();
    }

    /// Collapse the currently selected directory, or jump to the parent.
    pub fn collapse_selected(&mut self) {
        let Some(item) = self.flat_items.get(self.selected_index) else {
            return;
        };
        let id = item.id;

        if item.kind == EntryKind::Directory && item.is_expanded {
            if let Some(node) = self.store.get_mut(id) {
                node.is_expanded = false;
            }
            self.flatten();
            return;
        }

        let parent = self.store.get(id).and_then(|n| n.parent);
        if let Some(parent_id) = parent {
            if let Some(index) = self.flat_items.iter().position(|i| i.id == parent_id) {
                self.selected_index = index;
            }
        }
    }

    /// Force a reload of the currently selected directory.
    pub fn refresh_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        let Some(node) = self.store.get_mut(id) else { return };
        if !node.is_dir() {
            return;
        }
        node.is_expanded = true;
        let name = node.entry.name.clone();
        self.engine.refresh(&mut self.store, id);
        self.set_status(format!("Refreshing {name}"), false);
        self.flatten();
    }

    // ── Fetch completions ────────────────────────────────────────────────────

    /// Merge a background fetch completion and repaint the affected subtree.
    pub fn handle_fetch(&mut self, outcome: FetchOutcome) {
        let node_id = outcome.node_id;
        if !self.engine.apply(&mut self.store, outcome) {
            return;
        }

        if let Some(node) = self.store.get(node_id) {
            if node.state == LoadState::Failed {
                if let Some(error) = node.error.clone() {
                    self.set_status(error, true);
                }
            }
        }

        // A single root is unfolded right away so the first draw shows its
        // contents instead of one collapsed row.
        if node_id == self.store.root_id() && self.store.children(node_id).len() == 1 {
            let only = self.store.children(node_id)[0];
            if self.store.get(only).is_some_and(|n| n.is_dir()) {
                if let Some(node) = self.store.get_mut(only) {
                    node.is_expanded = true;
                }
                self.engine.expand(&mut self.store, only);
            }
        }

        self.flatten();
    }

    // ── Flattening ───────────────────────────────────────────────────────────

    /// Rebuild the flat row list from the store.
    ///
    /// The super-root itself is never emitted; its children are the
    /// top-level rows.
    pub fn flatten(&mut self) {
        self.flat_items.clear();
        let children = self.store.children(self.store.root_id()).to_vec();
        for (i, &child) in children.iter().enumerate() {
            self.flatten_node(child, 0, i == children.len() - 1);
        }
        if !self.flat_items.is_empty() && self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    fn flatten_node(&mut self, id: NodeId, depth: usize, is_last: bool) {
        let Some(node) = self.store.get(id) else { return };
        let item = FlatItem {
            id,
            name: node.entry.name.clone(),
            depth,
            kind: node.entry.kind,
            state: node.state,
            is_expanded: node.is_expanded,
            is_last_sibling: is_last,
        };
        let children = if node.is_expanded {
            node.children.clone()
        } else {
            Vec::new()
        };
        self.flat_items.push(item);
        for (i, &child) in children.iter().enumerate() {
            self.flatten_node(child, depth + 1, i == children.len() - 1);
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.flat_items.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.flat_items.len().saturating_sub(1);
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }

    // ── Status messages ──────────────────────────────────────────────────────

    pub fn set_status(&mut self, message: String, is_error: bool) {
        self.status_message = Some((message, is_error, Instant::now()));
    }

    /// Expire stale status messages; called on every tick.
    pub fn tick(&mut self) {
        if let Some((_, _, shown_at)) = &self.status_message {
            if shown_at.elapsed() > STATUS_TTL {
                self.status_message = None;
            }
        }
    }

    /// Error recorded on the selected node, if it failed to load.
    pub fn selected_error(&self) -> Option<&str> {
        self.selected_node().and_then(|n| n.error.as_deref())
    }

    /// Path string of the selected node for the status bar.
    pub fn selected_path(&self) -> String {
        self.selected_node()
            .map(|n| n.entry.path.display().to_string())
            .unwrap_or_default()
    }

    /// Short description of the selected node for the status bar.
    pub fn selected_info(&self) -> String {
        match self.selected_node() {
            Some(node) if node.entry.kind == EntryKind::File => format_size(node.entry.meta.size),
            Some(node) => match node.state {
                LoadState::Loaded => format!("{} items", node.children.len()),
                LoadState::Loading => "loading".to_string(),
                LoadState::Failed => "failed".to_string(),
                LoadState::Unloaded => String::new(),
            },
            None => String::new(),
        }
    }
}

/// Human-readable file size.
fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    use crate::fs::adapter::OsAdapter;
    use crate::theme::dark_theme;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("alpha").join("nested")).unwrap();
        File::create(dir.path().join("alpha").join("inner.txt")).unwrap();
        File::create(dir.path().join("file_a.txt")).unwrap();
        dir
    }

    struct Harness {
        app: App,
        rx: mpsc::UnboundedReceiver<Event>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = setup_test_dir();
        let adapter = Arc::new(OsAdapter::rooted_at(dir.path().to_path_buf(), true));
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            adapter,
            EntryFilter::default(),
            dir.path().display().to_string(),
            dark_theme(),
            false,
            tx,
        );
        Harness { app, rx, _dir: dir }
    }

    /// Drive one fetch completion through the app.
    async fn pump(h: &mut Harness) {
        match h.rx.recv().await.expect("fetch event") {
            Event::Fetch(outcome) => h.app.handle_fetch(outcome),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_roots_populates_and_unfolds_single_root() {
        let mut h = harness();
        h.app.open_roots();
        assert!(h.app.flat_items.is_empty());

        pump(&mut h).await; // root listing, triggers auto-expand of the lone root
        pump(&mut h).await; // children of the root directory

        let names: Vec<&str> = h.app.flat_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names.len(), 3); // root dir + alpha + file_a.txt
        assert!(names.contains(&"alpha"));
        assert!(names.contains(&"file_a.txt"));
    }

    #[tokio::test]
    async fn expand_selected_loads_subdirectory() {
        let mut h = harness();
        h.app.open_roots();
        pump(&mut h).await;
        pump(&mut h).await;

        let alpha_index = h
            .app
            .flat_items
            .iter()
            .position(|i| i.name == "alpha")
            .unwrap();
        h.app.selected_index = alpha_index;
        h.app.expand_selected();
        assert_eq!(
            h.app.flat_items[alpha_index].state,
            LoadState::Loading
        );

        pump(&mut h).await;
        let names: Vec<&str> = h.app.flat_items.iter().map(|i| i.name.as_str()).collect();
        assert!(names.contains(&"nested"));
        assert!(names.contains(&"inner.txt"));
    }

    #[tokio::test]
    async fn expand_selected_on_file_is_noop() {
        let mut h = harness();
        h.app.open_roots();
        pump(&mut h).await;
        pump(&mut h).await;

        let file_index = h
            .app
            .flat_items
            .iter()
            .position(|i| i.name == "file_a.txt")
            .unwrap();
        let count_before = h.app.flat_items.len();
        h.app.selected_index = file_index;
        h.app.expand_selected();
        assert_eq!(h.app.flat_items.len(), count_before);
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn collapse_hides_children_and_jumps_to_parent() {
        let mut h = harness();
        h.app.open_roots();
        pump(&mut h).await;
        pump(&mut h).await;

        let alpha_index = h
            .app
            .flat_items
            .iter()
            .position(|i| i.name == "alpha")
            .unwrap();
        h.app.selected_index = alpha_index;
        h.app.expand_selected();
        pump(&mut h).await;
        let expanded_count = h.app.flat_items.len();

        // Collapse alpha: its children disappear from the flat list.
        h.app.collapse_selected();
        assert!(h.app.flat_items.len() < expanded_count);

        // Collapse again on the now-collapsed dir jumps to the parent row.
        h.app.collapse_selected();
        assert_eq!(h.app.selected_index, 0);
    }

    #[tokio::test]
    async fn selection_stays_in_bounds() {
        let mut h = harness();
        h.app.open_roots();
        pump(&mut h).await;
        pump(&mut h).await;

        h.app.move_selection_up();
        assert_eq!(h.app.selected_index, 0);

        h.app.select_last();
        let last = h.app.selected_index;
        h.app.move_selection_down();
        assert_eq!(h.app.selected_index, last);
    }

    #[test]
    fn update_scroll_keeps_selection_visible() {
        let mut h = harness();
        h.app.selected_index = 10;
        h.app.update_scroll(5);
        assert_eq!(h.app.scroll_offset, 6);

        h.app.selected_index = 2;
        h.app.update_scroll(5);
        assert_eq!(h.app.scroll_offset, 2);
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[tokio::test]
    async fn refresh_selected_picks_up_new_entries() {
        let mut h = harness();
        h.app.open_roots();
        pump(&mut h).await;
        pump(&mut h).await;

        File::create(h._dir.path().join("late.txt")).unwrap();
        h.app.selected_index = 0; // the root directory row
        h.app.refresh_selected();
        pump(&mut h).await;

        let names: Vec<&str> = h.app.flat_items.iter().map(|i| i.name.as_str()).collect();
        assert!(names.contains(&"late.txt"));
    }
}
