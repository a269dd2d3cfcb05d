//! Lazy tree population: background fetch dispatch and merge-back.
//!
//! `expand`/`refresh` run on the interactive loop and only flip node state
//! before handing the blocking directory listing to a `spawn_blocking` task.
//! The task sends a [`FetchOutcome`] over the app event channel, and the
//! event loop feeds it to [`Engine::apply`], so every store mutation happens
//! on the interactive loop. A per-node generation counter, captured at
//! dispatch and checked at merge, makes stale completions no-ops.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::Event;
use crate::fs::adapter::{Adapter, Entry};
use crate::fs::filter::EntryFilter;
use crate::fs::store::{LoadState, NodeId, TreeStore};

/// Completion of one background fetch, tagged with the generation that was
/// current when it was dispatched.
#[derive(Debug)]
pub struct FetchOutcome {
    pub node_id: NodeId,
    pub generation: u64,
    pub result: Result<Vec<Entry>>,
}

/// Dispatches background listings and merges their results into the store.
pub struct Engine {
    adapter: Arc<dyn Adapter>,
    filter: Arc<EntryFilter>,
    events: mpsc::UnboundedSender<Event>,
}

impl Engine {
    pub fn new(
        adapter: Arc<dyn Adapter>,
        filter: Arc<EntryFilter>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            adapter,
            filter,
            events,
        }
    }

    /// Request the children of `id`, fetching them lazily.
    ///
    /// No-op for leaves, for nodes already `Loading` (the in-flight fetch
    /// satisfies this call too), and for `Loaded` nodes (cached children are
    /// reused). `Failed` nodes are retried.
    pub fn expand(&self, store: &mut TreeStore, id: NodeId) {
        let root = store.root_id();
        let Some(node) = store.get_mut(id) else { return };
        if !node.is_dir() {
            return;
        }
        match node.state {
            LoadState::Loading | LoadState::Loaded => return,
            LoadState::Unloaded | LoadState::Failed => {}
        }
        node.error = None;
        let generation = node.generation;
        let path = (id != root).then(|| node.entry.path.clone());
        store.set_state(id, LoadState::Loading);
        self.dispatch(id, generation, path);
    }

    /// Force a reload of `id`: drop cached children, invalidate any
    /// in-flight fetch via the generation bump, then fetch again.
    pub fn refresh(&self, store: &mut TreeStore, id: NodeId) {
        let root = store.root_id();
        let Some(node) = store.get_mut(id) else { return };
        if !node.is_dir() {
            return;
        }
        node.generation += 1;
        node.error = None;
        let generation = node.generation;
        let path = (id != root).then(|| node.entry.path.clone());
        store.clear_children(id);
        store.set_state(id, LoadState::Loading);
        self.dispatch(id, generation, path);
    }

    /// Spawn the blocking listing task bound to `(id, generation)`.
    ///
    /// The super-root (no path) lists the filesystem roots; everything else
    /// lists the directory's children.
    fn dispatch(&self, id: NodeId, generation: u64, path: Option<PathBuf>) {
        debug!(?id, generation, ?path, "dispatching fetch");
        let adapter = Arc::clone(&self.adapter);
        let filter = Arc::clone(&self.filter);
        let events = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let result = match &path {
                Some(p) => adapter.list_children(p),
                None => adapter.list_roots(),
            }
            .map(|entries| {
                entries
                    .into_iter()
                    .filter(|entry| filter.accept(entry))
                    .collect()
            });
            // The receiver is gone only during shutdown; drop the result then.
            let _ = events.send(Event::Fetch(FetchOutcome {
                node_id: id,
                generation,
                result,
            }));
        });
    }

    /// Merge a completed fetch into the store.
    ///
    /// Discards the outcome when the node is gone or its generation moved on
    /// (a refresh raced ahead). Accepted entries not already present by path
    /// are appended in listing order. Returns true when the tree changed and
    /// the subtree should be repainted.
    pub fn apply(&self, store: &mut TreeStore, outcome: FetchOutcome) -> bool {
        let FetchOutcome {
            node_id,
            generation,
            result,
        } = outcome;

        let Some(node) = store.get(node_id) else {
            debug!(?node_id, "dropping fetch result for unknown node");
            return false;
        };
        if node.generation != generation {
            debug!(
                ?node_id,
                generation,
                current = node.generation,
                "dropping stale fetch result"
            );
            return false;
        }

        match result {
            Ok(entries) => {
                let count = entries.len();
                for entry in entries {
                    if store.child_by_path(node_id, &entry.path).is_none() {
                        store.create_child(node_id, entry);
                    }
                }
                if let Some(node) = store.get_mut(node_id) {
                    node.state = LoadState::Loaded;
                    node.error = None;
                }
                debug!(?node_id, count, "merged fetch result");
            }
            Err(err) => {
                warn!(?node_id, %err, "fetch failed");
                if let Some(node) = store.get_mut(node_id) {
                    node.state = LoadState::Failed;
                    node.error = Some(err.to_string());
                }
            }
        }
        true
    }
}
