//! Change detection for watch mode.
//!
//! A [`ChangeDetector`] answers one question per watcher tick: which files
//! under the input and templates trees changed since the last tick? The
//! debounce and rebuild policy lives in `crate::watch` and does not care how
//! the answer was obtained.
//!
//! | Detector          | Mechanism                                   |
//! |-------------------|---------------------------------------------|
//! | [`PollDetector`]  | Walk both trees, compare modification times |
//! | [`NotifyDetector`]| Drain OS file events collected by `notify`  |
//!
//! Both ignore hidden entries (anything below a dot-directory, and dotfiles)
//! and `.tmp` files, and report at most one exemplar path per tree.

use crate::{
    log,
    utils::path::{has_hidden_component, is_hidden, is_temp_file},
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
    time::SystemTime,
};
use walkdir::{DirEntry, WalkDir};

/// Which watched root a change was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchedTree {
    Input,
    Templates,
}

impl WatchedTree {
    /// Get the short name for this tree (used in logs)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "input files",
            Self::Templates => "template files",
        }
    }
}

/// One changed path, reported as the exemplar for its tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub tree: WatchedTree,
    pub path: PathBuf,
}

/// Source of "something changed under a watched root" notifications.
pub trait ChangeDetector {
    /// Changes since the previous call, at most one per tree.
    fn changes(&mut self) -> Vec<Change>;

    /// Discard everything observed so far and start from the current state
    /// of the trees. Called after every rebuild.
    fn resync(&mut self);
}

fn watched_trees(input: &Path, templates: &Path) -> Vec<(WatchedTree, PathBuf)> {
    vec![
        (WatchedTree::Input, input.to_path_buf()),
        (WatchedTree::Templates, templates.to_path_buf()),
    ]
}

// =============================================================================
// Polling
// =============================================================================

/// Walk the visible files of a tree: hidden entries are pruned along with
/// their subtrees, temp files are skipped. Walk errors are passed through.
fn visible_files(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter(|entry| match entry {
            Ok(e) => e.file_type().is_file() && !is_temp_file(e.path()),
            Err(_) => true,
        })
}

fn modified(entry: &DirEntry) -> Option<SystemTime> {
    entry.metadata().ok()?.modified().ok()
}

/// Last observed modification time of every visible watched file.
#[derive(Debug, Default)]
pub struct WatchState {
    mtimes: FxHashMap<PathBuf, SystemTime>,
}

impl WatchState {
    /// Record the current state of every visible file under `roots`.
    pub fn snapshot<'a>(roots: impl IntoIterator<Item = &'a Path>) -> Self {
        let mut state = Self::default();
        for root in roots {
            for entry in visible_files(root).filter_map(Result::ok) {
                if let Some(mtime) = modified(&entry) {
                    state.mtimes.insert(entry.into_path(), mtime);
                }
            }
        }
        state
    }

    /// Record `mtime` for `path`; returns true if the path is new or its
    /// modification time differs from the recorded one.
    pub fn observe(&mut self, path: &Path, mtime: SystemTime) -> bool {
        match self.mtimes.get_mut(path) {
            Some(seen) if *seen == mtime => false,
            Some(seen) => {
                *seen = mtime;
                true
            }
            None => {
                self.mtimes.insert(path.to_path_buf(), mtime);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.mtimes.len()
    }
}

/// Detects changes by walking both trees on every call.
pub struct PollDetector {
    trees: Vec<(WatchedTree, PathBuf)>,
    state: WatchState,
}

impl PollDetector {
    /// Create a detector and take the initial snapshot.
    pub fn new(input: &Path, templates: &Path) -> Self {
        let trees = watched_trees(input, templates);
        let state = WatchState::snapshot(trees.iter().map(|(_, root)| root.as_path()));
        Self { trees, state }
    }

    pub const fn state(&self) -> &WatchState {
        &self.state
    }
}

impl ChangeDetector for PollDetector {
    fn changes(&mut self) -> Vec<Change> {
        let mut changes = Vec::new();

        for (tree, root) in &self.trees {
            let mut first = None;
            let mut reported = false;

            for entry in visible_files(root) {
                match entry {
                    Ok(entry) => {
                        let Some(mtime) = modified(&entry) else {
                            continue;
                        };
                        if self.state.observe(entry.path(), mtime) && first.is_none() {
                            first = Some(entry.into_path());
                        }
                    }
                    // One line per tree and tick is enough
                    Err(e) if !reported => {
                        log!("watch"; "error checking for file changes: {e}");
                        reported = true;
                    }
                    Err(_) => {}
                }
            }

            if let Some(path) = first {
                changes.push(Change { tree: *tree, path });
            }
        }

        changes
    }

    fn resync(&mut self) {
        self.state = WatchState::snapshot(self.trees.iter().map(|(_, root)| root.as_path()));
    }
}

// =============================================================================
// OS events
// =============================================================================

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Detects changes from OS file events.
///
/// Events are buffered by `notify` between ticks and drained on each call,
/// so the tick schedule and rebuild debounce stay exactly as with polling.
pub struct NotifyDetector {
    trees: Vec<(WatchedTree, PathBuf)>,
    events: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl NotifyDetector {
    /// Start watching both trees recursively.
    ///
    /// A tree that does not exist yet is skipped with a warning; unlike
    /// polling, it will not be picked up if it appears later.
    pub fn new(input: &Path, templates: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

        let trees = watched_trees(input, templates);
        for (tree, root) in &trees {
            if !root.exists() {
                log!("warn"; "not watching missing {}: {}", tree.name(), root.display());
                continue;
            }
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}: {}", tree.name(), root.display()))?;
        }

        Ok(Self {
            trees,
            events: rx,
            _watcher: watcher,
        })
    }

    fn tree_of(&self, path: &Path) -> Option<(WatchedTree, &Path)> {
        self.trees
            .iter()
            .find(|(_, root)| path.starts_with(root))
            .map(|(tree, root)| (*tree, root.as_path()))
    }
}

impl ChangeDetector for NotifyDetector {
    fn changes(&mut self) -> Vec<Change> {
        let mut changes: Vec<Change> = Vec::new();

        while let Ok(event) = self.events.try_recv() {
            let event = match event {
                Ok(event) if is_relevant(&event) => event,
                Ok(_) => continue,
                Err(e) => {
                    log!("watch"; "error: {e}");
                    continue;
                }
            };

            for path in event.paths {
                let Some((tree, root)) = self.tree_of(&path) else {
                    continue;
                };
                if has_hidden_component(&path, root)
                    || is_temp_file(&path)
                    || changes.iter().any(|c| c.tree == tree)
                {
                    continue;
                }
                changes.push(Change { tree, path });
            }
        }

        changes
    }

    fn resync(&mut self) {
        while self.events.try_recv().is_ok() {}
    }
}
