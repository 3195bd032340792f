//! Change watcher for serve mode.
//!
//! Ticks at a fixed interval, asks a [`ChangeDetector`] what changed under the
//! input and templates trees, and rebuilds the whole site when something did.
//!
//! # Debounce
//!
//! ```text
//! tick ──► changes? ──no──► Idle
//!             │
//!            yes (kept pending until handled)
//!             │
//!             ▼
//!   interval elapsed since last rebuild? ──no──► Deferred
//!             │
//!            yes
//!             ▼
//!   rebuild ──► detector.resync() ──► Rebuilt
//! ```
//!
//! The rebuild clock starts when the watcher starts, so a change made right
//! after startup waits one interval.

use crate::{
    build::SiteBuilder,
    config::WatcherKind,
    log,
    utils::watch::{Change, ChangeDetector, NotifyDetector, PollDetector},
};
use anyhow::{Context, Result};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// What one watcher tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing changed, nothing pending
    Idle,
    /// A change is pending but the last rebuild is too recent
    Deferred,
    Rebuilt,
}

/// Debounced whole-site rebuilds driven by a [`ChangeDetector`].
pub struct ChangeWatcher<D> {
    detector: D,
    interval: Duration,
    last_rebuild: Instant,
    pending: Option<Change>,
}

impl<D: ChangeDetector> ChangeWatcher<D> {
    pub fn new(detector: D, interval: Duration) -> Self {
        Self {
            detector,
            interval,
            last_rebuild: Instant::now(),
            pending: None,
        }
    }

    /// Run one tick, calling `rebuild` if a change is due.
    pub fn tick(&mut self, rebuild: impl FnOnce()) -> Tick {
        let changes = self.detector.changes();
        if self.pending.is_none() {
            self.pending = changes.into_iter().next();
        }

        let Some(change) = &self.pending else {
            return Tick::Idle;
        };
        if self.last_rebuild.elapsed() < self.interval {
            return Tick::Deferred;
        }

        log!("watch"; "{} changed ({}), rebuilding...", change.tree.name(), change.path.display());
        rebuild();

        self.last_rebuild = Instant::now();
        self.pending = None;
        self.detector.resync();
        Tick::Rebuilt
    }

    /// Tick forever, sleeping one interval between ticks.
    pub fn run(mut self, mut rebuild: impl FnMut()) {
        loop {
            self.tick(&mut rebuild);
            thread::sleep(self.interval);
        }
    }
}

/// Start the watcher thread for `builder`'s site.
pub fn spawn_watcher(builder: Arc<SiteBuilder>) -> Result<()> {
    let config = builder.config();
    let interval = config.watch_interval();
    let rebuild = move || match builder.build() {
        Ok(_) => log!("watch"; "rebuild complete"),
        Err(e) => log!("error"; "rebuild failed: {e:#}"),
    };

    log!("watch"; "watching {} and {}", config.build.input.display(), config.build.templates.display());

    match config.serve.watcher {
        WatcherKind::Poll => {
            let detector = PollDetector::new(&config.build.input, &config.build.templates);
            log!("watch"; "polling {} files every {}ms", detector.state().len(), interval.as_millis());
            spawn(ChangeWatcher::new(detector, interval), rebuild)
        }
        WatcherKind::Notify => {
            let detector = NotifyDetector::new(&config.build.input, &config.build.templates)?;
            log!("watch"; "using file system events, checked every {}ms", interval.as_millis());
            spawn(ChangeWatcher::new(detector, interval), rebuild)
        }
    }
}

fn spawn<D>(watcher: ChangeWatcher<D>, rebuild: impl FnMut() + Send + 'static) -> Result<()>
where
    D: ChangeDetector + Send + 'static,
{
    thread::Builder::new()
        .name("watcher".into())
        .spawn(move || watcher.run(rebuild))
        .context("Failed to spawn watcher thread")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::watch::WatchedTree;
    use std::{
        fs::{self, File},
        path::Path,
        time::SystemTime,
    };
    use tempfile::TempDir;

    /// Wraps a detector and counts resyncs.
    struct Counting<D> {
        inner: D,
        resyncs: usize,
    }

    impl<D: ChangeDetector> ChangeDetector for Counting<D> {
        fn changes(&mut self) -> Vec<Change> {
            self.inner.changes()
        }

        fn resync(&mut self) {
            self.resyncs += 1;
            self.inner.resync();
        }
    }

    /// Replays a fixed list of per-tick answers.
    struct Scripted(Vec<Vec<Change>>);

    impl ChangeDetector for Scripted {
        fn changes(&mut self) -> Vec<Change> {
            if self.0.is_empty() { Vec::new() } else { self.0.remove(0) }
        }

        fn resync(&mut self) {}
    }

    fn change(path: &str) -> Change {
        Change {
            tree: WatchedTree::Input,
            path: path.into(),
        }
    }

    fn touch(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
    }

    #[test]
    fn test_template_change_rebuilds_once() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input");
        let templates = dir.path().join("templates");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&templates).unwrap();
        fs::write(input.join("index.md"), "# Home").unwrap();
        fs::write(templates.join("default.html"), "{{.Content}}").unwrap();

        let detector = Counting {
            inner: PollDetector::new(&input, &templates),
            resyncs: 0,
        };
        let mut watcher = ChangeWatcher::new(detector, Duration::ZERO);
        let mut rebuilds = 0;

        touch(&templates.join("default.html"));

        assert_eq!(watcher.tick(|| rebuilds += 1), Tick::Rebuilt);
        assert_eq!(watcher.tick(|| rebuilds += 1), Tick::Idle);
        assert_eq!(rebuilds, 1);
        assert_eq!(watcher.detector.resyncs, 1);
    }

    #[test]
    fn test_change_inside_window_stays_pending() {
        let detector = Scripted(vec![vec![change("/site/a.md")]]);
        let mut watcher = ChangeWatcher::new(detector, Duration::from_secs(3600));
        let mut rebuilds = 0;

        assert_eq!(watcher.tick(|| rebuilds += 1), Tick::Deferred);
        // the detector has nothing new, the change is still owed
        assert_eq!(watcher.tick(|| rebuilds += 1), Tick::Deferred);
        assert_eq!(rebuilds, 0);
        assert_eq!(watcher.pending, Some(change("/site/a.md")));

        watcher.interval = Duration::ZERO;
        assert_eq!(watcher.tick(|| rebuilds += 1), Tick::Rebuilt);
        assert_eq!(rebuilds, 1);
        assert!(watcher.pending.is_none());
    }

    #[test]
    fn test_first_change_is_kept() {
        let detector = Scripted(vec![
            vec![change("/site/a.md")],
            vec![change("/site/b.md")],
        ]);
        let mut watcher = ChangeWatcher::new(detector, Duration::from_secs(3600));

        watcher.tick(|| {});
        watcher.tick(|| {});

        assert_eq!(watcher.pending, Some(change("/site/a.md")));
    }

    #[test]
    fn test_idle_without_changes() {
        let detector = Scripted(Vec::new());
        let mut watcher = ChangeWatcher::new(detector, Duration::ZERO);
        let mut rebuilds = 0;

        assert_eq!(watcher.tick(|| rebuilds += 1), Tick::Idle);
        assert_eq!(rebuilds, 0);
    }
}
