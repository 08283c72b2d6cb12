use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

/// Polls file modification times on an interval and reports which watched
/// paths changed since the last tick (spec §5: "The watcher loop ... polls
/// file modification times on an interval and invokes the compiler
/// synchronously on each change"; external collaborator, out of scope for
/// the engine itself per §1).
///
/// Mirrors the original's `File_Watcher`: a coarse poll interval, plus a
/// short "recently modified" window so a burst of saves in quick succession
/// doesn't trigger a recompile storm.
pub struct Watcher {
    paths: Vec<PathBuf>,
    watch_interval: Duration,
    recent_interval: Duration,
    recent_ttl: Duration,
    mtimes: HashMap<PathBuf, SystemTime>,
    recent: HashMap<PathBuf, Instant>,
}

impl Watcher {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Watcher {
            paths,
            watch_interval: Duration::from_secs(15),
            recent_interval: Duration::from_secs(2),
            recent_ttl: Duration::from_secs(300),
            mtimes: HashMap::new(),
            recent: HashMap::new(),
        }
    }

    pub fn watch_interval(&self) -> Duration {
        self.watch_interval
    }

    /// Stats every watched path once, returning those whose mtime advanced
    /// since the previous call and that aren't still inside the "recently
    /// modified" debounce window.
    pub fn poll_once(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        self.recent
            .retain(|_, seen| now.duration_since(*seen) < self.recent_ttl);

        let mut changed = Vec::new();
        for path in &self.paths {
            let mtime = match std::fs::metadata(path).and_then(|m| m.modified()) {
                Ok(mtime) => mtime,
                Err(err) => {
                    log::warn!("failed to stat watched path {}: {}", path.display(), err);
                    continue;
                }
            };

            let advanced = self.mtimes.get(path).map(|prev| *prev != mtime).unwrap_or(true);
            if !advanced {
                continue;
            }
            self.mtimes.insert(path.clone(), mtime);

            if let Some(seen) = self.recent.get(path) {
                if now.duration_since(*seen) < self.recent_interval {
                    continue;
                }
            }
            self.recent.insert(path.clone(), now);
            changed.push(path.clone());
        }
        changed
    }

    /// Blocks, calling `on_change` with the list of changed paths after
    /// every poll tick. The CLI's `-w`/`--watch` flag drives this.
    pub fn run(&mut self, mut on_change: impl FnMut(&[PathBuf])) -> ! {
        loop {
            std::thread::sleep(self.watch_interval);
            let changed = self.poll_once();
            if !changed.is_empty() {
                on_change(&changed);
            }
        }
    }
}
