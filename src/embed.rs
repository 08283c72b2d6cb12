use std::collections::HashMap;
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::time::SystemTime;

/// Loads and memoises template files referenced by `@@`/`@@!` inclusion
/// (spec §2 "Embed I/O", §4.4).
///
/// Mirrors the original's `File` class: a cache entry is only re-read from
/// disk when the file's mtime has advanced past what was last observed, so a
/// `-w`/`--watch` recompilation loop doesn't re-stat-and-reread unioned
/// content on every tick.
#[derive(Debug, Default)]
pub struct EmbedCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    mtime: SystemTime,
    contents: String,
}

impl EmbedCache {
    pub fn new() -> Self {
        EmbedCache::default()
    }

    /// Resolves dot-path segments (e.g. `[a, b, c]`) to `a/b/c.template`
    /// relative to `root`, and returns its contents. A missing file is a
    /// soft failure: logs a warning and returns `None` (spec §4.4, §7).
    pub fn load_template(&mut self, root: &FsPath, segments: &[String]) -> Option<String> {
        let mut path = root.to_path_buf();
        for seg in segments {
            path.push(seg);
        }
        path.set_extension("template");
        self.read(&path)
    }

    /// Reads an arbitrary file path through the same mtime-gated cache,
    /// used by the schema's transparent `@@` replacement (spec §4.3).
    pub fn read(&mut self, path: &FsPath) -> Option<String> {
        let mtime = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(err) => {
                log::warn!("missing template include {}: {}", path.display(), err);
                return None;
            }
        };

        if let Some(entry) = self.entries.get(path) {
            if entry.mtime == mtime {
                return Some(entry.contents.clone());
            }
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                self.entries.insert(
                    path.to_path_buf(),
                    CacheEntry {
                        mtime,
                        contents: contents.clone(),
                    },
                );
                Some(contents)
            }
            Err(err) => {
                log::warn!("failed to read template include {}: {}", path.display(), err);
                None
            }
        }
    }
}
