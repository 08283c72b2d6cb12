use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::time::SystemTime;

use serde_json::Value;

use crate::embed::EmbedCache;
use crate::error::SchemaError;
use crate::path::{Path, Segment};
use crate::token::{Operator, Token};

/// The in-memory tree of JSON-like values backing a compile job (spec §2
/// "Schema model", §3 "Schema").
///
/// Mirrors the original's `Schema` class: the JSON is only re-parsed when
/// the backing file's mtime has advanced, so `refresh` is cheap to call on
/// every tick of a `-w`/`--watch` loop.
#[derive(Debug, Clone)]
pub struct Schema {
    source: PathBuf,
    mtime: SystemTime,
    root: Value,
}

impl Schema {
    pub fn load(source: impl Into<PathBuf>) -> Result<Schema, SchemaError> {
        let source = source.into();
        let (mtime, root) = Self::read(&source)?;
        Ok(Schema { source, mtime, root })
    }

    fn read(source: &FsPath) -> Result<(SystemTime, Value), SchemaError> {
        let contents = fs::read_to_string(source).map_err(|err| SchemaError::Read {
            path: source.to_path_buf(),
            source: err,
        })?;
        let mtime = fs::metadata(source)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let root = serde_json::from_str(&contents).map_err(|err| SchemaError::Parse {
            path: source.to_path_buf(),
            source: err,
        })?;
        Ok((mtime, root))
    }

    /// Reloads from disk if the backing file's mtime has advanced. Returns
    /// whether a reload happened.
    pub fn refresh(&mut self) -> Result<bool, SchemaError> {
        let current = fs::metadata(&self.source)
            .and_then(|m| m.modified())
            .unwrap_or(self.mtime);
        if current == self.mtime {
            return Ok(false);
        }
        let (mtime, root) = Self::read(&self.source)?;
        self.mtime = mtime;
        self.root = root;
        Ok(true)
    }

    pub fn source(&self) -> &FsPath {
        &self.source
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walks `path` from the schema root (spec §4.3). Missing keys,
    /// out-of-bounds indices, and segments applied to a scalar are soft
    /// failures: logged and resolved as `None`.
    ///
    /// A resolved string value that is itself exactly one `@@` directive is
    /// transparently replaced with the referenced template file's contents,
    /// read through `embed` relative to `include_root`.
    pub fn value(&self, path: &Path, embed: &mut EmbedCache, include_root: &FsPath) -> Option<Value> {
        let mut current = &self.root;
        for (i, segment) in path.segments.iter().enumerate() {
            current = match (current, segment) {
                (Value::Object(map), Segment::Key(key)) => match map.get(key) {
                    Some(v) => v,
                    None => {
                        log::warn!("segment not found in schema at '{}': {}", path, key);
                        return None;
                    }
                },
                (Value::Array(items), Segment::Index(index)) => match items.get(*index) {
                    Some(v) => v,
                    None => {
                        log::warn!("segment index out of bounds in schema at '{}': {}", path, index);
                        return None;
                    }
                },
                (Value::Object(_), Segment::Index(_)) | (Value::Array(_), Segment::Key(_)) => {
                    log::warn!("segment type mismatch in schema at '{}'", path);
                    return None;
                }
                _ if i < path.segments.len() => {
                    log::warn!("path runs past a scalar in schema at '{}'", path);
                    return None;
                }
                _ => unreachable!(),
            };
        }

        Some(self.transparently_include(current.clone(), embed, include_root))
    }

    fn transparently_include(&self, value: Value, embed: &mut EmbedCache, include_root: &FsPath) -> Value {
        let Value::String(ref text) = value else {
            return value;
        };
        let Some(token) = Token::find(text) else {
            return value;
        };
        if token.operator != Operator::Include || token.start != 0 || token.end != text.len() {
            return value;
        }
        match embed.load_template(include_root, &token.path) {
            Some(contents) => Value::String(contents),
            None => value,
        }
    }
}
