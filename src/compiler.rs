use std::path::PathBuf;

use serde_json::Value;

use crate::embed::EmbedCache;
use crate::error::CompileError;
use crate::functions::{takes_compiled_argument, CompileContext, FunctionRegistry};
use crate::schema::Schema;
use crate::scope::ScopeStack;
use crate::token::{Operator, Token};
use crate::value::{canonical_string, matches_select};

/// The recursive expander (spec §2 "Compiler", §4.4).
///
/// Owns a `ScopeStack` bound to one `Schema` for the duration of a compile
/// call; per spec §5 it is single-threaded and not re-entrant across
/// threads. A project driver builds a fresh `Compiler` per (schema,
/// template) pair rather than sharing one across a job.
pub struct Compiler {
    schema: Schema,
    scope: ScopeStack,
    functions: FunctionRegistry,
    ctx: CompileContext,
    embed: EmbedCache,
    include_root: PathBuf,
}

impl Compiler {
    pub fn new(schema: Schema, include_root: impl Into<PathBuf>, ctx: CompileContext) -> Self {
        Compiler {
            schema,
            scope: ScopeStack::new(),
            functions: FunctionRegistry::new(),
            ctx,
            embed: EmbedCache::new(),
            include_root: include_root.into(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    /// Expands `template` to completion (spec §4.4). The only way this
    /// returns `Err` is an unknown `%%` function name — every other failure
    /// mode is soft and resolves to an empty substitution plus a logged
    /// warning (spec §4.8, §7).
    pub fn compile(&mut self, template: &str) -> Result<String, CompileError> {
        let mut out = String::new();
        let mut rest = template;

        while let Some(token) = Token::find(rest) {
            out.push_str(&rest[..token.start]);
            let current_column = current_column(&out);

            let resolved = self.resolve(&token)?;
            let resolved = reflow(&resolved, token.indent, current_column);
            out.push_str(&resolved);

            rest = &rest[token.end..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn resolve(&mut self, token: &Token) -> Result<String, CompileError> {
        match token.operator {
            Operator::Relative | Operator::Absolute | Operator::Parent => {
                self.resolve_value(token)
            }
            Operator::Function => {
                // `str.*` take their argument from the *compiled* expansion
                // body; `date.now` keeps its raw format string (spec §4.6).
                let arg = match &token.expansion {
                    Some(expansion) if takes_compiled_argument(&token.path) => {
                        Some(self.compile(expansion)?)
                    }
                    other => other.clone(),
                };
                let result = self.functions.call(&token.path, arg.as_deref(), &self.ctx)?;
                Ok(result)
            }
            Operator::Include => Ok(self.resolve_include(token, false)),
            Operator::IncludeChomp => Ok(self.resolve_include(token, true)),
        }
    }

    fn resolve_include(&mut self, token: &Token, chomp: bool) -> String {
        self.scope.push_token(token);
        let mut contents = self
            .embed
            .load_template(&self.include_root, &token.path)
            .unwrap_or_default();
        if chomp {
            contents.pop();
        }
        self.scope.pop();
        contents
    }

    fn resolve_value(&mut self, token: &Token) -> Result<String, CompileError> {
        self.scope.push_token(token);
        let scope = self.scope.top().clone();
        let value = self.schema.value(&scope, &mut self.embed, &self.include_root);

        let compiled = match value {
            None => {
                log::warn!("missing schema value at scope '{}'", scope);
                String::new()
            }
            Some(value) => self.expand(token, &scope, value)?,
        };

        self.scope.pop();
        Ok(compiled)
    }

    fn expand(&mut self, token: &Token, scope: &crate::path::Path, value: Value) -> Result<String, CompileError> {
        match &token.expansion {
            None => {
                if matches!(value, Value::Array(_) | Value::Object(_)) {
                    log::warn!(
                        "shape violation: expansion-less directive resolved to a sequence/mapping at '{}'",
                        scope
                    );
                    Ok(String::new())
                } else {
                    Ok(canonical_string(&value))
                }
            }
            Some(expansion) => {
                if let Value::Array(items) = &value {
                    let indices = resolve_indices(token.select.as_deref(), items.len());
                    let mut acc = String::new();
                    for index in indices {
                        self.scope.push_index(index);
                        acc.push_str(&self.compile(expansion)?);
                        self.scope.pop();
                    }
                    Ok(acc)
                } else {
                    let do_compile = match &token.select {
                        None => true,
                        Some(select) => matches_select(&value, select),
                    };
                    if do_compile {
                        self.compile(expansion)
                    } else {
                        Ok(String::new())
                    }
                }
            }
        }
    }
}

/// Sequence selection syntax for `token.select` (spec §4.5): `"i"`, `"a:b"`,
/// `":b"`, `"a:"`. Negative indices aren't supported; out-of-range values
/// produce an empty selection without error.
fn resolve_indices(select: Option<&str>, len: usize) -> Vec<usize> {
    match select {
        None => (0..len).collect(),
        Some(select) => match select.split_once(':') {
            Some((a, b)) => {
                let start = if a.is_empty() {
                    0
                } else {
                    match a.parse::<usize>() {
                        Ok(n) => n,
                        Err(_) => return Vec::new(),
                    }
                };
                let end = if b.is_empty() {
                    len
                } else {
                    match b.parse::<usize>() {
                        Ok(n) => n,
                        Err(_) => return Vec::new(),
                    }
                };
                let end = end.min(len);
                if start >= end {
                    Vec::new()
                } else {
                    (start..end).collect()
                }
            }
            None => match select.parse::<usize>() {
                Ok(i) if i < len => vec![i],
                _ => Vec::new(),
            },
        },
    }
}

/// Number of columns since the last newline in already-emitted output (spec
/// §4.7 step 2). Tabs count as a single column, matching the indent
/// measurement in `token::leading_indent`.
fn current_column(out: &str) -> usize {
    out.rsplit('\n').next().unwrap_or(out).chars().count()
}

/// Indent reflow (spec §4.7): aligns every line of `resolved` to the column
/// the expansion body occupied in the template, so indentation is
/// controlled at the call site rather than the definition site.
fn reflow(resolved: &str, template_indent: usize, current_column: usize) -> String {
    let delta = template_indent as i64 - current_column as i64;
    if delta == 0 {
        return resolved.to_string();
    }
    if delta > 0 {
        let delta = delta as usize;
        resolved
            .split('\n')
            .map(|line| strip_leading_ws(line, delta))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        let pad = " ".repeat((-delta) as usize);
        resolved.replace('\n', &format!("\n{}", pad))
    }
}

fn strip_leading_ws(line: &str, n: usize) -> &str {
    let mut removed = 0;
    let mut idx = 0;
    for c in line.chars() {
        if removed >= n || (c != ' ' && c != '\t') {
            break;
        }
        idx += c.len_utf8();
        removed += 1;
    }
    &line[idx..]
}
