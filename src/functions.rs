use chrono::Local;

use crate::error::CompileError;
use crate::git;

/// `project.current.*` is process-wide in the original but threaded
/// explicitly here (spec §9: "avoids module-level mutable state"). The
/// project driver sets it before compiling each (schema, template) pair.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    pub project: Option<String>,
    pub schema: Option<String>,
    pub template: Option<String>,
}

/// The fixed, nested namespace of built-in functions reachable through `%%`
/// (spec §4.6).
#[derive(Debug, Default)]
pub struct FunctionRegistry;

const KNOWN_FUNCTIONS: &[&str] = &[
    "date.now",
    "git.name",
    "git.email",
    "git.remote",
    "str.upper",
    "str.lower",
    "str.camel",
    "str.snake",
    "project.current.project",
    "project.current.schema",
    "project.current.template",
];

/// Functions whose `{{ ... }}` body is schema-directive text that must be
/// compiled before it is handed over as an argument, rather than read
/// verbatim. `date.now`'s expansion is a raw strftime format string and is
/// the deliberate exception (spec §4.6).
pub fn takes_compiled_argument(path: &[String]) -> bool {
    matches!(
        path.join(".").as_str(),
        "str.upper" | "str.lower" | "str.camel" | "str.snake"
    )
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry
    }

    /// Calls the function named by `path`, with `expansion` as its argument
    /// body where applicable. For `str.*`, the caller has already compiled
    /// `expansion` (see `takes_compiled_argument`); for `date.now` it is the
    /// raw format string. An unknown name is the one hard error this
    /// registry can raise (spec §4.6, §7).
    pub fn call(
        &self,
        path: &[String],
        expansion: Option<&str>,
        ctx: &CompileContext,
    ) -> Result<String, CompileError> {
        let joined = path.join(".");
        match joined.as_str() {
            "date.now" => Ok(date_now(expansion)),
            "git.name" => Ok(git::config("user.name").unwrap_or_default()),
            "git.email" => Ok(git::config("user.email").unwrap_or_default()),
            "git.remote" => Ok(git::config("remote.origin.url").unwrap_or_default()),
            "str.upper" => Ok(expansion.unwrap_or_default().to_uppercase()),
            "str.lower" => Ok(expansion.unwrap_or_default().to_lowercase()),
            "str.camel" => Ok(str_camel(expansion.unwrap_or_default())),
            "str.snake" => Ok(expansion.unwrap_or_default().replace(' ', "_")),
            "project.current.project" => Ok(ctx.project.clone().unwrap_or_default()),
            "project.current.schema" => Ok(ctx.schema.clone().unwrap_or_default()),
            "project.current.template" => Ok(ctx.template.clone().unwrap_or_default()),
            _ => Err(CompileError::UnknownFunction {
                path: joined.clone(),
                suggestion: suggest(&joined),
            }),
        }
    }
}

fn date_now(format: Option<&str>) -> String {
    let format = format.unwrap_or("%Y-%m-%d");
    Local::now().format(format).to_string()
}

fn str_camel(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Suggests an alternative at the same namespace depth for a misspelled
/// function path (spec §4.6: "suggests alternatives at the same depth").
fn suggest(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('.').collect();
    let prefix = &segments[..segments.len().saturating_sub(1)];

    KNOWN_FUNCTIONS
        .iter()
        .filter(|candidate| {
            let candidate_segments: Vec<&str> = candidate.split('.').collect();
            candidate_segments.len() == segments.len()
                && candidate_segments[..candidate_segments.len().saturating_sub(1)] == *prefix
        })
        .min_by_key(|candidate| {
            let last = candidate.rsplit('.').next().unwrap_or(candidate);
            edit_distance(last, segments.last().unwrap_or(&""))
        })
        .map(|s| s.to_string())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = cur;
        }
    }
    row[b.len()]
}
