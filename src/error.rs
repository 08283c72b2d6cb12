use std::path::PathBuf;

use thiserror::Error;

/// Hard errors: these abort the current compile job (spec §7, "Hard error").
///
/// Soft failures (missing key, OOB index, missing include, git failure,
/// shape violation) never produce an `Err` — the compiler always returns a
/// `String` and logs a warning instead, per §4.8.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed schema JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read schema file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown function '{path}'{}", suggestion_suffix(.suggestion))]
    UnknownFunction {
        path: String,
        suggestion: Option<String>,
    },

    #[error("failed to write output {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("malformed project descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read project file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}
