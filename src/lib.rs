pub mod cli;
pub mod compiler;
pub mod embed;
pub mod error;
pub mod functions;
pub mod git;
pub mod path;
pub mod project;
pub mod schema;
pub mod scope;
pub mod token;
pub mod value;
pub mod watcher;

pub use compiler::Compiler;
pub use error::{CompileError, ProjectError, SchemaError};
pub use functions::CompileContext;
pub use project::{run_project, Output, ProjectFile};
pub use schema::Schema;
