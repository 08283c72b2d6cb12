use std::fs;
use std::path::{Path as FsPath, PathBuf};

use serde::Deserialize;

use crate::compiler::Compiler;
use crate::error::ProjectError;
use crate::functions::CompileContext;
use crate::schema::Schema;

/// One `{schema, template, out}` entry of a project file's `output` array
/// (spec §6 "Project file"). Each field is a glob-or-path string.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputEntry {
    pub schema: String,
    pub template: String,
    pub out: String,
}

/// A project descriptor: the out-of-scope driver that discovers
/// schema/template/output tuples (spec §1, §6).
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFile {
    pub output: Vec<OutputEntry>,
}

impl ProjectFile {
    pub fn load(path: impl AsRef<FsPath>) -> Result<ProjectFile, ProjectError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| ProjectError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        serde_json::from_str(&contents).map_err(|err| ProjectError::Parse {
            path: path.to_path_buf(),
            source: err,
        })
    }
}

/// One `{path, dest}` pair reserved in a schema's `__codegen__.templates`
/// key (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaTemplateEntry {
    pub path: String,
    pub dest: String,
}

/// Reads `__codegen__.templates` off a schema root, if present, as a
/// secondary source of (template, destination) output pairs.
pub fn schema_declared_templates(schema: &Schema) -> Vec<SchemaTemplateEntry> {
    schema
        .root()
        .get("__codegen__.templates")
        .and_then(|v| serde_json::from_value::<Vec<SchemaTemplateEntry>>(v.clone()).ok())
        .unwrap_or_default()
}

/// A single produced artifact: the destination path and compiled content, so
/// the caller decides how to persist it (write to disk, print to stdout).
pub struct Output {
    pub dest: PathBuf,
    pub contents: String,
}

/// Drives a project file: glob-expands `schema`/`template`, pairs them up,
/// expands `out` itself through the template engine against each matched
/// schema, and compiles a fresh `Compiler` per pair (spec §5, §6).
pub fn run_project(project: &ProjectFile, base_dir: &FsPath) -> Result<Vec<Output>, ProjectError> {
    let mut outputs = Vec::new();

    for entry in &project.output {
        let schema_paths = expand_glob(base_dir, &entry.schema);
        let template_paths = expand_glob(base_dir, &entry.template);

        for schema_path in &schema_paths {
            let schema = Schema::load(schema_path).map_err(crate::error::CompileError::from)?;
            let include_root = schema_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| base_dir.to_path_buf());

            for template_path in &template_paths {
                let template_contents = fs::read_to_string(template_path).map_err(|err| {
                    ProjectError::Read {
                        path: template_path.clone(),
                        source: err,
                    }
                })?;

                let ctx = CompileContext {
                    project: Some(entry.schema.clone()),
                    schema: Some(schema_path.display().to_string()),
                    template: Some(template_path.display().to_string()),
                };

                let mut compiler = Compiler::new(schema.clone(), include_root.clone(), ctx.clone());
                let dest_template = compiler
                    .compile(&entry.out)
                    .map_err(ProjectError::Compile)?;

                let mut out_compiler = Compiler::new(schema.clone(), include_root.clone(), ctx);
                let contents = out_compiler
                    .compile(&template_contents)
                    .map_err(ProjectError::Compile)?;

                outputs.push(Output {
                    dest: base_dir.join(dest_template),
                    contents,
                });
            }

            for declared in schema_declared_templates(&schema) {
                let template_path = base_dir.join(&declared.path);
                let template_contents = fs::read_to_string(&template_path).map_err(|err| {
                    ProjectError::Read {
                        path: template_path.clone(),
                        source: err,
                    }
                })?;
                let ctx = CompileContext {
                    project: Some(entry.schema.clone()),
                    schema: Some(schema_path.display().to_string()),
                    template: Some(template_path.display().to_string()),
                };
                let mut compiler = Compiler::new(schema.clone(), include_root.clone(), ctx);
                let contents = compiler
                    .compile(&template_contents)
                    .map_err(ProjectError::Compile)?;
                outputs.push(Output {
                    dest: base_dir.join(&declared.dest),
                    contents,
                });
            }
        }
    }

    Ok(outputs)
}

fn expand_glob(base_dir: &FsPath, pattern: &str) -> Vec<PathBuf> {
    let full_pattern = base_dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy().into_owned();
    match glob::glob(&full_pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(err) => {
            log::warn!("invalid glob pattern '{}': {}", full_pattern, err);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[test]
    fn loads_a_project_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        stdfs::write(
            &path,
            r#"{"output":[{"schema":"*.json","template":"*.template","out":"out.txt"}]}"#,
        )
        .unwrap();
        let project = ProjectFile::load(&path).unwrap();
        assert_eq!(1, project.output.len());
        assert_eq!("*.json", project.output[0].schema);
    }

    #[test]
    fn malformed_project_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        stdfs::write(&path, "{not json").unwrap();
        assert!(ProjectFile::load(&path).is_err());
    }

    #[test]
    fn run_project_pairs_schema_and_template_and_expands_out() {
        let dir = tempfile::tempdir().unwrap();
        stdfs::write(dir.path().join("s.json"), r#"{"name":"widget"}"#).unwrap();
        stdfs::write(dir.path().join("t.template"), "Hello $$.name").unwrap();
        let project = ProjectFile {
            output: vec![OutputEntry {
                schema: "s.json".to_string(),
                template: "t.template".to_string(),
                // A literal suffix must avoid leading-dot word characters,
                // since those would be swallowed into the directive's path.
                out: "$$.name-out.txt".to_string(),
            }],
        };

        let outputs = run_project(&project, dir.path()).unwrap();
        assert_eq!(1, outputs.len());
        assert_eq!("Hello widget", outputs[0].contents);
        assert_eq!(dir.path().join("widget-out.txt"), outputs[0].dest);
    }

    #[test]
    fn schema_declared_templates_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("s.json");
        stdfs::write(
            &schema_path,
            r#"{"__codegen__.templates":[{"path":"t.template","dest":"out.txt"}]}"#,
        )
        .unwrap();
        let schema = Schema::load(&schema_path).unwrap();
        let declared = schema_declared_templates(&schema);
        assert_eq!(1, declared.len());
        assert_eq!("t.template", declared[0].path);
        assert_eq!("out.txt", declared[0].dest);
    }
}
