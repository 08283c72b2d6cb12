use std::fs;

use tmplforge::functions::CompileContext;
use tmplforge::schema::Schema;
use tmplforge::Compiler;

fn compile(schema_json: &str, template: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("s.json");
    fs::write(&schema_path, schema_json).unwrap();
    let schema = Schema::load(&schema_path).unwrap();
    let mut compiler = Compiler::new(schema, dir.path().to_path_buf(), CompileContext::default());
    compiler.compile(template).unwrap()
}

#[test]
fn scenario_a_scalar_lookup() {
    assert_eq!("hello Ada", compile(r#"{"name":"Ada"}"#, "hello $$.name"));
}

#[test]
fn scenario_b_whole_line_list_expansion() {
    let out = compile(r#"{"xs":["a","b","c"]}"#, "$$.xs {{\n- $$\n}}");
    assert_eq!("- a\n- b\n- c\n", out);
}

#[test]
fn scenario_c_slice_selection() {
    let out = compile(r#"{"xs":["a","b","c","d"]}"#, "$$.xs [[1:3]]{{$$,}}");
    assert_eq!("b,c,", out);
}

#[test]
fn scenario_d_conditional_selection() {
    let out = compile(
        r#"{"on":true}"#,
        "$$.on [[true]]{{yes}}$$.on [[false]]{{no}}",
    );
    assert_eq!("yes", out);
}

#[test]
fn scenario_e_nested_scope() {
    let out = compile(r#"{"a":{"b":"X"}}"#, "$$.a {{inside: $$.b}}");
    assert_eq!("inside: X", out);
}

#[test]
fn no_directives_round_trips() {
    let out = compile(r#"{}"#, "plain text, no directives here at all");
    assert_eq!("plain text, no directives here at all", out);
}

#[test]
fn absolute_and_relative_agree_at_root() {
    let schema = r#"{"a":{"b":"x"}}"#;
    assert_eq!(compile(schema, "$$.a.b"), compile(schema, "!!.a.b"));
}

#[test]
fn slice_selection_matches_the_out_of_range_formula() {
    // max(0, min(j, n) - max(0, i)) with n=3, i=1, j=10 -> 2
    let out = compile(r#"{"xs":["a","b","c"]}"#, "$$.xs [[1:10]]{{$$}}");
    assert_eq!("bc", out);
}

#[test]
fn missing_schema_key_is_a_soft_empty_substitution() {
    let out = compile(r#"{}"#, "before[$$.missing]after");
    assert_eq!("before[]after", out);
}

#[test]
fn unknown_function_aborts_the_compile_job() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("s.json");
    fs::write(&schema_path, "{}").unwrap();
    let schema = Schema::load(&schema_path).unwrap();
    let mut compiler = Compiler::new(schema, dir.path().to_path_buf(), CompileContext::default());
    assert!(compiler.compile("%%str.reverse {{x}}").is_err());
}

#[test]
fn include_reads_a_sibling_template_and_chomp_drops_the_final_character() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("header.template"), "Header\n").unwrap();
    fs::write(dir.path().join("s.json"), "{}").unwrap();
    let schema = Schema::load(dir.path().join("s.json")).unwrap();

    let mut compiler = Compiler::new(
        schema.clone(),
        dir.path().to_path_buf(),
        CompileContext::default(),
    );
    assert_eq!("Header\n", compiler.compile("@@header").unwrap());

    let mut chomp_compiler = Compiler::new(
        schema,
        dir.path().to_path_buf(),
        CompileContext::default(),
    );
    assert_eq!("Header", chomp_compiler.compile("@@!header").unwrap());
}

#[test]
fn schema_string_that_is_a_single_include_directive_is_transparently_replaced() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("body.template"), "Body text").unwrap();
    fs::write(dir.path().join("s.json"), r#"{"doc":"@@body"}"#).unwrap();
    let schema = Schema::load(dir.path().join("s.json")).unwrap();
    let mut compiler = Compiler::new(schema, dir.path().to_path_buf(), CompileContext::default());
    assert_eq!("Body text", compiler.compile("$$.doc").unwrap());
}

#[test]
fn indent_reflow_lines_up_nested_expansion_lines_at_the_call_site_column() {
    let out = compile(r#"{"xs":["a","b"]}"#, "$$.xs {{\n        - $$\n}}");
    assert_eq!("- a\n- b\n", out);
}
