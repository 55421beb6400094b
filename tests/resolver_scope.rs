use shakedown::checker::{CompilerOptions, Program};
use shakedown::core::SymbolExtractor;
use std::fs;
use tempfile::TempDir;

fn extract_with(
    name: &str,
    code: &str,
    options: CompilerOptions,
) -> shakedown::core::FileSymbols {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, code).unwrap();

    let program = Program::load(&[path], options).unwrap();
    SymbolExtractor::new(&program).extract(0).unwrap()
}

fn extract(name: &str, code: &str) -> shakedown::core::FileSymbols {
    extract_with(name, code, CompilerOptions::default())
}

#[test]
fn shadowed_names_are_not_dependencies() {
    let record = extract(
        "shadow.ts",
        r#"
export const value = 42;
export function reader(value: number) { return value; }
export function local() { const value = 1; return value; }
export function user() { return value; }
"#,
    );

    let reader = record.exports.get("reader").unwrap();
    assert!(reader.dependencies.is_empty(), "got {:?}", reader.dependencies);

    let local = record.exports.get("local").unwrap();
    assert!(local.dependencies.is_empty(), "got {:?}", local.dependencies);

    // An unshadowed use still counts.
    let user = record.exports.get("user").unwrap();
    assert!(user.dependencies.contains("shadow:value"));
}

#[test]
fn inner_function_names_shadow_top_level_symbols() {
    let record = extract(
        "inner.ts",
        r#"
export function helper() { return 1; }
export function outer() {
  function helper() { return 2; }
  return helper();
}
"#,
    );

    let outer = record.exports.get("outer").unwrap();
    assert!(outer.dependencies.is_empty(), "got {:?}", outer.dependencies);
}

#[test]
fn member_access_properties_never_become_dependencies() {
    let record = extract(
        "members.ts",
        r#"
export const x = 99;
export function pick(obj: { x: number }) { return obj.x; }
"#,
    );

    let pick = record.exports.get("pick").unwrap();
    assert!(!pick.dependencies.iter().any(|d| d.ends_with(":x")));
    assert!(pick.dependencies.is_empty());
}

#[test]
fn recursion_is_not_a_self_dependency() {
    let record = extract(
        "recur.ts",
        r#"
export function fact(n: number): number { return n <= 1 ? 1 : n * fact(n - 1); }
export const loop = (n: number) => (n > 0 ? loop(n - 1) : 0);
"#,
    );

    let fact = record.exports.get("fact").unwrap();
    assert!(fact.dependencies.is_empty(), "got {:?}", fact.dependencies);

    let looped = record.exports.get("loop").unwrap();
    assert!(looped.dependencies.is_empty(), "got {:?}", looped.dependencies);
}

#[test]
fn type_annotations_do_not_count_for_value_symbols_by_default() {
    let record = extract(
        "types.ts",
        r#"
export interface Config { retries: number }
export function run(config: Config): Config { return config; }
"#,
    );

    let run = record.exports.get("run").unwrap();
    assert!(run.dependencies.is_empty(), "got {:?}", run.dependencies);
}

#[test]
fn type_annotations_count_when_type_following_is_enabled() {
    let record = extract_with(
        "types.ts",
        r#"
export interface Config { retries: number }
export function run(config: Config): Config { return config; }
"#,
        CompilerOptions {
            follow_type_only_imports: true,
            ..Default::default()
        },
    );

    let run = record.exports.get("run").unwrap();
    assert!(run.dependencies.contains("types:Config"));
}

#[test]
fn value_position_use_of_a_class_counts() {
    let record = extract(
        "classes.ts",
        r#"
export class Widget { render() { return ''; } }
export function build(): unknown { return new Widget(); }
"#,
    );

    let build = record.exports.get("build").unwrap();
    assert!(build.dependencies.contains("classes:Widget"));
}

#[test]
fn interfaces_trace_their_own_type_references() {
    let record = extract(
        "model.ts",
        r#"
export interface Base { id: number }
export interface Extended extends Base { label: Tag }
export type Tag = string;
"#,
    );

    let extended = record.exports.get("Extended").unwrap();
    assert!(extended.dependencies.contains("model:Base"));
    assert!(extended.dependencies.contains("model:Tag"));

    // The declarations themselves never point back at their own id.
    assert!(!extended.dependencies.contains("model:Extended"));
}

#[test]
fn system_globals_are_filtered_unless_requested() {
    let code = r#"
export function log(message: string) { console.log(message); }
"#;

    let silent = extract("sys.ts", code);
    let log = silent.exports.get("log").unwrap();
    assert!(log.dependencies.is_empty(), "got {:?}", log.dependencies);

    let record = extract_with(
        "sys.ts",
        code,
        CompilerOptions {
            include_system_symbols: true,
            ..Default::default()
        },
    );
    let log = record.exports.get("log").unwrap();
    assert!(log.dependencies.contains("lib:console"));
}

#[test]
fn third_party_imports_are_filtered_unless_requested() {
    let code = r#"
import { render } from 'preact';
export function mount() { return render(); }
"#;

    let silent = extract("ui.ts", code);
    let mount = silent.exports.get("mount").unwrap();
    assert!(mount.dependencies.is_empty(), "got {:?}", mount.dependencies);

    let record = extract_with(
        "ui.ts",
        code,
        CompilerOptions {
            include_node_modules: true,
            ..Default::default()
        },
    );
    let mount = record.exports.get("mount").unwrap();
    assert!(mount.dependencies.contains("preact:render"));
}

#[test]
fn dependency_sets_are_idempotent_over_repeated_uses() {
    let record = extract(
        "repeat.ts",
        r#"
export function twice() { return 2; }
export function caller() { return twice() + twice() + twice(); }
"#,
    );

    let caller = record.exports.get("caller").unwrap();
    assert_eq!(caller.dependencies.len(), 1);
}
