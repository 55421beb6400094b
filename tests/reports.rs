use serde_json::Value;
use shakedown::checker::{CompilerOptions, Program};
use shakedown::core::{ProjectAnalysisResult, ProjectAnalyzer, TreeShaker, TreeShakingResult};
use shakedown::reporters::{
    find_largest_symbols, impact_analysis, AdjacencyReporter, DotReporter, JsonReporter,
    MarkdownReporter, TextReporter,
};
use shakedown::AnalysisError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_project(dir: &TempDir, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, code)| {
            let path = dir.path().join(name);
            fs::write(&path, code).unwrap();
            path
        })
        .collect()
}

fn analyze(dir: &TempDir) -> (ProjectAnalysisResult, TreeShakingResult) {
    let roots = write_project(
        dir,
        &[
            (
                "util.ts",
                r#"
export function used() { return 1; }
export function orphan() { return 2; }
"#,
            ),
            (
                "main.ts",
                "import { used } from './util';\nexport function entry() { return used(); }\n",
            ),
        ],
    );
    let program = Program::load(&roots, CompilerOptions::default()).unwrap();
    let analysis = ProjectAnalyzer::new().analyze(&program).unwrap();
    let shake = TreeShaker::new().shake(&analysis, &["main:entry".to_string()]);
    (analysis, shake)
}

#[test]
fn json_report_carries_the_stable_key_set() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let rendered = JsonReporter::new()
        .with_timestamp("2026-01-01T00:00:00+00:00".to_string())
        .format(&analysis, &shake)
        .unwrap();
    let value: Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(value["timestamp"], "2026-01-01T00:00:00+00:00");
    assert_eq!(value["entry_points"][0], "main:entry");
    assert_eq!(value["statistics"]["totalSymbols"], 3);
    assert_eq!(value["statistics"]["includedSymbols"], 2);
    assert_eq!(value["statistics"]["unusedSymbols"], 1);
    assert_eq!(value["statistics"]["removalRate"], 33.33);

    let included: Vec<&str> = value["includedSymbols"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(included, vec!["main:entry", "util:used"]);
    assert_eq!(value["unusedSymbols"][0], "util:orphan");

    let util = &value["fileAnalysis"]["util"];
    assert_eq!(util["totalSymbols"], 2);
    assert_eq!(util["includedSymbols"], 1);
    assert_eq!(util["unusedSymbols"], 1);
    assert_eq!(util["removalRate"], 50.0);
}

#[test]
fn reports_are_byte_identical_across_runs() {
    let render = || {
        let dir = TempDir::new().unwrap();
        let (analysis, shake) = analyze(&dir);
        let json = JsonReporter::new()
            .with_timestamp("2026-01-01T00:00:00+00:00".to_string())
            .format(&analysis, &shake)
            .unwrap();
        let adjacency = AdjacencyReporter::new().format(&analysis, &shake);
        (json, adjacency)
    };

    let (json_a, adjacency_a) = render();
    let (json_b, adjacency_b) = render();
    assert_eq!(json_a, json_b);
    assert_eq!(adjacency_a, adjacency_b);
}

#[test]
fn text_summary_and_detail_show_totals_and_grouping() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let summary = TextReporter::new().summary(&shake);
    assert!(summary.contains("total symbols:    3"));
    assert!(summary.contains("removal rate:     33.33%"));

    let detailed = TextReporter::new().detailed(&analysis, &shake);
    assert!(detailed.contains("Entry points"));
    assert!(detailed.contains("main:entry"));
    assert!(detailed.contains("Unused symbols"));
    assert!(detailed.contains("orphan"));
}

#[test]
fn markdown_report_renders_headings_and_tables() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let markdown = MarkdownReporter::new().format(&analysis, &shake);
    assert!(markdown.starts_with("# Tree-Shaking Report"));
    assert!(markdown.contains("## Entry Points"));
    assert!(markdown.contains("| `used` | function |"));
}

#[test]
fn dot_output_colors_by_liveness_and_quotes_ids() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let dot = DotReporter::new().format(&analysis, &shake);
    assert!(dot.starts_with("digraph Dependencies {"));
    assert!(dot.contains("rankdir=LR;"));
    assert!(dot.contains("\"main:entry\" [label=\"entry\", fillcolor=lightgreen];"));
    assert!(dot.contains("\"util:orphan\" [label=\"orphan\", fillcolor=lightcoral];"));
    assert!(dot.contains("\"main:entry\" -> \"util:used\";"));
    assert!(dot.trim_end().ends_with('}'));
}

#[test]
fn dot_included_only_hides_unused_nodes() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let dot = DotReporter::new().with_included_only(true).format(&analysis, &shake);
    assert!(!dot.contains("orphan"));
    assert!(dot.contains("lightgreen"));
}

#[test]
fn dot_respects_the_node_cap() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let dot = DotReporter::new().with_max_nodes(1).format(&analysis, &shake);
    let node_lines = dot.lines().filter(|l| l.contains("[label=")).count();
    assert_eq!(node_lines, 1);
}

#[test]
fn adjacency_lists_sorted_names_with_deps_or_none() {
    let dir = TempDir::new().unwrap();
    let (analysis, shake) = analyze(&dir);

    let adjacency = AdjacencyReporter::new().format(&analysis, &shake);
    let lines: Vec<&str> = adjacency.lines().collect();
    assert_eq!(
        lines,
        vec![
            "entry",
            "  util:used",
            "orphan",
            "  (none)",
            "used",
            "  (none)",
        ]
    );
}

#[test]
fn missing_entry_points_are_retained_and_flagged() {
    let dir = TempDir::new().unwrap();
    let roots = write_project(&dir, &[("only.ts", "export const x = 1;\n")]);
    let program = Program::load(&roots, CompilerOptions::default()).unwrap();
    let analysis = ProjectAnalyzer::new().analyze(&program).unwrap();

    let shake = TreeShaker::new().shake(&analysis, &["ghost:phantom".to_string()]);
    assert_eq!(shake.missing_entry_points, vec!["ghost:phantom".to_string()]);
    assert!(shake.included.contains("ghost:phantom"));
    assert!(shake.unused.contains("only:x"));

    let detailed = TextReporter::new().detailed(&analysis, &shake);
    assert!(detailed.contains("ghost:phantom (missing)"));
}

#[test]
fn impact_analysis_walks_reverse_edges() {
    let dir = TempDir::new().unwrap();
    let (analysis, _) = analyze(&dir);

    let impact = impact_analysis(&analysis.table, "util:used").unwrap();
    assert_eq!(impact.direct_dependents, vec!["main:entry".to_string()]);
    assert_eq!(impact.all_dependents, vec!["main:entry".to_string()]);
    assert_eq!(impact.count, 1);

    let err = impact_analysis(&analysis.table, "util:ghost").unwrap_err();
    assert!(matches!(err, AnalysisError::MissingEntryPoint { .. }));
}

#[test]
fn largest_symbols_rank_by_dependency_count_with_id_ties() {
    let dir = TempDir::new().unwrap();
    let (analysis, _) = analyze(&dir);

    let ranked = find_largest_symbols(&analysis.table, 2);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0], ("main:entry".to_string(), 1));
    // Zero-dependency symbols tie; the smaller id wins.
    assert_eq!(ranked[1], ("util:orphan".to_string(), 0));
}
