use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shakedown::checker::{CompilerOptions, Program};
use shakedown::core::{ProjectAnalyzer, TreeShaker};
use std::path::PathBuf;

fn benchmark_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_analysis");

    let test_dir = std::env::temp_dir().join("shakedown_bench");
    std::fs::create_dir_all(&test_dir).unwrap();

    // A layered project: each module calls into the previous one, so the
    // closure from the last entry point spans every file.
    let mut roots: Vec<PathBuf> = Vec::new();
    for i in 0..40 {
        let content = if i == 0 {
            "export function step0(): number { return 0; }\n".to_string()
        } else {
            format!(
                r#"
import {{ step{prev} }} from './module_{prev}';

export function step{i}(): number {{
  return step{prev}() + {i};
}}

export function spare{i}(): number {{
  return {i};
}}
"#,
                prev = i - 1,
                i = i
            )
        };
        let path = test_dir.join(format!("module_{}.ts", i));
        std::fs::write(&path, content).unwrap();
        roots.push(path);
    }

    group.bench_function("analyze_layered_project", |b| {
        b.iter(|| {
            let program = Program::load(black_box(&roots), CompilerOptions::default()).unwrap();
            let analysis = ProjectAnalyzer::new().analyze(black_box(&program)).unwrap();
            black_box(analysis)
        });
    });

    let program = Program::load(&roots, CompilerOptions::default()).unwrap();
    let analysis = ProjectAnalyzer::new().analyze(&program).unwrap();
    let entries = vec!["module_39:step39".to_string()];

    group.bench_function("forward_closure_deep_chain", |b| {
        b.iter(|| {
            let shake = TreeShaker::new().shake(black_box(&analysis), black_box(&entries));
            black_box(shake)
        });
    });

    group.bench_function("cycle_search", |b| {
        b.iter(|| {
            let cycles = analysis.table.find_cycles();
            black_box(cycles)
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_analysis);
criterion_main!(benches);
