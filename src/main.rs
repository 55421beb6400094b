use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use shakedown::checker::{CompilerOptions, FileScanner, Program};
use shakedown::core::{ProjectAnalyzer, TreeShaker};
use shakedown::reporters::{
    find_circular_dependencies, find_largest_symbols, impact_analysis, AdjacencyReporter,
    DotReporter, JsonReporter, MarkdownReporter, TextReporter,
};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "shakedown",
    version = "0.1.0",
    author = "shakedown developers",
    about = "Whole-project symbol and dependency analyzer with tree-shaking queries"
)]
struct Cli {
    /// Directory to scan for TypeScript root files
    #[arg(short, long, value_name = "PATH", conflicts_with = "files")]
    input: Option<PathBuf>,

    /// Explicit root files (alternative to --input)
    #[arg(long, value_name = "FILE", num_args = 1..)]
    files: Vec<PathBuf>,

    /// Entry-point ids, formatted <file_key>:<name>
    #[arg(short, long, value_name = "ID")]
    entry: Vec<String>,

    /// Output file path; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also list circular dependencies
    #[arg(long)]
    cycles: bool,

    /// Reverse-closure impact analysis for one id
    #[arg(long, value_name = "ID")]
    impact: Option<String>,

    /// Show the k symbols with the most dependencies
    #[arg(long, value_name = "K")]
    largest: Option<usize>,

    /// Fail on compiler diagnostics and surface extraction warnings
    #[arg(long)]
    strict: bool,

    /// Follow dependencies into bare-specifier (third-party) modules
    #[arg(long)]
    include_node_modules: bool,

    /// Follow dependencies on standard-library globals
    #[arg(long)]
    include_system: bool,

    /// Count type-position references from value-level symbols
    #[arg(long)]
    follow_types: bool,

    /// Cap on DOT graph nodes
    #[arg(long, value_name = "N", default_value_t = 100)]
    max_nodes: usize,

    /// Restrict the DOT graph to included symbols
    #[arg(long)]
    included_only: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Text,
    Detailed,
    Json,
    Markdown,
    Dot,
    Adjacency,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();

    let root_files = match (&cli.input, cli.files.is_empty()) {
        (Some(input), _) => {
            println!("Scanning {}...", input.display());
            FileScanner::new().scan_directory(input)?
        }
        (None, false) => cli.files.clone(),
        (None, true) => anyhow::bail!("either --input or --files is required"),
    };
    println!("Found {} root file(s)", root_files.len());

    let options = CompilerOptions {
        include_system_symbols: cli.include_system,
        include_node_modules: cli.include_node_modules,
        follow_type_only_imports: cli.follow_types,
        strict: cli.strict,
    };

    let program = Program::load(&root_files, options)?;
    if !program.diagnostics().is_empty() {
        eprintln!(
            "Warning: {} syntax diagnostic(s) in input",
            program.diagnostics().len()
        );
    }

    println!("Analyzing {} file(s)...", program.file_count());
    let analysis = ProjectAnalyzer::new().analyze(&program)?;
    println!(
        "Extracted {} symbols, {} edges across {} files in {:.2}s",
        analysis.statistics.total_symbols,
        analysis.statistics.total_edges,
        analysis.statistics.total_files,
        start_time.elapsed().as_secs_f64()
    );

    let shake = TreeShaker::new().shake(&analysis, &cli.entry);
    for missing in &shake.missing_entry_points {
        eprintln!("Warning: entry point '{}' matches no symbol", missing);
    }

    let rendered = match cli.format {
        OutputFormat::Text => TextReporter::new().summary(&shake),
        OutputFormat::Detailed => TextReporter::new()
            .with_warnings(cli.strict)
            .detailed(&analysis, &shake),
        OutputFormat::Json => JsonReporter::new().format(&analysis, &shake)?,
        OutputFormat::Markdown => MarkdownReporter::new().format(&analysis, &shake),
        OutputFormat::Dot => DotReporter::new()
            .with_max_nodes(cli.max_nodes)
            .with_included_only(cli.included_only)
            .format(&analysis, &shake),
        OutputFormat::Adjacency => AdjacencyReporter::new()
            .with_locations(true)
            .format(&analysis, &shake),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            println!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    if cli.cycles {
        let cycles = find_circular_dependencies(&analysis.table);
        if cycles.is_empty() {
            println!("No circular dependencies");
        } else {
            println!("Circular dependencies:");
            for cycle in cycles {
                println!("  {}", cycle.join(" -> "));
            }
        }
    }

    if let Some(target) = &cli.impact {
        let impact = impact_analysis(&analysis.table, target)?;
        println!("Impact of {}:", impact.target);
        println!("  direct dependents: {}", impact.direct_dependents.join(", "));
        println!("  total affected:    {}", impact.count);
    }

    if let Some(k) = cli.largest {
        println!("Largest symbols by dependency count:");
        for (id, degree) in find_largest_symbols(&analysis.table, k) {
            println!("  {} ({})", id, degree);
        }
    }

    Ok(())
}
