//! callsift CLI - classify calls, build call graphs and rewrite Go sources

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use callsift::calls::{CallKind, Diagnostic};
use callsift::graph::parse_filter;
use callsift::rewrite::{load_rules, FormatCallRule, FormatRuleConfig, RewriteRule};
use callsift::{Error, Workspace};
use callsift_ast::{FileId, Span};
use callsift_parser::parse;

#[derive(Parser)]
#[command(name = "callsift")]
#[command(about = "Call classification, call graphs and type-aware rewrites for Go", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Inputs {
    /// Go files or directories containing them
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Import path prefix for non-main packages
    #[arg(long)]
    module: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and output the syntax tree as JSON
    Parse {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Classify every call expression
    Classify {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Build the call graph and list its edges
    Graph {
        #[command(flatten)]
        inputs: Inputs,
        /// Only list edges matching this filter, e.g. "caller:main.run kind:instance-method"
        #[arg(long = "match")]
        filter: Option<String>,
        /// Print the shortest call path between two functions
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
        path: Option<Vec<String>>,
    },
    /// Rewrite formatting calls
    Rewrite {
        #[command(flatten)]
        inputs: Inputs,
        /// JSON rule file; defaults to fmt.Println -> fmt.Printf
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Write the rewritten files back
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("CALLSIFT_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let ok = match cli.command {
        Commands::Parse { file, pretty } => cmd_parse(&file, pretty),
        Commands::Classify { inputs } => cmd_classify(&inputs),
        Commands::Graph {
            inputs,
            filter,
            path,
        } => cmd_graph(&inputs, filter.as_deref(), path.as_deref()),
        Commands::Rewrite {
            inputs,
            rules,
            write,
        } => cmd_rewrite(&inputs, rules.as_deref(), write),
    };
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_parse(file: &Path, pretty: bool) -> bool {
    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            return false;
        }
    };
    let name = file.display().to_string();
    match parse(&source, &name, FileId(0)) {
        Ok(unit) => {
            let json = if pretty {
                serde_json::to_string_pretty(&unit)
            } else {
                serde_json::to_string(&unit)
            };
            match json {
                Ok(json) => {
                    println!("{}", json);
                    true
                }
                Err(e) => {
                    eprintln!("Error serializing {}: {}", name, e);
                    false
                }
            }
        }
        Err(e) => {
            report_error(&name, &source, e.span(), &e.to_string());
            false
        }
    }
}

fn cmd_classify(inputs: &Inputs) -> bool {
    let Some(mut workspace) = load(inputs) else {
        return false;
    };
    let units = match workspace.classify() {
        Ok(units) => units,
        Err(e) => return fail(&workspace, &e),
    };

    if inputs.json {
        let value: Vec<serde_json::Value> = units
            .iter()
            .map(|u| {
                serde_json::json!({
                    "file": u.name,
                    "sites": u.classification.sites,
                    "diagnostics": u.classification.diagnostics,
                })
            })
            .collect();
        return print_json(&value);
    }

    for unit in &units {
        let Some(syntax) = workspace.unit(unit.file) else {
            continue;
        };
        for site in &unit.classification.sites {
            let (line, col) = line_col(&syntax.source, site.span.start);
            let detail = match (site.kind, site.reason) {
                (CallKind::Unknown, Some(reason)) => reason.describe().to_string(),
                _ => site
                    .chain
                    .as_ref()
                    .map(|c| c.display())
                    .unwrap_or_default(),
            };
            println!(
                "{}:{}:{}\t{}\t{}\t{}",
                unit.name,
                line,
                col,
                site.kind.name(),
                syntax.snippet(site.span),
                detail
            );
        }
        report_diagnostics(&workspace, &unit.classification.diagnostics);
    }
    true
}

fn cmd_graph(inputs: &Inputs, filter: Option<&str>, path: Option<&[String]>) -> bool {
    let filter = match filter.map(parse_filter) {
        Some(None) => {
            eprintln!("Invalid edge filter");
            return false;
        }
        Some(filter) => filter,
        None => None,
    };
    let Some(mut workspace) = load(inputs) else {
        return false;
    };
    let build = match workspace.call_graph() {
        Ok(build) => build,
        Err(e) => return fail(&workspace, &e),
    };
    let graph = &build.graph;

    if let Some([from, to]) = path {
        let find = |name: &str| graph.nodes().find(|(_, n)| n.func.to_string() == *name).map(|(id, _)| id);
        let (Some(from_id), Some(to_id)) = (find(from.as_str()), find(to.as_str())) else {
            eprintln!("Unknown function: expected names like main.run or (*main.T).M");
            return false;
        };
        match graph.shortest_path(from_id, to_id) {
            Some(path) => {
                let names: Vec<String> = path
                    .into_iter()
                    .filter_map(|id| graph.func(id).map(|f| f.to_string()))
                    .collect();
                println!("{}", names.join(" --> "));
            }
            None => println!("No path from {} to {}", from, to),
        }
        return true;
    }

    if inputs.json {
        return print_json(&graph.export());
    }
    for line in graph.edge_listing(filter.as_ref()) {
        println!("{}", line);
    }
    report_diagnostics(&workspace, &build.diagnostics);
    eprintln!(
        "{} functions, {} edges from {} call sites",
        graph.node_count(),
        graph.edge_count(),
        build.sites
    );
    true
}

fn cmd_rewrite(inputs: &Inputs, rules: Option<&Path>, write: bool) -> bool {
    let configs = match rules {
        Some(path) => match load_rules(path) {
            Ok(configs) => configs,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                return false;
            }
        },
        None => vec![FormatRuleConfig::default()],
    };
    let rules: Vec<FormatCallRule> = match configs
        .into_iter()
        .map(FormatCallRule::new)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error: {}", e);
            return false;
        }
    };
    let rules: Vec<&dyn RewriteRule> = rules.iter().map(|r| r as &dyn RewriteRule).collect();

    let Some(mut workspace) = load(inputs) else {
        return false;
    };
    let report = match workspace.rewrite(&rules) {
        Ok(report) => report,
        Err(e) => return fail(&workspace, &e),
    };

    if inputs.json {
        if !print_json(&report) {
            return false;
        }
    } else {
        for file in &report.files {
            for change in &file.outcome.changes {
                println!("{}: {} -> {}\t[{}]", file.name, change.before, change.after, change.rule);
            }
        }
    }
    for file in &report.files {
        report_diagnostics(&workspace, &file.outcome.diagnostics);
    }

    if write {
        let changed: Vec<&str> = report
            .files
            .iter()
            .filter(|f| f.outcome.rewritten > 0)
            .map(|f| f.name.as_str())
            .collect();
        for (name, text) in workspace.render() {
            if !changed.contains(&name.as_str()) {
                continue;
            }
            if let Err(e) = fs::write(&name, text) {
                eprintln!("Error writing {}: {}", name, e);
                return false;
            }
        }
    }
    eprintln!("{} call(s) rewritten", report.rewritten());
    true
}

/// Parse every input into a workspace, reporting syntax errors
fn load(inputs: &Inputs) -> Option<Workspace> {
    let mut workspace = match &inputs.module {
        Some(module) => Workspace::with_module(module.clone()),
        None => Workspace::new(),
    };
    let mut ok = true;
    for path in go_files(&inputs.paths) {
        let source = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                ok = false;
                continue;
            }
        };
        let name = path.display().to_string();
        match workspace.add_source(name.clone(), &source) {
            Ok(_) => {}
            Err(Error::Syntax { source: err, .. }) => {
                report_error(&name, &source, err.span(), &err.to_string());
                ok = false;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ok = false;
            }
        }
    }
    ok.then_some(workspace)
}

/// Expand directories to the `.go` files beneath them, in a stable order
fn go_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("go")),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn fail(workspace: &Workspace, error: &Error) -> bool {
    let located = match error {
        Error::TypeCheck(e) => e.location(),
        _ => None,
    };
    match located.and_then(|(file, span)| workspace.unit(file).map(|u| (u, span))) {
        Some((unit, span)) => report_error(&unit.name, &unit.source, span, &error.to_string()),
        None => eprintln!("Error: {}", error),
    }
    false
}

fn report_error(name: &str, source: &str, span: Span, message: &str) {
    let printed = Report::build(ReportKind::Error, name.to_string(), span.start)
        .with_message(message)
        .with_label(
            Label::new((name.to_string(), span.start..span.end))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name.to_string(), Source::from(source)));
    if printed.is_err() {
        eprintln!("{}: {}", name, message);
    }
}

fn report_diagnostics(workspace: &Workspace, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let Some(unit) = workspace.unit(diagnostic.file) else {
            eprintln!("{}", diagnostic.format_simple());
            continue;
        };
        let span = diagnostic.span;
        let mut report = Report::build(ReportKind::Warning, unit.name.clone(), span.start)
            .with_code(diagnostic.code)
            .with_message(diagnostic.message())
            .with_label(
                Label::new((unit.name.clone(), span.start..span.end))
                    .with_message(&diagnostic.explanation)
                    .with_color(Color::Yellow),
            );
        for related in &diagnostic.related {
            report = report.with_label(
                Label::new((unit.name.clone(), related.span.start..related.span.end))
                    .with_message(&related.label)
                    .with_color(Color::Blue),
            );
        }
        if report
            .finish()
            .eprint((unit.name.clone(), Source::from(unit.source.as_str())))
            .is_err()
        {
            eprintln!("{}", diagnostic.format_simple());
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            false
        }
    }
}

/// 1-based line and column of a byte offset
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let col = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    (line, col)
}
