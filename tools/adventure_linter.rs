/// Adventure Linter: parses and validates story documents.
///
/// Usage: adventure_linter <adventure_file_or_dir>

use adventure_engine::core::format::{self, Format};
use adventure_engine::core::progress::is_progress_file;
use adventure_engine::core::validator::{validate, Severity};
use adventure_engine::schema::adventure::Adventure;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adventure_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: adventure_linter <adventure_file_or_dir>");
        process::exit(0);
    }

    let root = Path::new(&args[1]);
    let files = if root.is_file() {
        vec![root.to_path_buf()]
    } else if root.is_dir() {
        let mut files = Vec::new();
        collect_adventures(root, &mut files);
        files.sort();
        files
    } else {
        eprintln!("ERROR: Path '{}' does not exist", root.display());
        process::exit(1);
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for path in &files {
        println!("\n=== {} ===\n", path.display());
        match format::load_from_file(path) {
            Ok(adventure) => {
                let (errors, warnings) = lint(&adventure);
                total_errors += errors;
                total_warnings += warnings;
            }
            Err(e) => {
                println!("ERROR: {}", e);
                total_errors += 1;
            }
        }
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        total_errors,
        total_warnings
    );

    if total_errors == 0 {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_adventures(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_adventures(&path, files);
            } else if Format::from_path(&path).is_some() && !is_progress_file(&path) {
                files.push(path);
            }
        }
    }
}

fn lint(adventure: &Adventure) -> (usize, usize) {
    println!(
        "\"{}\": {} passages, {} items, {} endings",
        adventure.title(),
        adventure.passages.len(),
        adventure.items.len(),
        adventure.endings().len()
    );

    let report = validate(adventure);
    if report.violations.is_empty() {
        println!("All checks passed!");
    }

    // Warnings first so errors end up nearest the summary.
    for v in report.warnings() {
        println!("WARNING: {}", v);
    }
    for v in report.errors() {
        println!("ERROR: {}", v);
    }

    let errors = report
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    (errors, report.violations.len() - errors)
}
