/// Playtest: seeded random walks through an adventure.
///
/// Usage: playtest <adventure.ron> [--runs <n>] [--seed <n>] [--max-steps <n>]
use adventure_engine::core::format;
use adventure_engine::core::playtest::Playtester;
use adventure_engine::core::validator::validate;
use std::env;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: playtest <adventure.ron> [--runs <n>] [--seed <n>] [--max-steps <n>]";

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adventure_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut tester = Playtester::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" if i + 1 < args.len() => {
                i += 1;
                tester.runs = parse_number(&args[i], "--runs");
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                tester.seed = parse_number(&args[i], "--seed");
            }
            "--max-steps" if i + 1 < args.len() => {
                i += 1;
                tester.max_steps = parse_number(&args[i], "--max-steps");
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other if !other.starts_with("--") && input.is_none() => {
                input = Some(other.to_string());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: an adventure file is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let adventure = format::load_from_file(Path::new(&input_path)).unwrap_or_else(|e| {
        eprintln!("Error reading adventure '{}': {}", input_path, e);
        process::exit(1);
    });

    let report = validate(&adventure);
    if !report.is_playable() {
        eprintln!("'{}' does not pass validation:", input_path);
        eprint!("{}", report);
        process::exit(1);
    }

    println!(
        "Playing \"{}\" {} times (seed {}, at most {} steps each)...",
        adventure.title(),
        tester.runs,
        tester.seed,
        tester.max_steps
    );
    let result = tester.run(&adventure).unwrap_or_else(|e| {
        eprintln!("Error during playtest: {}", e);
        process::exit(1);
    });

    println!("\nEndings reached:");
    for (ending, count) in &result.endings {
        println!(
            "  {:<20} {:>6} ({:.1}%)",
            ending,
            count,
            100.0 * f64::from(*count) / f64::from(result.runs.max(1))
        );
    }
    if result.unfinished > 0 {
        println!("  {:<20} {:>6}", "(unfinished)", result.unfinished);
    }
    println!("Average choices per run: {:.1}", result.average_steps());

    let never_visited = result.never_visited(&adventure);
    if !never_visited.is_empty() {
        let ids: Vec<String> = never_visited.iter().map(|id| id.to_string()).collect();
        println!("Passages never visited: {}", ids.join(", "));
    }
    if !result.items_never_held.is_empty() {
        let ids: Vec<String> = result
            .items_never_held
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!("Items never held: {}", ids.join(", "));
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: {} expects a number, got '{}'", flag, value);
        process::exit(1);
    })
}
