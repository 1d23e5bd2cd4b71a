/// Play: interactive shell for reading an adventure in the terminal.
///
/// Usage: play <adventure.ron> [--save-dir <dir>] [--debug] [--fresh]
///
/// Commands:
///   <n>        take choice number n
///   start      leave the introduction
///   restart    forget progress and begin again
///   inventory  list carried items
///   debug      toggle target ids on choice labels
///   help       list commands
///   quit       exit

use adventure_engine::core::format;
use adventure_engine::core::interpreter::PlayState;
use adventure_engine::core::progress::{FileProgressStore, ProgressStore};
use adventure_engine::core::session::{PlaySession, SessionConfig, SessionError};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SAVE_DIR: &str = ".adventure-saves";

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
        print_usage();
        return;
    }

    let adventure_path = PathBuf::from(&args[1]);
    let mut save_dir = std::env::var("ADVENTURE_SAVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SAVE_DIR));
    let mut debug = false;
    let mut fresh = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--save-dir" if i + 1 < args.len() => {
                i += 1;
                save_dir = PathBuf::from(&args[i]);
            }
            "--debug" => debug = true,
            "--fresh" => fresh = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let adventure = match format::load_from_file(&adventure_path) {
        Ok(adventure) => adventure,
        Err(e) => {
            eprintln!("ERROR: Failed to load '{}': {}", adventure_path.display(), e);
            std::process::exit(1);
        }
    };

    let mut store = match FileProgressStore::open(&save_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("ERROR: Cannot use save directory '{}': {}", save_dir.display(), e);
            std::process::exit(1);
        }
    };

    let adventure_id = adventure_id_for(&adventure_path);
    if fresh {
        if let Err(e) = store.clear(&adventure_id) {
            eprintln!("WARNING: could not clear saved progress: {}", e);
        }
    }

    let config = SessionConfig::builder().debug_mode(debug).build();
    let mut session = match PlaySession::open(&adventure, adventure_id, store, config) {
        Ok(session) => session,
        Err(SessionError::Invalid(report)) => {
            eprintln!("ERROR: '{}' is not playable:", adventure_path.display());
            eprint!("{}", report);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== {} ===\n", adventure.title());
    for warning in session.warnings() {
        println!("(warning: {})", warning);
    }
    render(&session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let warnings_before = session.warnings().len();
        let result = match line.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                continue;
            }
            "inventory" | "inv" | "i" => {
                println!("Inventory: {}", session.inventory_summary());
                continue;
            }
            "debug" => {
                let enabled = !session.config().debug_mode;
                session.set_debug_mode(enabled);
                println!("Debug mode {}.", if enabled { "on" } else { "off" });
                continue;
            }
            "start" | "s" => session.start().map(|_| ()),
            "restart" | "r" => session.restart().map(|_| ()),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 && n <= session.choice_labels().len() => {
                    session.choose(n - 1).map(|_| ())
                }
                Ok(_) => {
                    println!("No such choice.");
                    continue;
                }
                Err(_) => {
                    println!("Unknown command: {} (type 'help')", other);
                    continue;
                }
            },
        };

        match result {
            Ok(()) => {
                for warning in &session.warnings()[warnings_before..] {
                    println!("(warning: {})", warning);
                }
                render(&session);
            }
            Err(e) => println!("Cannot do that: {}", e),
        }
    }
}

fn adventure_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "adventure".to_string())
}

fn render<S: ProgressStore>(session: &PlaySession<'_, S>) {
    match session.state() {
        PlayState::Introduction => {
            for paragraph in &session.adventure().introduction.paragraphs {
                println!("{}\n", paragraph);
            }
            println!("(type 'start' to begin)");
        }
        PlayState::InPassage(_) => {
            if let Some(passage) = session.current_passage() {
                for paragraph in &passage.paragraphs {
                    println!("{}\n", paragraph);
                }
            }
            for (i, label) in session.choice_labels().iter().enumerate() {
                println!("  {}. {}", i + 1, label);
            }
        }
        PlayState::Ended { ending_type, .. } => {
            if let Some(passage) = session.current_passage() {
                for paragraph in &passage.paragraphs {
                    println!("{}\n", paragraph);
                }
            }
            println!("*** The End ({}) ***", ending_type);
            println!("Inventory: {}", session.inventory_summary());
            println!("(type 'restart' to play again)");
        }
    }
}

fn print_usage() {
    println!("Usage: play <adventure.ron> [--save-dir <dir>] [--debug] [--fresh]");
    println!("  --save-dir <dir>  where progress is kept (default: $ADVENTURE_SAVE_DIR or {})", DEFAULT_SAVE_DIR);
    println!("  --debug           show target passage ids on choices");
    println!("  --fresh           discard saved progress before starting");
}

fn print_help() {
    println!("Commands:");
    println!("  <n>        take choice number n");
    println!("  start      leave the introduction");
    println!("  restart    forget progress and begin again");
    println!("  inventory  list carried items");
    println!("  debug      toggle target ids on choice labels");
    println!("  help       this list");
    println!("  quit       exit");
}
