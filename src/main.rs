use clap::{Parser, Subcommand, ValueEnum};
use pug_lexer::{
    ExpressionParser, LexError, LooseExpressions, Options, ScriptExpressions, Token, lex_with,
};
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pug-lex")]
#[command(about = "Tokenize Pug/Jade templates and print the token tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lex .pug/.jade files
    Lex {
        /// Path to a template file or directory
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Output the token tree as JSON
        #[arg(long)]
        json: bool,

        /// How embedded expressions are checked
        #[arg(long, value_enum, default_value_t = Syntax::Loose)]
        syntax: Syntax,

        /// Deepest indentation level accepted
        #[arg(long, default_value_t = pug_lexer::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Syntax {
    /// Balanced brackets and strings only
    Loose,
    /// Validate expressions as JavaScript
    Js,
}

struct Run {
    json: bool,
    syntax: Syntax,
    options: Options,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Lex {
            file,
            stdin,
            json,
            syntax,
            max_depth,
        } => {
            let run = Run {
                json,
                syntax,
                options: Options { max_depth },
            };
            if stdin {
                lex_stdin(&run);
            } else if let Some(path) = file {
                lex_path(&path, &run);
            } else {
                eprintln!("Error: provide a file/directory or use --stdin");
                std::process::exit(1);
            }
        }
    }
}

/// Log to stderr only when `RUST_LOG` is set
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn lex_stdin(run: &Run) {
    let mut source = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error: failed to read stdin: {}", err);
        std::process::exit(1);
    }
    if !lex_source(&source, "<stdin>", run) {
        std::process::exit(1);
    }
}

fn lex_path(path: &Path, run: &Run) {
    let start = Instant::now();
    if path.is_file() {
        if !is_template(path) {
            eprintln!("Error: {} is not a .pug or .jade file", path.display());
            std::process::exit(1);
        }
        let ok = lex_file(path, run);
        print_summary(1, usize::from(!ok), start.elapsed());
        if !ok {
            std::process::exit(1);
        }
    } else if path.is_dir() {
        lex_directory(path, run);
    } else {
        eprintln!("Error: {} does not exist", path.display());
        std::process::exit(1);
    }
}

fn lex_directory(dir: &Path, run: &Run) {
    let start = Instant::now();
    let mut file_count = 0;
    let mut failures = 0;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| is_template(e.path()))
    {
        file_count += 1;
        if !lex_file(entry.path(), run) {
            failures += 1;
        }
    }

    if file_count == 0 {
        eprintln!("No .pug or .jade files found in {}", dir.display());
        std::process::exit(1);
    }

    print_summary(file_count, failures, start.elapsed());
    if failures > 0 {
        std::process::exit(1);
    }
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "pug" || ext == "jade")
}

fn lex_file(path: &Path, run: &Run) -> bool {
    match fs::read_to_string(path) {
        Ok(source) => lex_source(&source, &path.display().to_string(), run),
        Err(err) => {
            eprintln!("Error: failed to read {}: {}", path.display(), err);
            false
        }
    }
}

/// Lex one buffer and print the tree; returns false on a lex error
fn lex_source(source: &str, name: &str, run: &Run) -> bool {
    let result = match run.syntax {
        Syntax::Loose => lex_and_print(source, LooseExpressions, run),
        Syntax::Js => match ScriptExpressions::new() {
            Ok(exprs) => lex_and_print(source, exprs, run),
            Err(err) => {
                eprintln!("Error: failed to load the JavaScript grammar: {}", err);
                std::process::exit(1);
            }
        },
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            print_error(name, source, &err);
            false
        }
    }
}

fn lex_and_print<P>(source: &str, exprs: P, run: &Run) -> Result<(), LexError>
where
    P: ExpressionParser,
    P::Expr: Serialize,
{
    let root = lex_with(source, exprs, &run.options)?;
    if run.json {
        print_json(&root);
    } else {
        print!("{}", root.dump());
    }
    Ok(())
}

fn print_json<E: Serialize>(root: &Token<'_, E>) {
    match serde_json::to_string(root) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("Error: failed to serialize tokens: {}", err);
            std::process::exit(1);
        }
    }
}

fn print_error(name: &str, source: &str, err: &LexError) {
    let is_tty = io::stderr().is_terminal();
    let loc = err.location(source);
    if is_tty {
        eprintln!("\x1b[1m{}:{}:{}\x1b[0m", name, loc.line, loc.col);
        eprint!("{}", err.render_color(source));
    } else {
        eprintln!("{}:{}:{}", name, loc.line, loc.col);
        eprint!("{}", err.render(source));
    }
}

fn print_summary(count: usize, failures: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };
    let failed = if failures > 0 {
        format!(", {} failed", failures)
    } else {
        String::new()
    };

    if is_tty {
        eprintln!("\n\x1b[1mLexed {} {}{} in {}\x1b[0m", count, files_word, failed, time_str);
    } else {
        eprintln!("\nLexed {} {}{} in {}", count, files_word, failed, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
