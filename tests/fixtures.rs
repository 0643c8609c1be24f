//! Fixture suite: every `fixtures/ok/*.pug` must lex, and every
//! `fixtures/errors/<kind>.pug` must fail with the error kind whose slug
//! matches the file stem.
//!
//! Run with: cargo test --test fixtures

use libtest_mimic::{Arguments, Failed, Trial};
use std::fs;
use std::path::{Path, PathBuf};

fn collect(pattern: &str) -> Vec<PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let pattern = root.join(pattern);
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .filter_map(Result::ok)
        .collect();
    files.sort();
    files
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn check_ok(path: &Path) -> Result<(), Failed> {
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match pug_lexer::lex(&source) {
        Ok(root) if root.children.is_empty() => Err("no lines produced".into()),
        Ok(_) => Ok(()),
        Err(err) => Err(format!("unexpected error:\n{}", err.render(&source)).into()),
    }
}

fn check_error(path: &Path) -> Result<(), Failed> {
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let expected = stem(path);
    match pug_lexer::lex(&source) {
        Ok(root) => Err(format!("expected {}, but lexing succeeded:\n{}", expected, root.dump()).into()),
        Err(err) if err.kind.slug() == expected => Ok(()),
        Err(err) => Err(format!(
            "expected {}, got {}:\n{}",
            expected,
            err.kind.slug(),
            err.render(&source)
        )
        .into()),
    }
}

fn main() {
    let args = Arguments::from_args();

    let mut trials = Vec::new();
    for path in collect("ok/*.pug") {
        let name = format!("ok::{}", stem(&path));
        trials.push(Trial::test(name, move || check_ok(&path)));
    }
    for path in collect("errors/*.pug") {
        let name = format!("errors::{}", stem(&path));
        trials.push(Trial::test(name, move || check_error(&path)));
    }

    libtest_mimic::run(&args, trials).exit();
}
