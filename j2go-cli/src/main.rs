//! j2go: translate Java source files into readable Go.
//!
//! Diagnostics go to stderr; generated Go goes to stdout or, with
//! `--dir`, to `<dir>/<package>/<name>.go`. Translation is best-effort:
//! a file that cannot be parsed or trips an internal invariant is
//! reported and skipped, and the run continues.

use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use j2go_translate::{standard_rules, Config, Translator};

const SEP: &str = "------------";

/// Translate Java source files into Go.
#[derive(Parser)]
#[command(name = "j2go", version, about = "Translate Java source files into Go")]
struct Cli {
    /// Configuration file (PACKAGE / INTERFACE / RECEIVER directives)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable parser tracing
    #[arg(long)]
    debug: bool,

    /// Enable lexer tracing
    #[arg(long = "debug-lex")]
    debug_lex: bool,

    /// Directory where Go code is written; stdout when unset
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Dump the parse tree and program model alongside the output
    #[arg(long)]
    report: bool,

    /// Print more diagnostics
    #[arg(long, short)]
    verbose: bool,

    /// Files or directories to translate (directories walk recursively)
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if cli.paths.is_empty() {
        eprintln!("No input files");
        return ExitCode::FAILURE;
    }

    let config = Arc::new(match &cli.config {
        Some(path) => Config::from_path(path),
        None => Config::default(),
    });

    let mut translator = Translator::new(config);
    translator.verbose = cli.verbose;
    translator.debug = cli.debug;
    translator.debug_lex = cli.debug_lex;

    for path in &cli.paths {
        match fs::metadata(path) {
            Err(err) => {
                eprintln!("Bad file {}: {}", path.display(), err);
            }
            Ok(meta) if meta.is_dir() => {
                walk_directory(&translator, path, &cli);
            }
            Ok(_) => {
                process_file(&translator, path, &cli, true);
            }
        }
    }

    ExitCode::SUCCESS
}

fn walk_directory(translator: &Translator, dir: &Path, cli: &Cli) {
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                eprintln!("Cannot read {}: {}", dir.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file() {
            process_file(translator, entry.path(), cli, false);
        }
    }
}

fn process_file(translator: &Translator, path: &Path, cli: &Cli, log_unknown: bool) {
    let is_java = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("java"))
        .unwrap_or(false);

    if !is_java {
        if log_unknown {
            tracing::info!("Ignoring unknown file {}", path.display());
        }
        return;
    }

    if let Err(err) = translate_java(translator, path, cli) {
        eprintln!("Cannot translate {}: {}", path.display(), err);
    }
}

fn translate_java(translator: &Translator, path: &Path, cli: &Cli) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let out_name = convert_path_to_go(path);
    let file_name = path.display().to_string();

    // one bad file must never stop the run
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        translator.translate_source(&out_name, &file_name, &source)
    }));

    let mut program = match outcome {
        Ok(Ok(program)) => program,
        Ok(Err(err)) => {
            eprintln!("{}", err);
            return Ok(());
        }
        Err(_) => {
            eprintln!("panic in {}", file_name);
            return Ok(());
        }
    };

    program.run_rules(&standard_rules());

    if cli.report {
        println!("{} CONVERT {}", SEP, SEP);
        println!("// {}", file_name);
        println!("{} PARSE TREE {}", SEP, SEP);
        match translator.parse_sexp(&file_name, &source) {
            Ok(sexp) => println!("{}", sexp),
            Err(err) => eprintln!("{}", err),
        }
        println!("{} MODEL {}", SEP, SEP);
        print!("{}", program.debug_string());
        println!("{} GO {}", SEP, SEP);
    }

    let text = program.render();
    match &cli.dir {
        Some(dir) => write_output(dir, &program.package, &program.name, &text)?,
        None => print!("{}", text),
    }

    Ok(())
}

/// `path/to/Foo.java` -> `Foo.go`.
fn convert_path_to_go(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.java");

    let base = if name.to_lowercase().ends_with(".java") {
        &name[..name.len() - 5]
    } else {
        name
    };

    format!("{}.go", base)
}

/// Place output under `<dir>/<package>/<name>`, except that `main` (and
/// empty) packages land in `<dir>` itself.
fn write_output(dir: &Path, package: &str, name: &str, text: &str) -> Result<()> {
    let target_dir = if package.is_empty() || package == "main" {
        dir.to_path_buf()
    } else {
        dir.join(package)
    };

    fs::create_dir_all(&target_dir)
        .with_context(|| format!("creating {}", target_dir.display()))?;

    let out_path = target_dir.join(name);
    fs::write(&out_path, text).with_context(|| format!("writing {}", out_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_file_naming() {
        assert_eq!(convert_path_to_go(Path::new("src/Foo.java")), "Foo.go");
        assert_eq!(convert_path_to_go(Path::new("Bar.JAVA")), "Bar.go");
        assert_eq!(convert_path_to_go(Path::new("nodot")), "nodot.go");
    }

    #[test]
    fn output_lands_under_package_dir() {
        let tmp = tempfile::tempdir().unwrap();

        write_output(tmp.path(), "daq", "Foo.go", "package daq\n").unwrap();
        let written = tmp.path().join("daq").join("Foo.go");
        assert_eq!(fs::read_to_string(written).unwrap(), "package daq\n");

        write_output(tmp.path(), "main", "Bar.go", "package main\n").unwrap();
        assert!(tmp.path().join("Bar.go").exists());
    }

    #[test]
    fn end_to_end_file_translation() {
        let tmp = tempfile::tempdir().unwrap();
        let src_path = tmp.path().join("Hello.java");
        fs::write(
            &src_path,
            "public class Hello { public static void main(String[] args) { System.out.println(\"hi\"); } }",
        )
        .unwrap();

        let out_dir = tmp.path().join("out");
        let cli = Cli {
            config: None,
            debug: false,
            debug_lex: false,
            dir: Some(out_dir.clone()),
            report: false,
            verbose: false,
            paths: vec![src_path.clone()],
        };

        let translator = Translator::new(Arc::new(Config::default()));
        translate_java(&translator, &src_path, &cli).unwrap();

        let out = fs::read_to_string(out_dir.join("Hello.go")).unwrap();
        assert!(out.contains("package main"));
        assert!(out.contains("func main() {"));
        assert!(out.contains("fmt.Println(\"hi\")"));
    }

    #[test]
    fn missing_config_is_empty() {
        let cfg = Config::from_path(Path::new("/no/such/config"));
        assert_eq!(cfg.find_package("anything"), None);
    }
}
