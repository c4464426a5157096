//! The hxq command-line tool.
//!
//! Provides the `hxq` command with the following subcommands:
//!
//! - `hxq resolve <file> <line:col>` - What the reference at a position denotes
//! - `hxq type <file> <line:col>` - The type of the innermost expression at a position
//! - `hxq check <dir>` - Declared types, unresolved names and unreachable code
//!   of every `.hx` file in a project
//!
//! Options:
//! - `--config` - Path to an `hxq.toml` (default: the nearest one above the input)
//! - `--json` - Print results as JSON
//! - `--max-depth` - Override the recursion depth limit
//! - `--no-prelude` - Do not index the builtin types

mod discovery;
mod output;
mod project;

use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hx_semantic::CancellationToken;

use crate::project::{Overrides, Project};

#[derive(Parser)]
#[command(name = "hxq", version, about = "Query names and types in hx projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an hxq.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Recursion depth limit for one query
    #[arg(long = "max-depth", global = true)]
    max_depth: Option<usize>,

    /// Do not index the builtin prelude
    #[arg(long = "no-prelude", global = true)]
    no_prelude: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the declarations the reference at a position resolves to
    Resolve {
        file: PathBuf,
        /// 1-based position, `line:col`
        position: Position,
    },
    /// Print the type of the innermost expression at a position
    Type {
        file: PathBuf,
        /// 1-based position, `line:col`
        position: Position,
    },
    /// Check every source file of a project
    Check {
        /// Project directory
        dir: PathBuf,
    },
}

/// A 1-based `line:col` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: u32,
    col: u32,
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, col) = s
            .split_once(':')
            .ok_or_else(|| format!("expected `line:col`, got `{s}`"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("`{part}` is not a positive number"))
        };
        Ok(Position {
            line: parse(line)?,
            col: parse(col)?,
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let overrides = Overrides {
        config: cli.config.clone(),
        max_depth: cli.max_depth,
        no_prelude: cli.no_prelude,
    };
    let result = match &cli.command {
        Commands::Resolve { file, position } => resolve(file, *position, &overrides, cli.json),
        Commands::Type { file, position } => type_of(file, *position, &overrides, cli.json),
        Commands::Check { dir } => check(dir, &overrides, cli.json),
    };
    if let Err(e) = result {
        if cli.json {
            eprintln!("{}", serde_json::json!({ "error": format!("{e:#}") }));
        } else {
            eprintln!("error: {e:#}");
        }
        process::exit(1);
    }
}

fn resolve(file: &Path, position: Position, overrides: &Overrides, json: bool) -> Result<()> {
    let (project, id) = Project::around(file, overrides)?;
    let offset = project.offset(id, position.line, position.col)?;
    let targets = project
        .analyzer
        .resolve_at(id, offset, &CancellationToken::new())?;
    output::targets(&project, &targets, json)
}

fn type_of(file: &Path, position: Position, overrides: &Overrides, json: bool) -> Result<()> {
    let (project, id) = Project::around(file, overrides)?;
    let offset = project.offset(id, position.line, position.col)?;
    let ty = project
        .analyzer
        .type_at(id, offset, &CancellationToken::new())?;
    output::type_ref(&ty, json)
}

fn check(dir: &Path, overrides: &Overrides, json: bool) -> Result<()> {
    let project = Project::open(dir, overrides)?;
    let token = CancellationToken::new();
    let mut reports = Vec::with_capacity(project.files.len());
    for id in &project.files {
        reports.push(project.analyzer.check_file(*id, &token)?);
    }
    output::reports(&project, &reports, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_parses_line_and_column() {
        assert_eq!("3:14".parse(), Ok(Position { line: 3, col: 14 }));
    }

    #[test]
    fn position_rejects_malformed_input() {
        assert!("3".parse::<Position>().is_err());
        assert!("0:1".parse::<Position>().is_err());
        assert!("a:b".parse::<Position>().is_err());
    }
}
