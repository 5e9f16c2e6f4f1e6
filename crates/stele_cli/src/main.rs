//! Stele CLI: inspect, compile, load and emit Swift-style module interfaces.
//!
//! `stele load` resolves modules through the interface compilation cache,
//! `stele compile` and `stele emit` convert between textual interfaces and
//! binary modules directly, and `stele header`, `stele key` and `stele clean`
//! expose the cache's building blocks.

#![warn(missing_docs)]

mod clean;
mod compile;
mod inspect;
mod load;
mod pipeline;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Stele: a textual module interface toolchain.
#[derive(Parser, Debug)]
#[command(name = "stele", version, about = "Stele module interface toolchain")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Trace every cache state transition.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `stele.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for diagnostics and results.
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the header markers of a textual interface.
    Header {
        /// The interface file.
        file: PathBuf,
    },
    /// Print the cache key of a textual interface.
    Key {
        /// The interface file.
        file: PathBuf,
    },
    /// Compile a textual interface to a binary module, bypassing the cache.
    Compile(CompileArgs),
    /// Load modules through the cache.
    Load(LoadArgs),
    /// Render a binary module as a textual interface.
    Emit(EmitArgs),
    /// Remove orphaned temporary files from the cache.
    Clean {
        /// Remove every cached artifact as well.
        #[arg(long)]
        all: bool,
    },
}

/// Arguments for the `stele compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// The interface file.
    pub file: PathBuf,

    /// Output path (default: `<Name>.<module ext>` in the current directory).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `stele load` subcommand.
#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Module names to load.
    #[arg(required = true)]
    pub modules: Vec<String>,

    /// Extra search directories, searched after the configured ones.
    #[arg(short = 'I', long = "search-path")]
    pub search_paths: Vec<PathBuf>,

    /// Write a make-style dependency file listing every file consulted.
    #[arg(long)]
    pub depfile: Option<PathBuf>,

    /// Target named in the dependency file (default: the depfile path
    /// without its extension).
    #[arg(long, requires = "depfile")]
    pub dep_target: Option<PathBuf>,
}

/// Arguments for the `stele emit` subcommand.
#[derive(Parser, Debug)]
pub struct EmitArgs {
    /// The binary module file.
    pub file: PathBuf,

    /// Output path (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to trace cache activity.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
    /// How to print diagnostics and results.
    pub format: ReportFormat,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        format: cli.format,
    };

    let result = match cli.command {
        Command::Header { ref file } => inspect::header(file, &global),
        Command::Key { ref file } => inspect::key(file, &global),
        Command::Compile(ref args) => compile::compile(args, &global),
        Command::Load(ref args) => load::run(args, &global),
        Command::Emit(ref args) => compile::emit(args, &global),
        Command::Clean { all } => clean::run(all, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
