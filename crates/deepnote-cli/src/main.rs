//! Deepnote command-line tool.
//!
//! Validates, formats and compiles `.deepnote` project files.

mod commands;
mod result_ext;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::ValidationReport;
use deepnote_blocks::ParserConfig;
use result_ext::CommandResultExt;

#[derive(Parser)]
#[command(name = "deepnote")]
#[command(version, about = "Deepnote project file tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a file and list every schema issue
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the canonical form of a file
    ///
    /// Examples:
    ///     deepnote fmt project.deepnote            # print to stdout
    ///     deepnote fmt project.deepnote --check    # exit 1 if not canonical
    ///     deepnote fmt project.deepnote --write    # rewrite in place
    #[command(verbatim_doc_comment)]
    Fmt {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Exit with an error when the file is not canonical
        #[arg(long, conflicts_with = "write")]
        check: bool,

        /// Rewrite the file in place
        #[arg(long)]
        write: bool,
    },
    /// Print the Python source of every notebook
    Compile {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only compile the notebook with this id or name
        #[arg(short, long, value_name = "ID_OR_NAME")]
        notebook: Option<String>,

        /// Treat a button variable as activated, can be repeated
        #[arg(long = "activate", value_name = "VAR")]
        activate: Vec<String>,
    },
    /// Print the Markdown of every text block
    Markdown {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Initialize tracing/logging on stderr.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,deepnote_blocks=info,deepnote_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ParserConfig::from_env().context("Invalid DEEPNOTE_* configuration")?;

    match cli.command {
        Commands::Validate { file } => {
            match commands::validate_path(&file, &config).log_failure("validate", &file)? {
                ValidationReport::Valid { notebooks, blocks } => {
                    println!(
                        "{}: valid ({} notebooks, {} blocks)",
                        file.display(),
                        notebooks,
                        blocks
                    );
                }
                ValidationReport::Invalid(lines) => {
                    for line in lines {
                        eprintln!("{}", line);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Fmt { file, check, write } => {
            let (original, parsed) = commands::load_file(&file, &config).log_failure("fmt", &file)?;
            let (canonical, unchanged) =
                commands::format_file(&original, &parsed).log_failure("fmt", &file)?;
            if check {
                if !unchanged {
                    eprintln!("{} is not canonically formatted", file.display());
                    std::process::exit(1);
                }
            } else if write {
                if !unchanged {
                    fs::write(&file, &canonical)
                        .with_context(|| format!("Failed to write {}", file.display()))?;
                    tracing::info!(file = %file.display(), "Rewrote file");
                }
            } else {
                print!("{}", canonical);
            }
        }
        Commands::Compile {
            file,
            notebook,
            activate,
        } => {
            let (_, parsed) = commands::load_file(&file, &config).log_failure("compile", &file)?;
            let source = commands::compile_file(&parsed, notebook.as_deref(), &activate)
                .log_failure("compile", &file)?;
            println!("{}", source);
        }
        Commands::Markdown { file } => {
            let (_, parsed) = commands::load_file(&file, &config).log_failure("markdown", &file)?;
            let markdown = commands::markdown_file(&parsed).log_failure("markdown", &file)?;
            println!("{}", markdown);
        }
    }

    Ok(())
}
