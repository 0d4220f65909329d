//! docplan CLI: documentation, SQL and execution plans from code.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use docplan_backend::{BackendConfig, BackendMode};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;

use commands::{config as config_cmd, doc, plan, sql};

/// docplan - document code, write SQL and plan function calls with a language model.
#[derive(Parser, Debug)]
#[command(name = "dplan", author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use the local OpenAI-compatible backend instead of the remote service
    #[arg(long, global = true)]
    local: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate documentation for one source snippet.
    Doc {
        /// File containing the snippet.
        file: PathBuf,
    },

    /// Document every public callable of a namespace manifest.
    ///
    /// Ctrl-C stops the batch and keeps the docs generated so far.
    Docs {
        /// JSON manifest describing the namespace.
        manifest: PathBuf,

        /// Qualified name of a module inside the manifest to document
        /// instead of the whole namespace.
        #[arg(long)]
        root: Option<String>,

        /// Write the path -> doc mapping to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the public callables of a namespace manifest with their signatures.
    Symbols {
        /// JSON manifest describing the namespace.
        manifest: PathBuf,
    },

    /// Generate a SQL query for a schema.
    Sql {
        /// File containing the schema (DDL or a description).
        #[arg(long)]
        schema: PathBuf,

        /// Question to answer.
        #[arg(long)]
        question: String,

        /// Extra instructions for the model.
        #[arg(long)]
        instructions: Option<String>,

        /// File with example queries.
        #[arg(long)]
        examples: Option<PathBuf>,
    },

    /// Generate an execution plan over a set of functions.
    #[command(group(ArgGroup::new("functions_source").required(true).args(["functions", "manifest"])))]
    Plan {
        /// JSON array of function descriptors (name, signature, docs, source).
        #[arg(long)]
        functions: Option<PathBuf>,

        /// Namespace manifest whose public callables become the functions.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Question the plan should answer.
        #[arg(long)]
        question: String,

        /// Extra instructions for the planner.
        #[arg(long, default_value = "")]
        instructions: String,

        /// Generate function docs with the model instead of using declared docs.
        #[arg(long)]
        model_docs: bool,

        /// Also render the plan as commented code.
        #[arg(long)]
        code: bool,
    },

    /// Generate a single function call answering a question.
    #[command(group(ArgGroup::new("function_input").required(true).multiple(true).args(["docs", "code"])))]
    Call {
        /// Question the call should answer.
        #[arg(long)]
        question: String,

        /// File with the function's documentation.
        #[arg(long)]
        docs: Option<PathBuf>,

        /// File with the function's source code.
        #[arg(long)]
        code: Option<PathBuf>,
    },

    /// Manage backend configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show,

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Set a configuration value in the config file.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Show path to config file.
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let mut config = BackendConfig::load().context("Failed to load backend configuration")?;
    if cli.local {
        config.mode = BackendMode::Local;
    }

    match cli.command {
        Commands::Doc { file } => doc::document_file(&config, &file)?,

        Commands::Docs {
            manifest,
            root,
            output,
        } => doc::document_manifest(&config, &manifest, root.as_deref(), output.as_deref())?,

        Commands::Symbols { manifest } => doc::list_symbols(&manifest)?,

        Commands::Sql {
            schema,
            question,
            instructions,
            examples,
        } => sql::execute(
            &config,
            &schema,
            &question,
            instructions.as_deref(),
            examples.as_deref(),
        )?,

        Commands::Plan {
            functions,
            manifest,
            question,
            instructions,
            model_docs,
            code,
        } => {
            let source = match (functions, manifest) {
                (Some(path), _) => plan::FunctionSource::Descriptors(path),
                (None, Some(path)) => plan::FunctionSource::Manifest(path),
                (None, None) => anyhow::bail!("either --functions or --manifest is required"),
            };
            plan::execute(&config, &source, &question, &instructions, model_docs, code)?
        }

        Commands::Call {
            question,
            docs,
            code,
        } => plan::function_call(&config, &question, docs.as_deref(), code.as_deref())?,

        Commands::Config(command) => match command {
            ConfigCommands::Show => config_cmd::show(&config)?,
            ConfigCommands::Get { key } => config_cmd::get(&config, &key)?,
            ConfigCommands::Set { key, value } => config_cmd::set(&key, &value)?,
            ConfigCommands::Path => match BackendConfig::config_file_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(no config file path available)"),
            },
        },
    }

    Ok(())
}
