//! Binary entry point for the jsonr CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Validate and normalize a tree
//! jsonr transform page.json --allow div --allow span --rename Btn=button
//!
//! # Render to markup, resolving handlers and portal targets
//! jsonr render page.json --handler save --target '#modal' --format html
//!
//! # List what a breadth-first traversal visits
//! cat page.json | jsonr walk - --order bfs --type section
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use jsonr::cli::{
    parse_rename, read_tree, run_render, run_transform, run_walk, PipelineArgs, RenderFormat,
    RenderOutput,
};
use jsonr::config::Config;
use jsonr::output::{emit_response, ErrorResponse};
use jsonr::{JsonrError, OutputErrorCode, TraversalOrder};

// ============================================================================
// CLI Structure
// ============================================================================

/// Transform and render declarative JSON UI trees.
#[derive(Parser, Debug)]
#[command(name = "jsonr", version, about = "Transform and render JSON UI trees")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: ./jsonr.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for the render command.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Format {
    /// JSON response envelope with the element tree.
    #[default]
    Json,
    /// HTML-like markup.
    Html,
}

/// Visitor flags shared by transform and render.
#[derive(clap::Args, Debug)]
struct PipelineFlags {
    /// Traversal order: depthFirstPre (pre), depthFirstPost (post), breadthFirst (bfs).
    #[arg(long, value_parser = parse_order)]
    order: Option<TraversalOrder>,

    /// Allowed structured node type (repeatable). Others become null.
    #[arg(long = "allow", value_name = "TYPE")]
    allow: Vec<String>,

    /// Fail instead of nulling out types missing from the allow-list.
    #[arg(long)]
    strict: bool,

    /// Rename a type before validation, as FROM=TO (repeatable).
    #[arg(long = "rename", value_name = "FROM=TO", value_parser = parse_rename)]
    rename: Vec<(String, String)>,

    /// Make a handler name resolvable (repeatable).
    #[arg(long = "handler", value_name = "NAME")]
    handlers: Vec<String>,
}

impl PipelineFlags {
    fn into_args(self) -> PipelineArgs {
        PipelineArgs {
            order: self.order,
            allow: self.allow,
            strict: self.strict,
            rename: self.rename,
            handlers: self.handlers,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the built-in visitors and print the transformed tree.
    Transform {
        /// Input JSON file, or `-` for stdin.
        file: String,
        #[command(flatten)]
        pipeline: PipelineFlags,
    },
    /// Transform, then render the tree.
    Render {
        /// Input JSON file, or `-` for stdin.
        file: String,
        #[command(flatten)]
        pipeline: PipelineFlags,
        /// Known portal target selector (repeatable).
        #[arg(long = "target", value_name = "SELECTOR")]
        targets: Vec<String>,
        /// Output format.
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
    },
    /// List the nodes a traversal visits.
    Walk {
        /// Input JSON file, or `-` for stdin.
        file: String,
        /// Traversal order.
        #[arg(long, value_parser = parse_order)]
        order: Option<TraversalOrder>,
        /// Only list structured nodes of this type (repeatable).
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,
    },
}

fn parse_order(s: &str) -> Result<TraversalOrder, String> {
    s.parse().map_err(|e: JsonrError| e.to_string())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), JsonrError> {
    let cwd = std::env::current_dir()
        .map_err(|e| JsonrError::internal(format!("failed to read working directory: {}", e)))?;
    let config = Config::discover(cli.global.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Transform { file, pipeline } => execute_transform(&config, &file, pipeline),
        Command::Render {
            file,
            pipeline,
            targets,
            format,
        } => execute_render(&config, &file, pipeline, &targets, format),
        Command::Walk { file, order, types } => execute_walk(&config, &file, order, &types),
    }
}

/// The visitor pipeline is async; the CLI drives it on a current-thread runtime.
fn runtime() -> Result<tokio::runtime::Runtime, JsonrError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| JsonrError::internal(format!("failed to start runtime: {}", e)))
}

fn write_stdout(text: &str) -> Result<(), JsonrError> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", text).map_err(|e| JsonrError::internal(e.to_string()))?;
    let _ = stdout.flush();
    Ok(())
}

fn emit<T: serde::Serialize>(response: &T) -> Result<(), JsonrError> {
    emit_response(response, &mut io::stdout()).map_err(|e| JsonrError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Command Executors
// ============================================================================

fn execute_transform(config: &Config, file: &str, pipeline: PipelineFlags) -> Result<(), JsonrError> {
    let tree = read_tree(file)?;
    let args = pipeline.into_args();
    let response = runtime()?.block_on(run_transform(tree, config, &args))?;
    emit(&response)
}

fn execute_render(
    config: &Config,
    file: &str,
    pipeline: PipelineFlags,
    targets: &[String],
    format: Format,
) -> Result<(), JsonrError> {
    let tree = read_tree(file)?;
    let args = pipeline.into_args();
    let format = match format {
        Format::Json => RenderFormat::Json,
        Format::Html => RenderFormat::Html,
    };
    match runtime()?.block_on(run_render(tree, config, &args, targets, format))? {
        RenderOutput::Json(response) => emit(&response),
        RenderOutput::Html(markup) => write_stdout(&markup),
    }
}

fn execute_walk(
    config: &Config,
    file: &str,
    order: Option<TraversalOrder>,
    types: &[String],
) -> Result<(), JsonrError> {
    let tree = read_tree(file)?;
    let order = order.unwrap_or(config.transform.order);
    emit(&run_walk(&tree, order, types))
}
