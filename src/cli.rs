//! CLI command implementations.
//!
//! Provides the helpers behind the `jsonr` subcommands:
//! - `transform` - run the built-in visitors and print the transformed tree
//! - `render` - transform, then render to an element tree or markup
//! - `walk` - list the nodes a traversal visits, without changing anything
//!
//! ## Error Handling
//!
//! All functions return `JsonrResult<T>`. Non-fatal problems are collected
//! as diagnostics and returned in the response instead.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use jsonr_core::{
    transform_owned, walk, AllowTypes, BoxedVisitor, CollectingSink, EventHandler, JsonrError,
    JsonrResult, Node, RenameTypes, SharedSink, TraversalOrder, WalkOptions,
};
use jsonr_handlers::EventHandlerPlugin;
use jsonr_render::{render, RenderContext, Rendered};

use crate::config::Config;
use crate::output::{RenderResponse, TransformResponse, WalkEntry, WalkResponse};

/// Visitor and pipeline flags shared by `transform` and `render`.
#[derive(Debug, Clone, Default)]
pub struct PipelineArgs {
    pub order: Option<TraversalOrder>,
    /// Extra allowed types, added to the configured allow-list.
    pub allow: Vec<String>,
    pub strict: bool,
    /// Extra `(from, to)` type renames.
    pub rename: Vec<(String, String)>,
    /// Handler names to make resolvable.
    pub handlers: Vec<String>,
}

/// Output format for `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    #[default]
    Json,
    Html,
}

/// Result of `render`, ready to print.
#[derive(Debug, Clone)]
pub enum RenderOutput {
    Json(RenderResponse),
    Html(String),
}

// ============================================================================
// Input
// ============================================================================

/// Read a JSON tree from `path`, or from stdin when `path` is `-`.
pub fn read_tree(path: &str) -> JsonrResult<Node> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| JsonrError::internal(format!("failed to read stdin: {}", e)))?;
        buf
    } else {
        let file = Path::new(path);
        if !file.exists() {
            return Err(JsonrError::file_not_found(path));
        }
        std::fs::read_to_string(file)
            .map_err(|e| JsonrError::internal(format!("failed to read {}: {}", path, e)))?
    };
    parse_tree(&content)
}

/// Parse JSON text into a tree.
pub fn parse_tree(content: &str) -> JsonrResult<Node> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| JsonrError::invalid_args(format!("invalid JSON: {}", e)))?;
    Node::from_json(&value)
}

/// Parse a `FROM=TO` rename flag.
pub fn parse_rename(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => {
            Ok((from.to_string(), to.to_string()))
        }
        _ => Err(format!(
            "invalid rename '{}', expected 'FROM=TO' (e.g., 'Btn=button')",
            s
        )),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// A handler for CLI use: there are no functions to call, so invocations are
/// logged.
fn logging_handler(name: &str) -> EventHandler {
    let label = name.to_string();
    EventHandler::new(name, move |event| {
        tracing::info!(handler = %label, event = %event, "handler invoked");
    })
}

/// Build the visitor list: renames, then validation, then handler resolution.
fn build_visitors(
    config: &Config,
    args: &PipelineArgs,
    sink: &SharedSink,
) -> JsonrResult<Vec<BoxedVisitor>> {
    let mut visitors: Vec<BoxedVisitor> = Vec::new();

    let mut rename = RenameTypes::new(config.transform.rename.clone())?;
    for (from, to) in &args.rename {
        rename = rename.with_alias(from.clone(), to.clone())?;
    }
    if !rename.is_empty() {
        visitors.push(Box::new(rename));
    }

    let allowed: Vec<String> = config
        .transform
        .allow
        .iter()
        .chain(args.allow.iter())
        .cloned()
        .collect();
    if !allowed.is_empty() {
        let allow = AllowTypes::new(allowed)
            .strict(args.strict || config.transform.strict)
            .with_sink(Arc::clone(sink));
        visitors.push(Box::new(allow));
    }

    if !args.handlers.is_empty() {
        let plugin = EventHandlerPlugin::new(args.handlers.iter().map(|name| logging_handler(name)))
            .with_prefix(config.render.handler_prefix.clone())
            .with_sink(Arc::clone(sink));
        visitors.push(Box::new(plugin));
    }

    Ok(visitors)
}

/// Run the configured visitors over `tree`, reporting into `sink`.
async fn run_pipeline(
    tree: Node,
    config: &Config,
    args: &PipelineArgs,
    sink: &SharedSink,
) -> JsonrResult<Node> {
    let mut visitors = build_visitors(config, args, sink)?;
    let options = config.transform_options(args.order);
    tracing::debug!(visitors = visitors.len(), order = %options.order, "running pipeline");
    transform_owned(tree, &mut visitors, options.order).await
}

/// Execute `jsonr transform`.
pub async fn run_transform(
    tree: Node,
    config: &Config,
    args: &PipelineArgs,
) -> JsonrResult<TransformResponse> {
    let collector = Arc::new(CollectingSink::new());
    let sink: SharedSink = collector.clone();
    let tree = run_pipeline(tree, config, args, &sink).await?;
    Ok(TransformResponse::new(tree.to_json(), collector.take()))
}

/// Execute `jsonr render`.
pub async fn run_render(
    tree: Node,
    config: &Config,
    args: &PipelineArgs,
    targets: &[String],
    format: RenderFormat,
) -> JsonrResult<RenderOutput> {
    let collector = Arc::new(CollectingSink::new());
    let sink: SharedSink = collector.clone();
    let tree = run_pipeline(tree, config, args, &sink).await?;

    // With handlers given, the plugin has already reported unresolved names.
    let mut ctx = RenderContext::new()
        .with_handler_prefix(config.render.handler_prefix.clone())
        .with_handlers(args.handlers.iter().map(|name| logging_handler(name)))
        .warn_on_missing_handlers(args.handlers.is_empty())
        .with_sink(sink);
    for target in config.render.targets.iter().chain(targets) {
        ctx = ctx.with_target(target.clone());
    }

    let rendered: Rendered = render(&tree, &config.registry(), &ctx);
    match format {
        RenderFormat::Json => Ok(RenderOutput::Json(RenderResponse::new(
            rendered.to_json(),
            collector.take(),
        ))),
        RenderFormat::Html => {
            for diagnostic in collector.take() {
                tracing::warn!("{}", diagnostic);
            }
            Ok(RenderOutput::Html(rendered.to_markup()))
        }
    }
}

/// Execute `jsonr walk`.
pub fn run_walk(tree: &Node, order: TraversalOrder, types: &[String]) -> WalkResponse {
    let mut options = WalkOptions::new().with_order(order);
    if !types.is_empty() {
        options = options.with_types(types.iter().cloned());
    }
    let entries = walk(tree, &options)
        .map(|item| WalkEntry {
            depth: item.context.depth(),
            index: item.context.index(),
            parent: item.context.parent().cloned(),
            kind: item.node.kind(),
            label: match item.node.type_name() {
                Some(type_name) => type_name.to_string(),
                None => item.node.to_json().to_string(),
            },
        })
        .collect();
    WalkResponse::new(order.as_str(), entries)
}
