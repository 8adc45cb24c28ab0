//! Event-handler resolution as a transform visitor.
//!
//! [`EventHandlerPlugin`] swaps string handler names in props (`"onClick":
//! "save"`) for the matching [`EventHandler`] before the tree is rendered. It
//! edits props in place and never replaces a node.
//!
//! ```ignore
//! let plugin = EventHandlerPlugin::new([EventHandler::new("save", |_| {})]);
//! let mut visitors: Vec<BoxedVisitor> = vec![Box::new(plugin)];
//! let tree = transform_owned(tree, &mut visitors, TraversalOrder::default()).await?;
//! ```

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use jsonr_core::{
    default_sink, Diagnostic, EventHandler, Node, PropValue, SharedSink, TransformContext,
    TransformVisitor, VisitOutcome, VisitResult,
};
use serde_json::Value;

/// Default prop-name prefix for event handlers.
pub const DEFAULT_PREFIX: &str = "on";

/// Visitor that resolves handler names to handlers.
pub struct EventHandlerPlugin {
    handlers: BTreeMap<String, EventHandler>,
    prefix: String,
    warn_on_missing: bool,
    sink: SharedSink,
}

impl EventHandlerPlugin {
    /// Create a plugin resolving against `handlers`, keyed by handler name.
    pub fn new(handlers: impl IntoIterator<Item = EventHandler>) -> Self {
        EventHandlerPlugin {
            handlers: handlers
                .into_iter()
                .map(|h| (h.name().to_string(), h))
                .collect(),
            prefix: DEFAULT_PREFIX.to_string(),
            warn_on_missing: true,
            sink: default_sink(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Whether unresolved names are reported. Defaults to true.
    pub fn warn_on_missing(mut self, warn: bool) -> Self {
        self.warn_on_missing = warn;
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for EventHandlerPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlerPlugin")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("prefix", &self.prefix)
            .field("warn_on_missing", &self.warn_on_missing)
            .finish()
    }
}

#[async_trait]
impl TransformVisitor for EventHandlerPlugin {
    async fn enter(&mut self, node: &mut Node, _ctx: &TransformContext) -> VisitResult {
        let Some(props) = node.as_component_mut().and_then(|c| c.props.as_mut()) else {
            return Ok(VisitOutcome::NoChange);
        };

        for (name, value) in props.iter_mut() {
            if !name.starts_with(self.prefix.as_str()) {
                continue;
            }
            let PropValue::Json(Value::String(handler_name)) = value else {
                continue;
            };
            match self.handlers.get(handler_name.as_str()) {
                Some(handler) => {
                    tracing::trace!(prop = %name, handler = %handler_name, "resolved handler");
                    *value = PropValue::Handler(handler.clone());
                }
                None if self.warn_on_missing => {
                    self.sink
                        .emit(Diagnostic::unresolved_handler(handler_name.as_str()));
                }
                None => {}
            }
        }
        Ok(VisitOutcome::NoChange)
    }
}
