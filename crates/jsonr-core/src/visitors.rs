//! Built-in visitors.
//!
//! - [`FnVisitor`]: wraps synchronous closures as a visitor
//! - [`AllowTypes`]: rejects structured nodes whose type is not allow-listed
//! - [`RenameTypes`]: rewrites type names through an alias table

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;

use crate::context::TransformContext;
use crate::diagnostics::{default_sink, Diagnostic, SharedSink};
use crate::error::{JsonrError, JsonrResult};
use crate::node::{Node, FRAGMENT, PORTAL};
use crate::visitor::{TransformVisitor, VisitOutcome, VisitResult};

// ============================================================================
// FnVisitor
// ============================================================================

type Hook = Box<dyn FnMut(&mut Node, &TransformContext) -> VisitResult + Send>;

/// Visitor built from synchronous closures.
///
/// ```ignore
/// let visitor = FnVisitor::new().on_enter(|node, _ctx| {
///     if let Some(c) = node.as_component_mut() {
///         c.set_prop("data-seen", true);
///     }
///     Ok(VisitOutcome::NoChange)
/// });
/// ```
#[derive(Default)]
pub struct FnVisitor {
    enter: Option<Hook>,
    exit: Option<Hook>,
}

impl FnVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter(
        mut self,
        hook: impl FnMut(&mut Node, &TransformContext) -> VisitResult + Send + 'static,
    ) -> Self {
        self.enter = Some(Box::new(hook));
        self
    }

    pub fn on_exit(
        mut self,
        hook: impl FnMut(&mut Node, &TransformContext) -> VisitResult + Send + 'static,
    ) -> Self {
        self.exit = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for FnVisitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnVisitor")
            .field("enter", &self.enter.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}

#[async_trait]
impl TransformVisitor for FnVisitor {
    async fn enter(&mut self, node: &mut Node, ctx: &TransformContext) -> VisitResult {
        match self.enter.as_mut() {
            Some(hook) => hook(node, ctx),
            None => Ok(VisitOutcome::NoChange),
        }
    }

    async fn exit(&mut self, node: &mut Node, ctx: &TransformContext) -> VisitResult {
        match self.exit.as_mut() {
            Some(hook) => hook(node, ctx),
            None => Ok(VisitOutcome::NoChange),
        }
    }
}

// ============================================================================
// AllowTypes
// ============================================================================

/// Validation visitor that only lets listed types through.
///
/// `Fragment` and `Portal` are always allowed. A rejected node is replaced by
/// null and reported as an unknown type; in strict mode the transform fails
/// instead.
pub struct AllowTypes {
    allowed: BTreeSet<String>,
    strict: bool,
    sink: SharedSink,
}

impl AllowTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowTypes {
            allowed: types.into_iter().map(Into::into).collect(),
            strict: false,
            sink: default_sink(),
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn allows(&self, type_name: &str) -> bool {
        type_name == FRAGMENT || type_name == PORTAL || self.allowed.contains(type_name)
    }
}

impl fmt::Debug for AllowTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllowTypes")
            .field("allowed", &self.allowed)
            .field("strict", &self.strict)
            .finish()
    }
}

#[async_trait]
impl TransformVisitor for AllowTypes {
    async fn enter(&mut self, node: &mut Node, _ctx: &TransformContext) -> VisitResult {
        let Some(type_name) = node.type_name() else {
            return Ok(VisitOutcome::NoChange);
        };
        if self.allows(type_name) {
            return Ok(VisitOutcome::NoChange);
        }
        if self.strict {
            return Err(JsonrError::UnknownType {
                type_name: type_name.to_string(),
            });
        }
        self.sink.emit(Diagnostic::unknown_type(type_name));
        Ok(VisitOutcome::Replace(Node::null()))
    }
}

// ============================================================================
// RenameTypes
// ============================================================================

/// Rewrites structured node types through an alias table, in place.
#[derive(Debug, Clone, Default)]
pub struct RenameTypes {
    aliases: BTreeMap<String, String>,
}

impl RenameTypes {
    /// Build from an alias table. An empty target is an invalid-arguments
    /// error, since renaming to it would leave a node with no type.
    pub fn new(aliases: BTreeMap<String, String>) -> JsonrResult<Self> {
        if let Some((from, _)) = aliases.iter().find(|(_, to)| to.is_empty()) {
            return Err(empty_target(from));
        }
        Ok(RenameTypes { aliases })
    }

    pub fn with_alias(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> JsonrResult<Self> {
        let (from, to) = (from.into(), to.into());
        if to.is_empty() {
            return Err(empty_target(&from));
        }
        self.aliases.insert(from, to);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn empty_target(from: &str) -> JsonrError {
    JsonrError::invalid_args(format!("rename target for '{}' must not be empty", from))
}

#[async_trait]
impl TransformVisitor for RenameTypes {
    async fn enter(&mut self, node: &mut Node, _ctx: &TransformContext) -> VisitResult {
        if let Some(component) = node.as_component_mut() {
            if let Some(to) = self.aliases.get(&component.type_name) {
                tracing::trace!(from = %component.type_name, to = %to, "rename type");
                component.type_name = to.clone();
            }
        }
        Ok(VisitOutcome::NoChange)
    }
}
