//! Core engine for jsonr.
//!
//! This crate provides the renderer-independent parts of the pipeline:
//! - Node model and JSON codec
//! - Error types and error codes
//! - Diagnostics and diagnostic sinks
//! - Traversal contexts and the visitor protocol
//! - Eager traversal in three orders, plus a lazy walker
//! - The transform pipeline and a few built-in visitors

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod node;
pub mod transform;
pub mod traverse;
pub mod visitor;
pub mod visitors;
pub mod walk;

pub use context::{create_context, root_context, ParentInfo, TransformContext};
pub use diagnostics::{
    default_sink, CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, SharedSink,
    TracingSink,
};
pub use error::{JsonrError, JsonrResult, OutputErrorCode};
pub use node::{
    create_group, create_node, create_redirect, is_array, is_primitive, is_structured,
    ComponentNode, EventHandler, Node, NodeKind, Primitive, PropValue, Props, TargetRef,
    CONTAINER_PROP, FRAGMENT, PORTAL,
};
pub use transform::{transform, transform_owned, TransformOptions, Transformer, TraversalOrder};
pub use visitor::{BoxedVisitor, TransformVisitor, VisitOutcome, VisitResult};
pub use visitors::{AllowTypes, FnVisitor, RenameTypes};
pub use walk::{walk, Walk, WalkItem, WalkOptions};
