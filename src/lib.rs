//! jsonr: transform and render declarative JSON UI trees.
//!
//! A JSON-shaped UI description is decoded into a [`Node`] tree, passed
//! through pluggable async visitors, and rendered through a component
//! registry into a framework-agnostic element tree.

// Engine - re-exported from jsonr-core
pub use jsonr_core::context;
pub use jsonr_core::diagnostics;
pub use jsonr_core::error;
pub use jsonr_core::node;
pub use jsonr_core::transform;
pub use jsonr_core::traverse;
pub use jsonr_core::visitor;
pub use jsonr_core::visitors;
pub use jsonr_core::walk;

pub use jsonr_core::{
    create_group, create_node, create_redirect, is_array, is_primitive, is_structured,
    transform_owned, AllowTypes, BoxedVisitor, CollectingSink, ComponentNode, Diagnostic,
    DiagnosticKind, DiagnosticSink, EventHandler, FnVisitor, JsonrError, JsonrResult, Node,
    NodeKind, OutputErrorCode, Primitive, PropValue, Props, RenameTypes, TargetRef,
    TransformContext, TransformOptions, TransformVisitor, Transformer, TraversalOrder,
    VisitOutcome, VisitResult, WalkOptions,
};

// Renderer and plugins
pub use jsonr_handlers::EventHandlerPlugin;
pub use jsonr_render::{
    escape, is_markup_name, render, ComponentFactory, PortalTarget, Registry, RegistryEntry,
    RenderContext, Rendered,
};

// Front door
pub mod cli;
pub mod config;
pub mod output;
