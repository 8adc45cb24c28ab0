//! Renderer for jsonr.
//!
//! This crate turns node trees into a framework-agnostic element tree:
//! - Component registry with custom entries, markers and generic tags
//! - Element model with JSON and markup output
//! - Render context (event handlers, portal targets, diagnostics)

pub mod element;
pub mod registry;
pub mod render;

pub use element::{escape, is_markup_name, PortalTarget, Rendered};
pub use registry::{ComponentFactory, Registry, RegistryEntry, Resolved};
pub use render::{render, RenderContext, DEFAULT_HANDLER_PREFIX};
