//! Visitor protocol for tree transforms.
//!
//! A [`TransformVisitor`] has two optional hooks, `enter` and `exit`. Each
//! receives the node (mutable, so it can be edited in place) and its
//! [`TransformContext`], and answers with a [`VisitOutcome`]:
//!
//! - [`VisitOutcome::NoChange`]: keep the (possibly edited) node
//! - [`VisitOutcome::Replace`]: put another node in this position
//!
//! # Composition
//!
//! Visitors run in slice order. Within one phase, the first visitor that
//! returns `Replace` wins and the remaining visitors are not called for that
//! node. A replacement from `enter` is final for its position: the engine
//! does not descend into it and runs no `exit` visitors for it.
//!
//! Hooks are `async` and the engine awaits each call before making the next,
//! so visitor calls never overlap and ordering is deterministic.
//!
//! ```ignore
//! use jsonr_core::visitor::{TransformVisitor, VisitOutcome, VisitResult};
//!
//! struct Upper;
//!
//! #[async_trait::async_trait]
//! impl TransformVisitor for Upper {
//!     async fn enter(&mut self, node: &mut Node, _ctx: &TransformContext) -> VisitResult {
//!         match node.as_str() {
//!             Some(s) => Ok(VisitOutcome::Replace(Node::text(s.to_uppercase()))),
//!             None => Ok(VisitOutcome::NoChange),
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::context::TransformContext;
use crate::error::JsonrResult;
use crate::node::Node;

/// What a visitor hook decided for a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VisitOutcome {
    /// Keep the node as it is now.
    #[default]
    NoChange,
    /// Replace the node with another one.
    Replace(Node),
}

impl VisitOutcome {
    pub fn is_replace(&self) -> bool {
        matches!(self, VisitOutcome::Replace(_))
    }
}

/// Result of a visitor hook. An error aborts the whole transform.
pub type VisitResult = JsonrResult<VisitOutcome>;

/// A pair of optional enter/exit hooks applied to each visited node.
///
/// The `#[async_trait]` macro keeps the trait object-safe so visitors can be
/// stored as `Box<dyn TransformVisitor>`.
#[async_trait]
pub trait TransformVisitor: Send {
    /// Called when a node is reached.
    async fn enter(&mut self, _node: &mut Node, _ctx: &TransformContext) -> VisitResult {
        Ok(VisitOutcome::NoChange)
    }

    /// Called when a node is left. Never called by breadth-first traversal.
    async fn exit(&mut self, _node: &mut Node, _ctx: &TransformContext) -> VisitResult {
        Ok(VisitOutcome::NoChange)
    }
}

/// Owned, type-erased visitor.
pub type BoxedVisitor = Box<dyn TransformVisitor>;

/// Which hook to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Enter,
    Exit,
}

/// Run one phase of every visitor over `node`.
///
/// Returns `true` when a visitor replaced the node; the replacement has
/// already been written into `node`.
pub(crate) async fn run_phase(
    visitors: &mut [BoxedVisitor],
    phase: Phase,
    node: &mut Node,
    ctx: &TransformContext,
) -> JsonrResult<bool> {
    for visitor in visitors.iter_mut() {
        let outcome = match phase {
            Phase::Enter => visitor.enter(node, ctx).await?,
            Phase::Exit => visitor.exit(node, ctx).await?,
        };
        if let VisitOutcome::Replace(replacement) = outcome {
            *node = replacement;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Apply enter then exit visitors to a single node without descending.
///
/// Used for a primitive at the top of a transform call. An enter replacement
/// is final, as everywhere else.
pub(crate) async fn apply_direct(
    visitors: &mut [BoxedVisitor],
    node: &mut Node,
    ctx: &TransformContext,
) -> JsonrResult<()> {
    if run_phase(visitors, Phase::Enter, node, ctx).await? {
        return Ok(());
    }
    run_phase(visitors, Phase::Exit, node, ctx).await?;
    Ok(())
}
