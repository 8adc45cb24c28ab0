//! Per-node visitation context.
//!
//! A fresh [`TransformContext`] is built for every node a traversal visits,
//! right before that node's enter visitors run. It records where the node sits
//! (depth, index among siblings, a summary of its parent) and carries the
//! one-way skip-children latch.
//!
//! The parent is a summary rather than a reference: visitors hold `&mut` to
//! the node being visited, so the parent cannot be borrowed at the same time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::node::ComponentNode;

/// Summary of the structured node that contains the visited node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ParentInfo {
    pub fn of(node: &ComponentNode) -> Self {
        ParentInfo {
            type_name: node.type_name.clone(),
            key: node.key.clone(),
            id: node.id.clone(),
        }
    }
}

/// One-way flag: once set it stays set.
///
/// Clones share the flag, so a lazy walker can observe a latch set by the
/// consumer through the context it handed out.
#[derive(Debug, Clone, Default)]
pub struct SkipLatch(Arc<AtomicBool>);

impl SkipLatch {
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Visitation record handed to visitors.
#[derive(Debug, Clone)]
pub struct TransformContext {
    depth: usize,
    parent: Option<Arc<ParentInfo>>,
    index: usize,
    skip: SkipLatch,
}

impl TransformContext {
    /// Distance from the root (root = 0). Array elements share the depth of
    /// the array.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<&ParentInfo> {
        self.parent.as_deref()
    }

    /// Position among siblings; 0 for the root and for a single child.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Do not descend into this node's children. Exit visitors still run.
    pub fn skip_children(&self) {
        self.skip.set();
    }

    pub fn should_skip_children(&self) -> bool {
        self.skip.is_set()
    }

    pub(crate) fn latch(&self) -> SkipLatch {
        self.skip.clone()
    }
}

/// Build the context for a node about to be visited.
pub fn create_context(
    parent: Option<Arc<ParentInfo>>,
    index: usize,
    depth: usize,
) -> TransformContext {
    TransformContext {
        depth,
        parent,
        index,
        skip: SkipLatch::default(),
    }
}

/// Context for the root of a traversal.
pub fn root_context() -> TransformContext {
    create_context(None, 0, 0)
}
