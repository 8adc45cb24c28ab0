//! Transform pipeline: the public entry point for visitor passes.
//!
//! [`transform`] decides whether to work on a deep copy, dispatches to the
//! chosen traversal order, and hands back the resulting tree:
//!
//! - with `clone` on (the default) the input is left untouched and the result
//!   is an owned copy ([`Cow::Owned`])
//! - with `clone` off the input is mutated in place and the result borrows it
//!   ([`Cow::Borrowed`]); the `&mut` borrow gives the pipeline exclusive access
//!   for the duration of the call
//!
//! A primitive at the top of the call gets its enter and exit visitors applied
//! directly. Each element of a top-level array is transformed as a root of its
//! own, with the same options.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::root_context;
use crate::error::{JsonrError, JsonrResult};
use crate::node::Node;
use crate::traverse::{breadth_first, depth_first_post, depth_first_pre};
use crate::visitor::{apply_direct, BoxedVisitor, TransformVisitor};

// ============================================================================
// Options
// ============================================================================

/// Traversal strategy for a transform or walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraversalOrder {
    /// Depth-first, enter before children.
    #[default]
    DepthFirstPre,
    /// Depth-first, children before enter.
    DepthFirstPost,
    /// Level by level, enter only.
    BreadthFirst,
}

impl TraversalOrder {
    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalOrder::DepthFirstPre => "depthFirstPre",
            TraversalOrder::DepthFirstPost => "depthFirstPost",
            TraversalOrder::BreadthFirst => "breadthFirst",
        }
    }
}

impl fmt::Display for TraversalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraversalOrder {
    type Err = JsonrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depthFirstPre" | "pre" | "depth-first-pre" => Ok(TraversalOrder::DepthFirstPre),
            "depthFirstPost" | "post" | "depth-first-post" => Ok(TraversalOrder::DepthFirstPost),
            "breadthFirst" | "bfs" | "breadth-first" => Ok(TraversalOrder::BreadthFirst),
            other => Err(JsonrError::InvalidTraversalOrder {
                order: other.to_string(),
            }),
        }
    }
}

impl Serialize for TraversalOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TraversalOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Options for [`transform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOptions {
    pub order: TraversalOrder,
    /// Work on a deep copy instead of the caller's tree.
    pub clone: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            order: TraversalOrder::default(),
            clone: true,
        }
    }
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_clone(mut self, clone: bool) -> Self {
        self.clone = clone;
        self
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Run `visitors` over `root`.
///
/// With no visitors the tree comes back unchanged: a copy when cloning, the
/// same reference otherwise.
pub async fn transform<'a>(
    root: &'a mut Node,
    visitors: &mut [BoxedVisitor],
    options: &TransformOptions,
) -> JsonrResult<Cow<'a, Node>> {
    tracing::debug!(
        order = %options.order,
        clone = options.clone,
        visitors = visitors.len(),
        "transform"
    );

    if !options.clone {
        if !visitors.is_empty() {
            transform_in_place(root, visitors, options.order).await?;
        }
        return Ok(Cow::Borrowed(root));
    }

    let mut copy = root.clone();
    if !visitors.is_empty() {
        transform_in_place(&mut copy, visitors, options.order).await?;
    }
    Ok(Cow::Owned(copy))
}

/// Run `visitors` over a tree the caller hands over.
///
/// The clone option has no effect: the tree is already exclusively owned.
pub async fn transform_owned(
    mut root: Node,
    visitors: &mut [BoxedVisitor],
    order: TraversalOrder,
) -> JsonrResult<Node> {
    if !visitors.is_empty() {
        transform_in_place(&mut root, visitors, order).await?;
    }
    Ok(root)
}

fn transform_in_place<'a>(
    root: &'a mut Node,
    visitors: &'a mut [BoxedVisitor],
    order: TraversalOrder,
) -> BoxFuture<'a, JsonrResult<()>> {
    async move {
        if let Node::Array(items) = root {
            for item in items.iter_mut() {
                transform_in_place(item, &mut *visitors, order).await?;
            }
            return Ok(());
        }
        if root.is_primitive() {
            let ctx = root_context();
            return apply_direct(visitors, root, &ctx).await;
        }
        match order {
            TraversalOrder::DepthFirstPre => depth_first_pre(root, visitors).await,
            TraversalOrder::DepthFirstPost => depth_first_post(root, visitors).await,
            TraversalOrder::BreadthFirst => breadth_first(root, visitors).await,
        }
    }
    .boxed()
}

// ============================================================================
// Transformer
// ============================================================================

/// A reusable set of visitors plus options, for running the same pass over
/// several trees.
#[derive(Default)]
pub struct Transformer {
    visitors: Vec<BoxedVisitor>,
    options: TransformOptions,
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("visitors", &self.visitors.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        Transformer {
            visitors: Vec::new(),
            options,
        }
    }

    /// Append a visitor; visitors run in the order they were added.
    pub fn with_visitor(mut self, visitor: impl TransformVisitor + 'static) -> Self {
        self.visitors.push(Box::new(visitor));
        self
    }

    pub fn push(&mut self, visitor: BoxedVisitor) {
        self.visitors.push(visitor);
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Run the pass over `root` according to the configured options.
    pub async fn apply<'a>(&mut self, root: &'a mut Node) -> JsonrResult<Cow<'a, Node>> {
        transform(root, &mut self.visitors, &self.options).await
    }

    /// Run the pass over an owned tree.
    pub async fn apply_owned(&mut self, root: Node) -> JsonrResult<Node> {
        transform_owned(root, &mut self.visitors, self.options.order).await
    }
}
