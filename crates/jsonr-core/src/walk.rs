//! Lazy traversal: iterate `(node, context)` pairs without running visitors.
//!
//! [`walk`] borrows the tree and yields [`WalkItem`]s in any of the three
//! traversal orders. Calling `item.context.skip_children()` on the most
//! recently yielded structured node, before asking for the next item, keeps
//! the walker out of that node's children (pre-order and breadth-first; in
//! post-order the children have already been yielded).
//!
//! ```ignore
//! let options = WalkOptions::new().with_types(["section"]);
//! for item in walk(&tree, &options) {
//!     println!("{} at depth {}", item.node.type_name().unwrap_or(""), item.context.depth());
//!     item.context.skip_children();
//! }
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use crate::context::{create_context, ParentInfo, SkipLatch, TransformContext};
use crate::node::{ComponentNode, Node};
use crate::transform::TraversalOrder;

/// Options for [`walk`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOptions {
    pub order: TraversalOrder,
    /// Yield only structured nodes of these types. Primitives are excluded
    /// while a filter is set; unmatched nodes are still descended into.
    pub node_types: Option<BTreeSet<String>>,
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    fn matches(&self, node: &Node) -> bool {
        match &self.node_types {
            None => true,
            Some(types) => node.type_name().is_some_and(|t| types.contains(t)),
        }
    }
}

/// One visited node and its context.
#[derive(Debug, Clone)]
pub struct WalkItem<'a> {
    pub node: &'a Node,
    pub context: TransformContext,
}

/// Start a fresh walk over `root`.
pub fn walk<'a>(root: &'a Node, options: &WalkOptions) -> Walk<'a> {
    let mut frontier = VecDeque::new();
    frontier.push_back(Step::Visit(Frame {
        node: root,
        parent: None,
        index: 0,
        depth: 0,
    }));
    Walk {
        options: options.clone(),
        frontier,
        pending: None,
    }
}

struct Frame<'a> {
    node: &'a Node,
    parent: Option<Arc<ParentInfo>>,
    index: usize,
    depth: usize,
}

enum Step<'a> {
    Visit(Frame<'a>),
    /// Post-order: yield a node whose children have been scheduled ahead.
    Emit(&'a Node, TransformContext),
}

/// Children of a yielded node, expanded on the next call unless skipped.
struct Pending<'a> {
    component: &'a ComponentNode,
    latch: SkipLatch,
    depth: usize,
}

/// Iterator returned by [`walk`].
pub struct Walk<'a> {
    options: WalkOptions,
    frontier: VecDeque<Step<'a>>,
    pending: Option<Pending<'a>>,
}

impl<'a> Walk<'a> {
    fn expand(&mut self, component: &'a ComponentNode, depth: usize) {
        let Some(children) = component.children() else {
            return;
        };
        let frame = Frame {
            node: children,
            parent: Some(Arc::new(ParentInfo::of(component))),
            index: 0,
            depth: depth + 1,
        };
        match self.options.order {
            TraversalOrder::BreadthFirst => self.frontier.push_back(Step::Visit(frame)),
            _ => self.frontier.push_front(Step::Visit(frame)),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            if !pending.latch.is_set() {
                self.expand(pending.component, pending.depth);
            }
        }

        while let Some(step) = self.frontier.pop_front() {
            let frame = match step {
                Step::Emit(node, context) => {
                    if self.options.matches(node) {
                        return Some(WalkItem { node, context });
                    }
                    continue;
                }
                Step::Visit(frame) => frame,
            };

            let node = frame.node;
            if let Node::Array(items) = node {
                // Elements take the array's place in the frontier.
                for (i, item) in items.iter().enumerate().rev() {
                    self.frontier.push_front(Step::Visit(Frame {
                        node: item,
                        parent: frame.parent.clone(),
                        index: i,
                        depth: frame.depth,
                    }));
                }
                continue;
            }

            let context = create_context(frame.parent, frame.index, frame.depth);
            let Node::Component(component) = node else {
                if self.options.matches(node) {
                    return Some(WalkItem { node, context });
                }
                continue;
            };

            if self.options.order == TraversalOrder::DepthFirstPost {
                self.frontier.push_front(Step::Emit(node, context));
                self.expand(component, frame.depth);
                continue;
            }

            if self.options.matches(node) {
                self.pending = Some(Pending {
                    component,
                    latch: context.latch(),
                    depth: frame.depth,
                });
                return Some(WalkItem { node, context });
            }
            self.expand(component, frame.depth);
        }
        None
    }
}
