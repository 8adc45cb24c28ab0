//! Eager traversal: apply visitors to every node and mutate the tree.
//!
//! Three orders are supported:
//!
//! - **Pre-order** ([`depth_first_pre`]): enter, children, exit
//! - **Post-order** ([`depth_first_post`]): children, enter, exit
//! - **Breadth-first** ([`breadth_first`]): enter only, level by level
//!
//! # Node handling
//!
//! - Arrays are transparent. Their elements are visited in order at the
//!   array's depth, each with its position in the array as its index. Arrays
//!   themselves never reach a visitor.
//! - Primitives are visited wherever they occur, as leaves.
//! - Structured nodes descend into `children` with depth + 1 unless the skip
//!   latch is set or an enter visitor replaced the node.
//!
//! Visitor calls are awaited one at a time.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::context::{create_context, ParentInfo};
use crate::error::JsonrResult;
use crate::node::Node;
use crate::visitor::{run_phase, BoxedVisitor, Phase};

// ============================================================================
// Pre-order
// ============================================================================

/// Depth-first, pre-order traversal rooted at `root`.
pub async fn depth_first_pre(root: &mut Node, visitors: &mut [BoxedVisitor]) -> JsonrResult<()> {
    pre_order(root, visitors, None, 0, 0).await
}

fn pre_order<'a>(
    node: &'a mut Node,
    visitors: &'a mut [BoxedVisitor],
    parent: Option<Arc<ParentInfo>>,
    index: usize,
    depth: usize,
) -> BoxFuture<'a, JsonrResult<()>> {
    async move {
        if let Node::Array(items) = node {
            for (i, item) in items.iter_mut().enumerate() {
                pre_order(item, &mut *visitors, parent.clone(), i, depth).await?;
            }
            return Ok(());
        }

        let ctx = create_context(parent, index, depth);
        if run_phase(visitors, Phase::Enter, node, &ctx).await? {
            return Ok(());
        }

        if !ctx.should_skip_children() {
            if let Node::Component(component) = &mut *node {
                let info = Arc::new(ParentInfo::of(component));
                if let Some(children) = component.children_mut() {
                    pre_order(children, &mut *visitors, Some(info), 0, depth + 1).await?;
                }
            }
        }

        run_phase(visitors, Phase::Exit, node, &ctx).await?;
        Ok(())
    }
    .boxed()
}

// ============================================================================
// Post-order
// ============================================================================

/// Depth-first, post-order traversal rooted at `root`.
///
/// Children are fully processed before the parent's enter and exit visitors
/// run. The skip latch is checked before descent, as in pre-order; because
/// enter runs after descent here, a latch set during enter is recorded but
/// cannot retract children that were already visited.
pub async fn depth_first_post(root: &mut Node, visitors: &mut [BoxedVisitor]) -> JsonrResult<()> {
    post_order(root, visitors, None, 0, 0).await
}

fn post_order<'a>(
    node: &'a mut Node,
    visitors: &'a mut [BoxedVisitor],
    parent: Option<Arc<ParentInfo>>,
    index: usize,
    depth: usize,
) -> BoxFuture<'a, JsonrResult<()>> {
    async move {
        if let Node::Array(items) = node {
            for (i, item) in items.iter_mut().enumerate() {
                post_order(item, &mut *visitors, parent.clone(), i, depth).await?;
            }
            return Ok(());
        }

        let ctx = create_context(parent, index, depth);

        if !ctx.should_skip_children() {
            if let Node::Component(component) = &mut *node {
                let info = Arc::new(ParentInfo::of(component));
                if let Some(children) = component.children_mut() {
                    post_order(children, &mut *visitors, Some(info), 0, depth + 1).await?;
                }
            }
        }

        if run_phase(visitors, Phase::Enter, node, &ctx).await? {
            return Ok(());
        }
        run_phase(visitors, Phase::Exit, node, &ctx).await?;
        Ok(())
    }
    .boxed()
}

// ============================================================================
// Breadth-first
// ============================================================================

struct Queued<'a> {
    node: &'a mut Node,
    parent: Option<Arc<ParentInfo>>,
    index: usize,
    depth: usize,
}

/// Breadth-first traversal rooted at `root`.
///
/// Only enter visitors run; exit has no meaning without a way back up.
pub async fn breadth_first(root: &mut Node, visitors: &mut [BoxedVisitor]) -> JsonrResult<()> {
    let mut queue = VecDeque::new();
    queue.push_back(Queued {
        node: root,
        parent: None,
        index: 0,
        depth: 0,
    });

    while let Some(Queued {
        node,
        parent,
        index,
        depth,
    }) = queue.pop_front()
    {
        let node = match node {
            Node::Array(items) => {
                // Elements take the array's place in the queue.
                for (i, item) in items.iter_mut().enumerate().rev() {
                    queue.push_front(Queued {
                        node: item,
                        parent: parent.clone(),
                        index: i,
                        depth,
                    });
                }
                continue;
            }
            other => other,
        };

        let ctx = create_context(parent, index, depth);
        if run_phase(visitors, Phase::Enter, node, &ctx).await? {
            continue;
        }
        if ctx.should_skip_children() {
            continue;
        }

        if let Node::Component(component) = node {
            let info = Arc::new(ParentInfo::of(component));
            if let Some(children) = component.children_mut() {
                queue.push_back(Queued {
                    node: children,
                    parent: Some(info),
                    index: 0,
                    depth: depth + 1,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TransformContext;
    use crate::node::ComponentNode;
    use crate::visitor::{TransformVisitor, VisitOutcome, VisitResult};
    use async_trait::async_trait;
    use serde_json::json;

    fn label(node: &Node) -> String {
        match node {
            Node::Component(c) => c.type_name.clone(),
            other => other.to_json().to_string(),
        }
    }

    fn tree(value: serde_json::Value) -> Node {
        Node::from_json(&value).unwrap()
    }

    fn two_children() -> Node {
        tree(json!({"type": "root", "children": [{"type": "a"}, {"type": "b"}]}))
    }

    mod orders {
        use super::*;
        use std::sync::Mutex;

        struct SharedRecorder {
            log: Arc<Mutex<Vec<String>>>,
            skip: Option<&'static str>,
        }

        #[async_trait]
        impl TransformVisitor for SharedRecorder {
            async fn enter(&mut self, node: &mut Node, ctx: &TransformContext) -> VisitResult {
                if self.skip.is_some() && node.type_name() == self.skip {
                    ctx.skip_children();
                }
                self.log
                    .lock()
                    .unwrap()
                    .push(format!("enter-{}", label(node)));
                Ok(VisitOutcome::NoChange)
            }

            async fn exit(&mut self, node: &mut Node, _ctx: &TransformContext) -> VisitResult {
                self.log.lock().unwrap().push(format!("exit-{}", label(node)));
                Ok(VisitOutcome::NoChange)
            }
        }

        fn recorder(skip: Option<&'static str>) -> (Vec<BoxedVisitor>, Arc<Mutex<Vec<String>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let visitor = SharedRecorder {
                log: Arc::clone(&log),
                skip,
            };
            (vec![Box::new(visitor)], log)
        }

        fn taken(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
            log.lock().unwrap().clone()
        }

        #[tokio::test]
        async fn pre_order_enters_parent_first() {
            let mut root = two_children();
            let (mut visitors, log) = recorder(None);
            depth_first_pre(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-root", "enter-a", "exit-a", "enter-b", "exit-b", "exit-root"]
            );
        }

        #[tokio::test]
        async fn post_order_processes_children_first() {
            let mut root = two_children();
            let (mut visitors, log) = recorder(None);
            depth_first_post(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-a", "exit-a", "enter-b", "exit-b", "enter-root", "exit-root"]
            );
        }

        #[tokio::test]
        async fn breadth_first_enters_level_by_level_without_exit() {
            let mut root = tree(json!({
                "type": "root",
                "children": [{"type": "a"}, {"type": "b", "children": [{"type": "c"}]}]
            }));
            let (mut visitors, log) = recorder(None);
            breadth_first(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-root", "enter-a", "enter-b", "enter-c"]
            );
        }

        #[tokio::test]
        async fn pre_order_skip_still_runs_exit() {
            let mut root = tree(json!({
                "type": "div",
                "children": [{"type": "span"}, {"type": "p"}]
            }));
            let (mut visitors, log) = recorder(Some("div"));
            depth_first_pre(&mut root, &mut visitors).await.unwrap();
            assert_eq!(taken(&log), vec!["enter-div", "exit-div"]);
        }

        #[tokio::test]
        async fn post_order_skip_in_enter_cannot_retract_children() {
            // Children are visited before enter sets the latch.
            let mut root = tree(json!({"type": "div", "children": [{"type": "span"}]}));
            let (mut visitors, log) = recorder(Some("div"));
            depth_first_post(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-span", "exit-span", "enter-div", "exit-div"]
            );
        }

        #[tokio::test]
        async fn breadth_first_skip_stops_enqueueing() {
            let mut root = tree(json!({
                "type": "root",
                "children": [
                    {"type": "a", "children": [{"type": "hidden"}]},
                    {"type": "b", "children": [{"type": "shown"}]}
                ]
            }));
            let (mut visitors, log) = recorder(Some("a"));
            breadth_first(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-root", "enter-a", "enter-b", "enter-shown"]
            );
        }

        #[tokio::test]
        async fn breadth_first_keeps_cousins_in_document_order() {
            let mut root = tree(json!({
                "type": "root",
                "children": [
                    {"type": "a", "children": [{"type": "a1"}, {"type": "a2"}]},
                    {"type": "b", "children": {"type": "b1"}}
                ]
            }));
            let (mut visitors, log) = recorder(None);
            breadth_first(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-root", "enter-a", "enter-b", "enter-a1", "enter-a2", "enter-b1"]
            );
        }

        #[tokio::test]
        async fn primitive_children_are_visited_as_leaves() {
            let mut root = tree(json!({"type": "p", "children": ["hi", 2]}));
            let (mut visitors, log) = recorder(None);
            depth_first_pre(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec!["enter-p", "enter-\"hi\"", "exit-\"hi\"", "enter-2", "exit-2", "exit-p"]
            );
        }

        #[tokio::test]
        async fn nested_arrays_are_transparent() {
            let mut root = tree(json!({
                "type": "ul",
                "children": [[{"type": "li"}, {"type": "li"}], {"type": "hr"}]
            }));
            let (mut visitors, log) = recorder(None);
            depth_first_pre(&mut root, &mut visitors).await.unwrap();
            assert_eq!(
                taken(&log),
                vec![
                    "enter-ul", "enter-li", "exit-li", "enter-li", "exit-li", "enter-hr",
                    "exit-hr", "exit-ul"
                ]
            );
        }
    }

    mod contexts {
        use super::*;
        use std::sync::Mutex;

        type Seen = Arc<Mutex<Vec<(String, usize, usize, Option<String>)>>>;

        struct ContextProbe(Seen);

        #[async_trait]
        impl TransformVisitor for ContextProbe {
            async fn enter(&mut self, node: &mut Node, ctx: &TransformContext) -> VisitResult {
                self.0.lock().unwrap().push((
                    label(node),
                    ctx.depth(),
                    ctx.index(),
                    ctx.parent().map(|p| p.type_name.clone()),
                ));
                Ok(VisitOutcome::NoChange)
            }
        }

        #[tokio::test]
        async fn depth_index_and_parent_are_reported() {
            let mut root = tree(json!({
                "type": "root",
                "children": [{"type": "a"}, {"type": "b", "children": {"type": "c"}}]
            }));
            let seen: Seen = Arc::default();
            let mut visitors: Vec<BoxedVisitor> = vec![Box::new(ContextProbe(Arc::clone(&seen)))];
            depth_first_pre(&mut root, &mut visitors).await.unwrap();
            let seen = seen.lock().unwrap().clone();
            assert_eq!(
                seen,
                vec![
                    ("root".to_string(), 0, 0, None),
                    ("a".to_string(), 1, 0, Some("root".to_string())),
                    ("b".to_string(), 1, 1, Some("root".to_string())),
                    ("c".to_string(), 2, 0, Some("b".to_string())),
                ]
            );
        }

        #[tokio::test]
        async fn breadth_first_reports_same_contexts() {
            let mut root = tree(json!({
                "type": "root",
                "children": [{"type": "a", "children": "x"}, {"type": "b"}]
            }));
            let seen: Seen = Arc::default();
            let mut visitors: Vec<BoxedVisitor> = vec![Box::new(ContextProbe(Arc::clone(&seen)))];
            breadth_first(&mut root, &mut visitors).await.unwrap();
            let seen = seen.lock().unwrap().clone();
            assert_eq!(
                seen,
                vec![
                    ("root".to_string(), 0, 0, None),
                    ("a".to_string(), 1, 0, Some("root".to_string())),
                    ("b".to_string(), 1, 1, Some("root".to_string())),
                    ("\"x\"".to_string(), 2, 0, Some("a".to_string())),
                ]
            );
        }
    }

    mod replacement {
        use super::*;

        struct SwapType {
            from: &'static str,
            to: Node,
        }

        #[async_trait]
        impl TransformVisitor for SwapType {
            async fn enter(&mut self, node: &mut Node, _ctx: &TransformContext) -> VisitResult {
                if node.type_name() == Some(self.from) {
                    return Ok(VisitOutcome::Replace(self.to.clone()));
                }
                Ok(VisitOutcome::NoChange)
            }
        }

        #[tokio::test]
        async fn replacement_is_written_and_not_retraversed() {
            let mut root = tree(json!({
                "type": "div",
                "children": [{"type": "old", "children": [{"type": "inner"}]}]
            }));
            let replacement: Node = ComponentNode::new("new")
                .with_children(vec![ComponentNode::new("fresh").into()])
                .into();
            let mut visitors: Vec<BoxedVisitor> = vec![Box::new(SwapType {
                from: "old",
                to: replacement.clone(),
            })];
            depth_first_pre(&mut root, &mut visitors).await.unwrap();
            let children = root.as_component().unwrap().children().unwrap();
            let Node::Array(items) = children else {
                panic!("expected array children");
            };
            assert_eq!(items[0], replacement);
        }

        #[tokio::test]
        async fn post_order_replacement_lands_after_children() {
            let mut root = tree(json!({"type": "old", "children": [{"type": "leaf"}]}));
            let mut visitors: Vec<BoxedVisitor> = vec![Box::new(SwapType {
                from: "old",
                to: Node::text("gone"),
            })];
            depth_first_post(&mut root, &mut visitors).await.unwrap();
            assert_eq!(root, Node::text("gone"));
        }
    }
}
