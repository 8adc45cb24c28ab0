//! Node-to-element mapping.
//!
//! [`render`] converts a (possibly transformed) node tree into a [`Rendered`]
//! tree. Data-shape problems never fail a render: they are reported through
//! the context's diagnostic sink and recovered locally.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use jsonr_core::{
    default_sink, ComponentNode, Diagnostic, EventHandler, Node, Primitive, PropValue, Props,
    SharedSink, CONTAINER_PROP,
};
use serde_json::Value;

use crate::element::{PortalTarget, Rendered};
use crate::registry::{Registry, Resolved};

/// Default prefix identifying event-handler props.
pub const DEFAULT_HANDLER_PREFIX: &str = "on";

/// Everything the renderer needs besides the tree and the registry.
#[derive(Clone)]
pub struct RenderContext {
    event_handlers: BTreeMap<String, EventHandler>,
    handler_prefix: String,
    targets: BTreeSet<String>,
    warn_on_missing_handlers: bool,
    sink: SharedSink,
}

impl Default for RenderContext {
    fn default() -> Self {
        RenderContext {
            event_handlers: BTreeMap::new(),
            handler_prefix: DEFAULT_HANDLER_PREFIX.to_string(),
            targets: BTreeSet::new(),
            warn_on_missing_handlers: true,
            sink: default_sink(),
        }
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("event_handlers", &self.event_handlers.keys().collect::<Vec<_>>())
            .field("handler_prefix", &self.handler_prefix)
            .field("targets", &self.targets)
            .field("warn_on_missing_handlers", &self.warn_on_missing_handlers)
            .finish()
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name.
    pub fn with_handler(mut self, handler: EventHandler) -> Self {
        self.event_handlers
            .insert(handler.name().to_string(), handler);
        self
    }

    pub fn with_handlers(mut self, handlers: impl IntoIterator<Item = EventHandler>) -> Self {
        for handler in handlers {
            self = self.with_handler(handler);
        }
        self
    }

    pub fn with_handler_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.handler_prefix = prefix.into();
        self
    }

    /// Declare a portal target that selectors may resolve to.
    pub fn with_target(mut self, selector: impl Into<String>) -> Self {
        self.targets.insert(selector.into());
        self
    }

    /// Whether an unresolved handler name emits a diagnostic (default true).
    ///
    /// Turn this off when an earlier pass already reported unresolved names.
    pub fn warn_on_missing_handlers(mut self, warn: bool) -> Self {
        self.warn_on_missing_handlers = warn;
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn handler(&self, name: &str) -> Option<&EventHandler> {
        self.event_handlers.get(name)
    }

    pub fn handler_prefix(&self) -> &str {
        &self.handler_prefix
    }

    pub fn has_target(&self, selector: &str) -> bool {
        self.targets.contains(selector)
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }
}

/// Render `node` through `registry`.
pub fn render(node: &Node, registry: &Registry, ctx: &RenderContext) -> Rendered {
    tracing::debug!(
        kind = %node.kind(),
        registry = registry.len(),
        handlers = ctx.event_handlers.len(),
        "render"
    );
    render_node(node, registry, ctx)
}

fn render_node(node: &Node, registry: &Registry, ctx: &RenderContext) -> Rendered {
    match node {
        Node::Primitive(p) => render_primitive(p),
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                push_flattened(&mut out, item, registry, ctx);
            }
            Rendered::List(out)
        }
        Node::Component(component) => render_component(component, registry, ctx),
    }
}

fn render_primitive(primitive: &Primitive) -> Rendered {
    match primitive {
        Primitive::String(s) => Rendered::Text(s.clone()),
        Primitive::Number(n) => Rendered::Number(n.clone()),
        Primitive::Absent | Primitive::Null | Primitive::Bool(_) => Rendered::Empty,
    }
}

/// Render `node` into `out`, splicing arrays in place and dropping empties.
fn push_flattened(out: &mut Vec<Rendered>, node: &Node, registry: &Registry, ctx: &RenderContext) {
    if let Node::Array(items) = node {
        for item in items {
            push_flattened(out, item, registry, ctx);
        }
        return;
    }
    let rendered = render_node(node, registry, ctx);
    if !rendered.is_empty() {
        out.push(rendered);
    }
}

fn render_children(node: &ComponentNode, registry: &Registry, ctx: &RenderContext) -> Vec<Rendered> {
    let mut out = Vec::new();
    if let Some(children) = node.children() {
        push_flattened(&mut out, children, registry, ctx);
    }
    out
}

fn render_component(node: &ComponentNode, registry: &Registry, ctx: &RenderContext) -> Rendered {
    let Some(resolved) = registry.resolve(&node.type_name) else {
        ctx.sink.emit(Diagnostic::unknown_type(&node.type_name));
        return Rendered::Empty;
    };

    let key = node.key.clone().or_else(|| node.id.clone());
    let children = render_children(node, registry, ctx);

    match resolved {
        Resolved::Fragment => Rendered::Fragment { key, children },
        Resolved::Portal => Rendered::Portal {
            target: portal_target(node.prop(CONTAINER_PROP), ctx),
            key,
            children,
        },
        Resolved::Tag(tag) => Rendered::Element {
            tag: tag.to_string(),
            key,
            props: resolve_props(node.props.as_ref(), ctx),
            children,
        },
        Resolved::Factory(factory) => factory
            .create(resolve_props(node.props.as_ref(), ctx), children)
            .with_key(key),
    }
}

/// Swap string handler names under the prefix for registered handlers.
fn resolve_props(props: Option<&Props>, ctx: &RenderContext) -> Props {
    let Some(props) = props else {
        return Props::new();
    };
    props
        .iter()
        .map(|(name, value)| {
            let resolved = match value {
                PropValue::Json(Value::String(handler_name))
                    if name.starts_with(ctx.handler_prefix.as_str()) =>
                {
                    match ctx.handler(handler_name) {
                        Some(handler) => PropValue::Handler(handler.clone()),
                        None => {
                            if ctx.warn_on_missing_handlers {
                                ctx.sink.emit(Diagnostic::unresolved_handler(handler_name));
                            }
                            value.clone()
                        }
                    }
                }
                _ => value.clone(),
            };
            (name.clone(), resolved)
        })
        .collect()
}

fn portal_target(container: Option<&PropValue>, ctx: &RenderContext) -> PortalTarget {
    match container {
        Some(PropValue::Target(target)) => PortalTarget::Named(target.id().to_string()),
        Some(PropValue::Json(Value::String(selector))) => {
            if ctx.has_target(selector) {
                PortalTarget::Named(selector.clone())
            } else {
                ctx.sink.emit(Diagnostic::unresolved_target(selector));
                PortalTarget::Root
            }
        }
        None | Some(PropValue::Json(Value::Null)) => PortalTarget::Root,
        Some(other) => {
            ctx.sink
                .emit(Diagnostic::unresolved_target(other.to_json().to_string()));
            PortalTarget::Root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonr_core::{create_group, create_redirect, CollectingSink, DiagnosticKind, TargetRef};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn node(value: Value) -> Node {
        Node::from_json(&value).unwrap()
    }

    fn collecting() -> (RenderContext, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        (RenderContext::new().with_sink(sink.clone()), sink)
    }

    mod primitives {
        use super::*;

        #[test]
        fn primitives_render_verbatim() {
            let registry = Registry::default();
            let ctx = RenderContext::new();
            assert_eq!(render(&Node::text("hi"), &registry, &ctx), Rendered::text("hi"));
            assert_eq!(
                render(&Node::from(42), &registry, &ctx),
                Rendered::Number(42.into())
            );
            assert!(render(&Node::null(), &registry, &ctx).is_empty());
            assert!(render(&Node::absent(), &registry, &ctx).is_empty());
            assert!(render(&Node::from(true), &registry, &ctx).is_empty());
        }

        #[test]
        fn arrays_render_in_order_with_mixed_siblings() {
            let tree = node(json!([
                "Text node",
                42,
                {"type": "span", "children": "Element node"}
            ]));
            let rendered = render(&tree, &Registry::default(), &RenderContext::new());
            assert_eq!(
                rendered.to_json(),
                json!([
                    "Text node",
                    42,
                    {"element": "span", "children": ["Element node"]}
                ])
            );
        }

        #[test]
        fn nested_arrays_flatten_into_parent() {
            let tree = node(json!({
                "type": "ul",
                "children": [[{"type": "li", "key": "a"}, null], [[{"type": "li", "key": "b"}]]]
            }));
            let rendered = render(&tree, &Registry::default(), &RenderContext::new());
            let keys: Vec<_> = rendered.children().iter().map(|c| c.key()).collect();
            assert_eq!(keys, vec![Some("a"), Some("b")]);
        }
    }

    mod components {
        use super::*;

        #[test]
        fn unknown_types_render_nothing_and_report() {
            let (ctx, sink) = collecting();
            let registry = Registry::default().deny("blink");
            let tree = node(json!({"type": "div", "children": [{"type": "blink"}, "ok"]}));
            let rendered = render(&tree, &registry, &ctx);
            assert_eq!(rendered.to_markup(), "<div>ok</div>");
            let diagnostics = sink.take();
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownType);
            assert_eq!(diagnostics[0].subject, "blink");
        }

        #[test]
        fn key_falls_back_to_id() {
            let registry = Registry::default();
            let ctx = RenderContext::new();
            let keyed = render(&node(json!({"type": "a", "key": "k", "id": "i"})), &registry, &ctx);
            let by_id = render(&node(json!({"type": "a", "id": "i"})), &registry, &ctx);
            let none = render(&node(json!({"type": "a"})), &registry, &ctx);
            assert_eq!(keyed.key(), Some("k"));
            assert_eq!(by_id.key(), Some("i"));
            assert_eq!(none.key(), None);
        }

        #[test]
        fn factories_receive_props_and_rendered_children() {
            let registry = Registry::default().with_factory("Card", |props: Props, children: Vec<Rendered>| {
                let title = props
                    .get("title")
                    .and_then(PropValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                let heading = Rendered::element("h2", None, Props::new(), vec![Rendered::text(title)]);
                let mut body = vec![heading];
                body.extend(children);
                Rendered::element("section", None, Props::new(), body)
            });
            let tree = node(json!({
                "type": "Card",
                "key": "c1",
                "props": {"title": "Hello"},
                "children": {"type": "p", "children": "body"}
            }));
            let rendered = render(&tree, &registry, &RenderContext::new());
            assert_eq!(rendered.key(), Some("c1"));
            assert_eq!(
                rendered.to_markup(),
                "<section><h2>Hello</h2><p>body</p></section>"
            );
        }

        #[test]
        fn groups_render_without_wrapper() {
            let tree = create_group(vec![Node::text("a"), Node::text("b")], Some("g"));
            let rendered = render(&tree, &Registry::default(), &RenderContext::new());
            assert_eq!(rendered.key(), Some("g"));
            assert_eq!(rendered.to_markup(), "ab");
        }
    }

    mod handlers {
        use super::*;

        #[test]
        fn handler_names_resolve_to_functions() {
            let calls = Arc::new(Mutex::new(0));
            let counter = Arc::clone(&calls);
            let ctx = RenderContext::new().with_handler(EventHandler::new("handleClick", move |_| {
                *counter.lock().unwrap() += 1;
            }));
            let tree = node(json!({
                "type": "button",
                "props": {"onClick": "handleClick", "className": "primary"},
                "children": "Click me"
            }));
            let rendered = render(&tree, &Registry::default(), &ctx);
            let Rendered::Element { props, .. } = &rendered else {
                panic!("expected an element");
            };
            props["onClick"].as_handler().unwrap().call(&json!({}));
            assert_eq!(*calls.lock().unwrap(), 1);
            assert_eq!(props["className"].as_str(), Some("primary"));
        }

        #[test]
        fn unresolved_handlers_pass_through_with_diagnostic() {
            let (ctx, sink) = collecting();
            let tree = node(json!({"type": "button", "props": {"onClick": "missing"}}));
            let rendered = render(&tree, &Registry::default(), &ctx);
            let Rendered::Element { props, .. } = &rendered else {
                panic!("expected an element");
            };
            assert_eq!(props["onClick"].as_str(), Some("missing"));
            let diagnostics = sink.take();
            assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedHandler);
            assert_eq!(diagnostics[0].message, "Event handler not found: missing");
        }

        #[test]
        fn custom_prefix_limits_which_props_resolve() {
            let (ctx, sink) = collecting();
            let ctx = ctx.with_handler_prefix("handle");
            let tree = node(json!({"type": "x", "props": {"onClick": "nope", "handleTap": "tap"}}));
            render(&tree, &Registry::default(), &ctx);
            let subjects: Vec<_> = sink.take().into_iter().map(|d| d.subject).collect();
            assert_eq!(subjects, vec!["tap"]);
        }

        #[test]
        fn missing_handler_warnings_can_be_silenced() {
            let (ctx, sink) = collecting();
            let ctx = ctx.warn_on_missing_handlers(false);
            let tree = node(json!({"type": "button", "props": {"onClick": "missing"}}));
            let rendered = render(&tree, &Registry::default(), &ctx);
            let Rendered::Element { props, .. } = &rendered else {
                panic!("expected an element");
            };
            assert_eq!(props["onClick"].as_str(), Some("missing"));
            assert!(sink.is_empty());
        }
    }

    mod portals {
        use super::*;

        #[test]
        fn known_selectors_resolve() {
            let ctx = RenderContext::new().with_target("#modal");
            let tree = create_redirect("#modal", Node::text("hi"), None);
            let rendered = render(&tree, &Registry::default(), &ctx);
            assert_eq!(
                rendered.to_markup(),
                "<template data-portal=\"#modal\">hi</template>"
            );
        }

        #[test]
        fn unknown_selectors_fall_back_to_root() {
            let (ctx, sink) = collecting();
            let tree = create_redirect("#nowhere", Node::text("hi"), Some("p"));
            let rendered = render(&tree, &Registry::default(), &ctx);
            let Rendered::Portal { target, key, .. } = &rendered else {
                panic!("expected a portal");
            };
            assert_eq!(target, &PortalTarget::Root);
            assert_eq!(key.as_deref(), Some("p"));
            assert_eq!(sink.take()[0].kind, DiagnosticKind::UnresolvedTarget);
        }

        #[test]
        fn direct_target_references_are_used_as_is() {
            let (ctx, sink) = collecting();
            let tree = create_redirect(TargetRef::new("overlay"), Node::text("x"), None);
            let rendered = render(&tree, &Registry::default(), &ctx);
            assert!(matches!(
                rendered,
                Rendered::Portal { target: PortalTarget::Named(ref name), .. } if name == "overlay"
            ));
            assert!(sink.is_empty());
        }
    }
}
