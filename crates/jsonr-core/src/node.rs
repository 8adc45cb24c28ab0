//! Node model for declarative JSON UI trees.
//!
//! A tree is made of three kinds of values:
//!
//! - **Primitive**: string, number, boolean, null, or absent
//! - **Structured**: a [`ComponentNode`] with a `type` and optional props,
//!   children, key and id
//! - **Array**: an ordered sequence of nodes, flattened into sibling output
//!
//! Classification is exhaustive: every [`Node`] is exactly one of the three,
//! and every traversal and render entry point matches on [`Node`] directly.
//!
//! ## JSON Codec
//!
//! Nodes decode from any `serde_json::Value` and encode back to JSON. Objects
//! must carry a non-empty string `type`. Optional fields that are absent are
//! omitted on output, so trees built with the constructors below compare by
//! deep equality with their decoded JSON form.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{JsonrError, JsonrResult};

/// Reserved type name for wrapper-less grouping of children.
pub const FRAGMENT: &str = "Fragment";

/// Reserved type name for rendering children into an out-of-tree target.
pub const PORTAL: &str = "Portal";

/// Prop name the redirection marker reads its target from.
pub const CONTAINER_PROP: &str = "container";

// ============================================================================
// Primitive values
// ============================================================================

/// A leaf value in the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Primitive {
    /// An omitted value. Encodes as JSON `null`.
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Primitive {
    fn to_json(&self) -> Value {
        match self {
            Primitive::Absent | Primitive::Null => Value::Null,
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Number(n) => Value::Number(n.clone()),
            Primitive::String(s) => Value::String(s.clone()),
        }
    }
}

// ============================================================================
// Prop values
// ============================================================================

/// Signature of an event handler function.
pub type HandlerFn = dyn Fn(&Value) + Send + Sync;

/// A named, resolved event handler.
///
/// Cloning a handler shares the underlying function; two handlers are equal
/// when they carry the same name and point at the same function.
#[derive(Clone)]
pub struct EventHandler {
    name: String,
    func: Arc<HandlerFn>,
}

impl EventHandler {
    /// Create a handler from a name and a function.
    pub fn new(name: impl Into<String>, func: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        EventHandler {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The name the handler was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the handler with an event payload.
    pub fn call(&self, event: &Value) {
        (self.func)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventHandler").field(&self.name).finish()
    }
}

/// A direct reference to a redirection target, as opposed to a selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef(String);

impl TargetRef {
    /// Create a reference to the target with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        TargetRef(id.into())
    }

    /// The target id.
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// The value of a single prop.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Plain JSON data.
    Json(Value),
    /// A resolved event handler.
    Handler(EventHandler),
    /// A direct redirection target.
    Target(TargetRef),
}

impl PropValue {
    /// The string value, if this is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The handler, if this prop has been resolved to one.
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Encode as JSON. Handlers and targets encode as their names so that a
    /// serialized tree resolves again on the next render.
    pub fn to_json(&self) -> Value {
        match self {
            PropValue::Json(v) => v.clone(),
            PropValue::Handler(h) => Value::String(h.name().to_string()),
            PropValue::Target(t) => Value::String(t.id().to_string()),
        }
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Json(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Json(Value::String(value.to_string()))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Json(Value::String(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Json(Value::Bool(value))
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

impl From<TargetRef> for PropValue {
    fn from(value: TargetRef) -> Self {
        PropValue::Target(value)
    }
}

/// Props of a structured node, ordered by name.
pub type Props = BTreeMap<String, PropValue>;

// ============================================================================
// Structured nodes
// ============================================================================

/// A structured node describing one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    /// Registry key or generic tag name. Never empty.
    pub type_name: String,
    pub props: Option<Props>,
    /// A single child, or several as a [`Node::Array`].
    pub children: Option<Box<Node>>,
    pub key: Option<String>,
    pub id: Option<String>,
}

impl ComponentNode {
    /// Create a node with only a type.
    ///
    /// `type_name` must not be empty; use [`ComponentNode::try_new`] for names
    /// that come from outside the program.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        debug_assert!(!type_name.is_empty(), "structured node type must not be empty");
        ComponentNode {
            type_name,
            props: None,
            children: None,
            key: None,
            id: None,
        }
    }

    /// Create a node with only a type, rejecting an empty type.
    pub fn try_new(type_name: impl Into<String>) -> JsonrResult<Self> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(JsonrError::invalid_node("$", "type must not be empty"));
        }
        Ok(ComponentNode::new(type_name))
    }

    /// Builder: set the props.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    /// Builder: set one prop.
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set_prop(name, value);
        self
    }

    /// Builder: set the children.
    pub fn with_children(mut self, children: impl Into<Node>) -> Self {
        self.children = Some(Box::new(children.into()));
        self
    }

    /// Builder: set the key. Empty keys are ignored.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = non_empty(key.into());
        self
    }

    /// Builder: set the id. Empty ids are ignored.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = non_empty(id.into());
        self
    }

    /// Look up a prop.
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.as_ref().and_then(|props| props.get(name))
    }

    /// Set a prop, creating the props map if needed.
    pub fn set_prop(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.props
            .get_or_insert_with(Props::new)
            .insert(name.into(), value.into());
    }

    /// The children, if any.
    pub fn children(&self) -> Option<&Node> {
        self.children.as_deref()
    }

    /// Mutable access to the children, if any.
    pub fn children_mut(&mut self) -> Option<&mut Node> {
        self.children.as_deref_mut()
    }

    /// Whether this is the grouping marker.
    pub fn is_group(&self) -> bool {
        self.type_name == FRAGMENT
    }

    /// Whether this is the redirection marker.
    pub fn is_redirect(&self) -> bool {
        self.type_name == PORTAL
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String(self.type_name.clone()));
        if let Some(props) = &self.props {
            let props = props
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            obj.insert("props".to_string(), Value::Object(props));
        }
        if let Some(children) = &self.children {
            obj.insert("children".to_string(), children.to_json());
        }
        if let Some(key) = &self.key {
            obj.insert("key".to_string(), Value::String(key.clone()));
        }
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        Value::Object(obj)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// ============================================================================
// Node
// ============================================================================

/// Classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Primitive,
    Array,
    Structured,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Primitive => "primitive",
            NodeKind::Array => "array",
            NodeKind::Structured => "structured",
        };
        f.write_str(name)
    }
}

/// A value in the declarative tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(Primitive),
    Array(Vec<Node>),
    Component(ComponentNode),
}

impl Default for Node {
    fn default() -> Self {
        Node::Primitive(Primitive::Absent)
    }
}

impl Node {
    /// The absent value.
    pub fn absent() -> Self {
        Node::Primitive(Primitive::Absent)
    }

    /// JSON `null`.
    pub fn null() -> Self {
        Node::Primitive(Primitive::Null)
    }

    /// A text leaf.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Primitive(Primitive::String(value.into()))
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Primitive(_) => NodeKind::Primitive,
            Node::Array(_) => NodeKind::Array,
            Node::Component(_) => NodeKind::Structured,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Node::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Node::Component(_))
    }

    pub fn as_component(&self) -> Option<&ComponentNode> {
        match self {
            Node::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut ComponentNode> {
        match self {
            Node::Component(c) => Some(c),
            _ => None,
        }
    }

    /// The string value of a text leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Primitive(Primitive::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The type name of a structured node.
    pub fn type_name(&self) -> Option<&str> {
        self.as_component().map(|c| c.type_name.as_str())
    }

    /// Decode a node from JSON.
    pub fn from_json(value: &Value) -> JsonrResult<Node> {
        decode(value, "$")
    }

    /// Encode this node as JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Primitive(p) => p.to_json(),
            Node::Array(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Component(c) => c.to_json(),
        }
    }
}

fn decode(value: &Value, path: &str) -> JsonrResult<Node> {
    let node = match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::Primitive(Primitive::Bool(*b)),
        Value::Number(n) => Node::Primitive(Primitive::Number(n.clone())),
        Value::String(s) => Node::text(s.clone()),
        Value::Array(items) => Node::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode(item, &format!("{}[{}]", path, i)))
                .collect::<JsonrResult<Vec<_>>>()?,
        ),
        Value::Object(obj) => Node::Component(decode_component(obj, path)?),
    };
    Ok(node)
}

fn decode_component(obj: &Map<String, Value>, path: &str) -> JsonrResult<ComponentNode> {
    let type_name = match obj.get("type") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::String(_)) => {
            return Err(JsonrError::invalid_node(path, "type must not be empty"))
        }
        Some(_) => return Err(JsonrError::invalid_node(path, "type must be a string")),
        None => return Err(JsonrError::invalid_node(path, "object is missing a type")),
    };

    let props = match obj.get("props") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(
            map.iter()
                .map(|(name, value)| (name.clone(), PropValue::Json(value.clone())))
                .collect(),
        ),
        Some(_) => {
            return Err(JsonrError::invalid_node(
                format!("{}.props", path),
                "props must be an object",
            ))
        }
    };

    let children = match obj.get("children") {
        None | Some(Value::Null) => None,
        Some(value) => Some(Box::new(decode(value, &format!("{}.children", path))?)),
    };

    Ok(ComponentNode {
        type_name,
        props,
        children,
        key: decode_ident(obj, "key", path)?,
        id: decode_ident(obj, "id", path)?,
    })
}

fn decode_ident(obj: &Map<String, Value>, field: &str, path: &str) -> JsonrResult<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_empty(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(JsonrError::invalid_node(
            format!("{}.{}", path, field),
            format!("{} must be a string", field),
        )),
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_json(&value).map_err(D::Error::custom)
    }
}

impl From<ComponentNode> for Node {
    fn from(value: ComponentNode) -> Self {
        Node::Component(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Array(value)
    }
}

impl From<Primitive> for Node {
    fn from(value: Primitive) -> Self {
        Node::Primitive(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::text(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::text(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Primitive(Primitive::Bool(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Primitive(Primitive::Number(value.into()))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Primitive(Primitive::Number(value.into()))
    }
}

impl From<f64> for Node {
    /// Non-finite numbers have no JSON form and become `null`.
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => Node::Primitive(Primitive::Number(n)),
            None => Node::null(),
        }
    }
}

// ============================================================================
// Predicates and constructors
// ============================================================================

pub fn is_primitive(node: &Node) -> bool {
    node.is_primitive()
}

pub fn is_array(node: &Node) -> bool {
    node.is_array()
}

pub fn is_structured(node: &Node) -> bool {
    node.is_structured()
}

/// Create a structured node, omitting every optional field that is `None`.
///
/// Fails with an invalid-node error when `type_name` is empty.
pub fn create_node(
    type_name: impl Into<String>,
    props: Option<Props>,
    children: Option<Node>,
    key: Option<&str>,
    id: Option<&str>,
) -> JsonrResult<Node> {
    let node = ComponentNode::try_new(type_name)?;
    Ok(assemble(node, props, children, key, id))
}

fn assemble(
    mut node: ComponentNode,
    props: Option<Props>,
    children: Option<Node>,
    key: Option<&str>,
    id: Option<&str>,
) -> Node {
    node.props = props;
    node.children = children.map(Box::new);
    node.key = key.and_then(|k| non_empty(k.to_string()));
    node.id = id.and_then(|i| non_empty(i.to_string()));
    Node::Component(node)
}

/// Create a grouping node that renders its children without a wrapper.
pub fn create_group(children: impl Into<Node>, key: Option<&str>) -> Node {
    assemble(
        ComponentNode::new(FRAGMENT),
        None,
        Some(children.into()),
        key,
        None,
    )
}

/// Create a redirection node that renders its children into `target`.
///
/// `target` is either a selector string or a [`TargetRef`].
pub fn create_redirect(
    target: impl Into<PropValue>,
    children: impl Into<Node>,
    key: Option<&str>,
) -> Node {
    let mut props = Props::new();
    props.insert(CONTAINER_PROP.to_string(), target.into());
    assemble(
        ComponentNode::new(PORTAL),
        Some(props),
        Some(children.into()),
        key,
        None,
    )
}
