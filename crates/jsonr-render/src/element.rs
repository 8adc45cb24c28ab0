//! Framework-agnostic element tree produced by the renderer.
//!
//! [`Rendered`] is what a host framework would turn into real elements. It
//! serializes to JSON for inspection and to HTML-like markup with
//! [`Rendered::to_markup`].

use std::fmt::{self, Write as _};

use jsonr_core::{PropValue, Props};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Out-of-tree destination of a portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalTarget {
    /// The document root.
    Root,
    /// A known target, by selector or id.
    Named(String),
}

impl fmt::Display for PortalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalTarget::Root => f.write_str("root"),
            PortalTarget::Named(name) => f.write_str(name),
        }
    }
}

/// A rendered node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Rendered {
    /// Renders as nothing.
    #[default]
    Empty,
    Text(String),
    Number(serde_json::Number),
    Element {
        tag: String,
        key: Option<String>,
        props: Props,
        children: Vec<Rendered>,
    },
    /// Children without a wrapper element.
    Fragment {
        key: Option<String>,
        children: Vec<Rendered>,
    },
    /// Children rendered into another part of the document.
    Portal {
        target: PortalTarget,
        key: Option<String>,
        children: Vec<Rendered>,
    },
    /// Siblings from a top-level array.
    List(Vec<Rendered>),
}

/// Elements that never have content or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

impl Rendered {
    pub fn text(value: impl Into<String>) -> Self {
        Rendered::Text(value.into())
    }

    pub fn element(
        tag: impl Into<String>,
        key: Option<String>,
        props: Props,
        children: Vec<Rendered>,
    ) -> Self {
        Rendered::Element {
            tag: tag.into(),
            key,
            props,
            children,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Rendered::Empty)
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Rendered::Element { key, .. }
            | Rendered::Fragment { key, .. }
            | Rendered::Portal { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    /// Set the key if this node can carry one and has none yet.
    pub fn with_key(mut self, new_key: Option<String>) -> Self {
        if let Rendered::Element { key, .. }
        | Rendered::Fragment { key, .. }
        | Rendered::Portal { key, .. } = &mut self
        {
            if key.is_none() {
                *key = new_key;
            }
        }
        self
    }

    /// The child list, for nodes that have one.
    pub fn children(&self) -> &[Rendered] {
        match self {
            Rendered::Element { children, .. }
            | Rendered::Fragment { children, .. }
            | Rendered::Portal { children, .. }
            | Rendered::List(children) => children,
            _ => &[],
        }
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Rendered::Empty => Value::Null,
            Rendered::Text(s) => Value::String(s.clone()),
            Rendered::Number(n) => Value::Number(n.clone()),
            Rendered::Element {
                tag,
                key,
                props,
                children,
            } => {
                let mut obj = Map::new();
                obj.insert("element".to_string(), Value::String(tag.clone()));
                insert_common(&mut obj, key, children);
                if !props.is_empty() {
                    let props = props
                        .iter()
                        .map(|(name, value)| (name.clone(), value.to_json()))
                        .collect();
                    obj.insert("props".to_string(), Value::Object(props));
                }
                Value::Object(obj)
            }
            Rendered::Fragment { key, children } => {
                let mut obj = Map::new();
                obj.insert("fragment".to_string(), Value::Bool(true));
                insert_common(&mut obj, key, children);
                Value::Object(obj)
            }
            Rendered::Portal {
                target,
                key,
                children,
            } => {
                let mut obj = Map::new();
                obj.insert("portal".to_string(), Value::String(target.to_string()));
                insert_common(&mut obj, key, children);
                Value::Object(obj)
            }
            Rendered::List(items) => Value::Array(items.iter().map(Rendered::to_json).collect()),
        }
    }

    /// Serialize to HTML-like markup.
    ///
    /// Text and attribute values are escaped. Tag and attribute names must pass
    /// [`is_markup_name`]: an element with an invalid tag renders only its
    /// children, and an invalid attribute is dropped. Resolved handlers appear as
    /// `data-handler-<prop>` attributes naming the handler, and portals as
    /// `<template data-portal="...">` blocks.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Rendered::Empty => {}
            Rendered::Text(s) => out.push_str(&escape(s)),
            Rendered::Number(n) => out.push_str(&n.to_string()),
            Rendered::Element {
                tag,
                props,
                children,
                ..
            } => {
                if !is_markup_name(tag) {
                    tracing::warn!(tag = %tag, "invalid tag name, rendering children only");
                    for child in children {
                        child.write_markup(out);
                    }
                    return;
                }
                out.push('<');
                out.push_str(tag);
                for (name, value) in props {
                    write_attribute(out, name, value);
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) && children.is_empty() {
                    return;
                }
                for child in children {
                    child.write_markup(out);
                }
                let _ = write!(out, "</{}>", tag);
            }
            Rendered::Fragment { children, .. } | Rendered::List(children) => {
                for child in children {
                    child.write_markup(out);
                }
            }
            Rendered::Portal {
                target, children, ..
            } => {
                let _ = write!(
                    out,
                    "<template data-portal=\"{}\">",
                    escape(&target.to_string())
                );
                for child in children {
                    child.write_markup(out);
                }
                out.push_str("</template>");
            }
        }
    }
}

impl Serialize for Rendered {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn insert_common(obj: &mut Map<String, Value>, key: &Option<String>, children: &[Rendered]) {
    if let Some(key) = key {
        obj.insert("key".to_string(), Value::String(key.clone()));
    }
    if !children.is_empty() {
        obj.insert(
            "children".to_string(),
            Value::Array(children.iter().map(Rendered::to_json).collect()),
        );
    }
}

/// Whether `name` is usable as a tag or attribute name: an ASCII letter
/// followed by letters, digits, `:`, `_`, `.` or `-`.
pub fn is_markup_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '-'))
}

fn write_attribute(out: &mut String, name: &str, value: &PropValue) {
    if !is_markup_name(name) {
        tracing::warn!(attribute = %name, "invalid attribute name, dropped");
        return;
    }
    match value {
        PropValue::Handler(handler) => {
            let _ = write!(
                out,
                " data-handler-{}=\"{}\"",
                name.to_ascii_lowercase(),
                escape(handler.name())
            );
        }
        PropValue::Target(target) => {
            let _ = write!(out, " {}=\"{}\"", name, escape(target.id()));
        }
        PropValue::Json(Value::Null) | PropValue::Json(Value::Bool(false)) => {}
        PropValue::Json(Value::Bool(true)) => {
            out.push(' ');
            out.push_str(name);
        }
        PropValue::Json(Value::String(s)) => {
            let _ = write!(out, " {}=\"{}\"", name, escape(s));
        }
        PropValue::Json(other) => {
            let _ = write!(out, " {}=\"{}\"", name, escape(&other.to_string()));
        }
    }
}

/// Escape text for use in markup content and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
