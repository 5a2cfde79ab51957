//! Component IR consumed by the Astro backend.
//!
//! The JSON shape mirrors the upstream parser output (`name`, `properties`,
//! `bindings`, `children`, `meta`). On deserialization every node is resolved
//! once into the [`Node`] union so the renderer never re-detects node kinds
//! from reserved names.

use crate::error::CompileError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVED NAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Property / binding key carrying text content.
pub const TEXT_KEY: &str = "_text";
/// Binding key carrying an inline style object that becomes a scoped class.
pub const STYLE_OBJECT_KEY: &str = "css";
pub const SPREAD_KEY: &str = "_spread";
pub const FRAGMENT_NAME: &str = "Fragment";
pub const FOR_NAME: &str = "For";
pub const SHOW_NAME: &str = "Show";

const EACH_KEY: &str = "each";
const WHEN_KEY: &str = "when";
const DEFAULT_ITEM_NAME: &str = "item";
const DEFAULT_EVENT_ARG: &str = "event";

// ═══════════════════════════════════════════════════════════════════════════════
// BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingType {
    #[default]
    Single,
    Spread,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub code: String,
    #[serde(rename = "type", default)]
    pub binding_type: BindingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
    #[serde(rename = "async", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
}

impl Binding {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn spread(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            binding_type: BindingType::Spread,
            ..Self::default()
        }
    }

    /// Handler parameter list; a single `event` when none was declared.
    pub fn parameters(&self) -> Vec<&str> {
        match &self.arguments {
            Some(args) if !args.is_empty() => args.iter().map(String::as_str).collect(),
            _ => vec![DEFAULT_EVENT_ARG],
        }
    }

    pub fn is_spread(&self) -> bool {
        self.binding_type == BindingType::Spread
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub name: String,
    pub properties: IndexMap<String, String>,
    pub bindings: IndexMap<String, Binding>,
    pub children: Vec<Node>,
    /// Internal annotations; removed by [`Component::strip_meta`].
    pub meta: IndexMap<String, Value>,
}

impl ElementNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: IndexMap::new(),
            bindings: IndexMap::new(),
            children: Vec::new(),
            meta: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_binding(mut self, key: &str, binding: Binding) -> Self {
        self.bindings.insert(key.to_string(), binding);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub each: Binding,
    pub item: String,
    pub index: Option<String>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowNode {
    pub when: Binding,
    pub children: Vec<Node>,
    pub else_branch: Option<Box<Node>>,
}

/// One node of the component tree, resolved by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub enum Node {
    Text(String),
    DynamicText(Binding),
    Fragment(Vec<Node>),
    For(ForNode),
    Show(ShowNode),
    Element(ElementNode),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn dynamic_text(code: impl Into<String>) -> Self {
        Node::DynamicText(Binding::new(code))
    }

    /// Whitespace-only literal text, skipped wherever children are rendered.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Text(_) | Node::DynamicText(_) => &[],
            Node::Fragment(children) => children,
            Node::For(node) => &node.children,
            Node::Show(node) => &node.children,
            Node::Element(node) => &node.children,
        }
    }

    fn strip_meta(&mut self) {
        match self {
            Node::Text(_) | Node::DynamicText(_) => {}
            Node::Fragment(children) => children.iter_mut().for_each(Node::strip_meta),
            Node::For(node) => node.children.iter_mut().for_each(Node::strip_meta),
            Node::Show(node) => {
                node.children.iter_mut().for_each(Node::strip_meta);
                if let Some(branch) = node.else_branch.as_deref_mut() {
                    branch.strip_meta();
                }
            }
            Node::Element(node) => {
                node.meta.clear();
                node.children.iter_mut().for_each(Node::strip_meta);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RAW (WIRE) NODE SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    for_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMeta {
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    else_branch: Option<Box<Node>>,
    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    bindings: IndexMap<String, Binding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
    #[serde(default)]
    meta: RawMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<ForScope>,
}

impl From<RawNode> for Node {
    fn from(mut raw: RawNode) -> Self {
        if let Some(text) = raw.properties.shift_remove(TEXT_KEY) {
            return Node::Text(text);
        }
        if let Some(binding) = raw.bindings.shift_remove(TEXT_KEY) {
            return Node::DynamicText(binding);
        }

        match raw.name.as_str() {
            FRAGMENT_NAME => Node::Fragment(raw.children),
            FOR_NAME => {
                let each = raw.bindings.shift_remove(EACH_KEY).unwrap_or_default();
                let scope = raw.scope.unwrap_or_default();
                let args = each.arguments.clone().unwrap_or_default();
                let item = scope
                    .for_name
                    .or_else(|| args.first().cloned())
                    .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string());
                let index = scope.index_name.or_else(|| args.get(1).cloned());
                Node::For(ForNode {
                    each,
                    item,
                    index,
                    children: raw.children,
                })
            }
            SHOW_NAME => Node::Show(ShowNode {
                when: raw.bindings.shift_remove(WHEN_KEY).unwrap_or_default(),
                children: raw.children,
                else_branch: raw.meta.else_branch,
            }),
            _ => Node::Element(ElementNode {
                name: raw.name,
                properties: raw.properties,
                bindings: raw.bindings,
                children: raw.children,
                meta: raw.meta.rest,
            }),
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        match node {
            Node::Text(text) => RawNode {
                name: "div".to_string(),
                properties: IndexMap::from([(TEXT_KEY.to_string(), text)]),
                ..RawNode::default()
            },
            Node::DynamicText(binding) => RawNode {
                name: "div".to_string(),
                bindings: IndexMap::from([(TEXT_KEY.to_string(), binding)]),
                ..RawNode::default()
            },
            Node::Fragment(children) => RawNode {
                name: FRAGMENT_NAME.to_string(),
                children,
                ..RawNode::default()
            },
            Node::For(node) => RawNode {
                name: FOR_NAME.to_string(),
                bindings: IndexMap::from([(EACH_KEY.to_string(), node.each)]),
                children: node.children,
                scope: Some(ForScope {
                    for_name: Some(node.item),
                    index_name: node.index,
                }),
                ..RawNode::default()
            },
            Node::Show(node) => RawNode {
                name: SHOW_NAME.to_string(),
                bindings: IndexMap::from([(WHEN_KEY.to_string(), node.when)]),
                children: node.children,
                meta: RawMeta {
                    else_branch: node.else_branch,
                    rest: IndexMap::new(),
                },
                ..RawNode::default()
            },
            Node::Element(node) => RawNode {
                name: node.name,
                properties: node.properties,
                bindings: node.bindings,
                children: node.children,
                meta: RawMeta {
                    else_branch: None,
                    rest: node.meta,
                },
                scope: None,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum StateKind {
    #[default]
    Property,
    Function,
    /// Object-method shorthand, e.g. `increment(by) { ... }`.
    Method,
    /// Accessor shorthand, e.g. `get total() { ... }`; emitted as a derived value.
    Getter,
}

impl From<String> for StateKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "property" => StateKind::Property,
            "function" => StateKind::Function,
            "method" => StateKind::Method,
            "getter" => StateKind::Getter,
            other => {
                tracing::warn!(kind = other, "unknown state entry type, treating as property");
                StateKind::Property
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    pub code: String,
    #[serde(rename = "type", default)]
    pub kind: StateKind,
}

impl StateEntry {
    pub fn property(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind: StateKind::Property,
        }
    }

    pub fn function(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind: StateKind::Function,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDecl {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookCode {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHook {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hooks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_init: Option<HookCode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_mount: Vec<HookCode>,
    /// `Some(vec![])` is a declared-but-empty list and still counts as present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<Vec<UpdateHook>>,
}

/// An import statement: local name -> imported name (`default`, `*`, or the export).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDecl {
    pub path: String,
    #[serde(default)]
    pub imports: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportDecl>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub state: IndexMap<String, StateEntry>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub props: IndexMap<String, PropDecl>,
    #[serde(default)]
    pub hooks: Hooks,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Component-level stylesheet text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Preferred name for the generated prop type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props_type_ref: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IndexMap<String, Value>,
}

impl Component {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(CompileError::InvalidIr)
    }

    /// Removes internal annotations from the component and every node.
    pub fn strip_meta(&mut self) {
        self.meta.clear();
        self.children.iter_mut().for_each(Node::strip_meta);
    }

    /// Stable short hash of the whole component structure.
    pub fn structural_hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        short_hash(&bytes)
    }
}

/// First eight hex digits of the SHA-256 of `bytes`.
pub fn short_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(8);
    hex
}
