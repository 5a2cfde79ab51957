use crate::ir::{Binding, Component, ElementNode, ForNode, Node, ShowNode};

/// Read-only traversal over the component tree.
///
/// Rules:
/// 1. Traversal order is depth-first in document order; a `Show` node's
///    else branch is visited after its children.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers call the matching `walk_*` function to continue into
///    children, or skip it to prune the branch.
pub trait NodeVisitor {
    fn visit_component(&mut self, component: &Component) {
        walk_component(self, component);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_text(&mut self, _text: &str) {}

    fn visit_dynamic_text(&mut self, _binding: &Binding) {}

    fn visit_fragment(&mut self, children: &[Node]) {
        walk_children(self, children);
    }

    fn visit_for(&mut self, node: &ForNode) {
        walk_for(self, node);
    }

    fn visit_show(&mut self, node: &ShowNode) {
        walk_show(self, node);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }
}

pub fn walk_component<V: NodeVisitor + ?Sized>(visitor: &mut V, component: &Component) {
    walk_children(visitor, &component.children);
}

pub fn walk_children<V: NodeVisitor + ?Sized>(visitor: &mut V, children: &[Node]) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: NodeVisitor + ?Sized>(visitor: &mut V, node: &Node) {
    match node {
        Node::Text(text) => visitor.visit_text(text),
        Node::DynamicText(binding) => visitor.visit_dynamic_text(binding),
        Node::Fragment(children) => visitor.visit_fragment(children),
        Node::For(f) => visitor.visit_for(f),
        Node::Show(s) => visitor.visit_show(s),
        Node::Element(el) => visitor.visit_element(el),
    }
}

pub fn walk_for<V: NodeVisitor + ?Sized>(visitor: &mut V, node: &ForNode) {
    walk_children(visitor, &node.children);
}

pub fn walk_show<V: NodeVisitor + ?Sized>(visitor: &mut V, node: &ShowNode) {
    walk_children(visitor, &node.children);
    if let Some(branch) = &node.else_branch {
        visitor.visit_node(branch);
    }
}

pub fn walk_element<V: NodeVisitor + ?Sized>(visitor: &mut V, element: &ElementNode) {
    walk_children(visitor, &element.children);
}

/// Collects every code string in the tree, including control-flow bindings.
#[derive(Default)]
pub struct CodeCollector<'c> {
    pub code: Vec<&'c str>,
}

impl<'c> CodeCollector<'c> {
    pub fn collect(component: &'c Component) -> Vec<&'c str> {
        let mut collector = CodeCollector::default();
        for entry in component.state.values() {
            collector.code.push(&entry.code);
        }
        if let Some(init) = &component.hooks.on_init {
            collector.code.push(&init.code);
        }
        for hook in &component.hooks.on_mount {
            collector.code.push(&hook.code);
        }
        for hook in component.hooks.on_update.iter().flatten() {
            collector.code.push(&hook.code);
        }
        collector.walk_nodes(&component.children);
        collector.code
    }

    // The trait borrows nodes only for the call, so the collector walks
    // with its own lifetime-carrying recursion.
    fn walk_nodes(&mut self, nodes: &'c [Node]) {
        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::DynamicText(binding) => self.code.push(&binding.code),
                Node::Fragment(children) => self.walk_nodes(children),
                Node::For(f) => {
                    self.code.push(&f.each.code);
                    self.walk_nodes(&f.children);
                }
                Node::Show(s) => {
                    self.code.push(&s.when.code);
                    self.walk_nodes(&s.children);
                    if let Some(branch) = &s.else_branch {
                        self.walk_nodes(std::slice::from_ref(branch.as_ref()));
                    }
                }
                Node::Element(el) => {
                    self.code.extend(el.bindings.values().map(|b| b.code.as_str()));
                    self.walk_nodes(&el.children);
                }
            }
        }
    }
}
