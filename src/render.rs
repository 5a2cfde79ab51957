//! Node renderer: one IR node to Astro template text.

use crate::binding::{process, BindingContext};
use crate::class_style::{class_attribute, escape_attribute, StyleAccumulator};
use crate::hydration::is_interactive_event;
use crate::ir::{Binding, ElementNode, ForNode, Node, ShowNode, STYLE_OBJECT_KEY, TEXT_KEY};
use crate::options::ClientDirective;

pub const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose `onChange` fires per keystroke as `onInput`.
const INPUT_LIKE_TAGS: &[&str] = &["input", "textarea", "select"];

/// Attributes emitted by the class collector or as content, never as plain bindings.
const HANDLED_BINDINGS: &[&str] = &["class", "className", STYLE_OBJECT_KEY, TEXT_KEY];

pub struct RenderContext<'a> {
    pub directive: &'a ClientDirective,
    pub hydration_directives: bool,
    pub styles: &'a mut StyleAccumulator,
}

pub fn render_node(node: &Node, ctx: &mut RenderContext<'_>) -> String {
    match node {
        Node::Text(text) => text.clone(),
        Node::DynamicText(binding) => {
            format!("{{{}}}", process(&binding.code, BindingContext::Markup))
        }
        Node::Fragment(children) => render_children(children, ctx),
        Node::For(node) => render_for(node, ctx),
        Node::Show(node) => render_show(node, ctx),
        Node::Element(element) => render_element(element, ctx),
    }
}

/// Renders `children` newline-joined, skipping whitespace-only text.
pub fn render_children(children: &[Node], ctx: &mut RenderContext<'_>) -> String {
    children
        .iter()
        .filter(|child| !child.is_blank_text())
        .map(|child| render_node(child, ctx))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_for(node: &ForNode, ctx: &mut RenderContext<'_>) -> String {
    let params = match &node.index {
        Some(index) => format!("{}, {}", node.item, index),
        None => node.item.clone(),
    };
    format!(
        "{{{}.map(({}) => (\n<>\n{}\n</>\n))}}",
        process(&node.each.code, BindingContext::Markup),
        params,
        render_children(&node.children, ctx)
    )
}

fn render_show(node: &ShowNode, ctx: &mut RenderContext<'_>) -> String {
    let condition = process(&node.when.code, BindingContext::Markup);
    let then = render_children(&node.children, ctx);
    let otherwise = match &node.else_branch {
        Some(branch) => format!("(\n<>\n{}\n</>\n)", render_node(branch, ctx)),
        None => "null".to_string(),
    };
    format!("{{{} ? (\n<>\n{}\n</>\n) : {}}}", condition, then, otherwise)
}

fn render_element(element: &ElementNode, ctx: &mut RenderContext<'_>) -> String {
    let mut out = format!("<{}", element.name);

    let class_attr = class_attribute(element, ctx.styles);
    if !class_attr.is_empty() {
        out.push(' ');
        out.push_str(&class_attr);
    }

    for (key, value) in &element.properties {
        if matches!(key.as_str(), "class" | "className" | TEXT_KEY) {
            continue;
        }
        out.push_str(&format!(" {}=\"{}\"", key, escape_attribute(value)));
    }

    let mut needs_hydration = false;
    for (key, binding) in &element.bindings {
        if HANDLED_BINDINGS.contains(&key.as_str()) {
            continue;
        }
        let code = process(&binding.code, BindingContext::Markup);
        let attr = if binding.is_spread() {
            format!("{{...{}}}", code)
        } else if key == "ref" {
            needs_hydration = true;
            format!("ref={{{}}}", to_camel_identifier(&binding.code))
        } else if is_event_binding(key) {
            render_event(element, key, binding, &code, &mut needs_hydration)
        } else if key == "innerHTML" {
            format!("set:html={{{}}}", code)
        } else if key == "style" {
            format!("style={{{}}}", code)
        } else {
            format!("{}={{{}}}", key, code)
        };
        out.push(' ');
        out.push_str(&attr);
    }

    if needs_hydration && ctx.hydration_directives {
        out.push(' ');
        out.push_str(&ctx.directive.to_string());
    }

    if SELF_CLOSING_TAGS.contains(&element.name.as_str()) {
        out.push_str(" />");
        return out;
    }
    out.push('>');

    // `set:html` supplies the content; children are not rendered alongside it.
    if !element.bindings.contains_key("innerHTML") {
        let children = render_children(&element.children, ctx);
        if !children.is_empty() {
            out.push('\n');
            out.push_str(&children);
            out.push('\n');
        }
    }

    out.push_str(&format!("</{}>", element.name));
    out
}

fn render_event(
    element: &ElementNode,
    key: &str,
    binding: &Binding,
    code: &str,
    needs_hydration: &mut bool,
) -> String {
    let event = if key == "onChange" && INPUT_LIKE_TAGS.contains(&element.name.as_str()) {
        "onInput"
    } else {
        key
    };
    if is_interactive_event(event) {
        *needs_hydration = true;
    }
    let asyncness = if binding.is_async { "async " } else { "" };
    format!(
        "{}={{{}({}) => {{ {} }}}}",
        event,
        asyncness,
        binding.parameters().join(", "),
        code
    )
}

/// `onClick`-style names: `on` followed by an uppercase letter.
pub fn is_event_binding(name: &str) -> bool {
    name.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// `input-ref` / `input_ref` / `InputRef` -> `inputRef`.
pub fn to_camel_identifier(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for (i, part) in code
        .split(|c: char| !(c.is_alphanumeric() || c == '$'))
        .filter(|part| !part.is_empty())
        .enumerate()
    {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
