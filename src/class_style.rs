//! `class` attribute assembly and scoped style-object extraction.

use crate::binding::{camel_to_kebab, parse_program, process, source_type, BindingContext};
use crate::error::StyleError;
use crate::ir::{short_hash, ElementNode, STYLE_OBJECT_KEY};
use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, ObjectExpression, ObjectPropertyKind, PropertyKey, Statement};
use oxc_span::Span;

// ═══════════════════════════════════════════════════════════════════════════════
// SCOPED STYLE ACCUMULATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Scoped class name -> raw style-object code, owned by one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleAccumulator {
    rules: IndexMap<String, String>,
}

impl StyleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_name: String, code: String) {
        self.rules.insert(class_name, code);
    }

    pub fn get(&self, class_name: &str) -> Option<&str> {
        self.rules.get(class_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// One rule block per scoped class. Objects that cannot be read
    /// statically become a comment holding their source.
    pub fn to_css(&self) -> String {
        self.rules
            .iter()
            .map(|(class_name, code)| {
                let selector = format!(".{}", class_name);
                match style_object_to_css(&selector, code) {
                    Ok(css) => css,
                    Err(error) => {
                        tracing::warn!(class_name = class_name.as_str(), %error, "keeping style object as comment");
                        format!("/* {}: {} */", selector, code.replace("*/", "* /"))
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS ATTRIBUTE
// ═══════════════════════════════════════════════════════════════════════════════

enum ClassEntry {
    Literal(String),
    Expression(String),
}

impl ClassEntry {
    fn to_js(&self) -> String {
        match self {
            ClassEntry::Literal(value) => format!("\"{}\"", escape_js_string(value)),
            ClassEntry::Expression(code) => code.clone(),
        }
    }
}

/// Builds ` class=...` content for `element`, or an empty string.
///
/// Sources in order: literal `class`, literal `className`, `class` binding,
/// `className` binding, then the scoped class of an inline style object
/// (recorded into `styles`). A lone literal is emitted as a plain quoted
/// attribute; anything else joins the truthy entries at runtime.
pub fn class_attribute(element: &ElementNode, styles: &mut StyleAccumulator) -> String {
    let mut entries = Vec::new();

    for key in ["class", "className"] {
        if let Some(value) = element.properties.get(key) {
            if !value.trim().is_empty() {
                entries.push(ClassEntry::Literal(value.clone()));
            }
        }
    }
    for key in ["class", "className"] {
        if let Some(binding) = element.bindings.get(key) {
            entries.push(ClassEntry::Expression(process(
                &binding.code,
                BindingContext::Markup,
            )));
        }
    }
    if let Some(style) = element.bindings.get(STYLE_OBJECT_KEY) {
        let class_name = scoped_class_name(&element.name, &style.code);
        entries.push(ClassEntry::Literal(class_name.clone()));
        styles.insert(class_name, style.code.clone());
    }

    match entries.as_slice() {
        [] => String::new(),
        [ClassEntry::Literal(value)] => format!("class=\"{}\"", escape_attribute(value)),
        _ => {
            let parts: Vec<String> = entries.iter().map(ClassEntry::to_js).collect();
            format!(
                "class={{[{}].filter(Boolean).join(\" \")}}",
                parts.join(", ")
            )
        }
    }
}

pub fn scoped_class_name(tag: &str, code: &str) -> String {
    format!("{}-{}", tag.to_lowercase(), short_hash(code.as_bytes()))
}

pub(crate) fn escape_attribute(value: &str) -> String {
    value.replace('"', "&quot;")
}

fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
}

// ═══════════════════════════════════════════════════════════════════════════════
// STYLE OBJECT -> CSS
// ═══════════════════════════════════════════════════════════════════════════════

/// Converts a static style-object literal into rule blocks for `selector`.
///
/// Nested object values are nested rules: keys starting with `@` wrap the
/// selector's rules in that at-rule, keys containing `&` substitute the
/// selector, keys starting with `:` are appended, other keys are descendants.
pub fn style_object_to_css(selector: &str, code: &str) -> Result<String, StyleError> {
    let source = format!("({})", code);
    let allocator = Allocator::default();
    let program = parse_program(&allocator, &source, source_type()).map_err(StyleError::Parse)?;

    let object = match program.body.first() {
        Some(Statement::ExpressionStatement(stmt)) if program.body.len() == 1 => {
            match unwrap_parens(&stmt.expression) {
                Expression::ObjectExpression(object) => object,
                _ => return Err(StyleError::NotAnObject),
            }
        }
        _ => return Err(StyleError::NotAnObject),
    };

    let mut blocks = Vec::new();
    collect_rules(selector, object, &source, &mut blocks)?;
    Ok(blocks.join("\n"))
}

fn unwrap_parens<'b, 'a>(mut expr: &'b Expression<'a>) -> &'b Expression<'a> {
    while let Expression::ParenthesizedExpression(inner) = expr {
        expr = &inner.expression;
    }
    expr
}

fn collect_rules(
    selector: &str,
    object: &ObjectExpression<'_>,
    source: &str,
    blocks: &mut Vec<String>,
) -> Result<(), StyleError> {
    let mut declarations = Vec::new();
    let mut nested = Vec::new();

    for property in &object.properties {
        let ObjectPropertyKind::ObjectProperty(property) = property else {
            return Err(StyleError::UnsupportedKey);
        };
        if property.computed {
            return Err(StyleError::UnsupportedKey);
        }
        let key = property_key_name(&property.key, source)?;

        match unwrap_parens(&property.value) {
            Expression::ObjectExpression(inner) => nested.push((key, inner)),
            value => {
                let value = static_value(value, source)
                    .ok_or_else(|| StyleError::DynamicValue(key.clone()))?;
                declarations.push(format!("  {}: {};", css_property_name(&key), value));
            }
        }
    }

    if !declarations.is_empty() {
        blocks.push(format!("{} {{\n{}\n}}", selector, declarations.join("\n")));
    }

    for (key, inner) in nested {
        if key.starts_with('@') {
            let mut inner_blocks = Vec::new();
            collect_rules(selector, inner, source, &mut inner_blocks)?;
            let body = inner_blocks
                .join("\n")
                .lines()
                .map(|line| format!("  {}", line))
                .collect::<Vec<_>>()
                .join("\n");
            blocks.push(format!("{} {{\n{}\n}}", key, body));
        } else {
            collect_rules(&nested_selector(selector, &key), inner, source, blocks)?;
        }
    }
    Ok(())
}

fn property_key_name(key: &PropertyKey<'_>, source: &str) -> Result<String, StyleError> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Ok(ident.name.to_string()),
        PropertyKey::StringLiteral(literal) => Ok(literal.value.to_string()),
        PropertyKey::NumericLiteral(literal) => Ok(slice(source, literal.span).to_string()),
        _ => Err(StyleError::UnsupportedKey),
    }
}

fn static_value(value: &Expression<'_>, source: &str) -> Option<String> {
    match value {
        Expression::StringLiteral(literal) => Some(literal.value.to_string()),
        Expression::NumericLiteral(literal) => Some(slice(source, literal.span).to_string()),
        Expression::UnaryExpression(unary)
            if matches!(unary.argument, Expression::NumericLiteral(_)) =>
        {
            Some(slice(source, unary.span).to_string())
        }
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => {
            let raw = slice(source, template.span);
            Some(raw.trim_matches('`').to_string())
        }
        _ => None,
    }
}

fn slice(source: &str, span: Span) -> &str {
    &source[span.start as usize..span.end as usize]
}

fn css_property_name(key: &str) -> String {
    if key.starts_with("--") || key.contains('-') {
        key.to_string()
    } else {
        camel_to_kebab(key)
    }
}

fn nested_selector(parent: &str, key: &str) -> String {
    if key.contains('&') {
        key.replace('&', parent)
    } else if key.starts_with(':') {
        format!("{}{}", parent, key)
    } else {
        format!("{} {}", parent, key)
    }
}
