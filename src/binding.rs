//! Binding processor.
//!
//! Rewrites one embedded expression for the section it is emitted into:
//! - `state.x` becomes `x` everywhere (state is declared as frontmatter locals).
//! - `props.x` becomes `x` in markup only; frontmatter keeps `props.x`.
//! - In markup, camelCase keys of object literals become quoted kebab-case
//!   keys so inline style objects carry CSS property names.
//!
//! Processing never fails: a rewrite that cannot be applied returns the
//! original code as [`Processed::Recovered`] together with the diagnostic.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{ObjectProperty, Program, PropertyKey};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::{Captures, Regex};

lazy_static! {
    // A lone `.` means a member access; `...` is a spread and still rewrites.
    static ref STATE_REF_RE: Regex =
        Regex::new(r"(^|[^\w$.]|\.\.\.)state\.([A-Za-z_$][\w$]*)").unwrap();
    static ref PROPS_REF_RE: Regex =
        Regex::new(r"(^|[^\w$.]|\.\.\.)props\.([A-Za-z_$][\w$]*)").unwrap();
}

/// Words that cannot be bound as plain local names in module code.
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingContext {
    /// Frontmatter: state and hook code.
    Setup,
    /// Template expressions and client script.
    Markup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    Rewritten(String),
    Recovered { code: String, diagnostic: String },
}

impl Processed {
    pub fn code(&self) -> &str {
        match self {
            Processed::Rewritten(code) => code,
            Processed::Recovered { code, .. } => code,
        }
    }

    pub fn into_code(self) -> String {
        match self {
            Processed::Rewritten(code) => code,
            Processed::Recovered { code, .. } => code,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Processed::Recovered { .. })
    }
}

pub fn process_binding(code: &str, context: BindingContext) -> Processed {
    match rewrite(code, context) {
        Ok(rewritten) => Processed::Rewritten(rewritten),
        Err(diagnostic) => {
            tracing::warn!(
                code,
                ?context,
                %diagnostic,
                "could not process binding, keeping original code"
            );
            Processed::Recovered {
                code: code.to_string(),
                diagnostic,
            }
        }
    }
}

/// Shorthand for callers that only need the resulting text.
pub fn process(code: &str, context: BindingContext) -> String {
    process_binding(code, context).into_code()
}

fn rewrite(code: &str, context: BindingContext) -> Result<String, String> {
    let code = STATE_REF_RE.replace_all(code, "${1}${2}");
    match context {
        BindingContext::Setup => Ok(code.into_owned()),
        BindingContext::Markup => {
            // Reserved names are never destructured, so they stay on `props`.
            let code = PROPS_REF_RE.replace_all(&code, |caps: &Captures<'_>| {
                if is_reserved_word(&caps[2]) {
                    caps[0].to_string()
                } else {
                    format!("{}{}", &caps[1], &caps[2])
                }
            });
            hyphenate_object_keys(&code)
        }
    }
}

/// Names of every `props.<name>` reference in `code`, in order of appearance.
pub fn referenced_props(code: &str) -> impl Iterator<Item = &str> {
    PROPS_REF_RE
        .captures_iter(code)
        .filter_map(|cap| cap.get(2).map(|m| m.as_str()))
}

pub(crate) fn source_type() -> SourceType {
    SourceType::default()
        .with_typescript(true)
        .with_jsx(true)
        .with_module(true)
}

/// Parses `source` as a whole program, returning the first diagnostic on failure.
pub(crate) fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
) -> Result<Program<'a>, String> {
    let ret = Parser::new(allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    if ret.panicked {
        return Err("parser aborted".to_string());
    }
    Ok(ret.program)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STYLE KEY HYPHENATION
// ═══════════════════════════════════════════════════════════════════════════════

fn hyphenate_object_keys(code: &str) -> Result<String, String> {
    // No braces, no object literal.
    if !code.contains('{') {
        return Ok(code.to_string());
    }

    // Expression position first so `{ a: 1 }` is an object, not a block.
    let wrapped = format!("({})", code);
    match apply_key_hyphenation(&wrapped) {
        Ok(out) => Ok(out[1..out.len() - 1].to_string()),
        Err(expression_error) => match apply_key_hyphenation(code) {
            Ok(out) => Ok(out),
            Err(_) => Err(expression_error),
        },
    }
}

fn apply_key_hyphenation(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source, source_type())?;

    let mut hyphenator = KeyHyphenator {
        replacements: Vec::new(),
    };
    hyphenator.visit_program(&program);

    let mut out = source.to_string();
    hyphenator.replacements.sort_by(|a, b| b.0.cmp(&a.0));
    for (start, end, text) in hyphenator.replacements {
        out.replace_range(start as usize..end as usize, &text);
    }
    Ok(out)
}

struct KeyHyphenator {
    replacements: Vec<(u32, u32, String)>,
}

impl<'a> Visit<'a> for KeyHyphenator {
    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if !prop.computed {
            if let PropertyKey::StaticIdentifier(ident) = &prop.key {
                let name = ident.name.as_str();
                if name.chars().any(|c| c.is_ascii_uppercase()) {
                    let key = format!("\"{}\"", camel_to_kebab(name));
                    if prop.shorthand {
                        // `{ fontSize }` expands so the value keeps its binding.
                        self.replacements.push((
                            prop.span.start,
                            prop.span.end,
                            format!("{}: {}", key, name),
                        ));
                    } else {
                        self.replacements
                            .push((ident.span.start, ident.span.end, key));
                    }
                }
            }
        }
        walk::walk_object_property(self, prop);
    }
}

/// `fontSize` -> `font-size`, `WebkitTransition` -> `-webkit-transition`.
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markup_strips_state_and_props() {
        assert_eq!(
            process("state.count + props.step", BindingContext::Markup),
            "count + step"
        );
    }

    #[test]
    fn test_setup_keeps_props_qualified() {
        assert_eq!(
            process("state.count + props.step", BindingContext::Setup),
            "count + props.step"
        );
    }

    #[test]
    fn test_nested_member_named_state_is_untouched() {
        assert_eq!(
            process("store.state.count", BindingContext::Markup),
            "store.state.count"
        );
        assert_eq!(
            process("[state.a,state.b]", BindingContext::Setup),
            "[a,b]"
        );
    }

    #[test]
    fn test_style_object_keys_are_hyphenated() {
        assert_eq!(
            process("{ fontSize: state.size, color: 'red' }", BindingContext::Markup),
            "{ \"font-size\": size, color: 'red' }"
        );
    }

    #[test]
    fn test_shorthand_and_nested_keys() {
        assert_eq!(
            process("{ backgroundColor, inner: { marginTop: 1 } }", BindingContext::Markup),
            "{ \"background-color\": backgroundColor, inner: { \"margin-top\": 1 } }"
        );
    }

    #[test]
    fn test_setup_does_not_hyphenate() {
        assert_eq!(
            process("{ fontSize: 12 }", BindingContext::Setup),
            "{ fontSize: 12 }"
        );
    }

    #[test]
    fn test_statement_code_is_processed() {
        assert_eq!(
            process("state.count++; log({ newValue: state.count })", BindingContext::Markup),
            "count++; log({ \"new-value\": count })"
        );
    }

    #[test]
    fn test_markup_rewrite_is_idempotent() {
        let inputs = [
            "{ fontSize: state.size, lineHeight }",
            "state.items.map(item => ({ itemId: item.id }))",
            "props.onClose(props.reason)",
        ];
        for input in inputs {
            let once = process(input, BindingContext::Markup);
            let twice = process(&once, BindingContext::Markup);
            assert_eq!(once, twice, "not a fixed point for {input}");
        }
    }

    #[test]
    fn test_setup_rewrite_is_idempotent() {
        let once = process("state.a + props.b", BindingContext::Setup);
        assert_eq!(process(&once, BindingContext::Setup), once);
    }

    #[test]
    fn test_unparsable_code_is_recovered_unchanged() {
        let original = "state.value + { broken";
        let processed = process_binding(original, BindingContext::Markup);
        assert!(processed.is_recovered());
        assert_eq!(processed.code(), original);
        match processed {
            Processed::Recovered { diagnostic, .. } => assert!(!diagnostic.is_empty()),
            Processed::Rewritten(_) => unreachable!(),
        }
    }

    #[test]
    fn test_spread_references_are_rewritten() {
        assert_eq!(
            process("[...state.items, ...props.extra]", BindingContext::Markup),
            "[...items, ...extra]"
        );
        assert_eq!(
            process("{ ...state.user, name: 'x' }", BindingContext::Setup),
            "{ ...user, name: 'x' }"
        );
        assert_eq!(
            process("merge(...props.parts)", BindingContext::Setup),
            "merge(...props.parts)"
        );
        let once = process("{ ...state.base, ...props.overrides }", BindingContext::Markup);
        assert_eq!(once, "{ ...base, ...overrides }");
        assert_eq!(process(&once, BindingContext::Markup), once);
    }

    #[test]
    fn test_reserved_prop_names_stay_qualified_in_markup() {
        assert_eq!(
            process("props.class + ' ' + props.size", BindingContext::Markup),
            "props.class + ' ' + size"
        );
        let once = process("props.for", BindingContext::Markup);
        assert_eq!(once, "props.for");
        assert_eq!(process(&once, BindingContext::Markup), once);
    }

    #[test]
    fn test_referenced_props() {
        let names: Vec<&str> = referenced_props("props.a + x.props.b + props.c").collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_camel_to_kebab() {
        assert_eq!(camel_to_kebab("fontSize"), "font-size");
        assert_eq!(camel_to_kebab("WebkitTransition"), "-webkit-transition");
        assert_eq!(camel_to_kebab("color"), "color");
    }
}
