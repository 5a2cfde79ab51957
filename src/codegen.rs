//! Codegen module for the Astro backend
//!
//! Assembles one `.astro` document from a component: frontmatter (imports,
//! props, state, refs, init code), template markup, client script and styles.

use crate::binding::{is_reserved_word, process, referenced_props, BindingContext};
use crate::class_style::StyleAccumulator;
use crate::error::CompileError;
use crate::hydration::{analyze_hydration, collect_refs};
use crate::ir::{Component, StateEntry, StateKind};
use crate::options::CompileOptions;
use crate::plugins::{run_post_code, run_post_json, run_pre_code, run_pre_json, CssRequest};
use crate::render::{render_children, to_camel_identifier, RenderContext};
use crate::visitor::CodeCollector;
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;

pub const TARGET: &str = "astro";
const DEFAULT_PROPS_TYPE: &str = "Props";

lazy_static! {
    static ref FUNCTION_LIKE_RE: Regex =
        Regex::new(r"^\s*(async\s+)?(function\b|\([^)]*\)\s*(=>|\{)|[A-Za-z_$][\w$]*\s*=>)")
            .unwrap();
    static ref METHOD_HEAD_RE: Regex =
        Regex::new(r"^\s*(async\s+)?(\*\s*)?").unwrap();
    static ref GETTER_HEAD_RE: Regex =
        Regex::new(r"^\s*get\s+[A-Za-z_$][\w$]*\s*").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles one component. Never fails: broken bindings, style objects and
/// formatting degrade locally and are reported through `tracing`.
pub fn compile_component(component: &Component, options: &CompileOptions) -> String {
    let mut component = component.clone();
    let mut styles = StyleAccumulator::new();

    component = run_pre_json(&options.plugins, component);

    let analysis = analyze_hydration(&component);
    let has_state = !component.state.is_empty();
    let props = effective_props(&component);
    let refs: Vec<String> = collect_refs(&component)
        .iter()
        .map(|r| to_camel_identifier(r))
        .collect();
    let reasons: Vec<String> = analysis.reasons.iter().map(ToString::to_string).collect();
    tracing::debug!(
        component = component.name.as_str(),
        needs_hydration = analysis.needs_hydration,
        ?reasons,
        "hydration analysis"
    );

    let prefix = component.structural_hash();
    let collected_css = options
        .css_collector
        .collect_css(&component, CssRequest { prefix: &prefix });

    component = run_post_json(&options.plugins, component);
    component.strip_meta();

    let setup = setup_section(&component, options, has_state, &props, &refs);

    let directive = options
        .client_directive
        .clone()
        .unwrap_or_else(|| analysis.suggested_directive.clone());
    let mut ctx = RenderContext {
        directive: &directive,
        hydration_directives: options.hydration_directives,
        styles: &mut styles,
    };
    let markup = render_children(&component.children, &mut ctx);

    let script = if analysis.needs_hydration {
        client_script(&component)
    } else {
        String::new()
    };
    let style = style_block(&collected_css, &styles);

    let mut code = String::new();
    if !setup.is_empty() {
        code.push_str("---\n");
        code.push_str(&setup);
        code.push_str("\n---\n\n");
    }
    code.push_str(&markup);
    for tail in [script, style] {
        if !tail.is_empty() {
            code.push_str("\n\n");
            code.push_str(&tail);
        }
    }
    code.push('\n');

    code = run_pre_code(&options.plugins, &component, code);
    if options.format {
        match options.formatter.format(&code) {
            Ok(formatted) => code = formatted,
            Err(error) => {
                tracing::warn!(component = component.name.as_str(), %error, "formatting failed, keeping unformatted output");
            }
        }
    }
    run_post_code(&options.plugins, &component, code)
}

/// Compiles independent components in parallel. Each compilation owns its
/// clone of the component and its own style accumulator.
pub fn compile_many(components: &[Component], options: &CompileOptions) -> Vec<String> {
    components
        .par_iter()
        .map(|component| compile_component(component, options))
        .collect()
}

/// JSON boundary for hosts: component IR plus optional options JSON.
pub fn compile_json(ir_json: &str, options_json: Option<&str>) -> Result<String, CompileError> {
    let component = Component::from_json(ir_json)?;
    let options = match options_json {
        Some(json) => CompileOptions::from_json(json)?,
        None => CompileOptions::default(),
    };
    Ok(compile_component(&component, &options))
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRONTMATTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Declared props followed by any other `props.<name>` referenced in code.
fn effective_props(component: &Component) -> Vec<String> {
    let mut names: Vec<String> = component.props.keys().cloned().collect();
    for code in CodeCollector::collect(component) {
        for name in referenced_props(code) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn setup_section(
    component: &Component,
    options: &CompileOptions,
    has_state: bool,
    props: &[String],
    refs: &[String],
) -> String {
    let mut lines = Vec::new();

    let imports = options
        .import_renderer
        .render_imports(component, TARGET, options.component_extension);
    if !imports.trim().is_empty() {
        lines.push(imports.trim_end().to_string());
    }

    if !props.is_empty() {
        if options.typescript {
            let type_name = component
                .props_type_ref
                .as_deref()
                .unwrap_or(DEFAULT_PROPS_TYPE);
            lines.push(props_type_declaration(component, type_name));
            lines.push(format!("const props: {} = Astro.props;", type_name));
        } else {
            lines.push("const props = Astro.props;".to_string());
        }
        // State and ref locals win over same-named props; reserved words
        // cannot be bound at all and are read through `props` instead.
        let bindable: Vec<&str> = props
            .iter()
            .map(String::as_str)
            .filter(|name| !is_reserved_word(name))
            .filter(|name| !component.state.contains_key(*name))
            .filter(|name| !refs.iter().any(|r| r == name))
            .collect();
        if !bindable.is_empty() {
            lines.push(format!("const {{ {} }} = props;", bindable.join(", ")));
        }
    }

    if has_state {
        for (name, entry) in &component.state {
            lines.push(state_declaration(name, entry));
        }
    }

    for name in refs {
        lines.push(format!("let {} = null;", name));
    }

    if let Some(init) = &component.hooks.on_init {
        lines.push(process(init.code.trim(), BindingContext::Setup));
    }

    lines.join("\n")
}

/// One optional field per declared prop, or an open record when props are
/// only known from usage.
fn props_type_declaration(component: &Component, type_name: &str) -> String {
    if component.props.is_empty() {
        return format!("type {} = Record<string, any>;", type_name);
    }
    let fields: Vec<String> = component
        .props
        .iter()
        .map(|(name, decl)| {
            format!(
                "  {}?: {};",
                name,
                decl.type_name.as_deref().unwrap_or("any")
            )
        })
        .collect();
    format!("interface {} {{\n{}\n}}", type_name, fields.join("\n"))
}

fn state_declaration(name: &str, entry: &StateEntry) -> String {
    let code = process(entry.code.trim(), BindingContext::Setup);
    let code = code.trim_end_matches(';');
    match entry.kind {
        StateKind::Method => method_declaration(code),
        StateKind::Getter => format!("const {} = {};", name, getter_value(code)),
        StateKind::Function => format!("const {} = {};", name, code),
        StateKind::Property => {
            let keyword = if looks_like_function(code) {
                "const"
            } else {
                "let"
            };
            format!("{} {} = {};", keyword, name, code)
        }
    }
}

/// `async *name(a) { .. }` -> `async function* name(a) { .. }`.
fn method_declaration(code: &str) -> String {
    let head = METHOD_HEAD_RE.find(code).map_or(0, |m| m.end());
    let is_async = code[..head].trim_start().starts_with("async");
    let is_generator = code[..head].contains('*');
    format!(
        "{}function{} {}",
        if is_async { "async " } else { "" },
        if is_generator { "*" } else { "" },
        &code[head..]
    )
}

/// `get total() { .. }` -> `(function () { .. })()`, evaluated once.
fn getter_value(code: &str) -> String {
    let rest = match GETTER_HEAD_RE.find(code) {
        Some(head) => &code[head.end()..],
        None => code,
    };
    format!("(function {})()", rest.trim_start())
}

fn looks_like_function(code: &str) -> bool {
    FUNCTION_LIKE_RE.is_match(code)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT & STYLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Mount then update hook bodies; empty when the component declares none.
fn client_script(component: &Component) -> String {
    let mount = component.hooks.on_mount.iter().map(|h| h.code.as_str());
    let update = component
        .hooks
        .on_update
        .iter()
        .flatten()
        .map(|h| h.code.as_str());

    let statements: Vec<String> = mount
        .chain(update)
        .map(|code| {
            let code = process(code.trim(), BindingContext::Markup);
            format!("{};", code.trim_end_matches(';'))
        })
        .collect();
    if statements.is_empty() {
        return String::new();
    }

    let body = statements
        .join("\n")
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<script>\n{}\n</script>", body)
}

fn style_block(collected_css: &str, styles: &StyleAccumulator) -> String {
    let mut parts = Vec::new();
    if !collected_css.trim().is_empty() {
        parts.push(collected_css.trim().to_string());
    }
    if !styles.is_empty() {
        parts.push(styles.to_css());
    }
    if parts.is_empty() {
        return String::new();
    }
    format!("<style>\n{}\n</style>", parts.join("\n"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PropDecl;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_declaration_keywords() {
        assert_eq!(
            state_declaration("count", &StateEntry::property("0")),
            "let count = 0;"
        );
        assert_eq!(
            state_declaration("inc", &StateEntry::function("() => { state.count++ }")),
            "const inc = () => { count++ };"
        );
        assert_eq!(
            state_declaration("fmt", &StateEntry::function("function (v) { return v }")),
            "const fmt = function (v) { return v };"
        );
        assert_eq!(
            state_declaration("items", &StateEntry::property("props.items.filter(i => i.ok)")),
            "let items = props.items.filter(i => i.ok);"
        );
        assert_eq!(
            state_declaration("double", &StateEntry::property("x => x * 2")),
            "const double = x => x * 2;"
        );
    }

    fn entry(code: &str, kind: StateKind) -> StateEntry {
        StateEntry {
            code: code.to_string(),
            kind,
        }
    }

    #[test]
    fn test_method_declarations() {
        assert_eq!(
            state_declaration("reset", &entry("reset() { state.count = props.start; }", StateKind::Method)),
            "function reset() { count = props.start; }"
        );
        assert_eq!(
            state_declaration("load", &entry("async load() { state.count = 1; }", StateKind::Method)),
            "async function load() { count = 1; }"
        );
        assert_eq!(
            state_declaration("ids", &entry("*ids() { yield 1; }", StateKind::Method)),
            "function* ids() { yield 1; }"
        );
        assert_eq!(
            state_declaration("pages", &entry("async *pages() { yield 1; }", StateKind::Method)),
            "async function* pages() { yield 1; }"
        );
    }

    #[test]
    fn test_getter_becomes_derived_const() {
        assert_eq!(
            state_declaration(
                "total",
                &entry("get total() { return state.a + props.b; }", StateKind::Getter)
            ),
            "const total = (function () { return a + props.b; })();"
        );
    }

    #[test]
    fn test_props_type_declaration() {
        let mut component = Component::default();
        assert_eq!(
            props_type_declaration(&component, "Props"),
            "type Props = Record<string, any>;"
        );
        component.props.insert(
            "title".to_string(),
            PropDecl {
                type_name: Some("string".to_string()),
            },
        );
        component.props.insert("size".to_string(), PropDecl::default());
        assert_eq!(
            props_type_declaration(&component, "CardProps"),
            "interface CardProps {\n  title?: string;\n  size?: any;\n}"
        );
    }

    #[test]
    fn test_effective_props_include_usage() {
        let json = r#"{
            "props": { "title": {} },
            "state": { "label": { "code": "props.prefix + props.title" } },
            "children": [{ "name": "div", "bindings": { "_text": { "code": "props.count" } } }]
        }"#;
        let component = Component::from_json(json).unwrap();
        assert_eq!(effective_props(&component), vec!["title", "prefix", "count"]);
    }

    #[test]
    fn test_looks_like_function() {
        assert!(looks_like_function("function () {}"));
        assert!(looks_like_function("(a) => a * 2"));
        assert!(looks_like_function("async (a) { }"));
        assert!(looks_like_function("async item => item.id"));
        assert!(!looks_like_function("[1, 2, 3]"));
        assert!(!looks_like_function("props.items.filter(i => i.ok)"));
        assert!(!looks_like_function("{ functional: true }"));
    }
}
