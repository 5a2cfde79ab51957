//! Extension points around the compilation pipeline.
//!
//! Plugins see the component before and after IR processing and the
//! generated text before and after formatting. Import rendering, CSS
//! collection and formatting are pluggable collaborators with built-in
//! defaults.

use crate::error::FormatError;
use crate::ir::{Component, ImportDecl};
use std::sync::Arc;

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn pre_json(&self, component: Component) -> Component {
        component
    }

    fn post_json(&self, component: Component) -> Component {
        component
    }

    fn pre_code(&self, _component: &Component, code: String) -> String {
        code
    }

    fn post_code(&self, _component: &Component, code: String) -> String {
        code
    }
}

// Hooks run in registration order; each result feeds the next plugin.

pub(crate) fn run_pre_json(plugins: &[Arc<dyn Plugin>], component: Component) -> Component {
    plugins.iter().fold(component, |c, p| p.pre_json(c))
}

pub(crate) fn run_post_json(plugins: &[Arc<dyn Plugin>], component: Component) -> Component {
    plugins.iter().fold(component, |c, p| p.post_json(c))
}

pub(crate) fn run_pre_code(plugins: &[Arc<dyn Plugin>], component: &Component, code: String) -> String {
    plugins.iter().fold(code, |code, p| p.pre_code(component, code))
}

pub(crate) fn run_post_code(plugins: &[Arc<dyn Plugin>], component: &Component, code: String) -> String {
    plugins.iter().fold(code, |code, p| p.post_code(component, code))
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════════

pub trait ImportRenderer: Send + Sync {
    /// Import statements for `component`, possibly empty.
    fn render_imports(&self, component: &Component, target: &str, component_extension: bool) -> String;
}

/// Prefix handed to the CSS collector for naming generated classes.
#[derive(Debug, Clone, Copy)]
pub struct CssRequest<'a> {
    pub prefix: &'a str,
}

pub trait CssCollector: Send + Sync {
    /// Non-inline CSS rules for `component`, possibly empty.
    fn collect_css(&self, component: &Component, request: CssRequest<'_>) -> String;
}

pub trait Formatter: Send + Sync {
    fn format(&self, code: &str) -> Result<String, FormatError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImportRenderer;

impl ImportRenderer for DefaultImportRenderer {
    fn render_imports(&self, component: &Component, target: &str, component_extension: bool) -> String {
        component
            .imports
            .iter()
            .map(|import| render_import(import, target, component_extension))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

const COMPONENT_SOURCE_SUFFIXES: &[&str] = &[".lite.tsx", ".lite.jsx", ".lite"];

fn render_import(import: &ImportDecl, target: &str, component_extension: bool) -> String {
    let path = map_import_path(&import.path, target, component_extension);
    if import.imports.is_empty() {
        return format!("import \"{}\";", path);
    }

    let mut default = None;
    let mut namespace = None;
    let mut named = Vec::new();
    for (local, imported) in &import.imports {
        match imported.as_str() {
            "default" => default = Some(local.clone()),
            "*" => namespace = Some(format!("* as {}", local)),
            name if name == local => named.push(local.clone()),
            name => named.push(format!("{} as {}", name, local)),
        }
    }

    let mut clauses: Vec<String> = default.into_iter().chain(namespace).collect();
    if !named.is_empty() {
        clauses.push(format!("{{ {} }}", named.join(", ")));
    }
    let type_only = if import.import_kind.as_deref() == Some("type") {
        "type "
    } else {
        ""
    };
    format!("import {}{} from \"{}\";", type_only, clauses.join(", "), path)
}

fn map_import_path(path: &str, target: &str, component_extension: bool) -> String {
    for suffix in COMPONENT_SOURCE_SUFFIXES {
        if let Some(stem) = path.strip_suffix(suffix) {
            return if component_extension {
                format!("{}.{}", stem, target)
            } else {
                stem.to_string()
            };
        }
    }
    path.to_string()
}

/// Emits the component-level stylesheet verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCssCollector;

impl CssCollector for DefaultCssCollector {
    fn collect_css(&self, component: &Component, _request: CssRequest<'_>) -> String {
        component
            .style
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}
