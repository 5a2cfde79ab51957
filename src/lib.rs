//! # Astro Backend
//!
//! Compiles one framework-neutral component IR into an Astro single-file
//! component: `---` fenced frontmatter, template markup, then an optional
//! `<script>` and `<style>` tail.
//!
//! ## Output Invariants
//!
//! 1. **Frontmatter Locals**: state entries and refs are frontmatter locals.
//!    Template expressions reference them bare (`state.count` → `count`).
//!
//! 2. **Props**: frontmatter code keeps `props.x`; the template sees `x`
//!    because the frontmatter destructures every effective prop.
//!
//! 3. **Hydration**: elements with refs or interactive events carry a client
//!    directive. Components with mount hooks always hydrate with
//!    `client:load`; event-only components default to `client:idle`.
//!
//! 4. **Scoped Styles**: inline style objects (`css` binding) become a
//!    content-hashed class plus a rule block in `<style>`.
//!
//! 5. **Fail-Soft**: malformed bindings, style objects and formatting degrade
//!    locally with a `tracing` warning. Compilation of a parsed component
//!    never fails.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod binding;
mod class_style;
mod codegen;
mod error;
mod format;
mod hydration;
mod ir;
mod options;
mod plugins;
mod render;
mod visitor;


pub use binding::{process_binding, BindingContext, Processed};
pub use class_style::{class_attribute, style_object_to_css, StyleAccumulator};
pub use codegen::{compile_component, compile_json, compile_many, TARGET};
pub use error::{CompileError, FormatError, StyleError};
pub use format::DefaultFormatter;
pub use hydration::{analyze_hydration, HydrationAnalysis, HydrationReason, INTERACTIVE_EVENTS};
pub use ir::{
    Binding, BindingType, Component, ElementNode, ForNode, HookCode, Hooks, ImportDecl, Node,
    PropDecl, ShowNode, StateEntry, StateKind, UpdateHook, FOR_NAME, FRAGMENT_NAME, SHOW_NAME,
    SPREAD_KEY, STYLE_OBJECT_KEY, TEXT_KEY,
};
pub use options::{ClientDirective, CompileOptions};
pub use plugins::{
    CssCollector, CssRequest, DefaultCssCollector, DefaultImportRenderer, Formatter,
    ImportRenderer, Plugin,
};
pub use render::{render_node, RenderContext};
pub use visitor::NodeVisitor;

#[cfg(feature = "napi")]
#[napi]
pub fn compile_astro_native(ir_json: String, options_json: Option<String>) -> napi::Result<String> {
    compile_json(&ir_json, options_json.as_deref())
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
