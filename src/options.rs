use crate::error::CompileError;
use crate::format::DefaultFormatter;
use crate::plugins::{
    CssCollector, DefaultCssCollector, DefaultImportRenderer, Formatter, ImportRenderer, Plugin,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Client hydration directive attached to interactive elements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientDirective {
    #[default]
    Load,
    Idle,
    Visible,
    Media(String),
    Only(String),
}

impl fmt::Display for ClientDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientDirective::Load => f.write_str("client:load"),
            ClientDirective::Idle => f.write_str("client:idle"),
            ClientDirective::Visible => f.write_str("client:visible"),
            ClientDirective::Media(query) => write!(f, "client:media=\"{}\"", query),
            ClientDirective::Only(framework) => write!(f, "client:only=\"{}\"", framework),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Emit a prop type declaration and typed props binding.
    pub typescript: bool,
    /// Run the formatter over the generated document.
    pub format: bool,
    /// Attach client directives to elements that need hydration.
    pub hydration_directives: bool,
    /// Directive to attach; the hydration analysis suggestion when unset.
    pub client_directive: Option<ClientDirective>,
    /// Rewrite component source imports to `.astro` files.
    pub component_extension: bool,
    #[serde(skip)]
    pub plugins: Vec<Arc<dyn Plugin>>,
    #[serde(skip, default = "default_import_renderer")]
    pub import_renderer: Arc<dyn ImportRenderer>,
    #[serde(skip, default = "default_css_collector")]
    pub css_collector: Arc<dyn CssCollector>,
    #[serde(skip, default = "default_formatter")]
    pub formatter: Arc<dyn Formatter>,
}

fn default_import_renderer() -> Arc<dyn ImportRenderer> {
    Arc::new(DefaultImportRenderer)
}

fn default_css_collector() -> Arc<dyn CssCollector> {
    Arc::new(DefaultCssCollector)
}

fn default_formatter() -> Arc<dyn Formatter> {
    Arc::new(DefaultFormatter)
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            typescript: false,
            format: true,
            hydration_directives: true,
            client_directive: None,
            component_extension: true,
            plugins: Vec::new(),
            import_renderer: default_import_renderer(),
            css_collector: default_css_collector(),
            formatter: default_formatter(),
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("typescript", &self.typescript)
            .field("format", &self.format)
            .field("hydration_directives", &self.hydration_directives)
            .field("client_directive", &self.client_directive)
            .field("component_extension", &self.component_extension)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl CompileOptions {
    /// Caller JSON merged over the defaults; absent keys keep default values.
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(CompileError::InvalidOptions)
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }
}
