//! Renderer abstraction over the template engines

use subst_core::{EngineKind, SubstitutionContext};

use crate::engine::JinjaRenderer;
use crate::error::Result;
use crate::gomplate::GomplateRenderer;

/// Substitutes context values into a built manifest stream
pub trait TemplateRenderer {
    /// Engine name used in diagnostics
    fn name(&self) -> &str;

    fn render(&self, manifest: &str, context: &SubstitutionContext) -> Result<String>;
}

/// Renderer for the configured engine
pub fn renderer_for(kind: EngineKind) -> Box<dyn TemplateRenderer> {
    match kind {
        EngineKind::Gomplate => Box::new(GomplateRenderer::new()),
        EngineKind::Jinja => Box::new(JinjaRenderer::new()),
    }
}
