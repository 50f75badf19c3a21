//! End-to-end run: resolve context, build, render

use subst_core::{AssembledContext, ContextAssembler, Decryptor, SubstConfig, decryptor_for};

use crate::error::Result;
use crate::kustomize::{KustomizeBuilder, ManifestBuilder};
use crate::render::{TemplateRenderer, renderer_for};

/// Output of one run
#[derive(Debug)]
pub struct Rendered {
    /// Final YAML stream
    pub manifests: String,
    /// Context the manifests were rendered with
    pub context: AssembledContext,
}

/// One resolution run over an overlay root
pub struct Subst<'a> {
    config: &'a SubstConfig,
    builder: Box<dyn ManifestBuilder + 'a>,
    renderer: Box<dyn TemplateRenderer + 'a>,
}

impl<'a> Subst<'a> {
    /// kustomize plus the renderer named in `config`
    pub fn new(config: &'a SubstConfig) -> Self {
        Self {
            config,
            builder: Box::new(KustomizeBuilder::new()),
            renderer: renderer_for(config.engine),
        }
    }

    pub fn with_builder(mut self, builder: impl ManifestBuilder + 'a) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'a) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Run with the ejson decryptor configured in `config`
    pub fn run(&self) -> Result<Rendered> {
        let decryptor = decryptor_for(self.config)?;
        self.run_with(&decryptor)
    }

    pub fn run_with(&self, decryptor: &dyn Decryptor) -> Result<Rendered> {
        let root = &self.config.root_dir;
        tracing::info!(root = %root.display(), engine = self.renderer.name(), "rendering");

        let context = ContextAssembler::new(self.config, decryptor).assemble()?;
        let built = self.builder.build(root, &self.config.build_options)?;

        if !context.report.is_clean() {
            tracing::warn!(
                skipped = context.report.skipped.len(),
                "some context files were skipped"
            );
        }

        let manifests = self.renderer.render(&built, &context.values)?;
        Ok(Rendered { manifests, context })
    }
}
