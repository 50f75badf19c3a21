//! In-process renderer based on MiniJinja

use minijinja::{Environment, UndefinedBehavior, Value};
use subst_core::SubstitutionContext;

use crate::error::{EngineError, Result, TemplateError};
use crate::filters;
use crate::render::TemplateRenderer;

const TEMPLATE_NAME: &str = "manifest.yaml";

/// Builder for [`JinjaRenderer`]
pub struct JinjaRendererBuilder {
    strict_mode: bool,
}

impl Default for JinjaRendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaRendererBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Fail on undefined variables
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn build(self) -> JinjaRenderer {
        JinjaRenderer {
            strict_mode: self.strict_mode,
        }
    }
}

/// Renders manifests with the context keys as top-level template variables
#[derive(Debug, Clone)]
pub struct JinjaRenderer {
    strict_mode: bool,
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaRenderer {
    pub fn new() -> Self {
        JinjaRendererBuilder::new().build()
    }

    pub fn builder() -> JinjaRendererBuilder {
        JinjaRendererBuilder::new()
    }

    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        env.set_undefined_behavior(if self.strict_mode {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        // Manifest streams end with a newline; keep it
        env.set_keep_trailing_newline(true);

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("b64decode", filters::b64decode);
        env.add_filter("quote", filters::quote);
        env.add_filter("indent", filters::indent);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("required", filters::required);

        env
    }

    /// Render `template` under `template_name`, used in error reports
    pub fn render_named(
        &self,
        template: &str,
        context: &SubstitutionContext,
        template_name: &str,
    ) -> Result<String> {
        let mut env = self.create_environment();
        let to_error = |e: minijinja::Error| {
            EngineError::Template(TemplateError::from_minijinja(e, template_name, template))
        };

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(to_error)?;

        let ctx = Value::from_serialize(context.inner());
        env.get_template(template_name)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(to_error)
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn name(&self) -> &str {
        "jinja"
    }

    fn render(&self, manifest: &str, context: &SubstitutionContext) -> Result<String> {
        self.render_named(manifest, context, TEMPLATE_NAME)
    }
}
