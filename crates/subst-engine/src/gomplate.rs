//! Rendering through the external `gomplate` binary

use subst_core::SubstitutionContext;

use crate::error::{EngineError, Result};
use crate::process::ExternalTool;
use crate::render::TemplateRenderer;

/// Environment variable carrying the context YAML to gomplate
pub const CONTEXT_ENV_VAR: &str = "SUBST_CONTEXT";

/// Pipes the manifest through `gomplate --context .=env:///SUBST_CONTEXT`
///
/// The context reaches the child as YAML in its environment, so decrypted
/// secrets are never written to disk.
#[derive(Debug, Clone)]
pub struct GomplateRenderer {
    tool: ExternalTool,
}

impl Default for GomplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GomplateRenderer {
    pub fn new() -> Self {
        Self::with_binary("gomplate")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            tool: ExternalTool::new(binary)
                .install_hint("install gomplate: https://docs.gomplate.ca/installing/"),
        }
    }
}

/// `--context` value pointing gomplate at [`CONTEXT_ENV_VAR`]
fn context_arg() -> String {
    format!(".=env:///{}?type=application/yaml", CONTEXT_ENV_VAR)
}

impl TemplateRenderer for GomplateRenderer {
    fn name(&self) -> &str {
        "gomplate"
    }

    fn render(&self, manifest: &str, context: &SubstitutionContext) -> Result<String> {
        let yaml = context.to_yaml()?;
        let context_arg = context_arg();
        let output = self.tool.run_with_env(
            ["--context", context_arg.as_str()],
            &[(CONTEXT_ENV_VAR, yaml.as_str())],
            Some(manifest.as_bytes()),
        )?;

        if !output.success {
            return Err(EngineError::RenderFailed {
                engine: self.name().to_string(),
                message: output.stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
