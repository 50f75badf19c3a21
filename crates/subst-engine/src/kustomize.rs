//! Manifest build through kustomize

use std::path::Path;

use crate::error::{EngineError, Result};
use crate::process::ExternalTool;

/// Produces rendered YAML for an overlay root
pub trait ManifestBuilder {
    fn build(&self, root: &Path, options: &[String]) -> Result<String>;
}

/// Runs `kustomize build <root> [options...]`
#[derive(Debug, Clone)]
pub struct KustomizeBuilder {
    tool: ExternalTool,
}

impl Default for KustomizeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KustomizeBuilder {
    pub fn new() -> Self {
        Self::with_binary("kustomize")
    }

    /// Use a specific binary name or path
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            tool: ExternalTool::new(binary)
                .install_hint("install kustomize: https://kubectl.docs.kubernetes.io/installation/kustomize/"),
        }
    }
}

impl ManifestBuilder for KustomizeBuilder {
    fn build(&self, root: &Path, options: &[String]) -> Result<String> {
        let mut args = vec!["build".to_string(), root.display().to_string()];
        args.extend(options.iter().cloned());

        let unavailable = |message: String| EngineError::BuildUnavailable {
            root: root.to_path_buf(),
            message,
        };

        let output = self.tool.run(args, None).map_err(|e| match e {
            EngineError::ToolNotFound { .. } => e,
            other => unavailable(other.to_string()),
        })?;

        if !output.success {
            return Err(unavailable(format!(
                "{} exited with {}: {}",
                self.tool.name(),
                output
                    .exit_code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                output.stderr.trim()
            )));
        }

        if output.stdout.trim().is_empty() {
            return Err(unavailable("kustomize produced no output".to_string()));
        }

        tracing::debug!(bytes = output.stdout.len(), "kustomize build finished");
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_reported() {
        let builder = KustomizeBuilder::with_binary("subst-no-such-kustomize");

        let err = builder.build(Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, EngineError::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_build_is_unavailable() {
        // `false` ignores its arguments and exits 1
        let builder = KustomizeBuilder::with_binary("false");

        let err = builder.build(Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, EngineError::BuildUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_output_is_unavailable() {
        let builder = KustomizeBuilder::with_binary("true");

        let err = builder.build(Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, EngineError::BuildUnavailable { .. }));
    }
}
