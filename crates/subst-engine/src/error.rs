//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use subst_core::CoreError;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("Manifest build failed for {}: {message}", .root.display())]
    #[diagnostic(
        code(subst::engine::build),
        help("check that `kustomize build` succeeds for this directory")
    )]
    BuildUnavailable { root: PathBuf, message: String },

    #[error("{engine} rendering failed: {message}")]
    #[diagnostic(code(subst::engine::render))]
    RenderFailed { engine: String, message: String },

    #[error("`{tool}` binary not found in PATH")]
    #[diagnostic(code(subst::engine::tool_not_found))]
    ToolNotFound {
        tool: String,
        #[help]
        hint: Option<String>,
    },

    #[error("Template error")]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    #[diagnostic(code(subst::engine::context))]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    #[diagnostic(code(subst::engine::io))]
    Io(#[from] std::io::Error),
}

/// Template error with source information, for the in-process renderer
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(subst::template::render))]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a new template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));

        let suggestion = match err.kind() {
            minijinja::ErrorKind::UndefinedError => Some(
                "substitution keys come from subst.yaml files, selected environment \
                 variables and `ejson.*` secrets"
                    .to_string(),
            ),
            minijinja::ErrorKind::UnknownFilter => Some(
                "available filters: toyaml, tojson, b64encode, b64decode, quote, indent, \
                 nindent, required, plus the Jinja2 builtins"
                    .to_string(),
            ),
            _ => None,
        };

        let message = match err.detail() {
            Some(detail) => format!("{}: {}", err.kind(), detail),
            None => err.kind().to_string(),
        };

        Self {
            message,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }
}

/// Calculate source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

pub type Result<T> = std::result::Result<T, EngineError>;
