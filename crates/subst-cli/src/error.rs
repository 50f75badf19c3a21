//! CLI error type with exit code mapping

use std::path::PathBuf;

use miette::Diagnostic;
use subst_core::CoreError;
use subst_engine::EngineError;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    #[diagnostic(code(subst::cli::context))]
    Context(#[from] CoreError),

    #[error("No {file} found under {}", .path.display())]
    #[diagnostic(code(subst::cli::discover))]
    NotDiscovered { file: String, path: PathBuf },

    #[error("Failed to write output: {message}")]
    #[diagnostic(code(subst::cli::output))]
    Output { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(subst::cli::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(err) => engine_exit_code(err),
            CliError::Context(err) => core_exit_code(err),
            CliError::NotDiscovered { .. } => exit_codes::NOT_FOUND,
            CliError::Output { .. } => exit_codes::ERROR,
            CliError::Io(_) => exit_codes::IO_ERROR,
        }
    }
}

fn engine_exit_code(err: &EngineError) -> i32 {
    match err {
        EngineError::BuildUnavailable { .. } => exit_codes::BUILD_ERROR,
        EngineError::RenderFailed { .. } | EngineError::Template(_) => exit_codes::RENDER_ERROR,
        EngineError::ToolNotFound { .. } => exit_codes::UNAVAILABLE,
        EngineError::Core(core) => core_exit_code(core),
        EngineError::Io(_) => exit_codes::IO_ERROR,
    }
}

fn core_exit_code(err: &CoreError) -> i32 {
    match err {
        CoreError::InvalidPattern { .. }
        | CoreError::DecryptorInit { .. }
        | CoreError::Config { .. } => exit_codes::CONFIG_ERROR,
        CoreError::RootNotFound { .. } | CoreError::Io { .. } => exit_codes::IO_ERROR,
        _ => exit_codes::ERROR,
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
