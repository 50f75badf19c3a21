//! Manifest build and template rendering for subst
//!
//! This crate drives the external collaborators of a run: `kustomize` to
//! expand the overlay, and either `gomplate` or an in-process MiniJinja
//! environment to substitute the resolved context into the result.

pub mod engine;
pub mod error;
pub mod filters;
pub mod gomplate;
pub mod kustomize;
pub mod process;
pub mod render;
pub mod subst;

pub use engine::{JinjaRenderer, JinjaRendererBuilder};
pub use error::{EngineError, Result, TemplateError};
pub use gomplate::GomplateRenderer;
pub use kustomize::{KustomizeBuilder, ManifestBuilder};
pub use process::{ExternalTool, ToolOutput};
pub use render::{TemplateRenderer, renderer_for};
pub use subst::{Rendered, Subst};
