//! Subst Core - substitution context resolution for kustomize overlays
//!
//! This crate resolves everything a template needs before rendering:
//! - `Values`: nested values with deep merge support
//! - `env`: environment variables exposed to templates
//! - `KustomizeStructure`: kustomization files and active resources
//! - `OverrideLoader`: `subst.yaml` files merged shallow to deep
//! - `SecretLoader`: decrypted ejson secrets under the `ejson` namespace
//! - `ContextAssembler`: composes all of the above into one context

pub mod config;
pub mod context;
pub mod decrypt;
pub mod env;
pub mod error;
pub mod hierarchy;
pub mod kustomization;
pub mod overrides;
pub mod report;
pub mod secrets;
pub mod values;

pub use config::{EngineKind, FileConfig, OutputFormat, SubstConfig, SubstConfigBuilder};
pub use context::{AssembledContext, ContextAssembler, SubstitutionContext, assemble, decryptor_for};
pub use decrypt::{Decryptor, DecryptorConfig, EjsonDecryptor};
pub use error::{CoreError, Result};
pub use kustomization::{KustomizeStructure, ManifestList};
pub use overrides::{OVERRIDE_FILE_NAME, OverrideLoader, contains_override_file};
pub use report::{ResolutionReport, SkippedFile, SourceKind};
pub use secrets::{SECRET_NAMESPACE, SecretLoader};
pub use values::Values;
