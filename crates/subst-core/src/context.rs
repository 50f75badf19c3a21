//! Substitution context assembly
//!
//! Composition order, lowest precedence first:
//! 1. environment variables selected by the configured regex
//! 2. `subst.yaml` overrides from ancestors and active resources
//! 3. decrypted secrets, under the `ejson` namespace

use crate::config::SubstConfig;
use crate::decrypt::{Decryptor, DecryptorConfig, EjsonDecryptor};
use crate::env;
use crate::error::Result;
use crate::kustomization::KustomizeStructure;
use crate::overrides::OverrideLoader;
use crate::report::ResolutionReport;
use crate::secrets::SecretLoader;
use crate::values::Values;

/// The values handed to the template engine
pub type SubstitutionContext = Values;

/// Outcome of assembling a context
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// Final substitution values
    pub values: SubstitutionContext,

    /// Kustomization layout the overrides were resolved against
    pub structure: KustomizeStructure,

    /// Files skipped along the way
    pub report: ResolutionReport,
}

/// Builds the substitution context for one run
pub struct ContextAssembler<'a> {
    config: &'a SubstConfig,
    decryptor: &'a dyn Decryptor,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(config: &'a SubstConfig, decryptor: &'a dyn Decryptor) -> Self {
        Self { config, decryptor }
    }

    /// Resolve everything into a single context
    pub fn assemble(&self) -> Result<AssembledContext> {
        let root = &self.config.root_dir;
        let mut report = ResolutionReport::new();

        let mut values = env::select(&self.config.env_regex)?;

        let structure = KustomizeStructure::discover(root)?;
        tracing::debug!(
            manifest_dirs = structure.manifest_dirs.len(),
            active_resources = structure.resource_paths.len(),
            "discovered kustomize structure"
        );

        let overrides = OverrideLoader::new()
            .strict(self.config.strict)
            .load(root, &structure.resource_paths, &mut report)?;
        values.merge(&overrides);

        let secrets = SecretLoader::new(self.decryptor).load(root, &mut report);
        values.merge(&secrets);

        Ok(AssembledContext {
            values,
            structure,
            report,
        })
    }
}

/// Build the ejson decryptor described by `config`
pub fn decryptor_for(config: &SubstConfig) -> Result<EjsonDecryptor> {
    EjsonDecryptor::new(
        DecryptorConfig {
            skip_decrypt: config.skip_decrypt,
        },
        config.ejson_key_dirs.clone(),
        &config.ejson_keys,
    )
}

/// Assemble a context with the ejson decryptor from `config`
pub fn assemble(config: &SubstConfig) -> Result<AssembledContext> {
    let decryptor = decryptor_for(config)?;
    ContextAssembler::new(config, &decryptor).assemble()
}
