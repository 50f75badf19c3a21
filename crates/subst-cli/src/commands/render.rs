//! Render command - build an overlay and substitute the resolved context

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde_json::Value as JsonValue;
use subst_core::{
    AssembledContext, EngineKind, FileConfig, OutputFormat, SECRET_NAMESPACE, SubstConfig,
};
use subst_engine::Subst;

use crate::error::{CliError, Result};
use crate::output;

const REDACTED: &str = "<redacted>";

#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    /// Overlay root directory
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// ejson private key; repeat the flag or separate keys with commas
    #[arg(long = "ejson-key")]
    pub ejson_keys: Vec<String>,

    /// Directory holding ejson private key files
    #[arg(long)]
    pub ejson_key_dir: Option<PathBuf>,

    /// Leave ejson values encrypted
    #[arg(long)]
    pub skip_decrypt: bool,

    /// Only expose environment variables matching this regex
    #[arg(long)]
    pub env_regex: Option<String>,

    /// Output format: yaml or json
    #[arg(long)]
    pub output: Option<OutputFormat>,

    /// Extra arguments for `kustomize build`
    #[arg(long, allow_hyphen_values = true)]
    pub kustomize_build_options: Option<String>,

    /// Template engine: gomplate or jinja
    #[arg(long)]
    pub engine: Option<EngineKind>,

    /// Fail on malformed subst.yaml files instead of skipping them
    #[arg(long)]
    pub strict: bool,

    /// YAML file with defaults for these options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the substitution context to stderr, secrets redacted
    #[arg(long)]
    pub show_context: bool,
}

impl RenderArgs {
    /// Config file first, explicit flags on top
    pub fn to_config(&self) -> Result<SubstConfig> {
        let mut builder = SubstConfig::builder(&self.dir);

        if let Some(path) = &self.config {
            builder = builder.file(FileConfig::load_from(path)?);
        }
        if !self.ejson_keys.is_empty() {
            builder = builder.ejson_keys(&self.ejson_keys);
        }
        if let Some(dir) = &self.ejson_key_dir {
            builder = builder.ejson_key_dir(dir);
        }
        if self.skip_decrypt {
            builder = builder.skip_decrypt(true);
        }
        if let Some(regex) = &self.env_regex {
            builder = builder.env_regex(regex);
        }
        if let Some(output) = self.output {
            builder = builder.output(output);
        }
        if let Some(options) = &self.kustomize_build_options {
            builder = builder.build_options(options);
        }
        if let Some(engine) = self.engine {
            builder = builder.engine(engine);
        }
        if self.strict {
            builder = builder.strict(true);
        }

        Ok(builder.build()?)
    }
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let config = args.to_config()?;
    let rendered = Subst::new(&config).run()?;

    if args.show_context {
        print_context(&rendered.context)?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    output::write_manifests(&mut out, &rendered.manifests, config.output)?;
    out.flush()?;

    Ok(())
}

fn print_context(context: &AssembledContext) -> Result<()> {
    let mut values = context.values.clone().into_inner();
    if let Some(secrets) = values.get_mut(SECRET_NAMESPACE) {
        redact(secrets);
    }

    let yaml = serde_yaml::to_string(&values).map_err(|e| CliError::output(e.to_string()))?;
    eprintln!("{}", style("Substitution context:").bold());
    eprintln!("{}", yaml.trim_end());

    for skipped in &context.report.skipped {
        eprintln!(
            "{} {} {}: {}",
            style("skipped").yellow(),
            skipped.kind,
            skipped.path.display(),
            style(&skipped.reason).dim()
        );
    }
    Ok(())
}

/// Replace every scalar leaf, keeping the key structure
fn redact(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => map.values_mut().for_each(redact),
        JsonValue::Array(items) => items.iter_mut().for_each(redact),
        JsonValue::Null => {}
        leaf => *leaf = JsonValue::String(REDACTED.to_string()),
    }
}
