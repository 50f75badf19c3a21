//! Run configuration
//!
//! A [`SubstConfig`] is built once per run, from an optional config file and
//! command line flags, and handed by reference to everything that needs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::env::DEFAULT_ENV_REGEX;
use crate::error::{CoreError, Result};

/// Environment variable holding extra manifest build options
pub const BUILD_OPTIONS_ENV: &str = "KUSTOMIZE_BUILD_OPTIONS";

/// Environment variable overriding the ejson key directory
pub const KEYDIR_ENV: &str = "EJSON_KEYDIR";

/// Key directory used in container images
pub const SYSTEM_KEYDIR: &str = "/opt/ejson/keys";

/// Output serialization of the rendered manifests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(CoreError::Config {
                message: format!("unknown output format '{}', expected yaml or json", other),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Template engine used to render the built manifests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// External `gomplate` binary
    #[default]
    Gomplate,
    /// In-process Jinja2 (MiniJinja)
    Jinja,
}

impl FromStr for EngineKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gomplate" => Ok(Self::Gomplate),
            "jinja" | "jinja2" | "minijinja" => Ok(Self::Jinja),
            other => Err(CoreError::Config {
                message: format!("unknown engine '{}', expected gomplate or jinja", other),
            }),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gomplate => write!(f, "gomplate"),
            Self::Jinja => write!(f, "jinja"),
        }
    }
}

/// Settings read from a `--config` file; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub env_regex: Option<String>,
    #[serde(default)]
    pub ejson_key: Vec<String>,
    pub ejson_key_dir: Option<PathBuf>,
    pub skip_decrypt: Option<bool>,
    pub output: Option<OutputFormat>,
    pub kustomize_build_options: Option<String>,
    pub engine: Option<EngineKind>,
    pub strict: Option<bool>,
}

impl FileConfig {
    /// Load a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| CoreError::yaml(path, e))
    }
}

/// Immutable configuration of one resolution run
#[derive(Clone, Serialize)]
pub struct SubstConfig {
    /// Absolute overlay root
    pub root_dir: PathBuf,
    /// Regex selecting environment variables exposed to templates
    pub env_regex: String,
    /// Explicit ejson private keys
    #[serde(skip)]
    pub ejson_keys: Vec<String>,
    /// Directories searched for ejson private key files
    pub ejson_key_dirs: Vec<PathBuf>,
    pub skip_decrypt: bool,
    pub output: OutputFormat,
    /// Extra arguments for the manifest build
    pub build_options: Vec<String>,
    pub engine: EngineKind,
    /// Malformed override files abort the run
    pub strict: bool,
}

impl fmt::Debug for SubstConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstConfig")
            .field("root_dir", &self.root_dir)
            .field("env_regex", &self.env_regex)
            .field("ejson_keys", &format_args!("[{} redacted]", self.ejson_keys.len()))
            .field("ejson_key_dirs", &self.ejson_key_dirs)
            .field("skip_decrypt", &self.skip_decrypt)
            .field("output", &self.output)
            .field("build_options", &self.build_options)
            .field("engine", &self.engine)
            .field("strict", &self.strict)
            .finish()
    }
}

impl SubstConfig {
    pub fn builder(root_dir: impl Into<PathBuf>) -> SubstConfigBuilder {
        SubstConfigBuilder::new(root_dir)
    }
}

/// Builder for [`SubstConfig`]
///
/// Later calls override earlier ones, so apply the config file first and
/// command line flags after it.
#[derive(Debug, Default)]
pub struct SubstConfigBuilder {
    root_dir: PathBuf,
    env_regex: Option<String>,
    ejson_keys: Vec<String>,
    ejson_key_dir: Option<PathBuf>,
    skip_decrypt: bool,
    output: OutputFormat,
    build_options: Option<String>,
    engine: EngineKind,
    strict: bool,
}

impl SubstConfigBuilder {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Take every value the file sets
    pub fn file(mut self, file: FileConfig) -> Self {
        if file.env_regex.is_some() {
            self.env_regex = file.env_regex;
        }
        self.ejson_keys.extend(file.ejson_key);
        if file.ejson_key_dir.is_some() {
            self.ejson_key_dir = file.ejson_key_dir;
        }
        self.skip_decrypt = file.skip_decrypt.unwrap_or(self.skip_decrypt);
        self.output = file.output.unwrap_or(self.output);
        if file.kustomize_build_options.is_some() {
            self.build_options = file.kustomize_build_options;
        }
        self.engine = file.engine.unwrap_or(self.engine);
        self.strict = file.strict.unwrap_or(self.strict);
        self
    }

    pub fn env_regex(mut self, regex: impl Into<String>) -> Self {
        self.env_regex = Some(regex.into());
        self
    }

    /// Add private keys; comma separated lists are split
    pub fn ejson_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.ejson_keys.extend(
                key.as_ref()
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from),
            );
        }
        self
    }

    pub fn ejson_key_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ejson_key_dir = Some(dir.into());
        self
    }

    pub fn skip_decrypt(mut self, skip: bool) -> Self {
        self.skip_decrypt = skip;
        self
    }

    pub fn output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn build_options(mut self, options: impl Into<String>) -> Self {
        self.build_options = Some(options.into());
        self
    }

    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve the root and fill in defaults
    pub fn build(self) -> Result<SubstConfig> {
        let root_dir = self
            .root_dir
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| CoreError::RootNotFound {
                path: self.root_dir.clone(),
            })?;

        let build_options = self
            .build_options
            .or_else(|| std::env::var(BUILD_OPTIONS_ENV).ok())
            .map(|opts| opts.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        let ejson_key_dirs = match self.ejson_key_dir {
            Some(dir) => vec![dir],
            None => default_key_dirs(),
        };

        let config = SubstConfig {
            root_dir,
            env_regex: self
                .env_regex
                .unwrap_or_else(|| DEFAULT_ENV_REGEX.to_string()),
            ejson_keys: self.ejson_keys,
            ejson_key_dirs,
            skip_decrypt: self.skip_decrypt,
            output: self.output,
            build_options,
            engine: self.engine,
            strict: self.strict,
        };
        tracing::debug!(?config, "resolved configuration");
        Ok(config)
    }
}

/// ejson key directories: `$EJSON_KEYDIR`, else the system directory, else `~/.ejson/keys`
pub fn default_key_dirs() -> Vec<PathBuf> {
    if let Ok(dir) = std::env::var(KEYDIR_ENV) {
        return vec![PathBuf::from(dir)];
    }

    let system = PathBuf::from(SYSTEM_KEYDIR);
    if system.is_dir() {
        return vec![system];
    }

    dirs::home_dir()
        .map(|home| home.join(".ejson").join("keys"))
        .filter(|dir| dir.is_dir())
        .into_iter()
        .collect()
}
