//! Environment variable selection

use regex::Regex;
use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};
use crate::values::Values;

/// Default pattern for variables exposed to templates (ArgoCD plugin env)
pub const DEFAULT_ENV_REGEX: &str = "^ARGOCD_ENV_.*$";

/// Select process environment variables whose name matches `pattern`
///
/// Anchoring is up to the caller. Variables whose name or value is not valid
/// unicode are ignored.
pub fn select(pattern: &str) -> Result<Values> {
    select_from(pattern, std::env::vars_os().filter_map(|(k, v)| {
        Some((k.into_string().ok()?, v.into_string().ok()?))
    }))
}

/// Select from an explicit set of variables instead of the process environment
pub fn select_from<I>(pattern: &str, vars: I) -> Result<Values>
where
    I: IntoIterator<Item = (String, String)>,
{
    let regex = Regex::new(pattern).map_err(|source| CoreError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let selected: Map<String, JsonValue> = vars
        .into_iter()
        .filter(|(name, _)| regex.is_match(name))
        .map(|(name, value)| (name, JsonValue::String(value)))
        .collect();

    tracing::debug!(count = selected.len(), pattern, "selected environment variables");
    Ok(Values::from_map(selected))
}
