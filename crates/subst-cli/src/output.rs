//! Printing of rendered manifests

use std::io::Write;

use serde::Deserialize;
use subst_core::OutputFormat;

use crate::error::{CliError, Result};

/// Write `manifests` to `out` in the requested format
pub fn write_manifests(out: &mut impl Write, manifests: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => write_yaml(out, manifests),
        OutputFormat::Json => write_json(out, manifests),
    }
}

/// `---` followed by the stream as rendered
fn write_yaml(out: &mut impl Write, manifests: &str) -> Result<()> {
    writeln!(out, "---")?;
    out.write_all(manifests.as_bytes())?;
    if !manifests.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

/// One pretty-printed JSON document per non-empty YAML document
fn write_json(out: &mut impl Write, manifests: &str) -> Result<()> {
    for document in to_json_documents(manifests)? {
        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| CliError::output(e.to_string()))?;
        writeln!(out, "{}", text)?;
    }
    Ok(())
}

pub fn to_json_documents(manifests: &str) -> Result<Vec<serde_json::Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(manifests) {
        let value = serde_json::Value::deserialize(document)
            .map_err(|e| CliError::output(format!("rendered output is not valid YAML: {}", e)))?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}
